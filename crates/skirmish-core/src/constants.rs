//! Simulation constants and tuning parameters.
//!
//! Detection radii, engagement probabilities, and similar thresholds were
//! tuned by playtesting; they are collected here rather than scattered as
//! literals so the tuning surface stays visible.

// --- Detection ---

/// Radius inside which an enemy is always detected, bypassing line-of-sight
/// (models hearing and peripheral awareness).
pub const ALWAYS_DETECT_RADIUS: f32 = 15.0;

/// Detection range while holding a defensive perimeter (shorter than the
/// general visual range; defenders watch their zone, not the horizon).
pub const DEFEND_DETECT_RANGE: f32 = 40.0;

/// Very-close bypass radius while defending (LOS not required).
pub const DEFEND_BYPASS_RADIUS: f32 = 10.0;

// --- Engagement acceptance ---

/// Inside this range engagement is certain.
pub const ENGAGE_CERTAIN_RANGE: f32 = 20.0;

/// Mid-range bucket boundary.
pub const ENGAGE_MID_RANGE: f32 = 45.0;

/// Long-range bucket boundary.
pub const ENGAGE_LONG_RANGE: f32 = 70.0;

/// Acceptance probability in the mid bucket.
pub const ENGAGE_MID_PROB: f64 = 0.75;

/// Acceptance probability in the long bucket.
pub const ENGAGE_LONG_PROB: f64 = 0.45;

/// Acceptance probability beyond the long bucket.
pub const ENGAGE_EXTREME_PROB: f64 = 0.2;

/// Objective-focused agents refuse engagement beyond this range unless
/// recently hit.
pub const OBJECTIVE_FOCUS_MAX_RANGE: f32 = 50.0;

/// How long after taking a hit an agent counts as "recently hit".
pub const RECENT_HIT_WINDOW_SECS: f64 = 2.5;

// --- Reaction ---

/// Reaction delay added per meter of distance to the contact.
pub const REACTION_PER_METER: f32 = 0.012;

/// Extra reaction delay per clustered ally, to desynchronize a group's
/// response to the same contact.
pub const REACTION_CLUSTER_STRETCH: f32 = 0.15;

/// Hard cap on reaction delay (seconds).
pub const REACTION_MAX_SECS: f32 = 2.5;

// --- Alert / timers ---

/// General alert timeout: with no re-engagement for this long, agents fall
/// back to patrolling.
pub const ALERT_TIMEOUT_SECS: f64 = 10.0;

/// While advancing, a visible enemy inside this range overrides the move.
pub const ADVANCE_OVERRIDE_RANGE: f32 = 20.0;

/// Generic "arrived at destination" radius.
pub const ARRIVE_RADIUS: f32 = 1.5;

// --- Suppression / panic ---

/// Suppression decay per second.
pub const SUPPRESSION_DECAY_PER_SEC: f32 = 0.3;

/// Panic decay per second.
pub const PANIC_DECAY_PER_SEC: f32 = 0.12;

/// Suppression added per reported hit.
pub const SUPPRESSION_PER_HIT: f32 = 0.35;

/// Panic added per reported hit.
pub const PANIC_PER_HIT: f32 = 0.25;

/// Duration of the spray toward a last-known position after losing sight.
pub const SUPPRESS_FIRE_SECS: f64 = 3.0;

// --- Line of sight ---

/// Cache entries older than this are treated as misses.
pub const LOS_CACHE_TTL_SECS: f64 = 0.12;

/// Sweep the cache once it grows past this many entries.
pub const LOS_CACHE_SWEEP_THRESHOLD: usize = 1024;

/// Minimum interval between cache sweeps.
pub const LOS_CACHE_SWEEP_INTERVAL_SECS: f64 = 1.0;

/// Shared raycast budget, reset each tick.
pub const RAYCAST_BUDGET_PER_TICK: u32 = 64;

/// Heightfield pre-filter only applies to pairs at least this far apart.
pub const LOS_PREFILTER_MIN_RANGE: f32 = 60.0;

// --- Targeting / cluster distribution ---

/// Radius used for local ally density checks.
pub const CLUSTER_RADIUS: f32 = 15.0;

/// Nearby-ally count (excluding self) at which target selection switches
/// to the distribution policy.
pub const CLUSTER_ALLY_THRESHOLD: usize = 3;

/// How often the targeter-count map is rebuilt.
pub const DISTRIBUTION_REBUILD_SECS: f64 = 0.5;

/// Score penalty per ally already targeting a candidate.
pub const TARGETER_PENALTY: f32 = 20.0;

/// Random jitter added to distribution scores.
pub const TARGET_SCORE_JITTER: f32 = 2.0;

// --- Cover ---

/// Spatial cell size for the terrain cover spot cache.
pub const COVER_CELL_SIZE: f32 = 16.0;

/// Cell cache entries regenerate after this long.
pub const COVER_CELL_TTL_SECS: f64 = 4.0;

/// Highest-relief spots kept per cell.
pub const COVER_SPOTS_PER_CELL: usize = 6;

/// Height sampling step inside a cell.
pub const COVER_SAMPLE_STEP: f32 = 4.0;

/// Minimum relief magnitude to count as cover at all.
pub const COVER_MIN_RELIEF: f32 = 0.35;

/// Quantization step for cover occupancy keys. Two spots within the same
/// quantized cell share one occupancy slot.
pub const COVER_KEY_QUANT: f32 = 2.0;

/// Default search radius for cover requests.
pub const COVER_SEARCH_RADIUS: f32 = 25.0;

/// Arrival radius at a claimed cover position.
pub const COVER_ARRIVE_RADIUS: f32 = 1.5;

/// Flat score bonus for obstacle cover over terrain relief.
pub const COVER_STATIC_BONUS: f32 = 12.0;

/// Preferred stand-off distance between cover and the threat.
pub const COVER_STANDOFF_IDEAL: f32 = 18.0;

/// How often an in-cover agent re-evaluates its cover.
pub const COVER_REEVAL_INTERVAL_SECS: f64 = 1.5;

/// Minimum interval between cover requests by one agent.
pub const COVER_REQUEST_COOLDOWN_SECS: f64 = 3.0;

/// Health fraction below which agents look for cover.
pub const COVER_LOW_HEALTH_FRAC: f32 = 0.4;

/// Suppression level above which agents look for cover.
pub const COVER_SUPPRESSION_TRIGGER: f32 = 0.6;

/// A burst cooldown longer than this while actively targeted also
/// triggers cover-seeking.
pub const COVER_COOLDOWN_TRIGGER_SECS: f64 = 2.0;

/// Interval between occupancy cleanup passes.
pub const COVER_CLEANUP_INTERVAL_SECS: f64 = 2.0;

/// Fresh claims are trusted for this long before being validated against
/// the roster snapshot, which may predate them by a tick.
pub const COVER_CLAIM_GRACE_SECS: f64 = 0.5;

// --- Flanking ---

/// Minimum living squad members to consider a flank.
pub const FLANK_MIN_SQUAD: usize = 3;

/// Cooldown between flanks by the same squad.
pub const FLANK_COOLDOWN_SECS: f64 = 25.0;

/// Flanks only trigger at mid range.
pub const FLANK_MIN_RANGE: f32 = 25.0;
pub const FLANK_MAX_RANGE: f32 = 90.0;

/// Suppression phase duration before flankers move.
pub const FLANK_SUPPRESS_SECS: f64 = 4.0;

/// Aggressive engagement duration before the operation completes.
pub const FLANK_ENGAGE_SECS: f64 = 6.0;

/// Whole-operation timeout.
pub const FLANK_TIMEOUT_SECS: f64 = 30.0;

/// Casualties during the maneuver that force an abort.
pub const FLANK_CASUALTY_ABORT: u32 = 2;

/// Flanker arrival radius around the flank waypoint.
pub const FLANK_ARRIVE_RADIUS: f32 = 5.0;

/// Fraction of living flankers that must arrive before engagement.
pub const FLANK_ARRIVED_FRACTION: f32 = 0.6;

/// Angular offset of the flank waypoint from the squad-to-target axis.
pub const FLANK_ANGLE_OFFSET_RAD: f32 = 1.3;

/// Stand-off distance of the flank waypoint from the target.
pub const FLANK_STANDOFF: f32 = 18.0;

/// Angular spread between individual flanker destinations.
pub const FLANK_SPREAD_RAD: f32 = 0.25;

/// Terrain height samples taken along each candidate lateral route.
pub const FLANK_SIDE_SAMPLES: usize = 5;

/// Members engaging the same target for this long counts as a stalled
/// engagement.
pub const STALL_ENGAGE_SECS: f64 = 8.0;

/// Window for "recent squad damage" when gating a flank.
pub const SQUAD_RECENT_DAMAGE_SECS: f64 = 5.0;

// --- Zone defense ---

/// Defenders per zone = living squad size / this divisor (minimum 1).
pub const ZONE_QUOTA_DIVISOR: usize = 3;

/// Interval between zone-defense assignment passes.
pub const ZONE_PASS_INTERVAL_SECS: f64 = 1.0;

/// Cooldown between defense reassignments for one agent.
pub const ZONE_REASSIGN_COOLDOWN_SECS: f64 = 10.0;

/// Zones further than this from the agent are not considered.
pub const ZONE_ASSIGN_RANGE: f32 = 60.0;

/// Perimeter anchors sit at this fraction of the zone radius.
pub const ZONE_PERIMETER_FRACTION: f32 = 0.8;

/// Defenders pace back to their anchor beyond this tolerance.
pub const DEFEND_HOLD_TOLERANCE: f32 = 2.0;

// --- Squad commands ---

/// Ring radius for the follow order.
pub const FOLLOW_RING_RADIUS: f32 = 6.0;

/// Hold-position tolerance before pacing back.
pub const HOLD_TOLERANCE: f32 = 4.0;

/// A patrol point is renewed when the agent gets this close to it.
pub const PATROL_REACH: f32 = 3.0;

/// Retreat anchor offset away from the threat.
pub const RETREAT_OFFSET: f32 = 30.0;

// --- Default patrol wander ---

/// Radius of the default patrol wander around the current position.
pub const PATROL_WANDER_RADIUS: f32 = 12.0;

/// Chance per second of picking a new wander point while idle.
pub const PATROL_WANDER_CHANCE_PER_SEC: f64 = 0.25;

// --- Gunnery ---

/// Range under which combat counts as close quarters.
pub const CLOSE_COMBAT_RANGE: f32 = 15.0;

/// Radius for local enemy density when planning bursts.
pub const ENEMY_DENSITY_RADIUS: f32 = 20.0;

/// Enemy count at which burst planning goes full auto.
pub const ENEMY_DENSITY_THRESHOLD: usize = 3;

/// Full-auto burst profile (seconds firing / pausing).
pub const FULL_AUTO_BURST_SECS: f32 = 1.4;
pub const FULL_AUTO_PAUSE_SECS: f32 = 0.4;

/// Spray profile used while suppressing a last-known position.
pub const SPRAY_BURST_SECS: f32 = 2.2;
pub const SPRAY_PAUSE_SECS: f32 = 0.3;

/// Peek-and-fire profile used while engaging from cover.
pub const PEEK_BURST_SECS: f32 = 0.5;
pub const PEEK_PAUSE_SECS: f32 = 1.6;
