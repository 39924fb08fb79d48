//! The per-combatant behavior state machine.
//!
//! One dispatch per living agent per tick. Handlers receive the agent's
//! component mutably plus a `TickCtx` of shared read state and services;
//! they never touch the world directly, which keeps hecs borrows to the
//! single component the engine already holds.

use hecs::Entity;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use skirmish_core::constants::*;
use skirmish_core::enums::{BehaviorState, Faction};
use skirmish_core::types::Position;

use skirmish_tactics::cover_score::{evaluate_cover, CoverVerdict};
use skirmish_tactics::engagement::{reaction_delay, should_engage};
use skirmish_tactics::gunnery::{peek_plan, plan_burst, spray_plan, BurstContext};

use crate::combatant::{Combatant, PlayerProxy, TargetRef};
use crate::cover::CoverSystem;
use crate::engine::Providers;
use crate::roster::Roster;
use crate::targeting::{find_target, TargetDistributor};
use crate::visibility::{LosEvaluator, ObserverView};

/// Shared per-tick state handed to every handler.
pub struct TickCtx<'a> {
    pub roster: &'a Roster,
    pub los: &'a mut LosEvaluator,
    pub cover: &'a mut CoverSystem,
    pub distributor: &'a mut TargetDistributor,
    pub providers: &'a Providers,
    pub player: Option<(PlayerProxy, Faction)>,
    pub rng: &'a mut ChaCha8Rng,
    pub now: f64,
    pub dt: f64,
}

impl<'a> TickCtx<'a> {
    /// Current position of a target reference, or `None` when it is gone
    /// or dead.
    fn target_position(&self, target: TargetRef) -> Option<Position> {
        match target {
            TargetRef::Agent(e) => self.roster.get(e).filter(|v| v.alive).map(|v| v.pos),
            TargetRef::Player => self
                .player
                .as_ref()
                .filter(|(proxy, _)| proxy.alive)
                .map(|(proxy, _)| proxy.position),
        }
    }
}

fn observer_view(pos: Position, c: &Combatant) -> ObserverView {
    ObserverView {
        pos,
        facing: c.facing,
        fov_rad: c.skill.fov_rad,
        visual_range: c.skill.visual_range,
        detail: c.detail,
    }
}

/// Run one tick of the state machine for one living agent.
pub fn dispatch(entity: Entity, pos: Position, c: &mut Combatant, ctx: &mut TickCtx) {
    match c.state {
        BehaviorState::Patrolling => handle_patrolling(entity, pos, c, ctx),
        BehaviorState::Alert => handle_alert(entity, pos, c, ctx),
        BehaviorState::Engaging => handle_engaging(entity, pos, c, ctx),
        BehaviorState::Suppressing => handle_suppressing(pos, c, ctx),
        BehaviorState::Advancing => handle_advancing(entity, pos, c, ctx),
        BehaviorState::SeekingCover => handle_seeking_cover(entity, pos, c, ctx),
        BehaviorState::Defending => handle_defending(entity, pos, c, ctx),
        BehaviorState::Dead => {}
    }
}

/// Scan for contacts; otherwise wander.
fn handle_patrolling(entity: Entity, pos: Position, c: &mut Combatant, ctx: &mut TickCtx) {
    if let Some(choice) = find_target(
        entity,
        c.faction,
        pos,
        c.skill.visual_range,
        ctx.roster,
        ctx.providers.spatial.as_deref(),
        ctx.distributor,
        ctx.player,
        ctx.rng,
    ) {
        // Point-blank contacts skip the sight check entirely.
        let bypass = choice.distance <= ALWAYS_DETECT_RADIUS;
        let visible = bypass
            || ctx.los.can_see(
                entity,
                &observer_view(pos, c),
                choice.target,
                choice.position,
                ctx.providers,
                ctx.now,
            );
        if visible && should_engage(choice.distance, c.skill.objective_focused, c.recently_hit(ctx.now), ctx.rng)
        {
            let cluster = ctx
                .roster
                .allies_within(entity, c.faction, pos, CLUSTER_RADIUS);
            ctx.distributor.register(choice.target);
            c.target = Some(choice.target);
            c.last_known_target_pos = Some(choice.position);
            c.reaction_timer = reaction_delay(choice.distance, &c.skill, cluster) as f64;
            c.alert_until = ctx.now + ALERT_TIMEOUT_SECS;
            c.facing = pos.bearing_to(&choice.position);
            c.state = BehaviorState::Alert;
            trace!(?entity, "contact");
            return;
        }
    }

    wander(pos, c, ctx);
}

/// Reaction delay is running; open up when it expires if the contact is
/// still there.
fn handle_alert(entity: Entity, pos: Position, c: &mut Combatant, ctx: &mut TickCtx) {
    c.reaction_timer -= ctx.dt;
    if c.reaction_timer > 0.0 {
        if let Some(target_pos) = c.target.and_then(|t| ctx.target_position(t)) {
            c.facing = pos.bearing_to(&target_pos);
        }
        return;
    }

    let Some(target) = c.target else {
        c.state = c.guard_state;
        return;
    };
    let Some(target_pos) = ctx.target_position(target) else {
        c.target = None;
        c.state = c.guard_state;
        return;
    };

    let visible = pos.flat_distance_to(&target_pos) <= ALWAYS_DETECT_RADIUS
        || ctx.los.can_see(
            entity,
            &observer_view(pos, c),
            target,
            target_pos,
            ctx.providers,
            ctx.now,
        );
    if visible {
        c.last_known_target_pos = Some(target_pos);
        c.state = BehaviorState::Engaging;
        c.burst_cooldown = 0.0;
        replan_burst(pos, target_pos, c, ctx);
    } else {
        c.target = None;
        c.state = c.guard_state;
    }
}

/// Main combat state: track the target, manage cover, cycle bursts.
fn handle_engaging(entity: Entity, pos: Position, c: &mut Combatant, ctx: &mut TickCtx) {
    // Suppression orders are driven by the flank coordinator, not here.
    let Some(target) = c.target else {
        end_engagement(entity, c, ctx);
        return;
    };
    let Some(target_pos) = ctx.target_position(target) else {
        end_engagement(entity, c, ctx);
        return;
    };

    c.facing = pos.bearing_to(&target_pos);
    let distance = pos.flat_distance_to(&target_pos);

    let visible = distance <= ALWAYS_DETECT_RADIUS
        || ctx.los.can_see(
            entity,
            &observer_view(pos, c),
            target,
            target_pos,
            ctx.providers,
            ctx.now,
        );

    if !visible {
        if ctx.now >= c.alert_until {
            end_engagement(entity, c, ctx);
        } else {
            // Lost sight but still committed: hose the last known spot.
            c.state = BehaviorState::Suppressing;
            c.suppress_until = ctx.now + SUPPRESS_FIRE_SECS;
            c.last_known_target_pos = Some(target_pos);
            c.apply_burst_plan(spray_plan());
        }
        return;
    }

    c.alert_until = ctx.now + ALERT_TIMEOUT_SECS;
    c.last_known_target_pos = Some(target_pos);

    // Held cover goes stale when the threat works around it.
    if c.in_cover {
        if let Some(cover_pos) = c.cover_pos {
            if ctx.now - c.last_cover_eval_at >= COVER_REEVAL_INTERVAL_SECS {
                c.last_cover_eval_at = ctx.now;
                if evaluate_cover(&cover_pos, &pos, &target_pos) == CoverVerdict::Reposition {
                    ctx.cover.release(entity);
                    c.in_cover = false;
                    c.cover_pos = None;
                    request_cover(entity, pos, target_pos, c, ctx);
                    if c.state == BehaviorState::SeekingCover {
                        return;
                    }
                }
            }
        }
    } else if wants_cover(entity, c, ctx) && ctx.now - c.last_cover_request_at >= COVER_REQUEST_COOLDOWN_SECS
    {
        request_cover(entity, pos, target_pos, c, ctx);
        if c.state == BehaviorState::SeekingCover {
            return;
        }
    }

    // Burst cycle: replan whenever the current burst + pause elapses.
    if c.burst_cooldown <= 0.0 {
        replan_burst(pos, target_pos, c, ctx);
        c.burst_cooldown = (c.burst_secs + c.pause_secs) as f64;
    }
}

/// Blind fire at the last known position until the timer lapses.
fn handle_suppressing(pos: Position, c: &mut Combatant, ctx: &mut TickCtx) {
    if let Some(last) = c.last_known_target_pos {
        c.facing = pos.bearing_to(&last);
    }
    if ctx.now >= c.suppress_until && !c.flanking {
        if ctx.now >= c.alert_until && c.target.is_none() {
            c.state = c.guard_state;
        } else {
            c.state = BehaviorState::Engaging;
        }
    }
}

/// Moving on a coordinator-assigned route; engage on arrival or when an
/// enemy closes in.
fn handle_advancing(entity: Entity, pos: Position, c: &mut Combatant, ctx: &mut TickCtx) {
    // A close visible contact overrides the move order.
    if let Some(choice) = find_target(
        entity,
        c.faction,
        pos,
        ADVANCE_OVERRIDE_RANGE,
        ctx.roster,
        ctx.providers.spatial.as_deref(),
        ctx.distributor,
        ctx.player,
        ctx.rng,
    ) {
        let visible = choice.distance <= ALWAYS_DETECT_RADIUS
            || ctx.los.can_see(
                entity,
                &observer_view(pos, c),
                choice.target,
                choice.position,
                ctx.providers,
                ctx.now,
            );
        if visible {
            ctx.distributor.register(choice.target);
            c.target = Some(choice.target);
            c.last_known_target_pos = Some(choice.position);
            c.alert_until = ctx.now + ALERT_TIMEOUT_SECS;
            c.destination = None;
            c.state = BehaviorState::Engaging;
            c.burst_cooldown = 0.0;
            return;
        }
    }

    let arrived = c
        .destination
        .map(|d| pos.flat_distance_to(&d) <= ARRIVE_RADIUS)
        .unwrap_or(true);
    if arrived {
        c.destination = None;
        c.alert_until = ctx.now + ALERT_TIMEOUT_SECS;
        c.state = BehaviorState::Engaging;
        c.burst_cooldown = 0.0;
    } else if let Some(d) = c.destination {
        c.facing = pos.bearing_to(&d);
    }
}

/// Moving to a claimed cover spot.
fn handle_seeking_cover(entity: Entity, pos: Position, c: &mut Combatant, ctx: &mut TickCtx) {
    if c.target.and_then(|t| ctx.target_position(t)).is_none() {
        end_engagement(entity, c, ctx);
        return;
    }
    let Some(cover_pos) = c.cover_pos else {
        c.state = BehaviorState::Engaging;
        return;
    };

    if pos.flat_distance_to(&cover_pos) <= COVER_ARRIVE_RADIUS {
        c.in_cover = true;
        c.destination = None;
        c.state = BehaviorState::Engaging;
        c.apply_burst_plan(peek_plan());
        c.burst_cooldown = 0.0;
        trace!(?entity, "in cover");
    } else {
        c.destination = Some(cover_pos);
    }
}

/// Holding a zone: short detection range, face outward, stay anchored.
fn handle_defending(entity: Entity, pos: Position, c: &mut Combatant, ctx: &mut TickCtx) {
    if let Some(choice) = find_target(
        entity,
        c.faction,
        pos,
        DEFEND_DETECT_RANGE.min(c.skill.visual_range),
        ctx.roster,
        ctx.providers.spatial.as_deref(),
        ctx.distributor,
        ctx.player,
        ctx.rng,
    ) {
        let visible = choice.distance <= DEFEND_BYPASS_RADIUS
            || ctx.los.can_see(
                entity,
                &observer_view(pos, c),
                choice.target,
                choice.position,
                ctx.providers,
                ctx.now,
            );
        if visible {
            let cluster = ctx
                .roster
                .allies_within(entity, c.faction, pos, CLUSTER_RADIUS);
            ctx.distributor.register(choice.target);
            c.target = Some(choice.target);
            c.last_known_target_pos = Some(choice.position);
            c.reaction_timer = reaction_delay(choice.distance, &c.skill, cluster) as f64;
            c.alert_until = ctx.now + ALERT_TIMEOUT_SECS;
            c.guard_state = BehaviorState::Defending;
            c.facing = pos.bearing_to(&choice.position);
            c.state = BehaviorState::Alert;
            return;
        }
    }

    if let Some(anchor) = c.defend_anchor {
        if pos.flat_distance_to(&anchor) > DEFEND_HOLD_TOLERANCE {
            c.destination = Some(anchor);
        } else {
            c.destination = None;
            // Face away from the zone center, toward likely approach.
            if let Some(center) = c.defend_zone_center {
                c.facing = center.bearing_to(&pos);
            }
        }
    }
}

/// Leave combat entirely and fall back to the guard state.
fn end_engagement(entity: Entity, c: &mut Combatant, ctx: &mut TickCtx) {
    ctx.cover.release(entity);
    c.in_cover = false;
    c.cover_pos = None;
    c.target = None;
    c.last_known_target_pos = None;
    c.full_auto = false;
    c.flanking = false;
    c.destination = None;
    c.state = c.guard_state;
}

/// Whether an engaging agent should break for cover.
fn wants_cover(entity: Entity, c: &Combatant, ctx: &TickCtx) -> bool {
    c.recently_hit(ctx.now)
        || c.health_frac() < COVER_LOW_HEALTH_FRAC
        || c.suppression > COVER_SUPPRESSION_TRIGGER
        || (c.burst_cooldown > COVER_COOLDOWN_TRIGGER_SECS && ctx.roster.is_targeted(entity))
}

/// Look up, claim, and move toward the best available cover spot.
fn request_cover(entity: Entity, pos: Position, threat: Position, c: &mut Combatant, ctx: &mut TickCtx) {
    c.last_cover_request_at = ctx.now;
    if let Some(spot) = ctx.cover.find_best_cover(
        entity,
        pos,
        threat,
        COVER_SEARCH_RADIUS,
        ctx.providers,
        ctx.roster,
        ctx.now,
    ) {
        ctx.cover.claim(entity, spot.position, ctx.now);
        c.cover_pos = Some(spot.position);
        c.destination = Some(spot.position);
        c.state = BehaviorState::SeekingCover;
    }
}

fn replan_burst(pos: Position, target_pos: Position, c: &mut Combatant, ctx: &mut TickCtx) {
    let plan = plan_burst(
        &c.skill,
        &BurstContext {
            distance: pos.flat_distance_to(&target_pos),
            recently_hit: c.recently_hit(ctx.now),
            enemy_density: ctx
                .roster
                .enemies_within(c.faction, pos, ENEMY_DENSITY_RADIUS),
            coordinated_suppression: c.flanking && ctx.now < c.suppress_until,
            in_cover: c.in_cover,
        },
    );
    c.apply_burst_plan(plan);
}

/// Occasional random wander around the current position.
fn wander(pos: Position, c: &mut Combatant, ctx: &mut TickCtx) {
    let arrived = c
        .destination
        .map(|d| pos.flat_distance_to(&d) <= PATROL_REACH)
        .unwrap_or(true);
    if !arrived {
        return;
    }
    c.destination = None;
    if ctx.rng.gen_bool((PATROL_WANDER_CHANCE_PER_SEC * ctx.dt).clamp(0.0, 1.0)) {
        let bearing = ctx.rng.gen_range(0.0..std::f32::consts::TAU);
        let dist = ctx.rng.gen_range(2.0..PATROL_WANDER_RADIUS);
        let dest = pos.offset_bearing(bearing, dist);
        c.facing = bearing;
        c.destination = Some(dest);
    }
}
