//! Squad-level flanking operations.
//!
//! One active operation per squad, driven through planning, suppression,
//! movement, and assault phases by the coordinator each tick. The pure
//! geometry (side choice, waypoints, role split) lives in the tactics
//! crate; this module owns the lifecycle and writes participant state.

use std::collections::HashMap;

use hecs::{Entity, World};
use rand::Rng;
use tracing::{debug, info};

use skirmish_core::constants::*;
use skirmish_core::enums::{BehaviorState, FlankSide, FlankStatus};
use skirmish_core::types::Position;

use skirmish_tactics::flank_plan::{choose_side, flank_waypoint, flanker_destination, split_roles};
use skirmish_tactics::gunnery::full_auto_plan;

use crate::combatant::{Combatant, PlayerProxy, TargetRef};
use crate::cover::CoverSystem;
use crate::engine::Providers;
use crate::roster::Roster;
use crate::squad::{Squad, SquadId};

/// One in-flight flanking maneuver.
#[derive(Debug, Clone)]
pub struct FlankingOperation {
    pub squad: SquadId,
    pub target: TargetRef,
    pub target_pos: Position,
    pub suppressors: Vec<Entity>,
    pub flankers: Vec<Entity>,
    pub side: FlankSide,
    pub waypoint: Position,
    pub status: FlankStatus,
    pub started_at: f64,
    pub status_changed_at: f64,
    pub living_at_start: usize,
}

impl FlankingOperation {
    fn participants(&self) -> impl Iterator<Item = Entity> + '_ {
        self.suppressors.iter().chain(self.flankers.iter()).copied()
    }

    fn living_participants(&self, world: &World) -> usize {
        self.participants()
            .filter(|&e| {
                world
                    .get::<&Combatant>(e)
                    .map(|c| c.alive)
                    .unwrap_or(false)
            })
            .count()
    }
}

/// Per-squad flank lifecycle driver.
#[derive(Debug, Default)]
pub struct FlankingCoordinator {
    ops: HashMap<SquadId, FlankingOperation>,
    /// When each squad started engaging its current dominant target,
    /// for stall detection.
    stall: HashMap<SquadId, (TargetRef, f64)>,
}

impl FlankingCoordinator {
    /// Advance every squad's flank state. Finished operations from the
    /// previous tick are dropped first, so their terminal status stays
    /// observable for one tick.
    pub fn run(
        &mut self,
        world: &mut World,
        squads: &mut HashMap<SquadId, Squad>,
        providers: &Providers,
        cover: &mut CoverSystem,
        roster: &Roster,
        player: Option<(&PlayerProxy, skirmish_core::enums::Faction)>,
        rng: &mut impl Rng,
        now: f64,
    ) {
        self.ops.retain(|_, op| {
            !matches!(op.status, FlankStatus::Complete | FlankStatus::Aborted)
        });

        // Stable order so RNG draws do not depend on map iteration.
        let mut ids: Vec<SquadId> = squads.keys().copied().collect();
        ids.sort();
        for id in ids {
            if self.ops.contains_key(&id) {
                self.update_operation(id, world, cover, now);
            } else {
                let Some(squad) = squads.get(&id) else { continue };
                if let Some(plan) = self.should_initiate(id, squad, world, roster, player, now) {
                    if let Some(squad) = squads.get_mut(&id) {
                        self.initiate(id, squad, world, providers, plan, rng, now);
                    }
                }
            }
        }
    }

    /// The active or just-finished operation for a squad.
    pub fn operation(&self, squad: SquadId) -> Option<&FlankingOperation> {
        self.ops.get(&squad)
    }

    pub fn reset(&mut self) {
        self.ops.clear();
        self.stall.clear();
    }

    /// Check preconditions and find the dominant target. Returns the
    /// target and its position when a flank should start.
    fn should_initiate(
        &mut self,
        id: SquadId,
        squad: &Squad,
        world: &World,
        roster: &Roster,
        player: Option<(&PlayerProxy, skirmish_core::enums::Faction)>,
        now: f64,
    ) -> Option<(TargetRef, Position, Position)> {
        let living = squad.living_members(world);
        if living.len() < FLANK_MIN_SQUAD {
            self.stall.remove(&id);
            return None;
        }
        if !squad.leader_alive(world) {
            return None;
        }
        if now - squad.last_flank_at < FLANK_COOLDOWN_SECS {
            return None;
        }

        // Dominant target: the one most engaging members share, with at
        // least two backers. Tallied in member order so ties resolve the
        // same way every run.
        let mut tallies: Vec<(TargetRef, u32)> = Vec::new();
        for &member in &living {
            if let Ok(c) = world.get::<&Combatant>(member) {
                if matches!(
                    c.state,
                    BehaviorState::Engaging | BehaviorState::Suppressing | BehaviorState::Advancing
                ) {
                    if let Some(t) = c.target {
                        match tallies.iter_mut().find(|(existing, _)| *existing == t) {
                            Some((_, n)) => *n += 1,
                            None => tallies.push((t, 1)),
                        }
                    }
                }
            }
        }
        let (target, backers) = tallies.into_iter().max_by_key(|&(_, n)| n)?;
        if backers < 2 {
            self.stall.remove(&id);
            return None;
        }

        let target_pos = target_position(target, roster, player)?;
        let centroid = squad.centroid(world)?;
        let range = centroid.flat_distance_to(&target_pos);
        if !(FLANK_MIN_RANGE..=FLANK_MAX_RANGE).contains(&range) {
            return None;
        }

        // Track how long the squad has been stuck on this target.
        let stalled = match self.stall.get(&id) {
            Some(&(t, since)) if t == target => now - since >= STALL_ENGAGE_SECS,
            _ => {
                self.stall.insert(id, (target, now));
                false
            }
        };
        let under_fire = now - squad.last_damage_at <= SQUAD_RECENT_DAMAGE_SECS;
        if !(under_fire || stalled) {
            return None;
        }

        Some((target, target_pos, centroid))
    }

    fn initiate(
        &mut self,
        id: SquadId,
        squad: &mut Squad,
        world: &mut World,
        providers: &Providers,
        plan: (TargetRef, Position, Position),
        rng: &mut impl Rng,
        now: f64,
    ) {
        let (target, target_pos, centroid) = plan;
        let living = squad.living_members(world);
        let side = choose_side(&centroid, &target_pos, providers.terrain.as_deref(), rng);
        let waypoint = flank_waypoint(&target_pos, &centroid, side);
        let (suppressors, flankers) = split_roles(&living, squad.leader);

        for e in suppressors.iter().chain(flankers.iter()).copied() {
            if let Ok(mut c) = world.get::<&mut Combatant>(e) {
                c.flanking = true;
            }
        }

        squad.last_flank_at = now;
        self.stall.remove(&id);

        info!(
            squad = id.0,
            ?side,
            suppressors = suppressors.len(),
            flankers = flankers.len(),
            "flank initiated"
        );

        self.ops.insert(
            id,
            FlankingOperation {
                squad: id,
                target,
                target_pos,
                living_at_start: suppressors.len() + flankers.len(),
                suppressors,
                flankers,
                side,
                waypoint,
                status: FlankStatus::Planning,
                started_at: now,
                status_changed_at: now,
            },
        );
    }

    fn update_operation(
        &mut self,
        id: SquadId,
        world: &mut World,
        cover: &mut CoverSystem,
        now: f64,
    ) {
        let Some(op) = self.ops.get_mut(&id) else {
            return;
        };

        let living = op.living_participants(world);
        let casualties = op.living_at_start.saturating_sub(living);
        if living < 2
            || casualties >= FLANK_CASUALTY_ABORT as usize
            || now - op.started_at > FLANK_TIMEOUT_SECS
        {
            debug!(squad = id.0, living, casualties, "flank aborted");
            op.status = FlankStatus::Aborted;
            op.status_changed_at = now;
            let participants: Vec<Entity> = op.participants().collect();
            clear_participants(world, &participants);
            return;
        }

        match op.status {
            FlankStatus::Planning => {
                // Arm the base of fire.
                for &e in &op.suppressors {
                    if let Ok(mut c) = world.get::<&mut Combatant>(e) {
                        if !c.alive {
                            continue;
                        }
                        // An interrupted cover move never finishes; drop
                        // the claim. Held cover stays held.
                        if !c.in_cover && c.cover_pos.take().is_some() {
                            cover.release(e);
                        }
                        c.state = BehaviorState::Suppressing;
                        c.target = Some(op.target);
                        c.last_known_target_pos = Some(op.target_pos);
                        c.suppress_until = now + FLANK_SUPPRESS_SECS;
                        c.apply_burst_plan(full_auto_plan());
                        c.burst_cooldown = 0.0;
                    }
                }
                op.status = FlankStatus::Suppressing;
                op.status_changed_at = now;
            }
            FlankStatus::Suppressing => {
                if now - op.status_changed_at >= FLANK_SUPPRESS_SECS {
                    let count = op.flankers.len();
                    for (i, &e) in op.flankers.iter().enumerate() {
                        if let Ok(mut c) = world.get::<&mut Combatant>(e) {
                            if !c.alive {
                                continue;
                            }
                            // Flankers leave whatever cover they had.
                            cover.release(e);
                            c.in_cover = false;
                            c.cover_pos = None;
                            c.state = BehaviorState::Advancing;
                            c.target = Some(op.target);
                            c.destination =
                                Some(flanker_destination(&op.waypoint, &op.target_pos, i, count));
                        }
                    }
                    debug!(squad = id.0, "flankers moving");
                    op.status = FlankStatus::Flanking;
                    op.status_changed_at = now;
                }
            }
            FlankStatus::Flanking => {
                let mut living_flankers = 0usize;
                let mut arrived = 0usize;
                for &e in &op.flankers {
                    let Ok(c) = world.get::<&Combatant>(e) else {
                        continue;
                    };
                    if !c.alive {
                        continue;
                    }
                    living_flankers += 1;
                    let pos = world.get::<&Position>(e).map(|p| *p);
                    let done = match (c.destination, pos) {
                        (Some(dest), Ok(pos)) => pos.flat_distance_to(&dest) <= FLANK_ARRIVE_RADIUS,
                        _ => true,
                    };
                    if done {
                        arrived += 1;
                    }
                }
                let frac = if living_flankers == 0 {
                    1.0
                } else {
                    arrived as f32 / living_flankers as f32
                };
                if frac >= FLANK_ARRIVED_FRACTION {
                    // Assault: everyone opens up together.
                    let participants: Vec<Entity> = op.participants().collect();
                    for e in participants {
                        if let Ok(mut c) = world.get::<&mut Combatant>(e) {
                            if !c.alive {
                                continue;
                            }
                            c.state = BehaviorState::Engaging;
                            c.target = Some(op.target);
                            c.destination = None;
                            c.suppress_until = 0.0;
                            c.apply_burst_plan(full_auto_plan());
                            c.burst_cooldown = 0.0;
                        }
                    }
                    debug!(squad = id.0, "flank assault");
                    op.status = FlankStatus::Engaging;
                    op.status_changed_at = now;
                }
            }
            FlankStatus::Engaging => {
                if now - op.status_changed_at >= FLANK_ENGAGE_SECS {
                    info!(squad = id.0, "flank complete");
                    op.status = FlankStatus::Complete;
                    op.status_changed_at = now;
                    for e in op.participants().collect::<Vec<_>>() {
                        if let Ok(mut c) = world.get::<&mut Combatant>(e) {
                            c.flanking = false;
                            c.full_auto = false;
                        }
                    }
                }
            }
            FlankStatus::Complete | FlankStatus::Aborted => {}
        }
    }
}

/// Release aborted participants back to independent behavior: clear the
/// coordination fields but leave whatever state they were in.
fn clear_participants(world: &mut World, participants: &[Entity]) {
    for &e in participants {
        if let Ok(mut c) = world.get::<&mut Combatant>(e) {
            c.flanking = false;
            c.full_auto = false;
            c.destination = None;
            c.suppress_until = 0.0;
        }
    }
}

/// Resolve a target reference to a current position.
fn target_position(
    target: TargetRef,
    roster: &Roster,
    player: Option<(&PlayerProxy, skirmish_core::enums::Faction)>,
) -> Option<Position> {
    match target {
        TargetRef::Agent(e) => roster.get(e).filter(|v| v.alive).map(|v| v.pos),
        TargetRef::Player => player
            .filter(|(proxy, _)| proxy.alive)
            .map(|(proxy, _)| proxy.position),
    }
}
