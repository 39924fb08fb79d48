//! Squad standing-order translation.
//!
//! Converts the externally issued squad command into per-member movement
//! destinations. Orders never override active combat: only members sitting
//! in their guard state get moved.

use std::collections::HashMap;

use hecs::World;
use rand::Rng;

use skirmish_core::constants::*;
use skirmish_core::enums::{BehaviorState, SquadCommandKind};
use skirmish_core::types::Position;

use crate::combatant::Combatant;
use crate::squad::{Squad, SquadId};

pub fn run(world: &mut World, squads: &HashMap<SquadId, Squad>, rng: &mut impl Rng) {
    // Stable order so RNG draws do not depend on map iteration.
    let mut ids: Vec<SquadId> = squads.keys().copied().collect();
    ids.sort();
    for id in ids {
        let Some(squad) = squads.get(&id) else { continue };
        if squad.command == SquadCommandKind::FreeRoam {
            continue;
        }
        let Some(anchor) = squad.anchor else { continue };
        let living = squad.living_members(world);
        let count = living.len().max(1);

        for (slot, &member) in living.iter().enumerate() {
            let pos = match world.get::<&Position>(member) {
                Ok(p) => *p,
                Err(_) => continue,
            };
            let Ok(mut c) = world.get::<&mut Combatant>(member) else {
                continue;
            };
            if c.state != BehaviorState::Patrolling {
                continue;
            }

            match squad.command {
                SquadCommandKind::Follow => {
                    // Ring formation around the anchor, one slot per member.
                    let bearing = slot as f32 / count as f32 * std::f32::consts::TAU;
                    let dest = anchor.offset_bearing(bearing, FOLLOW_RING_RADIUS);
                    if pos.flat_distance_to(&dest) > HOLD_TOLERANCE {
                        c.destination = Some(dest);
                    }
                }
                SquadCommandKind::HoldPosition => {
                    if pos.flat_distance_to(&anchor) > HOLD_TOLERANCE {
                        c.destination = Some(anchor);
                    } else {
                        c.destination = None;
                    }
                }
                SquadCommandKind::PatrolArea => {
                    let arrived = c
                        .destination
                        .map(|d| pos.flat_distance_to(&d) <= PATROL_REACH)
                        .unwrap_or(true);
                    if arrived {
                        let bearing = rng.gen_range(0.0..std::f32::consts::TAU);
                        let dist = rng.gen_range(0.0..squad.patrol_radius);
                        c.destination = Some(anchor.offset_bearing(bearing, dist));
                    }
                }
                SquadCommandKind::Retreat => {
                    // Fall back past the anchor, directly away from the last
                    // known threat when one exists.
                    let bearing = match c.last_known_target_pos {
                        Some(threat) => threat.bearing_to(&anchor),
                        None => pos.bearing_to(&anchor),
                    };
                    let dest = anchor.offset_bearing(bearing, RETREAT_OFFSET);
                    if pos.flat_distance_to(&dest) > HOLD_TOLERANCE {
                        c.destination = Some(dest);
                    }
                }
                SquadCommandKind::FreeRoam => {}
            }
        }
    }
}
