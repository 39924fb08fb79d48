//! Zone defense assignment.
//!
//! A periodic pass that posts idle patrollers to nearby friendly zones,
//! up to a per-zone quota derived from squad strength. Assigned agents
//! anchor on the zone perimeter and switch their guard state to
//! `Defending` so disengagements return them to their post.

use std::collections::HashMap;

use hecs::{Entity, World};
use rand::Rng;
use tracing::debug;

use skirmish_core::constants::*;
use skirmish_core::enums::{BehaviorState, Faction, SquadRole};
use skirmish_core::providers::Zone;
use skirmish_core::types::Position;

use crate::combatant::Combatant;
use crate::engine::Providers;
use crate::squad::{Squad, SquadId};

pub fn run(
    world: &mut World,
    squads: &HashMap<SquadId, Squad>,
    providers: &Providers,
    rng: &mut impl Rng,
    now: f64,
) {
    let Some(zone_provider) = providers.zones.as_deref() else {
        return;
    };
    let zones = zone_provider.zones();
    if zones.is_empty() {
        return;
    }

    // Current defender head-count per zone.
    let mut defenders: Vec<usize> = vec![0; zones.len()];
    for (_, c) in world.query::<&Combatant>().iter() {
        if !c.alive || c.guard_state != BehaviorState::Defending {
            continue;
        }
        if let Some(center) = c.defend_zone_center {
            if let Some(i) = nearest_zone_index(&zones, center, None) {
                defenders[i] += 1;
            }
        }
    }

    // Idle patrollers eligible for a post.
    let candidates: Vec<(Entity, Position, Faction, Option<SquadId>)> = world
        .query::<(&Combatant, &Position)>()
        .iter()
        .filter(|(_, (c, _))| {
            c.alive
                && c.state == BehaviorState::Patrolling
                && c.role != SquadRole::Leader
                && now - c.last_defense_assign_at >= ZONE_REASSIGN_COOLDOWN_SECS
        })
        .map(|(e, (c, pos))| (e, *pos, c.faction, c.squad))
        .collect();

    for (entity, pos, faction, squad) in candidates {
        let quota_base = squad
            .and_then(|id| squads.get(&id))
            .map(|s| s.living_members(world).len())
            .unwrap_or(1);
        let quota = (quota_base / ZONE_QUOTA_DIVISOR).max(1);

        let Some(i) = nearest_zone_index(&zones, pos, Some(faction)) else {
            continue;
        };
        let zone = &zones[i];
        if pos.flat_distance_to(&zone.position) > ZONE_ASSIGN_RANGE {
            continue;
        }
        if defenders[i] >= quota {
            continue;
        }

        let Ok(mut c) = world.get::<&mut Combatant>(entity) else {
            continue;
        };
        let bearing = rng.gen_range(0.0..std::f32::consts::TAU);
        let anchor = zone
            .position
            .offset_bearing(bearing, zone.radius * ZONE_PERIMETER_FRACTION);
        c.state = BehaviorState::Defending;
        c.guard_state = BehaviorState::Defending;
        c.defend_anchor = Some(anchor);
        c.defend_zone_center = Some(zone.position);
        c.destination = Some(anchor);
        c.last_defense_assign_at = now;
        defenders[i] += 1;
        debug!(?entity, zone = i, "posted to zone defense");
    }
}

/// Index of the zone nearest to `pos`, optionally restricted to zones
/// owned by `faction`.
fn nearest_zone_index(zones: &[Zone], pos: Position, faction: Option<Faction>) -> Option<usize> {
    zones
        .iter()
        .enumerate()
        .filter(|(_, z)| faction.map(|f| z.owner == f).unwrap_or(true))
        .min_by(|(_, a), (_, b)| {
            pos.flat_distance_to(&a.position)
                .total_cmp(&pos.flat_distance_to(&b.position))
        })
        .map(|(i, _)| i)
}
