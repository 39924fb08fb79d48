//! Target selection with cluster-aware distribution.
//!
//! Isolated agents take the nearest enemy. Agents in a cluster consult the
//! shared targeter counts so a bunched squad spreads fire across the enemy
//! group instead of everyone dog-piling one contact.

use std::collections::HashMap;

use hecs::Entity;
use rand::Rng;

use skirmish_core::constants::*;
use skirmish_core::enums::Faction;
use skirmish_core::types::Position;

use skirmish_tactics::targeting::{distribution_score, in_cluster};

use crate::combatant::{PlayerProxy, TargetRef};
use crate::roster::{Roster, SpatialQuery};

/// Shared targeter counts, rebuilt from the roster at a fixed interval.
/// Between rebuilds, `register` keeps counts current for picks made this
/// interval.
#[derive(Debug, Default)]
pub struct TargetDistributor {
    counts: HashMap<TargetRef, u32>,
    last_rebuild_at: f64,
}

impl TargetDistributor {
    pub fn maybe_rebuild(&mut self, roster: &Roster, now: f64) {
        if now - self.last_rebuild_at < DISTRIBUTION_REBUILD_SECS
            && self.last_rebuild_at != 0.0
        {
            return;
        }
        self.last_rebuild_at = now;
        self.counts.clear();
        for view in roster.iter() {
            if !view.alive {
                continue;
            }
            if let Some(target) = view.target {
                *self.counts.entry(target).or_insert(0) += 1;
            }
        }
    }

    /// Record a pick made between rebuilds.
    pub fn register(&mut self, target: TargetRef) {
        *self.counts.entry(target).or_insert(0) += 1;
    }

    pub fn count(&self, target: TargetRef) -> u32 {
        self.counts.get(&target).copied().unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.counts.clear();
        self.last_rebuild_at = 0.0;
    }
}

/// A selected target and where it was when selected.
#[derive(Debug, Clone, Copy)]
pub struct TargetChoice {
    pub target: TargetRef,
    pub position: Position,
    pub distance: f32,
}

/// Pick a target for `agent` from living enemies within `max_range`, plus
/// the player proxy when this faction hunts the player.
///
/// Selection only; the caller registers the pick on the distributor when
/// it actually commits to the target, so rejected picks (blocked sight,
/// declined engagement) never skew the shared counts.
#[allow(clippy::too_many_arguments)]
pub fn find_target(
    agent: Entity,
    faction: Faction,
    pos: Position,
    max_range: f32,
    roster: &Roster,
    spatial: Option<&dyn SpatialQuery>,
    distributor: &TargetDistributor,
    player: Option<(PlayerProxy, Faction)>,
    rng: &mut impl Rng,
) -> Option<TargetChoice> {
    let mut candidates: Vec<TargetChoice> = roster
        .within(spatial, pos, max_range)
        .into_iter()
        .filter(|v| v.faction != faction && v.entity != agent)
        .map(|v| TargetChoice {
            target: TargetRef::Agent(v.entity),
            position: v.pos,
            distance: pos.flat_distance_to(&v.pos),
        })
        .collect();

    if let Some((proxy, hunter)) = player {
        if hunter == faction && proxy.alive {
            let distance = pos.flat_distance_to(&proxy.position);
            if distance <= max_range {
                candidates.push(TargetChoice {
                    target: TargetRef::Player,
                    position: proxy.position,
                    distance,
                });
            }
        }
    }

    if candidates.is_empty() {
        return None;
    }

    let allies = roster.allies_within(agent, faction, pos, CLUSTER_RADIUS);
    if in_cluster(allies) {
        candidates
            .into_iter()
            .map(|c| {
                let score = distribution_score(max_range, c.distance, distributor.count(c.target), rng);
                (score, c)
            })
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, c)| c)
    } else {
        candidates
            .into_iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
