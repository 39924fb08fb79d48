//! Cover discovery and exclusive occupancy.
//!
//! Terrain cover is discovered lazily per world cell and cached with a
//! TTL; obstacle cover is derived on demand from the obstacle provider.
//! Occupancy is a claim table keyed by quantized world position, so two
//! agents can never hold the same physical spot at once.

use std::collections::HashMap;

use hecs::Entity;
use tracing::debug;

use skirmish_core::constants::*;
use skirmish_core::enums::{BehaviorState, CoverSource};
use skirmish_core::providers::TerrainProvider;
use skirmish_core::types::Position;

use skirmish_tactics::cover_score::{score_candidate, CoverCandidate};

use crate::engine::Providers;
use crate::roster::Roster;

/// Occupancy key: world position quantized to `COVER_KEY_QUANT` meters,
/// so near-identical spots from different discovery passes collapse to
/// one claimable slot.
pub fn cover_key(pos: Position) -> (i32, i32) {
    (
        (pos.x / COVER_KEY_QUANT).round() as i32,
        (pos.z / COVER_KEY_QUANT).round() as i32,
    )
}

#[derive(Debug)]
struct CellCache {
    spots: Vec<CoverCandidate>,
    built_at: f64,
}

#[derive(Debug, Clone, Copy)]
struct Claim {
    holder: Entity,
    claimed_at: f64,
}

/// Shared cover service: per-cell terrain spot cache plus the exclusive
/// occupancy table.
#[derive(Debug, Default)]
pub struct CoverSystem {
    cells: HashMap<(i32, i32), CellCache>,
    occupancy: HashMap<(i32, i32), Claim>,
    last_cleanup_at: f64,
}

impl CoverSystem {
    /// Best unclaimed cover spot for `agent` against a threat at
    /// `threat_pos`, searching within `radius` of `agent_pos`. Does not
    /// claim it.
    pub fn find_best_cover(
        &mut self,
        agent: Entity,
        agent_pos: Position,
        threat_pos: Position,
        radius: f32,
        providers: &Providers,
        roster: &Roster,
        now: f64,
    ) -> Option<CoverCandidate> {
        let mut candidates = self.terrain_candidates(agent_pos, radius, providers, now);
        candidates.extend(obstacle_candidates(agent_pos, threat_pos, radius, providers));

        let mut best: Option<(f32, CoverCandidate)> = None;
        for spot in candidates {
            if agent_pos.flat_distance_to(&spot.position) > radius {
                continue;
            }
            if self.is_claimed_by_other(agent, spot.position, roster, now) {
                continue;
            }
            let score = score_candidate(&agent_pos, &threat_pos, &spot);
            if best.map(|(s, _)| score > s).unwrap_or(true) {
                best = Some((score, spot));
            }
        }
        best.map(|(_, spot)| spot)
    }

    /// Claim a spot for `agent`, releasing any spot it previously held.
    /// Last claim wins.
    pub fn claim(&mut self, agent: Entity, pos: Position, now: f64) {
        self.occupancy.retain(|_, c| c.holder != agent);
        self.occupancy.insert(
            cover_key(pos),
            Claim {
                holder: agent,
                claimed_at: now,
            },
        );
    }

    /// Release whatever spot `agent` holds, if any.
    pub fn release(&mut self, agent: Entity) {
        self.occupancy.retain(|_, c| c.holder != agent);
    }

    /// Current holder of the spot at `pos`.
    pub fn occupant(&self, pos: Position) -> Option<Entity> {
        self.occupancy.get(&cover_key(pos)).map(|c| c.holder)
    }

    pub fn occupied_count(&self) -> usize {
        self.occupancy.len()
    }

    /// Periodic sweep: drop claims held by agents that are dead, gone, or
    /// no longer in or moving to cover.
    pub fn cleanup(&mut self, roster: &Roster, now: f64) {
        if now - self.last_cleanup_at < COVER_CLEANUP_INTERVAL_SECS {
            return;
        }
        self.last_cleanup_at = now;
        let before = self.occupancy.len();
        self.occupancy.retain(|_, c| {
            roster
                .get(c.holder)
                .map(|v| v.alive && (v.in_cover || v.state == BehaviorState::SeekingCover))
                .unwrap_or(false)
        });
        if self.occupancy.len() != before {
            debug!(
                released = before - self.occupancy.len(),
                "swept stale cover claims"
            );
        }
    }

    pub fn reset(&mut self) {
        self.cells.clear();
        self.occupancy.clear();
        self.last_cleanup_at = 0.0;
    }

    fn is_claimed_by_other(
        &mut self,
        agent: Entity,
        pos: Position,
        roster: &Roster,
        now: f64,
    ) -> bool {
        let key = cover_key(pos);
        match self.occupancy.get(&key).copied() {
            None => false,
            Some(c) if c.holder == agent => false,
            // The roster snapshot can predate a claim made this tick, so
            // fresh claims are taken at face value.
            Some(c) if now - c.claimed_at < COVER_CLAIM_GRACE_SECS => true,
            Some(c) => {
                // Stale claims are purged inline rather than waiting for
                // the periodic sweep. Same predicate as `cleanup`: the
                // holder must be alive and actually using the spot.
                let valid = roster
                    .get(c.holder)
                    .map(|v| v.alive && (v.in_cover || v.state == BehaviorState::SeekingCover))
                    .unwrap_or(false);
                if !valid {
                    self.occupancy.remove(&key);
                }
                valid
            }
        }
    }

    /// Terrain spots from every cached cell overlapping the search circle,
    /// rebuilding cells whose cache has expired.
    fn terrain_candidates(
        &mut self,
        center: Position,
        radius: f32,
        providers: &Providers,
        now: f64,
    ) -> Vec<CoverCandidate> {
        let Some(terrain) = providers.terrain.as_deref() else {
            return Vec::new();
        };

        let min_cx = ((center.x - radius) / COVER_CELL_SIZE).floor() as i32;
        let max_cx = ((center.x + radius) / COVER_CELL_SIZE).floor() as i32;
        let min_cz = ((center.z - radius) / COVER_CELL_SIZE).floor() as i32;
        let max_cz = ((center.z + radius) / COVER_CELL_SIZE).floor() as i32;

        let mut out = Vec::new();
        for cx in min_cx..=max_cx {
            for cz in min_cz..=max_cz {
                let stale = self
                    .cells
                    .get(&(cx, cz))
                    .map(|c| now - c.built_at > COVER_CELL_TTL_SECS)
                    .unwrap_or(true);
                if stale {
                    let spots = scan_cell(terrain, cx, cz);
                    self.cells.insert(
                        (cx, cz),
                        CellCache {
                            spots,
                            built_at: now,
                        },
                    );
                }
                out.extend(self.cells[&(cx, cz)].spots.iter().copied());
            }
        }
        out
    }
}

/// Sample the heightfield across one cell and keep the highest-relief
/// points as terrain cover.
fn scan_cell(terrain: &dyn TerrainProvider, cx: i32, cz: i32) -> Vec<CoverCandidate> {
    let origin_x = cx as f32 * COVER_CELL_SIZE;
    let origin_z = cz as f32 * COVER_CELL_SIZE;
    let steps = (COVER_CELL_SIZE / COVER_SAMPLE_STEP) as i32;

    let mut samples = Vec::with_capacity((steps * steps) as usize);
    let mut mean = 0.0f32;
    for i in 0..steps {
        for j in 0..steps {
            let x = origin_x + (i as f32 + 0.5) * COVER_SAMPLE_STEP;
            let z = origin_z + (j as f32 + 0.5) * COVER_SAMPLE_STEP;
            let h = terrain.height_at(x, z);
            mean += h;
            samples.push((x, z, h));
        }
    }
    if samples.is_empty() {
        return Vec::new();
    }
    mean /= samples.len() as f32;

    // Relief relative to the cell mean: local high ground shelters the
    // low side next to it.
    let mut spots: Vec<CoverCandidate> = samples
        .into_iter()
        .filter_map(|(x, z, h)| {
            let relief = h - mean;
            (relief >= COVER_MIN_RELIEF).then(|| CoverCandidate {
                position: Position::new(x, h, z),
                source: CoverSource::TerrainRelief,
                relief,
            })
        })
        .collect();
    spots.sort_by(|a, b| b.relief.total_cmp(&a.relief));
    spots.truncate(COVER_SPOTS_PER_CELL);
    spots
}

/// Cover points around static obstacles: the far side from the threat
/// plus the two lateral faces.
fn obstacle_candidates(
    agent_pos: Position,
    threat_pos: Position,
    radius: f32,
    providers: &Providers,
) -> Vec<CoverCandidate> {
    let Some(obstacles) = providers.obstacles.as_deref() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for aabb in obstacles.obstacles_near(agent_pos, radius) {
        let center = aabb.center();
        let away = threat_pos.flat_direction_to(&center);
        let lateral = glam::Vec3::new(-away.z, 0.0, away.x);
        let half_x = (aabb.max.x - aabb.min.x) * 0.5;
        let half_z = (aabb.max.z - aabb.min.z) * 0.5;
        let standoff = half_x.max(half_z) + 1.0;
        let relief = aabb.height();

        for dir in [away, lateral, -lateral] {
            let p = center.to_vec3() + dir * standoff;
            out.push(CoverCandidate {
                position: Position::new(p.x, center.y, p.z),
                source: CoverSource::StaticObstacle,
                relief,
            });
        }
    }
    out
}
