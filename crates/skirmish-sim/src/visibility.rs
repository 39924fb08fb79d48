//! Line-of-sight evaluation with caching and a shared raycast budget.
//!
//! Cheap gates run first (range, field of view); only pairs that pass both
//! touch the cache or spend budget on occlusion checks. The budget bounds
//! worst-case per-tick cost regardless of agent count: when it runs out,
//! calls degrade to the last cached answer, or a conservative "not
//! visible".

use std::collections::HashMap;

use hecs::Entity;
use tracing::trace;

use skirmish_core::constants::*;
use skirmish_core::enums::SimDetail;
use skirmish_core::types::Position;

use crate::combatant::TargetRef;
use crate::engine::Providers;

/// Shared per-tick cap on expensive occlusion checks.
#[derive(Debug, Default)]
pub struct RaycastBudget {
    remaining: u32,
    denials: u64,
}

impl RaycastBudget {
    pub fn reset(&mut self, per_tick: u32) {
        self.remaining = per_tick;
    }

    /// Take one unit of budget. Records a denial when exhausted.
    pub fn try_consume(&mut self) -> bool {
        if self.remaining > 0 {
            self.remaining -= 1;
            true
        } else {
            self.denials += 1;
            false
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Total denials since construction or reset.
    pub fn denials(&self) -> u64 {
        self.denials
    }
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    visible: bool,
    stamp: f64,
}

/// Observer parameters for a visibility query.
#[derive(Debug, Clone, Copy)]
pub struct ObserverView {
    pub pos: Position,
    pub facing: f32,
    pub fov_rad: f32,
    pub visual_range: f32,
    pub detail: SimDetail,
}

/// The line-of-sight evaluator: FOV/range gates, a short-TTL result cache
/// keyed by (observer, target), and the shared raycast budget.
#[derive(Debug, Default)]
pub struct LosEvaluator {
    cache: HashMap<(Entity, TargetRef), CacheEntry>,
    pub budget: RaycastBudget,
    last_sweep_at: f64,
}

impl LosEvaluator {
    /// Reset the budget and sweep the cache if it has grown too large.
    pub fn begin_tick(&mut self, per_tick_budget: u32, now: f64) {
        self.budget.reset(per_tick_budget);

        if self.cache.len() > LOS_CACHE_SWEEP_THRESHOLD
            && now - self.last_sweep_at >= LOS_CACHE_SWEEP_INTERVAL_SECS
        {
            self.cache
                .retain(|_, entry| now - entry.stamp <= LOS_CACHE_TTL_SECS);
            self.last_sweep_at = now;
        }
    }

    /// Can `observer` see a target at `target_pos`?
    pub fn can_see(
        &mut self,
        observer: Entity,
        view: &ObserverView,
        target: TargetRef,
        target_pos: Position,
        providers: &Providers,
        now: f64,
    ) -> bool {
        let distance = view.pos.distance_to(&target_pos);
        if distance > view.visual_range {
            return false;
        }

        // Field of view: angle between facing and direction-to-target.
        let bearing = view.pos.bearing_to(&target_pos);
        let mut diff = (bearing - view.facing).rem_euclid(std::f32::consts::TAU);
        if diff > std::f32::consts::PI {
            diff -= std::f32::consts::TAU;
        }
        if diff.abs() > view.fov_rad * 0.5 {
            return false;
        }

        let key = (observer, target);
        if let Some(entry) = self.cache.get(&key) {
            if now - entry.stamp <= LOS_CACHE_TTL_SECS {
                return entry.visible;
            }
        }

        // Cheap heightfield pre-filter for long-range pairs: a midpoint
        // well above the sight line rejects without spending budget.
        if distance >= LOS_PREFILTER_MIN_RANGE {
            if let Some(terrain) = providers.terrain.as_deref() {
                let mid_x = (view.pos.x + target_pos.x) * 0.5;
                let mid_z = (view.pos.z + target_pos.z) * 0.5;
                let ray_height = (view.pos.y + target_pos.y) * 0.5;
                if terrain.height_at(mid_x, mid_z) > ray_height + 1.0 {
                    self.cache.insert(
                        key,
                        CacheEntry {
                            visible: false,
                            stamp: now,
                        },
                    );
                    return false;
                }
            }
        }

        if !self.budget.try_consume() {
            // Budget exhausted: fall back to the stale cached value when one
            // exists, else assume not visible.
            trace!(?observer, "raycast budget exhausted");
            return self.cache.get(&key).map(|e| e.visible).unwrap_or(false);
        }

        let visible = self.occlusion_clear(view, target_pos, distance, providers);
        self.cache.insert(
            key,
            CacheEntry {
                visible,
                stamp: now,
            },
        );
        visible
    }

    /// The expensive path: terrain, static obstacles, smoke. Any one of
    /// them blocking means "not visible". Missing providers are treated
    /// as unoccluded.
    fn occlusion_clear(
        &self,
        view: &ObserverView,
        target_pos: Position,
        distance: f32,
        providers: &Providers,
    ) -> bool {
        // Terrain occlusion, skipped for reduced-detail agents.
        if view.detail == SimDetail::Full {
            if let Some(terrain) = providers.terrain.as_deref() {
                let dir = (target_pos.to_vec3() - view.pos.to_vec3()).normalize_or_zero();
                if let Some(hit) = terrain.raycast(view.pos, dir, distance) {
                    if hit.distance < distance * 0.98 {
                        return false;
                    }
                }
            }
        }

        if let Some(obstacles) = providers.obstacles.as_deref() {
            let mid = Position::new(
                (view.pos.x + target_pos.x) * 0.5,
                (view.pos.y + target_pos.y) * 0.5,
                (view.pos.z + target_pos.z) * 0.5,
            );
            for aabb in obstacles.obstacles_near(mid, distance * 0.5 + 2.0) {
                if aabb.intersects_segment(&view.pos, &target_pos) {
                    return false;
                }
            }
        }

        if let Some(smoke) = providers.smoke.as_deref() {
            if smoke.segment_blocked(view.pos, target_pos) {
                return false;
            }
        }

        true
    }

    /// Number of cached pair results.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn reset(&mut self) {
        self.cache.clear();
        self.budget = RaycastBudget::default();
        self.last_sweep_at = 0.0;
    }
}
