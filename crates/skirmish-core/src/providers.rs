//! Capability traits for external collaborators.
//!
//! The tactical core consumes these but never implements the real versions:
//! terrain, static obstacles, zone ownership, and smoke are owned by other
//! parts of the simulation. Every provider is optional — when one is absent
//! the dependent feature becomes a no-op rather than an error.

use crate::enums::Faction;
use crate::types::{Aabb, Position};

/// Result of a terrain raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainHit {
    /// Distance along the ray at which terrain was struck.
    pub distance: f32,
}

/// Heightfield and terrain occlusion queries.
pub trait TerrainProvider {
    /// Ground height at a horizontal coordinate.
    fn height_at(&self, x: f32, z: f32) -> f32;

    /// Cast a ray against the terrain. Returns `None` when nothing is hit
    /// within `max_distance`.
    fn raycast(&self, origin: Position, direction: glam::Vec3, max_distance: f32)
        -> Option<TerrainHit>;
}

/// Static obstacle bounds for cover discovery and occlusion checks.
pub trait ObstacleProvider {
    /// Obstacles whose bounds fall within `radius` of `center`.
    fn obstacles_near(&self, center: Position, radius: f32) -> Vec<Aabb>;
}

/// A capture-zone style area with an owning faction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub position: Position,
    pub radius: f32,
    pub owner: Faction,
}

/// Zone ownership, consumed only by the zone-defense assignment policy.
pub trait ZoneProvider {
    fn zones(&self) -> Vec<Zone>;
}

/// Smoke and other visibility obscurants.
pub trait SmokeProvider {
    /// True if the segment between the two points passes through smoke.
    fn segment_blocked(&self, from: Position, to: Position) -> bool;
}
