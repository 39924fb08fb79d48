//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Combatant faction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    #[default]
    Blufor,
    Redfor,
}

impl Faction {
    /// The opposing faction.
    pub fn enemy(&self) -> Faction {
        match self {
            Faction::Blufor => Faction::Redfor,
            Faction::Redfor => Faction::Blufor,
        }
    }
}

/// Per-combatant behavior state. `Dead` is terminal and is only reached
/// through external health depletion, never through the AI core itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorState {
    /// Default state: wandering, scanning for contacts.
    #[default]
    Patrolling,
    /// Contact made, reaction timer counting down.
    Alert,
    /// Actively firing on a visible target.
    Engaging,
    /// Spraying toward a last-known position after losing sight.
    Suppressing,
    /// Moving to an assigned destination (flank leg, squad move).
    Advancing,
    /// Moving toward a claimed cover position.
    SeekingCover,
    /// Holding a zone perimeter, facing outward.
    Defending,
    /// Killed. Terminal.
    Dead,
}

/// Role within a squad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SquadRole {
    Leader,
    #[default]
    Rifleman,
}

/// What kind of feature a cover spot was discovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverSource {
    /// Height variation in the terrain itself.
    TerrainRelief,
    /// Adjacent to a static obstacle's bounds.
    StaticObstacle,
    /// Bushes and similar concealment-only features.
    Vegetation,
}

/// Flanking operation lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlankStatus {
    /// Roles assigned, suppressors about to be armed.
    Planning,
    /// Suppressors firing, flankers waiting.
    Suppressing,
    /// Flankers moving along the lateral route.
    Flanking,
    /// Everyone committed to aggressive engagement.
    Engaging,
    /// Maneuver finished normally.
    Complete,
    /// Timed out, bled out, or squad depleted.
    Aborted,
}

/// Which side the flank route runs around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlankSide {
    Left,
    Right,
}

/// Externally issued squad order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SquadCommandKind {
    /// No override; default behavior picks destinations.
    #[default]
    FreeRoam,
    /// Spread in a ring around the command anchor.
    Follow,
    /// Return to the anchor when beyond a tolerance.
    HoldPosition,
    /// Wander within a radius of the anchor.
    PatrolArea,
    /// Fall back to the anchor plus an offset away from the threat.
    Retreat,
}

/// Simulation detail tier. Reduced-detail agents skip expensive terrain
/// raycasts during LOS checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimDetail {
    #[default]
    Full,
    Reduced,
}
