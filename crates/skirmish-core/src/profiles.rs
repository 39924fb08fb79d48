//! Faction- and role-differentiated skill profiles.
//!
//! Consolidates the per-combatant parameters the behavior machine reads.
//! Profiles are mutated at runtime to model morale and panic, so they are
//! data, not a lookup — `default_profile` only provides the starting point.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::{Faction, SquadRole};

/// Per-combatant skill and weapon-handling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillProfile {
    /// Base reaction delay before distance scaling (seconds).
    pub reaction_base_secs: f32,
    /// Field of view (radians, full angle).
    pub fov_rad: f32,
    /// Visual detection range (meters).
    pub visual_range: f32,
    /// Default burst length (seconds of fire).
    pub burst_secs: f32,
    /// Default pause between bursts (seconds).
    pub pause_secs: f32,
    /// Accuracy modifier, 1.0 = baseline. Degraded by panic.
    pub accuracy: f32,
    /// Objective-focused agents refuse long-range engagements unless
    /// recently hit.
    pub objective_focused: bool,
}

/// Starting profile for a faction/role pair.
pub fn default_profile(faction: Faction, role: SquadRole) -> SkillProfile {
    let mut profile = match faction {
        Faction::Blufor => SkillProfile {
            reaction_base_secs: 0.35,
            fov_rad: 2.1,
            visual_range: 80.0,
            burst_secs: 0.6,
            pause_secs: 1.0,
            accuracy: 1.0,
            objective_focused: false,
        },
        // Redfor favors volume of fire over precision.
        Faction::Redfor => SkillProfile {
            reaction_base_secs: 0.45,
            fov_rad: 2.1,
            visual_range: 75.0,
            burst_secs: 0.9,
            pause_secs: 0.8,
            accuracy: 0.85,
            objective_focused: false,
        },
    };

    if role == SquadRole::Leader {
        profile.reaction_base_secs *= 0.8;
        profile.accuracy *= 1.1;
    }

    profile
}

impl SkillProfile {
    /// Apply panic to the runtime-mutable parts of the profile: shaky hands
    /// and shorter attention. `panic` is 0..1.
    pub fn apply_panic(&mut self, panic: f32) {
        let panic = panic.clamp(0.0, 1.0);
        self.accuracy = (self.accuracy * (1.0 - 0.4 * panic)).max(0.2);
        self.visual_range = (self.visual_range * (1.0 - 0.2 * panic)).max(ALWAYS_DETECT_RADIUS);
    }
}
