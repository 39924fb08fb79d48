//! Burst and fire-mode planning.
//!
//! The core never fires a weapon itself — it publishes a `BurstPlan` that
//! the external weapons layer reads. Plans are recomputed on transitions
//! into and through the engaging/suppressing states.

use skirmish_core::constants::*;
use skirmish_core::profiles::SkillProfile;

/// Weapon intent published on the combatant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstPlan {
    pub full_auto: bool,
    /// Seconds of continuous fire per burst.
    pub burst_secs: f32,
    /// Seconds of pause between bursts.
    pub pause_secs: f32,
}

/// Situation inputs for burst planning.
#[derive(Debug, Clone, Copy, Default)]
pub struct BurstContext {
    /// Distance to the current target.
    pub distance: f32,
    /// Agent took a hit inside the recent-hit window.
    pub recently_hit: bool,
    /// Enemies within `ENEMY_DENSITY_RADIUS`.
    pub enemy_density: usize,
    /// A squad suppression order is active for this agent.
    pub coordinated_suppression: bool,
    /// Agent is firing from claimed cover.
    pub in_cover: bool,
}

/// Compute the burst profile for an engaging agent.
///
/// Coordinated suppression always wins. Otherwise cover produces the
/// low-rate peek profile, and close range, recent damage, or a crowded
/// fight push toward full auto with short pauses; the rest of the time
/// the faction/role defaults from the skill profile apply.
pub fn plan_burst(skill: &SkillProfile, ctx: &BurstContext) -> BurstPlan {
    if ctx.coordinated_suppression {
        return full_auto_plan();
    }
    if ctx.in_cover {
        return peek_plan();
    }
    if ctx.distance <= CLOSE_COMBAT_RANGE
        || ctx.recently_hit
        || ctx.enemy_density >= ENEMY_DENSITY_THRESHOLD
    {
        return full_auto_plan();
    }
    BurstPlan {
        full_auto: false,
        burst_secs: skill.burst_secs,
        pause_secs: skill.pause_secs,
    }
}

/// Aggressive full-auto profile.
pub fn full_auto_plan() -> BurstPlan {
    BurstPlan {
        full_auto: true,
        burst_secs: FULL_AUTO_BURST_SECS,
        pause_secs: FULL_AUTO_PAUSE_SECS,
    }
}

/// Long-burst spray toward a last-known position.
pub fn spray_plan() -> BurstPlan {
    BurstPlan {
        full_auto: true,
        burst_secs: SPRAY_BURST_SECS,
        pause_secs: SPRAY_PAUSE_SECS,
    }
}

/// Low-rate peek-and-fire profile for agents in cover.
pub fn peek_plan() -> BurstPlan {
    BurstPlan {
        full_auto: false,
        burst_secs: PEEK_BURST_SECS,
        pause_secs: PEEK_PAUSE_SECS,
    }
}
