//! Engagement acceptance and reaction timing.

use rand::Rng;

use skirmish_core::constants::*;
use skirmish_core::profiles::SkillProfile;

/// Distance-bucketed acceptance probability: certain at close range,
/// decaying through mid and long range.
pub fn engage_probability(distance: f32) -> f64 {
    if distance <= ENGAGE_CERTAIN_RANGE {
        1.0
    } else if distance <= ENGAGE_MID_RANGE {
        ENGAGE_MID_PROB
    } else if distance <= ENGAGE_LONG_RANGE {
        ENGAGE_LONG_PROB
    } else {
        ENGAGE_EXTREME_PROB
    }
}

/// Decide whether an agent commits to a contact at `distance`.
///
/// Objective-focused agents refuse beyond `OBJECTIVE_FOCUS_MAX_RANGE`
/// unless they were recently hit.
pub fn should_engage(
    distance: f32,
    objective_focused: bool,
    recently_hit: bool,
    rng: &mut impl Rng,
) -> bool {
    if objective_focused && distance > OBJECTIVE_FOCUS_MAX_RANGE && !recently_hit {
        return false;
    }
    rng.gen_bool(engage_probability(distance))
}

/// Reaction delay before the agent opens up: base skill delay plus distance
/// scaling, stretched by local cluster density so a bunched group does not
/// all react on the same tick.
pub fn reaction_delay(distance: f32, skill: &SkillProfile, cluster_size: usize) -> f32 {
    let delay = skill.reaction_base_secs
        + distance * REACTION_PER_METER
        + cluster_size as f32 * REACTION_CLUSTER_STRETCH;
    delay.min(REACTION_MAX_SECS)
}
