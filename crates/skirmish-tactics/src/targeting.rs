//! Target selection scoring.

use rand::Rng;

use skirmish_core::constants::*;

/// Distribution score for a candidate target.
///
/// `(max_range − distance) − penalty×targeter_count + jitter`: nearer
/// candidates score higher, but every ally already on the candidate pushes
/// it down hard, spreading a cluster's attention across multiple enemies
/// instead of dog-piling the closest one.
pub fn distribution_score(
    max_range: f32,
    distance: f32,
    targeter_count: u32,
    rng: &mut impl Rng,
) -> f32 {
    let jitter = rng.gen_range(-TARGET_SCORE_JITTER..TARGET_SCORE_JITTER);
    (max_range - distance) - TARGETER_PENALTY * targeter_count as f32 + jitter
}

/// Whether an agent's local ally density puts it in a cluster, switching
/// target selection from nearest-first to the distribution policy.
pub fn in_cluster(nearby_allies: usize) -> bool {
    nearby_allies >= CLUSTER_ALLY_THRESHOLD
}
