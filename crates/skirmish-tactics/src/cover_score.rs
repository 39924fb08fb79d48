//! Cover candidate scoring and effectiveness checks.

use skirmish_core::constants::*;
use skirmish_core::enums::CoverSource;
use skirmish_core::types::Position;

/// A candidate cover position under evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverCandidate {
    pub position: Position,
    pub source: CoverSource,
    /// Relief/height magnitude of the covering feature (meters).
    pub relief: f32,
}

/// Angular protection of a candidate: 1.0 when the cover sits exactly
/// between agent and threat, 0.0 when agent and threat look at the spot
/// from the same direction.
pub fn protection(agent: &Position, threat: &Position, spot: &Position) -> f32 {
    let threat_to_spot = threat.flat_direction_to(spot);
    let agent_to_spot = agent.flat_direction_to(spot);
    // Opposing directions mean the spot is between the two.
    (1.0 - threat_to_spot.dot(agent_to_spot)) * 0.5
}

/// Score a candidate for an agent facing a threat. Higher is better.
///
/// Terms: proximity to the agent, relief magnitude, angular protection,
/// preference for a medium stand-off from the threat, and a flat bonus
/// for obstacle cover over terrain relief.
pub fn score_candidate(agent: &Position, threat: &Position, candidate: &CoverCandidate) -> f32 {
    let agent_dist = agent.flat_distance_to(&candidate.position);
    let threat_dist = threat.flat_distance_to(&candidate.position);

    let proximity = (COVER_SEARCH_RADIUS * 1.6 - agent_dist).max(0.0);
    let relief = candidate.relief.min(3.0) * 8.0;
    let shielding = protection(agent, threat, &candidate.position) * 15.0;
    let standoff = -(threat_dist - COVER_STANDOFF_IDEAL).abs() * 0.3;
    let source_bonus = match candidate.source {
        CoverSource::StaticObstacle => COVER_STATIC_BONUS,
        CoverSource::TerrainRelief | CoverSource::Vegetation => 0.0,
    };

    proximity + relief + shielding + standoff + source_bonus
}

/// True when the threat has worked around the cover: threat and agent are
/// on the same side of the cover point, so the spot no longer shields.
pub fn cover_flanked(cover: &Position, agent: &Position, threat: &Position) -> bool {
    let to_agent = cover.flat_direction_to(agent);
    let to_threat = cover.flat_direction_to(threat);
    to_agent.dot(to_threat) > 0.0
}

/// True when the threat is now closer to the cover point than the agent is,
/// which makes moving there a race the agent loses.
pub fn threat_closer_to_cover(cover: &Position, agent: &Position, threat: &Position) -> bool {
    threat.flat_distance_to(cover) < agent.flat_distance_to(cover)
}

/// Verdict on currently held cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverVerdict {
    Effective,
    /// Flanked or outraced; abandon and reposition.
    Reposition,
}

/// Re-evaluate held cover against the current threat position.
pub fn evaluate_cover(cover: &Position, agent: &Position, threat: &Position) -> CoverVerdict {
    if cover_flanked(cover, agent, threat) || threat_closer_to_cover(cover, agent, threat) {
        CoverVerdict::Reposition
    } else {
        CoverVerdict::Effective
    }
}
