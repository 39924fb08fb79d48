//! The combatant component and its target references.
//!
//! One fat component per agent: the behavior machine, squad coordinators,
//! and external collaborators (weapons, animation, movement) all read and
//! write these fields. External systems own spawn and despawn; this core
//! only mutates.

use hecs::Entity;

use skirmish_core::enums::{BehaviorState, Faction, SimDetail, SquadRole};
use skirmish_core::profiles::{default_profile, SkillProfile};
use skirmish_core::types::Position;
use skirmish_tactics::gunnery::BurstPlan;

use crate::squad::SquadId;

/// What a combatant is shooting at: another agent, or the proxy that
/// stands in for the human-controlled player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRef {
    Agent(Entity),
    Player,
}

/// Stand-in for the human player as a target. Position and liveness are
/// pushed in by the embedding simulation each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerProxy {
    pub position: Position,
    pub alive: bool,
}

/// One simulated agent. Mutated every tick by the behavior machine;
/// the weapon/animation/movement layers read `destination`, `facing`,
/// `full_auto`, and the burst fields to act it out.
#[derive(Debug, Clone)]
pub struct Combatant {
    pub faction: Faction,
    pub role: SquadRole,
    pub squad: Option<SquadId>,

    pub health: f32,
    pub max_health: f32,
    pub alive: bool,

    pub state: BehaviorState,
    /// State to fall back to when disengaging: `Patrolling` by default,
    /// `Defending` while holding a zone.
    pub guard_state: BehaviorState,
    pub detail: SimDetail,

    /// Runtime-mutated copy of the skill profile (panic degrades it).
    pub skill: SkillProfile,
    /// Facing bearing in radians (0 = North, clockwise).
    pub facing: f32,

    pub target: Option<TargetRef>,
    pub last_known_target_pos: Option<Position>,

    /// Seconds left before an alerted agent opens up.
    pub reaction_timer: f64,
    /// Deadline after which an un-refreshed engagement lapses.
    pub alert_until: f64,
    /// Seconds left in the current burst + pause cycle.
    pub burst_cooldown: f64,

    /// Continuous 0..1, decays each tick.
    pub suppression: f32,
    /// Continuous 0..1, decays each tick.
    pub panic: f32,
    pub last_hit_at: f64,

    pub in_cover: bool,
    pub cover_pos: Option<Position>,
    pub last_cover_request_at: f64,
    pub last_cover_eval_at: f64,

    /// Movement destination handed to the external mover.
    pub destination: Option<Position>,
    pub defend_anchor: Option<Position>,
    pub defend_zone_center: Option<Position>,
    pub last_defense_assign_at: f64,

    /// Participating in an active flanking operation.
    pub flanking: bool,
    pub full_auto: bool,
    pub burst_secs: f32,
    pub pause_secs: f32,
    /// End of a coordinated or reactive suppression spray.
    pub suppress_until: f64,
}

impl Combatant {
    pub fn new(faction: Faction, role: SquadRole) -> Self {
        let skill = default_profile(faction, role);
        Self {
            faction,
            role,
            squad: None,
            health: 100.0,
            max_health: 100.0,
            alive: true,
            state: BehaviorState::Patrolling,
            guard_state: BehaviorState::Patrolling,
            detail: SimDetail::Full,
            burst_secs: skill.burst_secs,
            pause_secs: skill.pause_secs,
            skill,
            facing: 0.0,
            target: None,
            last_known_target_pos: None,
            reaction_timer: 0.0,
            alert_until: 0.0,
            burst_cooldown: 0.0,
            suppression: 0.0,
            panic: 0.0,
            last_hit_at: f64::NEG_INFINITY,
            in_cover: false,
            cover_pos: None,
            last_cover_request_at: f64::NEG_INFINITY,
            last_cover_eval_at: f64::NEG_INFINITY,
            destination: None,
            defend_anchor: None,
            defend_zone_center: None,
            last_defense_assign_at: f64::NEG_INFINITY,
            flanking: false,
            full_auto: false,
            suppress_until: 0.0,
        }
    }

    /// Agent took a hit inside the recent-hit window.
    pub fn recently_hit(&self, now: f64) -> bool {
        now - self.last_hit_at <= skirmish_core::constants::RECENT_HIT_WINDOW_SECS
    }

    pub fn health_frac(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            self.health / self.max_health
        }
    }

    /// Publish a burst plan on the weapon-intent fields.
    pub fn apply_burst_plan(&mut self, plan: BurstPlan) {
        self.full_auto = plan.full_auto;
        self.burst_secs = plan.burst_secs;
        self.pause_secs = plan.pause_secs;
    }

    /// Refresh the runtime skill profile from the faction/role default and
    /// the current panic level.
    pub fn refresh_skill(&mut self) {
        let objective_focused = self.skill.objective_focused;
        let mut skill = default_profile(self.faction, self.role);
        skill.objective_focused = objective_focused;
        skill.apply_panic(self.panic);
        self.skill = skill;
    }
}
