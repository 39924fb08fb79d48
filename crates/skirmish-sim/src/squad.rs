//! Squads: externally owned groups of combatants with an optional leader
//! and an optional standing order.

use hecs::{Entity, World};

use skirmish_core::enums::SquadCommandKind;
use skirmish_core::types::Position;

use crate::combatant::Combatant;

/// Stable squad identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SquadId(pub u32);

/// A named group of combatants. The core reads membership and command and
/// writes nothing back here except flank bookkeeping timestamps.
#[derive(Debug, Clone)]
pub struct Squad {
    pub members: Vec<Entity>,
    pub leader: Option<Entity>,
    pub command: SquadCommandKind,
    /// Anchor position for follow/hold/patrol/retreat orders.
    pub anchor: Option<Position>,
    /// Patrol-area radius around the anchor.
    pub patrol_radius: f32,
    /// Last time this squad started a flank.
    pub last_flank_at: f64,
    /// Last time any member reported damage.
    pub last_damage_at: f64,
}

impl Squad {
    pub fn new(members: Vec<Entity>, leader: Option<Entity>) -> Self {
        Self {
            members,
            leader,
            command: SquadCommandKind::FreeRoam,
            anchor: None,
            patrol_radius: 20.0,
            last_flank_at: f64::NEG_INFINITY,
            last_damage_at: f64::NEG_INFINITY,
        }
    }

    /// Members that still exist and are alive.
    pub fn living_members(&self, world: &World) -> Vec<Entity> {
        self.members
            .iter()
            .copied()
            .filter(|&e| {
                world
                    .get::<&Combatant>(e)
                    .map(|c| c.alive)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Whether the leader exists and is alive.
    pub fn leader_alive(&self, world: &World) -> bool {
        self.leader
            .map(|e| {
                world
                    .get::<&Combatant>(e)
                    .map(|c| c.alive)
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    }

    /// Centroid of the living members' positions.
    pub fn centroid(&self, world: &World) -> Option<Position> {
        let mut sum = glam::Vec3::ZERO;
        let mut count = 0;
        for &e in &self.members {
            let alive = world
                .get::<&Combatant>(e)
                .map(|c| c.alive)
                .unwrap_or(false);
            if !alive {
                continue;
            }
            if let Ok(pos) = world.get::<&Position>(e) {
                sum += pos.to_vec3();
                count += 1;
            }
        }
        if count == 0 {
            None
        } else {
            Some(Position::from_vec3(sum / count as f32))
        }
    }
}
