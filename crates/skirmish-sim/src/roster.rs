//! Per-tick read snapshot of all agents.
//!
//! Handlers read other agents through this snapshot instead of the live
//! world, which keeps hecs borrows simple (collect, then apply). The
//! snapshot is rebuilt once per tick after dead-agent
//! cleanup; within a tick it reflects start-of-tick positions and states.

use std::collections::HashMap;

use hecs::{Entity, World};

use skirmish_core::enums::{BehaviorState, Faction};
use skirmish_core::types::Position;

use crate::combatant::{Combatant, TargetRef};

/// External spatial index contract. Absence falls back to a linear scan
/// over the roster.
pub trait SpatialQuery {
    /// Agent entities within `radius` of `center`.
    fn query_radius(&self, center: Position, radius: f32) -> Vec<Entity>;
}

/// Read-only view of one agent.
#[derive(Debug, Clone, Copy)]
pub struct AgentView {
    pub entity: Entity,
    pub faction: Faction,
    pub pos: Position,
    pub alive: bool,
    pub in_cover: bool,
    pub state: BehaviorState,
    pub target: Option<TargetRef>,
}

/// Snapshot of every agent, rebuilt once per tick.
#[derive(Debug, Default)]
pub struct Roster {
    views: Vec<AgentView>,
    index: HashMap<Entity, usize>,
}

impl Roster {
    pub fn rebuild(&mut self, world: &World) {
        self.views.clear();
        self.index.clear();
        for (entity, (c, pos)) in world.query::<(&Combatant, &Position)>().iter() {
            self.index.insert(entity, self.views.len());
            self.views.push(AgentView {
                entity,
                faction: c.faction,
                pos: *pos,
                alive: c.alive,
                in_cover: c.in_cover,
                state: c.state,
                target: c.target,
            });
        }
    }

    pub fn get(&self, entity: Entity) -> Option<&AgentView> {
        self.index.get(&entity).map(|&i| &self.views[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentView> {
        self.views.iter()
    }

    /// Living agents within `radius` of `center`, via the spatial index
    /// when one is available, else a linear scan.
    pub fn within(
        &self,
        spatial: Option<&dyn SpatialQuery>,
        center: Position,
        radius: f32,
    ) -> Vec<&AgentView> {
        match spatial {
            Some(index) => index
                .query_radius(center, radius)
                .into_iter()
                .filter_map(|e| self.get(e))
                .filter(|v| v.alive && v.pos.flat_distance_to(&center) <= radius)
                .collect(),
            None => self
                .views
                .iter()
                .filter(|v| v.alive && v.pos.flat_distance_to(&center) <= radius)
                .collect(),
        }
    }

    /// Count of living allies of `faction` within `radius`, excluding
    /// `of` itself.
    pub fn allies_within(
        &self,
        of: Entity,
        faction: Faction,
        center: Position,
        radius: f32,
    ) -> usize {
        self.views
            .iter()
            .filter(|v| {
                v.alive
                    && v.entity != of
                    && v.faction == faction
                    && v.pos.flat_distance_to(&center) <= radius
            })
            .count()
    }

    /// Count of living enemies of `faction` within `radius`.
    pub fn enemies_within(&self, faction: Faction, center: Position, radius: f32) -> usize {
        self.views
            .iter()
            .filter(|v| {
                v.alive && v.faction != faction && v.pos.flat_distance_to(&center) <= radius
            })
            .count()
    }

    /// Whether any living agent currently targets `entity`.
    pub fn is_targeted(&self, entity: Entity) -> bool {
        self.views
            .iter()
            .any(|v| v.alive && v.target == Some(TargetRef::Agent(entity)))
    }
}
