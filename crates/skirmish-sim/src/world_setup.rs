//! Spawn helpers for populating the world.

use hecs::{Entity, World};

use skirmish_core::enums::{Faction, SquadRole};
use skirmish_core::types::{Position, Velocity};

use crate::combatant::Combatant;

/// Spawn a combatant entity with the standard component set.
pub fn spawn_combatant(world: &mut World, faction: Faction, role: SquadRole, pos: Position) -> Entity {
    world.spawn((Combatant::new(faction, role), pos, Velocity::default()))
}

/// Spawn a line of combatants spaced along the +X axis. Test and demo
/// convenience.
pub fn spawn_line(
    world: &mut World,
    faction: Faction,
    count: usize,
    start: Position,
    spacing: f32,
) -> Vec<Entity> {
    (0..count)
        .map(|i| {
            let role = if i == 0 {
                SquadRole::Leader
            } else {
                SquadRole::Rifleman
            };
            let pos = Position::new(start.x + i as f32 * spacing, start.y, start.z);
            spawn_combatant(world, faction, role, pos)
        })
        .collect()
}
