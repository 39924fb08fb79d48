//! Death cleanup.
//!
//! Runs before the roster snapshot so no other system ever sees a dead
//! agent with live coordination state. A dead agent holds no cover claim,
//! no target, no destination, and no flank role.

use hecs::{Entity, World};
use tracing::debug;

use skirmish_core::enums::BehaviorState;

use crate::combatant::Combatant;
use crate::cover::CoverSystem;

pub fn run(world: &mut World, cover: &mut CoverSystem) {
    let mut died: Vec<Entity> = Vec::new();
    for (entity, c) in world.query_mut::<&mut Combatant>() {
        if c.health <= 0.0 {
            c.alive = false;
        }
        if c.alive || c.state == BehaviorState::Dead {
            continue;
        }
        c.state = BehaviorState::Dead;
        c.target = None;
        c.last_known_target_pos = None;
        c.destination = None;
        c.in_cover = false;
        c.cover_pos = None;
        c.flanking = false;
        c.full_auto = false;
        c.suppress_until = 0.0;
        died.push(entity);
    }
    for entity in died {
        cover.release(entity);
        debug!(?entity, "combatant down");
    }
}
