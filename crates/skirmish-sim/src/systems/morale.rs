//! Suppression and panic decay, plus the burst cooldown countdown.

use hecs::World;

use skirmish_core::constants::{PANIC_DECAY_PER_SEC, SUPPRESSION_DECAY_PER_SEC};

use crate::combatant::Combatant;

/// Decay the continuous morale values toward zero each tick. Values never
/// go negative.
pub fn run(world: &mut World, dt: f64) {
    for (_, c) in world.query_mut::<&mut Combatant>() {
        if !c.alive {
            continue;
        }
        c.suppression = (c.suppression - SUPPRESSION_DECAY_PER_SEC * dt as f32).max(0.0);
        c.panic = (c.panic - PANIC_DECAY_PER_SEC * dt as f32).max(0.0);
        c.burst_cooldown = (c.burst_cooldown - dt).max(0.0);
    }
}
