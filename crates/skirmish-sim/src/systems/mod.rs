//! Per-tick systems. `behavior` runs the per-agent state machine; the
//! rest are whole-world passes the engine runs around it.

pub mod behavior;
pub mod cleanup;
pub mod morale;
pub mod squad_command;
pub mod zone_defense;
