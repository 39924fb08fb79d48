//! Tactical coordinator for SKIRMISH.
//!
//! Owns the hecs world of combatants, the squad map, and the shared
//! services (line-of-sight evaluator, cover system, target distributor,
//! flanking coordinator), and runs the per-agent behavior machine once
//! per simulation tick.

pub mod combatant;
pub mod cover;
pub mod engine;
pub mod flanking;
pub mod roster;
pub mod squad;
pub mod systems;
pub mod targeting;
pub mod visibility;
pub mod world_setup;

pub use engine::{Providers, SimConfig, TacticalCoordinator};
pub use skirmish_core as core;

#[cfg(test)]
mod tests;
