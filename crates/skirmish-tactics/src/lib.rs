//! Tactical decision functions for SKIRMISH.
//!
//! Pure functions that compute engagement decisions, burst profiles,
//! cover scores, target-distribution scores, and flank geometry from
//! plain data. No ECS dependency — the sim crate feeds these from its
//! world and applies the results.

pub mod cover_score;
pub mod engagement;
pub mod flank_plan;
pub mod gunnery;
pub mod targeting;

pub use skirmish_core as core;
