//! Core types and definitions for the SKIRMISH tactical AI.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometric types, behavior enums, tuning constants, skill profiles,
//! and the capability traits for external collaborators (terrain,
//! obstacles, zones, smoke). It has no dependency on the ECS or any
//! runtime framework.

pub mod constants;
pub mod enums;
pub mod profiles;
pub mod providers;
pub mod types;
