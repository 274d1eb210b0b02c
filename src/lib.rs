//! Voxel Tactics - turn-based tactical movement on a multi-level grid

pub mod core;
pub mod scenario;
pub mod tactics;
