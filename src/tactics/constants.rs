//! Tactical grid constants - geometry shared by terrain queries and orders
//!
//! Costs and rates are tunable through `MovementConfig`; the values here
//! describe the shape of the grid itself.

use std::f32::consts::FRAC_PI_4;

// Vertical resolution: each level is split into height units so that
// floors can sit partway up a cell (stairs, ramps, rubble).
pub const LEVEL_HEIGHT: u8 = 8;

// Largest rise or drop between neighbouring floors a walking unit can take.
pub const STEP_HEIGHT: u8 = 2;

// Turning is charged per this many radians, rounded to the nearest increment.
pub const TURN_INCREMENT: f32 = FRAC_PI_4;

// Default map used by the runner when no scenario is given
pub const DEFAULT_MAP_WIDTH: u32 = 32;
pub const DEFAULT_MAP_DEPTH: u32 = 32;
pub const DEFAULT_MAP_LEVELS: u32 = 4;
