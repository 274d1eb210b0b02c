//! Combatants and their per-turn time unit pool

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::core::types::{wrap_angle, Heading};
use crate::tactics::coord::GridCoord;

/// Unique identifier for units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub Uuid);

impl UnitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-turn movement budget
///
/// Spending never drives the pool below zero: an unaffordable cost is
/// refused and the pool is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeUnits {
    current: u32,
    max: u32,
}

impl TimeUnits {
    /// A full pool
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_exhausted(&self) -> bool {
        self.current == 0
    }

    pub fn can_afford(&self, cost: u32) -> bool {
        cost <= self.current
    }

    /// Debit `cost`; returns false (and spends nothing) if short
    pub fn spend(&mut self, cost: u32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.current -= cost;
        true
    }

    /// Refill at the start of the unit's turn
    pub fn reset(&mut self) {
        self.current = self.max;
    }

    /// Overwrite the remaining amount, capped at the maximum
    pub fn set_current(&mut self, current: u32) {
        self.current = current.min(self.max);
    }
}

/// A unit on the tactical map, as seen by the movement core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub id: UnitId,
    pub name: String,

    // Position
    pub position: GridCoord,
    pub world_position: Vec3,
    pub heading: Heading,

    pub can_fly: bool,
    pub time_units: TimeUnits,
}

impl Combatant {
    pub fn new(name: impl Into<String>, position: GridCoord, max_time_units: u32) -> Self {
        Self {
            id: UnitId::new(),
            name: name.into(),
            position,
            world_position: Vec3::new(
                position.x as f32 + 0.5,
                position.y as f32 + 0.5,
                position.z as f32,
            ),
            heading: 0.0,
            can_fly: false,
            time_units: TimeUnits::new(max_time_units),
        }
    }

    pub fn with_flight(mut self) -> Self {
        self.can_fly = true;
        self
    }

    pub fn with_heading(mut self, heading: Heading) -> Self {
        self.heading = wrap_angle(heading);
        self
    }

    /// Start of this unit's turn: refill time units
    pub fn begin_turn(&mut self) {
        self.time_units.reset();
    }
}
