//! Movement configuration with documented constants
//!
//! Every cost and rate used by the pathfinder and by move orders lives
//! here. The config is handed to the systems that need it; there is no
//! process-wide instance.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{Result, TacticsError};

/// Time-unit costs and animation rates for tactical movement
///
/// The pathfinder heuristic multiplies grid distances by the step costs,
/// so the costs must stay positive for the search to remain admissible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    // === TIME UNIT COSTS ===
    /// Time units to cross one cell horizontally
    ///
    /// A stair step (horizontal move that also changes level) costs
    /// `horizontal_cost + vertical_cost`.
    pub horizontal_cost: u32,

    /// Time units to change level by one (lift, flight, falling, stairs)
    pub vertical_cost: u32,

    /// Time units per 45 degree increment of turning
    ///
    /// A quarter turn costs twice this, an about-face four times.
    pub turn_cost: u32,

    // === ANIMATION RATES ===
    /// Seconds of simulated time to traverse one path step
    pub seconds_per_step: f32,

    /// Rotation speed in radians per second
    pub turn_speed: f32,

    // === UNITS ===
    /// Per-turn time unit budget for units that don't specify their own
    pub default_time_units: u32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            horizontal_cost: 4,
            vertical_cost: 8,
            turn_cost: 1,

            seconds_per_step: 0.25,
            turn_speed: std::f32::consts::TAU,

            default_time_units: 60,
        }
    }
}

impl MovementConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML; missing keys take their default
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MovementConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.horizontal_cost == 0 || self.vertical_cost == 0 {
            return Err(TacticsError::InvalidConfig(format!(
                "step costs must be positive (horizontal {}, vertical {})",
                self.horizontal_cost, self.vertical_cost
            )));
        }

        if self.seconds_per_step <= 0.0 || !self.seconds_per_step.is_finite() {
            return Err(TacticsError::InvalidConfig(format!(
                "seconds_per_step ({}) must be a positive number",
                self.seconds_per_step
            )));
        }

        if self.turn_speed <= 0.0 || !self.turn_speed.is_finite() {
            return Err(TacticsError::InvalidConfig(format!(
                "turn_speed ({}) must be a positive number",
                self.turn_speed
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(MovementConfig::default().validate().is_ok());
    }

    #[test]
    fn test_vertical_costs_more_than_horizontal() {
        let config = MovementConfig::default();
        assert!(config.vertical_cost > config.horizontal_cost);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = MovementConfig::from_toml_str("horizontal_cost = 6\n").unwrap();
        assert_eq!(config.horizontal_cost, 6);
        assert_eq!(config.vertical_cost, 8);
        assert_eq!(config.seconds_per_step, 0.25);
    }

    #[test]
    fn test_zero_cost_rejected() {
        let result = MovementConfig::from_toml_str("vertical_cost = 0\n");
        assert!(matches!(result, Err(TacticsError::InvalidConfig(_))));
    }

    #[test]
    fn test_non_positive_speed_rejected() {
        let config = MovementConfig {
            turn_speed: 0.0,
            ..MovementConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MovementConfig {
            seconds_per_step: -1.0,
            ..MovementConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let result = MovementConfig::from_toml_str("horizontal_cost = \"four\"\n");
        assert!(matches!(result, Err(TacticsError::TomlError(_))));
    }
}
