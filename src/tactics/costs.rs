//! Time unit cost model
//!
//! Steps are charged per axis: every horizontal cell crossed costs
//! `horizontal_cost`, every level changed costs `vertical_cost`. The same
//! formula applied to a straight-line distance is the pathfinder's
//! heuristic, which is why it can never overestimate.

use crate::core::config::MovementConfig;
use crate::core::types::{shortest_turn, Heading};
use crate::tactics::constants::TURN_INCREMENT;
use crate::tactics::coord::{GridCoord, Path};

/// Cost of a single legal step between adjacent cells
pub fn step_cost(config: &MovementConfig, from: GridCoord, to: GridCoord) -> u32 {
    config.horizontal_cost * from.horizontal_distance(&to)
        + config.vertical_cost * from.vertical_distance(&to)
}

/// Lower bound on the cost of travelling from `from` to `goal`
pub fn estimate(config: &MovementConfig, from: GridCoord, goal: GridCoord) -> u32 {
    step_cost(config, from, goal)
}

/// Number of 45 degree increments in a turn, rounded to nearest
pub fn turn_increments(angle: f32) -> u32 {
    (angle.abs() / TURN_INCREMENT).round() as u32
}

/// Cost of rotating by `angle` radians
pub fn turn_cost(config: &MovementConfig, angle: f32) -> u32 {
    turn_increments(angle) * config.turn_cost
}

/// How many leading cells of `path` a unit facing `heading` with
/// `time_units` can reach
///
/// Walks the path the way a move order does: each segment first pays for
/// turning towards its cell, then for the step itself, and the walk stops at
/// the first turn or step the remaining budget cannot cover. Counts the
/// start cell, so an empty budget still yields 1 for a non-empty path.
pub fn max_path_cells(
    config: &MovementConfig,
    path: &Path,
    heading: Heading,
    time_units: u32,
) -> usize {
    if path.is_empty() {
        return 0;
    }
    let mut facing = heading;
    let mut left = time_units;
    let mut reached = 1;
    for pair in path.steps().windows(2) {
        let (from, to) = (pair[0].coord, pair[1].coord);
        if let Some(bearing) = from.bearing_to(&to) {
            let turn = turn_cost(config, shortest_turn(facing, bearing));
            let Some(rest) = left.checked_sub(turn) else {
                break;
            };
            left = rest;
            facing = bearing;
        }
        let Some(rest) = left.checked_sub(step_cost(config, from, to)) else {
            break;
        };
        left = rest;
        reached += 1;
    }
    reached
}

/// Full time unit price of walking `path` from `heading`, turns included
pub fn order_cost(config: &MovementConfig, path: &Path, heading: Heading) -> u32 {
    let mut facing = heading;
    let mut total = 0;
    for pair in path.steps().windows(2) {
        let (from, to) = (pair[0].coord, pair[1].coord);
        if let Some(bearing) = from.bearing_to(&to) {
            total += turn_cost(config, shortest_turn(facing, bearing));
            facing = bearing;
        }
        total += step_cost(config, from, to);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tactics::coord::{Direction, MoveData};
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn straight_path() -> Path {
        Path::new(vec![
            MoveData::new(GridCoord::new(0, 0, 0), 0),
            MoveData::new(GridCoord::new(1, 0, 0), 4),
            MoveData::new(GridCoord::new(2, 0, 0), 8),
            MoveData::new(GridCoord::new(2, 0, 1), 16),
        ])
    }

    #[test]
    fn test_step_costs_by_axis() {
        let config = MovementConfig::default();
        let origin = GridCoord::new(1, 1, 1);
        assert_eq!(step_cost(&config, origin, origin.step(Direction::East)), 4);
        assert_eq!(step_cost(&config, origin, origin.up()), 8);
        // Stair step: across and up
        assert_eq!(step_cost(&config, origin, GridCoord::new(2, 1, 2)), 12);
    }

    #[test]
    fn test_turn_increments() {
        assert_eq!(turn_increments(0.0), 0);
        assert_eq!(turn_increments(FRAC_PI_4), 1);
        assert_eq!(turn_increments(-FRAC_PI_2), 2);
        assert_eq!(turn_increments(PI), 4);
        // Tiny float noise does not cost anything
        assert_eq!(turn_increments(1e-4), 0);
    }

    #[test]
    fn test_max_path_cells() {
        let config = MovementConfig::default();
        let path = straight_path();
        assert_eq!(max_path_cells(&config, &path, 0.0, 0), 1);
        assert_eq!(max_path_cells(&config, &path, 0.0, 7), 2);
        assert_eq!(max_path_cells(&config, &path, 0.0, 8), 3);
        assert_eq!(max_path_cells(&config, &path, 0.0, 16), 4);
        assert_eq!(max_path_cells(&config, &path, 0.0, 100), 4);
        assert_eq!(max_path_cells(&config, &Path::default(), 0.0, 100), 0);
    }

    #[test]
    fn test_max_path_cells_pays_for_turns() {
        let config = MovementConfig::default();
        let path = straight_path();
        // Facing north: the quarter turn eats into the first step
        assert_eq!(max_path_cells(&config, &path, FRAC_PI_2, 5), 1);
        assert_eq!(max_path_cells(&config, &path, FRAC_PI_2, 6), 2);
        assert_eq!(max_path_cells(&config, &path, FRAC_PI_2, 17), 3);
        assert_eq!(max_path_cells(&config, &path, FRAC_PI_2, 18), 4);
    }

    #[test]
    fn test_max_path_cells_ignores_recorded_costs() {
        let config = MovementConfig::default();
        let free = Path::new(vec![
            MoveData::new(GridCoord::new(0, 0, 0), 0),
            MoveData::new(GridCoord::new(1, 0, 0), 0),
            MoveData::new(GridCoord::new(2, 0, 0), 0),
        ]);
        assert_eq!(max_path_cells(&config, &free, 0.0, 4), 2);
    }

    #[test]
    fn test_order_cost_includes_turns() {
        let config = MovementConfig::default();
        let path = straight_path();
        // Facing east already: no turning, climb needs no heading
        assert_eq!(order_cost(&config, &path, 0.0), 16);
        // Facing north: one quarter turn first
        assert_eq!(order_cost(&config, &path, FRAC_PI_2), 18);
    }
}
