//! Per-cell terrain flags
//!
//! Static geometry only: whether the cell is solid, has something to stand
//! on, which sides are walled, and whether a grav lift runs through it.

use serde::{Deserialize, Serialize};

use crate::tactics::constants::LEVEL_HEIGHT;
use crate::tactics::coord::Direction;

/// Walls on the four horizontal faces of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Walls {
    pub north: bool,
    pub east: bool,
    pub south: bool,
    pub west: bool,
}

impl Walls {
    pub fn has(&self, direction: Direction) -> bool {
        match direction {
            Direction::North => self.north,
            Direction::East => self.east,
            Direction::South => self.south,
            Direction::West => self.west,
        }
    }

    pub fn set(&mut self, direction: Direction, present: bool) {
        match direction {
            Direction::North => self.north = present,
            Direction::East => self.east = present,
            Direction::South => self.south = present,
            Direction::West => self.west = present,
        }
    }
}

/// A single cell of the tactical grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cell {
    /// Solid obstacle; nothing may enter
    pub blocked: bool,
    /// Something to stand on at the bottom of the cell
    pub floor: bool,
    /// Height of the standing surface above the level base, in
    /// `LEVEL_HEIGHT` units. Ignored when there is no floor.
    pub floor_height: u8,
    pub walls: Walls,
    /// Grav lift: lets walking units change level in this column
    pub lift: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self::ground()
    }
}

impl Cell {
    /// Open cell with a flat floor
    pub fn ground() -> Self {
        Self {
            blocked: false,
            floor: true,
            floor_height: 0,
            walls: Walls::default(),
            lift: false,
        }
    }

    /// Open cell with nothing underfoot
    pub fn air() -> Self {
        Self {
            floor: false,
            ..Self::ground()
        }
    }

    /// Solid cell
    pub fn solid() -> Self {
        Self {
            blocked: true,
            floor: false,
            ..Self::ground()
        }
    }

    /// Floor raised partway up the cell (stairs, ramps)
    pub fn raised(floor_height: u8) -> Self {
        Self {
            floor_height: floor_height.min(LEVEL_HEIGHT - 1),
            ..Self::ground()
        }
    }

    /// Grav lift pad
    pub fn lift() -> Self {
        Self {
            lift: true,
            ..Self::ground()
        }
    }

    pub fn with_wall(mut self, direction: Direction) -> Self {
        self.walls.set(direction, true);
        self
    }

    /// Can a unit leave this cell sideways?
    ///
    /// Flyers can leave any open cell; walkers need a floor to push off.
    pub fn can_move_off(&self, can_fly: bool) -> bool {
        if self.blocked {
            return false;
        }
        can_fly || self.floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_cell_cannot_be_left() {
        let cell = Cell::solid();
        assert!(!cell.can_move_off(true));
        assert!(!cell.can_move_off(false));
    }

    #[test]
    fn test_floorless_cell_needs_flight() {
        let cell = Cell::air();
        assert!(cell.can_move_off(true));
        assert!(!cell.can_move_off(false));
    }

    #[test]
    fn test_ground_cell_can_be_left() {
        assert!(Cell::ground().can_move_off(false));
    }

    #[test]
    fn test_raised_floor_clamped_below_next_level() {
        let cell = Cell::raised(200);
        assert_eq!(cell.floor_height, LEVEL_HEIGHT - 1);
    }

    #[test]
    fn test_walls_set_and_query() {
        let cell = Cell::ground().with_wall(Direction::East);
        assert!(cell.walls.has(Direction::East));
        assert!(!cell.walls.has(Direction::West));
    }
}
