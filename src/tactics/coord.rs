//! Grid coordinates, compass directions and paths
//!
//! X and Y span the horizontal plane, Z counts levels upward from 0.

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::core::types::Heading;

/// Integer address of one cell in the tactical grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Neighbour on the same level in the given direction
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx, self.y + dy, self.z)
    }

    pub fn up(self) -> Self {
        Self::new(self.x, self.y, self.z + 1)
    }

    pub fn down(self) -> Self {
        Self::new(self.x, self.y, self.z - 1)
    }

    /// Same column, different level
    pub fn with_level(self, z: i32) -> Self {
        Self::new(self.x, self.y, z)
    }

    /// Manhattan distance on the horizontal plane
    pub fn horizontal_distance(&self, other: &Self) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// Number of levels between the two cells
    pub fn vertical_distance(&self, other: &Self) -> u32 {
        (self.z - other.z).unsigned_abs()
    }

    /// Horizontal bearing towards another cell
    ///
    /// Returns `None` when both cells share a column (pure vertical move),
    /// which never requires turning.
    pub fn bearing_to(&self, other: &Self) -> Option<Heading> {
        let dx = (other.x - self.x) as f32;
        let dy = (other.y - self.y) as f32;
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        Some(dy.atan2(dx))
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// The four axis-aligned horizontal directions
///
/// Diagonal moves do not exist on the tactical grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North, // +Y
    East,  // +X
    South, // -Y
    West,  // -X
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Heading a unit faces when looking this way
    pub fn heading(self) -> Heading {
        match self {
            Direction::East => 0.0,
            Direction::North => FRAC_PI_2,
            Direction::West => PI,
            Direction::South => -FRAC_PI_2,
        }
    }

    /// Direction of a single horizontal step, if `from -> to` is one
    pub fn between(from: GridCoord, to: GridCoord) -> Option<Self> {
        match (to.x - from.x, to.y - from.y) {
            (0, 1) => Some(Direction::North),
            (1, 0) => Some(Direction::East),
            (0, -1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }
}

/// One path step: a cell plus the cumulative cost to reach it
///
/// Identity is the coordinate alone; two records for the same cell are
/// equal whatever their cost.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveData {
    pub coord: GridCoord,
    pub cost: u32,
}

impl MoveData {
    pub fn new(coord: GridCoord, cost: u32) -> Self {
        Self { coord, cost }
    }
}

impl PartialEq for MoveData {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord
    }
}

impl Eq for MoveData {}

impl Hash for MoveData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coord.hash(state);
    }
}

/// Ordered cells from origin (index 0) to destination (last index)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    steps: Vec<MoveData>,
}

impl Path {
    pub fn new(steps: Vec<MoveData>) -> Self {
        Self { steps }
    }

    /// A path that starts and ends on `coord`
    pub fn single(coord: GridCoord) -> Self {
        Self::new(vec![MoveData::new(coord, 0)])
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MoveData> {
        self.steps.get(index)
    }

    pub fn start(&self) -> Option<GridCoord> {
        self.steps.first().map(|s| s.coord)
    }

    pub fn destination(&self) -> Option<GridCoord> {
        self.steps.last().map(|s| s.coord)
    }

    /// Cumulative cost at the destination
    pub fn total_cost(&self) -> u32 {
        self.steps.last().map(|s| s.cost).unwrap_or(0)
    }

    /// Cost of the single step arriving at `index`
    pub fn step_cost(&self, index: usize) -> Option<u32> {
        if index == 0 {
            return None;
        }
        let here = self.steps.get(index)?;
        let prev = self.steps.get(index - 1)?;
        Some(here.cost.saturating_sub(prev.cost))
    }

    pub fn steps(&self) -> &[MoveData] {
        &self.steps
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoveData> {
        self.steps.iter()
    }

    pub fn cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.steps.iter().map(|s| s.coord)
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        self.steps.iter().any(|s| s.coord == coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_data_equality_ignores_cost() {
        let a = MoveData::new(GridCoord::new(1, 2, 0), 4);
        let b = MoveData::new(GridCoord::new(1, 2, 0), 40);
        let c = MoveData::new(GridCoord::new(2, 2, 0), 4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_direction_round_trip() {
        let origin = GridCoord::new(5, 5, 1);
        for dir in Direction::ALL {
            let next = origin.step(dir);
            assert_eq!(Direction::between(origin, next), Some(dir));
            assert_eq!(next.step(dir.opposite()), origin);
        }
    }

    #[test]
    fn test_bearing_matches_direction_heading() {
        let origin = GridCoord::new(3, 3, 0);
        for dir in Direction::ALL {
            let bearing = origin.bearing_to(&origin.step(dir)).unwrap();
            assert!((bearing - dir.heading()).abs() < 1e-5);
        }
    }

    #[test]
    fn test_vertical_move_has_no_bearing() {
        let origin = GridCoord::new(3, 3, 0);
        assert_eq!(origin.bearing_to(&origin.up()), None);
    }

    #[test]
    fn test_distances() {
        let a = GridCoord::new(0, 0, 0);
        let b = GridCoord::new(3, -2, 2);
        assert_eq!(a.horizontal_distance(&b), 5);
        assert_eq!(a.vertical_distance(&b), 2);
    }

    #[test]
    fn test_path_costs() {
        let path = Path::new(vec![
            MoveData::new(GridCoord::new(0, 0, 0), 0),
            MoveData::new(GridCoord::new(1, 0, 0), 4),
            MoveData::new(GridCoord::new(1, 0, 1), 12),
        ]);
        assert_eq!(path.total_cost(), 12);
        assert_eq!(path.step_cost(0), None);
        assert_eq!(path.step_cost(1), Some(4));
        assert_eq!(path.step_cost(2), Some(8));
        assert_eq!(path.start(), Some(GridCoord::new(0, 0, 0)));
        assert_eq!(path.destination(), Some(GridCoord::new(1, 0, 1)));
    }

    #[test]
    fn test_single_path() {
        let path = Path::single(GridCoord::new(2, 2, 0));
        assert_eq!(path.len(), 1);
        assert_eq!(path.total_cost(), 0);
        assert_eq!(path.start(), path.destination());
    }
}
