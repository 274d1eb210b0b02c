//! Tactical terrain grid and its movement query surface
//!
//! Cells are stored flat, indexed by `x + y * width + z * width * depth`.
//! All queries are pure; out-of-bounds coordinates answer "no" instead of
//! panicking. An occupancy layer records which unit stands where, so both
//! the pathfinder and executing orders see other units as obstacles.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::tactics::cell::Cell;
use crate::tactics::constants::{LEVEL_HEIGHT, STEP_HEIGHT};
use crate::tactics::coord::{Direction, GridCoord};
use crate::tactics::units::UnitId;

/// Outcome of a sideways move check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalMove {
    /// Allowed, unit stays on the same level
    Level,
    /// Allowed, unit ends up on level `z` (stairs up or down)
    ChangeLevel { z: i32 },
    Blocked,
}

impl HorizontalMove {
    /// Cell the unit ends up in, if the move is allowed
    pub fn destination(self, from: GridCoord, direction: Direction) -> Option<GridCoord> {
        match self {
            HorizontalMove::Level => Some(from.step(direction)),
            HorizontalMove::ChangeLevel { z } => Some(from.step(direction).with_level(z)),
            HorizontalMove::Blocked => None,
        }
    }
}

/// Fixed-size 3D tactical grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainGrid {
    cells: Vec<Cell>,
    occupants: Vec<Option<UnitId>>,
    pub width: u32,
    pub depth: u32,
    pub levels: u32,
}

impl TerrainGrid {
    /// Create a grid with open ground on level 0 and air above
    pub fn new(width: u32, depth: u32, levels: u32) -> Self {
        let per_level = (width as usize) * (depth as usize);
        let total = per_level * (levels as usize);
        let mut cells = vec![Cell::air(); total];
        for cell in cells.iter_mut().take(per_level) {
            *cell = Cell::ground();
        }

        Self {
            cells,
            occupants: vec![None; total],
            width,
            depth,
            levels,
        }
    }

    /// Number of cells in the grid
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check whether a coordinate is within the grid
    pub fn is_on_terrain(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && coord.z >= 0
            && (coord.x as u32) < self.width
            && (coord.y as u32) < self.depth
            && (coord.z as u32) < self.levels
    }

    /// Linear index of a cell. Returns `None` if out of bounds.
    pub fn index(&self, coord: GridCoord) -> Option<usize> {
        if !self.is_on_terrain(coord) {
            return None;
        }
        let w = self.width as usize;
        let d = self.depth as usize;
        Some(coord.x as usize + coord.y as usize * w + coord.z as usize * w * d)
    }

    /// Inverse of `index`
    pub fn coord_of(&self, index: usize) -> GridCoord {
        let w = self.width as usize;
        let d = self.depth as usize;
        let z = index / (w * d);
        let rem = index % (w * d);
        GridCoord::new((rem % w) as i32, (rem / w) as i32, z as i32)
    }

    pub fn cell(&self, coord: GridCoord) -> Option<&Cell> {
        self.index(coord).map(|i| &self.cells[i])
    }

    /// Replace a cell. No-op for out-of-bounds coordinates.
    pub fn set_cell(&mut self, coord: GridCoord, cell: Cell) {
        if let Some(i) = self.index(coord) {
            self.cells[i] = cell;
        }
    }

    /// Put a wall on one face of a cell
    pub fn set_wall(&mut self, coord: GridCoord, direction: Direction) {
        if let Some(i) = self.index(coord) {
            self.cells[i].walls.set(direction, true);
        }
    }

    /// Overwrite every cell of one level
    pub fn fill_level(&mut self, z: i32, cell: Cell) {
        for y in 0..self.depth as i32 {
            for x in 0..self.width as i32 {
                self.set_cell(GridCoord::new(x, y, z), cell);
            }
        }
    }

    // === OCCUPANCY ===

    pub fn occupant(&self, coord: GridCoord) -> Option<UnitId> {
        self.index(coord).and_then(|i| self.occupants[i])
    }

    /// Record a unit standing in a cell. Fails if the cell is off the grid,
    /// solid, or already taken.
    pub fn place_unit(&mut self, coord: GridCoord, unit: UnitId) -> bool {
        let Some(i) = self.index(coord) else {
            return false;
        };
        if self.cells[i].blocked || self.occupants[i].is_some() {
            return false;
        }
        self.occupants[i] = Some(unit);
        true
    }

    pub fn remove_unit(&mut self, coord: GridCoord) -> Option<UnitId> {
        self.index(coord).and_then(|i| self.occupants[i].take())
    }

    /// Move whoever stands on `from` to `to`
    pub fn move_occupant(&mut self, from: GridCoord, to: GridCoord) {
        if let Some(unit) = self.remove_unit(from) {
            if let Some(i) = self.index(to) {
                self.occupants[i] = Some(unit);
            }
        }
    }

    /// In bounds, not solid, and nobody standing there
    pub fn is_free(&self, coord: GridCoord) -> bool {
        match self.index(coord) {
            Some(i) => !self.cells[i].blocked && self.occupants[i].is_none(),
            None => false,
        }
    }

    // === HEIGHTS ===

    /// Absolute height of the standing surface in `LEVEL_HEIGHT` units
    ///
    /// Cells without a floor report the base of their level, which is
    /// where a hovering unit is drawn.
    pub fn surface_height(&self, coord: GridCoord) -> Option<i32> {
        let cell = self.cell(coord)?;
        let base = coord.z * LEVEL_HEIGHT as i32;
        if cell.floor {
            Some(base + cell.floor_height as i32)
        } else {
            Some(base)
        }
    }

    /// Ground height in world units (one level = 1.0)
    pub fn ground_height(&self, coord: GridCoord) -> f32 {
        self.surface_height(coord)
            .map(|h| h as f32 / LEVEL_HEIGHT as f32)
            .unwrap_or(coord.z as f32)
    }

    /// World-space point a unit stands on in this cell
    pub fn world_position(&self, coord: GridCoord) -> Vec3 {
        Vec3::new(
            coord.x as f32 + 0.5,
            coord.y as f32 + 0.5,
            self.ground_height(coord),
        )
    }

    // === MOVEMENT QUERIES ===

    pub fn can_move_off(&self, coord: GridCoord, can_fly: bool) -> bool {
        self.cell(coord)
            .map(|c| c.can_move_off(can_fly))
            .unwrap_or(false)
    }

    /// Can a unit rise from `coord` to the cell directly above?
    ///
    /// Walkers need a grav lift; flyers need the cell above to have no
    /// floor (ceiling) in the way.
    pub fn can_move_up(&self, coord: GridCoord, can_fly: bool) -> bool {
        let Some(source) = self.cell(coord) else {
            return false;
        };
        if source.blocked {
            return false;
        }
        let above = coord.up();
        if !self.is_free(above) {
            return false;
        }
        let Some(above_cell) = self.cell(above) else {
            return false;
        };
        source.lift || (can_fly && !above_cell.floor)
    }

    /// Can a unit sink from `coord` to the cell directly below?
    ///
    /// Possible when there is no floor underfoot, or a grav lift.
    pub fn can_move_down(&self, coord: GridCoord) -> bool {
        let Some(source) = self.cell(coord) else {
            return false;
        };
        if source.blocked || coord.z == 0 {
            return false;
        }
        if !self.is_free(coord.down()) {
            return false;
        }
        !source.floor || source.lift
    }

    /// Check a sideways move of one cell
    ///
    /// Accounts for walls on either face, the step height between floors,
    /// stairs leading up into the next level or down into the previous
    /// one, and cells taken by solids or other units.
    pub fn horizontal_move(
        &self,
        from: GridCoord,
        direction: Direction,
        can_fly: bool,
    ) -> HorizontalMove {
        if !self.can_move_off(from, can_fly) {
            return HorizontalMove::Blocked;
        }
        let to = from.step(direction);
        let Some(dest) = self.cell(to) else {
            return HorizontalMove::Blocked;
        };
        if self.wall_between(from, direction) {
            return HorizontalMove::Blocked;
        }
        let Some(from_surface) = self.surface_height(from) else {
            return HorizontalMove::Blocked;
        };

        if dest.blocked {
            return self.stairs_up(from, direction, from_surface, can_fly);
        }
        if self.occupant(to).is_some() {
            return HorizontalMove::Blocked;
        }

        if dest.floor {
            let to_surface = self.surface_height(to).unwrap_or(from_surface);
            if (to_surface - from_surface).abs() > STEP_HEIGHT as i32 && !can_fly {
                return HorizontalMove::Blocked;
            }
            HorizontalMove::Level
        } else if can_fly {
            HorizontalMove::Level
        } else {
            self.stairs_down(to, from_surface)
        }
    }

    /// Every cell reachable from `from` in one step
    pub fn neighbors(&self, from: GridCoord, can_fly: bool) -> Vec<GridCoord> {
        let mut out = Vec::with_capacity(6);
        self.neighbors_into(from, can_fly, &mut out);
        out
    }

    /// Like `neighbors`, but fills a caller-owned buffer
    pub fn neighbors_into(&self, from: GridCoord, can_fly: bool, out: &mut Vec<GridCoord>) {
        out.clear();
        for direction in Direction::ALL {
            if let Some(to) = self
                .horizontal_move(from, direction, can_fly)
                .destination(from, direction)
            {
                out.push(to);
            }
        }
        if self.can_move_up(from, can_fly) {
            out.push(from.up());
        }
        if self.can_move_down(from) {
            out.push(from.down());
        }
    }

    /// Is a single step from `from` to `to` currently legal?
    pub fn step_allowed(&self, from: GridCoord, to: GridCoord, can_fly: bool) -> bool {
        if to == from.up() {
            return self.can_move_up(from, can_fly);
        }
        if to == from.down() {
            return self.can_move_down(from);
        }
        let flat = to.with_level(from.z);
        let Some(direction) = Direction::between(from, flat) else {
            return false;
        };
        self.horizontal_move(from, direction, can_fly)
            .destination(from, direction)
            == Some(to)
    }

    fn wall_between(&self, from: GridCoord, direction: Direction) -> bool {
        let to = from.step(direction);
        let from_wall = self.cell(from).map(|c| c.walls.has(direction));
        let to_wall = self.cell(to).map(|c| c.walls.has(direction.opposite()));
        from_wall.unwrap_or(false) || to_wall.unwrap_or(false)
    }

    /// Walking into a solid cell whose top is a floor one level up
    fn stairs_up(
        &self,
        from: GridCoord,
        direction: Direction,
        from_surface: i32,
        can_fly: bool,
    ) -> HorizontalMove {
        let above_from = from.up();
        let above_to = from.step(direction).up();

        // Headroom over the source and a clear landing above the solid
        match self.cell(above_from) {
            Some(c) if !c.blocked => {}
            _ => return HorizontalMove::Blocked,
        }
        if self.wall_between(above_from, direction) || !self.is_free(above_to) {
            return HorizontalMove::Blocked;
        }
        match self.cell(above_to) {
            Some(c) if c.floor => {}
            _ => return HorizontalMove::Blocked,
        }

        let landing = self.surface_height(above_to).unwrap_or(i32::MAX);
        let rise = landing - from_surface;
        if rise <= STEP_HEIGHT as i32 || can_fly {
            HorizontalMove::ChangeLevel { z: above_to.z }
        } else {
            HorizontalMove::Blocked
        }
    }

    /// Walking off into a floorless cell onto a floor just below it
    fn stairs_down(&self, to: GridCoord, from_surface: i32) -> HorizontalMove {
        let below = to.down();
        if !self.is_free(below) {
            return HorizontalMove::Blocked;
        }
        match self.cell(below) {
            Some(c) if c.floor => {}
            _ => return HorizontalMove::Blocked,
        }
        let landing = self.surface_height(below).unwrap_or(i32::MIN);
        if from_surface - landing <= STEP_HEIGHT as i32 {
            HorizontalMove::ChangeLevel { z: below.z }
        } else {
            HorizontalMove::Blocked
        }
    }
}
