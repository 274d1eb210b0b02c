//! Move orders: rotate-then-translate execution of a path
//!
//! An order is driven by `update(elapsed)` calls. Each call adds the
//! elapsed time to `unused_seconds` and keeps running phases until that
//! time is spent or the order finishes, so one long tick can finish
//! several cells while a short one leaves the unit between cells.
//!
//! Per path segment:
//! 1. Pending: work out the turn towards the next cell. Refuse it if its
//!    cost is more than the unit has left.
//! 2. Rotating: turn at `turn_speed`; debit the turn cost when done.
//! 3. Translating: before leaving the cell, re-check the step against the
//!    grid and the budget. Move at one cell per `seconds_per_step`, then
//!    debit the cell cost and snap to the cell.
//!
//! Time units are only ever debited when a phase completes, and never
//! beyond what the unit has.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::MovementConfig;
use crate::core::types::{shortest_turn, wrap_angle, Heading};
use crate::tactics::coord::{GridCoord, Path};
use crate::tactics::costs::{step_cost, turn_cost};
use crate::tactics::terrain::TerrainGrid;
use crate::tactics::units::{Combatant, UnitId};

// Turns smaller than this are treated as already facing
const HEADING_EPSILON: f32 = 1e-4;

// Slack when deciding whether the tick covers the rest of a phase
const TIME_EPSILON: f32 = 1e-6;

/// Errors raised when an order is created or issued
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("path has no cells")]
    EmptyPath,

    #[error("unit is at {unit} but the path starts at {path}")]
    NotAtPathStart { unit: GridCoord, path: GridCoord },

    #[error("unit {0} already has an active order")]
    AlreadyActive(UnitId),
}

/// Why an order stopped short
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptCause {
    /// Not enough time units for the next turn or cell
    TimeUnits,
    /// The next cell can no longer be entered
    PathBlocked,
}

/// Result of an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Executing,
    /// Path fully walked, or turn fully made
    Completed,
    Interrupted(InterruptCause),
}

impl OrderStatus {
    pub fn is_finished(self) -> bool {
        !matches!(self, OrderStatus::Executing)
    }
}

/// Current sub-phase of an order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderPhase {
    /// At a cell, about to start the next segment
    Pending,
    Rotating {
        target: Heading,
        cost: u32,
    },
    Translating {
        from: Vec3,
        to: Vec3,
        progress: f32,
    },
    Finished,
}

#[derive(Debug, Clone)]
enum OrderKind {
    FollowPath(Path),
    Turn(Heading),
}

/// A unit's single outstanding order
#[derive(Debug, Clone)]
pub struct MoveOrder {
    kind: OrderKind,
    config: MovementConfig,
    phase: OrderPhase,
    status: OrderStatus,
    /// Index of the last path cell fully reached
    path_index: usize,
    unused_seconds: f32,
    time_units_spent: u32,
    started: bool,
}

impl MoveOrder {
    fn with_kind(kind: OrderKind, config: &MovementConfig) -> Self {
        Self {
            kind,
            config: config.clone(),
            phase: OrderPhase::Pending,
            status: OrderStatus::Executing,
            path_index: 0,
            unused_seconds: 0.0,
            time_units_spent: 0,
            started: false,
        }
    }

    /// Order `unit` to walk `path`, which must start where the unit stands
    pub fn follow(
        path: Path,
        unit: &Combatant,
        config: &MovementConfig,
    ) -> Result<Self, OrderError> {
        let start = path.start().ok_or(OrderError::EmptyPath)?;
        if start != unit.position {
            return Err(OrderError::NotAtPathStart {
                unit: unit.position,
                path: start,
            });
        }
        Ok(Self::with_kind(OrderKind::FollowPath(path), config))
    }

    /// Turn in place to face `heading`
    pub fn turn_to(heading: Heading, config: &MovementConfig) -> Self {
        Self::with_kind(OrderKind::Turn(wrap_angle(heading)), config)
    }

    /// Turn in place to look at `target`. `None` if the target shares the
    /// unit's column.
    pub fn face_towards(
        unit: &Combatant,
        target: GridCoord,
        config: &MovementConfig,
    ) -> Option<Self> {
        let heading = unit.position.bearing_to(&target)?;
        Some(Self::turn_to(heading, config))
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn phase(&self) -> OrderPhase {
        self.phase
    }

    /// Index of the last path cell the unit fully reached
    pub fn path_index(&self) -> usize {
        self.path_index
    }

    /// Elapsed time not yet consumed by any phase
    pub fn unused_seconds(&self) -> f32 {
        self.unused_seconds
    }

    pub fn time_units_spent(&self) -> u32 {
        self.time_units_spent
    }

    /// The path being followed; `None` for turn-only orders
    pub fn path(&self) -> Option<&Path> {
        match &self.kind {
            OrderKind::FollowPath(path) => Some(path),
            OrderKind::Turn(_) => None,
        }
    }

    /// Advance the order by `elapsed` seconds
    ///
    /// Mutates the unit's heading, position and time units, and moves its
    /// occupancy on the grid as cells are completed. Calling again after
    /// the order has finished is a no-op returning the final status.
    pub fn update(
        &mut self,
        unit: &mut Combatant,
        grid: &mut TerrainGrid,
        elapsed: f32,
    ) -> OrderStatus {
        if self.is_finished() {
            return self.status;
        }

        if !self.started {
            self.started = true;
            let already_there = matches!(&self.kind, OrderKind::FollowPath(path) if path.len() == 1);
            if already_there {
                return self.finish(unit, OrderStatus::Completed);
            }
            if unit.time_units.is_exhausted() {
                return self.finish(unit, OrderStatus::Interrupted(InterruptCause::TimeUnits));
            }
        }

        if elapsed > 0.0 {
            self.unused_seconds += elapsed;
        }

        while self.unused_seconds > 0.0 && !self.is_finished() {
            match self.phase {
                OrderPhase::Pending => self.begin_segment(unit, grid),
                OrderPhase::Rotating { target, cost } => self.rotate(unit, grid, target, cost),
                OrderPhase::Translating { from, to, progress } => {
                    self.translate(unit, grid, from, to, progress)
                }
                OrderPhase::Finished => break,
            }
        }

        self.status
    }

    fn finish(&mut self, unit: &Combatant, status: OrderStatus) -> OrderStatus {
        self.phase = OrderPhase::Finished;
        self.status = status;
        match status {
            OrderStatus::Interrupted(cause) => tracing::debug!(
                "{} interrupted at {} ({:?}), {} TU left",
                unit.name,
                unit.position,
                cause,
                unit.time_units.current()
            ),
            _ => tracing::debug!(
                "{} finished at {}, spent {} TU",
                unit.name,
                unit.position,
                self.time_units_spent
            ),
        }
        status
    }

    /// Cell the next segment heads for, if any
    fn next_cell(&self) -> Option<(GridCoord, GridCoord)> {
        match &self.kind {
            OrderKind::FollowPath(path) => {
                let here = path.get(self.path_index)?.coord;
                let next = path.get(self.path_index + 1)?.coord;
                Some((here, next))
            }
            OrderKind::Turn(_) => None,
        }
    }

    fn begin_segment(&mut self, unit: &mut Combatant, grid: &TerrainGrid) {
        let target = match self.kind {
            OrderKind::Turn(heading) => Some(heading),
            OrderKind::FollowPath(_) => {
                let Some((here, next)) = self.next_cell() else {
                    self.finish(unit, OrderStatus::Completed);
                    return;
                };
                here.bearing_to(&next)
            }
        };

        match target {
            Some(target) if shortest_turn(unit.heading, target).abs() > HEADING_EPSILON => {
                let cost = turn_cost(&self.config, shortest_turn(unit.heading, target));
                if !unit.time_units.can_afford(cost) {
                    self.finish(unit, OrderStatus::Interrupted(InterruptCause::TimeUnits));
                    return;
                }
                tracing::trace!("{} turning to {:.3} for {} TU", unit.name, target, cost);
                self.phase = OrderPhase::Rotating { target, cost };
            }
            _ => self.end_rotation(unit, grid),
        }
    }

    fn rotate(&mut self, unit: &mut Combatant, grid: &TerrainGrid, target: Heading, cost: u32) {
        let remaining = shortest_turn(unit.heading, target);
        let needed = remaining.abs() / self.config.turn_speed;

        if needed <= self.unused_seconds + TIME_EPSILON {
            self.unused_seconds = (self.unused_seconds - needed).max(0.0);
            unit.heading = target;
            if !unit.time_units.spend(cost) {
                self.finish(unit, OrderStatus::Interrupted(InterruptCause::TimeUnits));
                return;
            }
            self.time_units_spent += cost;
            self.end_rotation(unit, grid);
        } else {
            let swept = remaining.signum() * self.config.turn_speed * self.unused_seconds;
            unit.heading = wrap_angle(unit.heading + swept);
            self.unused_seconds = 0.0;
        }
    }

    /// Heading is set: finish a turn order, or start crossing the next cell
    fn end_rotation(&mut self, unit: &mut Combatant, grid: &TerrainGrid) {
        let Some((here, next)) = self.next_cell() else {
            self.finish(unit, OrderStatus::Completed);
            return;
        };

        if !grid.step_allowed(here, next, unit.can_fly) {
            self.finish(unit, OrderStatus::Interrupted(InterruptCause::PathBlocked));
            return;
        }
        if !unit.time_units.can_afford(step_cost(&self.config, here, next)) {
            self.finish(unit, OrderStatus::Interrupted(InterruptCause::TimeUnits));
            return;
        }

        self.phase = OrderPhase::Translating {
            from: grid.world_position(here),
            to: grid.world_position(next),
            progress: 0.0,
        };
    }

    fn translate(
        &mut self,
        unit: &mut Combatant,
        grid: &mut TerrainGrid,
        from: Vec3,
        to: Vec3,
        progress: f32,
    ) {
        let step_seconds = self.config.seconds_per_step;
        let remaining = step_seconds - progress;

        if remaining > self.unused_seconds + TIME_EPSILON {
            let progress = progress + self.unused_seconds;
            self.unused_seconds = 0.0;
            unit.world_position = from.lerp(to, progress / step_seconds);
            self.phase = OrderPhase::Translating { from, to, progress };
            return;
        }

        self.unused_seconds = (self.unused_seconds - remaining).max(0.0);
        let Some((here, next)) = self.next_cell() else {
            self.finish(unit, OrderStatus::Completed);
            return;
        };

        let cost = step_cost(&self.config, here, next);
        if !unit.time_units.spend(cost) {
            self.finish(unit, OrderStatus::Interrupted(InterruptCause::TimeUnits));
            return;
        }
        self.time_units_spent += cost;

        unit.position = next;
        unit.world_position = to;
        grid.move_occupant(here, next);
        self.path_index += 1;
        self.phase = OrderPhase::Pending;
        tracing::trace!("{} reached {}", unit.name, next);

        if self.next_cell().is_none() {
            self.finish(unit, OrderStatus::Completed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tactics::cell::Cell;
    use crate::tactics::coord::MoveData;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1e-5;

    fn east_path(cells: i32) -> Path {
        Path::new(
            (0..cells)
                .map(|x| MoveData::new(GridCoord::new(x, 0, 0), 4 * x as u32))
                .collect(),
        )
    }

    fn setup(tu: u32) -> (Combatant, TerrainGrid, MovementConfig) {
        let mut grid = TerrainGrid::new(8, 8, 3);
        let unit = Combatant::new("Scout", GridCoord::new(0, 0, 0), tu);
        grid.place_unit(unit.position, unit.id);
        (unit, grid, MovementConfig::default())
    }

    #[test]
    fn test_follow_rejects_empty_path() {
        let (unit, _, config) = setup(60);
        let err = MoveOrder::follow(Path::default(), &unit, &config).unwrap_err();
        assert_eq!(err, OrderError::EmptyPath);
    }

    #[test]
    fn test_follow_rejects_foreign_start() {
        let (unit, _, config) = setup(60);
        let path = Path::single(GridCoord::new(3, 3, 0));
        assert!(matches!(
            MoveOrder::follow(path, &unit, &config),
            Err(OrderError::NotAtPathStart { .. })
        ));
    }

    #[test]
    fn test_single_cell_path_completes_immediately() {
        let (mut unit, mut grid, config) = setup(60);
        let mut order = MoveOrder::follow(Path::single(unit.position), &unit, &config).unwrap();
        assert_eq!(order.update(&mut unit, &mut grid, 0.0), OrderStatus::Completed);
        assert_eq!(unit.time_units.current(), 60);
        assert_eq!(unit.position, GridCoord::new(0, 0, 0));
    }

    #[test]
    fn test_zero_budget_interrupts_without_motion() {
        let (mut unit, mut grid, config) = setup(10);
        unit.time_units.set_current(0);
        let mut order = MoveOrder::follow(east_path(3), &unit, &config).unwrap();
        let status = order.update(&mut unit, &mut grid, 1.0);
        assert_eq!(status, OrderStatus::Interrupted(InterruptCause::TimeUnits));
        assert_eq!(unit.position, GridCoord::new(0, 0, 0));
        assert_eq!(order.time_units_spent(), 0);
    }

    #[test]
    fn test_walks_full_path_in_one_long_tick() {
        let (mut unit, mut grid, config) = setup(60);
        let start = unit.position;
        let mut order = MoveOrder::follow(east_path(4), &unit, &config).unwrap();

        let status = order.update(&mut unit, &mut grid, 1.0);
        assert_eq!(status, OrderStatus::Completed);
        assert_eq!(unit.position, GridCoord::new(3, 0, 0));
        assert_eq!(unit.time_units.current(), 60 - 12);
        assert!((order.unused_seconds() - 0.25).abs() < EPS);
        assert_eq!(grid.occupant(start), None);
        assert_eq!(grid.occupant(unit.position), Some(unit.id));
    }

    #[test]
    fn test_partial_tick_interpolates() {
        let (mut unit, mut grid, config) = setup(60);
        let mut order = MoveOrder::follow(east_path(2), &unit, &config).unwrap();

        assert_eq!(order.update(&mut unit, &mut grid, 0.125), OrderStatus::Executing);
        assert!((unit.world_position.x - 1.0).abs() < EPS);
        assert_eq!(unit.position, GridCoord::new(0, 0, 0));
        assert_eq!(unit.time_units.current(), 60);
    }

    #[test]
    fn test_rotation_precedes_translation() {
        let (mut unit, mut grid, config) = setup(60);
        let path = Path::new(vec![
            MoveData::new(GridCoord::new(0, 0, 0), 0),
            MoveData::new(GridCoord::new(0, 1, 0), 4),
        ]);
        let mut order = MoveOrder::follow(path, &unit, &config).unwrap();

        // Quarter turn at 2*PI rad/s takes 0.25s
        order.update(&mut unit, &mut grid, 0.125);
        assert!(matches!(order.phase(), OrderPhase::Rotating { .. }));
        assert!((unit.heading - FRAC_PI_2 / 2.0).abs() < EPS);
        assert_eq!(unit.time_units.current(), 60);

        order.update(&mut unit, &mut grid, 0.125);
        assert!((unit.heading - FRAC_PI_2).abs() < EPS);
        assert_eq!(unit.time_units.current(), 58);

        let status = order.update(&mut unit, &mut grid, 0.25);
        assert_eq!(status, OrderStatus::Completed);
        assert_eq!(unit.time_units.current(), 54);
        assert_eq!(order.time_units_spent(), 6);
    }

    #[test]
    fn test_unaffordable_turn_rejected_before_moving() {
        let (mut unit, mut grid, config) = setup(60);
        unit.time_units.set_current(3);
        // About-face costs 4
        let path = Path::new(vec![
            MoveData::new(GridCoord::new(1, 0, 0), 0),
            MoveData::new(GridCoord::new(0, 0, 0), 4),
        ]);
        grid.move_occupant(unit.position, GridCoord::new(1, 0, 0));
        unit.position = GridCoord::new(1, 0, 0);

        let mut order = MoveOrder::follow(path, &unit, &config).unwrap();
        let status = order.update(&mut unit, &mut grid, 1.0);
        assert_eq!(status, OrderStatus::Interrupted(InterruptCause::TimeUnits));
        assert_eq!(unit.heading, 0.0);
        assert_eq!(unit.time_units.current(), 3);
    }

    #[test]
    fn test_turn_only_order() {
        let (mut unit, mut grid, config) = setup(60);
        let mut order = MoveOrder::turn_to(PI, &config);
        let status = order.update(&mut unit, &mut grid, 1.0);
        assert_eq!(status, OrderStatus::Completed);
        assert!((unit.heading - PI).abs() < EPS);
        assert_eq!(unit.time_units.current(), 56);
        assert!((order.unused_seconds() - 0.5).abs() < EPS);
        assert!(order.path().is_none());
    }

    #[test]
    fn test_face_towards() {
        let (mut unit, mut grid, config) = setup(60);
        let mut order = MoveOrder::face_towards(&unit, GridCoord::new(0, 5, 0), &config).unwrap();
        order.update(&mut unit, &mut grid, 1.0);
        assert!((unit.heading - FRAC_PI_2).abs() < EPS);
        assert!(MoveOrder::face_towards(&unit, unit.position.up(), &config).is_none());
    }

    #[test]
    fn test_blocked_cell_interrupts() {
        let (mut unit, mut grid, config) = setup(60);
        let mut order = MoveOrder::follow(east_path(4), &unit, &config).unwrap();

        assert_eq!(order.update(&mut unit, &mut grid, 0.25), OrderStatus::Executing);
        assert_eq!(unit.position, GridCoord::new(1, 0, 0));

        // Someone steps into the path
        grid.place_unit(GridCoord::new(2, 0, 0), UnitId::new());
        let status = order.update(&mut unit, &mut grid, 0.25);
        assert_eq!(status, OrderStatus::Interrupted(InterruptCause::PathBlocked));
        assert_eq!(unit.position, GridCoord::new(1, 0, 0));
        assert_eq!(unit.time_units.current(), 56);
    }

    #[test]
    fn test_debits_configured_step_costs() {
        let (mut unit, mut grid, config) = setup(8);
        // Recorded costs are metadata only
        let free = Path::new(
            (0..6)
                .map(|x| MoveData::new(GridCoord::new(x, 0, 0), 0))
                .collect(),
        );
        let mut order = MoveOrder::follow(free, &unit, &config).unwrap();
        let status = order.update(&mut unit, &mut grid, 5.0);
        assert_eq!(status, OrderStatus::Interrupted(InterruptCause::TimeUnits));
        assert_eq!(unit.position, GridCoord::new(2, 0, 0));
        assert_eq!(unit.time_units.current(), 0);
        assert_eq!(order.time_units_spent(), 8);
    }

    #[test]
    fn test_translation_starts_from_floor_height() {
        let (mut unit, mut grid, config) = setup(60);
        grid.set_cell(GridCoord::new(0, 0, 0), Cell::raised(2));
        grid.set_cell(GridCoord::new(1, 0, 0), Cell::raised(2));
        let mut order = MoveOrder::follow(east_path(2), &unit, &config).unwrap();

        order.update(&mut unit, &mut grid, 0.125);
        assert!((unit.world_position.x - 1.0).abs() < EPS);
        assert!((unit.world_position.z - 0.25).abs() < EPS);
    }

    #[test]
    fn test_update_after_finish_is_noop() {
        let (mut unit, mut grid, config) = setup(60);
        let mut order = MoveOrder::follow(east_path(2), &unit, &config).unwrap();
        assert_eq!(order.update(&mut unit, &mut grid, 1.0), OrderStatus::Completed);
        let before = unit.clone();
        assert_eq!(order.update(&mut unit, &mut grid, 1.0), OrderStatus::Completed);
        assert_eq!(unit.position, before.position);
        assert_eq!(unit.time_units, before.time_units);
    }
}
