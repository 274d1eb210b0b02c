//! A* pathfinding over the tactical grid
//!
//! The open list is a `BinaryHeap` (min-heap via reversed ordering) keyed by
//! `cost + estimate`, with an insertion counter breaking exact ties so the
//! earlier candidate wins. The closed table has one entry per grid cell,
//! indexed by the grid's linear index; it is owned by the `Pathfinder` and
//! reused between searches, invalidated by bumping a search stamp instead
//! of clearing.
//!
//! Only axis-aligned steps exist, so the per-axis cost estimate in
//! `costs::estimate` is admissible and consistent.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use thiserror::Error;

use crate::core::config::MovementConfig;
use crate::tactics::costs::{estimate, step_cost};
use crate::tactics::coord::{GridCoord, MoveData, Path};
use crate::tactics::terrain::TerrainGrid;

/// Why a search produced no path
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    #[error("start or goal lies outside the grid")]
    OffTerrain,

    #[error("goal cannot be reached")]
    Unreachable,

    #[error("goal cannot be reached within {max_cost} time units")]
    OverBudget { max_cost: u32 },
}

/// Best known way into a cell during the current search
#[derive(Debug, Clone, Copy, Default)]
struct ClosedEntry {
    stamp: u32,
    cost: u32,
    parent: Option<usize>,
}

/// Entry in the open list
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    priority: u32,
    seq: u64,
    cost: u32,
    index: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: lowest priority, then earliest insertion
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

enum SearchOutcome {
    Found(usize),
    Failed {
        pruned: bool,
        nearest: usize,
    },
}

/// Reusable A* search state
#[derive(Debug, Clone)]
pub struct Pathfinder {
    config: MovementConfig,
    closed: Vec<ClosedEntry>,
    open: BinaryHeap<OpenEntry>,
    stamp: u32,
    scratch: Vec<GridCoord>,
    expanded: usize,
}

impl Pathfinder {
    pub fn new(config: MovementConfig) -> Self {
        Self {
            config,
            closed: Vec::new(),
            open: BinaryHeap::new(),
            stamp: 0,
            scratch: Vec::with_capacity(6),
            expanded: 0,
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Cells expanded by the most recent search
    pub fn nodes_expanded(&self) -> usize {
        self.expanded
    }

    /// Find the cheapest path from `start` to `goal`
    ///
    /// `max_cost` bounds the cumulative cost; `None` means unbounded.
    /// Costs in the returned path are cumulative from `start`.
    pub fn find_path(
        &mut self,
        grid: &TerrainGrid,
        start: GridCoord,
        goal: GridCoord,
        can_fly: bool,
        max_cost: Option<u32>,
    ) -> Result<Path, PathError> {
        let (Some(start_index), Some(goal_index)) = (grid.index(start), grid.index(goal)) else {
            return Err(PathError::OffTerrain);
        };

        match self.search(grid, start_index, goal_index, can_fly, max_cost) {
            SearchOutcome::Found(index) => {
                let path = self.reconstruct(grid, index);
                tracing::debug!(
                    "Path {} -> {} found: {} cells, cost {}, {} expanded",
                    start,
                    goal,
                    path.len(),
                    path.total_cost(),
                    self.expanded
                );
                Ok(path)
            }
            SearchOutcome::Failed { pruned, .. } => {
                tracing::debug!(
                    "No path {} -> {} ({} expanded, bound hit: {})",
                    start,
                    goal,
                    self.expanded,
                    pruned
                );
                match (pruned, max_cost) {
                    (true, Some(max_cost)) => Err(PathError::OverBudget { max_cost }),
                    _ => Err(PathError::Unreachable),
                }
            }
        }
    }

    /// Like `find_path`, but falls back to the reachable cell closest to
    /// `goal` (smallest estimate, then cheapest) when the goal itself
    /// cannot be reached. `None` only when an endpoint is off the grid.
    pub fn find_path_or_nearest(
        &mut self,
        grid: &TerrainGrid,
        start: GridCoord,
        goal: GridCoord,
        can_fly: bool,
        max_cost: Option<u32>,
    ) -> Option<Path> {
        let start_index = grid.index(start)?;
        let goal_index = grid.index(goal)?;

        let index = match self.search(grid, start_index, goal_index, can_fly, max_cost) {
            SearchOutcome::Found(index) => index,
            SearchOutcome::Failed { nearest, .. } => nearest,
        };
        Some(self.reconstruct(grid, index))
    }

    fn begin_search(&mut self, cells: usize) {
        if self.closed.len() != cells {
            self.closed.clear();
            self.closed.resize(cells, ClosedEntry::default());
            self.stamp = 0;
        }
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            // Stamp wrapped: old entries could alias the new search
            self.closed.fill(ClosedEntry::default());
            self.stamp = 1;
        }
        self.open.clear();
        self.expanded = 0;
    }

    fn search(
        &mut self,
        grid: &TerrainGrid,
        start_index: usize,
        goal_index: usize,
        can_fly: bool,
        max_cost: Option<u32>,
    ) -> SearchOutcome {
        self.begin_search(grid.len());

        let start = grid.coord_of(start_index);
        let goal = grid.coord_of(goal_index);

        let stamp = self.stamp;
        let mut seq: u64 = 0;
        let mut pruned = false;
        let mut nearest = (estimate(&self.config, start, goal), 0, start_index);
        let mut neighbors = std::mem::take(&mut self.scratch);

        self.closed[start_index] = ClosedEntry {
            stamp,
            cost: 0,
            parent: None,
        };
        self.open.push(OpenEntry {
            priority: nearest.0,
            seq,
            cost: 0,
            index: start_index,
        });

        let mut outcome = None;
        while let Some(current) = self.open.pop() {
            // Superseded by a cheaper entry pushed later
            if current.cost > self.closed[current.index].cost {
                continue;
            }

            if current.index == goal_index {
                outcome = Some(SearchOutcome::Found(goal_index));
                break;
            }

            self.expanded += 1;
            let coord = grid.coord_of(current.index);
            let remaining = estimate(&self.config, coord, goal);
            if (remaining, current.cost) < (nearest.0, nearest.1) {
                nearest = (remaining, current.cost, current.index);
            }

            grid.neighbors_into(coord, can_fly, &mut neighbors);
            for &next in &neighbors {
                let Some(next_index) = grid.index(next) else {
                    continue;
                };
                let cost = current.cost + step_cost(&self.config, coord, next);
                let priority = cost + estimate(&self.config, next, goal);
                if max_cost.is_some_and(|max| priority > max) {
                    pruned = true;
                    continue;
                }

                let entry = &mut self.closed[next_index];
                if entry.stamp != stamp || cost < entry.cost {
                    *entry = ClosedEntry {
                        stamp,
                        cost,
                        parent: Some(current.index),
                    };
                    seq += 1;
                    self.open.push(OpenEntry {
                        priority,
                        seq,
                        cost,
                        index: next_index,
                    });
                }
            }
        }

        self.scratch = neighbors;
        self.open.clear();
        outcome.unwrap_or(SearchOutcome::Failed {
            pruned,
            nearest: nearest.2,
        })
    }

    fn reconstruct(&self, grid: &TerrainGrid, index: usize) -> Path {
        let mut steps = Vec::new();
        let mut current = Some(index);
        while let Some(i) = current {
            let entry = self.closed[i];
            steps.push(MoveData::new(grid.coord_of(i), entry.cost));
            current = entry.parent;
        }
        steps.reverse();
        Path::new(steps)
    }
}
