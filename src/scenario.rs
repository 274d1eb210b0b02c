//! Scenario files: a map, its units and the moves to make
//!
//! ```toml
//! name = "Stairwell"
//!
//! [grid]
//! width = 8
//! depth = 4
//! levels = 2
//!
//! [[cells]]
//! at = [3, 0, 0]
//! kind = "solid"
//!
//! [[units]]
//! name = "Alpha"
//! at = [0, 0, 0]
//!
//! [[moves]]
//! unit = "Alpha"
//! to = [5, 2, 0]
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::config::MovementConfig;
use crate::core::error::{Result, TacticsError};
use crate::tactics::cell::Cell;
use crate::tactics::coord::{Direction, GridCoord};
use crate::tactics::skirmish::Skirmish;
use crate::tactics::terrain::TerrainGrid;
use crate::tactics::units::{Combatant, UnitId};

/// Grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    pub width: u32,
    pub depth: u32,
    pub levels: u32,
}

/// Named cell presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Ground,
    Air,
    Solid,
    Lift,
    Raised,
}

/// One cell override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSpec {
    pub at: [i32; 3],
    pub kind: CellKind,
    /// Only used by `raised`
    #[serde(default)]
    pub floor_height: u8,
    #[serde(default)]
    pub walls: Vec<Direction>,
}

/// Overwrite a whole level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillSpec {
    pub level: i32,
    pub kind: CellKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub name: String,
    pub at: [i32; 3],
    /// Defaults to the movement config's `default_time_units`
    pub time_units: Option<u32>,
    #[serde(default)]
    pub can_fly: bool,
    #[serde(default)]
    pub heading: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveSpec {
    pub unit: String,
    pub to: [i32; 3],
}

/// A parsed scenario file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub grid: GridSpec,
    #[serde(default)]
    pub movement: MovementConfig,
    #[serde(default)]
    pub fills: Vec<FillSpec>,
    #[serde(default)]
    pub cells: Vec<CellSpec>,
    #[serde(default)]
    pub units: Vec<UnitSpec>,
    #[serde(default)]
    pub moves: Vec<MoveSpec>,
}

/// A skirmish built from a scenario, with unit names resolved
#[derive(Debug, Clone)]
pub struct Deployment {
    pub skirmish: Skirmish,
    pub roster: Vec<(String, UnitId)>,
}

impl Deployment {
    pub fn unit_id(&self, name: &str) -> Option<UnitId> {
        self.roster
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }
}

fn coord(at: [i32; 3]) -> GridCoord {
    GridCoord::new(at[0], at[1], at[2])
}

impl CellKind {
    fn to_cell(self, floor_height: u8) -> Cell {
        match self {
            CellKind::Ground => Cell::ground(),
            CellKind::Air => Cell::air(),
            CellKind::Solid => Cell::solid(),
            CellKind::Lift => Cell::lift(),
            CellKind::Raised => Cell::raised(floor_height),
        }
    }
}

impl Scenario {
    /// Parse and validate a scenario from TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scenario = Self::from_toml_str(&content)?;
        tracing::info!(
            "Loaded scenario '{}' from {}: {} units, {} moves",
            scenario.name,
            path.display(),
            scenario.units.len(),
            scenario.moves.len()
        );
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        self.movement.validate()?;

        let GridSpec {
            width,
            depth,
            levels,
        } = self.grid;
        if width == 0 || depth == 0 || levels == 0 {
            return Err(TacticsError::InvalidScenario(format!(
                "grid {}x{}x{} has no cells",
                width, depth, levels
            )));
        }

        let bounds = TerrainGrid::new(width, depth, levels);
        let positions = self
            .cells
            .iter()
            .map(|c| c.at)
            .chain(self.units.iter().map(|u| u.at))
            .chain(self.moves.iter().map(|m| m.to));
        for at in positions {
            if !bounds.is_on_terrain(coord(at)) {
                return Err(TacticsError::InvalidScenario(format!(
                    "{} lies outside the grid",
                    coord(at)
                )));
            }
        }
        for fill in &self.fills {
            if fill.level < 0 || fill.level as u32 >= levels {
                return Err(TacticsError::InvalidScenario(format!(
                    "level {} lies outside the grid",
                    fill.level
                )));
            }
        }

        for (i, unit) in self.units.iter().enumerate() {
            if self.units[..i].iter().any(|u| u.name == unit.name) {
                return Err(TacticsError::InvalidScenario(format!(
                    "duplicate unit name '{}'",
                    unit.name
                )));
            }
        }
        for mv in &self.moves {
            if !self.units.iter().any(|u| u.name == mv.unit) {
                return Err(TacticsError::InvalidScenario(format!(
                    "move for unknown unit '{}'",
                    mv.unit
                )));
            }
        }
        Ok(())
    }

    /// Build the terrain: fills first, then individual cells
    pub fn build_grid(&self) -> TerrainGrid {
        let mut grid = TerrainGrid::new(self.grid.width, self.grid.depth, self.grid.levels);
        for fill in &self.fills {
            grid.fill_level(fill.level, fill.kind.to_cell(0));
        }
        for spec in &self.cells {
            let mut cell = spec.kind.to_cell(spec.floor_height);
            for wall in &spec.walls {
                cell.walls.set(*wall, true);
            }
            grid.set_cell(coord(spec.at), cell);
        }
        grid
    }

    /// Build the skirmish and deploy every unit
    pub fn deploy(&self) -> Result<Deployment> {
        let mut skirmish = Skirmish::new(self.build_grid(), self.movement.clone());
        let mut roster = Vec::with_capacity(self.units.len());

        for spec in &self.units {
            let time_units = spec.time_units.unwrap_or(self.movement.default_time_units);
            let mut unit =
                Combatant::new(spec.name.clone(), coord(spec.at), time_units).with_heading(spec.heading);
            if spec.can_fly {
                unit = unit.with_flight();
            }
            let id = skirmish.add_unit(unit)?;
            roster.push((spec.name.clone(), id));
        }

        Ok(Deployment { skirmish, roster })
    }

    /// Destinations listed under `[[moves]]`, resolved against a deployment
    pub fn planned_moves(&self, deployment: &Deployment) -> Result<Vec<(UnitId, GridCoord)>> {
        self.moves
            .iter()
            .map(|mv| {
                deployment
                    .unit_id(&mv.unit)
                    .map(|id| (id, coord(mv.to)))
                    .ok_or_else(|| {
                        TacticsError::InvalidScenario(format!("unknown unit '{}'", mv.unit))
                    })
            })
            .collect()
    }

    /// Unit start cells and move destinations; obstacles must not land here
    pub fn reserved_cells(&self) -> Vec<GridCoord> {
        self.units
            .iter()
            .map(|u| coord(u.at))
            .chain(self.moves.iter().map(|m| coord(m.to)))
            .collect()
    }
}

/// Turn random ground cells on level 0 into pillars
///
/// Each free, unoccupied ground cell becomes solid with probability
/// `density`, except the cells listed in `keep_clear`. Returns how many
/// cells were filled.
pub fn scatter_obstacles<R: Rng>(
    grid: &mut TerrainGrid,
    rng: &mut R,
    density: f64,
    keep_clear: &[GridCoord],
) -> usize {
    let density = density.clamp(0.0, 1.0);
    let mut placed = 0;
    for y in 0..grid.depth as i32 {
        for x in 0..grid.width as i32 {
            let at = GridCoord::new(x, y, 0);
            if keep_clear.contains(&at) || !grid.is_free(at) {
                continue;
            }
            if rng.gen_bool(density) {
                grid.set_cell(at, Cell::solid());
                placed += 1;
            }
        }
    }
    tracing::debug!("Scattered {} obstacles", placed);
    placed
}
