//! Skirmish state: the grid, its units and their outstanding orders
//!
//! Each tick: advance every active order by the elapsed time, in the order
//! they were issued, then drop the ones that finished.

use serde::{Deserialize, Serialize};

use crate::core::config::MovementConfig;
use crate::core::error::{Result, TacticsError};
use crate::core::types::{Heading, Tick};
use crate::tactics::coord::{GridCoord, Path};
use crate::tactics::costs::{max_path_cells, order_cost};
use crate::tactics::order::{MoveOrder, OrderError, OrderStatus};
use crate::tactics::pathfinding::Pathfinder;
use crate::tactics::terrain::TerrainGrid;
use crate::tactics::units::{Combatant, UnitId};

/// Log entry for skirmish events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkirmishEvent {
    pub tick: Tick,
    pub unit_id: UnitId,
    pub event_type: SkirmishEventType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkirmishEventType {
    MoveOrdered { destination: GridCoord, cost: u32 },
    TurnOrdered { heading: Heading },
    OrderFinished { status: OrderStatus },
    OrderCancelled,
    TurnStarted,
}

/// What a move would cost before committing to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovePreview {
    pub path: Path,
    /// Time units for the whole path, turns included
    pub total_cost: u32,
    /// Leading path cells the unit can reach with its current time units
    pub affordable_cells: usize,
}

#[derive(Debug, Clone)]
struct ActiveOrder {
    unit_id: UnitId,
    order: MoveOrder,
}

/// Complete skirmish state
#[derive(Debug, Clone)]
pub struct Skirmish {
    pub grid: TerrainGrid,
    config: MovementConfig,
    pathfinder: Pathfinder,
    units: Vec<Combatant>,
    orders: Vec<ActiveOrder>,

    // Time
    pub tick: Tick,

    // Log
    pub log: Vec<SkirmishEvent>,
}

impl Skirmish {
    pub fn new(grid: TerrainGrid, config: MovementConfig) -> Self {
        Self {
            grid,
            pathfinder: Pathfinder::new(config.clone()),
            config,
            units: Vec::new(),
            orders: Vec::new(),
            tick: 0,
            log: Vec::new(),
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Put a unit on the grid. Its cell must be free.
    pub fn add_unit(&mut self, mut unit: Combatant) -> Result<UnitId> {
        if !self.grid.place_unit(unit.position, unit.id) {
            return Err(TacticsError::CellUnavailable(unit.position));
        }
        unit.world_position = self.grid.world_position(unit.position);
        let id = unit.id;
        tracing::debug!("{} deployed at {}", unit.name, unit.position);
        self.units.push(unit);
        Ok(id)
    }

    pub fn units(&self) -> &[Combatant] {
        &self.units
    }

    pub fn get_unit(&self, unit_id: UnitId) -> Option<&Combatant> {
        self.units.iter().find(|u| u.id == unit_id)
    }

    pub fn get_unit_mut(&mut self, unit_id: UnitId) -> Option<&mut Combatant> {
        self.units.iter_mut().find(|u| u.id == unit_id)
    }

    /// Active order for a unit, if it has one
    pub fn order(&self, unit_id: UnitId) -> Option<&MoveOrder> {
        self.orders
            .iter()
            .find(|a| a.unit_id == unit_id)
            .map(|a| &a.order)
    }

    pub fn has_order(&self, unit_id: UnitId) -> bool {
        self.order(unit_id).is_some()
    }

    /// No unit has an outstanding order
    pub fn is_idle(&self) -> bool {
        self.orders.is_empty()
    }

    /// Path a unit would take to `goal`, with its price
    pub fn preview_move(&mut self, unit_id: UnitId, goal: GridCoord) -> Result<MovePreview> {
        let unit = self
            .units
            .iter()
            .find(|u| u.id == unit_id)
            .ok_or(TacticsError::UnitNotFound(unit_id))?;
        let path = self
            .pathfinder
            .find_path(&self.grid, unit.position, goal, unit.can_fly, None)?;

        Ok(MovePreview {
            total_cost: order_cost(&self.config, &path, unit.heading),
            affordable_cells: max_path_cells(
                &self.config,
                &path,
                unit.heading,
                unit.time_units.current(),
            ),
            path,
        })
    }

    /// Plan a path to `goal` and start walking it
    pub fn issue_move(&mut self, unit_id: UnitId, goal: GridCoord) -> Result<Path> {
        self.ensure_idle(unit_id)?;
        let preview = self.preview_move(unit_id, goal)?;
        self.issue_path(unit_id, preview.path.clone())?;
        Ok(preview.path)
    }

    /// Start walking an already planned path
    pub fn issue_path(&mut self, unit_id: UnitId, path: Path) -> Result<()> {
        self.ensure_idle(unit_id)?;
        let unit = self
            .get_unit(unit_id)
            .ok_or(TacticsError::UnitNotFound(unit_id))?;
        let destination = path.destination().unwrap_or(unit.position);
        let cost = order_cost(&self.config, &path, unit.heading);
        let order = MoveOrder::follow(path, unit, &self.config)?;
        let description = format!("{} ordered to {} ({} TU)", unit.name, destination, cost);

        self.orders.push(ActiveOrder { unit_id, order });
        self.log_event(
            unit_id,
            SkirmishEventType::MoveOrdered { destination, cost },
            description,
        );
        Ok(())
    }

    /// Turn a unit in place
    pub fn issue_turn(&mut self, unit_id: UnitId, heading: Heading) -> Result<()> {
        self.ensure_idle(unit_id)?;
        let name = self
            .get_unit(unit_id)
            .map(|u| u.name.clone())
            .ok_or(TacticsError::UnitNotFound(unit_id))?;
        let order = MoveOrder::turn_to(heading, &self.config);

        self.orders.push(ActiveOrder { unit_id, order });
        self.log_event(
            unit_id,
            SkirmishEventType::TurnOrdered { heading },
            format!("{} ordered to turn to {:.2}", name, heading),
        );
        Ok(())
    }

    /// Drop a unit's order. The unit keeps whatever progress it made.
    pub fn cancel(&mut self, unit_id: UnitId) -> Option<MoveOrder> {
        let index = self.orders.iter().position(|a| a.unit_id == unit_id)?;
        let active = self.orders.remove(index);
        self.log_event(unit_id, SkirmishEventType::OrderCancelled, "Order cancelled".into());
        Some(active.order)
    }

    /// Start a new turn: every unit gets its time units back
    pub fn begin_turn(&mut self) {
        let ids: Vec<UnitId> = self.units.iter().map(|u| u.id).collect();
        for unit in &mut self.units {
            unit.begin_turn();
        }
        for id in ids {
            self.log_event(id, SkirmishEventType::TurnStarted, "Time units restored".into());
        }
    }

    /// Advance all active orders by `elapsed` seconds
    ///
    /// Returns the events raised during this tick.
    pub fn tick(&mut self, elapsed: f32) -> Vec<SkirmishEvent> {
        self.tick += 1;
        let mut events = Vec::new();

        for active in &mut self.orders {
            let Some(unit) = self.units.iter_mut().find(|u| u.id == active.unit_id) else {
                continue;
            };
            let status = active.order.update(unit, &mut self.grid, elapsed);
            if status.is_finished() {
                events.push(SkirmishEvent {
                    tick: self.tick,
                    unit_id: unit.id,
                    event_type: SkirmishEventType::OrderFinished { status },
                    description: format!("{} stopped at {}: {:?}", unit.name, unit.position, status),
                });
            }
        }

        self.orders.retain(|a| !a.order.is_finished());
        self.log.extend(events.iter().cloned());
        events
    }

    /// Tick until every order has finished or `max_ticks` is reached
    pub fn run_until_idle(&mut self, elapsed: f32, max_ticks: u32) -> Vec<SkirmishEvent> {
        let mut events = Vec::new();
        for _ in 0..max_ticks {
            if self.is_idle() {
                break;
            }
            events.extend(self.tick(elapsed));
        }
        events
    }

    fn ensure_idle(&self, unit_id: UnitId) -> Result<()> {
        if self.get_unit(unit_id).is_none() {
            return Err(TacticsError::UnitNotFound(unit_id));
        }
        if self.has_order(unit_id) {
            return Err(OrderError::AlreadyActive(unit_id).into());
        }
        Ok(())
    }

    fn log_event(&mut self, unit_id: UnitId, event_type: SkirmishEventType, description: String) {
        self.log.push(SkirmishEvent {
            tick: self.tick,
            unit_id,
            event_type,
            description,
        });
    }
}
