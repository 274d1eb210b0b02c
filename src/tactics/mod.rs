//! Tactical movement - 3D grid pathfinding and time-unit metered orders
//!
//! A caller asks the `Pathfinder` for a path, hands it to a `MoveOrder`,
//! and drives the order with elapsed time until it reports completion or
//! interruption. `Skirmish` bundles the pieces for a whole map.

pub mod cell;
pub mod constants;
pub mod coord;
pub mod costs;
pub mod order;
pub mod pathfinding;
pub mod skirmish;
pub mod terrain;
pub mod units;

// Re-exports for convenient access
pub use cell::{Cell, Walls};
pub use constants::*;
pub use coord::{Direction, GridCoord, MoveData, Path};
pub use costs::{estimate, max_path_cells, order_cost, step_cost, turn_cost};
pub use order::{InterruptCause, MoveOrder, OrderError, OrderPhase, OrderStatus};
pub use pathfinding::{PathError, Pathfinder};
pub use skirmish::{MovePreview, Skirmish, SkirmishEvent, SkirmishEventType};
pub use terrain::{HorizontalMove, TerrainGrid};
pub use units::{Combatant, TimeUnits, UnitId};
