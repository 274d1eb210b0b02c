use thiserror::Error;

use crate::tactics::coord::GridCoord;
use crate::tactics::order::OrderError;
use crate::tactics::pathfinding::PathError;

#[derive(Error, Debug)]
pub enum TacticsError {
    #[error("Unit not found: {0}")]
    UnitNotFound(crate::tactics::units::UnitId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Cell {0} is blocked or occupied")]
    CellUnavailable(GridCoord),

    #[error("No path: {0}")]
    Path(#[from] PathError),

    #[error("Order rejected: {0}")]
    Order(#[from] OrderError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TacticsError>;
