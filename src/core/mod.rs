pub mod config;
pub mod error;
pub mod types;

pub use config::MovementConfig;
pub use error::{Result, TacticsError};
