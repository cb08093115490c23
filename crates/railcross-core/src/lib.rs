//! Core domain types for the railcross level-crossing controller.
//!
//! Everything the crossing state machine and its collaborators agree on lives
//! here: crossing states, light channels, gate positions, operator inputs,
//! timing constants, configuration, and the shared error type.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{CrossingConfig, GateCalibration};
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
