//! Crossing controller for the railcross level-crossing system.
//!
//! This crate contains the timed state machine, the per-state phase scripts,
//! and the runtime that feeds peripheral events into the machine and drives
//! the output devices with the commands it returns.

pub mod phase;
pub mod runtime;
pub mod state_machine;

pub use phase::Actuation;
pub use runtime::{CrossingRuntime, CrossingRuntimeBuilder, RunSummary, StopReason};
pub use state_machine::{
    ControllerStatus, CrossingController, CrossingControllerBuilder, StateTransition,
};
