//! Hardware device abstraction layer for the railcross level-crossing
//! controller.
//!
//! This crate defines trait-based abstractions for the crossing peripherals
//! (time base, operator panel, signal lights, gate servo, and maintenance
//! potentiometer) together with mock implementations and the manager that
//! turns the input producers into one event queue.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Enum dispatch**: Devices are chosen at runtime through the wrappers in
//!   [`devices`], since async traits are not object-safe.
//! - **Thread-safe**: All traits require `Send + Sync` for use with Tokio.
//! - **Error-aware**: All operations return [`Result<T>`][error::Result] with a
//!   [`HardwareError`] describing what went wrong.
//!
//! # Device Traits
//!
//! Inputs ([`TickSource`], [`ControlPanel`]) are owned by the
//! [`PeripheralManager`], which only forwards what they produce. Outputs
//! ([`LightBank`], [`GateActuator`]) and the on-demand [`AnalogInput`] are
//! driven by the controller runtime.
//!
//! ```no_run
//! use railcross_core::{GateCalibration, GatePosition};
//! use railcross_hardware::traits::{AnalogInput, GateActuator};
//! use railcross_hardware::Result;
//!
//! async fn follow_knob<A: AnalogInput, G: GateActuator>(
//!     knob: &mut A,
//!     gate: &mut G,
//!     calibration: &GateCalibration,
//! ) -> Result<()> {
//!     let reading = knob.read_normalized().await?;
//!     if let Some(position) = GatePosition::from_normalized(reading, calibration) {
//!         gate.set_position(position).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Mock Implementations
//!
//! Every device has a mock in [`mock`] that returns a `(device, handle)` pair.
//! The handle drives inputs or inspects outputs from test code.
//!
//! [`TickSource`]: traits::TickSource
//! [`ControlPanel`]: traits::ControlPanel
//! [`LightBank`]: traits::LightBank
//! [`GateActuator`]: traits::GateActuator
//! [`AnalogInput`]: traits::AnalogInput

pub mod devices;
pub mod error;
pub mod interval;
pub mod manager;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use interval::IntervalTicker;
pub use traits::{AnalogInput, ControlPanel, GateActuator, LightBank, PanelInput, TickSource};
pub use types::{DeviceInfo, SignalHead};

// Re-export manager types
pub use manager::{
    DeviceType, PeripheralConfig, PeripheralEvent, PeripheralHandle, PeripheralManager,
    PeripheralStats,
};
