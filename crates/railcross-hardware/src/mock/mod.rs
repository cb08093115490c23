//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be driven and inspected
//! programmatically without the FPGA board.

pub mod gate;
pub mod lights;
pub mod panel;
pub mod potentiometer;
pub mod ticker;

// Re-export commonly used types
pub use gate::{MockGate, MockGateHandle};
pub use lights::{MockLights, MockLightsHandle};
pub use panel::{MockPanel, MockPanelHandle};
pub use potentiometer::{MockPotentiometer, MockPotentiometerHandle};
pub use ticker::{MockTicker, MockTickerHandle};
