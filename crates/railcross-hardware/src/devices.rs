//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits (RPITIT, Rust Edition 2024) are not object-safe,
//! so `Box<dyn TickSource>` is not an option. These enums give the manager and
//! the runtime one concrete type per device role while the concrete device is
//! still chosen at runtime (mock bench versus real board).
//!
//! # Examples
//!
//! ```
//! use railcross_hardware::devices::AnyLightBank;
//! use railcross_hardware::mock::MockLights;
//!
//! let (lights, _handle) = MockLights::new();
//! let any_lights = AnyLightBank::Mock(lights);
//!
//! // Can now be used polymorphically through the LightBank trait
//! ```

use railcross_core::{GatePosition, LightChannel};

use crate::interval::IntervalTicker;
use crate::mock::{MockGate, MockLights, MockPanel, MockPotentiometer, MockTicker};
use crate::traits::{AnalogInput, ControlPanel, GateActuator, LightBank, PanelInput, TickSource};
use crate::{DeviceInfo, Result};

/// Enum wrapper for tick source dispatch.
///
/// # Examples
///
/// ```
/// use railcross_hardware::devices::AnyTickSource;
/// use railcross_hardware::traits::TickSource;
/// use railcross_hardware::IntervalTicker;
///
/// #[tokio::main]
/// async fn main() -> railcross_hardware::Result<()> {
///     let mut source = AnyTickSource::Interval(IntervalTicker::from_hz(10)?);
///
///     source.wait_tick().await?;
///     println!("Ticker: {}", source.get_info().await?.model);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTickSource {
    /// Wall-clock interval.
    Interval(IntervalTicker),

    /// Manually driven ticker for tests.
    Mock(MockTicker),
}

impl TickSource for AnyTickSource {
    async fn wait_tick(&mut self) -> Result<()> {
        match self {
            Self::Interval(device) => device.wait_tick().await,
            Self::Mock(device) => device.wait_tick().await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Interval(device) => device.get_info().await,
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for operator panel dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyControlPanel {
    /// Mock panel for development and testing.
    Mock(MockPanel),
}

impl ControlPanel for AnyControlPanel {
    async fn read_input(&mut self) -> Result<PanelInput> {
        match self {
            Self::Mock(device) => device.read_input().await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for light bank dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyLightBank {
    /// Mock light bank for development and testing.
    Mock(MockLights),
}

impl LightBank for AnyLightBank {
    async fn set_light(&mut self, channel: LightChannel, on: bool) -> Result<()> {
        match self {
            Self::Mock(device) => device.set_light(channel, on).await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for gate actuator dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyGateActuator {
    /// Mock gate for development and testing.
    Mock(MockGate),
}

impl GateActuator for AnyGateActuator {
    async fn set_position(&mut self, position: GatePosition) -> Result<()> {
        match self {
            Self::Mock(device) => device.set_position(position).await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for analog input dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyAnalogInput {
    /// Mock potentiometer for development and testing.
    Mock(MockPotentiometer),
}

impl AnalogInput for AnyAnalogInput {
    async fn read_normalized(&mut self) -> Result<f32> {
        match self {
            Self::Mock(device) => device.read_normalized().await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}
