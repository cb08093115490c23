//! Hardware device trait definitions.
//!
//! This module defines the contract between the crossing controller and its
//! peripherals: the time base, the operator panel, the signal lights, the
//! gate servo, and the maintenance potentiometer. Mock and real devices
//! implement the same traits so they can be substituted freely.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use std::fmt;

use railcross_core::{GatePosition, InputEvent, LightChannel};

use crate::error::Result;
use crate::types::DeviceInfo;

/// Raw input reported by the operator panel.
///
/// Ids are passed through untouched; deciding which ids mean something is
/// the controller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelInput {
    /// A push button was pressed.
    Button(u8),

    /// A toggle switch changed position.
    Switch(u8),
}

impl PanelInput {
    /// Check if this input is a button press.
    pub fn is_button(&self) -> bool {
        matches!(self, Self::Button(_))
    }

    /// Raw id of the button or switch.
    pub fn id(&self) -> u8 {
        match self {
            Self::Button(id) | Self::Switch(id) => *id,
        }
    }
}

impl From<PanelInput> for InputEvent {
    fn from(input: PanelInput) -> Self {
        match input {
            PanelInput::Button(id) => InputEvent::ButtonPressed(id),
            PanelInput::Switch(id) => InputEvent::SwitchToggled(id),
        }
    }
}

impl fmt::Display for PanelInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Button(id) => write!(f, "BTN{}", id),
            Self::Switch(id) => write!(f, "SW{}", id),
        }
    }
}

/// Periodic time base.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters, or the enum wrappers from the
/// [`devices`](crate::devices) module when a concrete choice has to be made at
/// runtime:
///
/// ```no_run
/// use railcross_hardware::devices::AnyTickSource;
/// use railcross_hardware::mock::MockTicker;
/// use railcross_hardware::traits::TickSource;
///
/// # async fn example() -> railcross_hardware::Result<()> {
/// let (ticker, handle) = MockTicker::new();
/// let mut source = AnyTickSource::Mock(ticker);
///
/// handle.tick()?;
/// source.wait_tick().await?;
/// # Ok(())
/// # }
/// ```
pub trait TickSource: Send + Sync {
    /// Wait for the next tick.
    ///
    /// Ticks that fall due while nobody is waiting are not lost; each one is
    /// returned by a later call.
    ///
    /// # Errors
    ///
    /// Returns an error if the time base is stopped or disconnected.
    async fn wait_tick(&mut self) -> Result<()>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Operator panel with push buttons and toggle switches.
///
/// # Examples
///
/// ```no_run
/// use railcross_hardware::traits::{ControlPanel, PanelInput};
/// use railcross_hardware::Result;
///
/// async fn wait_for_button<P: ControlPanel>(panel: &mut P, wanted: u8) -> Result<()> {
///     loop {
///         if panel.read_input().await? == PanelInput::Button(wanted) {
///             return Ok(());
///         }
///     }
/// }
/// ```
pub trait ControlPanel: Send + Sync {
    /// Read the next debounced input.
    ///
    /// This method waits asynchronously until the operator does something.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The device is disconnected
    /// - A communication error occurs
    async fn read_input(&mut self) -> Result<PanelInput>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Signal-light output.
pub trait LightBank: Send + Sync {
    /// Switch one light channel on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the write does not reach the hardware.
    async fn set_light(&mut self, channel: LightChannel, on: bool) -> Result<()>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Gate servo output.
pub trait GateActuator: Send + Sync {
    /// Drive the gate to the given position.
    ///
    /// # Errors
    ///
    /// Returns an error if the write does not reach the hardware.
    async fn set_position(&mut self, position: GatePosition) -> Result<()>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Analog input used for manual gate control.
pub trait AnalogInput: Send + Sync {
    /// Read the input scaled to `[0, 1]`.
    ///
    /// Implementations may return values slightly outside the range; callers
    /// clamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails.
    async fn read_normalized(&mut self) -> Result<f32>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}
