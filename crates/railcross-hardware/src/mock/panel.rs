//! Mock operator panel for testing and development.
//!
//! This module provides a simulated push-button/toggle-switch panel that can
//! be operated programmatically without the physical board.

use crate::{
    Result,
    traits::{ControlPanel, PanelInput},
    types::DeviceInfo,
};
use tokio::sync::mpsc;

/// Mock operator panel.
///
/// Inputs are fed in through a [`MockPanelHandle`] and read back in the
/// order they were sent.
///
/// # Examples
///
/// ```
/// use railcross_hardware::mock::MockPanel;
/// use railcross_hardware::traits::{ControlPanel, PanelInput};
///
/// #[tokio::main]
/// async fn main() -> railcross_hardware::Result<()> {
///     let (mut panel, handle) = MockPanel::new();
///
///     tokio::spawn(async move {
///         handle.toggle_switch(0).await.unwrap();
///         handle.press_button(3).await.unwrap();
///     });
///
///     assert_eq!(panel.read_input().await?, PanelInput::Switch(0));
///     assert_eq!(panel.read_input().await?, PanelInput::Button(3));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockPanel {
    /// Channel receiver for simulated input
    input_rx: mpsc::Receiver<PanelInput>,

    /// Device name
    name: String,
}

impl MockPanel {
    /// Create a new mock panel with the default name.
    ///
    /// Returns the panel and the handle used to operate it.
    pub fn new() -> (Self, MockPanelHandle) {
        Self::with_name("Mock Panel".to_string())
    }

    /// Create a new mock panel with a custom name.
    pub fn with_name(name: String) -> (Self, MockPanelHandle) {
        let (input_tx, input_rx) = mpsc::channel(32);

        let panel = Self {
            input_rx,
            name: name.clone(),
        };

        let handle = MockPanelHandle { input_tx, name };

        (panel, handle)
    }
}

impl Default for MockPanel {
    fn default() -> Self {
        Self::new().0
    }
}

impl ControlPanel for MockPanel {
    async fn read_input(&mut self) -> Result<PanelInput> {
        self.input_rx
            .recv()
            .await
            .ok_or_else(|| crate::HardwareError::disconnected("Panel input channel closed"))
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Panel v1.0").with_firmware_version("1.0.0"))
    }
}

/// Handle for operating a mock panel.
///
/// It can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockPanelHandle {
    /// Channel sender for simulated input
    input_tx: mpsc::Sender<PanelInput>,

    /// Device name
    name: String,
}

impl MockPanelHandle {
    /// Send a raw input to the mock panel.
    ///
    /// # Errors
    ///
    /// Returns an error if the panel has been dropped and the channel is closed.
    pub async fn send_input(&self, input: PanelInput) -> Result<()> {
        self.input_tx
            .send(input)
            .await
            .map_err(|_| crate::HardwareError::disconnected("Panel input channel closed"))
    }

    /// Press a push button.
    ///
    /// # Errors
    ///
    /// Returns an error if the panel has been dropped.
    pub async fn press_button(&self, id: u8) -> Result<()> {
        self.send_input(PanelInput::Button(id)).await
    }

    /// Flip a toggle switch.
    ///
    /// # Errors
    ///
    /// Returns an error if the panel has been dropped.
    pub async fn toggle_switch(&self, id: u8) -> Result<()> {
        self.send_input(PanelInput::Switch(id)).await
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
