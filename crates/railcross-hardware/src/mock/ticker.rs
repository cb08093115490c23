//! Mock tick source driven manually through a handle.

use crate::{Result, traits::TickSource, types::DeviceInfo};
use tokio::sync::mpsc;

/// Mock tick source for testing.
///
/// Ticks are produced only when the paired [`MockTickerHandle`] asks for
/// them, which makes tick counts exact in tests.
///
/// # Examples
///
/// ```
/// use railcross_hardware::mock::MockTicker;
/// use railcross_hardware::traits::TickSource;
///
/// #[tokio::main]
/// async fn main() -> railcross_hardware::Result<()> {
///     let (mut ticker, handle) = MockTicker::new();
///
///     handle.tick_n(3)?;
///     for _ in 0..3 {
///         ticker.wait_tick().await?;
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTicker {
    tick_rx: mpsc::UnboundedReceiver<()>,
    name: String,
}

impl MockTicker {
    /// Create a new mock ticker with the default name.
    pub fn new() -> (Self, MockTickerHandle) {
        Self::with_name("Mock Ticker".to_string())
    }

    /// Create a new mock ticker with a custom name.
    pub fn with_name(name: String) -> (Self, MockTickerHandle) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();

        let ticker = Self {
            tick_rx,
            name: name.clone(),
        };
        let handle = MockTickerHandle { tick_tx, name };

        (ticker, handle)
    }
}

impl Default for MockTicker {
    fn default() -> Self {
        Self::new().0
    }
}

impl TickSource for MockTicker {
    async fn wait_tick(&mut self) -> Result<()> {
        self.tick_rx
            .recv()
            .await
            .ok_or_else(|| crate::HardwareError::disconnected("Ticker channel closed"))
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Ticker v1.0"))
    }
}

/// Handle for producing ticks on a [`MockTicker`].
///
/// Queued ticks are never dropped, so a test can enqueue a whole scenario up
/// front. Dropping every handle stops the ticker with a disconnect error.
#[derive(Debug, Clone)]
pub struct MockTickerHandle {
    tick_tx: mpsc::UnboundedSender<()>,
    name: String,
}

impl MockTickerHandle {
    /// Queue one tick.
    ///
    /// # Errors
    ///
    /// Returns an error if the ticker has been dropped.
    pub fn tick(&self) -> Result<()> {
        self.tick_tx
            .send(())
            .map_err(|_| crate::HardwareError::disconnected("Ticker channel closed"))
    }

    /// Queue `count` ticks.
    ///
    /// # Errors
    ///
    /// Returns an error if the ticker has been dropped.
    pub fn tick_n(&self, count: u32) -> Result<()> {
        for _ in 0..count {
            self.tick()?;
        }
        Ok(())
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
