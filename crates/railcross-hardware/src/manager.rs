//! Peripheral device manager.
//!
//! This module provides the `PeripheralManager`, which runs the crossing's
//! input producers (time base and operator panel) and merges what they
//! produce into one bounded queue for the controller runtime.
//!
//! # Architecture
//!
//! Each producer runs in its own async task. A task only waits on its device
//! and posts the result; all decisions happen on the consumer side, so the
//! order of events in the queue is the order the controller sees them.
//!
//! ```text
//! ┌──────────┐       ┌─────────────────┐
//! │ Ticker   │──────►│                 │
//! │ Task     │       │  Event Queue    │
//! └──────────┘       │  (bounded mpsc) │──────► Crossing Runtime
//!                    │                 │
//! ┌──────────┐       │                 │
//! │ Panel    │──────►│                 │
//! │ Task     │       └─────────────────┘
//! └──────────┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use railcross_hardware::devices::{AnyControlPanel, AnyTickSource};
//! use railcross_hardware::manager::{PeripheralConfig, PeripheralManager};
//! use railcross_hardware::mock::MockPanel;
//! use railcross_hardware::IntervalTicker;
//!
//! #[tokio::main]
//! async fn main() -> railcross_hardware::Result<()> {
//!     let mut manager = PeripheralManager::new(PeripheralConfig::default());
//!
//!     let (panel, _handle) = MockPanel::new();
//!     manager.register_tick_source(AnyTickSource::Interval(IntervalTicker::from_hz(10)?));
//!     manager.register_control_panel(AnyControlPanel::Mock(panel));
//!
//!     let mut handle = manager.start()?;
//!     while let Some(event) = handle.recv().await {
//!         println!("Event: {:?}", event);
//!     }
//!
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```

use railcross_core::CrossingConfig;
use railcross_core::constants::DEFAULT_EVENT_QUEUE_CAPACITY;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::devices::{AnyControlPanel, AnyTickSource};
use crate::traits::{ControlPanel, PanelInput, TickSource};
use crate::{HardwareError, Result};

/// Event posted by a producer task.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PeripheralEvent {
    /// One period of the time base elapsed.
    Tick,

    /// The operator pressed a button or flipped a switch.
    Input(PanelInput),

    /// Device error occurred.
    ///
    /// This event is sent when a device encounters an error. The device
    /// task will terminate after sending this event.
    DeviceError {
        /// Type of device that encountered the error.
        device_type: DeviceType,

        /// Error message.
        error: String,
    },
}

/// Type of input producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    /// Periodic time base.
    TickSource,

    /// Button and switch panel.
    ControlPanel,
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TickSource => write!(f, "Tick source"),
            Self::ControlPanel => write!(f, "Control panel"),
        }
    }
}

/// Configuration for the peripheral manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeripheralConfig {
    /// Capacity of the event queue.
    pub event_queue_capacity: usize,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }
}

impl From<&CrossingConfig> for PeripheralConfig {
    fn from(config: &CrossingConfig) -> Self {
        Self {
            event_queue_capacity: config.event_queue_capacity,
        }
    }
}

/// Which producers are registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeripheralStats {
    /// A tick source is registered.
    pub tick_source_registered: bool,

    /// A control panel is registered.
    pub control_panel_registered: bool,
}

/// Consumer end of the event queue.
///
/// Returned by [`PeripheralManager::start`]. Owns the producer tasks, so
/// dropping or shutting down the handle stops them.
pub struct PeripheralHandle {
    /// Event receiver for consuming events from devices.
    event_rx: mpsc::Receiver<PeripheralEvent>,

    /// Running device tasks.
    tasks: JoinSet<Result<()>>,

    /// Queue capacity, used by consumers to bound a drain pass.
    capacity: usize,
}

impl PeripheralHandle {
    /// Receive the next event, waiting until one is available.
    ///
    /// Returns `None` once every producer task has ended and the queue is
    /// empty.
    pub async fn recv(&mut self) -> Option<PeripheralEvent> {
        self.event_rx.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<PeripheralEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Capacity of the event queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stop all producer tasks.
    ///
    /// Aborts every task and waits for them to end. Task errors and panics
    /// are logged and counted but do not fail the shutdown.
    pub async fn shutdown(mut self) -> Result<()> {
        self.event_rx.close();
        self.tasks.abort_all();

        let mut error_count = 0;
        let mut panic_count = 0;

        while let Some(result) = self.tasks.join_next().await {
            match Self::classify_task_result(result) {
                TaskTermination::Success => {}
                TaskTermination::Error => error_count += 1,
                TaskTermination::Panic => panic_count += 1,
                TaskTermination::Cancelled => {}
            }
        }

        if error_count + panic_count > 0 {
            error!(error_count, panic_count, "Peripheral tasks ended abnormally");
        } else {
            debug!("Peripheral tasks stopped");
        }

        Ok(())
    }

    /// Classify the termination status of a task.
    fn classify_task_result(
        result: std::result::Result<Result<()>, tokio::task::JoinError>,
    ) -> TaskTermination {
        match result {
            Ok(Ok(())) => TaskTermination::Success,
            Ok(Err(_)) => TaskTermination::Error,
            Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
            Err(_) => TaskTermination::Panic,
        }
    }
}

/// Task termination classification for shutdown handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    /// Task completed successfully.
    Success,
    /// Task returned an error.
    Error,
    /// Task was cancelled (expected during shutdown).
    Cancelled,
    /// Task panicked.
    Panic,
}

/// Runs the input producers.
///
/// # Lifecycle
///
/// 1. Create manager with configuration
/// 2. Register a tick source and a control panel
/// 3. Call `start()` to spawn the producer tasks and get the event handle
/// 4. Use the handle to receive events
/// 5. Tasks run until their device fails or the handle is shut down
pub struct PeripheralManager {
    /// Registered time base.
    tick_source: Option<AnyTickSource>,

    /// Registered operator panel.
    control_panel: Option<AnyControlPanel>,

    /// Configuration.
    config: PeripheralConfig,
}

impl PeripheralManager {
    /// Create new peripheral manager with configuration.
    pub fn new(config: PeripheralConfig) -> Self {
        Self {
            tick_source: None,
            control_panel: None,
            config,
        }
    }

    /// Register the time base. Replaces any earlier registration.
    pub fn register_tick_source(&mut self, device: AnyTickSource) {
        self.tick_source = Some(device);
    }

    /// Register the operator panel. Replaces any earlier registration.
    pub fn register_control_panel(&mut self, device: AnyControlPanel) {
        self.control_panel = Some(device);
    }

    /// Get registration statistics.
    ///
    /// # Examples
    ///
    /// ```
    /// use railcross_hardware::devices::AnyControlPanel;
    /// use railcross_hardware::manager::{PeripheralConfig, PeripheralManager};
    /// use railcross_hardware::mock::MockPanel;
    ///
    /// let mut manager = PeripheralManager::new(PeripheralConfig::default());
    ///
    /// let (panel, _) = MockPanel::new();
    /// manager.register_control_panel(AnyControlPanel::Mock(panel));
    ///
    /// let stats = manager.get_stats();
    /// assert!(stats.control_panel_registered);
    /// assert!(!stats.tick_source_registered);
    /// ```
    pub fn get_stats(&self) -> PeripheralStats {
        PeripheralStats {
            tick_source_registered: self.tick_source.is_some(),
            control_panel_registered: self.control_panel.is_some(),
        }
    }

    /// Spawn the producer tasks and return the consumer handle.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InitializationFailed` if the tick source or the
    /// control panel is missing, and `HardwareError::ConfigurationError` for a
    /// zero queue capacity.
    pub fn start(self) -> Result<PeripheralHandle> {
        let capacity = self.config.event_queue_capacity;
        if capacity == 0 {
            return Err(HardwareError::configuration(
                "event queue capacity must be greater than zero",
            ));
        }
        let tick_source = self
            .tick_source
            .ok_or_else(|| HardwareError::initialization_failed("no tick source registered"))?;
        let control_panel = self
            .control_panel
            .ok_or_else(|| HardwareError::initialization_failed("no control panel registered"))?;

        let (event_tx, event_rx) = mpsc::channel(capacity);
        let mut tasks = JoinSet::new();

        tasks.spawn(Self::tick_task(tick_source, event_tx.clone()));
        tasks.spawn(Self::panel_task(control_panel, event_tx));

        info!(capacity, "Peripheral manager started");

        Ok(PeripheralHandle {
            event_rx,
            tasks,
            capacity,
        })
    }

    // Private task functions

    async fn tick_task(mut device: AnyTickSource, tx: mpsc::Sender<PeripheralEvent>) -> Result<()> {
        loop {
            match device.wait_tick().await {
                Ok(()) => {
                    if !Self::post(&tx, PeripheralEvent::Tick, DeviceType::TickSource).await {
                        break;
                    }
                }
                Err(e) => return Self::report_failure(&tx, DeviceType::TickSource, e).await,
            }
        }
        Ok(())
    }

    async fn panel_task(
        mut device: AnyControlPanel,
        tx: mpsc::Sender<PeripheralEvent>,
    ) -> Result<()> {
        loop {
            match device.read_input().await {
                Ok(input) => {
                    debug!(%input, "Panel input");
                    if !Self::post(&tx, PeripheralEvent::Input(input), DeviceType::ControlPanel)
                        .await
                    {
                        break;
                    }
                }
                Err(e) => return Self::report_failure(&tx, DeviceType::ControlPanel, e).await,
            }
        }
        Ok(())
    }

    /// Post one event. Returns `false` once the consumer is gone.
    async fn post(
        tx: &mpsc::Sender<PeripheralEvent>,
        event: PeripheralEvent,
        device_type: DeviceType,
    ) -> bool {
        // Use try_send to detect backpressure
        match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(%device_type, "Event queue full, waiting for consumer");
                tx.send(event).await.is_ok()
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    async fn report_failure(
        tx: &mpsc::Sender<PeripheralEvent>,
        device_type: DeviceType,
        e: HardwareError,
    ) -> Result<()> {
        error!(%device_type, error = %e, "Peripheral task failed");
        let _ = tx
            .send(PeripheralEvent::DeviceError {
                device_type,
                error: e.to_string(),
            })
            .await;
        Err(e)
    }
}
