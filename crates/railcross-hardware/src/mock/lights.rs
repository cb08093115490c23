//! Mock signal-light bank.
//!
//! Every command is applied to a [`SignalHead`] and appended to a log, both
//! shared with the paired [`MockLightsHandle`] so tests can inspect what the
//! controller asked for.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use railcross_core::LightChannel;

use crate::{Result, traits::LightBank, types::DeviceInfo, types::SignalHead};

#[derive(Debug, Default)]
struct LightState {
    head: SignalHead,
    log: Vec<(LightChannel, bool)>,
    fail_writes: bool,
}

fn lock(state: &Mutex<LightState>) -> MutexGuard<'_, LightState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock light bank.
///
/// # Examples
///
/// ```
/// use railcross_core::LightChannel;
/// use railcross_hardware::mock::MockLights;
/// use railcross_hardware::traits::LightBank;
///
/// #[tokio::main]
/// async fn main() -> railcross_hardware::Result<()> {
///     let (mut lights, handle) = MockLights::new();
///
///     lights.set_light(LightChannel::Green, true).await?;
///
///     assert_eq!(handle.signal_head().indicator(), Some(LightChannel::Green));
///     assert_eq!(handle.commands(), vec![(LightChannel::Green, true)]);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockLights {
    state: Arc<Mutex<LightState>>,
    name: String,
}

impl MockLights {
    /// Create a new mock light bank with the default name.
    pub fn new() -> (Self, MockLightsHandle) {
        Self::with_name("Mock Lights".to_string())
    }

    /// Create a new mock light bank with a custom name.
    pub fn with_name(name: String) -> (Self, MockLightsHandle) {
        let state = Arc::new(Mutex::new(LightState::default()));

        let lights = Self {
            state: Arc::clone(&state),
            name: name.clone(),
        };
        let handle = MockLightsHandle { state, name };

        (lights, handle)
    }
}

impl Default for MockLights {
    fn default() -> Self {
        Self::new().0
    }
}

impl LightBank for MockLights {
    async fn set_light(&mut self, channel: LightChannel, on: bool) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(crate::HardwareError::communication(format!(
                "{} write rejected",
                channel
            )));
        }
        state.head.apply(channel, on);
        state.log.push((channel, on));
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Lights v1.0"))
    }
}

/// Inspection and fault-injection handle for [`MockLights`].
#[derive(Debug, Clone)]
pub struct MockLightsHandle {
    state: Arc<Mutex<LightState>>,
    name: String,
}

impl MockLightsHandle {
    /// Current state of the signal head.
    pub fn signal_head(&self) -> SignalHead {
        lock(&self.state).head
    }

    /// Every successful command, oldest first.
    pub fn commands(&self) -> Vec<(LightChannel, bool)> {
        lock(&self.state).log.clone()
    }

    /// Number of successful commands so far.
    pub fn command_count(&self) -> usize {
        lock(&self.state).log.len()
    }

    /// Last successful command, if any.
    pub fn last_command(&self) -> Option<(LightChannel, bool)> {
        lock(&self.state).log.last().copied()
    }

    /// Forget logged commands. The signal head keeps its state.
    pub fn clear_commands(&self) {
        lock(&self.state).log.clear();
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
