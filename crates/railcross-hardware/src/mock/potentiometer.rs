//! Mock maintenance potentiometer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{Result, traits::AnalogInput, types::DeviceInfo};

#[derive(Debug)]
struct PotState {
    value: f32,
    fail_reads: bool,
    reads: usize,
}

fn lock(state: &Mutex<PotState>) -> MutexGuard<'_, PotState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock analog input returning whatever its handle last set.
///
/// Starts at `0.0` (gate fully open).
///
/// # Examples
///
/// ```
/// use railcross_hardware::mock::MockPotentiometer;
/// use railcross_hardware::traits::AnalogInput;
///
/// #[tokio::main]
/// async fn main() -> railcross_hardware::Result<()> {
///     let (mut pot, handle) = MockPotentiometer::new();
///
///     handle.set_value(0.75);
///     assert_eq!(pot.read_normalized().await?, 0.75);
///
///     handle.fail_next_reads(true);
///     assert!(pot.read_normalized().await.is_err());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockPotentiometer {
    state: Arc<Mutex<PotState>>,
    name: String,
}

impl MockPotentiometer {
    /// Create a new mock potentiometer with the default name.
    pub fn new() -> (Self, MockPotentiometerHandle) {
        Self::with_name("Mock Potentiometer".to_string())
    }

    /// Create a new mock potentiometer with a custom name.
    pub fn with_name(name: String) -> (Self, MockPotentiometerHandle) {
        let state = Arc::new(Mutex::new(PotState {
            value: 0.0,
            fail_reads: false,
            reads: 0,
        }));

        let pot = Self {
            state: Arc::clone(&state),
            name: name.clone(),
        };
        let handle = MockPotentiometerHandle { state, name };

        (pot, handle)
    }
}

impl Default for MockPotentiometer {
    fn default() -> Self {
        Self::new().0
    }
}

impl AnalogInput for MockPotentiometer {
    async fn read_normalized(&mut self) -> Result<f32> {
        let mut state = lock(&self.state);
        state.reads += 1;
        if state.fail_reads {
            return Err(crate::HardwareError::read("conversion did not complete"));
        }
        Ok(state.value)
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Potentiometer v1.0"))
    }
}

/// Control handle for [`MockPotentiometer`].
#[derive(Debug, Clone)]
pub struct MockPotentiometerHandle {
    state: Arc<Mutex<PotState>>,
    name: String,
}

impl MockPotentiometerHandle {
    /// Set the value returned by subsequent reads.
    ///
    /// The value is not clamped, so tests can feed out-of-range or NaN
    /// readings.
    pub fn set_value(&self, value: f32) {
        lock(&self.state).value = value;
    }

    /// Current value.
    pub fn value(&self) -> f32 {
        lock(&self.state).value
    }

    /// Make subsequent reads fail (or succeed again).
    pub fn fail_next_reads(&self, fail: bool) {
        lock(&self.state).fail_reads = fail;
    }

    /// Number of read attempts so far, failed ones included.
    pub fn read_count(&self) -> usize {
        lock(&self.state).reads
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
