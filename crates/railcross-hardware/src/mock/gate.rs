//! Mock gate servo.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use railcross_core::GatePosition;

use crate::{Result, traits::GateActuator, types::DeviceInfo};

#[derive(Debug, Default)]
struct GateState {
    positions: Vec<GatePosition>,
    fail_writes: bool,
}

fn lock(state: &Mutex<GateState>) -> MutexGuard<'_, GateState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock gate actuator that logs every position it is driven to.
///
/// # Examples
///
/// ```
/// use railcross_core::{GateCalibration, GatePosition};
/// use railcross_hardware::mock::MockGate;
/// use railcross_hardware::traits::GateActuator;
///
/// #[tokio::main]
/// async fn main() -> railcross_hardware::Result<()> {
///     let cal = GateCalibration::default();
///     let (mut gate, handle) = MockGate::new();
///
///     gate.set_position(GatePosition::closed(&cal)).await?;
///     assert_eq!(handle.position(), Some(GatePosition::closed(&cal)));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockGate {
    state: Arc<Mutex<GateState>>,
    name: String,
}

impl MockGate {
    /// Create a new mock gate with the default name.
    pub fn new() -> (Self, MockGateHandle) {
        Self::with_name("Mock Gate".to_string())
    }

    /// Create a new mock gate with a custom name.
    pub fn with_name(name: String) -> (Self, MockGateHandle) {
        let state = Arc::new(Mutex::new(GateState::default()));

        let gate = Self {
            state: Arc::clone(&state),
            name: name.clone(),
        };
        let handle = MockGateHandle { state, name };

        (gate, handle)
    }
}

impl Default for MockGate {
    fn default() -> Self {
        Self::new().0
    }
}

impl GateActuator for MockGate {
    async fn set_position(&mut self, position: GatePosition) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(crate::HardwareError::communication("servo write rejected"));
        }
        state.positions.push(position);
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Gate v1.0"))
    }
}

/// Inspection and fault-injection handle for [`MockGate`].
#[derive(Debug, Clone)]
pub struct MockGateHandle {
    state: Arc<Mutex<GateState>>,
    name: String,
}

impl MockGateHandle {
    /// Most recent position, or `None` if the gate was never driven.
    pub fn position(&self) -> Option<GatePosition> {
        lock(&self.state).positions.last().copied()
    }

    /// Every position written, oldest first.
    pub fn positions(&self) -> Vec<GatePosition> {
        lock(&self.state).positions.clone()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        lock(&self.state).positions.len()
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
