//! Controller configuration.
//!
//! Configuration is read from a TOML file. Every key is optional and falls
//! back to the defaults in [`constants`](crate::constants):
//!
//! ```toml
//! tick_hz = 10
//! event_queue_capacity = 64
//! pedestrian_min_traffic_secs = 10
//! history_size = 100
//!
//! [gate]
//! open_duty = 2.5
//! closed_duty = 11.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EVENT_QUEUE_CAPACITY, DEFAULT_HISTORY_SIZE, DEFAULT_PEDESTRIAN_MIN_TRAFFIC_SECS,
    DEFAULT_TICK_HZ, GATE_CLOSED_DUTY, GATE_OPEN_DUTY,
};
use crate::{Error, Result};

/// Duty-cycle limits of the gate servo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateCalibration {
    /// Duty cycle that holds the gate fully open.
    pub open_duty: f32,

    /// Duty cycle that holds the gate fully closed.
    pub closed_duty: f32,
}

impl GateCalibration {
    /// Width of the calibrated range.
    pub fn span(&self) -> f32 {
        self.closed_duty - self.open_duty
    }

    /// Check that both limits are finite and ordered.
    ///
    /// # Errors
    /// Returns `Error::InvalidCalibration` otherwise.
    pub fn validate(&self) -> Result<()> {
        if !self.open_duty.is_finite()
            || !self.closed_duty.is_finite()
            || self.open_duty >= self.closed_duty
        {
            return Err(Error::InvalidCalibration {
                open: self.open_duty,
                closed: self.closed_duty,
            });
        }
        Ok(())
    }
}

impl Default for GateCalibration {
    fn default() -> Self {
        Self {
            open_duty: GATE_OPEN_DUTY,
            closed_duty: GATE_CLOSED_DUTY,
        }
    }
}

/// Top-level configuration for a crossing controller and its time base.
///
/// # Examples
///
/// ```
/// use railcross_core::CrossingConfig;
///
/// let config = CrossingConfig::from_toml_str("tick_hz = 50").unwrap();
/// assert_eq!(config.tick_hz, 50);
/// assert_eq!(config.gate.closed_duty, 11.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossingConfig {
    /// Tick source frequency in Hz.
    pub tick_hz: u32,

    /// Capacity of the bounded producer/consumer event queue.
    pub event_queue_capacity: usize,

    /// Traffic-flow seconds that must be exceeded before a pedestrian
    /// request runs its light sequence.
    pub pedestrian_min_traffic_secs: u32,

    /// Number of state transitions kept in the controller history.
    pub history_size: usize,

    /// Gate servo limits.
    pub gate: GateCalibration,
}

impl Default for CrossingConfig {
    fn default() -> Self {
        Self {
            tick_hz: DEFAULT_TICK_HZ,
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
            pedestrian_min_traffic_secs: DEFAULT_PEDESTRIAN_MIN_TRAFFIC_SECS,
            history_size: DEFAULT_HISTORY_SIZE,
            gate: GateCalibration::default(),
        }
    }
}

impl CrossingConfig {
    /// Parse and validate a configuration from TOML text.
    ///
    /// # Errors
    /// Returns `Error::Config` on malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CrossingConfig =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, and `Error::Config`
    /// if it cannot be parsed or any value is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// Returns `Error::Config` for a zero tick rate, queue capacity, or
    /// history size, and `Error::InvalidCalibration` for bad gate limits.
    pub fn validate(&self) -> Result<()> {
        if self.tick_hz == 0 {
            return Err(Error::Config("tick_hz must be greater than zero".to_string()));
        }
        if self.event_queue_capacity == 0 {
            return Err(Error::Config(
                "event_queue_capacity must be greater than zero".to_string(),
            ));
        }
        if self.history_size == 0 {
            return Err(Error::Config(
                "history_size must be greater than zero".to_string(),
            ));
        }
        self.gate.validate()
    }

    /// Interval between ticks.
    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(1) / self.tick_hz.max(1)
    }
}
