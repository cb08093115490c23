//! Wall-clock tick source backed by a tokio interval.

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

use crate::{HardwareError, Result, traits::TickSource, types::DeviceInfo};

/// Tick source firing at a fixed rate.
///
/// The underlying interval is created on the first [`wait_tick`] call, so the
/// ticker can be built outside a runtime. The first tick completes
/// immediately. Late ticks are delivered back to back
/// ([`MissedTickBehavior::Burst`]) so the controller never loses a second.
///
/// [`wait_tick`]: TickSource::wait_tick
///
/// # Examples
///
/// ```
/// use railcross_hardware::IntervalTicker;
///
/// let ticker = IntervalTicker::from_hz(10).unwrap();
/// assert_eq!(ticker.period().as_millis(), 100);
/// assert!(IntervalTicker::from_hz(0).is_err());
/// ```
#[derive(Debug)]
pub struct IntervalTicker {
    period: Duration,
    interval: Option<Interval>,
}

impl IntervalTicker {
    /// Create a ticker with the given period.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero period.
    pub fn new(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(HardwareError::configuration("tick period must be non-zero"));
        }
        Ok(Self {
            period,
            interval: None,
        })
    }

    /// Create a ticker firing `hz` times per second.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `hz` is zero.
    pub fn from_hz(hz: u32) -> Result<Self> {
        if hz == 0 {
            return Err(HardwareError::configuration("tick rate must be non-zero"));
        }
        Self::new(Duration::from_secs(1) / hz)
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl TickSource for IntervalTicker {
    async fn wait_tick(&mut self) -> Result<()> {
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            interval
        });
        interval.tick().await;
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("Interval Ticker", format!("tokio interval {:?}", self.period)))
    }
}
