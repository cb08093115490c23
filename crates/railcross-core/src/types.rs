use crate::config::GateCalibration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating mode of the level crossing.
///
/// Exactly one state is active at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingState {
    /// Road open, gate up, green for cars.
    Traffic,

    /// Train approaching or passing; gate down.
    Train,

    /// Cars held so pedestrians can cross.
    Pedestrian,

    /// Technician has the gate under manual control.
    Maintenance,

    /// Reopening sequence after a train or maintenance.
    Transition,
}

impl CrossingState {
    /// All states, in declaration order.
    pub const ALL: [CrossingState; 5] = [
        CrossingState::Traffic,
        CrossingState::Train,
        CrossingState::Pedestrian,
        CrossingState::Maintenance,
        CrossingState::Transition,
    ];

    /// Whether road traffic counts as flowing in this state.
    ///
    /// The controller accumulates traffic-flow seconds only while this holds.
    pub fn counts_traffic_flow(&self) -> bool {
        matches!(self, CrossingState::Traffic | CrossingState::Pedestrian)
    }
}

impl fmt::Display for CrossingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrossingState::Traffic => "Traffic",
            CrossingState::Train => "Train",
            CrossingState::Pedestrian => "Pedestrian",
            CrossingState::Maintenance => "Maintenance",
            CrossingState::Transition => "Transition",
        };
        write!(f, "{}", name)
    }
}

/// Logical signal-light channel.
///
/// The four colours share a single indicator; `All` addresses the whole lamp
/// bank at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightChannel {
    Red,
    Yellow,
    Green,
    Blue,
    All,
}

impl LightChannel {
    /// Whether this channel is one of the indicator colours.
    pub fn is_colour(&self) -> bool {
        !matches!(self, LightChannel::All)
    }
}

impl fmt::Display for LightChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LightChannel::Red => "RED",
            LightChannel::Yellow => "YELLOW",
            LightChannel::Green => "GREEN",
            LightChannel::Blue => "BLUE",
            LightChannel::All => "ALL",
        };
        write!(f, "{}", name)
    }
}

/// Gate actuator set-point, expressed as a PWM duty cycle percentage.
///
/// Lower values open the gate; the valid range is given by a
/// [`GateCalibration`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct GatePosition(f32);

impl GatePosition {
    /// Fully open position for the calibration.
    #[must_use]
    pub fn open(calibration: &GateCalibration) -> Self {
        GatePosition(calibration.open_duty)
    }

    /// Fully closed position for the calibration.
    #[must_use]
    pub fn closed(calibration: &GateCalibration) -> Self {
        GatePosition(calibration.closed_duty)
    }

    /// Map a normalized analog reading onto the calibrated range.
    ///
    /// Readings outside `[0, 1]` are clamped. Returns `None` for NaN or
    /// infinite readings so the caller can hold the gate where it is.
    ///
    /// # Examples
    ///
    /// ```
    /// use railcross_core::{GateCalibration, GatePosition};
    ///
    /// let cal = GateCalibration::default();
    /// let half = GatePosition::from_normalized(0.5, &cal).unwrap();
    /// assert_eq!(half.duty_cycle(), 2.5 + 8.5 * 0.5);
    /// assert!(GatePosition::from_normalized(f32::NAN, &cal).is_none());
    /// ```
    #[must_use]
    pub fn from_normalized(reading: f32, calibration: &GateCalibration) -> Option<Self> {
        if !reading.is_finite() {
            return None;
        }
        let reading = reading.clamp(0.0, 1.0);
        Some(GatePosition(
            calibration.open_duty + calibration.span() * reading,
        ))
    }

    /// Raw duty cycle percentage.
    #[must_use]
    pub fn duty_cycle(&self) -> f32 {
        self.0
    }
}

impl fmt::Display for GatePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}

/// Debounced operator input, tagged with the raw panel id.
///
/// Ids are not validated here: unknown buttons and switches reach the
/// controller and are ignored there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    ButtonPressed(u8),
    SwitchToggled(u8),
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputEvent::ButtonPressed(id) => write!(f, "button {}", id),
            InputEvent::SwitchToggled(id) => write!(f, "switch {}", id),
        }
    }
}
