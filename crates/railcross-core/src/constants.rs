//! Timing, actuation, and input constants for the level-crossing controller.
//!
//! The crossing runs on a fixed time base: the tick source fires at
//! [`DEFAULT_TICK_HZ`] and the controller folds every [`TICKS_PER_SECOND`]
//! ticks into one elapsed second. Every phase script is keyed on whole
//! elapsed seconds since the last state transition.
//!
//! # Phase Timeline
//!
//! | Offset | Train | Maintenance | Pedestrian | Transition |
//! |--------|-------|-------------|------------|------------|
//! | 0 s    | amber | amber | amber | gate opens |
//! | 3 s    | red, gate closes, lamps | red, lamps | red, lamps | |
//! | 6 s+   | | blue flash, manual gate | | |
//! | 10 s   | | | | amber |
//! | 13 s   | | | amber | green, back to traffic |
//! | 16 s   | | | green, back to traffic | |
//!
//! # Usage
//!
//! ```
//! use railcross_core::constants::*;
//!
//! let ticks_until_red = WARNING_PHASE_SECS * TICKS_PER_SECOND;
//! assert_eq!(ticks_until_red, 30);
//! ```

// ============================================================================
// Time Base
// ============================================================================

/// Default tick source frequency in Hz.
pub const DEFAULT_TICK_HZ: u32 = 10;

/// Number of ticks folded into one elapsed second.
///
/// Fixed independently of the configured tick frequency: raising `tick_hz`
/// above [`DEFAULT_TICK_HZ`] plays the phase scripts back faster than
/// wall-clock time.
pub const TICKS_PER_SECOND: u32 = 10;

// ============================================================================
// Gate Actuator
// ============================================================================

/// Duty cycle (percent of the PWM period) that holds the gate fully open.
pub const GATE_OPEN_DUTY: f32 = 2.5;

/// Duty cycle (percent of the PWM period) that holds the gate fully closed.
pub const GATE_CLOSED_DUTY: f32 = 11.0;

// ============================================================================
// Phase Offsets (seconds in state)
// ============================================================================

/// Length of the amber warning before red is asserted.
pub const WARNING_PHASE_SECS: u32 = 3;

/// Offset at which maintenance hands the gate to the potentiometer.
pub const MAINTENANCE_OVERRIDE_SECS: u32 = 6;

/// Offset at which the reopening sequence turns amber.
pub const TRANSITION_AMBER_SECS: u32 = 10;

/// Offset at which the reopening sequence returns to traffic.
pub const TRANSITION_GREEN_SECS: u32 = 13;

/// Offset at which the pedestrian sequence turns amber.
pub const PEDESTRIAN_AMBER_SECS: u32 = 13;

/// Offset at which the pedestrian sequence returns to traffic.
pub const PEDESTRIAN_GREEN_SECS: u32 = 16;

/// Traffic must have flowed strictly longer than this before a pedestrian
/// request runs its light sequence.
pub const DEFAULT_PEDESTRIAN_MIN_TRAFFIC_SECS: u32 = 10;

// ============================================================================
// Operator Inputs
// ============================================================================

/// Buttons that request a pedestrian crossing.
pub const PEDESTRIAN_BUTTONS: [u8; 2] = [0, 1];

/// Button that shuts the controller down.
pub const SHUTDOWN_BUTTON: u8 = 3;

/// Switch toggled when a train arrives and again when it has passed.
pub const TRAIN_SWITCH: u8 = 0;

/// Switch toggled when a technician takes and releases manual control.
pub const MAINTENANCE_SWITCH: u8 = 1;

/// Highest button id the panel can report.
pub const MAX_BUTTON_ID: u8 = 3;

/// Highest switch id the panel can report.
pub const MAX_SWITCH_ID: u8 = 1;

// ============================================================================
// Runtime Limits
// ============================================================================

/// Default capacity of the bounded event queue between producers and the
/// controller.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 64;

/// Default number of state transitions kept for diagnostics.
pub const DEFAULT_HISTORY_SIZE: usize = 100;
