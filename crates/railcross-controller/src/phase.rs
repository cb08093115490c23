//! Timed-phase scripts.
//!
//! Each crossing state runs a short script keyed on whole seconds spent in
//! the state. Scripts are evaluated on every tick, so a step scheduled for
//! `t = 3 s` fires on each of the ten ticks of that second; actuators must
//! tolerate the repeats. Evaluation is a pure function of [`PhaseInput`]:
//! the controller applies the returned [`PhaseStep`].
//!
//! | State | 0 s | 3 s | 6 s+ | 10 s | 13 s | 16 s |
//! |---|---|---|---|---|---|---|
//! | Traffic | gate open, GREEN | | | | | |
//! | Train | YELLOW | RED, gate closed, ALL | | | | |
//! | Maintenance | YELLOW | RED, ALL | BLUE flash, gate from knob | | | |
//! | Pedestrian | YELLOW | RED, ALL | | | ALL off, YELLOW | GREEN, to Traffic |
//! | Transition | gate open | | | ALL off, YELLOW | GREEN, to Traffic | |

use railcross_core::constants::{
    MAINTENANCE_OVERRIDE_SECS, PEDESTRIAN_AMBER_SECS, PEDESTRIAN_GREEN_SECS,
    TRANSITION_AMBER_SECS, TRANSITION_GREEN_SECS, WARNING_PHASE_SECS,
};
use railcross_core::{CrossingState, GateCalibration, GatePosition, LightChannel};
use serde::{Deserialize, Serialize};

/// Command for an output device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actuation {
    /// Switch a light channel.
    Light { channel: LightChannel, on: bool },

    /// Drive the gate to a fixed position.
    Gate(GatePosition),

    /// Drive the gate to wherever the maintenance knob points.
    ///
    /// Resolved by whoever owns the analog input; a failed read leaves the
    /// gate where it is.
    GateFromAnalog,
}

impl Actuation {
    /// Shorthand for a light command.
    pub fn light(channel: LightChannel, on: bool) -> Self {
        Actuation::Light { channel, on }
    }
}

/// Everything a script may look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseInput {
    pub state: CrossingState,
    pub seconds_in_state: u32,
    pub red_light_asserted: bool,
    pub blink_on: bool,
    /// Whether traffic had flowed long enough for the pedestrian sequence.
    pub pedestrian_lights: bool,
}

/// Result of evaluating a script once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseStep {
    /// Commands to issue, in order.
    pub actuations: Vec<Actuation>,

    /// New value for the red-light flag, if the script touches it.
    pub red_light_asserted: Option<bool>,

    /// Whether the maintenance blink phase flips after this step.
    pub toggle_blink: bool,

    /// State to enter once the commands are issued.
    pub next_state: Option<CrossingState>,
}

impl PhaseStep {
    fn light(&mut self, channel: LightChannel, on: bool) -> &mut Self {
        self.actuations.push(Actuation::light(channel, on));
        self
    }

    fn gate(&mut self, position: GatePosition) -> &mut Self {
        self.actuations.push(Actuation::Gate(position));
        self
    }

    fn red(&mut self, asserted: bool) -> &mut Self {
        self.red_light_asserted = Some(asserted);
        self
    }

    fn then(&mut self, state: CrossingState) -> &mut Self {
        self.next_state = Some(state);
        self
    }
}

/// Offset the Train and Maintenance scripts jump to when red was already
/// asserted on entry.
///
/// Re-entering one of these states with the red light still asserted skips
/// the amber ramp. Returns `None` when no jump applies, including once the
/// script is past the ramp, so the jump never moves the clock backwards.
pub fn red_shortcut(state: CrossingState, seconds_in_state: u32, red_light_asserted: bool) -> Option<u32> {
    if !red_light_asserted || seconds_in_state >= WARNING_PHASE_SECS {
        return None;
    }
    match state {
        CrossingState::Train => Some(WARNING_PHASE_SECS),
        CrossingState::Maintenance => Some(MAINTENANCE_OVERRIDE_SECS),
        _ => None,
    }
}

/// Evaluate the script of `input.state` at `input.seconds_in_state`.
pub fn evaluate(input: &PhaseInput, calibration: &GateCalibration) -> PhaseStep {
    let mut step = PhaseStep::default();
    let t = input.seconds_in_state;

    match input.state {
        CrossingState::Traffic => {
            if t == 0 {
                step.gate(GatePosition::open(calibration))
                    .light(LightChannel::Green, true)
                    .red(false);
            }
        }
        CrossingState::Train => {
            if t == 0 {
                step.light(LightChannel::Yellow, true);
            } else if t == WARNING_PHASE_SECS {
                // Gate must be down before the crossing lamps announce the train.
                step.light(LightChannel::Red, true)
                    .red(true)
                    .gate(GatePosition::closed(calibration))
                    .light(LightChannel::All, true);
            }
        }
        CrossingState::Maintenance => {
            if t == 0 {
                step.light(LightChannel::Yellow, true);
            } else if t == WARNING_PHASE_SECS {
                step.light(LightChannel::Red, true)
                    .red(true)
                    .light(LightChannel::All, true);
            } else if t >= MAINTENANCE_OVERRIDE_SECS {
                step.light(LightChannel::Blue, input.blink_on);
                step.actuations.push(Actuation::GateFromAnalog);
                step.toggle_blink = true;
            }
        }
        CrossingState::Pedestrian => {
            if input.pedestrian_lights {
                if t == 0 {
                    step.light(LightChannel::Yellow, true);
                } else if t == WARNING_PHASE_SECS {
                    step.light(LightChannel::Red, true)
                        .red(true)
                        .light(LightChannel::All, true);
                } else if t == PEDESTRIAN_AMBER_SECS {
                    step.light(LightChannel::All, false)
                        .light(LightChannel::Yellow, true)
                        .red(false);
                } else if t == PEDESTRIAN_GREEN_SECS {
                    step.light(LightChannel::Green, true);
                }
            }
            if t == PEDESTRIAN_GREEN_SECS {
                step.then(CrossingState::Traffic);
            }
        }
        CrossingState::Transition => {
            if t == 0 {
                step.gate(GatePosition::open(calibration));
            } else if t == TRANSITION_AMBER_SECS {
                step.light(LightChannel::All, false)
                    .light(LightChannel::Yellow, true)
                    .red(false);
            } else if t == TRANSITION_GREEN_SECS {
                step.light(LightChannel::Green, true)
                    .then(CrossingState::Traffic);
            }
        }
    }

    step
}
