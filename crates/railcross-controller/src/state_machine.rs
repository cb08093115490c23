//! Level-crossing state machine.
//!
//! The [`CrossingController`] owns the crossing state and every counter the
//! phase scripts depend on. It is driven from exactly two entry points:
//!
//! - [`on_event`](CrossingController::on_event) maps operator inputs to state
//!   transitions and never actuates anything.
//! - [`on_tick`](CrossingController::on_tick) advances the time base and runs
//!   the current state's phase script, returning the commands to issue.
//!
//! # Transitions
//!
//! - Button 3 → shutdown, from any state
//! - Button 0/1 in Traffic → Pedestrian
//! - Switch 0 outside Train/Maintenance → Train; in Train → Transition
//! - Switch 1 outside Maintenance → Maintenance; in Maintenance → Transition
//! - Pedestrian at 16 s and Transition at 13 s → Traffic
//!
//! # Examples
//!
//! ```
//! use railcross_controller::CrossingController;
//! use railcross_core::{CrossingConfig, CrossingState, InputEvent};
//!
//! let mut controller = CrossingController::new(CrossingConfig::default());
//!
//! let transition = controller.on_event(InputEvent::SwitchToggled(0)).unwrap();
//! assert_eq!(transition.to, CrossingState::Train);
//!
//! // Ten ticks make one second in state.
//! for _ in 0..10 {
//!     controller.on_tick();
//! }
//! assert_eq!(controller.seconds_in_state(), 1);
//! ```

use std::collections::VecDeque;
use std::fmt;

use railcross_core::constants::{
    MAINTENANCE_SWITCH, PEDESTRIAN_BUTTONS, SHUTDOWN_BUTTON, TICKS_PER_SECOND, TRAIN_SWITCH,
};
use railcross_core::{CrossingConfig, CrossingState, InputEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::phase::{self, Actuation, PhaseInput};

/// Represents a single state transition.
///
/// `tick` is the number of ticks the controller had processed when the
/// transition happened, which places it on the crossing's own time base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: CrossingState,

    /// The state transitioned to.
    pub to: CrossingState,

    /// Controller tick count at the transition.
    pub tick: u64,
}

impl StateTransition {
    /// Create a new state transition record.
    pub fn new(from: CrossingState, to: CrossingState, tick: u64) -> Self {
        Self { from, to, tick }
    }
}

impl fmt::Display for StateTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} @ tick {}", self.from, self.to, self.tick)
    }
}

/// Point-in-time view of the controller for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStatus {
    pub state: CrossingState,
    pub seconds_in_state: u32,
    pub tick_counter: u32,
    pub traffic_flow_secs: u32,
    pub traffic_flow_snapshot: u32,
    pub red_light_asserted: bool,
    pub blink_on: bool,
    pub terminated: bool,
    pub total_ticks: u64,
}

impl fmt::Display for ControllerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} t={}s flow={}s red={} terminated={}",
            self.state,
            self.seconds_in_state,
            self.traffic_flow_secs,
            self.red_light_asserted,
            self.terminated
        )
    }
}

/// The crossing's timed finite-state machine.
///
/// Not shared between tasks: a single consumer owns it and feeds it events in
/// delivery order.
#[derive(Debug, Clone)]
pub struct CrossingController {
    /// Current operating mode.
    state: CrossingState,

    /// Whole seconds since the last transition.
    seconds_in_state: u32,

    /// Ticks within the current second.
    tick_counter: u32,

    /// Consecutive seconds of road traffic flow.
    traffic_flow_secs: u32,

    /// Flow captured on entering Pedestrian.
    traffic_flow_snapshot: u32,

    /// Red phase already fired.
    red_light_asserted: bool,

    /// Next value written to the blue indicator in the maintenance override.
    blink_on: bool,

    /// Shutdown requested. Never cleared.
    terminated: bool,

    /// Ticks processed since start-up.
    total_ticks: u64,

    /// Transitions since start-up, including those dropped from `history`.
    transition_count: u64,

    /// Recent transitions, oldest first.
    history: VecDeque<StateTransition>,

    config: CrossingConfig,
}

impl CrossingController {
    /// Create a controller in Traffic with all counters at zero.
    pub fn new(config: CrossingConfig) -> Self {
        Self::builder().with_config(config).build()
    }

    /// Create a builder for restoring a controller mid-sequence.
    ///
    /// # Examples
    ///
    /// ```
    /// use railcross_controller::CrossingController;
    /// use railcross_core::CrossingState;
    ///
    /// let controller = CrossingController::builder()
    ///     .with_traffic_flow_secs(15)
    ///     .build();
    ///
    /// assert_eq!(controller.state(), CrossingState::Traffic);
    /// assert_eq!(controller.traffic_flow_secs(), 15);
    /// ```
    pub fn builder() -> CrossingControllerBuilder {
        CrossingControllerBuilder::default()
    }

    /// Map an operator input to a transition.
    ///
    /// Returns the transition taken, or `None` if the input does not apply in
    /// the current state. Never issues commands; the next tick runs the new
    /// state's script.
    pub fn on_event(&mut self, event: InputEvent) -> Option<StateTransition> {
        if self.terminated {
            debug!(%event, "Input after shutdown ignored");
            return None;
        }

        let target = match event {
            InputEvent::ButtonPressed(SHUTDOWN_BUTTON) => {
                info!(state = %self.state, "Shutdown requested");
                self.terminated = true;
                return None;
            }
            InputEvent::ButtonPressed(id) if PEDESTRIAN_BUTTONS.contains(&id) => {
                (self.state == CrossingState::Traffic).then_some(CrossingState::Pedestrian)
            }
            InputEvent::SwitchToggled(TRAIN_SWITCH) => match self.state {
                CrossingState::Train => Some(CrossingState::Transition),
                CrossingState::Maintenance => None,
                _ => Some(CrossingState::Train),
            },
            InputEvent::SwitchToggled(MAINTENANCE_SWITCH) => match self.state {
                CrossingState::Maintenance => Some(CrossingState::Transition),
                _ => Some(CrossingState::Maintenance),
            },
            InputEvent::ButtonPressed(_) | InputEvent::SwitchToggled(_) => None,
        };

        match target {
            Some(to) => Some(self.enter(to)),
            None => {
                debug!(%event, state = %self.state, "Input ignored");
                None
            }
        }
    }

    /// Advance the time base by one tick and run the phase script.
    ///
    /// Counters are advanced before the script runs. Returns the commands to
    /// issue, in order; empty once shut down.
    pub fn on_tick(&mut self) -> Vec<Actuation> {
        if self.terminated {
            return Vec::new();
        }

        self.total_ticks += 1;
        self.tick_counter += 1;
        if self.tick_counter >= TICKS_PER_SECOND {
            self.tick_counter = 0;
            self.seconds_in_state += 1;
            if self.state.counts_traffic_flow() {
                self.traffic_flow_secs += 1;
            }
        }

        self.evaluate()
    }

    /// Run the current state's phase script without advancing time.
    ///
    /// Used once at start-up so the Traffic entry actions happen before the
    /// first tick arrives.
    pub fn evaluate(&mut self) -> Vec<Actuation> {
        if self.terminated {
            return Vec::new();
        }

        if let Some(offset) =
            phase::red_shortcut(self.state, self.seconds_in_state, self.red_light_asserted)
        {
            debug!(
                state = %self.state,
                from = self.seconds_in_state,
                to = offset,
                "Red already asserted, skipping amber"
            );
            self.seconds_in_state = offset;
        }

        let step = phase::evaluate(&self.phase_input(), &self.config.gate);

        if let Some(asserted) = step.red_light_asserted {
            self.red_light_asserted = asserted;
        }
        if step.toggle_blink {
            self.blink_on = !self.blink_on;
        }
        if !step.actuations.is_empty() {
            trace!(
                state = %self.state,
                t = self.seconds_in_state,
                actuations = ?step.actuations,
                "Phase step"
            );
        }
        if let Some(next) = step.next_state {
            self.enter(next);
        }

        step.actuations
    }

    fn phase_input(&self) -> PhaseInput {
        PhaseInput {
            state: self.state,
            seconds_in_state: self.seconds_in_state,
            red_light_asserted: self.red_light_asserted,
            blink_on: self.blink_on,
            pedestrian_lights: self.traffic_flow_snapshot > self.config.pedestrian_min_traffic_secs,
        }
    }

    /// Enter `to`, resetting the per-state counters.
    fn enter(&mut self, to: CrossingState) -> StateTransition {
        let transition = StateTransition::new(self.state, to, self.total_ticks);

        if to == CrossingState::Pedestrian {
            self.traffic_flow_snapshot = self.traffic_flow_secs;
        } else {
            self.traffic_flow_secs = 0;
        }
        if to == CrossingState::Maintenance {
            self.blink_on = false;
        }
        self.state = to;
        self.seconds_in_state = 0;
        self.tick_counter = 0;

        info!(
            from = %transition.from,
            to = %transition.to,
            tick = transition.tick,
            traffic_flow_snapshot = self.traffic_flow_snapshot,
            "State transition"
        );

        self.add_to_history(transition);
        transition
    }

    /// Add a transition to history, maintaining size limit.
    fn add_to_history(&mut self, transition: StateTransition) {
        self.transition_count += 1;
        self.history.push_back(transition);
        while self.history.len() > self.config.history_size {
            self.history.pop_front();
        }
    }

    pub fn state(&self) -> CrossingState {
        self.state
    }

    pub fn seconds_in_state(&self) -> u32 {
        self.seconds_in_state
    }

    pub fn traffic_flow_secs(&self) -> u32 {
        self.traffic_flow_secs
    }

    /// Traffic flow captured on the most recent entry into Pedestrian.
    pub fn traffic_flow_snapshot(&self) -> u32 {
        self.traffic_flow_snapshot
    }

    pub fn red_light_asserted(&self) -> bool {
        self.red_light_asserted
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Transitions since start-up.
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    pub fn config(&self) -> &CrossingConfig {
        &self.config
    }

    /// Recent transitions, oldest first, bounded by the configured history
    /// size.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Get the last N state transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .copied()
            .collect()
    }

    /// Snapshot of every counter.
    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            state: self.state,
            seconds_in_state: self.seconds_in_state,
            tick_counter: self.tick_counter,
            traffic_flow_secs: self.traffic_flow_secs,
            traffic_flow_snapshot: self.traffic_flow_snapshot,
            red_light_asserted: self.red_light_asserted,
            blink_on: self.blink_on,
            terminated: self.terminated,
            total_ticks: self.total_ticks,
        }
    }
}

impl Default for CrossingController {
    fn default() -> Self {
        Self::new(CrossingConfig::default())
    }
}

/// Builder for constructing `CrossingController` instances mid-sequence.
///
/// Useful for tests and for resuming a bench session in a known state.
#[derive(Debug, Default)]
pub struct CrossingControllerBuilder {
    config: CrossingConfig,
    initial_state: Option<CrossingState>,
    traffic_flow_secs: u32,
    red_light_asserted: bool,
}

impl CrossingControllerBuilder {
    pub fn with_config(mut self, config: CrossingConfig) -> Self {
        self.config = config;
        self
    }

    /// Start in `state` at `t = 0`. Entering Pedestrian this way takes the
    /// traffic-flow snapshot just as a button press would.
    pub fn with_initial_state(mut self, state: CrossingState) -> Self {
        self.initial_state = Some(state);
        self
    }

    pub fn with_traffic_flow_secs(mut self, secs: u32) -> Self {
        self.traffic_flow_secs = secs;
        self
    }

    pub fn with_red_light_asserted(mut self, asserted: bool) -> Self {
        self.red_light_asserted = asserted;
        self
    }

    pub fn build(self) -> CrossingController {
        let state = self.initial_state.unwrap_or(CrossingState::Traffic);
        let snapshot = if state == CrossingState::Pedestrian {
            self.traffic_flow_secs
        } else {
            0
        };

        CrossingController {
            state,
            seconds_in_state: 0,
            tick_counter: 0,
            traffic_flow_secs: self.traffic_flow_secs,
            traffic_flow_snapshot: snapshot,
            red_light_asserted: self.red_light_asserted,
            blink_on: false,
            terminated: false,
            total_ticks: 0,
            transition_count: 0,
            history: VecDeque::with_capacity(self.config.history_size.min(1024)),
            config: self.config,
        }
    }
}
