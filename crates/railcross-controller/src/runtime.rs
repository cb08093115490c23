//! Consumer loop connecting the controller to real (or mock) devices.
//!
//! The runtime is the single owner of the [`CrossingController`] and of every
//! output device. Producers only post events to the peripheral queue; the
//! runtime folds them in delivery order and carries out the resulting
//! commands.
//!
//! # Examples
//!
//! ```no_run
//! use railcross_controller::CrossingRuntime;
//! use railcross_core::CrossingConfig;
//! use railcross_hardware::devices::{
//!     AnyAnalogInput, AnyControlPanel, AnyGateActuator, AnyLightBank, AnyTickSource,
//! };
//! use railcross_hardware::mock::{MockGate, MockLights, MockPanel, MockPotentiometer};
//! use railcross_hardware::{IntervalTicker, PeripheralConfig, PeripheralManager};
//!
//! #[tokio::main]
//! async fn main() -> railcross_core::Result<()> {
//!     let config = CrossingConfig::default();
//!
//!     let mut manager = PeripheralManager::new(PeripheralConfig::from(&config));
//!     let (panel, _panel_handle) = MockPanel::new();
//!     manager.register_tick_source(AnyTickSource::Interval(IntervalTicker::from_hz(config.tick_hz)?));
//!     manager.register_control_panel(AnyControlPanel::Mock(panel));
//!
//!     let runtime = CrossingRuntime::builder()
//!         .with_config(config)
//!         .with_lights(AnyLightBank::Mock(MockLights::new().0))
//!         .with_gate(AnyGateActuator::Mock(MockGate::new().0))
//!         .with_analog(AnyAnalogInput::Mock(MockPotentiometer::new().0))
//!         .with_peripherals(manager.start()?)
//!         .build()
//!         .await?;
//!
//!     let summary = runtime.run().await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

use std::fmt;

use railcross_core::{CrossingConfig, CrossingState, Error, GatePosition, Result};
use railcross_hardware::devices::{AnyAnalogInput, AnyGateActuator, AnyLightBank};
use railcross_hardware::traits::{AnalogInput, GateActuator, LightBank};
use railcross_hardware::{DeviceType, PeripheralEvent, PeripheralHandle};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::phase::Actuation;
use crate::state_machine::{ControllerStatus, CrossingController, StateTransition};

/// Why the run loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The shutdown button was pressed.
    Shutdown,

    /// Every producer ended and the queue drained.
    QueueClosed,

    /// The time base failed; the crossing cannot keep time without it.
    TickSourceFailed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Shutdown => write!(f, "shutdown requested"),
            StopReason::QueueClosed => write!(f, "event queue closed"),
            StopReason::TickSourceFailed(error) => write!(f, "tick source failed: {}", error),
        }
    }
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Ticks folded into the controller.
    pub ticks: u64,

    /// Operator inputs folded into the controller.
    pub inputs: u64,

    /// State transitions taken.
    pub transitions: u64,

    /// Output commands that failed and were skipped.
    pub failed_writes: u64,

    /// State when the loop ended.
    pub final_state: CrossingState,

    /// Most recent transitions, oldest first.
    pub recent_transitions: Vec<StateTransition>,

    pub stop_reason: StopReason,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} after {} ticks, {} inputs, {} transitions (final state {}, {} failed writes)",
            self.stop_reason,
            self.ticks,
            self.inputs,
            self.transitions,
            self.final_state,
            self.failed_writes
        )
    }
}

/// Number of transitions reported in a [`RunSummary`].
const SUMMARY_TRANSITIONS: usize = 10;

/// Owns the controller and the output devices.
pub struct CrossingRuntime {
    controller: CrossingController,
    lights: AnyLightBank,
    gate: AnyGateActuator,
    analog: AnyAnalogInput,
    peripherals: PeripheralHandle,
    status_tx: watch::Sender<ControllerStatus>,
    inputs: u64,
    failed_writes: u64,
}

impl CrossingRuntime {
    /// Create a builder. Every collaborator must be supplied before
    /// [`build`](CrossingRuntimeBuilder::build).
    pub fn builder() -> CrossingRuntimeBuilder {
        CrossingRuntimeBuilder::default()
    }

    /// Subscribe to controller status, published after each batch of events.
    pub fn subscribe(&self) -> watch::Receiver<ControllerStatus> {
        self.status_tx.subscribe()
    }

    /// Controller owned by this runtime.
    pub fn controller(&self) -> &CrossingController {
        &self.controller
    }

    /// Run until shutdown, queue closure, or tick source failure.
    ///
    /// The start-up script runs before the first event. After that each
    /// iteration waits for one event, drains whatever else is already queued
    /// (up to the queue capacity), and folds the batch in order. Folding
    /// stops at the shutdown event; nothing after it is actuated.
    ///
    /// # Errors
    ///
    /// Returns an error only if the peripheral tasks cannot be shut down.
    /// Device write failures are logged and skipped.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!(status = %self.controller.status(), "Crossing runtime started");

        let startup = self.controller.evaluate();
        self.apply(startup).await;
        self.publish();

        let capacity = self.peripherals.capacity();
        let mut batch = Vec::with_capacity(capacity);

        let stop_reason = loop {
            let Some(first) = self.peripherals.recv().await else {
                break StopReason::QueueClosed;
            };
            batch.push(first);
            while batch.len() < capacity {
                match self.peripherals.try_recv() {
                    Some(event) => batch.push(event),
                    None => break,
                }
            }

            let stop = self.fold(&mut batch).await;
            self.publish();
            if let Some(reason) = stop {
                break reason;
            }
        };

        let summary = RunSummary {
            ticks: self.controller.total_ticks(),
            inputs: self.inputs,
            transitions: self.controller.transition_count(),
            failed_writes: self.failed_writes,
            final_state: self.controller.state(),
            recent_transitions: self.controller.last_transitions(SUMMARY_TRANSITIONS),
            stop_reason,
        };
        info!(summary = %summary, "Crossing runtime stopped");

        self.peripherals.shutdown().await?;
        Ok(summary)
    }

    /// Fold a batch of events. Returns the stop reason if the loop must end.
    async fn fold(&mut self, batch: &mut Vec<PeripheralEvent>) -> Option<StopReason> {
        for event in batch.drain(..) {
            match event {
                PeripheralEvent::Tick => {
                    let actuations = self.controller.on_tick();
                    self.apply(actuations).await;
                }
                PeripheralEvent::Input(input) => {
                    self.inputs += 1;
                    self.controller.on_event(input.into());
                    if self.controller.is_terminated() {
                        return Some(StopReason::Shutdown);
                    }
                }
                PeripheralEvent::DeviceError { device_type, error } => {
                    error!(%device_type, error = %error, "Peripheral failed");
                    if device_type == DeviceType::TickSource {
                        return Some(StopReason::TickSourceFailed(error));
                    }
                }
                other => debug!(event = ?other, "Unhandled peripheral event"),
            }
        }
        None
    }

    /// Carry out commands in order, skipping any that fail.
    async fn apply(&mut self, actuations: Vec<Actuation>) {
        for actuation in actuations {
            match actuation {
                Actuation::Light { channel, on } => {
                    if let Err(e) = self.lights.set_light(channel, on).await {
                        self.failed_writes += 1;
                        warn!(%channel, on, error = %e, "Light write failed");
                    }
                }
                Actuation::Gate(position) => self.drive_gate(position).await,
                Actuation::GateFromAnalog => {
                    if let Some(position) = self.read_gate_setpoint().await {
                        self.drive_gate(position).await;
                    }
                }
            }
        }
    }

    async fn drive_gate(&mut self, position: GatePosition) {
        if let Err(e) = self.gate.set_position(position).await {
            self.failed_writes += 1;
            warn!(%position, error = %e, "Gate write failed");
        }
    }

    /// Map the maintenance knob onto the gate range. `None` holds the gate.
    async fn read_gate_setpoint(&mut self) -> Option<GatePosition> {
        let reading = match self.analog.read_normalized().await {
            Ok(reading) => reading,
            Err(e) => {
                warn!(error = %e, "Analog read failed, holding gate");
                return None;
            }
        };
        let position = GatePosition::from_normalized(reading, &self.controller.config().gate);
        if position.is_none() {
            warn!(reading, "Analog reading not finite, holding gate");
        }
        position
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.controller.status());
    }
}

/// Builder for [`CrossingRuntime`].
#[derive(Default)]
pub struct CrossingRuntimeBuilder {
    config: Option<CrossingConfig>,
    lights: Option<AnyLightBank>,
    gate: Option<AnyGateActuator>,
    analog: Option<AnyAnalogInput>,
    peripherals: Option<PeripheralHandle>,
}

impl CrossingRuntimeBuilder {
    /// Controller configuration. Defaults apply if not set.
    pub fn with_config(mut self, config: CrossingConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_lights(mut self, lights: AnyLightBank) -> Self {
        self.lights = Some(lights);
        self
    }

    pub fn with_gate(mut self, gate: AnyGateActuator) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_analog(mut self, analog: AnyAnalogInput) -> Self {
        self.analog = Some(analog);
        self
    }

    /// Event queue from a started [`PeripheralManager`](railcross_hardware::PeripheralManager).
    pub fn with_peripherals(mut self, peripherals: PeripheralHandle) -> Self {
        self.peripherals = Some(peripherals);
        self
    }

    /// Validate the configuration, probe every output device, and build the
    /// runtime.
    ///
    /// # Errors
    ///
    /// - `Error::MissingCollaborator` if a device or the peripheral handle
    ///   was not supplied
    /// - `Error::Config` / `Error::InvalidCalibration` for a bad config
    /// - `Error::Hardware` if a device does not answer its info probe
    pub async fn build(self) -> Result<CrossingRuntime> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let lights = self
            .lights
            .ok_or_else(|| Error::MissingCollaborator("light bank".to_string()))?;
        let gate = self
            .gate
            .ok_or_else(|| Error::MissingCollaborator("gate actuator".to_string()))?;
        let analog = self
            .analog
            .ok_or_else(|| Error::MissingCollaborator("analog input".to_string()))?;
        let peripherals = self
            .peripherals
            .ok_or_else(|| Error::MissingCollaborator("peripheral handle".to_string()))?;

        let lights_info = lights.get_info().await?;
        let gate_info = gate.get_info().await?;
        let analog_info = analog.get_info().await?;
        info!(
            lights = %lights_info.name,
            gate = %gate_info.name,
            analog = %analog_info.name,
            "Output devices ready"
        );

        let controller = CrossingController::new(config);
        let (status_tx, _) = watch::channel(controller.status());

        Ok(CrossingRuntime {
            controller,
            lights,
            gate,
            analog,
            peripherals,
            status_tx,
            inputs: 0,
            failed_writes: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railcross_core::LightChannel;
    use railcross_hardware::devices::{AnyControlPanel, AnyTickSource};
    use railcross_hardware::mock::{
        MockGate, MockGateHandle, MockLights, MockLightsHandle, MockPanel, MockPanelHandle,
        MockPotentiometer, MockPotentiometerHandle, MockTicker, MockTickerHandle,
    };
    use railcross_hardware::{PanelInput, PeripheralConfig, PeripheralManager};

    struct Bench {
        ticks: MockTickerHandle,
        panel: MockPanelHandle,
        lights: MockLightsHandle,
        gate: MockGateHandle,
        pot: MockPotentiometerHandle,
        runtime: CrossingRuntime,
    }

    async fn bench() -> Bench {
        let config = CrossingConfig::default();
        let mut manager = PeripheralManager::new(PeripheralConfig::from(&config));
        let (ticker, ticks) = MockTicker::new();
        let (panel_device, panel) = MockPanel::new();
        manager.register_tick_source(AnyTickSource::Mock(ticker));
        manager.register_control_panel(AnyControlPanel::Mock(panel_device));

        let (lights_device, lights) = MockLights::new();
        let (gate_device, gate) = MockGate::new();
        let (pot_device, pot) = MockPotentiometer::new();

        let runtime = CrossingRuntime::builder()
            .with_config(config)
            .with_lights(AnyLightBank::Mock(lights_device))
            .with_gate(AnyGateActuator::Mock(gate_device))
            .with_analog(AnyAnalogInput::Mock(pot_device))
            .with_peripherals(manager.start().unwrap())
            .build()
            .await
            .unwrap();

        Bench {
            ticks,
            panel,
            lights,
            gate,
            pot,
            runtime,
        }
    }

    fn started_peripherals() -> PeripheralHandle {
        let mut manager = PeripheralManager::new(PeripheralConfig::default());
        manager.register_tick_source(AnyTickSource::Mock(MockTicker::new().0));
        manager.register_control_panel(AnyControlPanel::Mock(MockPanel::new().0));
        manager.start().unwrap()
    }

    #[tokio::test]
    async fn test_build_without_lights_fails() {
        let result = CrossingRuntime::builder()
            .with_gate(AnyGateActuator::Mock(MockGate::new().0))
            .with_analog(AnyAnalogInput::Mock(MockPotentiometer::new().0))
            .with_peripherals(started_peripherals())
            .build()
            .await;

        assert!(matches!(result, Err(Error::MissingCollaborator(name)) if name == "light bank"));
    }

    #[tokio::test]
    async fn test_build_without_peripherals_fails() {
        let result = CrossingRuntime::builder()
            .with_lights(AnyLightBank::Mock(MockLights::new().0))
            .with_gate(AnyGateActuator::Mock(MockGate::new().0))
            .with_analog(AnyAnalogInput::Mock(MockPotentiometer::new().0))
            .build()
            .await;

        assert!(matches!(result, Err(Error::MissingCollaborator(_))));
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_config() {
        let config = CrossingConfig {
            tick_hz: 0,
            ..CrossingConfig::default()
        };
        let result = CrossingRuntime::builder()
            .with_config(config)
            .with_lights(AnyLightBank::Mock(MockLights::new().0))
            .with_gate(AnyGateActuator::Mock(MockGate::new().0))
            .with_analog(AnyAnalogInput::Mock(MockPotentiometer::new().0))
            .with_peripherals(started_peripherals())
            .build()
            .await;

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_startup_actuation_before_first_tick() {
        let bench = bench().await;
        let task = tokio::spawn(bench.runtime.run());

        bench.panel.press_button(3).await.unwrap();
        let summary = task.await.unwrap().unwrap();

        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.stop_reason, StopReason::Shutdown);
        assert_eq!(
            bench.gate.position(),
            Some(GatePosition::open(&CrossingConfig::default().gate))
        );
        assert_eq!(bench.lights.commands(), vec![(LightChannel::Green, true)]);
    }

    #[tokio::test]
    async fn test_panel_failure_does_not_stop_run() {
        let Bench {
            ticks,
            panel,
            runtime,
            ..
        } = bench().await;
        let mut status = runtime.subscribe();
        let task = tokio::spawn(runtime.run());

        drop(panel);
        ticks.tick_n(4).unwrap();
        status.wait_for(|s| s.total_ticks == 4).await.unwrap();

        drop(ticks);
        let summary = task.await.unwrap().unwrap();
        assert!(matches!(summary.stop_reason, StopReason::TickSourceFailed(_)));
        assert_eq!(summary.ticks, 4);
    }

    #[tokio::test]
    async fn test_fold_stops_at_shutdown_button() {
        let Bench {
            lights,
            gate,
            mut runtime,
            ..
        } = bench().await;

        let mut batch = vec![
            PeripheralEvent::Input(PanelInput::Button(3)),
            PeripheralEvent::Tick,
            PeripheralEvent::Tick,
        ];
        let stop = runtime.fold(&mut batch).await;

        assert_eq!(stop, Some(StopReason::Shutdown));
        assert_eq!(runtime.controller().total_ticks(), 0);
        assert!(runtime.controller().is_terminated());
        assert_eq!(lights.command_count(), 0);
        assert_eq!(gate.write_count(), 0);
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_tick_source_failure_stops_run() {
        let Bench { ticks, runtime, .. } = bench().await;
        let task = tokio::spawn(runtime.run());

        ticks.tick_n(5).unwrap();
        drop(ticks);

        let summary = task.await.unwrap().unwrap();
        assert!(matches!(summary.stop_reason, StopReason::TickSourceFailed(_)));
        assert_eq!(summary.ticks, 5);
    }

    #[tokio::test]
    async fn test_failed_writes_are_skipped() {
        let bench = bench().await;
        bench.lights.set_fail_writes(true);
        let task = tokio::spawn(bench.runtime.run());

        bench.ticks.tick_n(2).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        bench.panel.press_button(3).await.unwrap();

        let summary = task.await.unwrap().unwrap();
        // GREEN on at start-up and on each of the two ticks.
        assert_eq!(summary.failed_writes, 3);
        assert_eq!(bench.lights.command_count(), 0);
        assert_eq!(bench.gate.write_count(), 3);
    }

    #[tokio::test]
    async fn test_status_published() {
        let bench = bench().await;
        let mut status = bench.runtime.subscribe();
        let task = tokio::spawn(bench.runtime.run());

        bench.panel.toggle_switch(1).await.unwrap();
        status
            .wait_for(|s| s.state == CrossingState::Maintenance)
            .await
            .unwrap();

        bench.panel.press_button(3).await.unwrap();
        let summary = task.await.unwrap().unwrap();
        assert_eq!(summary.final_state, CrossingState::Maintenance);
        assert_eq!(summary.transitions, 1);
        assert_eq!(summary.inputs, 2);
        assert_eq!(bench.pot.read_count(), 0);
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::Shutdown.to_string(), "shutdown requested");
        assert_eq!(
            StopReason::TickSourceFailed("gone".to_string()).to_string(),
            "tick source failed: gone"
        );
    }
}
