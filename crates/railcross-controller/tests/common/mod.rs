//! Shared test bench for the crossing runtime integration tests.
//!
//! The bench wires a [`CrossingRuntime`] to mock devices and keeps every
//! handle, so a test can drive inputs and inspect outputs. Tests run with a
//! paused clock: [`Bench::settle`] sleeps on virtual time, which only moves
//! once every task is idle, so all queued events have been folded when it
//! returns.

#![allow(dead_code)]

use std::time::Duration;

use railcross_controller::{ControllerStatus, CrossingRuntime, RunSummary};
use railcross_core::{CrossingConfig, CrossingState};
use railcross_hardware::devices::{
    AnyAnalogInput, AnyControlPanel, AnyGateActuator, AnyLightBank, AnyTickSource,
};
use railcross_hardware::mock::{
    MockGate, MockGateHandle, MockLights, MockLightsHandle, MockPanel, MockPanelHandle,
    MockPotentiometer, MockPotentiometerHandle, MockTicker, MockTickerHandle,
};
use railcross_hardware::{PeripheralConfig, PeripheralManager};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Ticks per second of the crossing time base.
pub const TICKS_PER_SEC: u32 = 10;

pub struct Bench {
    pub ticks: MockTickerHandle,
    pub panel: MockPanelHandle,
    pub lights: MockLightsHandle,
    pub gate: MockGateHandle,
    pub pot: MockPotentiometerHandle,
    pub status: watch::Receiver<ControllerStatus>,
    pub config: CrossingConfig,
    task: JoinHandle<railcross_core::Result<RunSummary>>,
}

impl Bench {
    /// Start a runtime with the default configuration.
    pub async fn start() -> Self {
        Self::with_config(CrossingConfig::default()).await
    }

    pub async fn with_config(config: CrossingConfig) -> Self {
        let mut manager = PeripheralManager::new(PeripheralConfig::from(&config));
        let (ticker, ticks) = MockTicker::new();
        let (panel_device, panel) = MockPanel::new();
        manager.register_tick_source(AnyTickSource::Mock(ticker));
        manager.register_control_panel(AnyControlPanel::Mock(panel_device));

        let (lights_device, lights) = MockLights::new();
        let (gate_device, gate) = MockGate::new();
        let (pot_device, pot) = MockPotentiometer::new();

        let runtime = CrossingRuntime::builder()
            .with_config(config.clone())
            .with_lights(AnyLightBank::Mock(lights_device))
            .with_gate(AnyGateActuator::Mock(gate_device))
            .with_analog(AnyAnalogInput::Mock(pot_device))
            .with_peripherals(manager.start().unwrap())
            .build()
            .await
            .unwrap();

        let status = runtime.subscribe();
        let task = tokio::spawn(runtime.run());

        let bench = Self {
            ticks,
            panel,
            lights,
            gate,
            pot,
            status,
            config,
            task,
        };
        bench.settle().await;
        bench
    }

    /// Let every task run until idle.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    /// Deliver `count` ticks and wait until all of them are folded.
    pub async fn advance(&self, count: u32) {
        self.ticks.tick_n(count).unwrap();
        self.settle().await;
    }

    /// Deliver `secs` seconds of ticks.
    pub async fn advance_secs(&self, secs: u32) {
        self.advance(secs * TICKS_PER_SEC).await;
    }

    pub async fn toggle(&self, switch: u8) {
        self.panel.toggle_switch(switch).await.unwrap();
        self.settle().await;
    }

    pub async fn press(&self, button: u8) {
        self.panel.press_button(button).await.unwrap();
        self.settle().await;
    }

    pub fn current(&self) -> ControllerStatus {
        *self.status.borrow()
    }

    pub fn state(&self) -> CrossingState {
        self.current().state
    }

    /// Press the shutdown button and collect the run summary.
    pub async fn shutdown(self) -> RunSummary {
        self.panel.press_button(3).await.unwrap();
        self.task.await.unwrap().unwrap()
    }

    /// Disconnect the time base and collect the run summary.
    pub async fn stop_time_base(self) -> RunSummary {
        let Self { ticks, task, .. } = self;
        drop(ticks);
        task.await.unwrap().unwrap()
    }
}
