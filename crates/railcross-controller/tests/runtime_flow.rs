//! End-to-end tests for the crossing runtime.
//!
//! Each test drives a runtime wired to mock devices through the scenarios an
//! operator would walk through on the bench:
//! 1. Start-up in Traffic
//! 2. Train arrival and departure
//! 3. Maintenance override with the potentiometer
//! 4. Pedestrian requests, with and without enough traffic flow
//! 5. Shutdown and device faults

mod common;

use std::time::Duration;

use common::Bench;
use railcross_controller::{CrossingRuntime, StopReason};
use railcross_core::{CrossingConfig, CrossingState, GatePosition, LightChannel};
use railcross_hardware::devices::{
    AnyAnalogInput, AnyControlPanel, AnyGateActuator, AnyLightBank, AnyTickSource,
};
use railcross_hardware::mock::{MockGate, MockLights, MockPanel, MockPotentiometer};
use railcross_hardware::{IntervalTicker, PeripheralConfig, PeripheralManager};

fn open(bench: &Bench) -> GatePosition {
    GatePosition::open(&bench.config.gate)
}

fn closed(bench: &Bench) -> GatePosition {
    GatePosition::closed(&bench.config.gate)
}

// ============================================================================
// Start-up
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_startup_opens_gate_and_shows_green() {
    let bench = Bench::start().await;

    assert_eq!(bench.state(), CrossingState::Traffic);
    assert_eq!(bench.gate.position(), Some(open(&bench)));
    assert_eq!(bench.lights.commands(), vec![(LightChannel::Green, true)]);
    assert_eq!(bench.current().total_ticks, 0);

    let summary = bench.shutdown().await;
    assert_eq!(summary.stop_reason, StopReason::Shutdown);
    assert_eq!(summary.transitions, 0);
}

#[tokio::test(start_paused = true)]
async fn test_traffic_accumulates_flow() {
    let bench = Bench::start().await;

    bench.advance_secs(4).await;
    let status = bench.current();
    assert_eq!(status.seconds_in_state, 4);
    assert_eq!(status.traffic_flow_secs, 4);

    bench.shutdown().await;
}

// ============================================================================
// Train
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_train_arrival_and_departure() {
    let bench = Bench::start().await;

    bench.toggle(0).await;
    assert_eq!(bench.state(), CrossingState::Train);
    bench.lights.clear_commands();

    // Warning phase: amber only, gate untouched.
    bench.advance(1).await;
    assert_eq!(bench.lights.commands(), vec![(LightChannel::Yellow, true)]);
    assert_eq!(bench.gate.position(), Some(open(&bench)));

    // Three seconds in: red, gate down, crossing lamps on.
    bench.advance(29).await;
    let head = bench.lights.signal_head();
    assert_eq!(head.indicator(), Some(LightChannel::Red));
    assert!(head.lamps_on());
    assert_eq!(bench.gate.position(), Some(closed(&bench)));
    assert!(bench.current().red_light_asserted);

    // The 3 s step repeats for the rest of that second, always closing.
    let writes = bench.gate.write_count();
    bench.advance(9).await;
    assert_eq!(bench.gate.write_count(), writes + 9);
    assert!(bench.gate.positions()[writes..].iter().all(|p| *p == closed(&bench)));

    // Nothing else happens while the train is in the crossing.
    let writes = bench.gate.write_count();
    bench.advance_secs(5).await;
    assert_eq!(bench.gate.write_count(), writes);

    // Train gone: the gate lifts first, lights follow.
    bench.toggle(0).await;
    assert_eq!(bench.state(), CrossingState::Transition);
    bench.advance(1).await;
    assert_eq!(bench.gate.position(), Some(open(&bench)));
    assert!(bench.lights.signal_head().lamps_on());

    bench.advance(99).await;
    let head = bench.lights.signal_head();
    assert_eq!(head.indicator(), Some(LightChannel::Yellow));
    assert!(!head.lamps_on());
    assert!(!bench.current().red_light_asserted);

    bench.advance(30).await;
    assert_eq!(bench.state(), CrossingState::Traffic);
    assert_eq!(bench.lights.signal_head().indicator(), Some(LightChannel::Green));

    let summary = bench.shutdown().await;
    assert_eq!(summary.transitions, 3);
    assert_eq!(summary.final_state, CrossingState::Traffic);
    let path: Vec<_> = summary
        .recent_transitions
        .iter()
        .map(|t| (t.from, t.to))
        .collect();
    assert_eq!(
        path,
        vec![
            (CrossingState::Traffic, CrossingState::Train),
            (CrossingState::Train, CrossingState::Transition),
            (CrossingState::Transition, CrossingState::Traffic),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_train_returning_during_transition_skips_amber() {
    let bench = Bench::start().await;

    bench.toggle(0).await;
    bench.advance_secs(3).await;
    bench.toggle(0).await;
    bench.advance_secs(2).await;
    assert_eq!(bench.state(), CrossingState::Transition);
    assert_eq!(bench.gate.position(), Some(open(&bench)));

    // Red is still up, so the second train gets the barrier on its first tick.
    bench.toggle(0).await;
    assert_eq!(bench.state(), CrossingState::Train);
    bench.advance(1).await;
    assert_eq!(bench.current().seconds_in_state, 3);
    assert_eq!(bench.gate.position(), Some(closed(&bench)));
    assert_eq!(bench.lights.signal_head().indicator(), Some(LightChannel::Red));

    bench.shutdown().await;
}

// ============================================================================
// Maintenance
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_maintenance_gate_follows_potentiometer() {
    let bench = Bench::start().await;
    bench.pot.set_value(0.5);

    bench.toggle(1).await;
    assert_eq!(bench.state(), CrossingState::Maintenance);

    bench.advance_secs(3).await;
    let head = bench.lights.signal_head();
    assert_eq!(head.indicator(), Some(LightChannel::Red));
    assert!(head.lamps_on());
    assert_eq!(bench.gate.position(), Some(open(&bench)));
    assert_eq!(bench.pot.read_count(), 0);

    // Override starts at six seconds: blue blinks, gate tracks the knob.
    bench.advance_secs(3).await;
    assert_eq!(bench.lights.last_command(), Some((LightChannel::Blue, false)));
    assert_eq!(
        bench.gate.position(),
        GatePosition::from_normalized(0.5, &bench.config.gate)
    );
    assert_eq!(bench.pot.read_count(), 1);

    bench.advance(1).await;
    assert_eq!(bench.lights.signal_head().indicator(), Some(LightChannel::Blue));

    bench.advance(1).await;
    assert_eq!(bench.lights.last_command(), Some((LightChannel::Blue, false)));

    bench.pot.set_value(1.0);
    bench.advance(1).await;
    assert_eq!(bench.gate.position(), Some(closed(&bench)));

    bench.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_maintenance_holds_gate_on_bad_readings() {
    let bench = Bench::start().await;
    bench.pot.set_value(0.25);

    bench.toggle(1).await;
    bench.advance_secs(6).await;
    let held = bench.gate.position();
    let writes = bench.gate.write_count();

    bench.pot.fail_next_reads(true);
    bench.advance(5).await;
    assert_eq!(bench.gate.write_count(), writes);
    assert_eq!(bench.gate.position(), held);
    assert_eq!(bench.pot.read_count(), 6);

    bench.pot.fail_next_reads(false);
    bench.pot.set_value(f32::NAN);
    bench.advance(2).await;
    assert_eq!(bench.gate.write_count(), writes);

    // Out-of-range readings are clamped to the calibrated travel.
    bench.pot.set_value(3.0);
    bench.advance(1).await;
    assert_eq!(bench.gate.position(), Some(closed(&bench)));

    bench.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_train_switch_ignored_during_maintenance() {
    let bench = Bench::start().await;

    bench.toggle(1).await;
    bench.toggle(0).await;
    assert_eq!(bench.state(), CrossingState::Maintenance);

    bench.toggle(1).await;
    assert_eq!(bench.state(), CrossingState::Transition);
    bench.advance(1).await;
    assert_eq!(bench.gate.position(), Some(open(&bench)));

    let summary = bench.shutdown().await;
    assert_eq!(summary.transitions, 2);
}

// ============================================================================
// Pedestrians
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_pedestrian_crossing_after_enough_traffic() {
    let bench = Bench::start().await;

    bench.advance_secs(11).await;
    bench.press(0).await;
    assert_eq!(bench.state(), CrossingState::Pedestrian);
    assert_eq!(bench.current().traffic_flow_snapshot, 11);
    bench.lights.clear_commands();
    let gate_writes = bench.gate.write_count();

    bench.advance(1).await;
    assert_eq!(bench.lights.commands(), vec![(LightChannel::Yellow, true)]);

    bench.advance(29).await;
    let head = bench.lights.signal_head();
    assert_eq!(head.indicator(), Some(LightChannel::Red));
    assert!(head.lamps_on());

    bench.advance(100).await;
    let head = bench.lights.signal_head();
    assert_eq!(head.indicator(), Some(LightChannel::Yellow));
    assert!(!head.lamps_on());

    bench.advance(30).await;
    assert_eq!(bench.state(), CrossingState::Traffic);
    assert_eq!(bench.lights.signal_head().indicator(), Some(LightChannel::Green));

    // The barrier never moves for pedestrians.
    assert_eq!(bench.gate.write_count(), gate_writes);

    bench.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_pedestrian_request_too_soon_keeps_lights() {
    let bench = Bench::start().await;

    bench.advance_secs(10).await;
    bench.press(1).await;
    assert_eq!(bench.state(), CrossingState::Pedestrian);
    bench.lights.clear_commands();

    bench.advance_secs(16).await;
    assert_eq!(bench.state(), CrossingState::Traffic);
    assert!(bench.lights.commands().is_empty());

    bench.advance(1).await;
    assert_eq!(bench.lights.commands(), vec![(LightChannel::Green, true)]);
    assert_eq!(bench.current().traffic_flow_secs, 0);

    bench.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_pedestrian_button_ignored_during_train() {
    let bench = Bench::start().await;

    bench.toggle(0).await;
    bench.press(0).await;
    bench.press(1).await;
    assert_eq!(bench.state(), CrossingState::Train);

    let summary = bench.shutdown().await;
    assert_eq!(summary.transitions, 1);
    assert_eq!(summary.inputs, 4);
}

// ============================================================================
// Shutdown and faults
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_leaves_outputs_as_they_are() {
    let bench = Bench::start().await;

    bench.toggle(0).await;
    bench.advance_secs(4).await;
    let gate_writes = bench.gate.write_count();
    let light_writes = bench.lights.command_count();
    let gate = bench.gate.clone();
    let lights = bench.lights.clone();

    let summary = bench.shutdown().await;
    assert_eq!(summary.stop_reason, StopReason::Shutdown);
    assert_eq!(summary.final_state, CrossingState::Train);
    assert_eq!(summary.ticks, 40);
    assert_eq!(gate.write_count(), gate_writes);
    assert_eq!(lights.command_count(), light_writes);
    assert!(gate.position().is_some_and(|p| p.duty_cycle() > 10.0));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_inputs_ignored() {
    let bench = Bench::start().await;

    bench.press(2).await;
    bench.toggle(7).await;
    assert_eq!(bench.state(), CrossingState::Traffic);

    let summary = bench.shutdown().await;
    assert_eq!(summary.transitions, 0);
    assert_eq!(summary.inputs, 3);
}

#[tokio::test(start_paused = true)]
async fn test_light_failures_do_not_block_gate() {
    let bench = Bench::start().await;
    bench.lights.set_fail_writes(true);

    bench.toggle(0).await;
    bench.advance_secs(3).await;
    assert_eq!(bench.gate.position(), Some(closed(&bench)));

    let summary = bench.shutdown().await;
    // Nine amber ticks, then red and the lamp bank on the first tick at 3 s.
    assert_eq!(summary.failed_writes, 11);
}

#[tokio::test(start_paused = true)]
async fn test_tick_source_loss_stops_runtime() {
    let bench = Bench::start().await;

    bench.advance(7).await;
    let summary = bench.stop_time_base().await;

    assert!(matches!(summary.stop_reason, StopReason::TickSourceFailed(_)));
    assert_eq!(summary.ticks, 7);
}

#[tokio::test(start_paused = true)]
async fn test_small_queue_delivers_every_tick() {
    let config = CrossingConfig {
        event_queue_capacity: 2,
        ..CrossingConfig::default()
    };
    let bench = Bench::with_config(config).await;

    bench.advance_secs(3).await;
    assert_eq!(bench.current().total_ticks, 30);
    assert_eq!(bench.current().seconds_in_state, 3);

    bench.shutdown().await;
}

// ============================================================================
// Wall-clock time base
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_interval_ticker_keeps_crossing_time() {
    let config = CrossingConfig::default();
    let mut manager = PeripheralManager::new(PeripheralConfig::from(&config));
    let (panel, panel_handle) = MockPanel::new();
    manager.register_tick_source(AnyTickSource::Interval(
        IntervalTicker::from_hz(config.tick_hz).unwrap(),
    ));
    manager.register_control_panel(AnyControlPanel::Mock(panel));

    let runtime = CrossingRuntime::builder()
        .with_config(config)
        .with_lights(AnyLightBank::Mock(MockLights::new().0))
        .with_gate(AnyGateActuator::Mock(MockGate::new().0))
        .with_analog(AnyAnalogInput::Mock(MockPotentiometer::new().0))
        .with_peripherals(manager.start().unwrap())
        .build()
        .await
        .unwrap();
    let status = runtime.subscribe();
    let task = tokio::spawn(runtime.run());

    // First tick fires at once, then every 100 ms.
    tokio::time::sleep(Duration::from_millis(5_050)).await;
    let current = *status.borrow();
    assert_eq!(current.total_ticks, 51);
    assert_eq!(current.seconds_in_state, 5);

    panel_handle.press_button(3).await.unwrap();
    let summary = task.await.unwrap().unwrap();
    assert_eq!(summary.stop_reason, StopReason::Shutdown);
}
