//! Bench console for the railcross level-crossing controller.
//!
//! Runs the controller against simulated devices on a wall-clock time base
//! and reads operator commands from stdin.
//!
//! # Usage
//!
//! ```bash
//! # Default configuration, 10 Hz
//! railcross
//!
//! # Load a TOML config and run the phase scripts five times faster
//! railcross --config crossing.toml --tick-hz 50
//!
//! # Show every actuation
//! railcross --log-level trace
//! ```
//!
//! # Console commands
//!
//! | Command | Effect |
//! |---|---|
//! | `b<N>`, `button <N>` | press push button N |
//! | `s<N>`, `switch <N>` | flip toggle switch N |
//! | `pot <0..1>` | set the maintenance potentiometer |
//! | `fail-pot`, `fix-pot` | make potentiometer reads fail / succeed |
//! | `status` | print the controller status |
//! | `quit` | press the shutdown button |

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use railcross_controller::{ControllerStatus, CrossingRuntime, RunSummary};
use railcross_core::constants::SHUTDOWN_BUTTON;
use railcross_core::CrossingConfig;
use railcross_hardware::devices::{
    AnyAnalogInput, AnyControlPanel, AnyGateActuator, AnyLightBank, AnyTickSource,
};
use railcross_hardware::mock::{
    MockGate, MockLights, MockPanel, MockPanelHandle, MockPotentiometer, MockPotentiometerHandle,
};
use railcross_hardware::{IntervalTicker, PeripheralConfig, PeripheralManager};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Level-crossing controller bench
///
/// Drives the crossing state machine with simulated lights, gate, and
/// potentiometer.
#[derive(Parser, Debug)]
#[command(name = "railcross")]
#[command(version)]
#[command(about = "Level-crossing controller running on a simulated bench")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the tick rate in Hz
    #[arg(long)]
    tick_hz: Option<u32>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Operator command read from the console.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Button(u8),
    Switch(u8),
    Pot(f32),
    FailPot(bool),
    Status,
    Quit,
}

/// Parse one console line. Blank lines yield `None`.
fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let head = head.to_ascii_lowercase();
    let arg = words.next();
    if words.next().is_some() {
        bail!("too many arguments: {}", line.trim());
    }

    let command = match (head.as_str(), arg) {
        ("button" | "b", Some(id)) => Command::Button(parse_id(id)?),
        ("switch" | "s", Some(id)) => Command::Switch(parse_id(id)?),
        ("pot", Some(value)) => Command::Pot(parse_reading(value)?),
        ("fail-pot", None) => Command::FailPot(true),
        ("fix-pot", None) => Command::FailPot(false),
        ("status", None) => Command::Status,
        ("quit" | "q" | "exit", None) => Command::Quit,
        (word, None) if word.len() > 1 && word.starts_with('b') => {
            Command::Button(parse_id(&word[1..])?)
        }
        (word, None) if word.len() > 1 && word.starts_with('s') => {
            Command::Switch(parse_id(&word[1..])?)
        }
        _ => bail!("unknown command: {}", line.trim()),
    };
    Ok(Some(command))
}

fn parse_id(text: &str) -> Result<u8> {
    text.parse()
        .with_context(|| format!("invalid id: {}", text))
}

fn parse_reading(text: &str) -> Result<f32> {
    let value: f32 = text
        .parse()
        .with_context(|| format!("invalid reading: {}", text))?;
    if !(0.0..=1.0).contains(&value) {
        bail!("reading must be between 0 and 1, got {}", value);
    }
    Ok(value)
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(args: &Args) -> Result<CrossingConfig> {
    let mut config = match &args.config {
        Some(path) => CrossingConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => CrossingConfig::default(),
    };
    if let Some(hz) = args.tick_hz {
        config.tick_hz = hz;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Handles the console keeps to act on the simulated bench.
struct Console {
    panel: MockPanelHandle,
    pot: MockPotentiometerHandle,
    status: watch::Receiver<ControllerStatus>,
}

impl Console {
    async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::Button(id) => self.panel.press_button(id).await?,
            Command::Switch(id) => self.panel.toggle_switch(id).await?,
            Command::Pot(value) => self.pot.set_value(value),
            Command::FailPot(fail) => self.pot.fail_next_reads(fail),
            Command::Status => println!("{}", *self.status.borrow()),
            Command::Quit => self.panel.press_button(SHUTDOWN_BUTTON).await?,
        }
        Ok(())
    }

    /// Press the shutdown button. Returns `false` if the runtime had already
    /// stopped and released the panel.
    async fn request_shutdown(&self) -> bool {
        match self.execute(Command::Quit).await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Shutdown button not delivered");
                false
            }
        }
    }
}

async fn run(config: CrossingConfig) -> Result<RunSummary> {
    let mut manager = PeripheralManager::new(PeripheralConfig::from(&config));
    let (panel, panel_handle) = MockPanel::new();
    manager.register_tick_source(AnyTickSource::Interval(IntervalTicker::new(
        config.tick_period(),
    )?));
    manager.register_control_panel(AnyControlPanel::Mock(panel));

    let (pot, pot_handle) = MockPotentiometer::new();
    let runtime = CrossingRuntime::builder()
        .with_config(config)
        .with_lights(AnyLightBank::Mock(MockLights::new().0))
        .with_gate(AnyGateActuator::Mock(MockGate::new().0))
        .with_analog(AnyAnalogInput::Mock(pot))
        .with_peripherals(manager.start()?)
        .build()
        .await
        .context("failed to build crossing runtime")?;

    let console = Console {
        panel: panel_handle,
        pot: pot_handle,
        status: runtime.subscribe(),
    };
    let mut task = tokio::spawn(runtime.run());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            result = &mut task => {
                return Ok(result.context("runtime task failed")??);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                // A stopped runtime reports through the task branch.
                console.request_shutdown().await;
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("failed to read stdin")? {
                    Some(line) => match parse_command(&line) {
                        Ok(Some(command)) => {
                            if let Err(e) = console.execute(command).await {
                                warn!("{:#}", e);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => warn!("{:#}", e),
                    },
                    None => stdin_open = false,
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = load_config(&args)?;
    info!(
        version = railcross_core::VERSION,
        tick_hz = config.tick_hz,
        queue = config.event_queue_capacity,
        "Starting railcross bench"
    );

    let summary = run(config).await?;
    println!("{}", summary);
    for transition in &summary.recent_transitions {
        println!("  {}", transition);
    }
    Ok(())
}
