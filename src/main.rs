//! ==============================================================================
//! main.rs - aura monitor entry point (console dashboard)
//! ==============================================================================
//!
//! purpose:
//!     terminal view over the AURA simulation backend. the actual simulation,
//!     learner, and sensor state machine live in the backend service; this
//!     binary only mirrors and steers them through the Monitor controller.
//!
//! responsibilities:
//!     - load configuration (config/monitor.toml)
//!     - install the tracing subscriber at the configured level
//!     - connect the Monitor (initial status fetch, poll loop management)
//!     - run the command loop: start / pause / reset / status / sensors /
//!       chart / watch / quit
//!     - render metric cards, the sensor grid, and chart history as text
//!
//! relationships:
//!     - uses: monitor.rs (controller), config.rs, domain.rs
//!
//! ==============================================================================

use anyhow::Result;
use aura_monitor::config::MonitorConfig;
use aura_monitor::domain::{LearnerStatus, Phase, StartParams, Status};
use aura_monitor::monitor::Monitor;
use std::io::Write as _;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[tokio::main]
async fn main() -> Result<()> {
    // startup banner
    println!("===========================================================");
    println!("  AURA Intelligent Sensor Network - Console Monitor");
    println!("  Live System with Autonomous Retraining");
    println!("===========================================================");

    // step 1: load configuration
    let config = MonitorConfig::load_or_default();
    config.print_summary();

    // step 2: install the tracing subscriber
    let level = config.logging.level.parse().unwrap_or_else(|_| {
        println!(
            "[CONFIG] Warning: unknown log level '{}' - using info",
            config.logging.level
        );
        tracing::Level::INFO
    });
    tracing_subscriber::fmt().with_max_level(level).init();

    // step 3: connect the monitor (performs the initial status fetch)
    println!("\n[STARTUP] Connecting to simulation server at {} ...", config.backend.base_url);
    let monitor = Monitor::connect(&config).await;
    match monitor.snapshot() {
        Some(_) => println!("[STARTUP] ✓ Connected"),
        None => println!("[STARTUP] ⚠ No response yet - any command will retry"),
    }

    print_help();

    // step 4: command loop
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("start") => {
                let params = match parse_start_params(parts) {
                    Ok(p) => p,
                    Err(e) => {
                        println!("[ERR] {e}");
                        continue;
                    }
                };
                // fresh run, fresh charts
                monitor.clear_history();
                monitor.start(&params).await;
                print_status_line(&monitor);
            }
            Some("pause") => {
                monitor.pause().await;
                print_status_line(&monitor);
            }
            Some("reset") => {
                monitor.reset().await;
                monitor.clear_history();
                print_status_line(&monitor);
            }
            Some("status") => {
                monitor.refresh().await;
                render_status(&monitor);
            }
            Some("sensors") => render_sensors(&monitor),
            Some("chart") => render_chart(&monitor, 20),
            Some("watch") => watch(&monitor, &mut lines).await?,
            Some("help") => print_help(),
            Some("quit") | Some("exit") => break,
            Some(other) => println!("[ERR] unknown command '{}' - try 'help'", other),
            None => {}
        }
    }

    println!("[SHUTDOWN] Monitor stopped");
    Ok(())
}

fn prompt() {
    print!("aura> ");
    let _ = std::io::stdout().flush();
}

fn print_help() {
    println!("\nCommands:");
    println!("  start [key=value ...]  begin a run; keys: threshold, duration,");
    println!("                         n_way_comparison, shadow_mode_probability,");
    println!("                         hybrid_fidelity_threshold,");
    println!("                         hybrid_max_timesteps_since_retrain, collection_period");
    println!("  pause                  pause the running simulation");
    println!("  reset                  reset the simulation and clear charts");
    println!("  status                 refresh and show the metric cards");
    println!("  sensors                show the sensor grid");
    println!("  chart                  show recent chart history");
    println!("  watch                  live status line until Enter");
    println!("  quit                   exit");
}

/// Parse `key=value` overrides on top of the default tuning parameters.
fn parse_start_params<'a>(args: impl Iterator<Item = &'a str>) -> Result<StartParams> {
    let mut params = StartParams::default();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected key=value, got '{arg}'"))?;
        match key {
            "threshold" => params.threshold = value.parse()?,
            "duration" => params.duration = value.parse()?,
            "n_way_comparison" => params.n_way_comparison = value.parse()?,
            "shadow_mode_probability" => params.shadow_mode_probability = value.parse()?,
            "hybrid_fidelity_threshold" => params.hybrid_fidelity_threshold = value.parse()?,
            "hybrid_max_timesteps_since_retrain" => {
                params.hybrid_max_timesteps_since_retrain = value.parse()?
            }
            "collection_period" => params.collection_period = value.parse()?,
            other => anyhow::bail!("unknown parameter '{other}'"),
        }
    }
    Ok(params)
}

/// Phase label as shown on the dashboard card.
fn phase_label(status: &Status) -> &'static str {
    if !status.is_running {
        return "IDLE";
    }
    match status.current_phase {
        Phase::Idle => "IDLE",
        Phase::Collecting => "COLLECTING",
        Phase::ShadowOp => "SHADOW POWERSAVING",
        Phase::Finished => "FINISHED",
    }
}

fn print_status_line(monitor: &Monitor) {
    match monitor.snapshot() {
        Some(s) => println!(
            "[OK] t={} phase={} running={} polling={}",
            s.timestep,
            phase_label(&s),
            s.is_running,
            monitor.is_polling()
        ),
        None => println!("[WARN] no status from the backend yet"),
    }
}

/// The six metric cards of the dashboard, as a text block.
fn render_status(monitor: &Monitor) {
    let Some(status) = monitor.snapshot() else {
        println!("[STATUS] Connecting to simulation server...");
        return;
    };
    let learner = match status.learner_status {
        LearnerStatus::Running => "RUNNING",
        LearnerStatus::Idle => "IDLE",
    };
    println!("  TIMESTEP        {}", status.timestep);
    println!("  CURRENT PHASE   {}", phase_label(&status));
    println!("  ACTIVE SENSORS  {} / {}", status.active_sensors, status.total_sensors);
    println!("  POWER SAVED     {:.2} %", status.power_saved_percent);
    println!("  LEARNER STATUS  {}", learner);
    println!("  FIDELITY        {:.2} %", status.fidelity * 100.0);
}

/// Sensor on/off grid, the text stand-in for the 3D farm scene.
fn render_sensors(monitor: &Monitor) {
    let Some(status) = monitor.snapshot() else {
        println!("[STATUS] Connecting to simulation server...");
        return;
    };
    if status.sensors.is_empty() {
        println!("  no sensors reported");
        return;
    }
    for chunk in status.sensors.chunks(10) {
        let row: Vec<&str> = chunk
            .iter()
            .map(|s| if s.is_off { "·" } else { "●" })
            .collect();
        println!("  {}", row.join(" "));
    }
    println!("  ● awake   · powered down");
}

/// Tail of the chart history as a fidelity / power-saved table.
fn render_chart(monitor: &Monitor, last: usize) {
    let points = monitor.history();
    if points.is_empty() {
        println!("  no chart data yet - start a run first");
        return;
    }
    println!("  {:>8}  {:>9}  {:>11}", "timestep", "fidelity", "power saved");
    let skip = points.len().saturating_sub(last);
    for point in &points[skip..] {
        println!(
            "  {:>8}  {:>8.2}%  {:>10.2}%",
            point.timestep,
            point.fidelity * 100.0,
            point.power_saved * 100.0
        );
    }
    println!("  ({} of {} points shown)", points.len() - skip, points.len());
}

/// Re-render a one-line status at a fixed cadence until Enter is pressed.
async fn watch(monitor: &Monitor, lines: &mut Lines<BufReader<Stdin>>) -> Result<()> {
    println!("[WATCH] press Enter to stop");
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            line = lines.next_line() => {
                line?;
                break;
            }
            _ = ticker.tick() => {
                match monitor.snapshot() {
                    Some(s) => println!(
                        "[T{:>6}] {:<18} sensors {:>3}/{:<3} power {:>6.2}%  fidelity {:>6.2}%",
                        s.timestep,
                        phase_label(&s),
                        s.active_sensors,
                        s.total_sensors,
                        s.power_saved_percent,
                        s.fidelity * 100.0
                    ),
                    None => println!("[WATCH] Connecting to simulation server..."),
                }
            }
        }
    }
    Ok(())
}
