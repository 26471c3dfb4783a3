//! Liveterm demo CLI
//!
//! Drives the live widgets against the real terminal: a telemetry chart, an
//! animated progress bar and a spinner.

mod telemetry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use liveterm_core::{AnimationConfig, Animator, LiveChart, ProgressBar, Spinner, TransitionKind};
use std::time::Duration;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::telemetry::FloorTelemetry;

/// Liveterm - live terminal rendering demos
#[derive(Parser, Debug)]
#[command(name = "liveterm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live terminal rendering demos", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// JSON file overriding animation timing
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Live building telemetry chart
    Chart {
        /// Data refresh interval in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,

        /// Seconds to run before exiting (Ctrl-C stops early)
        #[arg(long, default_value_t = 10)]
        duration_secs: u64,

        /// Transition between refreshes (none, fade, smooth, slide, wipe)
        #[arg(long, default_value = "smooth")]
        transition: TransitionKind,

        /// Number of floors to simulate
        #[arg(long, default_value_t = 6)]
        floors: usize,
    },

    /// Animated progress bar
    Progress {
        #[arg(long, default_value = "Importing floors")]
        label: String,

        /// Number of updates to reach 100%
        #[arg(long, default_value_t = 5)]
        steps: u32,

        /// Jump straight to each value
        #[arg(long, default_value_t = false)]
        no_animate: bool,
    },

    /// Spinner
    Spinner {
        #[arg(long, default_value = "Scanning equipment")]
        label: String,

        #[arg(long, default_value_t = 3)]
        duration_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level)?;

    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            AnimationConfig::from_json(&json)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => AnimationConfig::default(),
    };

    info!("Starting liveterm v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Chart {
            interval_ms,
            duration_secs,
            transition,
            floors,
        } => run_chart(&config, interval_ms, duration_secs, transition, floors).await,
        Command::Progress {
            label,
            steps,
            no_animate,
        } => run_progress(config, label, steps, no_animate).await,
        Command::Spinner {
            label,
            duration_secs,
        } => run_spinner(config, label, duration_secs).await,
    }
}

/// Setup tracing on stderr so logs never mix with rendered frames
fn setup_logging(level: &str) -> Result<()> {
    let log_level = level.parse::<Level>().unwrap_or(Level::WARN);

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

async fn run_chart(
    config: &AnimationConfig,
    interval_ms: u64,
    duration_secs: u64,
    transition: TransitionKind,
    floors: usize,
) -> Result<()> {
    let telemetry = FloorTelemetry::new(floors);
    let animator = Animator::new(config.chart_frame_rate)?;
    let width = usize::from(animator.viewport().width);

    let chart = LiveChart::with_animator(
        move || telemetry.render(width),
        Duration::from_millis(interval_ms),
        animator,
    )?
    .with_transition(transition);

    chart.start().context("Failed to start chart")?;
    wait_or_interrupt(Duration::from_secs(duration_secs)).await;
    chart.stop();

    if let Some(err) = chart.last_error() {
        info!("Last producer error: {}", err);
    }
    info!(
        "Chart finished: {} refreshes, {} skipped",
        chart.applied_ticks(),
        chart.skipped_ticks()
    );
    Ok(())
}

async fn run_progress(config: AnimationConfig, label: String, steps: u32, no_animate: bool) -> Result<()> {
    let steps = steps.max(1);
    let mut bar = ProgressBar::with_output(label, std::sync::Arc::new(liveterm_core::StdoutSink), config)?;
    bar.set_animated(!no_animate);
    bar.render()?;

    for step in 1..=steps {
        tokio::time::sleep(Duration::from_millis(300)).await;
        bar.update(f64::from(step) / f64::from(steps)).await?;
    }

    bar.finish()?;
    Ok(())
}

async fn run_spinner(config: AnimationConfig, label: String, duration_secs: u64) -> Result<()> {
    let spinner = Spinner::with_output(label, std::sync::Arc::new(liveterm_core::StdoutSink), config)?;
    spinner.start().context("Failed to start spinner")?;
    wait_or_interrupt(Duration::from_secs(duration_secs)).await;
    spinner.stop();
    Ok(())
}

/// Sleep for `duration` unless Ctrl-C arrives first
async fn wait_or_interrupt(duration: Duration) {
    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        result = signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            }
        }
    }
}
