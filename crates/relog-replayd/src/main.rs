//! relog playback daemon
//!
//! Serves the relog control protocol over stdin/stdout, replaying loaded
//! logs against the configured sink in real time. A front end owns this
//! process through a pipe pair; `QUIT` (or closing stdin) shuts it down.
//!
//! All diagnostics go to stderr; stdout carries protocol responses only.

use std::io;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use relog_core::control::ControlChannel;
use relog_core::demo;
use relog_core::replay::{ReplayConfig, ReplaySession};

/// Headless playback daemon speaking the relog control protocol
#[derive(Parser, Debug)]
#[command(name = "relog-replayd", version, about)]
struct Args {
    /// Frame period in milliseconds
    #[arg(long, default_value_t = 20)]
    period_ms: u64,

    /// Discard samples beyond this many seconds
    #[arg(long, default_value_t = 1000.0)]
    max_timestamp: f64,

    /// Load a generated demo log at startup instead of waiting for
    /// LOAD_CSV
    #[arg(long)]
    demo: bool,

    /// Seed for the demo log generator
    #[arg(long, default_value_t = 0)]
    demo_seed: u64,

    /// Demo log duration in seconds
    #[arg(long, default_value_t = 30)]
    demo_duration: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = ReplayConfig {
        period: Duration::from_millis(args.period_ms),
        max_timestamp: args.max_timestamp,
    };
    tracing::info!(
        period_ms = args.period_ms,
        max_timestamp = args.max_timestamp,
        version = relog_core::VERSION,
        "replay daemon starting"
    );

    let mut session = ReplaySession::new(config);
    if args.demo {
        let bytes = demo::generate(args.demo_seed, Duration::from_secs(args.demo_duration));
        let summary = session
            .load_log_bytes(bytes)
            .context("failed to load demo log")?;
        tracing::info!(
            samples = summary.samples,
            frames = summary.frames,
            "demo log loaded"
        );
    }

    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    ControlChannel::new(stdin, stdout)
        .serve(&mut session)
        .context("control channel failed")?;

    tracing::info!("replay daemon exiting");
    Ok(())
}
