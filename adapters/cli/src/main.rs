#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays a recorded drive headlessly.
//!
//! Samples come from a JSON or TOML file, or from a seeded synthetic drive.
//! Settings are layered as built-in defaults, then the optional settings
//! file, then command-line flags. The report goes to stdout and logs go to
//! stderr, filtered through `RUST_LOG`.

mod samples;
mod settings;
mod simulation;

use std::{io, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use drive_playback_core::PlaybackConfig;
use drive_playback_runtime::{FixedFrameSource, PacedFrameSource};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    samples::{load_samples, synthetic_drive},
    settings::Settings,
    simulation::{simulate, SimulationPlan},
};

const DEFAULT_SYNTHETIC_SAMPLES: usize = 12;
const DEFAULT_SEED: u64 = 0x5eed;

/// Replays driving tendency samples through the playback clock and lane geometry.
#[derive(Debug, Parser)]
#[command(name = "drive-playback", version)]
struct Args {
    /// JSON or TOML file holding the samples to replay.
    #[arg(long, conflicts_with = "synthetic")]
    samples: Option<PathBuf>,
    /// Generate this many synthetic samples instead of reading a file.
    #[arg(long)]
    synthetic: Option<usize>,
    /// Seed for the synthetic drive.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    /// TOML settings file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Milliseconds between published samples.
    #[arg(long)]
    tick_ms: Option<u64>,
    /// Restart from the first sample instead of ending the session.
    #[arg(long = "loop")]
    looping: bool,
    /// Wait for an externally started session instead of starting one.
    #[arg(long)]
    no_autostart: bool,
    /// Virtual time in milliseconds at which an external component starts the session.
    #[arg(long)]
    external_start_ms: Option<u64>,
    /// Frames per second delivered to the lane geometry.
    #[arg(long)]
    fps: Option<u32>,
    /// Upper bound on simulated time in seconds.
    #[arg(long)]
    duration_secs: Option<f64>,
    /// Number of lane markings in the pool.
    #[arg(long)]
    markings: Option<usize>,
    /// Pace frames against the wall clock instead of running as fast as possible.
    #[arg(long)]
    realtime: bool,
}

/// Entry point for the drive playback command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = Settings::load(args.config.as_deref())?;
    apply_overrides(&mut settings, &args);

    let samples = match &args.samples {
        Some(path) => load_samples(path)?,
        None => {
            let count = args.synthetic.unwrap_or(DEFAULT_SYNTHETIC_SAMPLES);
            info!(count, seed = args.seed, "generating synthetic drive");
            synthetic_drive(count, args.seed)
        }
    };
    if samples.is_empty() {
        warn!("sample sequence is empty; nothing will be published");
    }

    let config = PlaybackConfig::new(samples, settings.playback)
        .context("invalid playback settings")?;
    let plan = SimulationPlan {
        config,
        markings: settings.lanes.markings,
        external_start: args.external_start_ms.map(Duration::from_millis),
    };
    if plan.never_starts() {
        warn!("autostart is disabled and no external start is scheduled; playback will stay idle");
    }

    let duration = match settings.frames.duration_secs {
        Some(seconds) => Duration::try_from_secs_f64(seconds)
            .with_context(|| format!("invalid duration {seconds}s"))?,
        None => plan.natural_duration(),
    };
    info!(
        fps = settings.frames.fps,
        duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        realtime = args.realtime,
        "starting playback"
    );

    let report = if args.realtime {
        let mut frames = PacedFrameSource::new(settings.frames.fps, Some(duration))?;
        simulate(plan, &mut frames)?
    } else {
        let mut frames = FixedFrameSource::covering(settings.frames.fps, duration)?;
        simulate(plan, &mut frames)?
    };

    print!("{report}");
    Ok(())
}

fn apply_overrides(settings: &mut Settings, args: &Args) {
    if let Some(tick_ms) = args.tick_ms {
        settings.playback.tick_ms = tick_ms;
    }
    if args.looping {
        settings.playback.looping = true;
    }
    if args.no_autostart {
        settings.playback.autostart = false;
    }
    if let Some(fps) = args.fps {
        settings.frames.fps = fps;
    }
    if args.duration_secs.is_some() {
        settings.frames.duration_secs = args.duration_secs;
    }
    if let Some(markings) = args.markings {
        settings.lanes.markings = markings;
    }
}
