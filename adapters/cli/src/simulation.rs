use std::{fmt, time::Duration};

use anyhow::{Context, Result};
use drive_playback_core::{PlaybackConfig, PlaybackPhase, SessionStore};
use drive_playback_runtime::{FrameFlow, FrameSource, ManualTimers};
use drive_playback_session::{query, SessionState, SessionSummary};
use drive_playback_system_clock::{Playback, SessionBinding};
use drive_playback_system_lanes::{LaneGeometry, MarkingPool};
use tracing::info;

/// Inputs required to run a headless playback.
#[derive(Clone, Debug)]
pub(crate) struct SimulationPlan {
    /// Samples and playback options.
    pub(crate) config: PlaybackConfig,
    /// Size of the lane marking pool.
    pub(crate) markings: usize,
    /// Virtual time at which another component starts the session, if any.
    pub(crate) external_start: Option<Duration>,
}

impl SimulationPlan {
    /// Reports whether the playback waits for a session nobody will start.
    pub(crate) fn never_starts(&self) -> bool {
        !self.config.autostart() && self.external_start.is_none()
    }

    /// Virtual time needed for the playback to finish on its own.
    ///
    /// Looping playbacks never finish, so three passes are budgeted.
    pub(crate) fn natural_duration(&self) -> Duration {
        let samples = u32::try_from(self.config.sequence().len()).unwrap_or(u32::MAX);
        let ticks = if self.config.looping() {
            samples.saturating_mul(3)
        } else {
            samples
        };
        let playback = self.config.tick().saturating_mul(ticks.saturating_add(1));
        self.external_start
            .unwrap_or(Duration::ZERO)
            .saturating_add(playback)
    }
}

/// Outcome of a headless playback.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SimulationReport {
    /// Frames delivered by the frame source.
    pub(crate) frames: u64,
    /// Virtual time covered by the timers.
    pub(crate) elapsed: Duration,
    /// Samples published to the store.
    pub(crate) published: u64,
    /// Playback phase when the frame source stopped.
    pub(crate) phase: PlaybackPhase,
    /// Lane offset after the final frame.
    pub(crate) offset: f32,
    /// Sessions closed during the run.
    pub(crate) sessions: Vec<SessionSummary>,
}

/// Drives playback and lane geometry from the provided frame source.
///
/// Each frame advances the virtual timers by the frame delta, routes every
/// fire into the playback, then updates the lane from the latest published
/// sample. Delivery stops once the playback completes; the binding is
/// dropped before the report is built so any running session is closed.
pub(crate) fn simulate<F>(plan: SimulationPlan, frames: &mut F) -> Result<SimulationReport>
where
    F: FrameSource,
{
    let pool = MarkingPool::new(plan.markings).context("invalid lane configuration")?;
    let mut lanes = LaneGeometry::new(pool);
    let mut store = SessionState::new();
    let mut timers = ManualTimers::new();
    let mut external_start = plan.external_start;

    let (frame_count, phase) = {
        let mut binding =
            SessionBinding::activate(Playback::new(plan.config), &mut store, &mut timers);

        let frame_count = frames.run(|delta| {
            for timer in binding.timers_mut().advance(delta) {
                let _ = binding.on_timer(timer);
            }

            if external_start.is_some_and(|at| binding.timers().now() >= at) {
                external_start = None;
                info!("external component started the driving session");
                binding.store_mut().start_session();
                binding.sync();
            }

            let reading = query::latest_tendency(binding.store());
            let _ = lanes.on_frame(delta.as_secs_f32(), &reading);

            if binding.phase() == PlaybackPhase::Completed {
                FrameFlow::Stop
            } else {
                FrameFlow::Continue
            }
        });

        (frame_count, binding.phase())
    };

    Ok(SimulationReport {
        frames: frame_count,
        elapsed: timers.now(),
        published: query::publish_count(&store),
        phase,
        offset: lanes.offset().get(),
        sessions: query::closed_sessions(&store).to_vec(),
    })
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frames: {}", self.frames)?;
        writeln!(f, "virtual time: {:.3}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "published samples: {}", self.published)?;
        writeln!(f, "playback: {:?}", self.phase)?;
        writeln!(f, "lane offset: {:.3}", self.offset)?;
        for summary in &self.sessions {
            write!(
                f,
                "session {}: {} samples, mean speed {:.2}, peak speed {:.2}",
                summary.id.get(),
                summary.samples,
                summary.mean_speed(),
                summary.peak_speed
            )?;
            for (flag, count) in &summary.flag_counts {
                write!(f, ", {flag:?}={count}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
