#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Event-loop adapters that drive playback timers and lane frames.
//!
//! [`ManualTimers`] implements the core [`TickScheduler`] on a virtual clock
//! that only moves when the host advances it. Frame sources implement
//! [`FrameSource`]: [`FixedFrameSource`] emits a fixed number of constant
//! frames for headless runs, while [`PacedFrameSource`] sleeps between frames
//! and reports measured wall-clock deltas.

mod frames;

pub use frames::{FixedFrameSource, FrameFlow, FrameSource, PacedFrameSource};

use std::{collections::BTreeMap, time::Duration};

use drive_playback_core::{TickScheduler, TimerId};
use thiserror::Error;
use tracing::trace;

/// Shortest interval accepted by [`ManualTimers`]; shorter requests are raised to it.
pub const MIN_TIMER_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug)]
struct ArmedTimer {
    interval: Duration,
    next_due: Duration,
}

/// Repeating timers driven by an explicitly advanced virtual clock.
///
/// Each fire is scheduled one interval after the previous due time, so the
/// cadence stays fixed regardless of how coarsely the clock is advanced.
#[derive(Debug, Default)]
pub struct ManualTimers {
    now: Duration,
    next_id: u64,
    armed: BTreeMap<TimerId, ArmedTimer>,
}

impl ManualTimers {
    /// Creates a scheduler at virtual time zero with no armed timers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since the scheduler was created.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of timers currently armed.
    #[must_use]
    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// Reports whether the timer is still armed.
    #[must_use]
    pub fn is_armed(&self, timer: TimerId) -> bool {
        self.armed.contains_key(&timer)
    }

    /// Advances virtual time and returns every fire that fell due, in due order.
    ///
    /// A timer that is due several times within `elapsed` appears once per
    /// interval. Ties are broken by timer identifier. Fires are computed up
    /// front, so a timer disarmed while the batch is dispatched may still
    /// appear later in the same batch; owners must ignore fires for timers
    /// they no longer hold.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<TimerId> {
        let target = self.now.saturating_add(elapsed);
        let mut fired = Vec::new();

        loop {
            let due = self
                .armed
                .iter()
                .filter(|(_, timer)| timer.next_due <= target)
                .min_by_key(|(id, timer)| (timer.next_due, **id))
                .map(|(id, _)| *id);
            let Some(id) = due else {
                break;
            };

            if let Some(timer) = self.armed.get_mut(&id) {
                trace!(timer = id.get(), due_ms = duration_ms(timer.next_due), "timer fired");
                timer.next_due = timer.next_due.saturating_add(timer.interval);
            }
            fired.push(id);
        }

        self.now = target;
        fired
    }
}

impl TickScheduler for ManualTimers {
    fn arm_repeating(&mut self, interval: Duration) -> TimerId {
        let interval = interval.max(MIN_TIMER_INTERVAL);
        let id = TimerId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let _ = self.armed.insert(
            id,
            ArmedTimer {
                interval,
                next_due: self.now.saturating_add(interval),
            },
        );
        id
    }

    fn disarm(&mut self, timer: TimerId) {
        let _ = self.armed.remove(&timer);
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Errors raised while constructing frame sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Frames per second must be positive.
    #[error("frame rate must be positive (received {fps})")]
    InvalidFrameRate {
        /// Rejected frame rate.
        fps: u32,
    },
}
