#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick-driven playback clock that walks a session through tendency samples.
//!
//! [`Playback`] owns the played sequence and its cursor. It never owns the
//! session store or the timer scheduler; every operation borrows them so the
//! same clock can be driven by a virtual scheduler in tests and a paced loop
//! in adapters. [`SessionBinding`] couples a playback with its collaborators
//! and guarantees teardown when it goes out of scope.

mod binding;

pub use binding::SessionBinding;

use drive_playback_core::{
    PlaybackConfig, PlaybackPhase, SessionStore, TendencySample, TickScheduler, TimerId,
};
use tracing::{debug, info, trace};

/// Result of routing a timer fire into the playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The next sample in the sequence was published.
    Advanced {
        /// Index of the sample that was published.
        index: usize,
    },
    /// The sequence wrapped and the first sample was published again.
    Looped,
    /// The sequence ended; the timer was disarmed and the session end requested.
    Completed,
    /// The fire did not belong to the running playback and was dropped.
    Ignored,
}

/// Fixed-interval playback over an ordered sequence of tendency samples.
#[derive(Debug)]
pub struct Playback {
    config: PlaybackConfig,
    index: usize,
    phase: PlaybackPhase,
    timer: Option<TimerId>,
}

impl Playback {
    /// Creates an idle playback positioned at the first sample.
    #[must_use]
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            index: 0,
            phase: PlaybackPhase::Idle,
            timer: None,
        }
    }

    /// Configuration the playback was created with.
    #[must_use]
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Index of the most recently published sample.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current lifecycle stage.
    #[must_use]
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// Timer currently armed for the playback, if any.
    #[must_use]
    pub fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    /// Activates the playback.
    ///
    /// A completed playback returns to idle at the first sample. With
    /// autostart enabled a session start is requested only when the store
    /// reports no active session. Playback begins as soon as the store
    /// reports the session active; otherwise it waits for a later [`sync`].
    /// Activating a running playback changes nothing.
    ///
    /// [`sync`]: Playback::sync
    pub fn activate<S, T>(&mut self, store: &mut S, timers: &mut T)
    where
        S: SessionStore + ?Sized,
        T: TickScheduler + ?Sized,
    {
        if self.phase == PlaybackPhase::Completed {
            self.index = 0;
            self.phase = PlaybackPhase::Idle;
        }

        if self.config.autostart() && !store.is_session_active() {
            info!("requesting driving session start");
            store.start_session();
        }

        self.sync(store, timers);
    }

    /// Reconciles the playback with the store's session activity.
    ///
    /// An idle playback starts once a session is active and samples exist.
    /// A running playback whose session was ended elsewhere stops its timer
    /// and returns to idle without requesting a second end.
    pub fn sync<S, T>(&mut self, store: &mut S, timers: &mut T)
    where
        S: SessionStore + ?Sized,
        T: TickScheduler + ?Sized,
    {
        match self.phase {
            PlaybackPhase::Idle => {
                if !store.is_session_active() {
                    return;
                }
                let Some(first) = self.config.sequence().first() else {
                    return;
                };

                publish(store, 0, first);
                self.index = 0;
                self.timer = Some(timers.arm_repeating(self.config.tick()));
                self.phase = PlaybackPhase::Running;
                let tick_ms = u64::try_from(self.config.tick().as_millis()).unwrap_or(u64::MAX);
                info!(
                    samples = self.config.sequence().len(),
                    tick_ms,
                    "playback running"
                );
            }
            PlaybackPhase::Running => {
                if store.is_session_active() {
                    return;
                }

                info!(index = self.index, "session ended externally; playback idle");
                self.disarm(timers);
                self.index = 0;
                self.phase = PlaybackPhase::Idle;
            }
            PlaybackPhase::Completed => {}
        }
    }

    /// Routes a timer fire into the playback.
    ///
    /// A fire that arrives after the session was ended elsewhere reconciles
    /// the playback as [`sync`] would and publishes nothing.
    ///
    /// [`sync`]: Playback::sync
    pub fn on_timer<S, T>(&mut self, timer: TimerId, store: &mut S, timers: &mut T) -> TickOutcome
    where
        S: SessionStore + ?Sized,
        T: TickScheduler + ?Sized,
    {
        if self.phase != PlaybackPhase::Running || self.timer != Some(timer) {
            trace!(timer = timer.get(), "ignoring stale timer fire");
            return TickOutcome::Ignored;
        }

        if !store.is_session_active() {
            self.sync(store, timers);
            return TickOutcome::Ignored;
        }

        let next = self.index + 1;
        if let Some(sample) = self.config.sequence().get(next) {
            publish(store, next, sample);
            self.index = next;
            return TickOutcome::Advanced { index: next };
        }

        if self.config.looping() {
            if let Some(first) = self.config.sequence().first() {
                publish(store, 0, first);
                self.index = 0;
                return TickOutcome::Looped;
            }
        }

        self.disarm(timers);
        self.index = 0;
        self.phase = PlaybackPhase::Completed;
        info!("playback completed; requesting driving session end");
        store.end_session();
        TickOutcome::Completed
    }

    /// Releases every resource held by the playback.
    ///
    /// Disarms the pending timer and, when playback was running against an
    /// active session, requests exactly one session end. Safe to call any
    /// number of times.
    pub fn teardown<S, T>(&mut self, store: &mut S, timers: &mut T)
    where
        S: SessionStore + ?Sized,
        T: TickScheduler + ?Sized,
    {
        self.disarm(timers);
        self.index = 0;

        if self.phase != PlaybackPhase::Running {
            return;
        }

        self.phase = PlaybackPhase::Idle;
        if store.is_session_active() {
            info!("playback torn down mid-sequence; requesting driving session end");
            store.end_session();
        }
    }

    /// Tears the playback down and activates it again from the first sample.
    pub fn restart<S, T>(&mut self, store: &mut S, timers: &mut T)
    where
        S: SessionStore + ?Sized,
        T: TickScheduler + ?Sized,
    {
        self.teardown(store, timers);
        self.activate(store, timers);
    }

    fn disarm<T>(&mut self, timers: &mut T)
    where
        T: TickScheduler + ?Sized,
    {
        if let Some(timer) = self.timer.take() {
            timers.disarm(timer);
        }
    }
}

fn publish<S>(store: &mut S, index: usize, sample: &TendencySample)
where
    S: SessionStore + ?Sized,
{
    debug!(index, speed = sample.speed, turn_rate = sample.turn_rate, "publishing tendency");
    store.publish_tendency(sample.clone());
}
