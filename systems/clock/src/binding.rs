use drive_playback_core::{PlaybackPhase, SessionStore, TickScheduler, TimerId};

use crate::{Playback, TickOutcome};

/// Scoped pairing of a playback with the store and scheduler it drives.
///
/// Activation happens on construction and teardown on drop, so neither a
/// running timer nor an active session started for the playback can outlive
/// the binding. Both collaborators may be owned or borrowed mutably.
#[derive(Debug)]
pub struct SessionBinding<S: SessionStore, T: TickScheduler> {
    playback: Playback,
    store: S,
    timers: T,
}

impl<S: SessionStore, T: TickScheduler> SessionBinding<S, T> {
    /// Binds the playback to its collaborators and activates it.
    pub fn activate(playback: Playback, store: S, timers: T) -> Self {
        let mut binding = Self {
            playback,
            store,
            timers,
        };
        binding
            .playback
            .activate(&mut binding.store, &mut binding.timers);
        binding
    }

    /// Routes a timer fire into the bound playback.
    pub fn on_timer(&mut self, timer: TimerId) -> TickOutcome {
        self.playback
            .on_timer(timer, &mut self.store, &mut self.timers)
    }

    /// Reconciles the playback after the session was changed elsewhere.
    pub fn sync(&mut self) {
        self.playback.sync(&mut self.store, &mut self.timers);
    }

    /// Stops playback immediately, releasing the timer and the session.
    pub fn stop(&mut self) {
        self.playback.teardown(&mut self.store, &mut self.timers);
    }

    /// Replays the sequence from the first sample.
    pub fn restart(&mut self) {
        self.playback.restart(&mut self.store, &mut self.timers);
    }

    /// Bound playback.
    #[must_use]
    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    /// Lifecycle stage of the bound playback.
    #[must_use]
    pub fn phase(&self) -> PlaybackPhase {
        self.playback.phase()
    }

    /// Store receiving published samples.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the store, for session changes made elsewhere.
    ///
    /// Call [`SessionBinding::sync`] after changing session activity.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Scheduler holding the playback timer.
    #[must_use]
    pub fn timers(&self) -> &T {
        &self.timers
    }

    /// Mutable access to the scheduler so the driver can advance it.
    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }
}

impl<S: SessionStore, T: TickScheduler> Drop for SessionBinding<S, T> {
    fn drop(&mut self) {
        self.playback.teardown(&mut self.store, &mut self.timers);
    }
}
