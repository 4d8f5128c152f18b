#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the drive playback engine.
//!
//! This crate defines the surface that connects the playback clock, the lane
//! geometry updater, and the adapters that host them. The clock publishes
//! [`TendencySample`] values into a [`SessionStore`] on a cadence provided by
//! a [`TickScheduler`]. Neither trait assumes a particular event loop, so the
//! systems can be driven by a virtual clock in tests and by a paced loop in
//! the command-line adapter.

use std::{collections::BTreeSet, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Interval between playback advances when no explicit value is configured.
pub const DEFAULT_TICK: Duration = Duration::from_millis(1000);

/// Direction signalled by the vehicle's turn indicator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    /// No indicator is active.
    #[default]
    Off,
    /// Left indicator is active.
    Left,
    /// Right indicator is active.
    Right,
}

/// Behavioural observations attached to a tendency sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorFlag {
    /// Deceleration exceeded the harsh-braking threshold.
    HarshBraking,
    /// Acceleration exceeded the harsh-acceleration threshold.
    HarshAcceleration,
    /// Speed exceeded the posted limit.
    Speeding,
    /// Driver attention was flagged as diverted.
    Distracted,
    /// Repeated lateral movement across lane boundaries.
    LaneWeaving,
}

/// One discrete driving-tendency observation consumed during playback.
///
/// Samples are opaque to the playback clock: they are published in sequence
/// order exactly as provided, and validation is left to the session store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TendencySample {
    /// Forward speed in world units per second.
    pub speed: f32,
    /// Signed turn-rate; zero drives straight ahead.
    pub turn_rate: f32,
    /// Turn indicator state at the time of the observation.
    #[serde(default)]
    pub indicator: Indicator,
    /// Behavioural flags raised during the observation.
    #[serde(default)]
    pub flags: BTreeSet<BehaviorFlag>,
}

impl TendencySample {
    /// Creates a sample with the provided motion and no indicator or flags.
    #[must_use]
    pub fn new(speed: f32, turn_rate: f32) -> Self {
        Self {
            speed,
            turn_rate,
            indicator: Indicator::Off,
            flags: BTreeSet::new(),
        }
    }

    /// Returns the sample with the indicator replaced.
    #[must_use]
    pub fn with_indicator(mut self, indicator: Indicator) -> Self {
        self.indicator = indicator;
        self
    }

    /// Returns the sample with an additional behavioural flag raised.
    #[must_use]
    pub fn with_flag(mut self, flag: BehaviorFlag) -> Self {
        let _ = self.flags.insert(flag);
        self
    }
}

/// Shared session state that receives published tendency samples.
///
/// Implementations must tolerate repeated calls: starting an active session
/// and ending an inactive one are both no-ops.
pub trait SessionStore {
    /// Reports whether a driving session is currently active.
    fn is_session_active(&self) -> bool;

    /// Requests that a new session begins. Idempotent while active.
    fn start_session(&mut self);

    /// Requests that the active session ends. Idempotent while inactive.
    fn end_session(&mut self);

    /// Publishes the most recent tendency sample; the last write wins.
    fn publish_tendency(&mut self, sample: TendencySample);
}

impl<S: SessionStore + ?Sized> SessionStore for &mut S {
    fn is_session_active(&self) -> bool {
        (**self).is_session_active()
    }

    fn start_session(&mut self) {
        (**self).start_session();
    }

    fn end_session(&mut self) {
        (**self).end_session();
    }

    fn publish_tendency(&mut self, sample: TendencySample) {
        (**self).publish_tendency(sample);
    }
}

/// Identifier of a repeating timer armed through a [`TickScheduler`].
///
/// The identifier doubles as the disposer: handing it back to
/// [`TickScheduler::disarm`] cancels the timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Creates a new timer identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Scheduler capable of arming cancellable repeating timers.
///
/// The scheduler only hands out identifiers; whoever drives it is responsible
/// for routing each fire back to the owner of the identifier.
pub trait TickScheduler {
    /// Arms a timer that fires repeatedly every `interval`.
    fn arm_repeating(&mut self, interval: Duration) -> TimerId;

    /// Cancels the timer. Disarming an unknown or already disarmed timer is a no-op.
    fn disarm(&mut self, timer: TimerId);
}

impl<T: TickScheduler + ?Sized> TickScheduler for &mut T {
    fn arm_repeating(&mut self, interval: Duration) -> TimerId {
        (**self).arm_repeating(interval)
    }

    fn disarm(&mut self, timer: TimerId) {
        (**self).disarm(timer);
    }
}

/// Lifecycle stage of a playback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlaybackPhase {
    /// No timer is armed; waiting for an active session and samples.
    #[default]
    Idle,
    /// The timer is armed and samples are being published.
    Running,
    /// The final sample was played and the session end was requested.
    Completed,
}

/// Tunable playback behaviour, independent of the played sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackOptions {
    /// Interval between advances expressed in milliseconds.
    pub tick_ms: u64,
    /// Whether activation requests a session start when none is active.
    pub autostart: bool,
    /// Whether playback restarts at the first sample instead of ending.
    pub looping: bool,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK.as_millis() as u64,
            autostart: true,
            looping: false,
        }
    }
}

/// Validated playback configuration owning the sample sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackConfig {
    sequence: Vec<TendencySample>,
    tick: Duration,
    autostart: bool,
    looping: bool,
}

impl PlaybackConfig {
    /// Creates a configuration for the provided sequence and options.
    ///
    /// Returns [`PlaybackError::ZeroTickInterval`] when `tick_ms` is zero.
    pub fn new(
        sequence: Vec<TendencySample>,
        options: PlaybackOptions,
    ) -> Result<Self, PlaybackError> {
        if options.tick_ms == 0 {
            return Err(PlaybackError::ZeroTickInterval);
        }

        Ok(Self::from_options(sequence, options))
    }

    /// Creates a configuration with default options for the sequence.
    #[must_use]
    pub fn with_defaults(sequence: Vec<TendencySample>) -> Self {
        Self::from_options(sequence, PlaybackOptions::default())
    }

    fn from_options(sequence: Vec<TendencySample>, options: PlaybackOptions) -> Self {
        Self {
            sequence,
            tick: Duration::from_millis(options.tick_ms),
            autostart: options.autostart,
            looping: options.looping,
        }
    }

    /// Samples played back in order.
    #[must_use]
    pub fn sequence(&self) -> &[TendencySample] {
        &self.sequence
    }

    /// Interval between advances.
    #[must_use]
    pub const fn tick(&self) -> Duration {
        self.tick
    }

    /// Whether activation requests a session start.
    #[must_use]
    pub const fn autostart(&self) -> bool {
        self.autostart
    }

    /// Whether playback loops after the final sample.
    #[must_use]
    pub const fn looping(&self) -> bool {
        self.looping
    }
}

/// Errors raised while configuring playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// The tick interval must be positive.
    #[error("tick interval must be positive")]
    ZeroTickInterval,
}
