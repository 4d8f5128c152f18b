#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative driving-session state for drive playback.
//!
//! [`SessionState`] is the store the playback clock writes into. It tracks
//! whether a session is active, keeps the most recently published sample
//! for per-frame consumers, and folds every sample published during a
//! session into a [`SessionSummary`] that is closed when the session ends.

use std::collections::BTreeMap;

use drive_playback_core::{BehaviorFlag, SessionStore, TendencySample};
use tracing::{debug, info};

/// Identifier allocated to each driving session opened by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u32);

impl SessionId {
    /// Creates a new session identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Aggregate of the samples published during one session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    /// Session the summary belongs to.
    pub id: SessionId,
    /// Number of samples published while the session was active.
    pub samples: u32,
    /// Highest absolute speed observed.
    pub peak_speed: f32,
    /// Sum of absolute speeds, used to derive the mean.
    pub total_speed: f32,
    /// Number of samples that raised each behavioural flag.
    pub flag_counts: BTreeMap<BehaviorFlag, u32>,
}

impl SessionSummary {
    fn open(id: SessionId) -> Self {
        Self {
            id,
            samples: 0,
            peak_speed: 0.0,
            total_speed: 0.0,
            flag_counts: BTreeMap::new(),
        }
    }

    fn record(&mut self, sample: &TendencySample) {
        self.samples = self.samples.saturating_add(1);
        let speed = sample.speed.abs();
        if speed.is_finite() {
            self.peak_speed = self.peak_speed.max(speed);
            self.total_speed += speed;
        }
        for flag in &sample.flags {
            let count = self.flag_counts.entry(*flag).or_insert(0);
            *count = count.saturating_add(1);
        }
    }

    /// Mean absolute speed across the session, zero when nothing was published.
    #[must_use]
    pub fn mean_speed(&self) -> f32 {
        if self.samples == 0 {
            0.0
        } else {
            self.total_speed / self.samples as f32
        }
    }

    /// Number of samples that raised the provided flag.
    #[must_use]
    pub fn flag_count(&self, flag: BehaviorFlag) -> u32 {
        self.flag_counts.get(&flag).copied().unwrap_or(0)
    }
}

/// In-memory session store shared between the playback clock and its readers.
#[derive(Debug, Default)]
pub struct SessionState {
    active: Option<SessionSummary>,
    latest: Option<TendencySample>,
    closed: Vec<SessionSummary>,
    next_id: u32,
    publish_count: u64,
}

impl SessionState {
    /// Creates an empty store with no active session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for SessionState {
    fn is_session_active(&self) -> bool {
        self.active.is_some()
    }

    fn start_session(&mut self) {
        if self.active.is_some() {
            return;
        }

        let id = SessionId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        info!(session = id.get(), "driving session started");
        self.active = Some(SessionSummary::open(id));
    }

    fn end_session(&mut self) {
        let Some(summary) = self.active.take() else {
            return;
        };

        info!(
            session = summary.id.get(),
            samples = summary.samples,
            "driving session ended"
        );
        self.closed.push(summary);
    }

    fn publish_tendency(&mut self, sample: TendencySample) {
        self.publish_count = self.publish_count.saturating_add(1);
        if let Some(summary) = self.active.as_mut() {
            summary.record(&sample);
        } else {
            debug!("tendency published without an active session");
        }
        self.latest = Some(sample);
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use drive_playback_core::TendencySample;

    use super::{SessionId, SessionState, SessionSummary};

    /// Reports whether a session is currently active.
    #[must_use]
    pub fn is_active(state: &SessionState) -> bool {
        state.active.is_some()
    }

    /// Identifier of the active session, if any.
    #[must_use]
    pub fn active_session(state: &SessionState) -> Option<SessionId> {
        state.active.as_ref().map(|summary| summary.id)
    }

    /// Running summary of the active session, if any.
    #[must_use]
    pub fn active_summary(state: &SessionState) -> Option<&SessionSummary> {
        state.active.as_ref()
    }

    /// Most recently published sample, regardless of session activity.
    #[must_use]
    pub fn latest_tendency(state: &SessionState) -> Option<&TendencySample> {
        state.latest.as_ref()
    }

    /// Summaries of every session that has ended, oldest first.
    #[must_use]
    pub fn closed_sessions(state: &SessionState) -> &[SessionSummary] {
        &state.closed
    }

    /// Total number of samples published since the store was created.
    #[must_use]
    pub fn publish_count(state: &SessionState) -> u64 {
        state.publish_count
    }
}
