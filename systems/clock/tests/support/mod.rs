#![allow(dead_code)]

use std::time::Duration;

use drive_playback_core::{SessionStore, TendencySample, TickScheduler, TimerId};

/// Call observed by the recording store, in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreCall {
    Start,
    End,
    Publish(TendencySample),
}

/// Session store fake that records every call it receives.
#[derive(Debug, Default)]
pub struct RecordingStore {
    pub active: bool,
    pub calls: Vec<StoreCall>,
}

impl RecordingStore {
    pub fn published(&self) -> Vec<TendencySample> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                StoreCall::Publish(sample) => Some(sample.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn starts(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, StoreCall::Start))
            .count()
    }

    pub fn ends(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, StoreCall::End))
            .count()
    }
}

impl SessionStore for RecordingStore {
    fn is_session_active(&self) -> bool {
        self.active
    }

    fn start_session(&mut self) {
        self.calls.push(StoreCall::Start);
        self.active = true;
    }

    fn end_session(&mut self) {
        self.calls.push(StoreCall::End);
        self.active = false;
    }

    fn publish_tendency(&mut self, sample: TendencySample) {
        self.calls.push(StoreCall::Publish(sample));
    }
}

/// Scheduler fake that hands out sequential identifiers and tracks armed timers.
#[derive(Debug, Default)]
pub struct RecordingTimers {
    next: u64,
    pub armed: Vec<(TimerId, Duration)>,
    pub disarmed: Vec<TimerId>,
}

impl RecordingTimers {
    pub fn single_armed(&self) -> TimerId {
        assert_eq!(self.armed.len(), 1, "expected exactly one armed timer");
        self.armed[0].0
    }
}

impl TickScheduler for RecordingTimers {
    fn arm_repeating(&mut self, interval: Duration) -> TimerId {
        let timer = TimerId::new(self.next);
        self.next += 1;
        self.armed.push((timer, interval));
        timer
    }

    fn disarm(&mut self, timer: TimerId) {
        self.armed.retain(|(armed, _)| *armed != timer);
        self.disarmed.push(timer);
    }
}

pub fn sequence(len: usize) -> Vec<TendencySample> {
    (0..len)
        .map(|index| TendencySample::new(10.0 + index as f32, index as f32 * 0.1))
        .collect()
}
