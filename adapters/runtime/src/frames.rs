use std::{
    thread,
    time::{Duration, Instant},
};

use tracing::debug;

use crate::RuntimeError;

/// Decision returned by a frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameFlow {
    /// Keep delivering frames.
    Continue,
    /// Stop delivering frames; equivalent to unsubscribing.
    Stop,
}

/// Source of rendered frames.
pub trait FrameSource {
    /// Invokes `on_frame` once per frame with the time elapsed since the
    /// previous frame, until the callback returns [`FrameFlow::Stop`] or the
    /// source is exhausted. Returns the number of frames delivered.
    fn run<F>(&mut self, on_frame: F) -> u64
    where
        F: FnMut(Duration) -> FrameFlow;
}

fn frame_interval(fps: u32) -> Result<Duration, RuntimeError> {
    if fps == 0 {
        return Err(RuntimeError::InvalidFrameRate { fps });
    }
    Ok(Duration::from_secs(1) / fps)
}

/// Headless source delivering a fixed number of equally spaced frames.
#[derive(Clone, Copy, Debug)]
pub struct FixedFrameSource {
    frame: Duration,
    frames: u64,
}

impl FixedFrameSource {
    /// Creates a source delivering `frames` frames at `fps`.
    pub fn new(fps: u32, frames: u64) -> Result<Self, RuntimeError> {
        Ok(Self {
            frame: frame_interval(fps)?,
            frames,
        })
    }

    /// Creates a source covering at least `total` of simulated time at `fps`.
    pub fn covering(fps: u32, total: Duration) -> Result<Self, RuntimeError> {
        let frame = frame_interval(fps)?;
        let frame_nanos = frame.as_nanos().max(1);
        let frames = total.as_nanos().div_ceil(frame_nanos);
        Ok(Self {
            frame,
            frames: u64::try_from(frames).unwrap_or(u64::MAX),
        })
    }

    /// Time step delivered with every frame.
    #[must_use]
    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Number of frames the source delivers when never stopped.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameSource for FixedFrameSource {
    fn run<F>(&mut self, mut on_frame: F) -> u64
    where
        F: FnMut(Duration) -> FrameFlow,
    {
        let mut delivered = 0;
        while delivered < self.frames {
            delivered += 1;
            if on_frame(self.frame) == FrameFlow::Stop {
                break;
            }
        }
        debug!(delivered, "fixed frame source finished");
        delivered
    }
}

/// Wall-clock source that sleeps to hold a target frame rate.
///
/// Deltas are measured with [`Instant`], so a slow callback yields a larger
/// delta on the following frame rather than a dropped frame.
#[derive(Clone, Copy, Debug)]
pub struct PacedFrameSource {
    frame: Duration,
    limit: Option<Duration>,
}

impl PacedFrameSource {
    /// Creates a source targeting `fps`, running for at most `limit` when provided.
    pub fn new(fps: u32, limit: Option<Duration>) -> Result<Self, RuntimeError> {
        Ok(Self {
            frame: frame_interval(fps)?,
            limit,
        })
    }
}

impl FrameSource for PacedFrameSource {
    fn run<F>(&mut self, mut on_frame: F) -> u64
    where
        F: FnMut(Duration) -> FrameFlow,
    {
        let started = Instant::now();
        let mut last = started;
        let mut delivered = 0;

        loop {
            let deadline = last + self.frame;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            }

            let now = Instant::now();
            let delta = now.duration_since(last);
            last = now;
            delivered += 1;

            if on_frame(delta) == FrameFlow::Stop {
                break;
            }
            if self
                .limit
                .is_some_and(|limit| now.duration_since(started) >= limit)
            {
                break;
            }
        }

        debug!(delivered, "paced frame source finished");
        delivered
    }
}
