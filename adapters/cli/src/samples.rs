use std::{fs, path::Path};

use anyhow::{Context, Result};
use drive_playback_core::{BehaviorFlag, Indicator, TendencySample};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use thiserror::Error;

const MAX_SPEED: f32 = 35.0;
const SPEEDING_THRESHOLD: f32 = 30.0;
const HARSH_DELTA: f32 = 6.0;
const INDICATOR_TURN: f32 = 0.4;
const WEAVE_TURN: f32 = 0.3;
const DISTRACTION_PROBABILITY: f64 = 0.05;

/// Encodings accepted for sample files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SampleFormat {
    /// JSON array of samples, or an object with a `samples` array.
    Json,
    /// TOML document with `[[samples]]` tables.
    Toml,
}

impl SampleFormat {
    /// Selects the format from the file extension.
    pub(crate) fn from_path(path: &Path) -> Result<Self, SampleSourceError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(SampleSourceError::UnsupportedExtension(extension)),
        }
    }
}

/// Errors raised while decoding a sample file.
#[derive(Debug, Error)]
pub(crate) enum SampleSourceError {
    /// The file extension did not name a supported encoding.
    #[error("unsupported sample file extension {0:?}; expected .json or .toml")]
    UnsupportedExtension(Option<String>),
    /// The JSON payload could not be decoded.
    #[error("invalid JSON sample payload")]
    Json(#[from] serde_json::Error),
    /// The TOML payload could not be decoded.
    #[error("invalid TOML sample payload")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize)]
struct SampleDocument {
    samples: Vec<TendencySample>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonSamples {
    Bare(Vec<TendencySample>),
    Document(SampleDocument),
}

/// Decodes samples from `contents` in the given format, preserving order.
pub(crate) fn parse_samples(
    contents: &str,
    format: SampleFormat,
) -> Result<Vec<TendencySample>, SampleSourceError> {
    match format {
        SampleFormat::Json => match serde_json::from_str::<JsonSamples>(contents)? {
            JsonSamples::Bare(samples) => Ok(samples),
            JsonSamples::Document(document) => Ok(document.samples),
        },
        SampleFormat::Toml => {
            let document: SampleDocument = toml::from_str(contents)?;
            Ok(document.samples)
        }
    }
}

/// Reads and decodes the sample file at `path`.
pub(crate) fn load_samples(path: &Path) -> Result<Vec<TendencySample>> {
    let format = SampleFormat::from_path(path)?;
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read sample file {}", path.display()))?;
    parse_samples(&contents, format)
        .with_context(|| format!("failed to decode sample file {}", path.display()))
}

/// Generates a deterministic synthetic drive of `count` samples.
///
/// Speed follows a bounded random walk and turn-rate a smoothed one; flags
/// are derived from the motion so the summaries have something to count.
pub(crate) fn synthetic_drive(count: usize, seed: u64) -> Vec<TendencySample> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut speed: f32 = rng.gen_range(8.0..20.0);
    let mut turn_rate: f32 = 0.0;
    let mut samples = Vec::with_capacity(count);

    for _ in 0..count {
        let previous_speed = speed;
        let previous_turn = turn_rate;
        speed = (speed + rng.gen_range(-8.0..8.0)).clamp(0.0, MAX_SPEED);
        turn_rate = (turn_rate * 0.6 + rng.gen_range(-0.5..0.5)).clamp(-1.0, 1.0);

        let indicator = if turn_rate > INDICATOR_TURN {
            Indicator::Left
        } else if turn_rate < -INDICATOR_TURN {
            Indicator::Right
        } else {
            Indicator::Off
        };

        let mut sample = TendencySample::new(speed, turn_rate).with_indicator(indicator);
        if speed > SPEEDING_THRESHOLD {
            sample = sample.with_flag(BehaviorFlag::Speeding);
        }
        if previous_speed - speed > HARSH_DELTA {
            sample = sample.with_flag(BehaviorFlag::HarshBraking);
        }
        if speed - previous_speed > HARSH_DELTA {
            sample = sample.with_flag(BehaviorFlag::HarshAcceleration);
        }
        if previous_turn.abs() > WEAVE_TURN
            && turn_rate.abs() > WEAVE_TURN
            && previous_turn.signum() != turn_rate.signum()
        {
            sample = sample.with_flag(BehaviorFlag::LaneWeaving);
        }
        if rng.gen_bool(DISTRACTION_PROBABILITY) {
            sample = sample.with_flag(BehaviorFlag::Distracted);
        }
        samples.push(sample);
    }

    samples
}
