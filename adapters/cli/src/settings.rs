use std::{fs, path::Path};

use anyhow::{Context, Result};
use drive_playback_core::PlaybackOptions;
use drive_playback_system_lanes::DEFAULT_MARKING_COUNT;
use serde::Deserialize;

const DEFAULT_FPS: u32 = 60;

/// Settings file layout; every section and key is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    /// Playback cadence and lifecycle options.
    pub(crate) playback: PlaybackOptions,
    /// Lane marking pool configuration.
    pub(crate) lanes: LaneSettings,
    /// Frame delivery configuration.
    pub(crate) frames: FrameSettings,
}

/// Lane marking pool configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LaneSettings {
    /// Number of markings in the pool, split evenly between both sides.
    pub(crate) markings: usize,
}

impl Default for LaneSettings {
    fn default() -> Self {
        Self {
            markings: DEFAULT_MARKING_COUNT,
        }
    }
}

/// Frame delivery configuration.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FrameSettings {
    /// Target frames per second.
    pub(crate) fps: u32,
    /// Upper bound on simulated time; derived from the sequence when absent.
    pub(crate) duration_secs: Option<f64>,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            duration_secs: None,
        }
    }
}

impl Settings {
    /// Loads settings from the TOML file at `path`, or defaults when absent.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid settings toml")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let settings = Settings::parse("").expect("empty settings parse");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.frames.fps, 60);
        assert_eq!(settings.lanes.markings, DEFAULT_MARKING_COUNT);
        assert_eq!(settings.playback, PlaybackOptions::default());
    }

    #[test]
    fn sections_override_individual_keys() {
        let settings = Settings::parse(
            r#"
            [playback]
            tick_ms = 500
            looping = true

            [frames]
            duration_secs = 12.5
            "#,
        )
        .expect("settings parse");

        assert_eq!(settings.playback.tick_ms, 500);
        assert!(settings.playback.looping);
        assert!(settings.playback.autostart);
        assert_eq!(settings.frames.fps, 60);
        assert_eq!(settings.frames.duration_secs, Some(12.5));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::parse("[lanes]\nmarking = 3\n").is_err());
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[lanes]\nmarkings = 12").expect("write settings");

        let settings = Settings::load(Some(file.path())).expect("load settings");
        assert_eq!(settings.lanes.markings, 12);
    }

    #[test]
    fn missing_path_yields_defaults() {
        assert_eq!(Settings::load(None).expect("defaults"), Settings::default());
    }
}
