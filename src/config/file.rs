//! Configuration file management for quickrec.
//!
//! The file lives at `~/.config/quickrec/quickrec.toml` and is written with defaults
//! on first run. Every section and field is optional; missing values fall back to
//! their defaults and out-of-range values are repaired on load.

use crate::waveform::file_view::{DEFAULT_PROGRESS_COLOR, DEFAULT_TARGET_SAMPLE_COUNT};
use crate::waveform::{Rgb, StyleConfig};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Allowed live poll interval in milliseconds.
pub const POLL_INTERVAL_RANGE_MS: RangeInclusive<u64> = 20..=50;

/// Audio capture settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// `"default"`, a device index or a device name from `quickrec list-devices`
    pub device: String,
    /// Recording sample rate in Hz
    pub sample_rate: u32,
    /// Live waveform poll interval
    pub poll_interval_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: "default".to_string(),
            sample_rate: 44_100,
            poll_interval_ms: 50,
        }
    }
}

/// Playback preview settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Number of bars extracted from a recording
    pub target_sample_count: usize,
    /// Color of the already played part
    pub progress_color: Rgb,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            target_sample_count: DEFAULT_TARGET_SAMPLE_COUNT,
            progress_color: DEFAULT_PROGRESS_COLOR,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub audio: AudioConfig,
    pub waveform: StyleConfig,
    pub preview: PreviewConfig,
}

impl RecorderConfig {
    /// Loads the configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads the configuration from `path`.
    ///
    /// # Errors
    /// - If the file cannot be read or parsed
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses TOML text, repairing out-of-range values.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let config: RecorderConfig = toml::from_str(content)?;
        Ok(config.validated())
    }

    fn validated(mut self) -> Self {
        self.waveform = self.waveform.validated();
        self.audio.poll_interval_ms = self
            .audio
            .poll_interval_ms
            .clamp(*POLL_INTERVAL_RANGE_MS.start(), *POLL_INTERVAL_RANGE_MS.end());
        if self.audio.sample_rate == 0 {
            self.audio.sample_rate = AudioConfig::default().sample_rate;
        }
        self.preview.target_sample_count = self.preview.target_sample_count.max(1);
        self
    }

    /// Live waveform poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.audio.poll_interval_ms)
    }
}

/// Path of the config file. Its directory is created if missing.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn config_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Could not find home directory")?
        .join(".config")
        .join("quickrec");
    fs::create_dir_all(&dir)?;
    Ok(dir.join("quickrec.toml"))
}

/// Where recordings and their index are kept: `~/.local/share/quickrec`.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the directory cannot be created
pub fn data_dir() -> anyhow::Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Could not find home directory")?
        .join(".local")
        .join("share")
        .join("quickrec");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::Alignment;

    #[test]
    fn test_default_template_matches_defaults() {
        let config = RecorderConfig::from_toml(crate::setup::DEFAULT_CONFIG).unwrap();
        let defaults = RecorderConfig::default();

        assert_eq!(config.audio, defaults.audio);
        assert_eq!(config.preview, defaults.preview);
        assert_eq!(config.waveform.gradient, defaults.waveform.gradient);
        assert_eq!(config.waveform.max_height, None);
        assert_eq!(
            config.waveform.max_reportable_amplitude,
            defaults.waveform.max_reportable_amplitude
        );
        assert!((config.waveform.min_alpha - defaults.waveform.min_alpha).abs() < 1e-3);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = RecorderConfig::from_toml("[waveform]\nalignment = \"bottom\"\n").unwrap();
        assert_eq!(config.audio, AudioConfig::default());
        assert_eq!(config.waveform.alignment, Alignment::Bottom);
        assert_eq!(config.waveform.bar_width, StyleConfig::default().bar_width);
    }

    #[test]
    fn test_poll_interval_is_clamped() {
        let fast = RecorderConfig::from_toml("[audio]\npoll_interval_ms = 1\n").unwrap();
        assert_eq!(fast.poll_interval(), Duration::from_millis(20));

        let slow = RecorderConfig::from_toml("[audio]\npoll_interval_ms = 900\n").unwrap();
        assert_eq!(slow.poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_version_line_is_ignored() {
        let config = RecorderConfig::from_toml("config_version = \"0.1.0\"\n[preview]\ntarget_sample_count = 0\n")
            .unwrap();
        assert_eq!(config.preview.target_sample_count, 1);
    }

    #[test]
    fn test_bad_color_is_rejected() {
        assert!(RecorderConfig::from_toml("[preview]\nprogress_color = \"teal\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quickrec.toml");
        fs::write(&path, "[audio]\ndevice = \"1\"\n").unwrap();

        let config = RecorderConfig::load_from(&path).unwrap();
        assert_eq!(config.audio.device, "1");
        assert!(RecorderConfig::load_from(&dir.path().join("missing.toml")).is_err());
    }
}
