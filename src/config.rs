use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::app_dirs::AppDirs;
use crate::timing::{DurationBounds, DEFAULT_MAX_DURATION_MS, DEFAULT_MIN_DURATION_MS};

pub const DEFAULT_SECONDS_PER_WORD: f64 = 0.5;
pub const DEFAULT_IMAGE_DWELL_MS: u64 = 1500;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("seconds per word must be a finite, non-negative number (got {0})")]
    InvalidRate(f64),
    #[error("minimum duration {min_ms}ms exceeds maximum {max_ms}ms")]
    InvertedBounds { min_ms: u64, max_ms: u64 },
}

/// Process-wide presentation settings. Fields only change through the
/// explicit setters below, which keep them valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    debug_mode: bool,
    seconds_per_word: f64,
    min_duration_ms: u64,
    max_duration_ms: u64,
    image_dwell_ms: u64,
    highlight_words: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_mode: false,
            seconds_per_word: DEFAULT_SECONDS_PER_WORD,
            min_duration_ms: DEFAULT_MIN_DURATION_MS,
            max_duration_ms: DEFAULT_MAX_DURATION_MS,
            image_dwell_ms: DEFAULT_IMAGE_DWELL_MS,
            highlight_words: true,
        }
    }
}

impl Settings {
    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn seconds_per_word(&self) -> f64 {
        self.seconds_per_word
    }

    pub fn bounds(&self) -> DurationBounds {
        DurationBounds::from_millis(self.min_duration_ms, self.max_duration_ms)
    }

    pub fn image_dwell(&self) -> Duration {
        Duration::from_millis(self.image_dwell_ms)
    }

    pub fn highlight_words(&self) -> bool {
        self.highlight_words
    }

    /// Flips debug mode and returns the new value.
    pub fn toggle_debug_mode(&mut self) -> bool {
        self.debug_mode = !self.debug_mode;
        self.debug_mode
    }

    pub fn set_debug_mode(&mut self, on: bool) {
        self.debug_mode = on;
    }

    pub fn set_seconds_per_word(&mut self, rate: f64) -> Result<(), SettingsError> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(SettingsError::InvalidRate(rate));
        }
        self.seconds_per_word = rate;
        Ok(())
    }

    pub fn set_duration_bounds(&mut self, min_ms: u64, max_ms: u64) -> Result<(), SettingsError> {
        if min_ms > max_ms {
            return Err(SettingsError::InvertedBounds { min_ms, max_ms });
        }
        self.min_duration_ms = min_ms;
        self.max_duration_ms = max_ms;
        Ok(())
    }

    pub fn set_image_dwell(&mut self, dwell_ms: u64) {
        self.image_dwell_ms = dwell_ms;
    }

    pub fn set_highlight_words(&mut self, on: bool) {
        self.highlight_words = on;
    }

    /// Hand-edited files can hold values the setters would refuse; fall back
    /// to the defaults for those fields.
    fn sanitized(mut self) -> Self {
        let defaults = Settings::default();
        if !self.seconds_per_word.is_finite() || self.seconds_per_word < 0.0 {
            log::warn!(
                "ignoring stored seconds_per_word {}, using {}",
                self.seconds_per_word,
                defaults.seconds_per_word
            );
            self.seconds_per_word = defaults.seconds_per_word;
        }
        if self.min_duration_ms > self.max_duration_ms {
            log::warn!(
                "ignoring stored bounds {}..{}ms",
                self.min_duration_ms,
                self.max_duration_ms
            );
            self.min_duration_ms = defaults.min_duration_ms;
            self.max_duration_ms = defaults.max_duration_ms;
        }
        self
    }
}

pub trait SettingsStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::settings_path().unwrap_or_else(|| PathBuf::from("flashbrain_settings.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Settings {
        let Ok(bytes) = fs::read(&self.path) else {
            return Settings::default();
        };
        match serde_json::from_slice::<Settings>(&bytes) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("unreadable settings at {}: {e}", self.path.display());
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
