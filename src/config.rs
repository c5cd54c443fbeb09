//! Configuration for recording and playback
//!
//! Settings come from a TOML file and/or named options in the
//! `name=value` form used on the command line:
//!
//! | Option | Field | Default |
//! |--------|-------|---------|
//! | `record` | `record.path` | none (recording off) |
//! | `record-stdout` | `record.stdout` | `false` |
//! | `record-rawlight` | `record.rawlight` | `true` |
//! | `record-imu` | `record.imu` | `true` |
//! | `record-cal-imu` | `record.cal-imu` | `false` |
//! | `record-angle` | `record.angle` | `true` |
//! | `playback` | `playback.path` | none |
//! | `playback-factor` | `playback.factor` | `1.0` |
//! | `playback-replay-pose` | `playback.replay-pose` | `false` |

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SmritiConfig {
    pub record: RecordConfig,
    pub playback: PlaybackConfig,
}

/// Recording configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RecordConfig {
    /// Capture file; a `.gz` suffix selects compression
    pub path: Option<PathBuf>,
    /// Echo every recorded line to stdout
    pub stdout: bool,
    /// Record raw lightcap pulses
    pub rawlight: bool,
    /// Record uncalibrated IMU samples
    pub imu: bool,
    /// Record calibrated IMU samples
    pub cal_imu: bool,
    /// Record angle and light-code observations
    pub angle: bool,
}

impl RecordConfig {
    /// Whether the capture file is written gzip-compressed.
    pub fn compressed(&self) -> bool {
        self.path
            .as_ref()
            .and_then(|path| path.to_str())
            .is_some_and(|path| path.ends_with(".gz"))
    }

    /// Whether any sink is configured.
    pub fn is_enabled(&self) -> bool {
        self.path.is_some() || self.stdout
    }
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            path: None,
            stdout: false,
            rawlight: true,
            imu: true,
            cal_imu: false,
            angle: true,
        }
    }
}

/// Playback configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PlaybackConfig {
    /// Capture to replay (plain or gzip)
    pub path: Option<PathBuf>,
    /// Time factor: 1.0 replays at recorded speed, 0.0 as fast as possible
    pub factor: f64,
    /// Replay recorded `POSE` lines as external poses
    pub replay_pose: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            path: None,
            factor: 1.0,
            replay_pose: false,
        }
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> Error {
    Error::InvalidOption {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(invalid(name, format!("expected a boolean, got '{}'", other))),
    }
}

fn parse_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    (!value.is_empty()).then(|| PathBuf::from(value))
}

fn check_factor(name: &str, factor: f64) -> Result<f64> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(invalid(name, "must be a non-negative number"));
    }
    Ok(factor)
}

/// Parse a playback factor; must be finite and not negative.
pub fn parse_factor(name: &str, value: &str) -> Result<f64> {
    let factor: f64 = value
        .trim()
        .parse()
        .map_err(|_| invalid(name, format!("expected a number, got '{}'", value)))?;
    check_factor(name, factor)
}

impl SmritiConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use smriti::config::SmritiConfig;
    ///
    /// let config = SmritiConfig::from_file("smriti.toml")?;
    /// # Ok::<(), smriti::Error>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: SmritiConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        check_factor("playback.factor", self.playback.factor)?;
        Ok(())
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Apply one named option.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "record" => self.record.path = parse_path(value),
            "record-stdout" => self.record.stdout = parse_bool(name, value)?,
            "record-rawlight" => self.record.rawlight = parse_bool(name, value)?,
            "record-imu" => self.record.imu = parse_bool(name, value)?,
            "record-cal-imu" => self.record.cal_imu = parse_bool(name, value)?,
            "record-angle" => self.record.angle = parse_bool(name, value)?,
            "playback" => self.playback.path = parse_path(value),
            "playback-factor" => self.playback.factor = parse_factor(name, value)?,
            "playback-replay-pose" => self.playback.replay_pose = parse_bool(name, value)?,
            _ => return Err(invalid(name, "unknown option")),
        }
        Ok(())
    }

    /// Apply an option written as `name=value`.
    ///
    /// A bare `name` sets a boolean option to true.
    pub fn apply(&mut self, assignment: &str) -> Result<()> {
        match assignment.split_once('=') {
            Some((name, value)) => self.set_option(name.trim(), value),
            None => self.set_option(assignment.trim(), "1"),
        }
    }
}
