//! Configuration for the memory optimiser
//!
//! [`OptimizationConfig`] is what the loop runs on. [`Settings`] is the
//! on-disk TOML form it is built from, before CLI overrides are applied.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::snapshot::MemorySnapshot;

pub const DEFAULT_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 75.0;
pub const DEFAULT_AUTO_OPTIMISE: bool = false;

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("interval must be a positive number of seconds, got {0}")]
    InvalidInterval(u64),

    #[error("threshold must be in (0, 100], got {0}")]
    InvalidThreshold(f64),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// How a tick's reading compares with the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Normal,
    OverThreshold,
}

/// Loop configuration, fixed for the lifetime of the loop
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationConfig {
    /// Seconds slept between ticks
    pub interval_secs: u64,
    /// Usage percentage at or above which a tick acts (0-100]
    pub threshold_percent: f64,
    /// Purge automatically instead of only notifying
    pub auto_optimise: bool,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
            auto_optimise: DEFAULT_AUTO_OPTIMISE,
        }
    }
}

impl OptimizationConfig {
    /// Build a validated config.
    pub fn new(
        interval_secs: u64,
        threshold_percent: f64,
        auto_optimise: bool,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            interval_secs,
            threshold_percent,
            auto_optimise,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidInterval(self.interval_secs));
        }
        // NaN fails both comparisons and is rejected here too
        if !(self.threshold_percent > 0.0 && self.threshold_percent <= 100.0) {
            return Err(ConfigError::InvalidThreshold(self.threshold_percent));
        }
        Ok(())
    }

    /// Inclusive comparison: a reading equal to the threshold is over it.
    pub fn classify(&self, snapshot: &MemorySnapshot) -> Classification {
        if snapshot.percent_used >= self.threshold_percent {
            Classification::OverThreshold
        } else {
            Classification::Normal
        }
    }

    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs)
    }
}

/// How the purge command obtains privileges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Elevation {
    /// Prefix with `sudo`, prompting on the terminal if needed
    Sudo,
    /// macOS administrator password dialog via AppleScript
    AdminDialog,
}

/// `[monitor]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub interval_secs: u64,
    pub threshold_percent: f64,
    pub auto_optimise: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
            auto_optimise: DEFAULT_AUTO_OPTIMISE,
        }
    }
}

/// `[reclaim]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReclaimSettings {
    pub elevation: Elevation,
    /// Full argv replacing the host's default purge command
    pub command: Option<Vec<String>>,
}

impl Default for ReclaimSettings {
    fn default() -> Self {
        Self {
            elevation: Elevation::Sudo,
            command: None,
        }
    }
}

/// `[notify]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    /// Use the desktop notification mechanism; log only when false
    pub desktop: bool,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self { desktop: true }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    pub log_dir: PathBuf,
    /// Also write `memory_optimiser.log` into `log_dir`
    pub file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
            file: true,
        }
    }
}

/// Everything that can be set from the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub monitor: MonitorSettings,
    pub reclaim: ReclaimSettings,
    pub notify: NotifySettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Save settings to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<config dir>/memory-optimiser/config.toml`, if the host has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("memory-optimiser").join("config.toml"))
    }

    /// Validated loop configuration from the `[monitor]` section
    pub fn optimization_config(&self) -> Result<OptimizationConfig, ConfigError> {
        OptimizationConfig::new(
            self.monitor.interval_secs,
            self.monitor.threshold_percent,
            self.monitor.auto_optimise,
        )
    }
}
