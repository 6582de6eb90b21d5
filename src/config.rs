//! Configuration for STS
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, StsError};

/// Default number of operational log lines kept for replay
pub const DEFAULT_LOG_CAPACITY: usize = 10_000;

/// Default interval between session reconciliation passes
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(10);

/// Main configuration for an STS instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Application data directory holding one snapshot file per sensor
    /// Internal structure:
    ///   {app_dir}/
    ///     ├── last_reading.json                 (sentinel sensor)
    ///     └── {id}_{name}_last_reading.json
    pub app_dir: PathBuf,

    /// Long-term storage directory holding the durable logs
    /// Internal structure:
    ///   {lts_dir}/
    ///     ├── 2_stored_readings.sts   (current format version)
    ///     └── corrupt/                (quarantined logs)
    pub lts_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Operational Log Configuration
    // -------------------------------------------------------------------------
    /// Max lines kept in the operational log backlog
    pub log_capacity: usize,

    /// How often inactive dashboard sessions are reconciled
    pub reconcile_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_dir: PathBuf::from("./sts_data/app"),
            lts_dir: PathBuf::from("./sts_data/lts"),
            log_capacity: DEFAULT_LOG_CAPACITY,
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.log_capacity == 0 {
            return Err(StsError::Config(
                "log_capacity must be greater than zero".to_string(),
            ));
        }
        if self.reconcile_interval.is_zero() {
            return Err(StsError::Config(
                "reconcile_interval must be greater than zero".to_string(),
            ));
        }
        if self.app_dir.as_os_str().is_empty() || self.lts_dir.as_os_str().is_empty() {
            return Err(StsError::Config(
                "app_dir and lts_dir must be set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Place both storage directories under one root (`app/` and `lts/`)
    pub fn data_dir(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.config.app_dir = root.join("app");
        self.config.lts_dir = root.join("lts");
        self
    }

    /// Set the snapshot directory
    pub fn app_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.app_dir = path.into();
        self
    }

    /// Set the long-term storage directory
    pub fn lts_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.lts_dir = path.into();
        self
    }

    /// Set the operational log capacity (in lines)
    pub fn log_capacity(mut self, lines: usize) -> Self {
        self.config.log_capacity = lines;
        self
    }

    /// Set the session reconciliation interval
    pub fn reconcile_interval(mut self, interval: Duration) -> Self {
        self.config.reconcile_interval = interval;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
