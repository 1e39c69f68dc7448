//! Simulation configuration
//!
//! JSON file consumed by `maekawa simulate`. Every field is optional; a
//! missing field takes the default shown by `maekawa init`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::{ProtocolConfig, VoteThreshold};
use crate::quorum::GridRounding;
use crate::scheduler::{Eligibility, SchedulerConfig};

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to write config {path}: {message}")]
    Write { path: String, message: String },

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Name of the process group
    #[serde(default = "default_group_name")]
    pub group_name: String,

    /// Number of processes to start
    #[serde(default = "default_members")]
    pub members: usize,

    /// Scheduler tick
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Random delay added to each tick, up to this bound
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Time spent inside the critical section
    #[serde(default = "default_critical_section_ms")]
    pub critical_section_ms: u64,

    #[serde(default)]
    pub eligibility: Eligibility,

    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,

    /// Audit trail, appended to if it exists
    #[serde(default = "default_audit_path")]
    pub audit_path: PathBuf,

    #[serde(default)]
    pub rounding: GridRounding,

    #[serde(default)]
    pub threshold: VoteThreshold,

    /// Abandon a request after this long; `null` waits forever
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: Option<u64>,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Probability that the in-process network drops a frame
    #[serde(default)]
    pub drop_rate: f64,

    /// Seed for frame loss and scheduler jitter
    #[serde(default)]
    pub seed: Option<u64>,

    /// Run time before every process shuts down
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
}

fn default_group_name() -> String {
    "maekawa".to_string()
}
fn default_members() -> usize {
    5
}
fn default_interval_ms() -> u64 {
    1000
}
fn default_jitter_ms() -> u64 {
    200
}
fn default_critical_section_ms() -> u64 {
    300
}
fn default_min_group_size() -> usize {
    4
}
fn default_audit_path() -> PathBuf {
    PathBuf::from("operacoes-criticas.txt")
}
fn default_request_timeout_ms() -> Option<u64> {
    Some(3000)
}
fn default_retry_backoff_ms() -> u64 {
    500
}
fn default_duration_secs() -> u64 {
    10
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            group_name: default_group_name(),
            members: default_members(),
            interval_ms: default_interval_ms(),
            jitter_ms: default_jitter_ms(),
            critical_section_ms: default_critical_section_ms(),
            eligibility: Eligibility::default(),
            min_group_size: default_min_group_size(),
            audit_path: default_audit_path(),
            rounding: GridRounding::default(),
            threshold: VoteThreshold::default(),
            request_timeout_ms: default_request_timeout_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            drop_rate: 0.0,
            seed: None,
            duration_secs: default_duration_secs(),
        }
    }
}

impl SimulationConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config: SimulationConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Write this configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let write_error = |message: String| ConfigError::Write {
            path: path.display().to_string(),
            message,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| write_error(e.to_string()))?;
        fs::write(path, json + "\n").map_err(|e| write_error(e.to_string()))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.members == 0 {
            return Err(ConfigError::Invalid("members must be > 0".into()));
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::Invalid("interval_ms must be > 0".into()));
        }
        if self.duration_secs == 0 {
            return Err(ConfigError::Invalid("duration_secs must be > 0".into()));
        }
        if self.request_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be > 0 or null".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.drop_rate) {
            return Err(ConfigError::Invalid(format!(
                "drop_rate must be in [0, 1), got {}",
                self.drop_rate
            )));
        }
        // A lost grant or release with no timeout blocks the requester forever.
        if self.drop_rate > 0.0 && self.request_timeout_ms.is_none() {
            return Err(ConfigError::Invalid(
                "drop_rate > 0 requires request_timeout_ms".into(),
            ));
        }

        Ok(())
    }

    pub fn to_protocol_config(&self) -> ProtocolConfig {
        let config = ProtocolConfig::new()
            .with_rounding(self.rounding)
            .with_threshold(self.threshold);
        match self.request_timeout_ms {
            Some(ms) => config.with_request_timeout(Duration::from_millis(ms)),
            None => config,
        }
    }

    pub fn to_scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new()
            .with_interval(Duration::from_millis(self.interval_ms))
            .with_jitter(Duration::from_millis(self.jitter_ms))
            .with_eligibility(self.eligibility)
            .with_min_group_size(self.min_group_size)
            .with_retry_backoff(Duration::from_millis(self.retry_backoff_ms))
    }

    pub fn critical_section(&self) -> Duration {
        Duration::from_millis(self.critical_section_ms)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}
