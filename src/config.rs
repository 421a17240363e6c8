// Runtime configuration loaded from TOML
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::evaluator::EvaluatorConfig;
use crate::ipc::anomaly_log::DEFAULT_LOG_PATH;
use crate::sensor::anomaly::DEFAULT_THRESHOLD;
use crate::sensor::generator::TimestampMode;
use crate::sensor::window::DEFAULT_WINDOW_CAPACITY;

pub const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub scoring: ScoringConfig,
    pub stream: StreamConfig,
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub threshold: f64,
    pub model_dir: PathBuf,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            model_dir: PathBuf::from("models"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub window_capacity: usize,
    pub tick_interval_ms: u64,
    pub log_path: PathBuf,
    pub event_buffer: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            tick_interval_ms: 500,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            event_buffer: 256,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub seed: u64,
    pub timestamps: TimestampMode,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { seed: 42, timestamps: TimestampMode::WallClock }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream.window_capacity == 0 {
            return Err(ConfigError::Invalid("stream.window_capacity must be at least 1".into()));
        }
        if self.stream.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("stream.tick_interval_ms must be positive".into()));
        }
        if self.stream.event_buffer == 0 {
            return Err(ConfigError::Invalid("stream.event_buffer must be at least 1".into()));
        }
        if !self.scoring.threshold.is_finite() || self.scoring.threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "scoring.threshold must be finite and non-negative, got {}",
                self.scoring.threshold
            )));
        }
        Ok(())
    }

    pub fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig { window_capacity: self.stream.window_capacity }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.stream.tick_interval_ms)
    }
}

/// Missing file means defaults; an unreadable or malformed file is an error.
pub fn load_config(path: impl AsRef<Path>) -> Result<MonitorConfig, ConfigError> {
    let path = path.as_ref();
    let cfg = match std::fs::read_to_string(path) {
        Ok(s) => toml::from_str::<MonitorConfig>(&s).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            MonitorConfig::default()
        }
        Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
    };
    cfg.validate()?;
    Ok(cfg)
}
