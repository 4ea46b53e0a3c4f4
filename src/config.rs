use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::measurement::memory::MEMINFO_PATH;
use crate::scheduler::{SchedulerOptions, DEFAULT_PUBLISH_WINDOW};

// ─── Errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ─── Config types ────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Milliseconds between two measurements
    #[serde(default = "default_interval_ms")]
    pub measurement_interval_ms: u64,

    /// Measurement ticks per published snapshot
    #[serde(default = "default_publish_window")]
    pub publish_window: u64,

    #[serde(default)]
    pub memory: SourceConfig,

    #[serde(default)]
    pub cpu: SourceConfig,

    #[serde(default = "default_meminfo_path")]
    pub meminfo_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Name the snapshots are published under; each source has its own
    /// default
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            name: None,
        }
    }
}

pub const DEFAULT_MEMORY_NAME: &str = "memory_percent_used";
pub const DEFAULT_CPU_NAME: &str = "cpu_percent_used";

fn default_interval_ms() -> u64 {
    1_000
}
fn default_publish_window() -> u64 {
    DEFAULT_PUBLISH_WINDOW
}
fn default_enabled() -> bool {
    true
}
fn default_meminfo_path() -> PathBuf {
    MEMINFO_PATH.into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            measurement_interval_ms: default_interval_ms(),
            publish_window: default_publish_window(),
            memory: SourceConfig::default(),
            cpu: SourceConfig::default(),
            meminfo_path: default_meminfo_path(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.measurement_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "measurement_interval_ms must be at least 1".into(),
            ));
        }
        if self.publish_window == 0 {
            return Err(ConfigError::Invalid(
                "publish_window must be at least 1".into(),
            ));
        }
        for source in [&self.memory, &self.cpu] {
            let blank = source.name.as_deref().is_some_and(|n| n.trim().is_empty());
            if source.enabled && blank {
                return Err(ConfigError::Invalid(
                    "enabled sources need a non-empty name".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn memory_name(&self) -> &str {
        self.memory.name.as_deref().unwrap_or(DEFAULT_MEMORY_NAME)
    }

    pub fn cpu_name(&self) -> &str {
        self.cpu.name.as_deref().unwrap_or(DEFAULT_CPU_NAME)
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            measurement_interval: Duration::from_millis(self.measurement_interval_ms),
            publish_window: self.publish_window,
        }
    }
}

// ─── Loading ─────────────────────────────────────────────────────

/// Parse and validate a JSON config document.
pub fn from_json(path: &Path, text: &str) -> Result<AgentConfig, ConfigError> {
    let config: AgentConfig =
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

/// Load from a JSON file, or fall back to defaults when no path is given.
pub fn load(path: Option<&Path>) -> Result<AgentConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(AgentConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;
    from_json(path, &text)
}
