//! Coordinator configuration, loadable from JSON.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_MAX_ITERATIONS: u64 = 10_000;

/// Environment variable overriding `max_iterations_for_final_state`.
pub const MAX_ITERATIONS_ENV: &str = "LIFE_MAX_ITERATIONS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Where arbitrary-generation lookups start computing from on a cache miss.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPolicy {
    /// Always recompute from generation 0.
    #[default]
    Origin,
    /// Start from the highest cached generation at or below the target.
    NearestCached,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LifeConfig {
    /// Upper bound on generations explored by a final-state search.
    pub max_iterations_for_final_state: u64,
    pub anchor_policy: AnchorPolicy,
    /// Deadline for async final-state searches; `None` waits indefinitely.
    pub final_state_timeout_ms: Option<u64>,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            max_iterations_for_final_state: DEFAULT_MAX_ITERATIONS,
            anchor_policy: AnchorPolicy::Origin,
            final_state_timeout_ms: None,
        }
    }
}

impl LifeConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)?.with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(std::env::var(MAX_ITERATIONS_ENV).ok().as_deref())
    }

    fn with_overrides(mut self, max_iterations: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(raw) = max_iterations {
            self.max_iterations_for_final_state = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{MAX_ITERATIONS_ENV} is not a number: {raw:?}"))
            })?;
            log::debug!(
                "max_iterations_for_final_state overridden to {}",
                self.max_iterations_for_final_state
            );
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations_for_final_state == 0 {
            return Err(ConfigError::Invalid(
                "max_iterations_for_final_state must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn final_state_timeout(&self) -> Option<Duration> {
        self.final_state_timeout_ms.map(Duration::from_millis)
    }
}
