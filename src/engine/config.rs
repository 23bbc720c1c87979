use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::cache::CacheProfile;
use crate::constants::{
    DEFAULT_HISTORY_SIZE, DEFAULT_INIT_TIMEOUT_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_ROUND,
    DEFAULT_SWEEP_INTERVAL_MS, MAX_ATTEMPTS_CEILING,
};
use crate::logging::TracingConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root seed. `None` draws one from the OS at startup.
    pub seed: Option<u64>,
    pub max_attempts: u32,
    pub history_size: usize,
    pub default_round: String,
    pub category_cache: CacheProfile,
    pub letter_cache: CacheProfile,
    pub init_timeout_ms: u64,
    pub sweep_interval_ms: u64,
    pub tracing: TracingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            history_size: DEFAULT_HISTORY_SIZE,
            default_round: DEFAULT_ROUND.into(),
            category_cache: CacheProfile::categories(),
            letter_cache: CacheProfile::letter_weights(),
            init_timeout_ms: DEFAULT_INIT_TIMEOUT_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            tracing: TracingConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON config error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RON config error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_ATTEMPTS_CEILING).contains(&self.max_attempts) {
            return Err(ConfigError::Invalid(format!(
                "max_attempts {} outside 1-{}",
                self.max_attempts, MAX_ATTEMPTS_CEILING
            )));
        }
        if self.history_size == 0 {
            return Err(ConfigError::Invalid("history_size must be positive".into()));
        }
        if self.default_round.trim().is_empty() {
            return Err(ConfigError::Invalid("default_round is empty".into()));
        }
        for (name, profile) in [
            ("category_cache", &self.category_cache),
            ("letter_cache", &self.letter_cache),
        ] {
            if profile.ttl_ms == 0 || profile.max_size == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} needs a positive ttl and size"
                )));
            }
        }
        if self.init_timeout_ms == 0 {
            return Err(ConfigError::Invalid("init_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Format chosen by extension: `.json` or `.ron`
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&source),
            Some("ron") => Self::from_ron(&source),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Configured seed, or a fresh random one
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}
