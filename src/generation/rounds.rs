//! Round configurations: duration, difficulty, target word count, scoring

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::constants::{
    CHALLENGE_ROUND, DEFAULT_ROUND, MAX_CATEGORY_DIFFICULTY, MIN_CATEGORY_DIFFICULTY, QUICK_ROUND,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringConfig {
    pub base_points: u32,
    /// Extra points per rarity point of the round letter
    pub rarity_bonus: f64,
    pub time_bonus_per_second: f64,
    pub streak_multiplier: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_points: 10,
            rarity_bonus: 0.5,
            time_bonus_per_second: 0.1,
            streak_multiplier: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundConfig {
    pub name: String,
    #[serde(rename = "duration")]
    pub duration_secs: u32,
    pub difficulty: u8,
    pub target_word_count: u32,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl RoundConfig {
    pub fn default_round() -> Self {
        Self {
            name: DEFAULT_ROUND.into(),
            duration_secs: 90,
            difficulty: 2,
            target_word_count: 5,
            scoring: ScoringConfig::default(),
        }
    }

    pub fn quick_round() -> Self {
        Self {
            name: QUICK_ROUND.into(),
            duration_secs: 45,
            difficulty: 2,
            target_word_count: 3,
            scoring: ScoringConfig {
                time_bonus_per_second: 0.2,
                ..Default::default()
            },
        }
    }

    pub fn challenge_round() -> Self {
        Self {
            name: CHALLENGE_ROUND.into(),
            duration_secs: 120,
            difficulty: 4,
            target_word_count: 8,
            scoring: ScoringConfig {
                base_points: 15,
                rarity_bonus: 1.0,
                time_bonus_per_second: 0.1,
                streak_multiplier: 2.0,
            },
        }
    }

    pub fn validate(&self) -> Result<(), RoundConfigError> {
        if self.name.trim().is_empty() {
            return Err(RoundConfigError::EmptyName);
        }
        if self.duration_secs == 0 {
            return Err(RoundConfigError::InvalidDuration(self.name.clone()));
        }
        if !(MIN_CATEGORY_DIFFICULTY..=MAX_CATEGORY_DIFFICULTY).contains(&self.difficulty) {
            return Err(RoundConfigError::DifficultyOutOfRange {
                name: self.name.clone(),
                difficulty: self.difficulty,
            });
        }
        if self.target_word_count == 0 {
            return Err(RoundConfigError::InvalidTargetWordCount(self.name.clone()));
        }

        let scoring = &self.scoring;
        let multipliers = [
            scoring.rarity_bonus,
            scoring.time_bonus_per_second,
            scoring.streak_multiplier,
        ];
        if multipliers.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(RoundConfigError::InvalidScoring(self.name.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoundConfigError {
    #[error("Round config has an empty name")]
    EmptyName,
    #[error("Round {0} must last longer than zero seconds")]
    InvalidDuration(String),
    #[error("Round {name} difficulty {difficulty} outside 1-5")]
    DifficultyOutOfRange { name: String, difficulty: u8 },
    #[error("Round {0} needs a target word count above zero")]
    InvalidTargetWordCount(String),
    #[error("Round {0} has negative or non-finite scoring values")]
    InvalidScoring(String),
    #[error("Round config JSON error: {0}")]
    Json(String),
}

/// Named round configs. Lookups of unknown names resolve to `default`.
#[derive(Debug, Clone)]
pub struct RoundRegistry {
    default: RoundConfig,
    configs: BTreeMap<String, RoundConfig>,
}

impl Default for RoundRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RoundRegistry {
    pub fn builtin() -> Self {
        let default = RoundConfig::default_round();
        let configs = [
            default.clone(),
            RoundConfig::quick_round(),
            RoundConfig::challenge_round(),
        ]
        .into_iter()
        .map(|c| (c.name.clone(), c))
        .collect();
        Self { default, configs }
    }

    pub fn get(&self, name: &str) -> &RoundConfig {
        self.configs.get(name.trim()).unwrap_or(&self.default)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.configs.contains_key(name.trim())
    }

    pub fn all(&self) -> Vec<RoundConfig> {
        self.configs.values().cloned().collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.configs.keys().map(String::as_str).collect()
    }

    /// Register or replace a config. The `name` argument overrides `config.name`.
    pub fn add(&mut self, name: &str, mut config: RoundConfig) -> Result<(), RoundConfigError> {
        config.name = name.trim().to_string();
        config.validate()?;

        if config.name == DEFAULT_ROUND {
            self.default = config.clone();
        }
        self.configs.insert(config.name.clone(), config);
        Ok(())
    }

    /// Merge a JSON array of configs. Invalid entries are skipped.
    /// Returns how many were added.
    pub fn merge_json(&mut self, json: &str) -> Result<usize, RoundConfigError> {
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(json).map_err(|e| RoundConfigError::Json(e.to_string()))?;

        let mut added = 0;
        for (index, value) in raw.into_iter().enumerate() {
            let result = serde_json::from_value::<RoundConfig>(value)
                .map_err(|e| RoundConfigError::Json(e.to_string()))
                .and_then(|config| {
                    let name = config.name.clone();
                    self.add(&name, config)
                });
            match result {
                Ok(()) => added += 1,
                Err(e) => warn!(index, error = %e, "Skipping invalid round config"),
            }
        }

        info!(added, total = self.configs.len(), "Merged round configs");
        Ok(added)
    }
}
