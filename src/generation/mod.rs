//! Round generation - (category, letter) combinations and their scores
//!
//! - [`CombinationGenerator`]: pick → validate → retry → fallback
//! - [`RoundRegistry`]: named round configurations
//! - [`scoring`]: difficulty and playability formulas
//! - [`RoundSeed`] / [`derive_seed`]: reproducible seeds from one root

pub mod combination;
pub mod rounds;
pub mod scoring;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::categories::Category;
use crate::letters::LetterStrategy;

pub use combination::{CombinationGenerator, HistoryEntry};
pub use rounds::{RoundConfig, RoundConfigError, RoundRegistry, ScoringConfig};

// ============================================================================
// Seeds
// ============================================================================

/// Root seed for a session. Every round and component seed derives from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSeed {
    pub seed: u64,
}

impl Default for RoundSeed {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl RoundSeed {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Deterministic per-round hash from the root seed and round index
    pub fn round_hash(&self, round_index: u64) -> u64 {
        let mut hasher = Sha3_256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(round_index.to_le_bytes());
        first_u64(&hasher.finalize())
    }
}

/// Seed for a named component (`"categories"`, `"letters"`, ...) of a root seed
pub fn derive_seed(root: u64, label: &str) -> u64 {
    let mut hasher = Sha3_256::new();
    hasher.update(root.to_le_bytes());
    hasher.update(label.as_bytes());
    first_u64(&hasher.finalize())
}

fn first_u64(digest: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

// ============================================================================
// Results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationType {
    Advanced,
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playability {
    /// 0-10
    pub score: f64,
    pub estimated_words: u32,
    /// 1-10
    pub difficulty: f64,
    pub feasible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinationMetadata {
    pub generation_type: GenerationType,
    /// Set when every attempt failed and the safe default was returned
    pub fallback: bool,
    pub attempts: u32,
    pub round_type: String,
    pub generated_at: DateTime<Utc>,
    pub generation_time_us: u64,
}

/// One round's (category, starting letter) with derived scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combination {
    pub category: Arc<Category>,
    pub letter: char,
    pub difficulty: f64,
    pub playability: Playability,
    pub round_config: RoundConfig,
    pub metadata: CombinationMetadata,
}

impl Combination {
    pub fn is_fallback(&self) -> bool {
        self.metadata.fallback
    }
}

// ============================================================================
// Options & stats
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationOptions {
    /// 1-5. Biases category choice (widening by one per retry) and letter weights.
    pub target_difficulty: Option<u8>,
    pub exclude_letters: BTreeSet<char>,
    pub exclude_categories: BTreeSet<String>,
    pub strategy: Option<LetterStrategy>,
    /// Skip categories and letters used in the last N rounds
    pub avoid_recent: usize,
    /// Batch only: no two results share a category
    pub ensure_unique: bool,
}

impl GenerationOptions {
    pub fn with_target_difficulty(mut self, difficulty: u8) -> Self {
        self.target_difficulty = Some(difficulty);
        self
    }

    pub fn excluding_letters(mut self, letters: impl IntoIterator<Item = char>) -> Self {
        self.exclude_letters.extend(letters);
        self
    }

    pub fn excluding_categories<S: Into<String>>(
        mut self,
        ids: impl IntoIterator<Item = S>,
    ) -> Self {
        self.exclude_categories.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_strategy(mut self, strategy: LetterStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn avoiding_recent(mut self, rounds: usize) -> Self {
        self.avoid_recent = rounds;
        self
    }

    pub fn unique(mut self) -> Self {
        self.ensure_unique = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub total_generated: u64,
    pub successful: u64,
    pub fallbacks: u64,
    pub legacy: u64,
    pub total_attempts: u64,
    pub success_rate: f64,
    pub total_time_us: u64,
    pub average_generation_time_us: f64,
    /// Rounded difficulty score → count
    pub difficulty_distribution: BTreeMap<u8, u64>,
    pub playability_sum: f64,
    pub average_playability: f64,
}

impl GenerationStats {
    fn record(&mut self, combination: &Combination) {
        self.total_generated += 1;
        if combination.metadata.fallback {
            self.fallbacks += 1;
        } else {
            self.successful += 1;
        }
        if combination.metadata.generation_type == GenerationType::Legacy {
            self.legacy += 1;
        }
        self.total_attempts += combination.metadata.attempts as u64;
        self.total_time_us += combination.metadata.generation_time_us;
        *self
            .difficulty_distribution
            .entry(combination.difficulty.round() as u8)
            .or_default() += 1;
        self.playability_sum += combination.playability.score;
    }

    fn summarized(&self) -> Self {
        let mut stats = self.clone();
        if stats.total_generated > 0 {
            let total = stats.total_generated as f64;
            stats.success_rate = stats.successful as f64 / total;
            stats.average_generation_time_us = stats.total_time_us as f64 / total;
            stats.average_playability = stats.playability_sum / total;
        }
        stats
    }
}
