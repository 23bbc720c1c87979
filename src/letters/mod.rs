//! Letter Generator - weighted starting-letter selection
//!
//! Draws a letter A-Z from the frequency table using a strategy:
//! - `random`: uniform over candidates
//! - `balanced`: frequency-weighted, vowel share pinned to a target ratio
//! - `challenging`: weight `1 + rarity`, favors Q/X/Z
//! - `frequency`: raw table weights
//!
//! Difficulty flattens (and at 5 inverts) the frequency curve. Each draw is a
//! single cumulative-distribution lookup; distributions are memoized in an
//! [`IntelligentCache`] keyed by strategy and candidate set.

pub mod frequency;

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::cache::{CacheProfile, CacheStats, IntelligentCache, SharedClock, Sweepable, SystemClock};
use crate::categories::CategoryProvider;
use crate::constants::{
    ALPHABET, DIFFICULTY_EXPONENT_STEP, MAX_CATEGORY_DIFFICULTY, MIN_CATEGORY_DIFFICULTY,
    PREFERRED_VOWEL_RATIO, PREFER_VOWEL_BOOST, VOWELS, VOWEL_TARGET_RATIO,
};
use crate::signals::{Signal, SignalBus};
use crate::storage::{keys, Storage};

pub use frequency::{FrequencyTableError, LetterDistribution, LetterFrequencyTable};

/// Letter selection strategy. Unknown names parse as `Balanced`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterStrategy {
    Random,
    Challenging,
    Frequency,
    #[default]
    #[serde(other)]
    Balanced,
}

impl LetterStrategy {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "random" => LetterStrategy::Random,
            "challenging" => LetterStrategy::Challenging,
            "frequency" => LetterStrategy::Frequency,
            _ => LetterStrategy::Balanced,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LetterStrategy::Random => "random",
            LetterStrategy::Balanced => "balanced",
            LetterStrategy::Challenging => "challenging",
            LetterStrategy::Frequency => "frequency",
        }
    }
}

/// Per-call constraints for [`LetterGenerator::generate`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LetterOptions {
    /// 1-5, reshapes the frequency curve
    pub difficulty: Option<u8>,
    /// Never returned, unless that would leave no candidates
    pub exclude_letters: BTreeSet<char>,
    pub prefer_vowels: bool,
    /// Restrict candidates (category compatibility). `None` or empty means A-Z.
    pub allowed_letters: Option<BTreeSet<char>>,
}

impl LetterOptions {
    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn excluding(mut self, letters: impl IntoIterator<Item = char>) -> Self {
        self.exclude_letters.extend(letters);
        self
    }

    pub fn allowing(mut self, letters: impl IntoIterator<Item = char>) -> Self {
        self.allowed_letters = Some(letters.into_iter().collect());
        self
    }

    pub fn preferring_vowels(mut self) -> Self {
        self.prefer_vowels = true;
        self
    }
}

/// Running counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LetterStats {
    pub total_generated: u64,
    pub by_strategy: BTreeMap<String, u64>,
    pub by_letter: BTreeMap<char, u64>,
    pub vowels: u64,
    pub consonants: u64,
    /// Calls where every candidate was excluded and the exclusion was dropped
    pub exclusion_relaxed: u64,
    pub total_latency_us: u64,
    pub average_latency_us: f64,
}

impl LetterStats {
    pub fn vowel_ratio(&self) -> f64 {
        if self.total_generated == 0 {
            0.0
        } else {
            self.vowels as f64 / self.total_generated as f64
        }
    }
}

pub struct LetterGenerator {
    table: LetterFrequencyTable,
    rng: Xoshiro256PlusPlus,
    categories: Option<Arc<dyn CategoryProvider>>,
    cache: Mutex<IntelligentCache<String, Arc<LetterDistribution>>>,
    signals: Option<SignalBus>,
    stats: LetterStats,
}

impl LetterGenerator {
    /// Generator over the built-in frequency table
    pub fn new(seed: u64) -> Self {
        Self::with_table(LetterFrequencyTable::builtin(), seed)
    }

    pub fn with_table(table: LetterFrequencyTable, seed: u64) -> Self {
        Self {
            table,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            categories: None,
            cache: Mutex::new(IntelligentCache::new(
                CacheProfile::letter_weights(),
                Arc::new(SystemClock::new()),
            )),
            signals: None,
            stats: LetterStats::default(),
        }
    }

    /// Load a stored frequency table, bounded by `timeout`. Anything missing
    /// or invalid keeps the built-in table.
    pub async fn init(storage: Option<&dyn Storage>, seed: u64, timeout: Duration) -> Self {
        let Some(storage) = storage else {
            return Self::new(seed);
        };

        let table = match tokio::time::timeout(timeout, storage.load(keys::LETTER_FREQUENCIES)).await
        {
            Ok(Ok(Some(raw))) => match LetterFrequencyTable::from_json(&raw) {
                Ok(table) => {
                    info!("Loaded letter frequency table from storage");
                    table
                }
                Err(e) => {
                    warn!(error = %e, "Stored frequency table rejected, using built-in table");
                    LetterFrequencyTable::builtin()
                }
            },
            Ok(Ok(None)) => LetterFrequencyTable::builtin(),
            Ok(Err(e)) => {
                warn!(error = %e, "Frequency table load failed, using built-in table");
                LetterFrequencyTable::builtin()
            }
            Err(_) => {
                warn!("Frequency table load timed out, using built-in table");
                LetterFrequencyTable::builtin()
            }
        };
        Self::with_table(table, seed)
    }

    /// Optional category capability used by `generate_for_category`
    pub fn with_categories(mut self, provider: Arc<dyn CategoryProvider>) -> Self {
        self.categories = Some(provider);
        self
    }

    pub fn with_cache(mut self, profile: CacheProfile, clock: SharedClock) -> Self {
        self.cache = Mutex::new(IntelligentCache::new(profile, clock));
        self
    }

    pub fn with_signals(mut self, signals: SignalBus) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    }

    pub fn has_categories(&self) -> bool {
        self.categories.is_some()
    }

    // ========================================================================
    // Generation
    // ========================================================================

    pub fn generate(&mut self, strategy: LetterStrategy, options: &LetterOptions) -> char {
        let started = Instant::now();

        let base = candidate_base(options.allowed_letters.as_ref());
        let excluded: BTreeSet<char> = options
            .exclude_letters
            .iter()
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let mut candidates: Vec<char> = base
            .iter()
            .copied()
            .filter(|c| !excluded.contains(c))
            .collect();

        let relaxed = candidates.is_empty();
        if relaxed {
            warn!(
                strategy = strategy.as_str(),
                excluded = excluded.len(),
                "Every candidate letter excluded, ignoring exclusion for this draw"
            );
            candidates = base;
        }

        let difficulty = options
            .difficulty
            .map(|d| d.clamp(MIN_CATEGORY_DIFFICULTY, MAX_CATEGORY_DIFFICULTY));
        let distribution = self.distribution(strategy, difficulty, options.prefer_vowels, &candidates);
        let letter = match distribution {
            Some(dist) => dist.sample(&mut self.rng),
            None => candidates[self.rng.gen_range(0..candidates.len())],
        };

        self.record(strategy, letter, relaxed, started.elapsed());
        letter
    }

    /// Frequency-weighted draw, optionally reshaped by difficulty
    pub fn generate_by_frequency(&mut self, difficulty: Option<u8>) -> char {
        let options = LetterOptions {
            difficulty,
            ..Default::default()
        };
        self.generate(LetterStrategy::Frequency, &options)
    }

    pub fn generate_for_category(&mut self, category_id: &str) -> Option<char> {
        self.generate_for_category_with(category_id, LetterStrategy::Balanced, &LetterOptions::default())
    }

    /// Draw within the category's compatible letters. Unknown category or no
    /// category capability gives `None`.
    pub fn generate_for_category_with(
        &mut self,
        category_id: &str,
        strategy: LetterStrategy,
        options: &LetterOptions,
    ) -> Option<char> {
        let provider = self.categories.as_ref()?;
        let category = match provider.category(category_id) {
            Ok(Some(category)) => category,
            Ok(None) => {
                debug!(category_id, "No such category for letter generation");
                return None;
            }
            Err(e) => {
                warn!(category_id, error = %e, "Category provider failed during letter generation");
                return None;
            }
        };

        let mut options = options.clone();
        if !category.metadata.letter_compatibility.is_empty() {
            options.allowed_letters = Some(category.metadata.letter_compatibility.clone());
        }
        Some(self.generate(strategy, &options))
    }

    pub fn generate_vowel(&mut self) -> char {
        let options = LetterOptions::default().allowing(VOWELS);
        self.generate(LetterStrategy::Frequency, &options)
    }

    pub fn generate_consonant(&mut self) -> char {
        let options = LetterOptions::default().allowing(consonants());
        self.generate(LetterStrategy::Frequency, &options)
    }

    /// `min(n, 26)` distinct letters. With two or more, both vowels and
    /// consonants are present.
    pub fn generate_balanced_set(&mut self, n: usize) -> Vec<char> {
        let n = n.min(ALPHABET.len());
        match n {
            0 => return Vec::new(),
            1 => return vec![self.generate(LetterStrategy::Balanced, &LetterOptions::default())],
            _ => {}
        }

        let vowel_count = ((n as f64 * VOWEL_TARGET_RATIO).round() as usize)
            .clamp(1, (n - 1).min(VOWELS.len()));
        let consonant_count = n - vowel_count;

        let mut picked: Vec<char> = Vec::with_capacity(n);
        for _ in 0..vowel_count {
            let options = LetterOptions::default()
                .allowing(VOWELS)
                .excluding(picked.iter().copied());
            picked.push(self.generate(LetterStrategy::Frequency, &options));
        }
        for _ in 0..consonant_count {
            let options = LetterOptions::default()
                .allowing(consonants())
                .excluding(picked.iter().copied());
            picked.push(self.generate(LetterStrategy::Frequency, &options));
        }

        picked.shuffle(&mut self.rng);
        picked
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn is_vowel(letter: char) -> bool {
        VOWELS.contains(&letter.to_ascii_uppercase())
    }

    /// 0 (most common) to 10 (rarest); non-letters score 0
    pub fn get_letter_rarity_score(&self, letter: char) -> f64 {
        self.table.rarity(letter)
    }

    pub fn letter_weight(&self, letter: char) -> f64 {
        self.table.weight(letter)
    }

    pub fn frequency_table(&self) -> &LetterFrequencyTable {
        &self.table
    }

    pub fn get_stats(&self) -> LetterStats {
        let mut stats = self.stats.clone();
        stats.average_latency_us = if stats.total_generated == 0 {
            0.0
        } else {
            stats.total_latency_us as f64 / stats.total_generated as f64
        };
        stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = LetterStats::default();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().get_stats()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn distribution(
        &mut self,
        strategy: LetterStrategy,
        difficulty: Option<u8>,
        prefer_vowels: bool,
        candidates: &[char],
    ) -> Option<Arc<LetterDistribution>> {
        let key = format!(
            "{}|d{}|v{}|{}",
            strategy.as_str(),
            difficulty.unwrap_or(0),
            prefer_vowels as u8,
            candidates.iter().collect::<String>()
        );

        let cache = self.cache.get_mut();
        if let Some(hit) = cache.get(&key) {
            return Some(hit);
        }

        let weighted = self.weights(strategy, difficulty, prefer_vowels, candidates);
        match LetterDistribution::new(&weighted) {
            Ok(dist) => {
                let dist = Arc::new(dist);
                self.cache.get_mut().set(key, dist.clone());
                Some(dist)
            }
            Err(e) => {
                warn!(error = %e, strategy = strategy.as_str(), "Unusable letter weights, drawing uniformly");
                None
            }
        }
    }

    fn weights(
        &self,
        strategy: LetterStrategy,
        difficulty: Option<u8>,
        prefer_vowels: bool,
        candidates: &[char],
    ) -> Vec<(char, f64)> {
        let exponent = difficulty
            .map(|d| 1.0 - DIFFICULTY_EXPONENT_STEP * (d as f64 - 1.0))
            .unwrap_or(1.0);

        let mut weighted: Vec<(char, f64)> = candidates
            .iter()
            .map(|&c| {
                let w = match strategy {
                    LetterStrategy::Random => 1.0,
                    LetterStrategy::Frequency | LetterStrategy::Balanced => {
                        self.table.weight(c).powf(exponent)
                    }
                    LetterStrategy::Challenging => 1.0 + self.table.rarity(c),
                };
                (c, w)
            })
            .collect();

        if strategy == LetterStrategy::Balanced {
            let target = if prefer_vowels {
                PREFERRED_VOWEL_RATIO
            } else {
                VOWEL_TARGET_RATIO
            };
            let (vowel_sum, consonant_sum) =
                weighted.iter().fold((0.0, 0.0), |(v, k), &(c, w)| {
                    if Self::is_vowel(c) {
                        (v + w, k)
                    } else {
                        (v, k + w)
                    }
                });
            // Only meaningful when both groups are present
            if vowel_sum > 0.0 && consonant_sum > 0.0 {
                for (c, w) in &mut weighted {
                    if Self::is_vowel(*c) {
                        *w *= target / vowel_sum;
                    } else {
                        *w *= (1.0 - target) / consonant_sum;
                    }
                }
            }
        } else if prefer_vowels {
            for (c, w) in &mut weighted {
                if Self::is_vowel(*c) {
                    *w *= PREFER_VOWEL_BOOST;
                }
            }
        }

        weighted
    }

    fn record(&mut self, strategy: LetterStrategy, letter: char, relaxed: bool, elapsed: Duration) {
        let stats = &mut self.stats;
        stats.total_generated += 1;
        *stats.by_strategy.entry(strategy.as_str().to_string()).or_default() += 1;
        *stats.by_letter.entry(letter).or_default() += 1;
        if Self::is_vowel(letter) {
            stats.vowels += 1;
        } else {
            stats.consonants += 1;
        }
        if relaxed {
            stats.exclusion_relaxed += 1;
        }
        stats.total_latency_us += elapsed.as_micros() as u64;

        if let Some(signals) = &self.signals {
            signals.emit(Signal::LetterGenerated {
                letter,
                strategy: strategy.as_str().to_string(),
                timestamp: chrono::Utc::now(),
            });
        }
    }
}

impl Sweepable for LetterGenerator {
    fn try_sweep(&self) -> Option<usize> {
        self.cache.try_sweep()
    }
}

/// Uppercase candidate letters, A-Z when unconstrained
fn candidate_base(allowed: Option<&BTreeSet<char>>) -> Vec<char> {
    let restricted: BTreeSet<char> = allowed
        .into_iter()
        .flatten()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_uppercase())
        .collect();

    if restricted.is_empty() {
        ALPHABET.to_vec()
    } else {
        restricted.into_iter().collect()
    }
}

fn consonants() -> impl Iterator<Item = char> {
    ALPHABET.into_iter().filter(|c| !VOWELS.contains(c))
}
