//! Combination Generator - pairs a category with a starting letter
//!
//! ## State machine (per call)
//! ```text
//! Start → PickCategory → PickLetter → Validate ─ accept ──→ Return
//!              ↑                         │
//!              └──── retry (≤ max) ──────┘
//!                                        └ exhausted / provider error → FallbackReturn
//! ```
//!
//! A pick is accepted when the letter is compatible with the category, not
//! hard-excluded, and playable for the round's target word count. Generation
//! never fails: the fallback is `animals` / `S`, flagged in the metadata.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::categories::{fallback_category, Category, CategoryProvider, CategoryStore, ProviderError};
use crate::constants::{
    DEFAULT_HISTORY_SIZE, DEFAULT_MAX_ATTEMPTS, FALLBACK_CATEGORY_ID, FALLBACK_LETTER,
    MAX_ATTEMPTS_CEILING, MIN_DIFFICULTY_SCORE,
};
use crate::letters::{LetterGenerator, LetterOptions, LetterStrategy};
use crate::logging::TimingSpan;
use crate::signals::{Signal, SignalBus};
use crate::storage::{keys, Storage};

use super::rounds::{RoundConfig, RoundConfigError, RoundRegistry};
use super::{
    derive_seed, scoring, Combination, CombinationMetadata, GenerationOptions, GenerationStats,
    GenerationType, Playability,
};

/// A recently used (category, letter) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub category_id: String,
    pub letter: char,
}

/// Accepted pick before it is wrapped into a [`Combination`]
struct Pick {
    category: Arc<Category>,
    letter: char,
    playability: Playability,
}

pub struct CombinationGenerator {
    categories: Arc<dyn CategoryProvider>,
    letters: LetterGenerator,
    rounds: RoundRegistry,
    rng: Xoshiro256PlusPlus,
    max_attempts: u32,
    history: VecDeque<HistoryEntry>,
    history_size: usize,
    stats: GenerationStats,
    signals: Option<SignalBus>,
}

impl CombinationGenerator {
    /// Missing collaborators are replaced by built-in ones seeded from `seed`.
    pub fn new(
        categories: Option<Arc<dyn CategoryProvider>>,
        letters: Option<LetterGenerator>,
        seed: u64,
    ) -> Self {
        let categories = categories.unwrap_or_else(|| {
            info!("No category provider supplied, using built-in catalog");
            Arc::new(CategoryStore::with_defaults().with_seed(derive_seed(seed, "categories")))
        });

        let letters = letters.unwrap_or_else(|| LetterGenerator::new(derive_seed(seed, "letters")));
        let letters = if letters.has_categories() {
            letters
        } else {
            letters.with_categories(categories.clone())
        };

        Self {
            categories,
            letters,
            rounds: RoundRegistry::builtin(),
            rng: Xoshiro256PlusPlus::seed_from_u64(derive_seed(seed, "combinations")),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            history: VecDeque::with_capacity(DEFAULT_HISTORY_SIZE),
            history_size: DEFAULT_HISTORY_SIZE,
            stats: GenerationStats::default(),
            signals: None,
        }
    }

    /// Clamped to 1..=10
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.clamp(1, MAX_ATTEMPTS_CEILING);
        self
    }

    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size.max(1);
        self.history.truncate(self.history_size);
        self
    }

    pub fn with_signals(mut self, signals: SignalBus) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Merge custom round configs from storage. Returns how many were added.
    pub async fn init(&mut self, storage: Option<&dyn Storage>, timeout: Duration) -> usize {
        let Some(storage) = storage else {
            return 0;
        };

        match tokio::time::timeout(timeout, storage.load(keys::ROUND_CONFIGS)).await {
            Ok(Ok(Some(raw))) => match self.rounds.merge_json(&raw) {
                Ok(added) => added,
                Err(e) => {
                    warn!(error = %e, "Stored round configs are corrupt, keeping built-ins");
                    0
                }
            },
            Ok(Ok(None)) => 0,
            Ok(Err(e)) => {
                warn!(error = %e, "Round config load failed, keeping built-ins");
                0
            }
            Err(_) => {
                warn!("Round config load timed out, keeping built-ins");
                0
            }
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = Xoshiro256PlusPlus::seed_from_u64(derive_seed(seed, "combinations"));
        self.letters.reseed(derive_seed(seed, "letters"));
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    // ========================================================================
    // Generation
    // ========================================================================

    pub fn generate_combination(&mut self, round_type: &str, options: &GenerationOptions) -> Combination {
        let started = Instant::now();
        let round = self.rounds.get(round_type).clone();

        let mut attempts = 0;
        let mut accepted = None;
        for attempt in 1..=self.max_attempts {
            attempts = attempt;
            match self.attempt(&round, options, attempt) {
                Ok(Some(pick)) => {
                    accepted = Some(pick);
                    break;
                }
                Ok(None) => debug!(attempt, round = %round.name, "Pick rejected, retrying"),
                Err(e) => {
                    warn!(error = %e, attempt, "Category provider failed, using fallback");
                    break;
                }
            }
        }

        match accepted {
            Some(pick) => self.finish(pick, round, GenerationType::Advanced, false, attempts, started),
            None => self.fallback(round, GenerationType::Advanced, attempts, started),
        }
    }

    /// Single unbiased attempt: random category, uniform compatible letter
    pub fn generate_legacy_combination(&mut self, round_type: &str) -> Combination {
        let started = Instant::now();
        let round = self.rounds.get(round_type).clone();

        let category = match self.categories.random_category() {
            Ok(category) => category,
            Err(e) => {
                warn!(error = %e, "Category provider failed, using fallback");
                return self.fallback(round, GenerationType::Legacy, 1, started);
            }
        };

        let options = LetterOptions {
            allowed_letters: Some(category.metadata.letter_compatibility.clone()),
            ..Default::default()
        };
        let letter = self.letters.generate(LetterStrategy::Random, &options);
        let playability = scoring::assess(&category, letter, &round, self.letters.frequency_table());

        if playability.feasible {
            let pick = Pick {
                category,
                letter,
                playability,
            };
            self.finish(pick, round, GenerationType::Legacy, false, 1, started)
        } else {
            debug!(category = %category.id, letter = %letter, "Legacy pick not playable");
            self.fallback(round, GenerationType::Legacy, 1, started)
        }
    }

    /// Up to `n` combinations, one generation call each. With `ensure_unique`
    /// duplicates are dropped, so fewer than `n` may come back.
    pub fn generate_batch(
        &mut self,
        n: usize,
        round_type: &str,
        options: &GenerationOptions,
    ) -> Vec<Combination> {
        let _span = TimingSpan::new("generate_batch");
        let mut batch = Vec::with_capacity(n);
        let mut used: BTreeSet<String> = options.exclude_categories.clone();

        for _ in 0..n {
            if !options.ensure_unique {
                batch.push(self.generate_combination(round_type, options));
                continue;
            }

            let mut call_options = options.clone();
            call_options.exclude_categories = used.clone();
            let combination = self.generate_combination(round_type, &call_options);

            if used.insert(combination.category.id.clone()) {
                batch.push(combination);
            } else if combination.metadata.fallback {
                info!(category = %combination.category.id, "Fallback already in batch, dropped");
            } else {
                debug!(category = %combination.category.id, "Duplicate category dropped from batch");
            }
        }

        if batch.len() < n {
            info!(requested = n, produced = batch.len(), "Batch truncated by uniqueness");
        }
        batch
    }

    fn attempt(
        &mut self,
        round: &RoundConfig,
        options: &GenerationOptions,
        attempt: u32,
    ) -> Result<Option<Pick>, ProviderError> {
        let Some(category) = self.pick_category(options, attempt)? else {
            return Ok(None);
        };

        let letter = self.pick_letter(&category, round, options);
        let hard_excluded = options
            .exclude_letters
            .iter()
            .any(|c| c.to_ascii_uppercase() == letter);
        if hard_excluded || !category.is_compatible(letter) {
            return Ok(None);
        }

        let playability = scoring::assess(&category, letter, round, self.letters.frequency_table());
        if !playability.feasible {
            debug!(
                category = %category.id,
                letter = %letter,
                estimated = playability.estimated_words,
                "Combination not playable"
            );
            return Ok(None);
        }

        Ok(Some(Pick {
            category,
            letter,
            playability,
        }))
    }

    fn pick_category(
        &mut self,
        options: &GenerationOptions,
        attempt: u32,
    ) -> Result<Option<Arc<Category>>, ProviderError> {
        let recent: HashSet<String> = self
            .recent(options.avoid_recent)
            .map(|entry| entry.category_id.clone())
            .collect();

        if options.target_difficulty.is_none()
            && options.exclude_categories.is_empty()
            && recent.is_empty()
        {
            return self.categories.random_category().map(Some);
        }

        let pool = match options.target_difficulty {
            Some(target) => {
                let spread = (attempt - 1) as i64;
                let target = target as i64;
                self.categories
                    .categories_by_difficulty_range(target - spread, target + spread)?
            }
            None => self.categories.categories()?,
        };

        let pool: Vec<Arc<Category>> = pool
            .into_iter()
            .filter(|c| !options.exclude_categories.contains(&c.id) && !recent.contains(&c.id))
            .collect();
        Ok(pool.choose(&mut self.rng).cloned())
    }

    fn pick_letter(
        &mut self,
        category: &Category,
        round: &RoundConfig,
        options: &GenerationOptions,
    ) -> char {
        let mut exclude: BTreeSet<char> = options
            .exclude_letters
            .iter()
            .map(|c| c.to_ascii_uppercase())
            .collect();
        exclude.extend(self.recent(options.avoid_recent).map(|entry| entry.letter));

        let compatibility = &category.metadata.letter_compatibility;
        let letter_options = LetterOptions {
            difficulty: Some(options.target_difficulty.unwrap_or(round.difficulty)),
            exclude_letters: exclude,
            prefer_vowels: false,
            allowed_letters: (!compatibility.is_empty()).then(|| compatibility.clone()),
        };
        self.letters
            .generate(options.strategy.unwrap_or_default(), &letter_options)
    }

    fn recent(&self, rounds: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter().rev().take(rounds)
    }

    fn fallback(
        &mut self,
        round: RoundConfig,
        generation_type: GenerationType,
        attempts: u32,
        started: Instant,
    ) -> Combination {
        warn!(round = %round.name, attempts, "No playable combination found, using fallback");

        let category = match self.categories.category(FALLBACK_CATEGORY_ID) {
            Ok(Some(category)) if category.is_compatible(FALLBACK_LETTER) => category,
            _ => Arc::new(fallback_category()),
        };
        let playability =
            scoring::assess(&category, FALLBACK_LETTER, &round, self.letters.frequency_table());
        let pick = Pick {
            category,
            letter: FALLBACK_LETTER,
            playability,
        };
        self.finish(pick, round, generation_type, true, attempts, started)
    }

    fn finish(
        &mut self,
        pick: Pick,
        round: RoundConfig,
        generation_type: GenerationType,
        fallback: bool,
        attempts: u32,
        started: Instant,
    ) -> Combination {
        let combination = Combination {
            difficulty: pick.playability.difficulty,
            category: pick.category,
            letter: pick.letter,
            playability: pick.playability,
            metadata: CombinationMetadata {
                generation_type,
                fallback,
                attempts,
                round_type: round.name.clone(),
                generated_at: chrono::Utc::now(),
                generation_time_us: started.elapsed().as_micros() as u64,
            },
            round_config: round,
        };

        if self.history.len() >= self.history_size {
            self.history.pop_front();
        }
        self.history.push_back(HistoryEntry {
            category_id: combination.category.id.clone(),
            letter: combination.letter,
        });
        self.stats.record(&combination);

        if let Some(signals) = &self.signals {
            signals.emit(Signal::CombinationGenerated {
                combination: Box::new(combination.clone()),
                timestamp: combination.metadata.generated_at,
            });
        }
        combination
    }

    // ========================================================================
    // Validation & scoring
    // ========================================================================

    /// Category exists and accepts the letter. Provider errors count as invalid.
    pub fn validate_combination(&self, category_id: &str, letter: char) -> bool {
        match self.categories.category(category_id) {
            Ok(Some(category)) => category.is_compatible(letter),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Category provider failed during validation");
                false
            }
        }
    }

    /// 1-10. Unknown categories score the minimum.
    pub fn calculate_difficulty_score(&self, category_id: &str, letter: char) -> f64 {
        match self.categories.category(category_id) {
            Ok(Some(category)) => {
                scoring::difficulty_score(&category, letter, self.letters.frequency_table())
            }
            _ => MIN_DIFFICULTY_SCORE,
        }
    }

    /// Playability against the default round
    pub fn assess_playability(&self, category_id: &str, letter: char) -> Playability {
        match self.categories.category(category_id) {
            Ok(Some(category)) => self.assess_playability_for(&category, letter, ""),
            _ => Playability {
                score: 0.0,
                estimated_words: 0,
                difficulty: MIN_DIFFICULTY_SCORE,
                feasible: false,
            },
        }
    }

    pub fn assess_playability_for(&self, category: &Category, letter: char, round_type: &str) -> Playability {
        scoring::assess(
            category,
            letter,
            self.rounds.get(round_type),
            self.letters.frequency_table(),
        )
    }

    // ========================================================================
    // Round registry
    // ========================================================================

    pub fn get_round_config(&self, name: &str) -> &RoundConfig {
        self.rounds.get(name)
    }

    pub fn get_round_configurations(&self) -> Vec<RoundConfig> {
        self.rounds.all()
    }

    pub fn add_round_config(&mut self, name: &str, config: RoundConfig) -> Result<(), RoundConfigError> {
        self.rounds.add(name, config)
    }

    pub fn validate_round_config(&self, config: &RoundConfig) -> Result<(), RoundConfigError> {
        config.validate()
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn get_stats(&self) -> GenerationStats {
        self.stats.summarized()
    }

    pub fn reset_stats(&mut self) {
        self.stats = GenerationStats::default();
    }

    /// Oldest first
    pub fn history(&self) -> &VecDeque<HistoryEntry> {
        &self.history
    }

    pub fn categories(&self) -> &Arc<dyn CategoryProvider> {
        &self.categories
    }

    pub fn letters(&self) -> &LetterGenerator {
        &self.letters
    }

    pub fn letters_mut(&mut self) -> &mut LetterGenerator {
        &mut self.letters
    }
}
