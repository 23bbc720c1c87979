//! Round Engine - composition root
//!
//! Builds and owns everything one game session needs:
//!
//!   SignalBus ──┬── CategoryStore ──┐
//!               ├── LetterGenerator ┼── CombinationGenerator
//!               └───────────────────┘
//!   CacheSweeper (periodic TTL cleanup of both caches)
//!
//! Component seeds derive from one root seed, so a session replays exactly
//! when the seed is pinned in [`EngineConfig`].

pub mod config;
#[cfg(feature = "bevy")]
pub mod plugin;

pub use config::{ConfigError, EngineConfig};
#[cfg(feature = "bevy")]
pub use plugin::{
    CombinationReady, CoreSignalEvent, EngineResource, RequestCombination, RoundEnginePlugin,
};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::cache::{
    self, CacheStats, CacheSweeper, SharedClock, SweepOutcome, Sweepable, SystemClock,
};
use crate::categories::CategoryStore;
use crate::generation::{
    derive_seed, Combination, CombinationGenerator, GenerationOptions, RoundSeed,
};
use crate::letters::LetterGenerator;
use crate::signals::SignalBus;
use crate::storage::{keys, Storage, StorageResult};

/// Snapshot persisted under the `cache_stats` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineCacheStats {
    pub categories: CacheStats,
    pub letters: CacheStats,
}

pub struct RoundEngine {
    config: EngineConfig,
    seed: RoundSeed,
    signals: SignalBus,
    store: Arc<CategoryStore>,
    generator: CombinationGenerator,
    sweeper: CacheSweeper,
    storage: Option<Arc<dyn Storage>>,
}

impl RoundEngine {
    /// Load data through `storage` (each load bounded by the configured
    /// timeout) and wire the components. Never fails: missing or broken
    /// data falls back to built-ins.
    pub async fn init(config: EngineConfig, storage: Option<Arc<dyn Storage>>) -> Self {
        let seed = config.resolved_seed();
        let timeout = config.init_timeout();

        let store = CategoryStore::init(storage.as_deref(), timeout).await;
        let letters =
            LetterGenerator::init(storage.as_deref(), derive_seed(seed, "letters"), timeout).await;

        let mut engine = Self::assemble(config, seed, store, letters, storage);
        let storage = engine.storage.clone();
        engine.generator.init(storage.as_deref(), timeout).await;
        engine
    }

    /// Built-in data only, no storage
    pub fn with_defaults(config: EngineConfig) -> Self {
        let seed = config.resolved_seed();
        let store = CategoryStore::with_defaults();
        let letters = LetterGenerator::new(derive_seed(seed, "letters"));
        Self::assemble(config, seed, store, letters, None)
    }

    fn assemble(
        config: EngineConfig,
        seed: u64,
        store: CategoryStore,
        letters: LetterGenerator,
        storage: Option<Arc<dyn Storage>>,
    ) -> Self {
        let clock: SharedClock = Arc::new(SystemClock::new());
        let signals = SignalBus::new();

        let store = Arc::new(
            store
                .with_seed(derive_seed(seed, "categories"))
                .with_cache(config.category_cache, clock.clone())
                .with_signals(signals.clone()),
        );
        let letters = letters
            .with_cache(config.letter_cache, clock.clone())
            .with_signals(signals.clone())
            .with_categories(store.clone());

        let generator = CombinationGenerator::new(Some(store.clone()), Some(letters), seed)
            .with_max_attempts(config.max_attempts)
            .with_history_size(config.history_size)
            .with_signals(signals.clone());

        info!(
            seed,
            categories = store.len(),
            source = ?store.source(),
            "Round engine ready"
        );

        Self {
            sweeper: CacheSweeper::new(config.sweep_interval(), clock),
            config,
            seed: RoundSeed::new(seed),
            signals,
            store,
            generator,
            storage,
        }
    }

    pub fn generate_combination(
        &mut self,
        round_type: &str,
        options: &GenerationOptions,
    ) -> Combination {
        self.generator.generate_combination(round_type, options)
    }

    /// Combination for the configured default round
    pub fn generate_default(&mut self) -> Combination {
        let round_type = self.config.default_round.clone();
        self.generator
            .generate_combination(&round_type, &GenerationOptions::default())
    }

    pub fn generate_batch(
        &mut self,
        n: usize,
        round_type: &str,
        options: &GenerationOptions,
    ) -> Vec<Combination> {
        self.generator.generate_batch(n, round_type, options)
    }

    /// Sweep expired cache entries once the interval has elapsed
    pub fn tick(&mut self) -> SweepOutcome {
        let targets: [&dyn Sweepable; 2] = [self.store.as_ref(), self.generator.letters()];
        let outcome = self.sweeper.tick(&targets);
        if outcome.removed > 0 {
            info!(removed = outcome.removed, "Swept expired cache entries");
        }
        outcome
    }

    pub fn cache_stats(&self) -> EngineCacheStats {
        EngineCacheStats {
            categories: self.store.cache_stats(),
            letters: self.generator.letters().cache_stats(),
        }
    }

    /// Save cache statistics. `Ok(false)` when no storage is configured.
    pub async fn persist_cache_stats(&self) -> StorageResult<bool> {
        let Some(storage) = &self.storage else {
            return Ok(false);
        };
        cache::persist_stats(storage.as_ref(), keys::CACHE_STATS, &self.cache_stats()).await?;
        Ok(true)
    }

    pub fn signals(&self) -> &SignalBus {
        &self.signals
    }

    pub fn categories(&self) -> &Arc<CategoryStore> {
        &self.store
    }

    pub fn generator(&self) -> &CombinationGenerator {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut CombinationGenerator {
        &mut self.generator
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn seed(&self) -> RoundSeed {
        self.seed
    }
}
