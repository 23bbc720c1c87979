//! Category Store - themed word lists with letter compatibility
//!
//! Holds the catalog a round can draw from:
//! - Lookup by id, uniform random pick (seedable)
//! - Filters by difficulty, letter and tag, name search
//! - Filter/search results memoized in an [`IntelligentCache`]
//!
//! The catalog is loaded once (storage or built-ins) and is read-only after
//! that. There is always at least one category.

pub mod defaults;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{CacheProfile, CacheStats, IntelligentCache, SharedClock, Sweepable, SystemClock};
use crate::constants::{MAX_CATEGORY_DIFFICULTY, MIN_CATEGORY_DIFFICULTY};
use crate::signals::{Signal, SignalBus};
use crate::storage::{keys, save_json, Storage, StorageResult};

pub use defaults::{default_categories, fallback_category};

// ============================================================================
// Model
// ============================================================================

/// Themed word list a round is built around
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub difficulty: u8,
    pub words: Vec<String>,
    #[serde(default)]
    pub metadata: CategoryMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryMetadata {
    /// Letters with playable words. Empty means any letter.
    pub letter_compatibility: BTreeSet<char>,
    pub tags: BTreeSet<String>,
    pub theme: String,
    pub estimated_words: u32,
    pub average_word_length: f32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CategoryError {
    #[error("Invalid category id: {0:?}")]
    InvalidId(String),
    #[error("Category {0} has an empty name")]
    EmptyName(String),
    #[error("Category {id} difficulty {difficulty} outside 1-5")]
    DifficultyOutOfRange { id: String, difficulty: u8 },
    #[error("Category {0} has no words")]
    EmptyWords(String),
    #[error("Category {id} lists invalid letter {letter:?}")]
    InvalidLetter { id: String, letter: char },
    #[error("Catalog is not a JSON array: {0}")]
    Malformed(String),
}

impl Category {
    /// Normalize and validate a record: uppercase compatibility letters,
    /// lowercase deduplicated words, derived metadata filled in.
    pub fn sanitize(mut self) -> Result<Self, CategoryError> {
        self.id = self.id.trim().to_string();
        let id_ok = !self.id.is_empty()
            && self
                .id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
        if !id_ok {
            return Err(CategoryError::InvalidId(self.id));
        }

        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(CategoryError::EmptyName(self.id));
        }

        if !(MIN_CATEGORY_DIFFICULTY..=MAX_CATEGORY_DIFFICULTY).contains(&self.difficulty) {
            return Err(CategoryError::DifficultyOutOfRange {
                id: self.id,
                difficulty: self.difficulty,
            });
        }

        let mut seen = HashSet::new();
        self.words = self
            .words
            .iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty() && seen.insert(w.clone()))
            .collect();
        if self.words.is_empty() {
            return Err(CategoryError::EmptyWords(self.id));
        }

        let mut letters = BTreeSet::new();
        for letter in &self.metadata.letter_compatibility {
            let upper = letter.to_ascii_uppercase();
            if !upper.is_ascii_uppercase() {
                return Err(CategoryError::InvalidLetter {
                    id: self.id,
                    letter: *letter,
                });
            }
            letters.insert(upper);
        }
        self.metadata.letter_compatibility = letters;

        self.metadata.tags = self
            .metadata
            .tags
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if self.metadata.estimated_words == 0 {
            self.metadata.estimated_words = self.words.len() as u32;
        }
        let avg = self.metadata.average_word_length;
        if !avg.is_finite() || avg <= 0.0 {
            let total: usize = self.words.iter().map(|w| w.chars().count()).sum();
            self.metadata.average_word_length = total as f32 / self.words.len() as f32;
        }

        Ok(self)
    }

    /// Whether a round with this starting letter is playable
    pub fn is_compatible(&self, letter: char) -> bool {
        let letter = letter.to_ascii_uppercase();
        letter.is_ascii_uppercase()
            && (self.metadata.letter_compatibility.is_empty()
                || self.metadata.letter_compatibility.contains(&letter))
    }

    /// Sample words beginning with `letter`
    pub fn words_starting_with(&self, letter: char) -> usize {
        let letter = letter.to_ascii_lowercase();
        self.words
            .iter()
            .filter(|w| w.starts_with(letter))
            .count()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata.tags.contains(tag)
    }
}

/// Parse a JSON category array. Bad records are skipped with a warning;
/// later duplicates of an id are dropped.
pub fn parse_catalog(json: &str) -> Result<Vec<Category>, CategoryError> {
    let raw: Vec<serde_json::Value> =
        serde_json::from_str(json).map_err(|e| CategoryError::Malformed(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut categories = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        let parsed = serde_json::from_value::<Category>(value)
            .map_err(|e| CategoryError::Malformed(e.to_string()))
            .and_then(Category::sanitize);

        match parsed {
            Ok(category) if seen.insert(category.id.clone()) => categories.push(category),
            Ok(category) => warn!(index, id = %category.id, "Skipping duplicate category"),
            Err(e) => warn!(index, error = %e, "Skipping invalid category record"),
        }
    }
    Ok(categories)
}

// ============================================================================
// Provider seam
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("Category provider unavailable: {0}")]
    Unavailable(String),
    #[error("Category provider has no categories")]
    Empty,
}

/// Category capability consumed by the generators.
///
/// Fallible so that remote or partially initialized catalogs can report
/// failure; callers degrade to fallbacks instead of propagating.
pub trait CategoryProvider: Send + Sync {
    fn category(&self, id: &str) -> Result<Option<Arc<Category>>, ProviderError>;
    fn random_category(&self) -> Result<Arc<Category>, ProviderError>;
    fn categories(&self) -> Result<Vec<Arc<Category>>, ProviderError>;
    fn categories_by_difficulty_range(
        &self,
        lo: i64,
        hi: i64,
    ) -> Result<Vec<Arc<Category>>, ProviderError>;
}

// ============================================================================
// Store
// ============================================================================

/// Where the loaded catalog came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogSource {
    BuiltIn,
    Provided,
    Storage,
}

pub struct CategoryStore {
    categories: Vec<Arc<Category>>,
    by_id: HashMap<String, usize>,
    rng: Mutex<Xoshiro256PlusPlus>,
    cache: Mutex<IntelligentCache<String, Vec<Arc<Category>>>>,
    signals: Option<SignalBus>,
    source: CatalogSource,
}

impl CategoryStore {
    /// Store holding the built-in catalog
    pub fn with_defaults() -> Self {
        Self::build(default_categories(), CatalogSource::BuiltIn)
    }

    /// Store over caller-supplied records. Invalid records are skipped;
    /// if nothing valid remains the built-in catalog is used.
    pub fn from_categories(categories: Vec<Category>) -> Self {
        let mut seen = HashSet::new();
        let valid: Vec<Category> = categories
            .into_iter()
            .filter_map(|c| match c.sanitize() {
                Ok(c) if seen.insert(c.id.clone()) => Some(c),
                Ok(c) => {
                    warn!(id = %c.id, "Skipping duplicate category");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "Skipping invalid category record");
                    None
                }
            })
            .collect();

        if valid.is_empty() {
            warn!("No valid categories supplied, using built-in set");
            return Self::with_defaults();
        }
        Self::build(valid, CatalogSource::Provided)
    }

    /// Load the catalog from storage, bounded by `timeout`. Any failure
    /// (missing, corrupt, error, timeout, all records invalid) falls back to
    /// the built-in catalog.
    pub async fn init(storage: Option<&dyn Storage>, timeout: Duration) -> Self {
        let Some(storage) = storage else {
            info!("No storage configured, using built-in categories");
            return Self::with_defaults();
        };

        let raw = match tokio::time::timeout(timeout, storage.load(keys::CATEGORIES)).await {
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Category load timed out, using built-in set");
                return Self::with_defaults();
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Category load failed, using built-in set");
                return Self::with_defaults();
            }
            Ok(Ok(None)) => {
                info!("No stored categories, using built-in set");
                return Self::with_defaults();
            }
            Ok(Ok(Some(raw))) => raw,
        };

        match parse_catalog(&raw) {
            Ok(categories) if !categories.is_empty() => {
                info!(count = categories.len(), "Loaded categories from storage");
                Self::build(categories, CatalogSource::Storage)
            }
            Ok(_) => {
                warn!("Stored catalog has no valid categories, using built-in set");
                Self::with_defaults()
            }
            Err(e) => {
                warn!(error = %e, "Stored catalog is corrupt, using built-in set");
                Self::with_defaults()
            }
        }
    }

    fn build(categories: Vec<Category>, source: CatalogSource) -> Self {
        let categories: Vec<Arc<Category>> = categories.into_iter().map(Arc::new).collect();
        let by_id = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        Self {
            categories,
            by_id,
            rng: Mutex::new(Xoshiro256PlusPlus::from_entropy()),
            cache: Mutex::new(IntelligentCache::new(
                CacheProfile::categories(),
                Arc::new(SystemClock::new()),
            )),
            signals: None,
            source,
        }
    }

    /// Deterministic random picks
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = Xoshiro256PlusPlus::seed_from_u64(seed);
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

    pub fn source(&self) -> CatalogSource {
        self.source
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn get_category_by_id(&self, id: &str) -> Option<Arc<Category>> {
        self.by_id
            .get(id.trim())
            .map(|&index| self.categories[index].clone())
    }

    /// Uniform pick; emits `category:selected`
    pub fn get_random_category(&self) -> Arc<Category> {
        let index = self.rng.lock().gen_range(0..self.categories.len());
        let category = self.categories[index].clone();

        if let Some(signals) = &self.signals {
            signals.emit(Signal::CategorySelected {
                category_id: category.id.clone(),
                category_name: category.name.clone(),
                difficulty: category.difficulty,
                timestamp: chrono::Utc::now(),
            });
        }
        category
    }

    pub fn get_categories_by_difficulty(&self, difficulty: i64) -> Vec<Arc<Category>> {
        if !(MIN_CATEGORY_DIFFICULTY as i64..=MAX_CATEGORY_DIFFICULTY as i64).contains(&difficulty) {
            return Vec::new();
        }
        self.cached(format!("difficulty:{difficulty}"), || {
            self.filter(|c| c.difficulty as i64 == difficulty)
        })
    }

    /// Inclusive range. `lo > hi` or a range outside 1-5 matches nothing.
    pub fn get_categories_by_difficulty_range(&self, lo: i64, hi: i64) -> Vec<Arc<Category>> {
        if lo > hi || hi < MIN_CATEGORY_DIFFICULTY as i64 || lo > MAX_CATEGORY_DIFFICULTY as i64 {
            return Vec::new();
        }
        self.cached(format!("range:{lo}-{hi}"), || {
            self.filter(|c| (lo..=hi).contains(&(c.difficulty as i64)))
        })
    }

    /// Case-insensitive. Categories without constraints accept any letter
    /// but are only listed when they name it explicitly.
    pub fn get_categories_by_letter(&self, letter: char) -> Vec<Arc<Category>> {
        let letter = letter.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return Vec::new();
        }
        self.cached(format!("letter:{letter}"), || {
            self.filter(|c| c.metadata.letter_compatibility.contains(&letter))
        })
    }

    pub fn get_categories_by_tag(&self, tag: &str) -> Vec<Arc<Category>> {
        if tag.is_empty() {
            return Vec::new();
        }
        self.cached(format!("tag:{tag}"), || self.filter(|c| c.has_tag(tag)))
    }

    /// Case-insensitive substring match on the name.
    /// An empty or whitespace-only term matches nothing.
    pub fn search_categories(&self, term: &str) -> Vec<Arc<Category>> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }
        self.cached(format!("search:{term}"), || {
            self.filter(|c| c.name.to_lowercase().contains(&term))
        })
    }

    fn filter(&self, predicate: impl Fn(&Category) -> bool) -> Vec<Arc<Category>> {
        self.categories
            .iter()
            .filter(|c| predicate(c))
            .cloned()
            .collect()
    }

    fn cached(
        &self,
        key: String,
        compute: impl FnOnce() -> Vec<Arc<Category>>,
    ) -> Vec<Arc<Category>> {
        let hit = self.cache.lock().get(&key);
        if let Some(hit) = hit {
            debug!(key = %key, "Category cache hit");
            return hit;
        }

        debug!(key = %key, "Category cache miss");
        let result = compute();
        self.cache.lock().set(key, result.clone());
        result
    }

    // ========================================================================
    // Catalog access
    // ========================================================================

    pub fn all_categories(&self) -> &[Arc<Category>] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category_ids(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.id.as_str()).collect()
    }

    /// Sorted distinct tags across the catalog
    pub fn tags(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|c| c.metadata.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Catalog in the storage wire format
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.categories)
    }

    pub async fn save(&self, storage: &dyn Storage) -> StorageResult<()> {
        save_json(storage, keys::CATEGORIES, &self.categories).await?;
        info!(count = self.categories.len(), "Saved category catalog");
        Ok(())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().get_stats()
    }
}

impl Sweepable for CategoryStore {
    fn try_sweep(&self) -> Option<usize> {
        self.cache.try_sweep()
    }
}

impl CategoryProvider for CategoryStore {
    fn category(&self, id: &str) -> Result<Option<Arc<Category>>, ProviderError> {
        Ok(self.get_category_by_id(id))
    }

    fn random_category(&self) -> Result<Arc<Category>, ProviderError> {
        Ok(self.get_random_category())
    }

    fn categories(&self) -> Result<Vec<Arc<Category>>, ProviderError> {
        Ok(self.categories.clone())
    }

    fn categories_by_difficulty_range(
        &self,
        lo: i64,
        hi: i64,
    ) -> Result<Vec<Arc<Category>>, ProviderError> {
        Ok(self.get_categories_by_difficulty_range(lo, hi))
    }
}
