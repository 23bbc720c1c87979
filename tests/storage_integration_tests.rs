//! Storage integration tests
//!
//! Drives the engine and its components against a real `JsonFileStorage`
//! in a temp directory, plus a slow backend for the init timeout path.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use wordround_core::categories::{CatalogSource, CategoryStore};
use wordround_core::engine::{EngineCacheStats, EngineConfig, RoundEngine};
use wordround_core::generation::{CombinationGenerator, GenerationOptions};
use wordround_core::letters::LetterGenerator;
use wordround_core::storage::{
    keys, load_json, JsonFileStorage, Storage, StorageError, StorageResult,
};

const CATALOG: &str = r#"[
    {"id": "rivers", "name": "Rivers", "difficulty": 3,
     "words": ["nile", "niger", "amazon", "danube", "rhine", "volga"],
     "metadata": {"letterCompatibility": ["N", "A", "D", "R", "V"], "estimatedWords": 400,
                  "tags": ["geography"], "theme": "nature"}},
    {"id": "planets", "name": "Planets", "difficulty": 2,
     "words": ["mars", "mercury", "venus", "earth", "jupiter", "saturn", "uranus", "neptune"],
     "metadata": {"letterCompatibility": ["M", "V", "E", "J", "S", "U", "N"], "estimatedWords": 8}}
]"#;

fn seeded(seed: u64) -> EngineConfig {
    EngineConfig {
        seed: Some(seed),
        ..Default::default()
    }
}

/// Never answers within any reasonable timeout
struct SlowStorage;

#[async_trait]
impl Storage for SlowStorage {
    async fn load(&self, _key: &str) -> StorageResult<Option<String>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(None)
    }

    async fn save(&self, _key: &str, _data: &str) -> StorageResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn file_storage_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path());

    assert_eq!(storage.load(keys::CATEGORIES).await.unwrap(), None);
    storage.save(keys::CATEGORIES, CATALOG).await.unwrap();
    assert_eq!(
        storage.load(keys::CATEGORIES).await.unwrap().as_deref(),
        Some(CATALOG)
    );
    assert!(dir.path().join("categories.json").exists());
}

#[tokio::test]
async fn file_storage_rejects_path_keys() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path());
    assert!(matches!(
        storage.save("../escape", "{}").await,
        Err(StorageError::InvalidKey(_))
    ));
    assert!(matches!(
        storage.load("a/b").await,
        Err(StorageError::InvalidKey(_))
    ));
}

#[tokio::test]
async fn store_loads_catalog_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path());
    storage.save(keys::CATEGORIES, CATALOG).await.unwrap();

    let store = CategoryStore::init(Some(&storage), Duration::from_secs(2)).await;
    assert_eq!(store.source(), CatalogSource::Storage);
    assert_eq!(store.len(), 2);
    assert_eq!(store.get_categories_by_tag("geography").len(), 1);
    assert_eq!(store.get_categories_by_letter('N').len(), 2);
}

#[tokio::test]
async fn corrupt_catalog_file_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("categories.json"), "[{broken").unwrap();
    let storage = JsonFileStorage::new(dir.path());

    let store = CategoryStore::init(Some(&storage), Duration::from_secs(2)).await;
    assert_eq!(store.source(), CatalogSource::BuiltIn);
}

#[tokio::test]
async fn slow_storage_times_out_to_builtins() {
    let storage = SlowStorage;
    let timeout = Duration::from_millis(20);

    let store = CategoryStore::init(Some(&storage), timeout).await;
    assert_eq!(store.source(), CatalogSource::BuiltIn);

    let mut letters = LetterGenerator::init(Some(&storage), 1, timeout).await;
    assert!(letters.generate_vowel().is_ascii_uppercase());

    let mut generator = CombinationGenerator::new(None, None, 1);
    assert_eq!(generator.init(Some(&storage), timeout).await, 0);
}

#[tokio::test]
async fn store_save_then_reload() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path());

    let original = CategoryStore::with_defaults();
    original.save(&storage).await.unwrap();

    let reloaded = CategoryStore::init(Some(&storage), Duration::from_secs(2)).await;
    assert_eq!(reloaded.source(), CatalogSource::Storage);
    assert_eq!(reloaded.category_ids(), original.category_ids());
}

#[tokio::test]
async fn letter_frequencies_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path());

    // Only Z carries real weight
    let mut table = serde_json::Map::new();
    for letter in 'A'..='Z' {
        let weight = if letter == 'Z' { 1.0 } else { 1e-9 };
        table.insert(letter.to_string(), serde_json::json!(weight));
    }
    storage
        .save(keys::LETTER_FREQUENCIES, &serde_json::Value::Object(table).to_string())
        .await
        .unwrap();

    let mut letters = LetterGenerator::init(Some(&storage), 9, Duration::from_secs(2)).await;
    assert_eq!(letters.letter_weight('Z'), 1.0);
    let zs = (0..50).filter(|_| letters.generate_by_frequency(None) == 'Z').count();
    assert!(zs >= 45, "only {zs} of 50 draws were Z");
}

#[tokio::test]
async fn engine_session_against_files() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path());
    storage.save(keys::CATEGORIES, CATALOG).await.unwrap();
    storage
        .save(
            keys::ROUND_CONFIGS,
            r#"[{"name": "sprint", "duration": 30, "difficulty": 2, "targetWordCount": 2}]"#,
        )
        .await
        .unwrap();
    let storage: Arc<dyn Storage> = Arc::new(storage);

    let mut engine = RoundEngine::init(seeded(11), Some(storage.clone())).await;
    let batch = engine.generate_batch(2, "sprint", &GenerationOptions::default().unique());
    assert!(!batch.is_empty());
    for combination in &batch {
        assert_eq!(combination.round_config.name, "sprint");
        assert!(combination.category.is_compatible(combination.letter));
    }

    assert!(engine.persist_cache_stats().await.unwrap());
    let stats: EngineCacheStats = load_json(storage.as_ref(), keys::CACHE_STATS)
        .await
        .unwrap()
        .expect("stats saved");
    let live = engine.cache_stats();
    assert_eq!(stats.categories.hits, live.categories.hits);
    assert_eq!(stats.letters.inserts, live.letters.inserts);
    assert_eq!(stats.letters.capacity, EngineConfig::default().letter_cache.max_size);
    assert!(dir.path().join("cache_stats.json").exists());
}
