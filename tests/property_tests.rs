//! Property-based tests using proptest
//!
//! Invariants that must hold for all inputs:
//! - Combinations: any seed → compatible, scored, never panics
//! - Letters: exclusions honored whenever a candidate survives them
//! - Cache: size never exceeds capacity, TTL always respected
//! - Scores: difficulty and rarity stay in range

use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use wordround_core::cache::{CacheProfile, IntelligentCache, ManualClock};
use wordround_core::categories::{default_categories, Category, CategoryMetadata, CategoryStore};
use wordround_core::constants::{ALPHABET, CHALLENGE_ROUND, DEFAULT_ROUND, QUICK_ROUND};
use wordround_core::generation::{CombinationGenerator, GenerationOptions};
use wordround_core::letters::{LetterFrequencyTable, LetterGenerator, LetterOptions, LetterStrategy};

fn strategy_from(index: u8) -> LetterStrategy {
    match index % 4 {
        0 => LetterStrategy::Random,
        1 => LetterStrategy::Balanced,
        2 => LetterStrategy::Challenging,
        _ => LetterStrategy::Frequency,
    }
}

fn round_from(index: u8) -> &'static str {
    match index % 4 {
        0 => DEFAULT_ROUND,
        1 => QUICK_ROUND,
        2 => CHALLENGE_ROUND,
        _ => "no-such-round",
    }
}

// ============================================================
// Combination Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_any_seed_gives_compatible_combination(seed in any::<u64>(), round in 0u8..4) {
        let mut generator = CombinationGenerator::new(None, None, seed);
        let combination = generator.generate_combination(round_from(round), &GenerationOptions::default());

        prop_assert!(combination.category.is_compatible(combination.letter));
        prop_assert!(combination.letter.is_ascii_uppercase());
        prop_assert!((1.0..=10.0).contains(&combination.difficulty));
        prop_assert!((0.0..=10.0).contains(&combination.playability.score));
        prop_assert!(combination.metadata.attempts >= 1);
        prop_assert!(combination.metadata.attempts <= generator.max_attempts());
    }

    #[test]
    fn prop_generation_is_deterministic(seed in any::<u64>()) {
        let mut a = CombinationGenerator::new(None, None, seed);
        let mut b = CombinationGenerator::new(None, None, seed);
        for _ in 0..5 {
            let x = a.generate_combination(DEFAULT_ROUND, &GenerationOptions::default());
            let y = b.generate_combination(DEFAULT_ROUND, &GenerationOptions::default());
            prop_assert_eq!(&x.category.id, &y.category.id);
            prop_assert_eq!(x.letter, y.letter);
        }
    }

    #[test]
    fn prop_excluded_categories_not_picked(seed in any::<u64>(), skip in 0usize..6) {
        let ids: Vec<String> = default_categories().into_iter().map(|c| c.id).collect();
        let excluded: Vec<String> = ids.iter().skip(skip).take(4).cloned().collect();
        let options = GenerationOptions::default().excluding_categories(excluded.clone());

        let mut generator = CombinationGenerator::new(None, None, seed);
        let combination = generator.generate_combination(DEFAULT_ROUND, &options);
        if !combination.is_fallback() {
            prop_assert!(!excluded.contains(&combination.category.id));
        }
    }

    #[test]
    fn prop_unique_batch_has_distinct_categories(seed in any::<u64>(), n in 0usize..15) {
        let mut generator = CombinationGenerator::new(None, None, seed);
        let batch = generator.generate_batch(n, QUICK_ROUND, &GenerationOptions::default().unique());

        prop_assert!(batch.len() <= n);
        let ids: BTreeSet<&str> = batch.iter().map(|c| c.category.id.as_str()).collect();
        prop_assert_eq!(ids.len(), batch.len());
    }

    #[test]
    fn prop_target_difficulty_never_breaks_generation(seed in any::<u64>(), target in 1u8..=5) {
        let mut generator = CombinationGenerator::new(None, None, seed);
        let options = GenerationOptions::default().with_target_difficulty(target);
        let combination = generator.generate_combination(CHALLENGE_ROUND, &options);
        prop_assert!(combination.category.is_compatible(combination.letter));
    }
}

// ============================================================
// Letter Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_exclusions_respected(
        seed in any::<u64>(),
        strategy in 0u8..4,
        difficulty in proptest::option::of(1u8..=5),
        excluded in proptest::collection::btree_set(0usize..26, 0..25),
    ) {
        let excluded: BTreeSet<char> = excluded.into_iter().map(|i| ALPHABET[i]).collect();
        let mut generator = LetterGenerator::new(seed);
        let options = LetterOptions {
            difficulty,
            exclude_letters: excluded.clone(),
            ..Default::default()
        };

        let letter = generator.generate(strategy_from(strategy), &options);
        prop_assert!(ALPHABET.contains(&letter));
        prop_assert!(!excluded.contains(&letter));
    }

    #[test]
    fn prop_allowed_set_respected(
        seed in any::<u64>(),
        strategy in 0u8..4,
        allowed in proptest::collection::btree_set(0usize..26, 1..8),
        prefer_vowels in any::<bool>(),
    ) {
        let allowed: BTreeSet<char> = allowed.into_iter().map(|i| ALPHABET[i]).collect();
        let mut generator = LetterGenerator::new(seed);
        let mut options = LetterOptions::default().allowing(allowed.iter().copied());
        options.prefer_vowels = prefer_vowels;

        let letter = generator.generate(strategy_from(strategy), &options);
        prop_assert!(allowed.contains(&letter));
    }

    #[test]
    fn prop_balanced_set_distinct(seed in any::<u64>(), n in 0usize..40) {
        let mut generator = LetterGenerator::new(seed);
        let set = generator.generate_balanced_set(n);

        prop_assert_eq!(set.len(), n.min(26));
        let distinct: BTreeSet<char> = set.iter().copied().collect();
        prop_assert_eq!(distinct.len(), set.len());
        if set.len() >= 2 {
            prop_assert!(set.iter().any(|c| LetterGenerator::is_vowel(*c)));
            prop_assert!(set.iter().any(|c| !LetterGenerator::is_vowel(*c)));
        }
    }

    #[test]
    fn prop_rarity_in_range(index in 0usize..26) {
        let table = LetterFrequencyTable::builtin();
        let rarity = table.rarity(ALPHABET[index]);
        prop_assert!((0.0..=10.0).contains(&rarity));
    }
}

// ============================================================
// Cache Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_cache_never_exceeds_capacity(
        max_size in 1usize..16,
        keys in proptest::collection::vec(0u32..64, 0..200),
    ) {
        let clock = Arc::new(ManualClock::new());
        let mut cache = IntelligentCache::new(CacheProfile { ttl_ms: 1_000, max_size }, clock);
        for key in keys {
            cache.set(key, key * 2);
            prop_assert!(cache.len() <= max_size);
        }
        let stats = cache.get_stats();
        prop_assert!(stats.size <= stats.capacity);
    }

    #[test]
    fn prop_expired_entries_never_returned(
        ttl_ms in 1u64..500,
        elapsed_ms in 0u64..1_000,
    ) {
        let clock = Arc::new(ManualClock::new());
        let mut cache = IntelligentCache::new(CacheProfile { ttl_ms, max_size: 4 }, clock.clone());
        cache.set("key", 1);
        clock.advance(Duration::from_millis(elapsed_ms));

        let value = cache.get(&"key");
        if elapsed_ms >= ttl_ms {
            prop_assert_eq!(value, None);
        } else {
            prop_assert_eq!(value, Some(1));
        }
    }

    #[test]
    fn prop_hit_rate_is_ratio(reads in proptest::collection::vec(0u8..8, 1..60)) {
        let clock = Arc::new(ManualClock::new());
        let mut cache = IntelligentCache::new(CacheProfile { ttl_ms: 10_000, max_size: 8 }, clock);
        for key in 0u8..4 {
            cache.set(key, ());
        }
        for key in &reads {
            cache.get(key);
        }
        let stats = cache.get_stats();
        prop_assert_eq!(stats.hits + stats.misses, reads.len() as u64);
        prop_assert!((0.0..=1.0).contains(&stats.hit_rate));
    }
}

// ============================================================
// Category Store Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_difficulty_range_filter(lo in -3i64..9, hi in -3i64..9) {
        let store = CategoryStore::with_defaults();
        let result = store.get_categories_by_difficulty_range(lo, hi);
        for category in &result {
            prop_assert!((lo..=hi).contains(&(category.difficulty as i64)));
        }
        if lo > hi {
            prop_assert!(result.is_empty());
        }
    }

    #[test]
    fn prop_letter_filter_compatible(index in 0usize..26) {
        let store = CategoryStore::with_defaults();
        let letter = ALPHABET[index];
        for category in store.get_categories_by_letter(letter) {
            prop_assert!(category.is_compatible(letter));
        }
    }

    #[test]
    fn prop_random_pick_resolves_by_id(seed in any::<u64>()) {
        let store = CategoryStore::with_defaults().with_seed(seed);
        for _ in 0..1000 {
            let picked = store.get_random_category();
            let resolved = store.get_category_by_id(&picked.id);
            prop_assert_eq!(
                resolved.as_deref(),
                Some(picked.as_ref())
            );
        }
    }

    #[test]
    fn prop_loaded_records_are_valid(
        records in proptest::collection::vec((0u8..8, 0usize..4), 0..12)
    ) {
        let catalog: Vec<Category> = records
            .iter()
            .enumerate()
            .map(|(i, &(difficulty, words))| Category {
                id: format!("cat_{i}"),
                name: format!("Category {i}"),
                difficulty,
                words: (0..words).map(|w| format!("word{w}")).collect(),
                metadata: CategoryMetadata::default(),
            })
            .collect();
        let any_valid = records
            .iter()
            .any(|&(difficulty, words)| (1..=5).contains(&difficulty) && words > 0);

        let store = CategoryStore::from_categories(catalog);
        prop_assert!(!store.is_empty());
        for category in store.all_categories() {
            prop_assert!((1..=5).contains(&category.difficulty));
            prop_assert!(!category.words.is_empty());
            prop_assert_eq!(category.id.starts_with("cat_"), any_valid);
        }
    }
}
