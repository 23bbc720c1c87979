//! JSON wire shape tests
//!
//! Verifies the field names and value formats other components rely on:
//! combinations, signals, catalogs, round configs, frequency tables.

use serde_json::Value;
use std::sync::{Arc, Mutex};

use wordround_core::categories::{default_categories, parse_catalog, CategoryStore};
use wordround_core::constants::{CHALLENGE_ROUND, QUICK_ROUND};
use wordround_core::engine::EngineConfig;
use wordround_core::generation::{
    Combination, CombinationGenerator, GenerationOptions, RoundConfig, RoundRegistry,
};
use wordround_core::letters::{LetterFrequencyTable, LetterStrategy};
use wordround_core::signals::{Signal, SignalBus};

#[test]
fn combination_field_names() {
    let mut generator = CombinationGenerator::new(None, None, 42);
    let combination = generator.generate_combination(QUICK_ROUND, &GenerationOptions::default());
    let value = serde_json::to_value(&combination).unwrap();

    assert!(value["category"]["id"].is_string());
    assert!(value["category"]["metadata"]["letterCompatibility"].is_array());
    assert_eq!(value["letter"].as_str().unwrap().len(), 1);
    assert!(value["difficulty"].is_number());
    assert!(value["playability"]["estimatedWords"].is_u64());
    assert_eq!(value["roundConfig"]["name"], QUICK_ROUND);
    assert_eq!(value["roundConfig"]["duration"], 45);
    assert_eq!(value["roundConfig"]["targetWordCount"], 3);
    assert_eq!(value["metadata"]["generationType"], "advanced");
    assert!(value["metadata"]["generatedAt"].is_string());
    assert!(value["metadata"]["fallback"].is_boolean());

    let back: Combination = serde_json::from_value(value).unwrap();
    assert_eq!(back.category.id, combination.category.id);
    assert_eq!(back.letter, combination.letter);
    assert_eq!(back.round_config, combination.round_config);
    assert_eq!(back.metadata, combination.metadata);
}

#[test]
fn legacy_generation_type() {
    let mut generator = CombinationGenerator::new(None, None, 7);
    let combination = generator.generate_legacy_combination(QUICK_ROUND);
    let value = serde_json::to_value(&combination).unwrap();
    assert_eq!(value["metadata"]["generationType"], "legacy");
}

#[test]
fn signal_names_and_tags() {
    let bus = SignalBus::new();
    let seen: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    bus.subscribe(move |signal: &Signal| {
        let mut value = serde_json::to_value(signal).unwrap();
        value["name"] = Value::String(signal.name().to_string());
        sink.lock().unwrap().push(value);
    });

    let store = Arc::new(CategoryStore::with_defaults().with_signals(bus.clone()));
    let mut generator = CombinationGenerator::new(Some(store), None, 3).with_signals(bus);
    generator.generate_combination(QUICK_ROUND, &GenerationOptions::default());

    let seen = seen.lock().unwrap();
    let combination = seen
        .iter()
        .find(|v| v["type"] == "combination_generated")
        .expect("combination signal");
    assert_eq!(combination["name"], "combination:generated");
    assert!(combination["combination"]["category"]["id"].is_string());
    assert!(combination["timestamp"].is_string());

    let category = seen
        .iter()
        .find(|v| v["type"] == "category_selected")
        .expect("category signal");
    assert_eq!(category["name"], "category:selected");
    assert!(category["category_id"].is_string());
    assert!(category["difficulty"].is_u64());
}

#[test]
fn letter_strategy_names() {
    for (strategy, name) in [
        (LetterStrategy::Random, "random"),
        (LetterStrategy::Balanced, "balanced"),
        (LetterStrategy::Challenging, "challenging"),
        (LetterStrategy::Frequency, "frequency"),
    ] {
        assert_eq!(serde_json::to_value(strategy).unwrap(), name);
        assert_eq!(LetterStrategy::from_name(name), strategy);
    }
    let unknown: LetterStrategy = serde_json::from_str(r#""wild""#).unwrap();
    assert_eq!(unknown, LetterStrategy::Balanced);
}

#[test]
fn catalog_export_reparses() {
    let store = CategoryStore::with_defaults();
    let json = store.export_json().unwrap();
    let parsed = parse_catalog(&json).unwrap();
    let defaults = default_categories();
    assert_eq!(parsed.len(), defaults.len());
    for (parsed, original) in parsed.iter().zip(&defaults) {
        assert_eq!(parsed.id, original.id);
        assert_eq!(parsed.words, original.words);
        assert_eq!(
            parsed.metadata.letter_compatibility,
            original.metadata.letter_compatibility
        );
    }
}

#[test]
fn round_config_wire_names() {
    let value = serde_json::to_value(RoundConfig::challenge_round()).unwrap();
    assert_eq!(value["duration"], 120);
    assert_eq!(value["targetWordCount"], 8);
    assert_eq!(value["scoring"]["basePoints"], 15);
    assert_eq!(value["scoring"]["streakMultiplier"], 2.0);
}

#[test]
fn round_configs_merge_from_json() {
    let mut registry = RoundRegistry::builtin();
    let added = registry
        .merge_json(
            r#"[
                {"name": "blitz", "duration": 20, "difficulty": 3, "targetWordCount": 2},
                {"name": "broken", "duration": 0, "difficulty": 3, "targetWordCount": 2},
                {"name": "challenge", "duration": 200, "difficulty": 5, "targetWordCount": 10}
            ]"#,
        )
        .unwrap();

    assert_eq!(added, 2);
    assert!(registry.contains("blitz"));
    assert!(!registry.contains("broken"));
    assert_eq!(registry.get(CHALLENGE_ROUND).duration_secs, 200);
    assert_eq!(registry.get("blitz").scoring.base_points, 10);
}

#[test]
fn frequency_table_wire_shape() {
    let table = LetterFrequencyTable::builtin();
    let value: Value = serde_json::from_str(&table.to_json()).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 26);
    assert_eq!(object["E"], 1.0);

    let back = LetterFrequencyTable::from_json(&table.to_json()).unwrap();
    assert_eq!(back, table);
}

#[test]
fn engine_config_json_and_ron_agree() {
    let from_json = EngineConfig::from_json(r#"{"seed": 3, "default_round": "quick"}"#).unwrap();
    let from_ron = EngineConfig::from_ron(r#"(seed: Some(3), default_round: "quick")"#).unwrap();
    assert_eq!(from_json, from_ron);
}
