//! Command-line round generator
//!
//! Usage: `wordround [round_type] [count] [seed]`
//!
//! Environment:
//! - `WORDROUND_CONFIG`: engine config file (`.json` or `.ron`)
//! - `WORDROUND_DATA`: directory for JSON file storage (categories, letter
//!   frequencies, round configs, cache stats)

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use wordround_core::engine::{EngineConfig, RoundEngine};
use wordround_core::generation::GenerationOptions;
use wordround_core::logging;
use wordround_core::storage::{JsonFileStorage, Storage};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut config = match std::env::var("WORDROUND_CONFIG") {
        Ok(path) => EngineConfig::load_file(&PathBuf::from(&path))
            .with_context(|| format!("loading engine config from {path}"))?,
        Err(_) => EngineConfig::default(),
    };
    logging::init_tracing(&config.tracing);

    let mut args = std::env::args().skip(1);
    let round_type = args.next().unwrap_or_else(|| config.default_round.clone());
    let count: usize = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("invalid count: {raw}"))?,
        None => 1,
    };
    if let Some(raw) = args.next() {
        config.seed = Some(raw.parse().with_context(|| format!("invalid seed: {raw}"))?);
    }

    let storage: Option<Arc<dyn Storage>> = std::env::var("WORDROUND_DATA")
        .ok()
        .map(|dir| Arc::new(JsonFileStorage::new(dir)) as Arc<dyn Storage>);

    let mut engine = RoundEngine::init(config, storage).await;
    info!(seed = engine.seed().seed, round = %round_type, count, "Generating rounds");

    let options = GenerationOptions::default().unique();
    let batch = engine.generate_batch(count, &round_type, &options);
    println!("{}", serde_json::to_string_pretty(&batch)?);

    if engine.persist_cache_stats().await? {
        info!("Cache stats saved");
    }
    Ok(())
}
