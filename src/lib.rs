//! Word Round - Round Generation Core
//!
//! This crate produces the (category, starting letter) pairs a category
//! word game plays one round at a time:
//! - Category store (catalog loading, difficulty/letter/tag queries)
//! - Letter generation (frequency weighted strategies, vowel balance)
//! - Combination generation (retry loop, playability checks, fallback)
//! - TTL + LRU caching with periodic sweeps
//! - Signal bus for generation events
//! - Storage boundary (in-memory and JSON file backends)
//! - Monte-Carlo distribution checks
//! - Bevy plugin (feature `bevy`)

pub mod balance;
pub mod cache;
pub mod categories;
pub mod constants;
pub mod engine;
pub mod generation;
pub mod letters;
pub mod logging;
pub mod signals;
pub mod storage;
