//! Monte-Carlo Distribution Simulation
//!
//! Runs many independently seeded sessions and checks that generated rounds
//! spread across categories and letters instead of collapsing onto a few
//! favorites. Uses rayon for parallel execution across CPU cores.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::DEFAULT_ROUND;
use crate::generation::{CombinationGenerator, GenerationOptions, RoundSeed};

/// Configuration for a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub sessions: u64,
    pub rounds_per_session: u32,
    pub round_type: String,
    pub base_seed: u64,
    pub target_difficulty: Option<u8>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sessions: 200,
            rounds_per_session: 20,
            round_type: DEFAULT_ROUND.to_string(),
            base_seed: 42,
            target_difficulty: None,
        }
    }
}

/// How evenly rounds spread over the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionGrade {
    Excellent, // dominance < 1.5
    Good,      // dominance < 2.5
    Fair,      // dominance < 4.0
    Poor,      // dominance >= 4.0
}

impl DistributionGrade {
    /// `dominance` = top category share × catalog size (1.0 is perfectly even)
    pub fn from_dominance(dominance: f64) -> Self {
        if dominance < 1.5 {
            Self::Excellent
        } else if dominance < 2.5 {
            Self::Good
        } else if dominance < 4.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionReport {
    pub sessions: u64,
    pub total_rounds: u64,
    pub letter_histogram: BTreeMap<char, u64>,
    pub category_histogram: BTreeMap<String, u64>,
    pub catalog_size: usize,
    pub fallback_rate: f64,
    pub average_difficulty: f64,
    pub average_playability: f64,
    pub top_category: Option<String>,
    pub top_category_share: f64,
    pub dominance: f64,
    pub grade: DistributionGrade,
}

#[derive(Default)]
struct SessionResult {
    letters: Vec<char>,
    categories: Vec<String>,
    fallbacks: u64,
    difficulty_sum: f64,
    playability_sum: f64,
    catalog_size: usize,
}

fn simulate_session(seed: u64, config: &SimConfig) -> SessionResult {
    let mut generator = CombinationGenerator::new(None, None, seed);
    let options = GenerationOptions {
        target_difficulty: config.target_difficulty,
        ..Default::default()
    };

    let mut result = SessionResult {
        catalog_size: generator
            .categories()
            .categories()
            .map(|c| c.len())
            .unwrap_or_default(),
        ..Default::default()
    };
    for _ in 0..config.rounds_per_session {
        let combination = generator.generate_combination(&config.round_type, &options);
        result.letters.push(combination.letter);
        result.categories.push(combination.category.id.clone());
        if combination.metadata.fallback {
            result.fallbacks += 1;
        }
        result.difficulty_sum += combination.difficulty;
        result.playability_sum += combination.playability.score;
    }
    result
}

/// Run the simulation with rayon parallelism
pub fn run_distribution_simulation(config: &SimConfig) -> DistributionReport {
    let root = RoundSeed::new(config.base_seed);
    let seeds: Vec<u64> = (0..config.sessions).map(|i| root.round_hash(i)).collect();

    let sessions: Vec<SessionResult> = seeds
        .par_iter()
        .map(|seed| simulate_session(*seed, config))
        .collect();

    analyze_sessions(&sessions, config.sessions)
}

fn analyze_sessions(sessions: &[SessionResult], session_count: u64) -> DistributionReport {
    let mut letter_histogram = BTreeMap::new();
    let mut category_histogram: BTreeMap<String, u64> = BTreeMap::new();
    let mut fallbacks = 0;
    let mut difficulty_sum = 0.0;
    let mut playability_sum = 0.0;
    let mut catalog_size = 0;

    for session in sessions {
        for letter in &session.letters {
            *letter_histogram.entry(*letter).or_insert(0) += 1;
        }
        for category in &session.categories {
            *category_histogram.entry(category.clone()).or_insert(0) += 1;
        }
        fallbacks += session.fallbacks;
        difficulty_sum += session.difficulty_sum;
        playability_sum += session.playability_sum;
        catalog_size = catalog_size.max(session.catalog_size);
    }

    let total_rounds: u64 = letter_histogram.values().sum();
    let (top_category, top_count) = category_histogram
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(id, count)| (Some(id.clone()), *count))
        .unwrap_or((None, 0));

    let ratio = |value: f64| {
        if total_rounds == 0 {
            0.0
        } else {
            value / total_rounds as f64
        }
    };
    let top_category_share = ratio(top_count as f64);
    let dominance = top_category_share * catalog_size.max(1) as f64;

    DistributionReport {
        sessions: session_count,
        total_rounds,
        letter_histogram,
        category_histogram,
        catalog_size,
        fallback_rate: ratio(fallbacks as f64),
        average_difficulty: ratio(difficulty_sum),
        average_playability: ratio(playability_sum),
        top_category,
        top_category_share,
        dominance,
        grade: DistributionGrade::from_dominance(dominance),
    }
}
