//! Difficulty and playability formulas
//!
//! ```text
//! difficulty    = clamp(1.2 * category.difficulty + 0.4 * rarity(letter), 1, 10)
//! estimated     = max(direct, round(estimated_words * share(letter)))
//! length_factor = clamp(6 / average_word_length, 0.5, 1.25)
//! score         = clamp(10 * min(1, estimated / (2 * target)) * length_factor, 0, 10)
//! feasible      = compatible && estimated >= target
//! ```
//!
//! `direct` counts sample words starting with the letter; `share` is the
//! letter's weight over the total weight of the category's compatible letters.

use crate::categories::Category;
use crate::constants::{
    DIFFICULTY_CATEGORY_WEIGHT, DIFFICULTY_RARITY_WEIGHT, IDEAL_WORD_LENGTH, MAX_DIFFICULTY_SCORE,
    MAX_LENGTH_FACTOR, MAX_PLAYABILITY_SCORE, MIN_DIFFICULTY_SCORE, MIN_LENGTH_FACTOR,
    PLAYABILITY_COVERAGE_FACTOR,
};
use crate::letters::LetterFrequencyTable;

use super::{Playability, RoundConfig};

pub fn difficulty_score(category: &Category, letter: char, table: &LetterFrequencyTable) -> f64 {
    let raw = DIFFICULTY_CATEGORY_WEIGHT * category.difficulty as f64
        + DIFFICULTY_RARITY_WEIGHT * table.rarity(letter);
    raw.clamp(MIN_DIFFICULTY_SCORE, MAX_DIFFICULTY_SCORE)
}

/// Playable words the category likely has for `letter`
pub fn estimated_words(category: &Category, letter: char, table: &LetterFrequencyTable) -> u32 {
    let compatibility = &category.metadata.letter_compatibility;
    let pool_weight = if compatibility.is_empty() {
        table.total_weight()
    } else {
        compatibility.iter().map(|&c| table.weight(c)).sum()
    };

    let share = if pool_weight > 0.0 {
        table.weight(letter) / pool_weight
    } else {
        0.0
    };
    let projected = (category.metadata.estimated_words as f64 * share).round() as u32;
    projected.max(category.words_starting_with(letter) as u32)
}

pub fn length_factor(average_word_length: f32) -> f64 {
    if !average_word_length.is_finite() || average_word_length <= 0.0 {
        return 1.0;
    }
    (IDEAL_WORD_LENGTH / average_word_length as f64).clamp(MIN_LENGTH_FACTOR, MAX_LENGTH_FACTOR)
}

pub fn assess(
    category: &Category,
    letter: char,
    round: &RoundConfig,
    table: &LetterFrequencyTable,
) -> Playability {
    let target = round.target_word_count.max(1);
    let estimated = estimated_words(category, letter, table);

    let coverage = (estimated as f64 / (PLAYABILITY_COVERAGE_FACTOR * target as f64)).min(1.0);
    let score = (MAX_PLAYABILITY_SCORE
        * coverage
        * length_factor(category.metadata.average_word_length))
    .clamp(0.0, MAX_PLAYABILITY_SCORE);

    Playability {
        score,
        estimated_words: estimated,
        difficulty: difficulty_score(category, letter, table),
        feasible: category.is_compatible(letter) && estimated >= target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::{fallback_category, CategoryMetadata};
    use crate::constants::FALLBACK_LETTER;
    use std::collections::BTreeSet;

    fn category(difficulty: u8, letters: &[char], estimated: u32, avg: f32) -> Category {
        Category {
            id: "test".into(),
            name: "Test".into(),
            difficulty,
            words: vec!["sun".into(), "sea".into(), "moon".into()],
            metadata: CategoryMetadata {
                letter_compatibility: letters.iter().copied().collect::<BTreeSet<_>>(),
                estimated_words: estimated,
                average_word_length: avg,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_difficulty_formula() {
        let table = LetterFrequencyTable::builtin();
        let easy = category(1, &[], 100, 5.0);
        // E has zero rarity
        assert!((difficulty_score(&easy, 'E', &table) - 1.2).abs() < 1e-9);

        let hard = category(5, &[], 100, 5.0);
        // 6.0 + 0.4 * 10
        assert!((difficulty_score(&hard, 'Z', &table) - 10.0).abs() < 1e-9);
        assert!(difficulty_score(&hard, 'Q', &table) > difficulty_score(&hard, 'E', &table));
    }

    #[test]
    fn test_difficulty_clamped() {
        let table = LetterFrequencyTable::builtin();
        for d in 1..=5 {
            for letter in crate::constants::ALPHABET {
                let score = difficulty_score(&category(d, &[], 10, 5.0), letter, &table);
                assert!((1.0..=10.0).contains(&score));
            }
        }
    }

    #[test]
    fn test_estimated_uses_compatibility_share() {
        let table = LetterFrequencyTable::builtin();
        // Only S and M compatible: S takes S / (S + M) of the estimate
        let c = category(2, &['S', 'M'], 100, 5.0);
        let expected = (100.0 * table.weight('S') / (table.weight('S') + table.weight('M'))).round();
        assert_eq!(estimated_words(&c, 'S', &table), expected as u32);
    }

    #[test]
    fn test_estimated_never_below_direct_count() {
        let table = LetterFrequencyTable::builtin();
        let c = category(2, &[], 1, 5.0);
        assert_eq!(estimated_words(&c, 'S', &table), 2);
    }

    #[test]
    fn test_length_factor_bounds() {
        assert_eq!(length_factor(6.0), 1.0);
        assert_eq!(length_factor(100.0), MIN_LENGTH_FACTOR);
        assert_eq!(length_factor(1.0), MAX_LENGTH_FACTOR);
        assert_eq!(length_factor(0.0), 1.0);
    }

    #[test]
    fn test_assess_feasibility() {
        let table = LetterFrequencyTable::builtin();
        let round = RoundConfig::default_round();

        let rich = category(2, &['S', 'M'], 200, 6.0);
        let playability = assess(&rich, 'S', &round, &table);
        assert!(playability.feasible);
        assert_eq!(playability.score, 10.0);

        let incompatible = assess(&rich, 'Q', &round, &table);
        assert!(!incompatible.feasible);

        let sparse = category(2, &[], 3, 6.0);
        let thin = assess(&sparse, 'S', &round, &table);
        assert!(!thin.feasible, "2 sample words is below the 5-word target");
        assert!(thin.score < 10.0);
    }

    #[test]
    fn test_score_in_range() {
        let table = LetterFrequencyTable::builtin();
        let round = RoundConfig::challenge_round();
        for estimated in [0, 1, 10, 1000] {
            for avg in [1.0, 6.0, 20.0] {
                let p = assess(&category(3, &[], estimated, avg), 'T', &round, &table);
                assert!((0.0..=10.0).contains(&p.score));
            }
        }
    }

    #[test]
    fn test_builtin_fallback_is_feasible_everywhere() {
        let table = LetterFrequencyTable::builtin();
        let fallback = fallback_category();
        for round in [
            RoundConfig::default_round(),
            RoundConfig::quick_round(),
            RoundConfig::challenge_round(),
        ] {
            assert!(assess(&fallback, FALLBACK_LETTER, &round, &table).feasible);
        }
    }
}
