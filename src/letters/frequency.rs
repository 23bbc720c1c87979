//! Letter frequency table and weighted sampling distributions

use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{ALPHABET, LETTER_FREQUENCIES, MAX_RARITY_SCORE};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrequencyTableError {
    #[error("Frequency table is missing letter {0}")]
    MissingLetter(char),
    #[error("Letter {letter} has invalid weight {weight}")]
    InvalidWeight { letter: char, weight: f64 },
    #[error("Unknown letter key {0:?}")]
    UnknownLetter(String),
    #[error("Frequency table JSON error: {0}")]
    Json(String),
}

/// Relative frequency for each of A-Z, all in (0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct LetterFrequencyTable {
    weights: [f64; 26],
}

impl LetterFrequencyTable {
    pub fn builtin() -> Self {
        let mut weights = [0.0; 26];
        for (letter, weight) in LETTER_FREQUENCIES {
            weights[index_of(letter)] = weight;
        }
        Self { weights }
    }

    /// Every letter must be present with a finite positive weight.
    /// Weights are rescaled so the most frequent letter is 1.0.
    pub fn from_map(map: &BTreeMap<char, f64>) -> Result<Self, FrequencyTableError> {
        let mut weights = [0.0; 26];
        for letter in ALPHABET {
            let weight = *map
                .get(&letter)
                .ok_or(FrequencyTableError::MissingLetter(letter))?;
            if !weight.is_finite() || weight <= 0.0 {
                return Err(FrequencyTableError::InvalidWeight { letter, weight });
            }
            weights[index_of(letter)] = weight;
        }

        let max = weights.iter().copied().fold(f64::MIN, f64::max);
        for w in &mut weights {
            *w /= max;
        }
        Ok(Self { weights })
    }

    pub fn from_json(json: &str) -> Result<Self, FrequencyTableError> {
        let raw: BTreeMap<String, f64> =
            serde_json::from_str(json).map_err(|e| FrequencyTableError::Json(e.to_string()))?;
        Self::try_from(raw)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Weight of an A-Z letter (case-insensitive), 0 for anything else
    pub fn weight(&self, letter: char) -> f64 {
        let letter = letter.to_ascii_uppercase();
        if letter.is_ascii_uppercase() {
            self.weights[index_of(letter)]
        } else {
            0.0
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// 0 for the most frequent letter, 10 for the rarest, log scale between
    pub fn rarity(&self, letter: char) -> f64 {
        let weight = self.weight(letter);
        if weight <= 0.0 {
            return 0.0;
        }
        let max = self.weights.iter().copied().fold(f64::MIN, f64::max);
        let min = self.weights.iter().copied().fold(f64::MAX, f64::min);
        if max <= min {
            return 0.0;
        }
        ((max / weight).ln() / (max / min).ln() * MAX_RARITY_SCORE).clamp(0.0, MAX_RARITY_SCORE)
    }
}

impl Default for LetterFrequencyTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TryFrom<BTreeMap<String, f64>> for LetterFrequencyTable {
    type Error = FrequencyTableError;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut map = BTreeMap::new();
        for (key, weight) in raw {
            let mut chars = key.trim().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => {
                    map.insert(c.to_ascii_uppercase(), weight);
                }
                _ => return Err(FrequencyTableError::UnknownLetter(key)),
            }
        }
        Self::from_map(&map)
    }
}

impl From<LetterFrequencyTable> for BTreeMap<String, f64> {
    fn from(table: LetterFrequencyTable) -> Self {
        ALPHABET
            .iter()
            .map(|&letter| (letter.to_string(), table.weight(letter)))
            .collect()
    }
}

fn index_of(letter: char) -> usize {
    (letter as u8 - b'A') as usize
}

/// Candidate letters with a precomputed cumulative distribution
#[derive(Debug, Clone)]
pub struct LetterDistribution {
    letters: Vec<char>,
    index: WeightedIndex<f64>,
}

impl LetterDistribution {
    /// Fails when there are no candidates or every weight is zero
    pub fn new(weighted: &[(char, f64)]) -> Result<Self, WeightedError> {
        let index = WeightedIndex::new(weighted.iter().map(|(_, w)| *w))?;
        Ok(Self {
            letters: weighted.iter().map(|(c, _)| *c).collect(),
            index,
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        self.letters[self.index.sample(rng)]
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }
}
