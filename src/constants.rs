//! Centralized constants for the round generation core.
//!
//! Formula weights, thresholds and the built-in letter frequency table live
//! here so the generators and their tests agree on one set of numbers.

// =====================================================
// Alphabet
// =====================================================

/// Uppercase A-Z in order
pub const ALPHABET: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

pub const VOWELS: [char; 5] = ['A', 'E', 'I', 'O', 'U'];

/// English letter frequency normalized so that E = 1.0
pub const LETTER_FREQUENCIES: [(char, f64); 26] = [
    ('A', 0.6430),
    ('B', 0.1175),
    ('C', 0.2190),
    ('D', 0.3348),
    ('E', 1.0000),
    ('F', 0.1754),
    ('G', 0.1586),
    ('H', 0.4798),
    ('I', 0.5484),
    ('J', 0.0120),
    ('K', 0.0608),
    ('L', 0.3169),
    ('M', 0.1894),
    ('N', 0.5313),
    ('O', 0.5910),
    ('P', 0.1519),
    ('Q', 0.0075),
    ('R', 0.4713),
    ('S', 0.4981),
    ('T', 0.7130),
    ('U', 0.2171),
    ('V', 0.0770),
    ('W', 0.1858),
    ('X', 0.0118),
    ('Y', 0.1554),
    ('Z', 0.0058),
];

// =====================================================
// Letter generation
// =====================================================

/// Share of vowels the balanced strategy aims for
pub const VOWEL_TARGET_RATIO: f64 = 0.4;

/// Vowel share when the caller asks for vowels
pub const PREFERRED_VOWEL_RATIO: f64 = 0.6;

/// Vowel weight multiplier for non-balanced strategies with `prefer_vowels`
pub const PREFER_VOWEL_BOOST: f64 = 2.0;

/// Exponent step per difficulty level: weight^(1 - step * (d - 1)).
/// d=1 keeps raw frequency, d=4 is roughly uniform, d=5 favors rare letters.
pub const DIFFICULTY_EXPONENT_STEP: f64 = 0.35;

/// Upper end of the rarity scale (rarest letter in the table)
pub const MAX_RARITY_SCORE: f64 = 10.0;

// =====================================================
// Category data
// =====================================================

pub const MIN_CATEGORY_DIFFICULTY: u8 = 1;
pub const MAX_CATEGORY_DIFFICULTY: u8 = 5;

// =====================================================
// Combination scoring
// =====================================================

/// difficulty = CATEGORY_WEIGHT * category.difficulty + RARITY_WEIGHT * rarity
pub const DIFFICULTY_CATEGORY_WEIGHT: f64 = 1.2;
pub const DIFFICULTY_RARITY_WEIGHT: f64 = 0.4;
pub const MIN_DIFFICULTY_SCORE: f64 = 1.0;
pub const MAX_DIFFICULTY_SCORE: f64 = 10.0;

/// Average word length considered neutral for playability
pub const IDEAL_WORD_LENGTH: f64 = 6.0;
pub const MIN_LENGTH_FACTOR: f64 = 0.5;
pub const MAX_LENGTH_FACTOR: f64 = 1.25;

/// Playability saturates at 10 once estimated words reach this multiple of the target
pub const PLAYABILITY_COVERAGE_FACTOR: f64 = 2.0;

pub const MAX_PLAYABILITY_SCORE: f64 = 10.0;

// =====================================================
// Generation control
// =====================================================

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Hard ceiling for configured attempts
pub const MAX_ATTEMPTS_CEILING: u32 = 10;

pub const DEFAULT_HISTORY_SIZE: usize = 32;

/// Category and letter used when every attempt failed
pub const FALLBACK_CATEGORY_ID: &str = "animals";
pub const FALLBACK_LETTER: char = 'S';

pub const DEFAULT_ROUND: &str = "default";
pub const QUICK_ROUND: &str = "quick";
pub const CHALLENGE_ROUND: &str = "challenge";

// =====================================================
// Caching & startup
// =====================================================

pub const CATEGORY_CACHE_TTL_MS: u64 = 300_000;
pub const CATEGORY_CACHE_SIZE: usize = 128;

pub const LETTER_CACHE_TTL_MS: u64 = 600_000;
pub const LETTER_CACHE_SIZE: usize = 64;

pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60_000;

/// Upper bound on waiting for the storage collaborator during init
pub const DEFAULT_INIT_TIMEOUT_MS: u64 = 2_000;
