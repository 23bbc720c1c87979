//! Built-in category catalog
//!
//! Used whenever storage has nothing usable. Every record here passes
//! [`Category::sanitize`], and `animals` accepts the fallback letter.

use std::collections::BTreeSet;

use super::{Category, CategoryMetadata};

/// The full built-in catalog
pub fn default_categories() -> Vec<Category> {
    vec![
        animals(),
        category(
            "fruits",
            "Fruits",
            1,
            "food",
            &["food", "nature", "kids"],
            "ABCDGKLMNOPRST",
            180,
            &[
                "apple", "apricot", "banana", "blueberry", "cherry", "coconut", "date", "grape",
                "guava", "kiwi", "lemon", "lime", "mango", "melon", "nectarine", "orange",
                "papaya", "peach", "pear", "plum", "raspberry", "strawberry", "tangerine",
            ],
        ),
        category(
            "colors",
            "Colors",
            1,
            "art",
            &["art", "kids"],
            "ABCGLMOPRSTV",
            120,
            &[
                "amber", "azure", "beige", "black", "blue", "crimson", "cyan", "gold", "green",
                "lavender", "magenta", "maroon", "olive", "orange", "pink", "purple", "red",
                "silver", "teal", "turquoise", "violet",
            ],
        ),
        category(
            "body_parts",
            "Body Parts",
            1,
            "science",
            &["science", "kids"],
            "ABCEFHKLNST",
            110,
            &[
                "ankle", "arm", "back", "cheek", "chin", "ear", "elbow", "eye", "finger", "foot",
                "hand", "heart", "knee", "leg", "lung", "neck", "nose", "shoulder", "thumb",
                "toe",
            ],
        ),
        category(
            "countries",
            "Countries",
            2,
            "geography",
            &["geography", "world"],
            "ABCDEFGIJKLMNPRSTUV",
            195,
            &[
                "argentina", "australia", "brazil", "canada", "chile", "denmark", "egypt", "libya",
                "france", "germany", "greece", "india", "ireland", "japan", "kenya", "mexico",
                "norway", "peru", "portugal", "romania", "spain", "sweden", "thailand", "uganda",
                "vietnam",
            ],
        ),
        category(
            "sports",
            "Sports",
            2,
            "leisure",
            &["leisure", "active"],
            "ABCDFGHKLRST",
            160,
            &[
                "archery", "badminton", "baseball", "basketball", "boxing", "cricket", "cycling",
                "diving", "fencing", "football", "golf", "handball", "hockey", "karate",
                "lacrosse", "rowing", "rugby", "sailing", "skiing", "soccer", "surfing", "tennis",
            ],
        ),
        category(
            "occupations",
            "Occupations",
            2,
            "work",
            &["work", "people"],
            "ABCDEFGJLMNPST",
            250,
            &[
                "accountant", "architect", "baker", "butcher", "carpenter", "chef", "dentist",
                "doctor", "electrician", "engineer", "farmer", "gardener", "journalist", "lawyer",
                "mechanic", "nurse", "pilot", "plumber", "scientist", "teacher", "tailor",
            ],
        ),
        category(
            "vegetables",
            "Vegetables",
            2,
            "food",
            &["food", "nature"],
            "ABCGKLOPRST",
            130,
            &[
                "artichoke", "asparagus", "beet", "broccoli", "cabbage", "carrot", "celery",
                "corn", "garlic", "kale", "leek", "lettuce", "okra", "onion", "parsnip", "pea",
                "potato", "radish", "spinach", "squash", "tomato", "turnip",
            ],
        ),
        category(
            "cities",
            "World Cities",
            3,
            "geography",
            &["geography", "world", "travel"],
            "ABCDLMNPRST",
            300,
            &[
                "amsterdam", "athens", "bangkok", "berlin", "cairo", "chicago", "dublin",
                "delhi", "lisbon", "london", "madrid", "moscow", "nairobi", "paris", "prague",
                "rome", "seoul", "sydney", "tokyo", "toronto",
            ],
        ),
        category(
            "musical_instruments",
            "Musical Instruments",
            3,
            "music",
            &["music", "art"],
            "BCDFGHOPST",
            90,
            &[
                "bagpipes", "banjo", "bassoon", "cello", "clarinet", "drums", "flute", "guitar",
                "harp", "harmonica", "oboe", "organ", "piano", "saxophone", "sitar", "trumpet",
                "tuba", "trombone",
            ],
        ),
        category(
            "mythical_creatures",
            "Mythical Creatures",
            4,
            "fantasy",
            &["fantasy", "literature"],
            "BCDGHMPSTUW",
            80,
            &[
                "banshee", "basilisk", "centaur", "chimera", "cyclops", "dragon", "goblin",
                "griffin", "hydra", "mermaid", "minotaur", "pegasus", "phoenix", "sphinx",
                "troll", "unicorn", "werewolf",
            ],
        ),
        category(
            "chemical_elements",
            "Chemical Elements",
            5,
            "science",
            &["science", "education"],
            "ABCHINOPST",
            118,
            &[
                "argon", "arsenic", "barium", "boron", "calcium", "carbon", "chlorine", "helium",
                "hydrogen", "iodine", "iron", "neon", "nitrogen", "oxygen", "phosphorus",
                "platinum", "silicon", "sodium", "sulfur", "tin", "titanium",
            ],
        ),
    ]
}

/// Category used by the generation fallback path
pub fn fallback_category() -> Category {
    animals()
}

fn animals() -> Category {
    category(
        "animals",
        "Animals",
        1,
        "nature",
        &["nature", "kids"],
        "ABCDEFGHKLMOPRSTWZ",
        400,
        &[
            "alligator", "bear", "beaver", "camel", "cat", "cheetah", "deer", "dog", "dolphin",
            "eagle", "elephant", "fox", "giraffe", "gorilla", "horse", "kangaroo", "koala", "lion",
            "monkey", "owl", "panda", "parrot", "rabbit", "shark", "snake", "squirrel", "tiger",
            "turtle", "whale", "wolf", "zebra",
        ],
    )
}

#[allow(clippy::too_many_arguments)]
fn category(
    id: &str,
    name: &str,
    difficulty: u8,
    theme: &str,
    tags: &[&str],
    letters: &str,
    estimated_words: u32,
    words: &[&str],
) -> Category {
    let total_len: usize = words.iter().map(|w| w.chars().count()).sum();
    let average_word_length = if words.is_empty() {
        0.0
    } else {
        total_len as f32 / words.len() as f32
    };

    Category {
        id: id.into(),
        name: name.into(),
        difficulty,
        words: words.iter().map(|w| w.to_string()).collect(),
        metadata: CategoryMetadata {
            letter_compatibility: letters.chars().collect(),
            tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            theme: theme.into(),
            estimated_words,
            average_word_length,
        },
    }
}
