//! Dictionary of guessable words and hidden-word selection.
//!
//! Words are stored uppercase; lookups are case-insensitive.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of every word in the game
pub const WORD_LENGTH: usize = 5;

/// The standard word list
const STANDARD_WORDS: [&str; 57] = [
    "apple", "grape", "mango", "pearl", "stone",
    "chair", "table", "plant", "light", "sound",
    "crane", "flame", "brick", "sword", "cloud",
    "coder", "debug", "array", "stack", "queue",
    "globe", "flock", "brave", "charm", "dwarf",
    "lunar", "comet", "popup", "pixel", "vivid",
    "frost", "blaze", "lemon", "candy", "baker",
    "burst", "quest", "dream", "tiger", "zebra",
    "nerdy", "grant", "juice", "stove", "scale",
    "cigar", "movie", "focus", "piano", "robot",
    "evade", "watch", "erode", "refer", "awake",
    "serve", "trace",
];

/// Errors from building a custom dictionary
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DictionaryError {
    #[error("Dictionary has no words")]
    Empty,

    #[error("Not a five-letter word: {0:?}")]
    InvalidWord(String),
}

/// A fixed set of uppercase words of equal length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Dictionary {
    /// Sorted, deduplicated, uppercase
    words: Vec<String>,
}

impl Dictionary {
    /// The built-in word list
    pub fn standard() -> Self {
        let mut words: Vec<String> = STANDARD_WORDS
            .iter()
            .map(|w| w.to_ascii_uppercase())
            .collect();
        words.sort();
        words.dedup();
        Self { words }
    }

    /// Build a dictionary from arbitrary words.
    ///
    /// Every word must be exactly [`WORD_LENGTH`] ASCII letters.
    pub fn from_words<I, S>(words: I) -> Result<Self, DictionaryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized = Vec::new();
        for word in words {
            let word = word.as_ref().trim();
            if word.len() != WORD_LENGTH || !word.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(DictionaryError::InvalidWord(word.to_string()));
            }
            normalized.push(word.to_ascii_uppercase());
        }

        if normalized.is_empty() {
            return Err(DictionaryError::Empty);
        }

        normalized.sort();
        normalized.dedup();
        Ok(Self { words: normalized })
    }

    /// Whether `word` is a valid guess (case-insensitive)
    pub fn contains(&self, word: &str) -> bool {
        let upper = word.to_ascii_uppercase();
        self.words.binary_search(&upper).is_ok()
    }

    /// Pick a hidden word uniformly at random
    pub fn random_word<R: Rng>(&self, rng: &mut R) -> String {
        // Construction guarantees at least one word
        self.words.choose(rng).cloned().unwrap_or_default()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<String>> for Dictionary {
    type Error = DictionaryError;

    fn try_from(words: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_words(words)
    }
}

impl From<Dictionary> for Vec<String> {
    fn from(dictionary: Dictionary) -> Self {
        dictionary.words
    }
}
