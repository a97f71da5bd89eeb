//! Profanity check seam
//!
//! Chat text passes through a pluggable content check before it is
//! formatted and fanned out. The policy itself is external; this module
//! defines the capability and a small built-in word-list default.

/// Content check consulted before chat text is accepted
pub trait ProfanityFilter: Send {
    /// Returns true when `text` must be rejected
    fn is_profane(&self, text: &str) -> bool;
}

/// Word-list based filter
///
/// Matches whole words, case-insensitively, against a configured list.
/// Substrings inside longer words do not match ("class" is clean even
/// when "ass" is listed).
#[derive(Debug, Clone)]
pub struct WordListFilter {
    words: Vec<String>,
}

/// Starter word list for the default filter
const DEFAULT_WORDS: &[&str] = &["ass", "bastard", "crap", "damn", "hell", "shit"];

impl WordListFilter {
    /// Create a filter with the given word list
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(|w| w.into().to_lowercase()).collect(),
        }
    }

    /// Add a word to the list
    pub fn add_word(&mut self, word: &str) {
        self.words.push(word.to_lowercase());
    }
}

impl Default for WordListFilter {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS.iter().copied())
    }
}

impl ProfanityFilter for WordListFilter {
    fn is_profane(&self, text: &str) -> bool {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .any(|word| {
                let word = word.to_lowercase();
                self.words.iter().any(|listed| *listed == word)
            })
    }
}
