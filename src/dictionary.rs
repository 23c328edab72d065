//! Dictionary capability used to validate placed and stolen words.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, instrument};

use crate::config::ConfigError;

/// Decides whether an uppercase word is playable.
///
/// Implementations must be pure and synchronous; the game core calls them
/// while holding the session lock.
pub trait Dictionary: Send + Sync {
    /// Whether `word` (uppercase A-Z) is a valid word.
    fn is_valid_word(&self, word: &str) -> bool;
}

/// Word list held in memory.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: HashSet<String>,
}

impl WordList {
    /// Builds a list from words in any case.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_ascii_uppercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Loads a newline-separated word list. Lines starting with `#` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read word list: {}", e)))?;
        let list = Self::from_words(content.lines().filter(|line| !line.starts_with('#')));
        info!(words = list.len(), "Word list loaded");
        Ok(list)
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Dictionary for WordList {
    fn is_valid_word(&self, word: &str) -> bool {
        self.words.contains(word)
    }
}

/// Accepts any alphabetic word of two or more letters.
///
/// Used when no word list is configured, e.g. in local development.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveDictionary;

impl Dictionary for PermissiveDictionary {
    fn is_valid_word(&self, word: &str) -> bool {
        word.len() >= 2 && word.chars().all(|ch| ch.is_ascii_alphabetic())
    }
}
