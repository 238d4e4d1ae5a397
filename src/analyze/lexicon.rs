//! Weighted lexicon and indicator list.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ConfigError;

/// A flagged word and its base severity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub word: String,
    pub weight: f64,
}

impl LexiconEntry {
    pub fn new(word: impl Into<String>, weight: f64) -> Self {
        Self {
            word: word.into(),
            weight,
        }
    }
}

/// Ordered, case-folded, duplicate-free lexicon. Iteration order is scan order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lexicon {
    entries: Vec<LexiconEntry>,
}

impl Lexicon {
    pub fn new<I>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = LexiconEntry>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for e in entries {
            let word = e.word.trim().to_lowercase();
            if word.is_empty() {
                return Err(ConfigError::EmptyLexiconWord);
            }
            if !e.weight.is_finite() || e.weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    word,
                    weight: e.weight,
                });
            }
            if !seen.insert(word.clone()) {
                return Err(ConfigError::DuplicateLexiconWord(word));
            }
            out.push(LexiconEntry {
                word,
                weight: e.weight,
            });
        }
        Ok(Self { entries: out })
    }

    /// Convenience for tests and small setups.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        Self::new(pairs.into_iter().map(|(w, x)| LexiconEntry::new(w, x)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LexiconEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Context words that add a flat bonus when present anywhere in the text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndicatorSet {
    words: Vec<String>,
}

impl IndicatorSet {
    pub fn new<I, S>(words: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for w in words {
            let w = w.as_ref().to_lowercase();
            if w.trim().is_empty() {
                return Err(ConfigError::EmptyIndicator);
            }
            if seen.insert(w.clone()) {
                out.push(w);
            }
        }
        Ok(Self { words: out })
    }

    /// Indicators occurring as literal substrings of `text`, in configured order.
    pub fn found_in(&self, text: &str) -> Vec<String> {
        self.words
            .iter()
            .filter(|w| text.contains(w.as_str()))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
