//! Candidate generation for lexicon matching.
//!
//! The scorer compares every lexicon word against a sequence of candidate
//! strings. Where those candidates come from is the only difference between
//! the two scan modes, so it sits behind [`TokenSource`].

/// Produces the candidate strings a lexicon word is compared against.
pub trait TokenSource: Send + Sync {
    /// Candidates in `text` for a lexicon word that is `word_len` chars long.
    fn candidates<'a>(&self, text: &'a str, word_len: usize)
        -> Box<dyn Iterator<Item = &'a str> + 'a>;
}

/// Whitespace-separated tokens; empty tokens are skipped.
#[derive(Clone, Copy, Debug, Default)]
pub struct WhitespaceTokens;

impl TokenSource for WhitespaceTokens {
    fn candidates<'a>(
        &self,
        text: &'a str,
        _word_len: usize,
    ) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        Box::new(text.split_whitespace())
    }
}

/// Every substring of exactly `word_len` chars, left to right.
///
/// Used when whitespace has been stripped, so words glued together
/// ("youarespam") are still found.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlidingWindows;

impl TokenSource for SlidingWindows {
    fn candidates<'a>(
        &self,
        text: &'a str,
        word_len: usize,
    ) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        if word_len == 0 {
            return Box::new(std::iter::empty());
        }
        // Byte offset of every char boundary, including the end.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let count = bounds.len().saturating_sub(word_len);
        Box::new((0..count).map(move |i| &text[bounds[i]..bounds[i + word_len]]))
    }
}

static WHITESPACE: WhitespaceTokens = WhitespaceTokens;
static WINDOWS: SlidingWindows = SlidingWindows;

/// Pick the token source for a scan mode.
pub fn source_for(without_whitespace: bool) -> &'static dyn TokenSource {
    if without_whitespace {
        &WINDOWS
    } else {
        &WHITESPACE
    }
}

/// Number of whitespace-separated tokens in `text`.
pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}
