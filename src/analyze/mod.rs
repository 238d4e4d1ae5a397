// src/analyze/mod.rs
//! Content analysis: normalization, fuzzy matching and risk scoring.
//! Everything here is pure; no locks, no per-user state.

pub mod distance;
pub mod lexicon;
pub mod normalize;
pub mod scoring;
pub mod tokens;

// Re-export convenient types.
pub use crate::analyze::distance::distance;
pub use crate::analyze::lexicon::{IndicatorSet, Lexicon, LexiconEntry};
pub use crate::analyze::normalize::{normalize, NormalizeOptions};
pub use crate::analyze::scoring::{
    score, MatchKind, MatchRecord, RiskResult, RiskScorer, ScanOptions, ScoringConfig,
};
pub use crate::analyze::tokens::{SlidingWindows, TokenSource, WhitespaceTokens};
