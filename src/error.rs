//! Construction-time errors.
//!
//! Everything that can be wrong with a moderation setup is caught while the
//! components are built. Event handling itself never fails: scan anomalies
//! produce a low score and tracker races resolve to one of the normal outcomes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{what}: window length must be positive (got {millis} ms)")]
    NonPositiveWindow { what: String, millis: i64 },

    #[error("{what}: window length must be at most {max_days} days")]
    WindowTooLong { what: String, max_days: i64 },

    #[error("{what}: count must be at least 1")]
    ZeroCount { what: String },

    #[error("lexicon contains an empty word")]
    EmptyLexiconWord,

    #[error("lexicon word `{0}` appears more than once (case-insensitive)")]
    DuplicateLexiconWord(String),

    #[error("lexicon word `{word}` has invalid weight {weight}")]
    InvalidWeight { word: String, weight: f64 },

    #[error("indicator list contains an empty entry")]
    EmptyIndicator,

    #[error("{name} must be a finite, non-negative number (got {value})")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("bot user id is missing; self-authored messages could not be filtered")]
    MissingBotIdentity,

    #[error("cooldown action `{0}` is configured more than once")]
    DuplicateAction(String),

    #[error("cooldown action id is empty")]
    EmptyAction,

    #[error("invalid moderation config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Reject NaN, infinities and negatives.
pub(crate) fn check_threshold(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}
