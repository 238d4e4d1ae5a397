//! Lexical risk scoring.
//!
//! A message is normalized, checked for indicator words, then every lexicon
//! word is compared against candidate strings from the message (tokens, or
//! sliding windows when whitespace is stripped). Close matches add the word's
//! weight to a running score:
//!
//! | match                              | kind         | adds            |
//! |------------------------------------|--------------|-----------------|
//! | distance 0                         | FullMatch    | `weight`        |
//! | 0 < distance <= `word_distance`    | SimilarMatch | `max(0, w - 2)` |
//! | token contains the word (tokens)   | PartialMatch | `max(0, w - 1)` |
//!
//! Any indicator present adds `indicator_bonus` once per message. A message
//! made of a single token gets +1 (best match full) or +0.5 (otherwise) when
//! something matched. Accumulation follows lexicon order, then candidate order,
//! so scores are reproducible.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::distance::distance;
use super::lexicon::{IndicatorSet, Lexicon};
use super::normalize::{normalize, NormalizeOptions};
use super::tokens::{source_for, token_count};
use crate::error::{check_threshold, ConfigError};

/// How a candidate matched a lexicon word. Ordered by severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    PartialMatch,
    SimilarMatch,
    FullMatch,
}

/// One matched occurrence.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchRecord {
    pub lexicon_word: String,
    pub matched_token: String,
    pub kind: MatchKind,
}

/// Outcome of scoring one message.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RiskResult {
    score: f64,
    indicators_found: Vec<String>,
    matches: Vec<MatchRecord>,
    early_exit: bool,
}

impl RiskResult {
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn indicators_found(&self) -> &[String] {
        &self.indicators_found
    }

    /// Matches in scan order.
    pub fn matches(&self) -> &[MatchRecord] {
        &self.matches
    }

    /// True when the scan stopped at the early-trigger threshold.
    pub fn triggered_early(&self) -> bool {
        self.early_exit
    }

    /// Most severe match kind, if anything matched.
    pub fn best_match(&self) -> Option<MatchKind> {
        self.matches.iter().map(|m| m.kind).max()
    }
}

/// Scan flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Strip whitespace and scan sliding windows instead of tokens.
    pub check_without_whitespace: bool,
    pub remove_non_alphanumeric: bool,
    /// A candidate that already matched is not matched again.
    pub ignore_duplicate_assumptions: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            check_without_whitespace: false,
            remove_non_alphanumeric: true,
            ignore_duplicate_assumptions: true,
        }
    }
}

impl ScanOptions {
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            remove_whitespace: self.check_without_whitespace,
            remove_non_alphanumeric: self.remove_non_alphanumeric,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringConfig {
    pub options: ScanOptions,
    /// Maximum edit distance still counted as a match.
    pub word_distance: usize,
    pub indicator_bonus: f64,
    /// Stop scanning once the score reaches this value. `None` scans everything.
    pub early_trigger: Option<f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            options: ScanOptions::default(),
            word_distance: 1,
            indicator_bonus: 1.0,
            early_trigger: None,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("indicator_bonus", self.indicator_bonus)?;
        if let Some(t) = self.early_trigger {
            check_threshold("early_trigger_on", t)?;
        }
        Ok(())
    }
}

/// A validated lexicon, indicator list and config bundled for repeated scoring.
/// Holds no per-user state; share it freely across threads.
#[derive(Clone, Debug)]
pub struct RiskScorer {
    lexicon: Lexicon,
    indicators: IndicatorSet,
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(
        lexicon: Lexicon,
        indicators: IndicatorSet,
        config: ScoringConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            lexicon,
            indicators,
            config,
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn score(&self, text: &str) -> RiskResult {
        score(text, &self.lexicon, &self.indicators, &self.config)
    }

    /// Score with different scan flags than the configured ones.
    pub fn score_with(&self, text: &str, options: ScanOptions) -> RiskResult {
        let config = ScoringConfig {
            options,
            ..self.config
        };
        score(text, &self.lexicon, &self.indicators, &config)
    }
}

fn positive(x: f64) -> f64 {
    x.max(0.0)
}

/// Score `text` against `lexicon` and `indicators`.
pub fn score(
    text: &str,
    lexicon: &Lexicon,
    indicators: &IndicatorSet,
    config: &ScoringConfig,
) -> RiskResult {
    let opts = config.options;
    let content = normalize(text, opts.normalize_options());

    let indicators_found = indicators.found_in(&content);
    let mut total = 0.0;
    if !indicators_found.is_empty() {
        total += config.indicator_bonus;
    }

    let source = source_for(opts.check_without_whitespace);
    let partial_allowed = !opts.check_without_whitespace;
    let mut matches: Vec<MatchRecord> = Vec::new();
    let mut matched_tokens: HashSet<&str> = HashSet::new();

    for entry in lexicon.iter() {
        let word = entry.word.as_str();
        for candidate in source.candidates(&content, word.chars().count()) {
            if opts.ignore_duplicate_assumptions && matched_tokens.contains(candidate) {
                continue;
            }
            let d = distance(word, candidate);
            let (kind, gain) = if d <= config.word_distance {
                if d == 0 {
                    (MatchKind::FullMatch, entry.weight)
                } else {
                    (MatchKind::SimilarMatch, positive(entry.weight - 2.0))
                }
            } else if partial_allowed && candidate.contains(word) {
                (MatchKind::PartialMatch, positive(entry.weight - 1.0))
            } else {
                continue;
            };

            matches.push(MatchRecord {
                lexicon_word: entry.word.clone(),
                matched_token: candidate.to_string(),
                kind,
            });
            matched_tokens.insert(candidate);
            total += gain;

            if let Some(limit) = config.early_trigger {
                if total >= limit {
                    tracing::trace!(
                        target: "moderation",
                        score = total,
                        matches = matches.len(),
                        "early trigger reached"
                    );
                    return RiskResult {
                        score: total,
                        indicators_found,
                        matches,
                        early_exit: true,
                    };
                }
            }
        }
    }

    // Short messages under-score; nudge single-token hits upward.
    let tokens = if opts.check_without_whitespace {
        let spaced = NormalizeOptions {
            remove_whitespace: false,
            ..opts.normalize_options()
        };
        token_count(&normalize(text, spaced))
    } else {
        token_count(&content)
    };
    if tokens == 1 {
        match matches.iter().map(|m| m.kind).max() {
            Some(MatchKind::FullMatch) => total += 1.0,
            Some(_) => total += 0.5,
            None => {}
        }
    }

    RiskResult {
        score: total,
        indicators_found,
        matches,
        early_exit: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(pairs: &[(&str, f64)]) -> Lexicon {
        Lexicon::from_pairs(pairs.iter().copied()).unwrap()
    }

    fn no_indicators() -> IndicatorSet {
        IndicatorSet::default()
    }

    #[test]
    fn near_miss_can_score_zero() {
        let r = score(
            "this is spaam",
            &lex(&[("spam", 2.0)]),
            &no_indicators(),
            &ScoringConfig::default(),
        );
        assert_eq!(r.score(), 0.0);
        assert_eq!(r.matches().len(), 1);
        assert_eq!(r.matches()[0].kind, MatchKind::SimilarMatch);
        assert_eq!(r.matches()[0].matched_token, "spaam");
    }

    #[test]
    fn full_and_partial_weights() {
        let lx = lex(&[("spam", 3.0)]);
        let cfg = ScoringConfig::default();

        let full = score("no SPAM here", &lx, &no_indicators(), &cfg);
        assert_eq!(full.score(), 3.0);
        assert_eq!(full.best_match(), Some(MatchKind::FullMatch));

        let partial = score("total spammers here", &lx, &no_indicators(), &cfg);
        assert_eq!(partial.score(), 2.0);
        assert_eq!(partial.matches()[0].kind, MatchKind::PartialMatch);
        assert_eq!(partial.matches()[0].matched_token, "spammers");
    }

    #[test]
    fn indicator_bonus_applies_once() {
        let ind = IndicatorSet::new(["you", "your"]).unwrap();
        let cfg = ScoringConfig {
            indicator_bonus: 1.5,
            ..ScoringConfig::default()
        };
        let r = score("you and your friends", &Lexicon::default(), &ind, &cfg);
        assert_eq!(r.indicators_found(), &["you".to_string(), "your".to_string()]);
        assert_eq!(r.score(), 1.5);
        assert!(r.matches().is_empty());
    }

    #[test]
    fn empty_text_scores_zero() {
        let ind = IndicatorSet::new(["you"]).unwrap();
        let r = score("", &lex(&[("spam", 2.0)]), &ind, &ScoringConfig::default());
        assert_eq!(r.score(), 0.0);
        assert!(r.indicators_found().is_empty());
        assert!(r.matches().is_empty());
    }

    #[test]
    fn single_token_bonus() {
        let lx = lex(&[("spam", 2.0)]);
        let cfg = ScoringConfig::default();
        assert_eq!(score("Spam!", &lx, &no_indicators(), &cfg).score(), 3.0);
        // similar match: max(0, 2-2) + 0.5
        assert_eq!(score("spem", &lx, &no_indicators(), &cfg).score(), 0.5);
        // nothing matched, nothing added
        assert_eq!(score("hello", &lx, &no_indicators(), &cfg).score(), 0.0);
    }

    #[test]
    fn duplicates_are_ignored_when_asked() {
        let lx = lex(&[("spam", 2.0)]);
        let text = "spam spam spam";
        let dedup = score(text, &lx, &no_indicators(), &ScoringConfig::default());
        assert_eq!(dedup.matches().len(), 1);
        assert_eq!(dedup.score(), 2.0);

        let cfg = ScoringConfig {
            options: ScanOptions {
                ignore_duplicate_assumptions: false,
                ..ScanOptions::default()
            },
            ..ScoringConfig::default()
        };
        let all = score(text, &lx, &no_indicators(), &cfg);
        assert_eq!(all.matches().len(), 3);
        assert_eq!(all.score(), 6.0);
    }

    #[test]
    fn sliding_windows_find_glued_words() {
        let cfg = ScoringConfig {
            options: ScanOptions {
                check_without_whitespace: true,
                ..ScanOptions::default()
            },
            word_distance: 0,
            ..ScoringConfig::default()
        };
        let r = score(
            "you are s p a m",
            &lex(&[("spam", 2.0)]),
            &no_indicators(),
            &cfg,
        );
        assert_eq!(r.matches().len(), 1);
        assert_eq!(r.matches()[0].matched_token, "spam");
        assert_eq!(r.matches()[0].kind, MatchKind::FullMatch);
        // six tokens in the message, so no single-token bonus
        assert_eq!(r.score(), 2.0);
    }

    #[test]
    fn early_trigger_stops_the_scan() {
        let lx = lex(&[("darn", 2.0), ("heck", 2.0)]);
        let cfg = ScoringConfig {
            early_trigger: Some(2.0),
            ..ScoringConfig::default()
        };
        let r = score("darn it heck", &lx, &no_indicators(), &cfg);
        assert!(r.triggered_early());
        assert_eq!(r.matches().len(), 1);
        assert_eq!(r.score(), 2.0);
    }

    #[test]
    fn scorer_rejects_bad_config() {
        let cfg = ScoringConfig {
            early_trigger: Some(f64::NAN),
            ..ScoringConfig::default()
        };
        assert!(RiskScorer::new(Lexicon::default(), no_indicators(), cfg).is_err());
    }

    #[test]
    fn score_with_overrides_flags() {
        let scorer = RiskScorer::new(
            lex(&[("spam", 2.0)]),
            no_indicators(),
            ScoringConfig::default(),
        )
        .unwrap();
        assert!(scorer.score("s p a m").matches().is_empty());
        let glued = scorer.score_with(
            "s p a m",
            ScanOptions {
                check_without_whitespace: true,
                ..ScanOptions::default()
            },
        );
        assert_eq!(glued.matches().len(), 1);
    }
}
