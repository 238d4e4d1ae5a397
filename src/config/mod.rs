// src/config/mod.rs
//! Moderation configuration loaded from TOML.
//!
//! ```toml
//! [service]
//! bot_user_id = 4242
//! command_prefixes = ["!"]
//! exempt_privilege_level = 10
//!
//! [profanity]
//! trigger_on = 1.5
//! indicators = ["you", "your"]
//! [[profanity.lexicon]]
//! word = "spam"
//! weight = 2.0
//!
//! [spam]
//! enabled = true
//! count = 5
//! duration_secs = 3
//!
//! [[cooldown]]
//! action = "daily"
//! count = 1
//! every = 24
//! measure = "hours"
//! ```
//!
//! Path: `$MODERATION_CONFIG_PATH`, else `config/moderation.toml`.
//! `$MODERATION_TRIGGER_ON` overrides `profanity.trigger_on`.

pub mod reload;

pub use reload::{spawn_hot_reload, ScorerHandle};

use anyhow::Context as _;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use crate::analyze::{IndicatorSet, Lexicon, LexiconEntry, RiskScorer, ScanOptions, ScoringConfig};
use crate::cooldown::CooldownMeasure;
use crate::error::{check_threshold, ConfigError};
use crate::spam::{DEFAULT_SPAM_COUNT, DEFAULT_SPAM_DURATION_SECS};
use crate::tracker::{Overflow, WindowPolicy};

pub const DEFAULT_CONFIG_PATH: &str = "config/moderation.toml";
pub const ENV_CONFIG_PATH: &str = "MODERATION_CONFIG_PATH";
pub const ENV_TRIGGER_ON: &str = "MODERATION_TRIGGER_ON";
pub const DEFAULT_TRIGGER_ON: f64 = 1.5;

#[derive(Debug, Clone, Deserialize)]
pub struct ModerationConfig {
    pub service: ServiceSection,
    #[serde(default)]
    pub profanity: ProfanitySection,
    #[serde(default)]
    pub spam: SpamSection,
    #[serde(default)]
    pub sweep: SweepSection,
    #[serde(default, rename = "cooldown")]
    pub cooldowns: Vec<CooldownSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSection {
    pub bot_user_id: u64,
    #[serde(default = "default_prefixes")]
    pub command_prefixes: Vec<String>,
    /// Authors at or above this privilege level are not moderated.
    #[serde(default)]
    pub exempt_privilege_level: Option<u32>,
}

fn default_prefixes() -> Vec<String> {
    vec!["!".to_string()]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfanitySection {
    pub enabled: bool,
    pub scan_edits: bool,
    /// Ignore messages that start with a command prefix.
    pub skip_commands: bool,
    pub trigger_on: f64,
    pub early_trigger_on: Option<f64>,
    pub indicator_bonus: f64,
    pub word_distance: usize,
    pub check_without_whitespace: bool,
    pub remove_non_alphanumeric: bool,
    pub ignore_duplicate_assumptions: bool,
    pub indicators: Vec<String>,
    pub lexicon: Vec<LexiconEntry>,
}

impl Default for ProfanitySection {
    fn default() -> Self {
        let opts = ScanOptions::default();
        let scoring = ScoringConfig::default();
        Self {
            enabled: true,
            scan_edits: true,
            skip_commands: true,
            trigger_on: DEFAULT_TRIGGER_ON,
            early_trigger_on: None,
            indicator_bonus: scoring.indicator_bonus,
            word_distance: scoring.word_distance,
            check_without_whitespace: opts.check_without_whitespace,
            remove_non_alphanumeric: opts.remove_non_alphanumeric,
            ignore_duplicate_assumptions: opts.ignore_duplicate_assumptions,
            indicators: Vec::new(),
            lexicon: Vec::new(),
        }
    }
}

impl ProfanitySection {
    pub fn scoring_config(&self) -> ScoringConfig {
        ScoringConfig {
            options: ScanOptions {
                check_without_whitespace: self.check_without_whitespace,
                remove_non_alphanumeric: self.remove_non_alphanumeric,
                ignore_duplicate_assumptions: self.ignore_duplicate_assumptions,
            },
            word_distance: self.word_distance,
            indicator_bonus: self.indicator_bonus,
            early_trigger: self.early_trigger_on,
        }
    }

    pub fn build_scorer(&self) -> Result<RiskScorer, ConfigError> {
        let lexicon = Lexicon::new(self.lexicon.iter().cloned())?;
        let indicators = IndicatorSet::new(&self.indicators)?;
        RiskScorer::new(lexicon, indicators, self.scoring_config())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpamSection {
    pub enabled: bool,
    pub count: u32,
    pub duration_secs: u32,
}

impl Default for SpamSection {
    fn default() -> Self {
        Self {
            enabled: false,
            count: DEFAULT_SPAM_COUNT,
            duration_secs: DEFAULT_SPAM_DURATION_SECS,
        }
    }
}

impl SpamSection {
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.duration_secs))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweepSection {
    pub interval_secs: u64,
}

impl Default for SweepSection {
    fn default() -> Self {
        Self { interval_secs: 600 }
    }
}

impl SweepSection {
    pub fn interval(&self) -> StdDuration {
        StdDuration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CooldownSection {
    pub action: String,
    pub count: u32,
    pub every: u32,
    #[serde(default)]
    pub measure: CooldownMeasure,
    /// Set to false to keep this gate out of the periodic sweep.
    #[serde(default = "yes")]
    pub sweep: bool,
}

fn yes() -> bool {
    true
}

impl CooldownSection {
    pub fn window(&self) -> chrono::Duration {
        self.measure.duration(self.every)
    }
}

impl ModerationConfig {
    /// Defaults for everything except the bot identity.
    pub fn for_bot(bot_user_id: u64) -> Self {
        Self {
            service: ServiceSection {
                bot_user_id,
                command_prefixes: default_prefixes(),
                exempt_privilege_level: None,
            },
            profanity: ProfanitySection::default(),
            spam: SpamSection::default(),
            sweep: SweepSection::default(),
            cooldowns: Vec::new(),
        }
    }

    /// Load using `$MODERATION_CONFIG_PATH` or the default path, then apply
    /// env overrides.
    pub fn from_toml() -> anyhow::Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut cfg = Self::from_path(&path)?;

        if let Some(t) = parse_trigger_env(std::env::var(ENV_TRIGGER_ON).ok()) {
            tracing::info!(target: "config", trigger_on = t, "trigger overridden from env");
            cfg.profanity.trigger_on = t;
        }
        Ok(cfg)
    }

    /// Load and validate a file. No env overrides.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading moderation config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("loading moderation config from {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check everything that would otherwise fail while building components.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.bot_user_id == 0 {
            return Err(ConfigError::MissingBotIdentity);
        }
        check_threshold("trigger_on", self.profanity.trigger_on)?;
        self.profanity.build_scorer()?;

        if self.spam.enabled {
            WindowPolicy::new("spam", self.spam.count, self.spam.duration(), Overflow::Flush)?;
        }
        if self.sweep.interval_secs == 0 {
            return Err(ConfigError::NonPositiveWindow {
                what: "sweep interval".to_string(),
                millis: 0,
            });
        }

        let mut actions = HashSet::new();
        for c in &self.cooldowns {
            if c.action.trim().is_empty() {
                return Err(ConfigError::EmptyAction);
            }
            if !actions.insert(c.action.as_str()) {
                return Err(ConfigError::DuplicateAction(c.action.clone()));
            }
            WindowPolicy::new(
                &format!("cooldown `{}`", c.action),
                c.count,
                c.window(),
                Overflow::Hold,
            )?;
        }
        Ok(())
    }
}

// parse optional float env; finite and non-negative only
fn parse_trigger_env(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
}
