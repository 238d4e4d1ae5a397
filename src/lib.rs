// src/lib.rs
// Public library surface for hosts, the demo binary and integration tests.

pub mod analyze;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod events;
pub mod moderator;
pub mod notify;
pub mod spam;
pub mod sweep;
pub mod telemetry;
pub mod tracker;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{
    distance, normalize, IndicatorSet, Lexicon, LexiconEntry, MatchKind, MatchRecord,
    NormalizeOptions, RiskResult, RiskScorer, ScanOptions, ScoringConfig,
};
pub use crate::config::{ModerationConfig, ScorerHandle};
pub use crate::cooldown::{CooldownDecision, CooldownGate, CooldownMeasure, CooldownRegistry};
pub use crate::error::ConfigError;
pub use crate::events::{
    ChannelId, InboundEvent, InvocationEvent, MessageEvent, MessageId, UserId,
};
pub use crate::moderator::{
    MessageOutcome, ModerationHandle, Moderator, ModeratorSettings, SkipReason,
};
pub use crate::notify::{AlertHub, CooldownDenied, ModerationAlert, RiskAlert, SpamAlert};
pub use crate::spam::SpamDetector;
pub use crate::sweep::{Sweep, SweepHandle, SweepScheduler};
pub use crate::tracker::{KeyedWindowTracker, Overflow, TrackerOutcome, WindowPolicy};
