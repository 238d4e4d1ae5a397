//! Per-user invocation cooldowns.
//!
//! A gate allows `count` invocations per user every `every`. Once the user is
//! over the limit, further invocations are denied until the window resets and
//! each denial is published as a [`CooldownDenied`] alert. Gates are
//! independent; one gate per moderated action.

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::events::{InvocationEvent, UserId};
use crate::notify::{AlertHub, CooldownDenied, ModerationAlert};
use crate::sweep::{Sweep, SweepScheduler};
use crate::tracker::{KeyedWindowTracker, Overflow, TrackerOutcome, WindowPolicy};

/// Unit for a configured cooldown window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CooldownMeasure {
    #[default]
    Seconds,
    Minutes,
    Hours,
}

impl CooldownMeasure {
    pub fn duration(self, every: u32) -> Duration {
        let every = i64::from(every);
        match self {
            CooldownMeasure::Seconds => Duration::seconds(every),
            CooldownMeasure::Minutes => Duration::minutes(every),
            CooldownMeasure::Hours => Duration::hours(every),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CooldownDecision {
    Allow,
    Deny { remaining: Duration },
}

impl CooldownDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, CooldownDecision::Allow)
    }
}

/// Rate limit for a single action.
#[derive(Debug)]
pub struct CooldownGate {
    name: String,
    tracker: KeyedWindowTracker<UserId>,
    alerts: AlertHub,
    sweep: bool,
}

impl CooldownGate {
    pub fn new(
        name: impl Into<String>,
        count: u32,
        every: Duration,
        alerts: AlertHub,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyAction);
        }
        let policy = WindowPolicy::new(&format!("cooldown `{name}`"), count, every, Overflow::Hold)?;
        Ok(Self {
            name,
            tracker: KeyedWindowTracker::new(policy),
            alerts,
            sweep: true,
        })
    }

    /// Whether the shared sweep should reclaim this gate's expired entries.
    pub fn with_sweep(mut self, sweep: bool) -> Self {
        self.sweep = sweep;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> u32 {
        self.tracker.policy().max_count()
    }

    pub fn every(&self) -> Duration {
        self.tracker.policy().window()
    }

    pub fn sweeps(&self) -> bool {
        self.sweep
    }

    pub fn tracker(&self) -> &KeyedWindowTracker<UserId> {
        &self.tracker
    }

    pub fn check_and_consume(&self, user: UserId) -> CooldownDecision {
        self.check_and_consume_at(user, Utc::now())
    }

    /// Count one invocation by `user` at `now`, or deny it.
    pub fn check_and_consume_at(&self, user: UserId, now: DateTime<Utc>) -> CooldownDecision {
        match self.tracker.record(user, now, None) {
            TrackerOutcome::FirstSeen | TrackerOutcome::WithinLimit => CooldownDecision::Allow,
            TrackerOutcome::LimitExceeded { remaining, .. } => {
                tracing::debug!(
                    target: "cooldown",
                    gate = %self.name,
                    user = %user,
                    remaining_ms = remaining.num_milliseconds(),
                    "invocation denied"
                );
                counter!("moderation_cooldown_denied_total", "gate" => self.name.clone())
                    .increment(1);
                self.alerts
                    .publish(ModerationAlert::CooldownDenied(CooldownDenied {
                        gate: self.name.clone(),
                        user_id: user,
                        remaining_ms: remaining.num_milliseconds(),
                        ts: now,
                    }));
                CooldownDecision::Deny { remaining }
            }
        }
    }
}

impl Sweep for CooldownGate {
    fn name(&self) -> &str {
        &self.name
    }

    fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.tracker.sweep(now)
    }

    fn tracked(&self) -> usize {
        self.tracker.len()
    }
}

/// Maps action ids to their gates, 1:1.
#[derive(Debug, Default)]
pub struct CooldownRegistry {
    gates: HashMap<String, Arc<CooldownGate>>,
}

impl CooldownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, gate: CooldownGate) -> Result<Arc<CooldownGate>, ConfigError> {
        if self.gates.contains_key(gate.name()) {
            return Err(ConfigError::DuplicateAction(gate.name().to_string()));
        }
        let gate = Arc::new(gate);
        self.gates.insert(gate.name().to_string(), Arc::clone(&gate));
        Ok(gate)
    }

    pub fn get(&self, action: &str) -> Option<&Arc<CooldownGate>> {
        self.gates.get(action)
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Check an invocation. Actions without a gate are always allowed.
    pub fn check(&self, ev: &InvocationEvent, now: DateTime<Utc>) -> CooldownDecision {
        match self.gates.get(&ev.action_id) {
            Some(gate) => gate.check_and_consume_at(ev.user_id, now),
            None => CooldownDecision::Allow,
        }
    }

    /// Register every gate that opted into sweeping.
    pub fn register_sweeps(&self, scheduler: &mut SweepScheduler) {
        for gate in self.gates.values().filter(|g| g.sweeps()) {
            scheduler.register(Arc::clone(gate) as Arc<dyn Sweep>);
        }
    }
}
