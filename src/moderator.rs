// src/moderator.rs
//! Event front door: filters inbound chat events, scores messages, feeds the
//! spam detector and routes command invocations to their cooldown gates.
//!
//! `dispatch*` is the event boundary: a panic while handling one event is
//! logged, counted and the event dropped. `handle_*` run unguarded.
//!
//! Alerts go out through the shared [`AlertHub`]; hosts subscribe there.

use chrono::{DateTime, Utc};
use metrics::counter;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::analyze::RiskResult;
use crate::config::{ModerationConfig, ScorerHandle};
use crate::cooldown::{CooldownDecision, CooldownGate, CooldownRegistry};
use crate::error::{check_threshold, ConfigError};
use crate::events::{InboundEvent, InvocationEvent, MessageEvent, UserId};
use crate::notify::{AlertHub, ModerationAlert, RiskAlert, SpamAlert};
use crate::spam::SpamDetector;
use crate::sweep::{Sweep, SweepScheduler};
use crate::telemetry::anon_hash;

#[derive(Clone, Debug, PartialEq)]
pub struct ModeratorSettings {
    pub bot_user_id: UserId,
    pub command_prefixes: Vec<String>,
    pub skip_commands: bool,
    pub exempt_privilege_level: Option<u32>,
    pub scan_messages: bool,
    pub scan_edits: bool,
    pub trigger_on: f64,
}

impl ModeratorSettings {
    pub fn from_config(cfg: &ModerationConfig) -> Self {
        Self {
            bot_user_id: UserId(cfg.service.bot_user_id),
            command_prefixes: cfg
                .service
                .command_prefixes
                .iter()
                .filter(|p| !p.is_empty())
                .cloned()
                .collect(),
            skip_commands: cfg.profanity.skip_commands,
            exempt_privilege_level: cfg.service.exempt_privilege_level,
            scan_messages: cfg.profanity.enabled,
            scan_edits: cfg.profanity.scan_edits,
            trigger_on: cfg.profanity.trigger_on,
        }
    }

    fn is_exempt(&self, ev: &MessageEvent) -> bool {
        match (self.exempt_privilege_level, ev.author_privilege) {
            (Some(min), Some(level)) => level >= min,
            _ => false,
        }
    }

    fn is_command(&self, text: &str) -> bool {
        let text = text.trim_start();
        self.command_prefixes.iter().any(|p| text.starts_with(p.as_str()))
    }
}

/// Why a message was not scored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    OwnMessage,
    Exempt,
    ScanDisabled,
    Edit,
    Command,
}

/// What happened to one message.
#[derive(Clone, Debug, Default)]
pub struct MessageOutcome {
    pub risk: Option<RiskResult>,
    pub alerted: bool,
    pub spam: Option<SpamAlert>,
    pub skipped: Option<SkipReason>,
}

impl MessageOutcome {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }
}

pub struct Moderator {
    settings: ModeratorSettings,
    scorer: ScorerHandle,
    spam: Option<Arc<SpamDetector>>,
    cooldowns: CooldownRegistry,
    alerts: AlertHub,
}

impl Moderator {
    pub fn new(
        settings: ModeratorSettings,
        scorer: ScorerHandle,
        alerts: AlertHub,
    ) -> Result<Self, ConfigError> {
        if settings.bot_user_id.0 == 0 {
            return Err(ConfigError::MissingBotIdentity);
        }
        check_threshold("trigger_on", settings.trigger_on)?;
        Ok(Self {
            settings,
            scorer,
            spam: None,
            cooldowns: CooldownRegistry::new(),
            alerts,
        })
    }

    pub fn with_spam(mut self, spam: Arc<SpamDetector>) -> Self {
        self.spam = Some(spam);
        self
    }

    pub fn with_cooldowns(mut self, cooldowns: CooldownRegistry) -> Self {
        self.cooldowns = cooldowns;
        self
    }

    /// Build every component from config. The returned scheduler already has
    /// the spam detector and the sweeping cooldown gates registered.
    pub fn from_config(cfg: &ModerationConfig) -> Result<(Self, SweepScheduler), ConfigError> {
        cfg.validate()?;
        let alerts = AlertHub::default();
        let scorer = ScorerHandle::new(cfg.profanity.build_scorer()?);
        let mut scheduler = SweepScheduler::new(cfg.sweep.interval());

        let mut cooldowns = CooldownRegistry::new();
        for c in &cfg.cooldowns {
            let gate = CooldownGate::new(c.action.clone(), c.count, c.window(), alerts.clone())?
                .with_sweep(c.sweep);
            cooldowns.insert(gate)?;
        }
        cooldowns.register_sweeps(&mut scheduler);

        let mut moderator =
            Self::new(ModeratorSettings::from_config(cfg), scorer, alerts.clone())?
                .with_cooldowns(cooldowns);
        if cfg.spam.enabled {
            let spam = Arc::new(SpamDetector::new(cfg.spam.count, cfg.spam.duration(), alerts)?);
            scheduler.register(Arc::clone(&spam) as Arc<dyn Sweep>);
            moderator = moderator.with_spam(spam);
        }

        tracing::info!(
            target: "moderation",
            lexicon = moderator.scorer.current().lexicon().len(),
            gates = moderator.cooldowns.len(),
            spam = moderator.spam.is_some(),
            sweep_targets = scheduler.len(),
            "moderator configured"
        );
        Ok((moderator, scheduler))
    }

    pub fn settings(&self) -> &ModeratorSettings {
        &self.settings
    }

    pub fn alerts(&self) -> &AlertHub {
        &self.alerts
    }

    pub fn scorer(&self) -> &ScorerHandle {
        &self.scorer
    }

    pub fn cooldowns(&self) -> &CooldownRegistry {
        &self.cooldowns
    }

    pub fn spam(&self) -> Option<&Arc<SpamDetector>> {
        self.spam.as_ref()
    }

    /// Filter, score and spam-check one message.
    pub fn handle_message(&self, ev: &MessageEvent, now: DateTime<Utc>) -> MessageOutcome {
        let s = &self.settings;
        if ev.author_id == s.bot_user_id {
            return MessageOutcome::skipped(SkipReason::OwnMessage);
        }
        if s.is_exempt(ev) {
            return MessageOutcome::skipped(SkipReason::Exempt);
        }

        let spam = match (&self.spam, ev.is_edit) {
            (Some(detector), false) => detector.record(ev, now),
            _ => None,
        };

        let skip = if !s.scan_messages {
            Some(SkipReason::ScanDisabled)
        } else if ev.is_edit && !s.scan_edits {
            Some(SkipReason::Edit)
        } else if s.skip_commands && s.is_command(&ev.text) {
            Some(SkipReason::Command)
        } else {
            None
        };
        if let Some(reason) = skip {
            return MessageOutcome {
                spam,
                skipped: Some(reason),
                ..MessageOutcome::default()
            };
        }

        let result = self.scorer.score(&ev.text);
        let alerted = result.score() >= s.trigger_on;
        if alerted {
            let content_id = anon_hash(&ev.text);
            tracing::debug!(
                target: "moderation",
                user = %ev.author_id,
                channel = %ev.channel_id,
                content = %content_id,
                score = result.score(),
                matches = result.matches().len(),
                edit = ev.is_edit,
                "risk alert"
            );
            counter!("moderation_risk_alerts_total").increment(1);
            self.alerts.publish(ModerationAlert::Risk(RiskAlert {
                author_id: ev.author_id,
                channel_id: ev.channel_id,
                message_id: ev.message_id,
                is_edit: ev.is_edit,
                content_id,
                result: result.clone(),
                ts: now,
            }));
        }

        MessageOutcome {
            risk: Some(result),
            alerted,
            spam,
            skipped: None,
        }
    }

    /// Route an invocation to its gate. Unknown actions are allowed.
    pub fn handle_invocation(&self, ev: &InvocationEvent, now: DateTime<Utc>) -> CooldownDecision {
        self.cooldowns.check(ev, now)
    }

    /// Handle one message at the current time. A panic inside the handler is
    /// logged and the message dropped.
    pub fn dispatch(&self, ev: &MessageEvent) -> Option<MessageOutcome> {
        self.dispatch_at(ev, Utc::now())
    }

    pub fn dispatch_at(&self, ev: &MessageEvent, now: DateTime<Utc>) -> Option<MessageOutcome> {
        match guarded(|| self.handle_message(ev, now)) {
            Ok(outcome) => Some(outcome),
            Err(reason) => {
                tracing::error!(
                    target: "moderation",
                    message = %ev.message_id,
                    user = %ev.author_id,
                    content = %anon_hash(&ev.text),
                    reason = %reason,
                    "message handler panicked; event dropped"
                );
                None
            }
        }
    }

    /// Guarded [`Moderator::handle_invocation`]. `None` means the handler
    /// panicked; the host should treat the invocation as not allowed.
    pub fn dispatch_invocation(&self, ev: &InvocationEvent) -> Option<CooldownDecision> {
        self.dispatch_invocation_at(ev, Utc::now())
    }

    pub fn dispatch_invocation_at(
        &self,
        ev: &InvocationEvent,
        now: DateTime<Utc>,
    ) -> Option<CooldownDecision> {
        match guarded(|| self.handle_invocation(ev, now)) {
            Ok(decision) => Some(decision),
            Err(reason) => {
                tracing::error!(
                    target: "moderation",
                    action = %ev.action_id,
                    user = %ev.user_id,
                    reason = %reason,
                    "invocation handler panicked; event dropped"
                );
                None
            }
        }
    }

    /// Route one inbound event. Denied invocations reach the host through the
    /// `CooldownDenied` alert.
    pub fn dispatch_event(&self, ev: &InboundEvent, now: DateTime<Utc>) {
        match ev {
            InboundEvent::Message(m) => {
                self.dispatch_at(m, now);
            }
            InboundEvent::Invocation(i) => {
                self.dispatch_invocation_at(i, now);
            }
        }
    }

    /// Consume `events` until the sender side closes, with the sweep running
    /// alongside.
    pub fn start(
        self: Arc<Self>,
        mut events: mpsc::Receiver<InboundEvent>,
        scheduler: SweepScheduler,
    ) -> ModerationHandle {
        let task = tokio::spawn(async move {
            // Lives as long as the loop; dropped (and aborted) with it.
            let _sweep = scheduler.start();
            tracing::info!(target: "moderation", "moderation loop started");
            while let Some(ev) = events.recv().await {
                self.dispatch_event(&ev, Utc::now());
            }
            tracing::info!(target: "moderation", "event stream closed");
        });
        ModerationHandle { task: Some(task) }
    }
}

// Run `f`, turning a panic into its message.
fn guarded<R>(f: impl FnOnce() -> R) -> Result<R, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|panic| {
        counter!("moderation_dispatch_failures_total").increment(1);
        panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string())
    })
}

/// Running moderation loop. Dropping the handle stops it.
pub struct ModerationHandle {
    task: Option<JoinHandle<()>>,
}

impl ModerationHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the loop and the sweep, and wait for both to finish.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }

    /// Wait for the loop to end on its own (the stream was closed).
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ModerationHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
