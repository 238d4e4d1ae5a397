// src/notify/mod.rs
//! Outbound moderation alerts.
//!
//! Every component publishes into one [`AlertHub`] (a tokio broadcast channel).
//! Hosts subscribe to react: delete the message, time the user out, reply
//! with the remaining cooldown. Publishing never blocks and never fails; with
//! no subscriber the alert is simply dropped.

pub mod log;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::analyze::RiskResult;
use crate::events::{ChannelId, MessageEvent, MessageId, UserId};

pub const DEFAULT_ALERT_CAPACITY: usize = 256;

/// A message scored at or above the alert trigger.
#[derive(Clone, Debug, Serialize)]
pub struct RiskAlert {
    pub author_id: UserId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub is_edit: bool,
    /// Anonymised content id (see [`crate::telemetry::anon_hash`]).
    pub content_id: String,
    pub result: RiskResult,
    pub ts: DateTime<Utc>,
}

/// An action refused because the user is on cooldown.
#[derive(Clone, Debug, Serialize)]
pub struct CooldownDenied {
    pub gate: String,
    pub user_id: UserId,
    pub remaining_ms: i64,
    pub ts: DateTime<Utc>,
}

impl CooldownDenied {
    pub fn remaining(&self) -> Duration {
        Duration::milliseconds(self.remaining_ms)
    }
}

/// A user went over the message-burst limit.
#[derive(Clone, Debug, Serialize)]
pub struct SpamAlert {
    pub user_id: UserId,
    pub messages: Vec<MessageEvent>,
    pub ts: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModerationAlert {
    Risk(RiskAlert),
    CooldownDenied(CooldownDenied),
    Spam(SpamAlert),
}

impl ModerationAlert {
    pub fn kind(&self) -> &'static str {
        match self {
            ModerationAlert::Risk(_) => "risk",
            ModerationAlert::CooldownDenied(_) => "cooldown_denied",
            ModerationAlert::Spam(_) => "spam",
        }
    }
}

/// Cloneable publish side of the alert channel.
#[derive(Clone, Debug)]
pub struct AlertHub {
    tx: broadcast::Sender<ModerationAlert>,
}

impl Default for AlertHub {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_CAPACITY)
    }
}

impl AlertHub {
    /// `capacity` < 1 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ModerationAlert> {
        self.tx.subscribe()
    }

    /// Returns how many subscribers received the alert.
    pub fn publish(&self, alert: ModerationAlert) -> usize {
        let kind = alert.kind();
        match self.tx.send(alert) {
            Ok(n) => n,
            Err(_) => {
                tracing::trace!(target: "moderation", kind, "alert dropped: no subscribers");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
