//! Message-burst spam detection.
//!
//! Goal: notice a user sending more than `count` messages within `duration`.
//!
//! Messages are buffered per user inside the current window. The message that
//! overflows the window triggers a [`SpamAlert`] carrying the buffered burst.
//! The overflowing message itself opens the user's next window, so a single
//! burst is reported once.
//!
//! Which messages reach the detector (own messages, exempt users, edits) is
//! decided by the caller; see [`crate::moderator::Moderator`].

use chrono::{DateTime, Duration, Utc};
use metrics::counter;

use crate::error::ConfigError;
use crate::events::{MessageEvent, UserId};
use crate::notify::{AlertHub, ModerationAlert, SpamAlert};
use crate::sweep::Sweep;
use crate::tracker::{KeyedWindowTracker, Overflow, TrackerOutcome, WindowPolicy};

pub const DEFAULT_SPAM_COUNT: u32 = 5;
pub const DEFAULT_SPAM_DURATION_SECS: u32 = 3;

#[derive(Debug)]
pub struct SpamDetector {
    tracker: KeyedWindowTracker<UserId, MessageEvent>,
    alerts: AlertHub,
}

impl SpamDetector {
    pub fn new(count: u32, duration: Duration, alerts: AlertHub) -> Result<Self, ConfigError> {
        let policy = WindowPolicy::new("spam", count, duration, Overflow::Flush)?;
        Ok(Self {
            tracker: KeyedWindowTracker::new(policy),
            alerts,
        })
    }

    pub fn tracker(&self) -> &KeyedWindowTracker<UserId, MessageEvent> {
        &self.tracker
    }

    /// Record `msg` at `now`. Returns the alert when this message overflowed
    /// the author's window; the alert has already been published.
    pub fn record(&self, msg: &MessageEvent, now: DateTime<Utc>) -> Option<SpamAlert> {
        let user = msg.author_id;
        match self.tracker.record(user, now, Some(msg.clone())) {
            TrackerOutcome::FirstSeen | TrackerOutcome::WithinLimit => None,
            TrackerOutcome::LimitExceeded { burst, .. } => {
                tracing::info!(
                    target: "spam",
                    user = %user,
                    channel = %msg.channel_id,
                    burst = burst.len(),
                    "spam burst detected"
                );
                counter!("moderation_spam_alerts_total").increment(1);
                let alert = SpamAlert {
                    user_id: user,
                    messages: burst,
                    ts: now,
                };
                self.alerts.publish(ModerationAlert::Spam(alert.clone()));
                Some(alert)
            }
        }
    }
}

impl Sweep for SpamDetector {
    fn name(&self) -> &str {
        "spam"
    }

    fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.tracker.sweep(now)
    }

    fn tracked(&self) -> usize {
        self.tracker.len()
    }
}
