// src/notify/log.rs
//! Log-only alert sink. Handy when the host has nothing wired to the hub yet.

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{AlertHub, ModerationAlert};

/// Subscribe to `hub` and log every alert until the hub is dropped or the
/// returned task is aborted.
pub fn spawn_log_sink(hub: &AlertHub) -> JoinHandle<()> {
    let mut rx = hub.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(alert) => log_alert(&alert),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(target: "moderation", skipped, "alert log sink lagging");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn log_alert(alert: &ModerationAlert) {
    match alert {
        ModerationAlert::Risk(a) => info!(
            target: "moderation",
            user = %a.author_id,
            channel = %a.channel_id,
            content = %a.content_id,
            score = a.result.score(),
            matches = a.result.matches().len(),
            edit = a.is_edit,
            "risk alert"
        ),
        ModerationAlert::CooldownDenied(d) => info!(
            target: "cooldown",
            gate = %d.gate,
            user = %d.user_id,
            remaining_ms = d.remaining_ms,
            "user on cooldown"
        ),
        ModerationAlert::Spam(s) => warn!(
            target: "spam",
            user = %s.user_id,
            messages = s.messages.len(),
            "spam burst"
        ),
    }
}
