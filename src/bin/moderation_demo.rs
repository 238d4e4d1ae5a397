//! Feeds a scripted chat session through the moderator and prints every alert
//! as a JSON line. Uses `config/moderation.toml` (or `$MODERATION_CONFIG_PATH`)
//! and falls back to a small built-in config when that is missing.

use chat_moderator::notify::log::spawn_log_sink;
use chat_moderator::telemetry::init_tracing;
use chat_moderator::{InvocationEvent, MessageEvent, ModerationConfig, Moderator};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;

const FALLBACK_TOML: &str = r#"
[service]
bot_user_id = 1

[profanity]
indicators = ["you"]

[[profanity.lexicon]]
word = "idiot"
weight = 3.0

[spam]
enabled = true

[[cooldown]]
action = "roll"
count = 3
every = 10
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = match ModerationConfig::from_toml() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "using built-in demo config");
            ModerationConfig::from_toml_str(FALLBACK_TOML)?
        }
    };
    let bot = cfg.service.bot_user_id;
    let (moderator, scheduler) = Moderator::from_config(&cfg)?;
    let moderator = Arc::new(moderator);

    let sink = spawn_log_sink(moderator.alerts());
    let mut alerts = moderator.alerts().subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match alerts.recv().await {
                Ok(alert) => match serde_json::to_string(&alert) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "alert not serialisable"),
                },
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let (tx, rx) = mpsc::channel(64);
    let handle = Arc::clone(&moderator).start(rx, scheduler);

    let script = [
        MessageEvent::new(7, 10, "good morning everyone"),
        MessageEvent::new(7, 10, "you absolute idiot"),
        MessageEvent::new(7, 10, "what an idiiot"),
        MessageEvent::new(8, 10, "!roll d20"),
        MessageEvent::new(bot, 10, "idiot idiot"),
        MessageEvent::new(7, 10, "fine, sorry").edited(),
    ];
    for (i, ev) in script.into_iter().enumerate() {
        tx.send(ev.with_id(i as u64 + 1).into()).await?;
    }
    for n in 0..7u64 {
        tx.send(MessageEvent::new(9, 11, format!("buy now {n}")).with_id(100 + n).into())
            .await?;
    }
    // denials come back as cooldown alerts
    for _ in 0..4 {
        tx.send(InvocationEvent::new(8, "roll").into()).await?;
    }

    // a host that needs the answer right away asks directly
    let decision = moderator.dispatch_invocation(&InvocationEvent::new(10, "roll"));
    println!("roll by 10: {decision:?}");

    drop(tx);
    handle.join().await;
    // Let the subscribers drain before shutting them down.
    tokio::time::sleep(Duration::from_millis(100)).await;
    sink.abort();
    printer.abort();

    println!("moderation-demo done");
    Ok(())
}
