// src/config/reload.rs
//! Swappable scorer plus an mtime-polling reloader for the lexicon file.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;

use crate::analyze::{RiskResult, RiskScorer};

use super::ModerationConfig;

/// Shared handle to the active scorer. Readers clone the inner `Arc` and score
/// without holding the lock; a reload swaps the whole scorer at once.
#[derive(Clone, Debug)]
pub struct ScorerHandle {
    inner: Arc<RwLock<Arc<RiskScorer>>>,
}

impl ScorerHandle {
    pub fn new(scorer: RiskScorer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(scorer))),
        }
    }

    pub fn current(&self) -> Arc<RiskScorer> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn score(&self, text: &str) -> RiskResult {
        self.current().score(text)
    }

    pub fn replace(&self, scorer: RiskScorer) {
        let next = Arc::new(scorer);
        match self.inner.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}

/// Poll `path` every `poll` and rebuild the scorer when its mtime moves
/// forward. A file that fails to parse or validate is logged and ignored; the
/// previous scorer stays active.
pub fn spawn_hot_reload(handle: ScorerHandle, path: PathBuf, poll: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_mtime: Option<SystemTime> = None;
        loop {
            match tokio::fs::metadata(&path).await.and_then(|m| m.modified()) {
                Ok(mtime) => {
                    let changed = match last_mtime {
                        None => false,
                        Some(prev) => mtime > prev,
                    };
                    last_mtime = Some(mtime);
                    if changed {
                        reload_from(&handle, &path).await;
                    }
                }
                Err(e) => {
                    tracing::trace!(target: "config", path = %path.display(), error = %e, "config not readable");
                }
            }
            tokio::time::sleep(poll).await;
        }
    })
}

async fn reload_from(handle: &ScorerHandle, path: &Path) {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(target: "config", path = %path.display(), error = %e, "reload read failed");
            return;
        }
    };
    let scorer = ModerationConfig::from_toml_str(&content).and_then(|c| c.profanity.build_scorer());
    match scorer {
        Ok(s) => {
            let words = s.lexicon().len();
            handle.replace(s);
            tracing::info!(target: "config", path = %path.display(), words, "lexicon reloaded");
        }
        Err(e) => {
            tracing::warn!(target: "config", path = %path.display(), error = %e, "reload rejected, keeping previous lexicon");
        }
    }
}
