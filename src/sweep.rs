// src/sweep.rs
//! Periodic eviction of expired window entries.
//!
//! Trackers are registered explicitly; nothing is discovered through globals.
//! A component that should never be swept is simply not registered (its memory
//! then grows with the number of distinct users it has seen).

use chrono::{DateTime, Utc};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Something holding per-key windows that can drop the expired ones.
pub trait Sweep: Send + Sync {
    fn name(&self) -> &str;

    /// Remove entries whose window ended at or before `now`; return how many.
    fn sweep(&self, now: DateTime<Utc>) -> usize;

    /// Entries currently held.
    fn tracked(&self) -> usize;
}

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Owns the list of sweep targets and the interval they are swept at.
pub struct SweepScheduler {
    interval: Duration,
    targets: Vec<Arc<dyn Sweep>>,
}

impl Default for SweepScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_INTERVAL)
    }
}

impl SweepScheduler {
    /// Intervals below one second are raised to one second.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_secs(1)),
            targets: Vec::new(),
        }
    }

    pub fn register(&mut self, target: Arc<dyn Sweep>) {
        tracing::debug!(target: "sweep", name = target.name(), "registered sweep target");
        self.targets.push(target);
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// One pass over every target. Returns the total number of evictions.
    pub fn run_once(&self, now: DateTime<Utc>) -> usize {
        let mut total = 0;
        for t in &self.targets {
            let evicted = t.sweep(now);
            if evicted > 0 {
                tracing::debug!(
                    target: "sweep",
                    name = t.name(),
                    evicted,
                    remaining = t.tracked(),
                    "swept expired windows"
                );
            }
            total += evicted;
        }
        counter!("moderation_sweep_evicted_total").increment(total as u64);
        total
    }

    /// Spawn the periodic sweep. The first pass runs one interval from now.
    pub fn start(self) -> SweepHandle {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // `interval` fires immediately; skip that tick.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = self.run_once(Utc::now());
                tracing::info!(
                    target: "sweep",
                    targets = self.targets.len(),
                    evicted,
                    "sweep tick"
                );
            }
        });
        SweepHandle { task: Some(task) }
    }
}

/// Running sweep task. Dropping the handle stops the task.
pub struct SweepHandle {
    task: Option<JoinHandle<()>>,
}

impl SweepHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the task and wait until it is gone.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
