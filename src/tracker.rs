//! # Keyed Time Window
//! Per-key fixed-window counter with an optional payload buffer.
//!
//! Each key (usually a user id) owns one entry: when the window resets, how
//! many events it has seen, and the payloads buffered so far. Entries are
//! created lazily on the first event, mutated on later events, and dropped by
//! [`KeyedWindowTracker::sweep`] once their window has passed.
//!
//! All work on a key happens inside one `DashMap` entry guard, so events for
//! the same key are linearizable while unrelated keys only share a shard lock.

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;

use crate::error::ConfigError;

/// What happens when a key goes over its limit inside the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overflow {
    /// Keep refusing until the window resets (rate limiting).
    Hold,
    /// Hand out the buffered burst and let the overflowing event open a
    /// fresh window, so one burst is reported once.
    Flush,
}

/// Longest accepted window. Anything longer is almost certainly a unit
/// mistake in config.
pub const MAX_WINDOW_DAYS: i64 = 365;

/// Limits for one tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowPolicy {
    max_count: u32,
    window: Duration,
    overflow: Overflow,
}

impl WindowPolicy {
    /// `what` names the owner in error messages.
    pub fn new(
        what: &str,
        max_count: u32,
        window: Duration,
        overflow: Overflow,
    ) -> Result<Self, ConfigError> {
        if window <= Duration::zero() {
            return Err(ConfigError::NonPositiveWindow {
                what: what.to_string(),
                millis: window.num_milliseconds(),
            });
        }
        if window > Duration::days(MAX_WINDOW_DAYS) {
            return Err(ConfigError::WindowTooLong {
                what: what.to_string(),
                max_days: MAX_WINDOW_DAYS,
            });
        }
        if max_count == 0 {
            return Err(ConfigError::ZeroCount {
                what: what.to_string(),
            });
        }
        Ok(Self {
            max_count,
            window,
            overflow,
        })
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn overflow(&self) -> Overflow {
        self.overflow
    }
}

/// Result of recording one event.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackerOutcome<T> {
    /// No entry existed; a new window starts with this event.
    FirstSeen,
    /// Counted inside the current (possibly just rolled) window.
    WithinLimit,
    /// Over the limit. `remaining` is the time left until the window resets;
    /// `burst` holds the payloads buffered before this event (always empty
    /// with [`Overflow::Hold`]).
    LimitExceeded { remaining: Duration, burst: Vec<T> },
}

#[derive(Debug)]
struct WindowEntry<T> {
    reset_at: DateTime<Utc>,
    count: u32,
    buffer: Vec<T>,
}

// End of a window opened at `now`; clamps instead of overflowing.
fn window_end(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now.checked_add_signed(window)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Thread-safe per-key window tracker. `T` is the buffered payload type;
/// counters that buffer nothing use `()` and pass `None`.
#[derive(Debug)]
pub struct KeyedWindowTracker<K, T = ()>
where
    K: Eq + Hash,
{
    policy: WindowPolicy,
    entries: DashMap<K, WindowEntry<T>>,
}

impl<K, T> KeyedWindowTracker<K, T>
where
    K: Eq + Hash,
{
    pub fn new(policy: WindowPolicy) -> Self {
        Self {
            policy,
            entries: DashMap::new(),
        }
    }

    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    /// Record one event for `key` at `now`.
    pub fn record(&self, key: K, now: DateTime<Utc>, payload: Option<T>) -> TrackerOutcome<T> {
        let window = self.policy.window;
        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(WindowEntry {
                    reset_at: window_end(now, window),
                    count: 1,
                    buffer: payload.into_iter().collect(),
                });
                TrackerOutcome::FirstSeen
            }
            Entry::Occupied(mut slot) => {
                let e = slot.get_mut();
                if e.count < self.policy.max_count {
                    e.count += 1;
                    e.buffer.extend(payload);
                    return TrackerOutcome::WithinLimit;
                }
                if e.reset_at <= now {
                    // Window over: this event opens the next one.
                    e.reset_at = window_end(now, window);
                    e.count = 1;
                    e.buffer.clear();
                    e.buffer.extend(payload);
                    return TrackerOutcome::WithinLimit;
                }
                let remaining = e.reset_at - now;
                match self.policy.overflow {
                    Overflow::Hold => TrackerOutcome::LimitExceeded {
                        remaining,
                        burst: Vec::new(),
                    },
                    Overflow::Flush => {
                        let burst = std::mem::take(&mut e.buffer);
                        e.buffer.extend(payload);
                        e.count = 1;
                        e.reset_at = window_end(now, window);
                        TrackerOutcome::LimitExceeded { remaining, burst }
                    }
                }
            }
        }
    }

    /// Drop every entry whose window ended at or before `now`.
    /// Returns how many entries were removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut evicted = 0;
        self.entries.retain(|_, e| {
            let keep = e.reset_at > now;
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Events counted in the current window for `key`.
    pub fn count_of(&self, key: &K) -> Option<u32> {
        self.entries.get(key).map(|e| e.count)
    }

    pub fn reset_at(&self, key: &K) -> Option<DateTime<Utc>> {
        self.entries.get(key).map(|e| e.reset_at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
