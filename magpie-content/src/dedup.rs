//! Rolling 24-hour window of already-posted story ids.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

/// How long a posted id stays suppressed.
pub const DEDUP_WINDOW_HOURS: i64 = 24;

/// Set of story ids posted within the current window.
///
/// Every method takes `now` explicitly, so window behavior is testable
/// without touching the wall clock.
#[derive(Debug)]
pub struct DedupCache {
    seen: HashSet<u64>,
    window_start: DateTime<Utc>,
}

impl DedupCache {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            seen: HashSet::new(),
            window_start: now,
        }
    }

    /// Clear the set and restart the window once more than 24h have passed
    /// since it began. Returns whether a reset happened.
    pub fn roll_window(&mut self, now: DateTime<Utc>) -> bool {
        if now - self.window_start > Duration::hours(DEDUP_WINDOW_HOURS) {
            self.reset(now);
            true
        } else {
            false
        }
    }

    /// Unconditional clear, restarting the window at `now`. Used when every
    /// ranked candidate has already been posted.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.seen.clear();
        self.window_start = now;
    }

    pub fn contains(&self, id: u64) -> bool {
        self.seen.contains(&id)
    }

    /// Record a posted id. Returns false when it was already present.
    pub fn insert(&mut self, id: u64) -> bool {
        self.seen.insert(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
