use std::{collections::HashMap, hash::Hash, time::Duration};

use tokio::time::Instant;

/// Time-windowed rate limiter generic over the bucket key.
///
/// A bucket is "on cooldown" while `now - last_triggered < window`;
/// triggering restarts the window. Entries are created lazily and dropped on
/// explicit reset.
#[derive(Debug)]
pub struct CooldownTracker<K> {
    window: Duration,
    entries: HashMap<K, Instant>,
}

impl<K: Eq + Hash> CooldownTracker<K> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: HashMap::new(),
        }
    }

    pub fn can_trigger(&self, key: &K) -> bool {
        self.can_trigger_at(key, Instant::now())
    }

    pub fn can_trigger_at(&self, key: &K, now: Instant) -> bool {
        match self.entries.get(key) {
            Some(last) => now.saturating_duration_since(*last) >= self.window,
            None => true,
        }
    }

    /// Record `now` as the bucket's last trigger. Returns the remaining wait
    /// if the bucket was already on cooldown, so callers can distinguish
    /// "triggered fresh" from "was already active"; `None` otherwise.
    pub fn trigger(&mut self, key: K) -> Option<Duration> {
        self.trigger_at(key, Instant::now())
    }

    pub fn trigger_at(&mut self, key: K, now: Instant) -> Option<Duration> {
        let remaining = self.entries.get(&key).and_then(|last| {
            self.window
                .checked_sub(now.saturating_duration_since(*last))
                .filter(|d| !d.is_zero())
        });
        self.entries.insert(key, now);
        remaining
    }

    /// Clear any cooldown state for the bucket immediately.
    pub fn reset(&mut self, key: &K) {
        self.entries.remove(key);
    }

    /// Drop expired entries so long-running trackers do not grow unbounded.
    pub fn purge_expired_at(&mut self, now: Instant) {
        let window = self.window;
        self.entries
            .retain(|_, last| now.saturating_duration_since(*last) < window);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
