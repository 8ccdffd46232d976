use std::{collections::BTreeSet, collections::HashMap, hash::Hash, time::Duration};

use tokio::time::Instant;

use crate::domain::{MessageRef, UserId};

/// Map with per-entry time-to-live, purged opportunistically on mutation.
/// Bounds the memory held for pending-notification bookkeeping; eviction
/// does not retract live notifications, it only stops tracking them.
#[derive(Debug)]
pub struct TtlMap<K, V> {
    ttl: Duration,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V> TtlMap<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn insert_at(&mut self, key: K, value: V, now: Instant) {
        self.purge_at(now);
        self.entries.insert(key, (now, value));
    }

    pub fn get_at(&mut self, key: &K, now: Instant) -> Option<&mut V> {
        if let Some((inserted, _)) = self.entries.get(key) {
            if now.saturating_duration_since(*inserted) >= self.ttl {
                self.entries.remove(key);
                return None;
            }
        }
        self.entries.get_mut(key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    pub fn purge_at(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, (inserted, _)| now.saturating_duration_since(*inserted) < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A notification that was delivered for one source message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub recipient: UserId,
    pub message: MessageRef,
}

/// Bookkeeping for an already-sent highlight notification, so a later edit
/// or delete of the source message can update or retract it. At most one
/// record exists per source message.
#[derive(Clone, Debug, Default)]
pub struct PendingHighlight {
    pub keywords: BTreeSet<String>,
    pub deliveries: Vec<Delivery>,
}
