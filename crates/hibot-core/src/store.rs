//! Durable record of which user subscribes to which highlight word.
//!
//! The pipeline's in-memory cache is a read-through projection of this store;
//! every link/unlink here must be mirrored into the cache by the caller.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{domain::UserId, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    /// The (user, word) pair already exists; nothing was mutated.
    AlreadyLinked,
}

#[async_trait]
pub trait HighlightStore: Send + Sync {
    /// Bulk load for the startup cache rebuild: every word with its users.
    async fn all_highlights(&self) -> Result<Vec<(String, Vec<UserId>)>>;

    async fn count_for_user(&self, user: UserId) -> Result<usize>;

    /// Link a user to a word, creating the word if absent. Duplicate links
    /// are rejected, not silently duplicated.
    async fn link(&self, user: UserId, word: &str) -> Result<LinkOutcome>;

    /// Remove the link if present; returns whether a removal occurred.
    async fn unlink(&self, user: UserId, word: &str) -> Result<bool>;

    async fn highlights_for_user(&self, user: UserId) -> Result<Vec<String>>;

    async fn is_donor(&self, user: UserId) -> Result<bool>;

    async fn set_donor(&self, user: UserId, is_donor: bool) -> Result<()>;
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct UserRecord {
    #[serde(default)]
    is_donor: bool,
    #[serde(default)]
    highlights: BTreeSet<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StoreState {
    users: BTreeMap<u64, UserRecord>,
}

/// JSON-file-backed implementation. Loaded once on open; the whole state is
/// rewritten on every mutation (the file stays small: a few hundred users).
pub struct JsonStore {
    path: Option<PathBuf>,
    state: Mutex<StoreState>,
}

impl JsonStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = load_store_file(&path)?.unwrap_or_default();
        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    /// Memory-only store: nothing survives a restart.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(StoreState::default()),
        }
    }

    fn save(&self, state: &StoreState) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let txt = serde_json::to_string_pretty(state)?;
        std::fs::write(path, txt)?;
        Ok(())
    }
}

fn load_store_file(path: &Path) -> Result<Option<StoreState>> {
    if !path.exists() {
        return Ok(None);
    }
    let txt = std::fs::read_to_string(path)?;
    if txt.trim().is_empty() {
        return Ok(None);
    }
    let state: StoreState = serde_json::from_str(&txt)?;
    Ok(Some(state))
}

#[async_trait]
impl HighlightStore for JsonStore {
    async fn all_highlights(&self) -> Result<Vec<(String, Vec<UserId>)>> {
        let state = self.state.lock().await;
        let mut by_word: BTreeMap<&str, Vec<UserId>> = BTreeMap::new();
        for (user_id, record) in &state.users {
            for word in &record.highlights {
                by_word.entry(word).or_default().push(UserId(*user_id));
            }
        }
        Ok(by_word
            .into_iter()
            .map(|(word, users)| (word.to_string(), users))
            .collect())
    }

    async fn count_for_user(&self, user: UserId) -> Result<usize> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .get(&user.0)
            .map(|r| r.highlights.len())
            .unwrap_or(0))
    }

    async fn link(&self, user: UserId, word: &str) -> Result<LinkOutcome> {
        let mut state = self.state.lock().await;
        let record = state.users.entry(user.0).or_default();
        if !record.highlights.insert(word.to_string()) {
            return Ok(LinkOutcome::AlreadyLinked);
        }
        self.save(&state)?;
        Ok(LinkOutcome::Linked)
    }

    async fn unlink(&self, user: UserId, word: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        let Some(record) = state.users.get_mut(&user.0) else {
            return Ok(false);
        };
        if !record.highlights.remove(word) {
            return Ok(false);
        }
        self.save(&state)?;
        Ok(true)
    }

    async fn highlights_for_user(&self, user: UserId) -> Result<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .get(&user.0)
            .map(|r| r.highlights.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn is_donor(&self, user: UserId) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(state.users.get(&user.0).map(|r| r.is_donor).unwrap_or(false))
    }

    async fn set_donor(&self, user: UserId, is_donor: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        state.users.entry(user.0).or_default().is_donor = is_donor;
        self.save(&state)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_link_is_rejected() {
        let store = JsonStore::in_memory();
        assert_eq!(store.link(UserId(1), "rust").await.unwrap(), LinkOutcome::Linked);
        assert_eq!(
            store.link(UserId(1), "rust").await.unwrap(),
            LinkOutcome::AlreadyLinked
        );
        assert_eq!(store.count_for_user(UserId(1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unlink_reports_whether_anything_was_removed() {
        let store = JsonStore::in_memory();
        store.link(UserId(1), "rust").await.unwrap();
        assert!(store.unlink(UserId(1), "rust").await.unwrap());
        assert!(!store.unlink(UserId(1), "rust").await.unwrap());
        assert!(!store.unlink(UserId(2), "rust").await.unwrap());
    }

    #[tokio::test]
    async fn all_highlights_groups_users_by_word() {
        let store = JsonStore::in_memory();
        store.link(UserId(1), "rust").await.unwrap();
        store.link(UserId(2), "rust").await.unwrap();
        store.link(UserId(2), "python").await.unwrap();

        let all = store.all_highlights().await.unwrap();
        assert_eq!(
            all,
            vec![
                ("python".to_string(), vec![UserId(2)]),
                ("rust".to_string(), vec![UserId(1), UserId(2)]),
            ]
        );
    }

    #[tokio::test]
    async fn store_round_trips_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = JsonStore::open(&path).unwrap();
            store.link(UserId(7), "rust").await.unwrap();
            store.set_donor(UserId(7), true).await.unwrap();
        }

        let store = JsonStore::open(&path).unwrap();
        assert_eq!(
            store.highlights_for_user(UserId(7)).await.unwrap(),
            vec!["rust".to_string()]
        );
        assert!(store.is_donor(UserId(7)).await.unwrap());
    }
}
