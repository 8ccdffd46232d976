use std::collections::{BTreeSet, HashMap};

use crate::domain::UserId;

/// In-memory mapping from a highlight word to the users subscribed to it.
///
/// Rebuilt from the store at startup, then mutated incrementally by the
/// subscription commands. Never persisted.
#[derive(Debug, Default)]
pub struct HighlightCache {
    entries: HashMap<String, BTreeSet<UserId>>,
}

impl HighlightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole mapping from a bulk store load. Must run before
    /// gateway events are processed, so it cannot race command mutations.
    pub fn rebuild(&mut self, entries: Vec<(String, Vec<UserId>)>) {
        self.entries = entries
            .into_iter()
            .map(|(word, users)| (word, users.into_iter().collect()))
            .collect();
    }

    pub fn add(&mut self, word: &str, user: UserId) {
        self.entries.entry(word.to_string()).or_default().insert(user);
    }

    /// Remove a subscriber; deletes the word's entry when the set becomes
    /// empty so no dangling empty entries linger.
    pub fn remove(&mut self, word: &str, user: UserId) {
        if let Some(users) = self.entries.get_mut(word) {
            users.remove(&user);
            if users.is_empty() {
                self.entries.remove(word);
            }
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn subscribers(&self, word: &str) -> Option<&BTreeSet<UserId>> {
        self.entries.get(word)
    }

    /// Every cached word that appears as a whole-word token of `content`,
    /// with its subscribers. Tokens are whitespace-split words compared both
    /// raw and with non-alphanumeric edges trimmed (so "rust," matches
    /// "rust" but "crustacean" does not). Matching is case-sensitive.
    pub fn matches(&self, content: &str) -> Vec<(String, Vec<UserId>)> {
        if self.entries.is_empty() {
            return Vec::new();
        }

        let words: Vec<&str> = content.split_whitespace().collect();
        let trimmed: Vec<&str> = words
            .iter()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .collect();

        let mut out = Vec::new();
        for (word, users) in &self.entries {
            let hit = words
                .iter()
                .zip(&trimmed)
                .any(|(raw, clean)| *raw == word || *clean == word);
            if hit {
                out.push((word.clone(), users.iter().copied().collect()));
            }
        }
        out
    }
}
