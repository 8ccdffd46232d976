//! Python Enhancement Proposal lookup and the in-channel PEP link responder.
//!
//! The responder shares the highlight pipeline's shape: respond to matching
//! messages, track the response for a short window, and propagate edits and
//! deletes of the source message.

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{
    domain::{MessageId, MessageRef},
    highlights::pending::TtlMap,
    messaging::{
        port::Messenger,
        types::{Embed, MessageDeleted, MessageEdited, MessagePosted, OutboundMessage, Reply},
    },
    Result,
};

const PEPS_API_URL: &str = "https://peps.python.org/api/peps.json";
const MAX_PEPS_PER_EMBED: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PepInfo {
    pub number: u32,
    pub title: String,
    pub authors: String,
    pub url: String,
}

impl PepInfo {
    pub fn embed(&self, theme: u32) -> Embed {
        Embed {
            title: Some(format!("PEP {}: {}", self.number, self.title)),
            url: Some(self.url.clone()),
            author_name: Some(self.authors.clone()),
            color: theme,
            ..Embed::default()
        }
    }

    fn markdown_line(&self) -> String {
        format!("PEP {}: [{}]({})", self.number, self.title, self.url)
    }
}

fn pep_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)pep[\s-]*(\d{1,4})\b").expect("valid regex"))
}

/// Every PEP reference in `content`, in order, duplicates included.
pub fn pep_refs(content: &str) -> Vec<u32> {
    pep_regex()
        .captures_iter(content)
        .filter_map(|cap| cap[1].parse::<u32>().ok())
        .collect()
}

#[derive(Debug, Deserialize)]
struct PepApiEntry {
    title: String,
    authors: String,
    url: String,
}

/// Registry of known PEPs, refreshed periodically from the PEPs API.
#[derive(Clone)]
pub struct PepRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    http: reqwest::Client,
    peps: Mutex<HashMap<u32, PepInfo>>,
}

impl PepRegistry {
    pub fn new(http_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(http_timeout)
            .build()
            .expect("reqwest client build");
        Self {
            inner: Arc::new(RegistryInner {
                http,
                peps: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Replace the registry contents from the PEPs API.
    pub async fn refresh(&self) -> Result<()> {
        let resp = self
            .inner
            .http
            .get(PEPS_API_URL)
            .send()
            .await?
            .error_for_status()?;
        let entries: HashMap<String, PepApiEntry> = resp.json().await?;

        let peps: HashMap<u32, PepInfo> = entries
            .into_iter()
            .filter_map(|(number, entry)| {
                let number = number.parse::<u32>().ok()?;
                Some((
                    number,
                    PepInfo {
                        number,
                        title: entry.title,
                        authors: entry.authors,
                        url: entry.url,
                    },
                ))
            })
            .collect();

        let count = peps.len();
        *self.inner.peps.lock().await = peps;
        tracing::info!("pep registry refreshed: {count} peps");
        Ok(())
    }

    pub async fn get(&self, number: u32) -> Option<PepInfo> {
        self.inner.peps.lock().await.get(&number).cloned()
    }

    #[cfg(test)]
    pub async fn set_peps(&self, peps: Vec<PepInfo>) {
        *self.inner.peps.lock().await =
            peps.into_iter().map(|p| (p.number, p)).collect();
    }

    /// Embed linking every known PEP referenced in `content`, or `None` when
    /// there is nothing to link. At most five links are rendered; the footer
    /// reports how many references were omitted.
    pub async fn embed_for(&self, content: &str, theme: u32) -> Option<Embed> {
        let refs = pep_refs(content);
        if refs.is_empty() {
            return None;
        }

        let peps = self.inner.peps.lock().await;
        let mut unique: Vec<u32> = refs.clone();
        unique.sort_unstable();
        unique.dedup();

        let lines: Vec<String> = unique
            .iter()
            .take(MAX_PEPS_PER_EMBED)
            .filter_map(|n| peps.get(n).map(PepInfo::markdown_line))
            .collect();
        if lines.is_empty() {
            return None;
        }

        let mut embed = Embed {
            description: Some(lines.join("\n")),
            color: theme,
            ..Embed::default()
        };
        if refs.len() > MAX_PEPS_PER_EMBED {
            embed.footer = Some(format!("{} PEPs omitted", refs.len() - MAX_PEPS_PER_EMBED));
        }
        Some(embed)
    }
}

/// `/pep` command handler.
pub async fn pep_command(registry: &PepRegistry, number: u32, theme: u32) -> Reply {
    match registry.get(number).await {
        Some(pep) => Reply::embed(pep.embed(theme)),
        None => Reply::ephemeral_text(format!("{number} is not a valid PEP.")),
    }
}

/// Replies to PEP references in channel messages and keeps the reply in sync
/// with its source for a short window.
#[derive(Clone)]
pub struct PepResponder {
    inner: Arc<ResponderInner>,
}

struct ResponderInner {
    registry: PepRegistry,
    messenger: Arc<dyn Messenger>,
    theme: u32,
    fresh_window: Duration,
    responses: Mutex<TtlMap<MessageId, MessageRef>>,
}

impl PepResponder {
    pub fn new(
        registry: PepRegistry,
        messenger: Arc<dyn Messenger>,
        theme: u32,
        fresh_window: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ResponderInner {
                registry,
                messenger,
                theme,
                fresh_window,
                // Slack on top of the send cutoff so edits near the boundary
                // still find their response.
                responses: Mutex::new(TtlMap::new(fresh_window + Duration::from_secs(5))),
            }),
        }
    }

    pub async fn on_message_posted(&self, ev: &MessagePosted) -> Result<()> {
        self.on_message_posted_at(ev, Instant::now()).await
    }

    pub async fn on_message_posted_at(&self, ev: &MessagePosted, now: Instant) -> Result<()> {
        if ev.author_is_bot || ev.content.is_empty() {
            return Ok(());
        }
        let Some(embed) = self.inner.registry.embed_for(&ev.content, self.inner.theme).await
        else {
            return Ok(());
        };
        self.respond(ev, embed, now).await
    }

    pub async fn on_message_edited(&self, ev: &MessageEdited) -> Result<()> {
        self.on_message_edited_at(ev, Instant::now(), Utc::now()).await
    }

    pub async fn on_message_edited_at(
        &self,
        ev: &MessageEdited,
        now: Instant,
        now_utc: DateTime<Utc>,
    ) -> Result<()> {
        if ev.author_is_bot {
            return Ok(());
        }

        let embed = match ev.content.as_deref() {
            Some(content) if !content.is_empty() => {
                self.inner.registry.embed_for(content, self.inner.theme).await
            }
            _ => None,
        };

        let existing = {
            let mut responses = self.inner.responses.lock().await;
            responses.get_at(&ev.message_id, now).map(|r| *r)
        };

        if let Some(response) = existing {
            match embed {
                Some(embed) => {
                    let message = OutboundMessage::embed(embed).with_dismiss(ev.author);
                    ignore_stale(self.inner.messenger.edit_message(response, &message).await)?;
                }
                None => {
                    ignore_stale(self.inner.messenger.delete_message(response).await)?;
                    self.inner.responses.lock().await.remove(&ev.message_id);
                }
            }
            return Ok(());
        }

        // No response yet; only react while the message is freshly posted.
        let age = now_utc
            .signed_duration_since(ev.posted_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        if let Some(embed) = embed {
            if age <= self.inner.fresh_window {
                let posted = MessagePosted {
                    guild_id: ev.guild_id,
                    channel_id: ev.channel_id,
                    message_id: ev.message_id,
                    author: ev.author,
                    author_is_bot: ev.author_is_bot,
                    content: ev.content.clone().unwrap_or_default(),
                };
                return self.respond(&posted, embed, now).await;
            }
        }
        Ok(())
    }

    pub async fn on_message_deleted(&self, ev: &MessageDeleted) -> Result<()> {
        self.on_message_deleted_at(ev, Instant::now()).await
    }

    pub async fn on_message_deleted_at(&self, ev: &MessageDeleted, now: Instant) -> Result<()> {
        let existing = {
            let mut responses = self.inner.responses.lock().await;
            responses.get_at(&ev.message_id, now).map(|r| *r)
        };
        let Some(response) = existing else {
            return Ok(());
        };
        ignore_stale(self.inner.messenger.delete_message(response).await)?;
        self.inner.responses.lock().await.remove(&ev.message_id);
        Ok(())
    }

    async fn respond(&self, ev: &MessagePosted, embed: Embed, now: Instant) -> Result<()> {
        let source = MessageRef::new(ev.channel_id, ev.message_id);
        let message = OutboundMessage::embed(embed).with_dismiss(ev.author);
        let response = self.inner.messenger.send_reply(source, &message).await?;
        self.inner
            .responses
            .lock()
            .await
            .insert_at(ev.message_id, response, now);
        Ok(())
    }
}

fn ignore_stale(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_stale_reference() => Ok(()),
        other => other,
    }
}
