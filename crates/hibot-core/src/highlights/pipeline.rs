use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{
    config::Config,
    domain::{ChannelId, GuildId, MessageId, MessageRef, UserId},
    highlights::{
        cache::HighlightCache,
        cooldown::CooldownTracker,
        pending::{Delivery, PendingHighlight, TtlMap},
    },
    messaging::{
        port::Messenger,
        types::{decode_dismiss_id, MessageDeleted, MessageEdited, MessagePosted, OutboundMessage},
    },
    store::HighlightStore,
    tasks::spawn_logged,
    Result,
};

/// Windows and retention for the notification pipeline.
#[derive(Clone, Copy, Debug)]
pub struct PipelineConfig {
    /// How often one keyword may fire per channel.
    pub keyword_cooldown: Duration,
    /// Recipients who posted in the channel within this window get no DM.
    pub recent_activity_window: Duration,
    /// How long sent notifications stay tracked for edit/delete propagation.
    pub tracking_ttl: Duration,
    /// Edits to messages younger than this are treated as fresh posts when
    /// nothing was sent for them yet.
    pub freshly_posted_window: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            keyword_cooldown: Duration::from_secs(120),
            recent_activity_window: Duration::from_secs(60),
            tracking_ttl: Duration::from_secs(600),
            freshly_posted_window: Duration::from_secs(60),
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            keyword_cooldown: cfg.keyword_cooldown,
            recent_activity_window: cfg.recent_activity_window,
            tracking_ttl: cfg.highlight_tracking_ttl,
            freshly_posted_window: cfg.freshly_posted_window,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DismissOutcome {
    Dismissed,
    /// Someone other than the intended recipient pressed the button; the
    /// notification stays.
    NotYours,
}

/// The highlight notification pipeline.
///
/// Owns the keyword cache, both cooldown trackers and the pending-
/// notification map behind one mutex; outbound sends are dispatched as
/// detached tasks and never awaited by event handlers.
#[derive(Clone)]
pub struct HighlightPipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    cfg: PipelineConfig,
    store: Arc<dyn HighlightStore>,
    messenger: Arc<dyn Messenger>,
    state: Mutex<PipelineState>,
}

struct PipelineState {
    cache: HighlightCache,
    keyword_cooldown: CooldownTracker<(ChannelId, String)>,
    recent_activity: CooldownTracker<(UserId, ChannelId)>,
    pending: TtlMap<MessageId, PendingHighlight>,
}

struct PlannedSend {
    recipient: UserId,
    body: String,
}

impl PipelineState {
    /// Drop expired bookkeeping so none of the maps grow without bound.
    fn purge_expired(&mut self, now: Instant) {
        self.pending.purge_at(now);
        self.keyword_cooldown.purge_expired_at(now);
        self.recent_activity.purge_expired_at(now);
    }
}

impl HighlightPipeline {
    pub fn new(
        cfg: PipelineConfig,
        store: Arc<dyn HighlightStore>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                state: Mutex::new(PipelineState {
                    cache: HighlightCache::new(),
                    keyword_cooldown: CooldownTracker::new(cfg.keyword_cooldown),
                    recent_activity: CooldownTracker::new(cfg.recent_activity_window),
                    pending: TtlMap::new(cfg.tracking_ttl),
                }),
                cfg,
                store,
                messenger,
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn HighlightStore> {
        &self.inner.store
    }

    /// Bulk-load the keyword cache from the store. Runs once at startup,
    /// before gateway events are processed.
    pub async fn rebuild_cache(&self) -> Result<()> {
        let entries = self.inner.store.all_highlights().await?;
        let count = entries.len();
        let mut st = self.inner.state.lock().await;
        st.cache.rebuild(entries);
        tracing::info!("highlight cache rebuilt with {count} words");
        Ok(())
    }

    pub async fn cache_add(&self, word: &str, user: UserId) {
        self.inner.state.lock().await.cache.add(word, user);
    }

    pub async fn cache_remove(&self, word: &str, user: UserId) {
        self.inner.state.lock().await.cache.remove(word, user);
    }

    pub async fn on_message_posted(&self, ev: &MessagePosted) {
        self.on_message_posted_at(ev, Instant::now()).await;
    }

    pub async fn on_message_posted_at(&self, ev: &MessagePosted, now: Instant) {
        let sends = {
            let mut guard = self.inner.state.lock().await;
            let st = &mut *guard;
            st.purge_expired(now);
            if ev.author_is_bot {
                return;
            }
            // The author is actively reading this channel; suppress DMs to
            // them here for a while.
            st.recent_activity.trigger_at((ev.author, ev.channel_id), now);
            if ev.content.is_empty() {
                return;
            }
            plan_notifications(
                st,
                ev.guild_id,
                ev.channel_id,
                ev.message_id,
                ev.author,
                &ev.content,
                now,
            )
        };
        self.dispatch_sends(ev.message_id, sends);
    }

    pub async fn on_message_edited(&self, ev: &MessageEdited) {
        self.on_message_edited_at(ev, Instant::now(), Utc::now()).await;
    }

    pub async fn on_message_edited_at(
        &self,
        ev: &MessageEdited,
        now: Instant,
        now_utc: DateTime<Utc>,
    ) {
        let mut fresh_sends = Vec::new();
        {
            let mut guard = self.inner.state.lock().await;
            let st = &mut *guard;
            st.purge_expired(now);
            if ev.author_is_bot {
                return;
            }

            let content = ev.content.as_deref().unwrap_or("");
            let matched_now: BTreeSet<String> = st
                .cache
                .matches(content)
                .into_iter()
                .map(|(word, _)| word)
                .collect();

            if st.pending.get_at(&ev.message_id, now).is_some() {
                self.apply_edit_to_record(st, ev, matched_now, now);
            } else if !content.is_empty() && message_age(ev.posted_at, now_utc) <= self.inner.cfg.freshly_posted_window {
                // The edit may have introduced the keyword; only react while
                // the message is still freshly posted.
                fresh_sends = plan_notifications(
                    st,
                    ev.guild_id,
                    ev.channel_id,
                    ev.message_id,
                    ev.author,
                    content,
                    now,
                );
            }
        }
        self.dispatch_sends(ev.message_id, fresh_sends);
    }

    pub async fn on_message_deleted(&self, ev: &MessageDeleted) {
        self.on_message_deleted_at(ev, Instant::now()).await;
    }

    pub async fn on_message_deleted_at(&self, ev: &MessageDeleted, now: Instant) {
        let mut guard = self.inner.state.lock().await;
        let st = &mut *guard;
        st.purge_expired(now);

        let Some(record) = st.pending.remove(&ev.message_id) else {
            return;
        };
        // The source is gone and the notification is being retracted, so the
        // keywords may fire again promptly.
        for word in &record.keywords {
            st.keyword_cooldown.reset(&(ev.channel_id, word.clone()));
        }
        for delivery in record.deliveries {
            let messenger = self.inner.messenger.clone();
            spawn_logged("highlight retraction", async move {
                messenger.delete_message(delivery.message).await
            });
        }
    }

    /// Handle a press of the Dismiss button attached to a notification.
    /// Dismissal never resets cooldowns: it is a recipient-initiated action
    /// and must not let the keyword immediately re-trigger elsewhere.
    pub fn on_dismiss(
        &self,
        invoker: UserId,
        custom_id: &str,
        notification: MessageRef,
    ) -> DismissOutcome {
        match decode_dismiss_id(custom_id) {
            Some(owner) if owner == invoker => {
                let messenger = self.inner.messenger.clone();
                spawn_logged("notification dismissal", async move {
                    messenger.delete_message(notification).await
                });
                DismissOutcome::Dismissed
            }
            _ => DismissOutcome::NotYours,
        }
    }

    fn apply_edit_to_record(
        &self,
        st: &mut PipelineState,
        ev: &MessageEdited,
        matched_now: BTreeSet<String>,
        now: Instant,
    ) {
        let previous = st
            .pending
            .get_at(&ev.message_id, now)
            .map(|record| record.keywords.clone())
            .unwrap_or_default();

        // Keywords edited away no longer count against future triggers.
        for word in previous.difference(&matched_now) {
            st.keyword_cooldown.reset(&(ev.channel_id, word.clone()));
        }

        // Retained keywords stay under their existing cooldown; newly
        // introduced ones must pass it.
        let mut kept: BTreeSet<String> = previous.intersection(&matched_now).cloned().collect();
        for word in matched_now.difference(&previous) {
            let key = (ev.channel_id, word.clone());
            if st.keyword_cooldown.can_trigger_at(&key, now) {
                st.keyword_cooldown.trigger_at(key, now);
                kept.insert(word.clone());
            }
        }

        if kept.is_empty() {
            let Some(record) = st.pending.remove(&ev.message_id) else {
                return;
            };
            for delivery in record.deliveries {
                let messenger = self.inner.messenger.clone();
                spawn_logged("highlight retraction", async move {
                    messenger.delete_message(delivery.message).await
                });
            }
            return;
        }

        let link = MessageRef::new(ev.channel_id, ev.message_id).link(ev.guild_id);
        let body = notification_body(&kept, &link);
        let Some(record) = st.pending.get_at(&ev.message_id, now) else {
            return;
        };
        record.keywords = kept;
        for delivery in record.deliveries.clone() {
            let messenger = self.inner.messenger.clone();
            let message = OutboundMessage::text(body.clone()).with_dismiss(delivery.recipient);
            spawn_logged("highlight update", async move {
                messenger.edit_message(delivery.message, &message).await
            });
        }
    }

    #[cfg(test)]
    async fn tracked_entry_counts(&self) -> (usize, usize, usize) {
        let st = self.inner.state.lock().await;
        (
            st.keyword_cooldown.len(),
            st.recent_activity.len(),
            st.pending.len(),
        )
    }

    fn dispatch_sends(&self, source: MessageId, sends: Vec<PlannedSend>) {
        for send in sends {
            let pipeline = self.clone();
            spawn_logged("highlight notification", async move {
                let message =
                    OutboundMessage::text(send.body).with_dismiss(send.recipient);
                let sent = pipeline
                    .inner
                    .messenger
                    .send_dm(send.recipient, &message)
                    .await?;
                let mut st = pipeline.inner.state.lock().await;
                if let Some(record) = st.pending.get_at(&source, Instant::now()) {
                    record.deliveries.push(Delivery {
                        recipient: send.recipient,
                        message: sent,
                    });
                }
                Ok(())
            });
        }
    }
}

/// Match `content` against the cache, trigger keyword cooldowns, and work
/// out who gets a DM. Creates the pending record when anyone is eligible.
fn plan_notifications(
    st: &mut PipelineState,
    guild_id: GuildId,
    channel_id: ChannelId,
    message_id: MessageId,
    author: UserId,
    content: &str,
    now: Instant,
) -> Vec<PlannedSend> {
    let matched = st.cache.matches(content);
    if matched.is_empty() {
        return Vec::new();
    }

    let mut per_recipient: BTreeMap<UserId, BTreeSet<String>> = BTreeMap::new();
    for (word, users) in matched {
        let key = (channel_id, word.clone());
        if !st.keyword_cooldown.can_trigger_at(&key, now) {
            continue;
        }
        st.keyword_cooldown.trigger_at(key, now);

        for user in users {
            if user == author {
                continue;
            }
            if !st.recent_activity.can_trigger_at(&(user, channel_id), now) {
                // They posted here recently; no DM needed.
                continue;
            }
            per_recipient.entry(user).or_default().insert(word.clone());
        }
    }

    if per_recipient.is_empty() {
        return Vec::new();
    }

    let keywords: BTreeSet<String> = per_recipient.values().flatten().cloned().collect();
    st.pending.insert_at(
        message_id,
        PendingHighlight {
            keywords,
            deliveries: Vec::new(),
        },
        now,
    );

    let link = MessageRef::new(channel_id, message_id).link(guild_id);
    per_recipient
        .into_iter()
        .map(|(recipient, words)| PlannedSend {
            recipient,
            body: notification_body(&words, &link),
        })
        .collect()
}

fn notification_body(words: &BTreeSet<String>, link: &str) -> String {
    let list = words.iter().cloned().collect::<Vec<_>>().join(", ");
    if words.len() == 1 {
        format!("Highlight found: {list}\n{link}")
    } else {
        format!("Highlights found: {list}\n{link}")
    }
}

fn message_age(posted_at: DateTime<Utc>, now_utc: DateTime<Utc>) -> Duration {
    now_utc
        .signed_duration_since(posted_at)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::store::JsonStore;

    const DM_CHANNEL: ChannelId = ChannelId(9000);

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Call {
        Dm {
            recipient: UserId,
            content: String,
        },
        Edit {
            message: MessageRef,
            content: String,
        },
        Delete {
            message: MessageRef,
        },
    }

    #[derive(Default)]
    struct FakeMessenger {
        calls: std::sync::Mutex<Vec<Call>>,
        next_id: AtomicU64,
    }

    impl FakeMessenger {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn dm_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Dm { .. }))
                .count()
        }
    }

    #[async_trait]
    impl Messenger for FakeMessenger {
        async fn send_dm(
            &self,
            user: UserId,
            message: &OutboundMessage,
        ) -> Result<MessageRef> {
            self.calls.lock().unwrap().push(Call::Dm {
                recipient: user,
                content: message.content.clone().unwrap_or_default(),
            });
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(MessageRef::new(DM_CHANNEL, MessageId(id)))
        }

        async fn send_reply(
            &self,
            _target: MessageRef,
            _message: &OutboundMessage,
        ) -> Result<MessageRef> {
            unimplemented!("highlight pipeline only sends DMs")
        }

        async fn edit_message(&self, msg: MessageRef, message: &OutboundMessage) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Edit {
                message: msg,
                content: message.content.clone().unwrap_or_default(),
            });
            Ok(())
        }

        async fn delete_message(&self, msg: MessageRef) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Delete { message: msg });
            Ok(())
        }
    }

    async fn pipeline_with(
        words: &[(&str, &[u64])],
    ) -> (HighlightPipeline, Arc<FakeMessenger>) {
        let store = Arc::new(JsonStore::in_memory());
        for (word, users) in words {
            for user in *users {
                store.link(UserId(*user), word).await.unwrap();
            }
        }
        let messenger = Arc::new(FakeMessenger::default());
        let pipeline =
            HighlightPipeline::new(PipelineConfig::default(), store, messenger.clone());
        pipeline.rebuild_cache().await.unwrap();
        (pipeline, messenger)
    }

    fn posted(message_id: u64, author: u64, content: &str) -> MessagePosted {
        MessagePosted {
            guild_id: GuildId(1),
            channel_id: ChannelId(10),
            message_id: MessageId(message_id),
            author: UserId(author),
            author_is_bot: false,
            content: content.to_string(),
        }
    }

    fn edited(message_id: u64, author: u64, content: Option<&str>) -> MessageEdited {
        MessageEdited {
            guild_id: GuildId(1),
            channel_id: ChannelId(10),
            message_id: MessageId(message_id),
            author: UserId(author),
            author_is_bot: false,
            content: content.map(|s| s.to_string()),
            posted_at: Utc::now(),
        }
    }

    /// Let fire-and-forget sends run to completion.
    async fn drain() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn matching_message_notifies_the_subscriber() {
        let (pipeline, messenger) = pipeline_with(&[("rust", &[42])]).await;

        pipeline.on_message_posted(&posted(100, 7, "I love rust")).await;
        drain().await;

        let calls = messenger.calls();
        assert_eq!(calls.len(), 1);
        let Call::Dm { recipient, content } = &calls[0] else {
            panic!("expected a DM, got {calls:?}");
        };
        assert_eq!(*recipient, UserId(42));
        assert!(content.contains("Highlight found: rust"));
        assert!(content.contains("https://discord.com/channels/1/10/100"));
    }

    #[tokio::test]
    async fn author_is_never_notified_about_their_own_message() {
        let (pipeline, messenger) = pipeline_with(&[("rust", &[42])]).await;

        pipeline.on_message_posted(&posted(100, 42, "talking about rust")).await;
        drain().await;

        assert_eq!(messenger.dm_count(), 0);
    }

    #[tokio::test]
    async fn bot_messages_and_empty_content_are_ignored() {
        let (pipeline, messenger) = pipeline_with(&[("rust", &[42])]).await;

        let mut ev = posted(100, 7, "rust");
        ev.author_is_bot = true;
        pipeline.on_message_posted(&ev).await;
        pipeline.on_message_posted(&posted(101, 7, "")).await;
        drain().await;

        assert_eq!(messenger.dm_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn keyword_cooldown_suppresses_repeat_bursts() {
        let (pipeline, messenger) = pipeline_with(&[("rust", &[42])]).await;

        pipeline.on_message_posted(&posted(100, 7, "rust is great")).await;
        drain().await;
        assert_eq!(messenger.dm_count(), 1);

        // Second match in the same channel within the window: nothing.
        tokio::time::advance(Duration::from_secs(30)).await;
        pipeline.on_message_posted(&posted(101, 8, "more rust talk")).await;
        drain().await;
        assert_eq!(messenger.dm_count(), 1);

        // After the window elapses the keyword may fire again.
        tokio::time::advance(Duration::from_secs(120)).await;
        pipeline.on_message_posted(&posted(102, 8, "rust again")).await;
        drain().await;
        assert_eq!(messenger.dm_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn recently_active_recipients_are_suppressed() {
        let (pipeline, messenger) = pipeline_with(&[("rust", &[42])]).await;

        // 42 posts in the channel, then a match arrives ten seconds later.
        pipeline.on_message_posted(&posted(100, 42, "hello")).await;
        tokio::time::advance(Duration::from_secs(10)).await;
        pipeline.on_message_posted(&posted(101, 7, "rust question")).await;
        drain().await;
        assert_eq!(messenger.dm_count(), 0);

        // Once the activity window has passed they are notified again.
        tokio::time::advance(Duration::from_secs(120)).await;
        pipeline.on_message_posted(&posted(102, 7, "rust answer")).await;
        drain().await;
        assert_eq!(messenger.dm_count(), 1);
    }

    #[tokio::test]
    async fn edit_that_drops_the_keyword_retracts_the_notification() {
        let (pipeline, messenger) = pipeline_with(&[("rust", &[42])]).await;

        pipeline.on_message_posted(&posted(100, 7, "rust rules")).await;
        drain().await;
        assert_eq!(messenger.dm_count(), 1);

        pipeline.on_message_edited(&edited(100, 7, Some("never mind"))).await;
        drain().await;

        let calls = messenger.calls();
        assert!(
            matches!(calls.last(), Some(Call::Delete { .. })),
            "expected the DM to be deleted, got {calls:?}"
        );

        // Retraction reset the keyword cooldown: a new match fires at once.
        pipeline.on_message_posted(&posted(101, 8, "rust redux")).await;
        drain().await;
        assert_eq!(messenger.dm_count(), 2);
    }

    #[tokio::test]
    async fn edit_that_keeps_the_keyword_updates_the_notification() {
        let (pipeline, messenger) = pipeline_with(&[("rust", &[42])]).await;

        pipeline.on_message_posted(&posted(100, 7, "rust rules")).await;
        drain().await;

        pipeline
            .on_message_edited(&edited(100, 7, Some("rust still rules")))
            .await;
        drain().await;

        let calls = messenger.calls();
        let Some(Call::Edit { content, .. }) = calls.last() else {
            panic!("expected an edit, got {calls:?}");
        };
        assert!(content.contains("Highlight found: rust"));
    }

    #[tokio::test]
    async fn fresh_edit_without_a_record_is_treated_as_a_new_post() {
        let (pipeline, messenger) = pipeline_with(&[("rust", &[42])]).await;

        // The original post did not match; the edit introduces the keyword.
        pipeline.on_message_posted(&posted(100, 7, "hello world")).await;
        pipeline
            .on_message_edited(&edited(100, 7, Some("hello rust world")))
            .await;
        drain().await;

        assert_eq!(messenger.dm_count(), 1);
    }

    #[tokio::test]
    async fn stale_edit_without_a_record_is_ignored() {
        let (pipeline, messenger) = pipeline_with(&[("rust", &[42])]).await;

        let mut ev = edited(100, 7, Some("hello rust world"));
        ev.posted_at = Utc::now() - chrono::Duration::minutes(5);
        pipeline.on_message_edited(&ev).await;
        drain().await;

        assert_eq!(messenger.dm_count(), 0);
    }

    #[tokio::test]
    async fn deleting_the_source_retracts_and_resets_cooldowns() {
        let (pipeline, messenger) = pipeline_with(&[("rust", &[42])]).await;

        pipeline.on_message_posted(&posted(100, 7, "rust rules")).await;
        drain().await;

        pipeline
            .on_message_deleted(&MessageDeleted {
                channel_id: ChannelId(10),
                message_id: MessageId(100),
            })
            .await;
        drain().await;

        let calls = messenger.calls();
        assert!(matches!(calls.last(), Some(Call::Delete { .. })));

        pipeline.on_message_posted(&posted(101, 8, "rust redux")).await;
        drain().await;
        assert_eq!(messenger.dm_count(), 2);
    }

    #[tokio::test]
    async fn dismiss_is_only_honored_for_the_intended_recipient() {
        let (pipeline, messenger) = pipeline_with(&[("rust", &[42])]).await;
        let notification = MessageRef::new(DM_CHANNEL, MessageId(1));
        let custom_id = crate::messaging::types::encode_dismiss_id(UserId(42));

        assert_eq!(
            pipeline.on_dismiss(UserId(7), &custom_id, notification),
            DismissOutcome::NotYours
        );
        drain().await;
        assert!(messenger.calls().is_empty());

        assert_eq!(
            pipeline.on_dismiss(UserId(42), &custom_id, notification),
            DismissOutcome::Dismissed
        );
        drain().await;
        assert_eq!(
            messenger.calls(),
            vec![Call::Delete {
                message: notification
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn expired_bookkeeping_is_purged_on_the_next_message() {
        let (pipeline, _messenger) = pipeline_with(&[("rust", &[42])]).await;

        pipeline.on_message_posted(&posted(100, 7, "rust rules")).await;
        drain().await;
        assert_eq!(pipeline.tracked_entry_counts().await, (1, 1, 1));

        // Well past every window: the next event sweeps the stale entries,
        // leaving only the new author's activity marker.
        tokio::time::advance(Duration::from_secs(700)).await;
        pipeline.on_message_posted(&posted(101, 8, "nothing to see")).await;
        drain().await;
        assert_eq!(pipeline.tracked_entry_counts().await, (0, 1, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn tracking_expires_so_late_edits_do_nothing() {
        let (pipeline, messenger) = pipeline_with(&[("rust", &[42])]).await;

        pipeline.on_message_posted(&posted(100, 7, "rust rules")).await;
        drain().await;
        assert_eq!(messenger.dm_count(), 1);

        // Past the tracking TTL the record is evicted; an edit that drops
        // the keyword no longer retracts anything.
        tokio::time::advance(Duration::from_secs(700)).await;
        let mut ev = edited(100, 7, Some("never mind"));
        ev.posted_at = Utc::now() - chrono::Duration::minutes(15);
        pipeline.on_message_edited(&ev).await;
        drain().await;

        assert_eq!(
            messenger
                .calls()
                .iter()
                .filter(|c| matches!(c, Call::Delete { .. }))
                .count(),
            0
        );
    }
}
