//! `/highlights` subcommands. Thin handlers: validate, hit the store, mirror
//! the result into the cache.

use crate::{
    domain::UserId,
    highlights::pipeline::HighlightPipeline,
    messaging::types::Reply,
    store::LinkOutcome,
    Result,
};

pub const MAX_HIGHLIGHTS: usize = 25;
pub const MAX_HIGHLIGHT_LENGTH: usize = 32;

pub async fn create(pipeline: &HighlightPipeline, user: UserId, word: &str) -> Result<Reply> {
    if word.chars().count() > MAX_HIGHLIGHT_LENGTH {
        return Ok(Reply::ephemeral_text(format!(
            "Highlights can not be longer than {MAX_HIGHLIGHT_LENGTH} characters."
        )));
    }

    let total = pipeline.store().count_for_user(user).await?;
    if total >= MAX_HIGHLIGHTS {
        return Ok(Reply::ephemeral_text(format!(
            "You can only have {MAX_HIGHLIGHTS} highlights."
        )));
    }

    match pipeline.store().link(user, word).await? {
        LinkOutcome::AlreadyLinked => Ok(Reply::ephemeral_text(format!(
            "\"{word}\" is already one of your highlights."
        ))),
        LinkOutcome::Linked => {
            pipeline.cache_add(word, user).await;
            Ok(Reply::text(format!("Added \"{word}\" to your highlights.")))
        }
    }
}

pub async fn delete(pipeline: &HighlightPipeline, user: UserId, word: &str) -> Result<Reply> {
    if pipeline.store().unlink(user, word).await? {
        pipeline.cache_remove(word, user).await;
        Ok(Reply::text(format!(
            "Removed \"{word}\" from your highlights."
        )))
    } else {
        Ok(Reply::ephemeral_text(format!(
            "\"{word}\" was not one of your highlights."
        )))
    }
}

/// Reads straight from the store: the cache is keyed by word, not by user.
pub async fn list(pipeline: &HighlightPipeline, user: UserId) -> Result<Reply> {
    let highlights = pipeline.store().highlights_for_user(user).await?;
    if highlights.is_empty() {
        return Ok(Reply::ephemeral_text("You do not have any highlights."));
    }
    Ok(Reply::ephemeral_text(highlights.join("\n")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        domain::MessageRef,
        highlights::pipeline::PipelineConfig,
        messaging::{port::Messenger, types::OutboundMessage},
        store::JsonStore,
    };

    struct NullMessenger;

    #[async_trait]
    impl Messenger for NullMessenger {
        async fn send_dm(&self, _: UserId, _: &OutboundMessage) -> Result<MessageRef> {
            unimplemented!("command tests never send")
        }
        async fn send_reply(&self, _: MessageRef, _: &OutboundMessage) -> Result<MessageRef> {
            unimplemented!("command tests never send")
        }
        async fn edit_message(&self, _: MessageRef, _: &OutboundMessage) -> Result<()> {
            unimplemented!("command tests never send")
        }
        async fn delete_message(&self, _: MessageRef) -> Result<()> {
            unimplemented!("command tests never send")
        }
    }

    fn pipeline() -> HighlightPipeline {
        HighlightPipeline::new(
            PipelineConfig::default(),
            Arc::new(JsonStore::in_memory()),
            Arc::new(NullMessenger),
        )
    }

    #[tokio::test]
    async fn create_rejects_words_over_the_length_limit() {
        let pipeline = pipeline();
        let word = "x".repeat(33);
        let reply = create(&pipeline, UserId(1), &word).await.unwrap();
        assert!(reply.ephemeral);
        assert!(reply.content.unwrap().contains("32 characters"));
    }

    #[tokio::test]
    async fn create_rejects_more_than_the_subscription_limit() {
        let pipeline = pipeline();
        for i in 0..MAX_HIGHLIGHTS {
            let reply = create(&pipeline, UserId(1), &format!("word{i}"))
                .await
                .unwrap();
            assert!(!reply.ephemeral);
        }
        let reply = create(&pipeline, UserId(1), "one-too-many").await.unwrap();
        assert!(reply.ephemeral);
        assert!(reply.content.unwrap().contains("25 highlights"));
    }

    #[tokio::test]
    async fn duplicate_create_reports_already_subscribed_without_growing_the_cache() {
        let pipeline = pipeline();
        create(&pipeline, UserId(1), "rust").await.unwrap();
        let reply = create(&pipeline, UserId(1), "rust").await.unwrap();
        assert!(reply.ephemeral);
        assert!(reply.content.unwrap().contains("already one of your highlights"));
        assert_eq!(pipeline.store().count_for_user(UserId(1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_removal_occurred() {
        let pipeline = pipeline();
        create(&pipeline, UserId(1), "rust").await.unwrap();

        let reply = delete(&pipeline, UserId(1), "rust").await.unwrap();
        assert!(!reply.ephemeral);
        assert!(reply.content.unwrap().contains("Removed"));

        let reply = delete(&pipeline, UserId(1), "rust").await.unwrap();
        assert!(reply.ephemeral);
        assert!(reply.content.unwrap().contains("was not one of your highlights"));
    }

    #[tokio::test]
    async fn list_shows_the_users_highlights() {
        let pipeline = pipeline();
        let reply = list(&pipeline, UserId(1)).await.unwrap();
        assert!(reply.content.unwrap().contains("do not have any"));

        create(&pipeline, UserId(1), "rust").await.unwrap();
        create(&pipeline, UserId(1), "python").await.unwrap();
        let reply = list(&pipeline, UserId(1)).await.unwrap();
        assert_eq!(reply.content.unwrap(), "python\nrust");
    }
}
