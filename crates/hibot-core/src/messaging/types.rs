use chrono::{DateTime, Utc};

use crate::domain::{ChannelId, GuildId, MessageId, RoleId, UserId};

/// A new guild message from the gateway.
#[derive(Clone, Debug)]
pub struct MessagePosted {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub author: UserId,
    pub author_is_bot: bool,
    pub content: String,
}

/// An edit to a guild message. `content` is absent for non-text updates.
#[derive(Clone, Debug)]
pub struct MessageEdited {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub author: UserId,
    pub author_is_bot: bool,
    pub content: Option<String>,
    /// When the *original* message was posted (snowflake timestamp).
    pub posted_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug)]
pub struct MessageDeleted {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

#[derive(Clone, Debug)]
pub struct MemberUpdated {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub role_ids: Vec<RoleId>,
}

/// Minimal embed model; the adapter maps this onto the platform's builder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Embed {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub author_name: Option<String>,
    pub footer: Option<String>,
    pub color: u32,
}

/// An outbound message: plain text and/or an embed, optionally carrying a
/// Dismiss button bound to one recipient.
#[derive(Clone, Debug, Default)]
pub struct OutboundMessage {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    pub dismiss_for: Option<UserId>,
}

impl OutboundMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embed: Some(embed),
            ..Self::default()
        }
    }

    pub fn with_dismiss(mut self, user: UserId) -> Self {
        self.dismiss_for = Some(user);
        self
    }
}

/// A command reply. Error/informational paths are ephemeral (visible only to
/// the invoker).
#[derive(Clone, Debug)]
pub struct Reply {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    pub ephemeral: bool,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embed: None,
            ephemeral: false,
        }
    }

    pub fn ephemeral_text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embed: None,
            ephemeral: true,
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embed: Some(embed),
            ephemeral: false,
        }
    }
}

pub const DISMISS_ID_PREFIX: &str = "hl-dismiss";

/// Encode the intended recipient into the Dismiss button's custom id, so only
/// that recipient can invoke it.
pub fn encode_dismiss_id(user: UserId) -> String {
    format!("{DISMISS_ID_PREFIX}:{}", user.0)
}

pub fn decode_dismiss_id(custom_id: &str) -> Option<UserId> {
    let rest = custom_id.strip_prefix(DISMISS_ID_PREFIX)?.strip_prefix(':')?;
    rest.parse::<u64>().ok().map(UserId)
}
