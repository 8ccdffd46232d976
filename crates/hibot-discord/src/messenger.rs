//! REST-backed implementations of the core ports.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::builder::{
    CreateActionRow, CreateButton, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter,
    CreateMessage, EditChannel, EditMessage,
};
use serenity::cache::Cache;
use serenity::http::{Http, HttpError};
use serenity::model::application::ButtonStyle;
use serenity::model::channel::MessageReference;
use serenity::model::id;

use hibot_core::{
    domain::{ChannelId, GuildId, MessageId, MessageRef, RoleId, UserId},
    messaging::{
        port::Messenger,
        types::{encode_dismiss_id, Embed, OutboundMessage},
    },
    ports::{GuildMember, GuildPort},
    Error, Result,
};

pub struct DiscordMessenger {
    http: Arc<Http>,
}

impl DiscordMessenger {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Messenger for DiscordMessenger {
    async fn send_dm(&self, user: UserId, message: &OutboundMessage) -> Result<MessageRef> {
        let channel = id::UserId::new(user.0)
            .create_dm_channel(&self.http)
            .await
            .map_err(map_err)?;
        let sent = channel
            .id
            .send_message(&self.http, build_message(message))
            .await
            .map_err(map_err)?;
        Ok(MessageRef::new(
            ChannelId(sent.channel_id.get()),
            MessageId(sent.id.get()),
        ))
    }

    async fn send_reply(
        &self,
        target: MessageRef,
        message: &OutboundMessage,
    ) -> Result<MessageRef> {
        let channel = id::ChannelId::new(target.channel_id.0);
        let reference = MessageReference::from((channel, id::MessageId::new(target.message_id.0)));
        let sent = channel
            .send_message(&self.http, build_message(message).reference_message(reference))
            .await
            .map_err(map_err)?;
        Ok(MessageRef::new(
            ChannelId(sent.channel_id.get()),
            MessageId(sent.id.get()),
        ))
    }

    async fn edit_message(&self, target: MessageRef, message: &OutboundMessage) -> Result<()> {
        let mut builder = EditMessage::new();
        if let Some(content) = &message.content {
            builder = builder.content(content.clone());
        }
        if let Some(embed) = &message.embed {
            builder = builder.embed(build_embed(embed.clone()));
        }
        id::ChannelId::new(target.channel_id.0)
            .edit_message(&self.http, id::MessageId::new(target.message_id.0), builder)
            .await
            .map(|_| ())
            .map_err(map_err)
    }

    async fn delete_message(&self, target: MessageRef) -> Result<()> {
        id::ChannelId::new(target.channel_id.0)
            .delete_message(&self.http, id::MessageId::new(target.message_id.0))
            .await
            .map_err(map_err)
    }
}

pub struct DiscordGuild {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl DiscordGuild {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }
}

#[async_trait]
impl GuildPort for DiscordGuild {
    async fn rename_channel(&self, channel: ChannelId, name: &str) -> Result<()> {
        id::ChannelId::new(channel.0)
            .edit(&self.http, EditChannel::new().name(name))
            .await
            .map(|_| ())
            .map_err(map_err)
    }

    async fn member_count(&self, guild: GuildId) -> Result<Option<u64>> {
        let guild_id = id::GuildId::new(guild.0);
        let approximate = self
            .http
            .get_guild_with_counts(guild_id)
            .await
            .map_err(map_err)?
            .approximate_member_count;
        let cached = self.cache.guild(guild_id).map(|guild| guild.member_count);
        Ok(match (approximate, cached) {
            (Some(a), Some(c)) => Some(a.max(c)),
            (count, None) | (None, count) => count,
        })
    }

    async fn members(&self, guild: GuildId) -> Result<Vec<GuildMember>> {
        let members = self
            .http
            .get_guild_members(id::GuildId::new(guild.0), Some(1000), None)
            .await
            .map_err(map_err)?;
        Ok(members
            .into_iter()
            .map(|member| GuildMember {
                user_id: UserId(member.user.id.get()),
                role_ids: member.roles.iter().map(|role| RoleId(role.get())).collect(),
            })
            .collect())
    }

    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        self.http
            .add_member_role(
                id::GuildId::new(guild.0),
                id::UserId::new(user.0),
                id::RoleId::new(role.0),
                None,
            )
            .await
            .map_err(map_err)
    }

    async fn remove_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        self.http
            .remove_member_role(
                id::GuildId::new(guild.0),
                id::UserId::new(user.0),
                id::RoleId::new(role.0),
                None,
            )
            .await
            .map_err(map_err)
    }
}

fn build_message(message: &OutboundMessage) -> CreateMessage {
    let mut builder = CreateMessage::new();
    if let Some(content) = &message.content {
        builder = builder.content(content.clone());
    }
    if let Some(embed) = &message.embed {
        builder = builder.embed(build_embed(embed.clone()));
    }
    if let Some(user) = message.dismiss_for {
        builder = builder.components(vec![CreateActionRow::Buttons(vec![
            CreateButton::new(encode_dismiss_id(user))
                .label("Dismiss")
                .style(ButtonStyle::Secondary),
        ])]);
    }
    builder
}

pub fn build_embed(embed: Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new().colour(embed.color);
    if let Some(title) = embed.title {
        builder = builder.title(title);
    }
    if let Some(url) = embed.url {
        builder = builder.url(url);
    }
    if let Some(description) = embed.description {
        builder = builder.description(description);
    }
    if let Some(author) = embed.author_name {
        builder = builder.author(CreateEmbedAuthor::new(author));
    }
    if let Some(footer) = embed.footer {
        builder = builder.footer(CreateEmbedFooter::new(footer));
    }
    builder
}

/// Missing targets (deleted messages, closed DMs, departed users) become
/// `Error::NotFound` so callers can treat them as stale references.
fn map_err(err: serenity::Error) -> Error {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(ref resp)) = err {
        if resp.status_code.as_u16() == 404 {
            return Error::NotFound(err.to_string());
        }
    }
    Error::Gateway(err.to_string())
}
