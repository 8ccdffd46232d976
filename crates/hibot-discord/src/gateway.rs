//! Gateway event handling: translates serenity events into the core event
//! types and feeds them to the services.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, OnceLock,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::builder::{CreateInteractionResponse, CreateInteractionResponseMessage};
use serenity::client::{Context, EventHandler};
use serenity::gateway::ShardManager;
use serenity::model::application::{Command, ComponentInteraction, Interaction};
use serenity::model::channel::Message;
use serenity::model::event::{GuildMemberUpdateEvent, MessageUpdateEvent};
use serenity::model::gateway::Ready;
use serenity::model::guild::Member;
use serenity::model::id;

use hibot_core::{
    config::Config,
    domain::{ChannelId, GuildId, MessageId, MessageRef, RoleId, UserId},
    donors::DonorService,
    highlights::{DismissOutcome, HighlightPipeline},
    messaging::types::{
        MemberUpdated, MessageDeleted, MessageEdited, MessagePosted, DISMISS_ID_PREFIX,
    },
    peps::{PepRegistry, PepResponder},
    stats::StatsService,
};

use crate::commands;

pub struct AppState {
    pub cfg: Arc<Config>,
    pub pipeline: HighlightPipeline,
    pub responder: PepResponder,
    pub registry: PepRegistry,
    pub stats: StatsService,
    pub donors: DonorService,
    pub shard_manager: Arc<ShardManager>,
}

/// Installed into the client before startup; the state arrives only after
/// the client (and thus the HTTP handle the services need) exists.
#[derive(Default)]
pub struct Handler {
    state: OnceLock<AppState>,
    started: AtomicBool,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, state: AppState) {
        let _ = self.state.set(state);
    }

    fn state(&self) -> Option<&AppState> {
        self.state.get()
    }

    async fn handle_component(&self, ctx: &Context, component: ComponentInteraction) {
        let Some(state) = self.state() else { return };
        if !component.data.custom_id.starts_with(DISMISS_ID_PREFIX) {
            return;
        }

        let invoker = UserId(component.user.id.get());
        let notification = MessageRef::new(
            ChannelId(component.message.channel_id.get()),
            MessageId(component.message.id.get()),
        );
        let response =
            match state
                .pipeline
                .on_dismiss(invoker, &component.data.custom_id, notification)
            {
                DismissOutcome::Dismissed => CreateInteractionResponse::Acknowledge,
                DismissOutcome::NotYours => CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content("Only the person who triggered this message can dismiss it.")
                        .ephemeral(true),
                ),
            };
        if let Err(err) = component.create_response(&ctx.http, response).await {
            tracing::warn!("failed to respond to a dismiss press: {err}");
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        let Some(state) = self.state() else { return };
        tracing::info!("{} is connected", ready.user.name);

        // Reconnects re-fire ready; the cache rebuild runs once.
        if !self.started.swap(true, Ordering::SeqCst) {
            if let Err(err) = state.pipeline.rebuild_cache().await {
                tracing::error!("failed to rebuild the highlight cache: {err}");
            }
        }

        let definitions = commands::definitions();
        let registered = match state.cfg.guild {
            Some(guild) => {
                id::GuildId::new(guild.0)
                    .set_commands(&ctx.http, definitions)
                    .await
            }
            None => Command::set_global_commands(&ctx.http, definitions).await,
        };
        if let Err(err) = registered {
            tracing::error!("failed to register slash commands: {err}");
        }
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let Some(state) = self.state() else { return };
        let Some(guild_id) = msg.guild_id else { return };

        let ev = MessagePosted {
            guild_id: GuildId(guild_id.get()),
            channel_id: ChannelId(msg.channel_id.get()),
            message_id: MessageId(msg.id.get()),
            author: UserId(msg.author.id.get()),
            author_is_bot: msg.author.bot,
            content: msg.content.clone(),
        };
        state.pipeline.on_message_posted(&ev).await;
        if let Err(err) = state.responder.on_message_posted(&ev).await {
            tracing::warn!("pep responder failed on a new message: {err}");
        }
    }

    async fn message_update(
        &self,
        _ctx: Context,
        _old: Option<Message>,
        _new: Option<Message>,
        event: MessageUpdateEvent,
    ) {
        let Some(state) = self.state() else { return };
        let Some(guild_id) = event.guild_id else { return };
        // Embed-unfurl updates carry no author; nothing to do for those.
        let Some(author) = &event.author else { return };

        let ev = MessageEdited {
            guild_id: GuildId(guild_id.get()),
            channel_id: ChannelId(event.channel_id.get()),
            message_id: MessageId(event.id.get()),
            author: UserId(author.id.get()),
            author_is_bot: author.bot,
            content: event.content.clone(),
            posted_at: snowflake_time(event.id),
        };
        state.pipeline.on_message_edited(&ev).await;
        if let Err(err) = state.responder.on_message_edited(&ev).await {
            tracing::warn!("pep responder failed on an edit: {err}");
        }
    }

    async fn message_delete(
        &self,
        _ctx: Context,
        channel_id: id::ChannelId,
        message_id: id::MessageId,
        _guild_id: Option<id::GuildId>,
    ) {
        let Some(state) = self.state() else { return };

        let ev = MessageDeleted {
            channel_id: ChannelId(channel_id.get()),
            message_id: MessageId(message_id.get()),
        };
        state.pipeline.on_message_deleted(&ev).await;
        if let Err(err) = state.responder.on_message_deleted(&ev).await {
            tracing::warn!("pep responder failed on a delete: {err}");
        }
    }

    async fn guild_member_update(
        &self,
        _ctx: Context,
        _old: Option<Member>,
        _new: Option<Member>,
        event: GuildMemberUpdateEvent,
    ) {
        let Some(state) = self.state() else { return };

        let ev = MemberUpdated {
            guild_id: GuildId(event.guild_id.get()),
            user_id: UserId(event.user.id.get()),
            role_ids: event.roles.iter().map(|role| RoleId(role.get())).collect(),
        };
        if let Err(err) = state.donors.on_member_updated(&ev).await {
            tracing::warn!("donor role update failed: {err}");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(cmd) => {
                let Some(state) = self.state() else { return };
                commands::dispatch(state, &ctx, cmd).await;
            }
            Interaction::Component(component) => {
                self.handle_component(&ctx, component).await;
            }
            _ => {}
        }
    }
}

/// When the message was posted, recovered from its snowflake id.
fn snowflake_time(message_id: id::MessageId) -> DateTime<Utc> {
    DateTime::from_timestamp(message_id.created_at().unix_timestamp(), 0)
        .unwrap_or_else(Utc::now)
}
