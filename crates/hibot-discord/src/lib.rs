//! Discord adapter: serenity gateway + REST implementations of the core
//! ports, slash command wiring, and the background task loop.

use std::sync::Arc;

use serenity::client::Client;
use serenity::model::gateway::GatewayIntents;
use tokio_util::sync::CancellationToken;

use hibot_core::{
    config::Config,
    donors::DonorService,
    highlights::{HighlightPipeline, PipelineConfig},
    messaging::port::Messenger,
    peps::{PepRegistry, PepResponder},
    ports::GuildPort,
    stats::StatsService,
    store::HighlightStore,
    tasks::spawn_periodic,
};

pub mod commands;
pub mod gateway;
pub mod messenger;

use gateway::{AppState, Handler};
use messenger::{DiscordGuild, DiscordMessenger};

/// Connect to the gateway and run until the connection ends.
pub async fn run(cfg: Arc<Config>, store: Arc<dyn HighlightStore>) -> anyhow::Result<()> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = Arc::new(Handler::new());
    let mut client = Client::builder(&cfg.discord_token, intents)
        .event_handler_arc(handler.clone())
        .await?;

    let messenger: Arc<dyn Messenger> = Arc::new(DiscordMessenger::new(client.http.clone()));
    let guild: Arc<dyn GuildPort> =
        Arc::new(DiscordGuild::new(client.http.clone(), client.cache.clone()));

    let pipeline = HighlightPipeline::new(PipelineConfig::from(&*cfg), store.clone(), messenger.clone());
    let registry = PepRegistry::new(cfg.http_timeout);
    let responder = PepResponder::new(
        registry.clone(),
        messenger.clone(),
        cfg.theme,
        cfg.freshly_posted_window,
    );
    let stats = StatsService::new(cfg.clone(), guild.clone());
    let donors = DonorService::new(cfg.clone(), store, guild);

    handler.install(AppState {
        cfg: cfg.clone(),
        pipeline,
        responder,
        registry: registry.clone(),
        stats: stats.clone(),
        donors: donors.clone(),
        shard_manager: client.shard_manager.clone(),
    });

    let cancel = CancellationToken::new();
    spawn_periodic("stats poller", cfg.stats_poll_interval, cancel.clone(), {
        let stats = stats.clone();
        move || {
            let stats = stats.clone();
            async move { stats.refresh().await }
        }
    });
    spawn_periodic(
        "pep registry refresh",
        cfg.pep_refresh_interval,
        cancel.clone(),
        move || {
            let registry = registry.clone();
            async move { registry.refresh().await }
        },
    );
    spawn_periodic(
        "donor sweep",
        cfg.donor_sweep_interval,
        cancel.clone(),
        move || {
            let donors = donors.clone();
            async move { donors.sweep().await }
        },
    );

    let result = client.start().await;
    cancel.cancel();
    result.map_err(Into::into)
}
