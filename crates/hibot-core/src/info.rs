//! Informational commands.

use std::time::Duration;

use crate::{config::Config, messaging::types::{Embed, Reply}};

/// `/links`: the project links configured for this deployment.
pub fn links_reply(cfg: &Config) -> Reply {
    Reply::embed(Embed {
        title: Some("Links".to_string()),
        description: Some(format!(
            "[YouTube]({})\n[Videos sample code]({})\n[Bot source]({})",
            cfg.youtube_url, cfg.videos_repo, cfg.bot_repo,
        )),
        color: cfg.theme,
        ..Embed::default()
    })
}

/// `/ping`, with the gateway heartbeat latency when one has been measured.
pub fn ping_reply(latency: Option<Duration>) -> Reply {
    match latency {
        Some(latency) => Reply::text(format!("Pong! {} ms.", latency.as_millis())),
        None => Reply::text("Pong!"),
    }
}
