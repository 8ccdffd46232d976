use std::{env, path::PathBuf, time::Duration};

use crate::{
    domain::{ChannelId, GuildId, RoleId},
    errors::Error,
    Result,
};

/// Typed configuration, loaded from the environment (with `.env` support).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub discord_token: String,
    pub guild: Option<GuildId>,
    pub theme: u32,

    // Stats display channels
    pub sub_count_channel: Option<ChannelId>,
    pub view_count_channel: Option<ChannelId>,
    pub member_count_channel: Option<ChannelId>,

    // External stats API
    pub youtube_channel_id: Option<String>,
    pub youtube_api_key: Option<String>,

    // Donor roles
    pub donor_role: Option<RoleId>,
    pub patron_role: Option<RoleId>,

    // Subscription store
    pub store_path: Option<PathBuf>,

    // Highlight pipeline windows
    pub keyword_cooldown: Duration,
    pub recent_activity_window: Duration,
    pub highlight_tracking_ttl: Duration,
    pub freshly_posted_window: Duration,

    // Periodic tasks
    pub stats_poll_interval: Duration,
    pub pep_refresh_interval: Duration,
    pub donor_sweep_interval: Duration,
    pub http_timeout: Duration,

    // Links
    pub youtube_url: String,
    pub videos_repo: String,
    pub bot_repo: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Do not override variables already present in the environment.
        let _ = dotenvy::dotenv();

        let discord_token = env_str("DISCORD_TOKEN").unwrap_or_default();
        if discord_token.trim().is_empty() {
            return Err(Error::Config(
                "DISCORD_TOKEN environment variable is required".to_string(),
            ));
        }

        let guild = env_u64("GUILD_ID").map(GuildId);
        let theme = env_str("THEME_COLOR")
            .and_then(|s| u32::from_str_radix(s.trim_start_matches("0x"), 16).ok())
            .unwrap_or(0x0B7CD3);

        let sub_count_channel = env_u64("SUB_COUNT_CHANNEL").map(ChannelId);
        let view_count_channel = env_u64("VIEW_COUNT_CHANNEL").map(ChannelId);
        let member_count_channel = env_u64("MEMBER_COUNT_CHANNEL").map(ChannelId);

        let youtube_channel_id = env_str("YOUTUBE_CHANNEL_ID").and_then(non_empty);
        let youtube_api_key = env_str("YOUTUBE_API_KEY").and_then(non_empty);

        let donor_role = env_u64("DONOR_ROLE").map(RoleId);
        let patron_role = env_u64("PATRON_ROLE").map(RoleId);

        // NO_STORE runs the bot without durable subscriptions (everything is
        // lost on restart). Useful for local smoke testing.
        let store_path = if env_bool("NO_STORE").unwrap_or(false) {
            None
        } else {
            Some(PathBuf::from(
                env_str("STORE_PATH").unwrap_or("hibot-store.json".to_string()),
            ))
        };

        let keyword_cooldown = Duration::from_secs(env_u64("KEYWORD_COOLDOWN_SECS").unwrap_or(120));
        let recent_activity_window =
            Duration::from_secs(env_u64("RECENT_ACTIVITY_WINDOW_SECS").unwrap_or(60));
        let highlight_tracking_ttl =
            Duration::from_secs(env_u64("HIGHLIGHT_TRACKING_TTL_SECS").unwrap_or(600));
        let freshly_posted_window =
            Duration::from_secs(env_u64("FRESHLY_POSTED_WINDOW_SECS").unwrap_or(60));

        let stats_poll_interval =
            Duration::from_secs(env_u64("STATS_POLL_INTERVAL_SECS").unwrap_or(5 * 60));
        let pep_refresh_interval =
            Duration::from_secs(env_u64("PEP_REFRESH_INTERVAL_SECS").unwrap_or(12 * 60 * 60));
        let donor_sweep_interval =
            Duration::from_secs(env_u64("DONOR_SWEEP_INTERVAL_SECS").unwrap_or(60 * 60));
        let http_timeout = Duration::from_secs(env_u64("HTTP_TIMEOUT_SECS").unwrap_or(10));

        let youtube_url = env_str("YOUTUBE_URL")
            .unwrap_or("https://www.youtube.com/channel/UCaiL2GDNpLYH6Wokkk1VNcg".to_string());
        let videos_repo = env_str("VIDEOS_REPO")
            .unwrap_or("https://github.com/mCodingLLC/VideosSampleCode".to_string());
        let bot_repo =
            env_str("BOT_REPO").unwrap_or("https://github.com/mcb-dev/mCodingBot".to_string());

        Ok(Self {
            discord_token,
            guild,
            theme,
            sub_count_channel,
            view_count_channel,
            member_count_channel,
            youtube_channel_id,
            youtube_api_key,
            donor_role,
            patron_role,
            store_path,
            keyword_cooldown,
            recent_activity_window,
            highlight_tracking_ttl,
            freshly_posted_window,
            stats_poll_interval,
            pep_refresh_interval,
            donor_sweep_interval,
            http_timeout,
            youtube_url,
            videos_repo,
            bot_repo,
        })
    }

    /// Warn about optional features that are disabled by missing config.
    pub fn warn_missing(&self) {
        if self.guild.is_none() {
            tracing::warn!(
                "server stats and donor roles will not be updated because `GUILD_ID` is not set"
            );
            return;
        }
        if self.sub_count_channel.is_none() {
            warn_missing_var("SUB_COUNT_CHANNEL", "post sub count stats");
        }
        if self.view_count_channel.is_none() {
            warn_missing_var("VIEW_COUNT_CHANNEL", "post view count stats");
        }
        if self.member_count_channel.is_none() {
            warn_missing_var("MEMBER_COUNT_CHANNEL", "post member count stats");
        }
        if self.donor_role.is_none() {
            warn_missing_var("DONOR_ROLE", "update donor roles");
        }
        if self.youtube_channel_id.is_none() || self.youtube_api_key.is_none() {
            tracing::warn!(
                "`YOUTUBE_CHANNEL_ID` and `YOUTUBE_API_KEY` are required to poll channel stats"
            );
        }
        if self.store_path.is_none() {
            tracing::warn!("running without a subscription store file (NO_STORE)");
        }
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            discord_token: "test-token".to_string(),
            guild: Some(GuildId(1)),
            theme: 0x0B7CD3,
            sub_count_channel: Some(ChannelId(101)),
            view_count_channel: Some(ChannelId(102)),
            member_count_channel: Some(ChannelId(103)),
            youtube_channel_id: None,
            youtube_api_key: None,
            donor_role: Some(RoleId(201)),
            patron_role: Some(RoleId(202)),
            store_path: None,
            keyword_cooldown: Duration::from_secs(120),
            recent_activity_window: Duration::from_secs(60),
            highlight_tracking_ttl: Duration::from_secs(600),
            freshly_posted_window: Duration::from_secs(60),
            stats_poll_interval: Duration::from_secs(300),
            pep_refresh_interval: Duration::from_secs(12 * 60 * 60),
            donor_sweep_interval: Duration::from_secs(60 * 60),
            http_timeout: Duration::from_secs(10),
            youtube_url: "https://www.youtube.com/".to_string(),
            videos_repo: "https://example.com/videos".to_string(),
            bot_repo: "https://example.com/bot".to_string(),
        }
    }
}

fn warn_missing_var(variable: &str, feature: &str) {
    tracing::warn!("`{variable}` is required to {feature}");
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
