//! Channel statistics: polls the YouTube Data API, keeps the last known
//! numbers, and pushes them into guild channel names.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    config::Config,
    messaging::types::{Embed, Reply},
    ports::GuildPort,
    Result,
};

const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3/channels";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub subscriber_count: u64,
    pub view_count: u64,
    pub member_count: u64,
}

#[derive(Clone)]
pub struct StatsService {
    inner: Arc<StatsInner>,
}

struct StatsInner {
    cfg: Arc<Config>,
    http: reqwest::Client,
    guild: Arc<dyn GuildPort>,
    last: Mutex<Stats>,
}

impl StatsService {
    pub fn new(cfg: Arc<Config>, guild: Arc<dyn GuildPort>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(cfg.http_timeout)
            .build()
            .expect("reqwest client build");
        Self {
            inner: Arc::new(StatsInner {
                cfg,
                http,
                guild,
                last: Mutex::new(Stats::default()),
            }),
        }
    }

    pub async fn last_known(&self) -> Stats {
        *self.inner.last.lock().await
    }

    /// Poll the external API and the guild, then update the stats channels.
    /// Failed polls keep the previous numbers.
    pub async fn refresh(&self) -> Result<()> {
        let cfg = &self.inner.cfg;

        if let Some((subscriber_count, view_count)) = self.fetch_youtube().await? {
            let mut last = self.inner.last.lock().await;
            last.subscriber_count = subscriber_count;
            last.view_count = view_count;
        }

        let Some(guild) = cfg.guild else {
            return Ok(());
        };

        match self.inner.guild.member_count(guild).await? {
            Some(count) if count > 0 => {
                self.inner.last.lock().await.member_count = count;
            }
            _ => tracing::warn!("guild reported no member count"),
        }

        let stats = self.last_known().await;
        if let Some(channel) = cfg.sub_count_channel {
            self.inner
                .guild
                .rename_channel(channel, &format!("Subs: {}", display_stat(stats.subscriber_count)))
                .await?;
        }
        if let Some(channel) = cfg.view_count_channel {
            self.inner
                .guild
                .rename_channel(channel, &format!("Views: {}", display_stat(stats.view_count)))
                .await?;
        }
        if let Some(channel) = cfg.member_count_channel {
            self.inner
                .guild
                .rename_channel(channel, &format!("Members: {}", display_stat(stats.member_count)))
                .await?;
        }
        Ok(())
    }

    async fn fetch_youtube(&self) -> Result<Option<(u64, u64)>> {
        let cfg = &self.inner.cfg;
        let (Some(channel), Some(key)) = (&cfg.youtube_channel_id, &cfg.youtube_api_key) else {
            return Ok(None);
        };

        let payload: Value = self
            .inner
            .http
            .get(YOUTUBE_API_URL)
            .query(&[
                ("part", "statistics"),
                ("id", channel.as_str()),
                ("key", key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match parse_stats(&payload, channel) {
            Some(counts) => Ok(Some(counts)),
            None => {
                tracing::error!("stats payload had no usable entry for channel {channel}");
                Ok(None)
            }
        }
    }

    /// `/stats` command: the exact last-known numbers.
    pub async fn stats_reply(&self) -> Reply {
        let stats = self.last_known().await;
        Reply::embed(Embed {
            title: Some("Server stats".to_string()),
            description: Some(format!(
                "Members: {}\nSubscribers: {}\nViews: {}",
                group_digits(stats.member_count),
                group_digits(stats.subscriber_count),
                group_digits(stats.view_count),
            )),
            color: self.inner.cfg.theme,
            ..Embed::default()
        })
    }
}

/// Pull `(subscriberCount, viewCount)` for `channel` out of a YouTube
/// channels-list payload. The API reports the counters as JSON strings.
pub fn parse_stats(payload: &Value, channel: &str) -> Option<(u64, u64)> {
    let items = payload.get("items")?.as_array()?;
    let item = items
        .iter()
        .find(|item| item.get("id").and_then(Value::as_str) == Some(channel))?;
    let statistics = item.get("statistics")?;
    let subscriber_count = counter(statistics, "subscriberCount")?;
    let view_count = counter(statistics, "viewCount")?;
    Some((subscriber_count, view_count))
}

fn counter(statistics: &Value, key: &str) -> Option<u64> {
    statistics.get(key)?.as_str()?.parse::<u64>().ok()
}

/// Render a counter as a power of two with a rounded human figure, e.g.
/// `2**15.43 (44.3K)`.
pub fn display_stat(stat: u64) -> String {
    if stat == 0 {
        return "0".to_string();
    }
    let exponent = fmt_trim(truncate_decimals((stat as f64).log2(), 2));
    format!("2**{exponent} ({})", pretty_count(stat))
}

fn pretty_count(stat: u64) -> String {
    if stat >= 1_000_000 {
        scaled(stat, 1_000_000, 2, "M")
    } else if stat >= 1_000 {
        scaled(stat, 1_000, 1, "K")
    } else {
        stat.to_string()
    }
}

/// Truncated to `decimals` places, trailing zeros stripped.
fn scaled(stat: u64, unit: u64, decimals: u32, suffix: &str) -> String {
    let whole = stat / unit;
    let mut frac = (stat % unit) / (unit / 10u64.pow(decimals));
    if frac == 0 {
        return format!("{whole}{suffix}");
    }
    let mut width = decimals as usize;
    while frac % 10 == 0 {
        frac /= 10;
        width -= 1;
    }
    format!("{whole}.{frac:0width$}{suffix}")
}

fn truncate_decimals(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).trunc() / factor
}

fn fmt_trim(value: f64) -> String {
    if value == value.trunc() {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Thousands-separated rendering for exact figures.
pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::domain::{ChannelId, GuildId, RoleId, UserId};
    use crate::ports::GuildMember;

    #[test]
    fn display_stat_renders_powers_of_two() {
        assert_eq!(display_stat(0), "0");
        assert_eq!(display_stat(500), "2**8.96 (500)");
        assert_eq!(display_stat(1024), "2**10 (1K)");
        assert_eq!(display_stat(44_300), "2**15.43 (44.3K)");
        assert_eq!(display_stat(1_500_000), "2**20.51 (1.5M)");
        // Million-scale figures keep two decimals.
        assert_eq!(display_stat(1_234_567), "2**20.23 (1.23M)");
        assert_eq!(display_stat(1_050_000), "2**20 (1.05M)");
    }

    #[test]
    fn group_digits_inserts_thousands_separators() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1_000), "1,000");
        assert_eq!(group_digits(1_234_567), "1,234,567");
    }

    #[test]
    fn parse_stats_reads_string_counters() {
        let payload = json!({
            "items": [
                {"id": "other", "statistics": {"subscriberCount": "1", "viewCount": "2"}},
                {"id": "mine", "statistics": {"subscriberCount": "44300", "viewCount": "9000000"}},
            ]
        });
        assert_eq!(parse_stats(&payload, "mine"), Some((44_300, 9_000_000)));
    }

    #[test]
    fn parse_stats_rejects_malformed_payloads() {
        assert_eq!(parse_stats(&json!({}), "mine"), None);
        assert_eq!(parse_stats(&json!({"items": []}), "mine"), None);
        let wrong_channel = json!({
            "items": [{"id": "other", "statistics": {"subscriberCount": "1", "viewCount": "2"}}]
        });
        assert_eq!(parse_stats(&wrong_channel, "mine"), None);
        let non_string = json!({
            "items": [{"id": "mine", "statistics": {"subscriberCount": 1, "viewCount": 2}}]
        });
        assert_eq!(parse_stats(&non_string, "mine"), None);
    }

    #[derive(Default)]
    struct FakeGuild {
        member_count: Option<u64>,
        renames: StdMutex<Vec<(ChannelId, String)>>,
    }

    #[async_trait]
    impl GuildPort for FakeGuild {
        async fn rename_channel(&self, channel: ChannelId, name: &str) -> Result<()> {
            self.renames.lock().unwrap().push((channel, name.to_string()));
            Ok(())
        }

        async fn member_count(&self, _: GuildId) -> Result<Option<u64>> {
            Ok(self.member_count)
        }

        async fn members(&self, _: GuildId) -> Result<Vec<GuildMember>> {
            Ok(Vec::new())
        }

        async fn add_role(&self, _: GuildId, _: UserId, _: RoleId) -> Result<()> {
            Ok(())
        }

        async fn remove_role(&self, _: GuildId, _: UserId, _: RoleId) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn refresh_renames_the_stats_channels() {
        let guild = Arc::new(FakeGuild {
            member_count: Some(44_300),
            ..FakeGuild::default()
        });
        let service = StatsService::new(Arc::new(Config::for_tests()), guild.clone());

        service.refresh().await.unwrap();

        let renames = guild.renames.lock().unwrap().clone();
        assert_eq!(
            renames,
            vec![
                (ChannelId(101), "Subs: 0".to_string()),
                (ChannelId(102), "Views: 0".to_string()),
                (ChannelId(103), "Members: 2**15.43 (44.3K)".to_string()),
            ]
        );
        assert_eq!(service.last_known().await.member_count, 44_300);
    }

    #[tokio::test]
    async fn refresh_keeps_the_last_member_count_when_the_guild_reports_none() {
        let guild = Arc::new(FakeGuild::default());
        let service = StatsService::new(Arc::new(Config::for_tests()), guild.clone());
        service.inner.last.lock().await.member_count = 7;

        service.refresh().await.unwrap();

        assert_eq!(service.last_known().await.member_count, 7);
    }

    #[tokio::test]
    async fn stats_reply_uses_exact_figures() {
        let guild = Arc::new(FakeGuild::default());
        let service = StatsService::new(Arc::new(Config::for_tests()), guild);
        *service.inner.last.lock().await = Stats {
            subscriber_count: 44_300,
            view_count: 9_000_000,
            member_count: 12_345,
        };

        let reply = service.stats_reply().await;
        let description = reply.embed.unwrap().description.unwrap();
        assert_eq!(description, "Members: 12,345\nSubscribers: 44,300\nViews: 9,000,000");
    }
}
