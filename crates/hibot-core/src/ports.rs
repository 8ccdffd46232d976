use async_trait::async_trait;

use crate::{
    domain::{ChannelId, GuildId, RoleId, UserId},
    Result,
};

#[derive(Clone, Debug)]
pub struct GuildMember {
    pub user_id: UserId,
    pub role_ids: Vec<RoleId>,
}

/// Guild-level REST operations used by the stats poller and donor sweep.
#[async_trait]
pub trait GuildPort: Send + Sync {
    async fn rename_channel(&self, channel: ChannelId, name: &str) -> Result<()>;

    /// Best-known member count for the guild (max of the approximate count
    /// and whatever the gateway cache has seen).
    async fn member_count(&self, guild: GuildId) -> Result<Option<u64>>;

    async fn members(&self, guild: GuildId) -> Result<Vec<GuildMember>>;

    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()>;

    async fn remove_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()>;
}
