//! Donor role upkeep: a manual flag set by moderators plus automatic role
//! grants for patrons, reconciled on member updates and a periodic sweep.

use std::sync::Arc;

use crate::{
    config::Config,
    domain::{RoleId, UserId},
    messaging::types::{MemberUpdated, Reply},
    ports::GuildPort,
    store::HighlightStore,
    Result,
};

#[derive(Clone)]
pub struct DonorService {
    inner: Arc<DonorInner>,
}

struct DonorInner {
    cfg: Arc<Config>,
    store: Arc<dyn HighlightStore>,
    guild: Arc<dyn GuildPort>,
}

impl DonorService {
    pub fn new(
        cfg: Arc<Config>,
        store: Arc<dyn HighlightStore>,
        guild: Arc<dyn GuildPort>,
    ) -> Self {
        Self {
            inner: Arc::new(DonorInner { cfg, store, guild }),
        }
    }

    /// `/set-donor-status`: persist the flag and sync the role right away.
    pub async fn set_donor_status(&self, user: UserId, is_donor: bool) -> Result<Reply> {
        self.inner.store.set_donor(user, is_donor).await?;

        let cfg = &self.inner.cfg;
        if let (Some(guild), Some(role)) = (cfg.guild, cfg.donor_role) {
            if is_donor {
                self.inner.guild.add_role(guild, user, role).await?;
            } else {
                self.inner.guild.remove_role(guild, user, role).await?;
            }
        }

        let action = if is_donor { "marked" } else { "unmarked" };
        Ok(Reply::ephemeral_text(format!(
            "<@{}> {action} as a donor.",
            user.0
        )))
    }

    pub async fn on_member_updated(&self, ev: &MemberUpdated) -> Result<()> {
        if self.inner.cfg.guild != Some(ev.guild_id) {
            return Ok(());
        }
        self.ensure_donor_role(ev.user_id, &ev.role_ids).await
    }

    /// Catch-all for role changes missed while offline.
    pub async fn sweep(&self) -> Result<()> {
        let cfg = &self.inner.cfg;
        let Some(guild) = cfg.guild else {
            return Ok(());
        };
        if cfg.donor_role.is_none() {
            return Ok(());
        }
        for member in self.inner.guild.members(guild).await? {
            self.ensure_donor_role(member.user_id, &member.role_ids).await?;
        }
        Ok(())
    }

    async fn ensure_donor_role(&self, user: UserId, roles: &[RoleId]) -> Result<()> {
        let cfg = &self.inner.cfg;
        let (Some(guild), Some(donor_role)) = (cfg.guild, cfg.donor_role) else {
            return Ok(());
        };
        if roles.contains(&donor_role) {
            return Ok(());
        }

        let is_patron = cfg
            .patron_role
            .map(|role| roles.contains(&role))
            .unwrap_or(false);
        if is_patron || self.inner.store.is_donor(user).await? {
            self.inner.guild.add_role(guild, user, donor_role).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::{ChannelId, GuildId};
    use crate::ports::GuildMember;
    use crate::store::JsonStore;

    const DONOR: RoleId = RoleId(201);
    const PATRON: RoleId = RoleId(202);

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum RoleChange {
        Add(UserId, RoleId),
        Remove(UserId, RoleId),
    }

    #[derive(Default)]
    struct FakeGuild {
        members: Vec<GuildMember>,
        changes: Mutex<Vec<RoleChange>>,
    }

    #[async_trait]
    impl GuildPort for FakeGuild {
        async fn rename_channel(&self, _: ChannelId, _: &str) -> Result<()> {
            Ok(())
        }

        async fn member_count(&self, _: GuildId) -> Result<Option<u64>> {
            Ok(None)
        }

        async fn members(&self, _: GuildId) -> Result<Vec<GuildMember>> {
            Ok(self.members.clone())
        }

        async fn add_role(&self, _: GuildId, user: UserId, role: RoleId) -> Result<()> {
            self.changes.lock().unwrap().push(RoleChange::Add(user, role));
            Ok(())
        }

        async fn remove_role(&self, _: GuildId, user: UserId, role: RoleId) -> Result<()> {
            self.changes
                .lock()
                .unwrap()
                .push(RoleChange::Remove(user, role));
            Ok(())
        }
    }

    fn service(guild: Arc<FakeGuild>) -> (DonorService, Arc<JsonStore>) {
        let store = Arc::new(JsonStore::in_memory());
        let service = DonorService::new(Arc::new(Config::for_tests()), store.clone(), guild);
        (service, store)
    }

    fn member(user: u64, roles: &[RoleId]) -> GuildMember {
        GuildMember {
            user_id: UserId(user),
            role_ids: roles.to_vec(),
        }
    }

    #[tokio::test]
    async fn set_donor_status_flags_the_store_and_syncs_the_role() {
        let guild = Arc::new(FakeGuild::default());
        let (service, store) = service(guild.clone());

        let reply = service.set_donor_status(UserId(7), true).await.unwrap();
        assert!(reply.ephemeral);
        assert_eq!(reply.content.unwrap(), "<@7> marked as a donor.");
        assert!(store.is_donor(UserId(7)).await.unwrap());
        assert_eq!(
            guild.changes.lock().unwrap().clone(),
            vec![RoleChange::Add(UserId(7), DONOR)]
        );

        let reply = service.set_donor_status(UserId(7), false).await.unwrap();
        assert_eq!(reply.content.unwrap(), "<@7> unmarked as a donor.");
        assert!(!store.is_donor(UserId(7)).await.unwrap());
        assert_eq!(
            guild.changes.lock().unwrap().last().unwrap().clone(),
            RoleChange::Remove(UserId(7), DONOR)
        );
    }

    #[tokio::test]
    async fn member_update_grants_the_role_to_patrons() {
        let guild = Arc::new(FakeGuild::default());
        let (service, _) = service(guild.clone());

        service
            .on_member_updated(&MemberUpdated {
                guild_id: GuildId(1),
                user_id: UserId(7),
                role_ids: vec![PATRON],
            })
            .await
            .unwrap();

        assert_eq!(
            guild.changes.lock().unwrap().clone(),
            vec![RoleChange::Add(UserId(7), DONOR)]
        );
    }

    #[tokio::test]
    async fn member_update_skips_foreign_guilds_and_existing_donors() {
        let guild = Arc::new(FakeGuild::default());
        let (service, _) = service(guild.clone());

        service
            .on_member_updated(&MemberUpdated {
                guild_id: GuildId(999),
                user_id: UserId(7),
                role_ids: vec![PATRON],
            })
            .await
            .unwrap();
        service
            .on_member_updated(&MemberUpdated {
                guild_id: GuildId(1),
                user_id: UserId(8),
                role_ids: vec![PATRON, DONOR],
            })
            .await
            .unwrap();

        assert!(guild.changes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sweep_reconciles_flagged_and_patron_members() {
        let guild = Arc::new(FakeGuild {
            members: vec![
                member(1, &[PATRON]),
                member(2, &[]),
                member(3, &[DONOR]),
                member(4, &[]),
            ],
            ..FakeGuild::default()
        });
        let (service, store) = service(guild.clone());
        store.set_donor(UserId(2), true).await.unwrap();

        service.sweep().await.unwrap();

        assert_eq!(
            guild.changes.lock().unwrap().clone(),
            vec![
                RoleChange::Add(UserId(1), DONOR),
                RoleChange::Add(UserId(2), DONOR),
            ]
        );
    }
}
