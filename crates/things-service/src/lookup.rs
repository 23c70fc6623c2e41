//! Read-through resolution of keys, ancestry and roles.
//!
//! Every lookup consults the cache first unless `fresh` is set, falls back
//! to the store on a miss, and writes the store's answer back. A failing
//! cache degrades to a miss: the error is logged and the store decides.

use std::sync::Arc;

use things_core::cache::{CacheLayer, GroupCache, ProfileCache, ThingCache};
use things_core::error::ThingsResult;
use things_core::models::role::GroupRole;
use things_core::models::thing::ThingKey;
use things_core::repository::{
    ConnectionRepository, GroupMembershipRepository, GroupRepository, ProfileRepository,
    ResourceStore, ThingRepository,
};
use tracing::warn;
use uuid::Uuid;

/// Unwrap a cache read, logging failures as misses.
pub(crate) fn cached<T>(result: ThingsResult<Option<T>>, entry: &'static str) -> Option<T> {
    match result {
        Ok(hit) => hit,
        Err(e) => {
            warn!(entry, error = %e, "Cache read failed, falling back to store");
            None
        }
    }
}

/// Log a failed cache write or invalidation. Never fails the caller.
pub(crate) fn logged(result: ThingsResult<()>, entry: &'static str) {
    if let Err(e) = result {
        warn!(entry, error = %e, "Cache update failed");
    }
}

pub struct Lookup<S, L> {
    store: Arc<S>,
    cache: Arc<L>,
}

impl<S, L> Clone for Lookup<S, L> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<S: ResourceStore, L: CacheLayer> Lookup<S, L> {
    pub fn new(store: Arc<S>, cache: Arc<L>) -> Self {
        Self { store, cache }
    }

    /// Thing identified by `key`. Fails with `NotFound` for unknown keys.
    pub async fn thing_id_by_key(&self, key: &ThingKey) -> ThingsResult<Uuid> {
        if let Some(id) = cached(self.cache.things().id(key).await, "id_by_key") {
            return Ok(id);
        }

        let thing = self.store.things().get_by_key(key).await?;
        logged(self.cache.things().save(key, thing.id).await, "id_by_key");
        // Keeps the group's reverse index covering every cached key.
        logged(
            self.cache.things().save_group(thing.id, thing.group_id).await,
            "gr_by_th",
        );
        Ok(thing.id)
    }

    pub async fn thing_group(&self, thing_id: Uuid, fresh: bool) -> ThingsResult<Uuid> {
        if !fresh {
            if let Some(id) = cached(self.cache.things().view_group(thing_id).await, "gr_by_th") {
                return Ok(id);
            }
        }

        match self.store.things().get_by_id(thing_id).await {
            Ok(thing) => {
                logged(
                    self.cache.things().save_group(thing_id, thing.group_id).await,
                    "gr_by_th",
                );
                Ok(thing.group_id)
            }
            Err(e) if e.is_not_found() => {
                logged(self.cache.things().remove_group(thing_id).await, "gr_by_th");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn profile_group(&self, profile_id: Uuid, fresh: bool) -> ThingsResult<Uuid> {
        if !fresh {
            if let Some(id) = cached(self.cache.profiles().view_group(profile_id).await, "gr_by_pr")
            {
                return Ok(id);
            }
        }

        match self.store.profiles().get_by_id(profile_id).await {
            Ok(profile) => {
                logged(
                    self.cache.profiles().save_group(profile_id, profile.group_id).await,
                    "gr_by_pr",
                );
                Ok(profile.group_id)
            }
            Err(e) if e.is_not_found() => {
                logged(self.cache.profiles().remove_group(profile_id).await, "gr_by_pr");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn group_org(&self, group_id: Uuid, fresh: bool) -> ThingsResult<Uuid> {
        if !fresh {
            if let Some(id) = cached(self.cache.groups().view_org(group_id).await, "org_by_gr") {
                return Ok(id);
            }
        }

        match self.store.groups().get_by_id(group_id).await {
            Ok(group) => {
                logged(
                    self.cache.groups().save_org(group_id, group.org_id).await,
                    "org_by_gr",
                );
                Ok(group.org_id)
            }
            Err(e) if e.is_not_found() => {
                logged(self.cache.groups().remove_org(group_id).await, "org_by_gr");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// The member's role in the group, or `None` when not a member.
    pub async fn role(
        &self,
        group_id: Uuid,
        member_id: Uuid,
        fresh: bool,
    ) -> ThingsResult<Option<GroupRole>> {
        if !fresh {
            if let Some(role) = cached(
                self.cache.groups().view_role(group_id, member_id).await,
                "grs_by_mb",
            ) {
                return Ok(Some(role));
            }
        }

        match self.store.memberships().get(group_id, member_id).await {
            Ok(membership) => {
                logged(
                    self.cache
                        .groups()
                        .save_role(group_id, member_id, membership.role)
                        .await,
                    "grs_by_mb",
                );
                Ok(Some(membership.role))
            }
            Err(e) if e.is_not_found() => {
                logged(
                    self.cache.groups().remove_role(group_id, member_id).await,
                    "grs_by_mb",
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Profile the thing is connected to. `NotFound` when unconnected.
    pub async fn thing_profile(&self, thing_id: Uuid) -> ThingsResult<Uuid> {
        if let Some(id) = cached(self.cache.things().view_profile(thing_id).await, "pr_by_th") {
            return Ok(id);
        }

        let conn = self.store.connections().retrieve_by_thing(thing_id).await?;
        logged(
            self.cache.things().save_profile(thing_id, conn.profile_id).await,
            "pr_by_th",
        );
        Ok(conn.profile_id)
    }
}
