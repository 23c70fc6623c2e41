//! Thing to profile wiring and publish configuration lookups.

use std::collections::HashSet;
use std::sync::Arc;

use things_core::cache::{CacheLayer, ThingCache};
use things_core::error::{ThingsError, ThingsResult};
use things_core::models::connection::{Connection, PubConfInfo};
use things_core::models::thing::ThingKey;
use things_core::repository::{
    ConnectionRepository, ProfileRepository, ResourceStore, ThingRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::lookup::{Lookup, logged};

pub struct ConnectionManager<S, L> {
    store: Arc<S>,
    cache: Arc<L>,
    lookup: Lookup<S, L>,
}

fn distinct(thing_ids: &[Uuid]) -> ThingsResult<()> {
    if thing_ids.is_empty() {
        return Err(ThingsError::malformed("no things given"));
    }
    let mut seen = HashSet::with_capacity(thing_ids.len());
    if !thing_ids.iter().all(|id| seen.insert(*id)) {
        return Err(ThingsError::malformed("thing listed more than once"));
    }
    Ok(())
}

impl<S: ResourceStore, L: CacheLayer> ConnectionManager<S, L> {
    pub fn new(store: Arc<S>, cache: Arc<L>, lookup: Lookup<S, L>) -> Self {
        Self {
            store,
            cache,
            lookup,
        }
    }

    /// Connection of the thing holding `key`.
    ///
    /// Unknown keys fail authentication; an unconnected thing is `NotFound`.
    pub async fn retrieve_by_thing_key(&self, key: &ThingKey) -> ThingsResult<Connection> {
        let thing_id = self.lookup.thing_id_by_key(key).await.map_err(|e| {
            if e.is_not_found() {
                ThingsError::unauthenticated("unknown thing key")
            } else {
                e
            }
        })?;
        let profile_id = self.lookup.thing_profile(thing_id).await?;
        Ok(Connection {
            thing_id,
            profile_id,
        })
    }

    pub async fn pub_conf_by_key(&self, key: &ThingKey) -> ThingsResult<PubConfInfo> {
        let conn = self.retrieve_by_thing_key(key).await?;
        let profile = self.store.profiles().get_by_id(conn.profile_id).await?;
        Ok(PubConfInfo {
            publisher_id: conn.thing_id,
            profile_id: profile.id,
            profile_config: profile.config,
        })
    }

    /// Connect things of `group_id` to a profile of the same group.
    ///
    /// Every thing is checked before any is connected: things from another
    /// group are denied, already connected things conflict. Concurrent
    /// connects for one thing are settled by the store.
    pub async fn connect(
        &self,
        group_id: Uuid,
        profile_id: Uuid,
        thing_ids: &[Uuid],
    ) -> ThingsResult<()> {
        distinct(thing_ids)?;

        for &thing_id in thing_ids {
            let thing = self.store.things().get_by_id(thing_id).await?;
            if thing.group_id != group_id {
                return Err(ThingsError::denied(format!(
                    "thing {thing_id} and profile {profile_id} belong to different groups"
                )));
            }
            match self.store.connections().retrieve_by_thing(thing_id).await {
                Ok(existing) => {
                    return Err(ThingsError::conflict(
                        "connection",
                        format!(
                            "thing {thing_id} is already connected to profile {}",
                            existing.profile_id
                        ),
                    ));
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        for &thing_id in thing_ids {
            self.store
                .connections()
                .connect(group_id, profile_id, thing_id)
                .await?;
            logged(
                self.cache.things().save_profile(thing_id, profile_id).await,
                "pr_by_th",
            );
        }

        info!(%profile_id, things = thing_ids.len(), "Connected things");
        Ok(())
    }

    /// Disconnect things from a profile. Every thing must currently be
    /// connected to that profile, otherwise nothing is disconnected.
    pub async fn disconnect(&self, profile_id: Uuid, thing_ids: &[Uuid]) -> ThingsResult<()> {
        distinct(thing_ids)?;

        for &thing_id in thing_ids {
            let conn = self.store.connections().retrieve_by_thing(thing_id).await?;
            if conn.profile_id != profile_id {
                return Err(ThingsError::not_found(
                    "connection",
                    format!("{thing_id}->{profile_id}"),
                ));
            }
        }

        for &thing_id in thing_ids {
            self.store
                .connections()
                .disconnect(profile_id, thing_id)
                .await?;
            logged(self.cache.things().remove_profile(thing_id).await, "pr_by_th");
        }

        info!(%profile_id, things = thing_ids.len(), "Disconnected things");
        Ok(())
    }
}
