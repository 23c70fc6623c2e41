//! Authorization decisions for users and things.
//!
//! A user's access to a thing or profile is decided on the group that owns
//! it: the user's role in that group must rank at least the action's
//! required role, or the user must own the group's organization.

use std::sync::Arc;

use things_core::cache::CacheLayer;
use things_core::error::{ThingsError, ThingsResult};
use things_core::models::organization::Organization;
use things_core::models::role::Action;
use things_core::models::thing::ThingKey;
use things_core::repository::{GroupRepository, OrganizationRepository, ResourceStore};
use tracing::debug;
use uuid::Uuid;

use crate::lookup::Lookup;

pub struct AuthorizationEngine<S, L> {
    store: Arc<S>,
    lookup: Lookup<S, L>,
}

impl<S: ResourceStore, L: CacheLayer> AuthorizationEngine<S, L> {
    pub fn new(store: Arc<S>, lookup: Lookup<S, L>) -> Self {
        Self { store, lookup }
    }

    /// Resolve a thing key to its thing. Unknown keys fail authentication.
    pub async fn identify(&self, key: &ThingKey) -> ThingsResult<Uuid> {
        self.lookup.thing_id_by_key(key).await.map_err(|e| {
            if e.is_not_found() {
                ThingsError::unauthenticated("unknown thing key")
            } else {
                e
            }
        })
    }

    pub async fn authorize_group(
        &self,
        user_id: Uuid,
        group_id: Uuid,
        action: Action,
    ) -> ThingsResult<()> {
        let fresh = action.is_destructive();

        let role = self.lookup.role(group_id, user_id, fresh).await?;
        if role.is_some_and(|r| r.permits(action)) {
            return Ok(());
        }
        // A cached role can lag behind a promotion, so denials are decided
        // on the store.
        let role = if fresh {
            role
        } else {
            self.lookup.role(group_id, user_id, true).await?
        };
        if role.is_some_and(|r| r.permits(action)) {
            return Ok(());
        }

        let org_id = self.lookup.group_org(group_id, fresh).await?;
        let org = self.store.organizations().get_by_id(org_id).await?;
        if org.owner_id == user_id {
            return Ok(());
        }

        debug!(
            %user_id,
            %group_id,
            ?action,
            role = ?role,
            "Group access denied"
        );
        Err(ThingsError::denied(format!(
            "{:?} on group {group_id} requires the {} role",
            action,
            action.required_role()
        )))
    }

    /// Authorize `action` on a thing; returns the owning group.
    pub async fn authorize_thing(
        &self,
        user_id: Uuid,
        thing_id: Uuid,
        action: Action,
    ) -> ThingsResult<Uuid> {
        let group_id = self
            .lookup
            .thing_group(thing_id, action.is_destructive())
            .await?;
        self.authorize_group(user_id, group_id, action).await?;
        Ok(group_id)
    }

    /// Authorize `action` on a profile; returns the owning group.
    pub async fn authorize_profile(
        &self,
        user_id: Uuid,
        profile_id: Uuid,
        action: Action,
    ) -> ThingsResult<Uuid> {
        let group_id = self
            .lookup
            .profile_group(profile_id, action.is_destructive())
            .await?;
        self.authorize_group(user_id, group_id, action).await?;
        Ok(group_id)
    }

    /// The organization, provided `user_id` owns it.
    pub async fn authorize_org_owner(
        &self,
        user_id: Uuid,
        org_id: Uuid,
    ) -> ThingsResult<Organization> {
        let org = self.store.organizations().get_by_id(org_id).await?;
        if org.owner_id != user_id {
            debug!(%user_id, %org_id, "Organization access denied");
            return Err(ThingsError::denied(format!(
                "only the owner may manage organization {org_id}"
            )));
        }
        Ok(org)
    }

    /// A thing may act in its own group only. Returns the thing id.
    pub async fn thing_can_access_group(
        &self,
        key: &ThingKey,
        group_id: Uuid,
    ) -> ThingsResult<Uuid> {
        let thing_id = self.identify(key).await?;
        let thing_group = self.lookup.thing_group(thing_id, false).await?;
        if thing_group == group_id {
            return Ok(thing_id);
        }

        // A missing group is NotFound, an existing foreign one is a denial.
        self.store.groups().get_by_id(group_id).await?;
        debug!(%thing_id, %group_id, "Thing access to foreign group denied");
        Err(ThingsError::denied(format!(
            "thing {thing_id} does not belong to group {group_id}"
        )))
    }
}
