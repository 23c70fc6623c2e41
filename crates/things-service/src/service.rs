//! The things service surface.
//!
//! [`Service`] is what transports call. [`ThingsService`] implements it on
//! top of a [`ResourceStore`], a [`CacheLayer`] and an [`IdentityProvider`],
//! delegating decisions to the authorization engine, the connection
//! manager and the invite coordinator.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use things_core::cache::{CacheLayer, GroupCache, ProfileCache, ThingCache};
use things_core::error::{ThingsError, ThingsResult};
use things_core::identity::IdentityProvider;
use things_core::models::connection::{Connection, PubConfInfo};
use things_core::models::group::{CreateGroup, Group, UpdateGroup};
use things_core::models::invite::{
    ActivationSummary, DormantInviteRequest, GroupInvite, GroupInviteRequest,
};
use things_core::models::membership::{GroupMembership, MemberRole};
use things_core::models::organization::{CreateOrganization, Organization, OrganizationRequest};
use things_core::models::profile::{CreateProfile, Profile};
use things_core::models::role::{Action, GroupRole};
use things_core::models::thing::{CreateThing, Thing, ThingKey};
use things_core::repository::{
    ConnectionRepository, GroupInviteRepository, GroupMembershipRepository, GroupRepository,
    OrganizationRepository, PaginatedResult, Pagination, ProfileRepository, ResourceStore,
    ThingRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::authz::AuthorizationEngine;
use crate::config::ServiceConfig;
use crate::connections::ConnectionManager;
use crate::invites::InviteCoordinator;
use crate::lookup::{Lookup, logged};

/// Operations exposed to transports.
///
/// User-facing operations take the caller's bearer token; thing-facing ones
/// take the key the thing presented. Every operation is a future: dropping
/// it cancels in-flight store and cache I/O, and
/// [`with_deadline`](crate::with_deadline) bounds it in time.
pub trait Service: Send + Sync + 'static {
    // -- identity and authorization ------------------------------------

    /// Thing holding `key`. Unknown keys fail authentication.
    fn identify(&self, key: &ThingKey) -> impl Future<Output = ThingsResult<Uuid>> + Send;
    fn can_user_access_thing(
        &self,
        token: &str,
        thing_id: Uuid,
        action: Action,
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn can_user_access_profile(
        &self,
        token: &str,
        profile_id: Uuid,
        action: Action,
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn can_user_access_group(
        &self,
        token: &str,
        group_id: Uuid,
        action: Action,
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn can_thing_access_group(
        &self,
        key: &ThingKey,
        group_id: Uuid,
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn get_pub_conf_by_key(
        &self,
        key: &ThingKey,
    ) -> impl Future<Output = ThingsResult<PubConfInfo>> + Send;
    fn get_group_id_by_thing(
        &self,
        thing_id: Uuid,
    ) -> impl Future<Output = ThingsResult<Uuid>> + Send;
    fn get_group_id_by_profile(
        &self,
        profile_id: Uuid,
    ) -> impl Future<Output = ThingsResult<Uuid>> + Send;

    // -- connections -----------------------------------------------------

    fn retrieve_conn_by_thing_key(
        &self,
        key: &ThingKey,
    ) -> impl Future<Output = ThingsResult<Connection>> + Send;
    fn connect(
        &self,
        token: &str,
        profile_id: Uuid,
        thing_ids: &[Uuid],
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn disconnect(
        &self,
        token: &str,
        profile_id: Uuid,
        thing_ids: &[Uuid],
    ) -> impl Future<Output = ThingsResult<()>> + Send;

    // -- organizations and groups -----------------------------------------

    fn create_organization(
        &self,
        token: &str,
        request: OrganizationRequest,
    ) -> impl Future<Output = ThingsResult<Organization>> + Send;
    fn remove_organization(
        &self,
        token: &str,
        org_id: Uuid,
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn create_group(
        &self,
        token: &str,
        input: CreateGroup,
    ) -> impl Future<Output = ThingsResult<Group>> + Send;
    fn view_group(
        &self,
        token: &str,
        group_id: Uuid,
    ) -> impl Future<Output = ThingsResult<Group>> + Send;
    fn update_group(
        &self,
        token: &str,
        group_id: Uuid,
        input: UpdateGroup,
    ) -> impl Future<Output = ThingsResult<Group>> + Send;
    fn remove_group(
        &self,
        token: &str,
        group_id: Uuid,
    ) -> impl Future<Output = ThingsResult<()>> + Send;

    // -- profiles and things ------------------------------------------------

    fn create_profiles(
        &self,
        token: &str,
        profiles: Vec<CreateProfile>,
    ) -> impl Future<Output = ThingsResult<Vec<Profile>>> + Send;
    fn view_profile(
        &self,
        token: &str,
        profile_id: Uuid,
    ) -> impl Future<Output = ThingsResult<Profile>> + Send;
    fn remove_profile(
        &self,
        token: &str,
        profile_id: Uuid,
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn create_things(
        &self,
        token: &str,
        things: Vec<CreateThing>,
    ) -> impl Future<Output = ThingsResult<Vec<Thing>>> + Send;
    fn view_thing(
        &self,
        token: &str,
        thing_id: Uuid,
    ) -> impl Future<Output = ThingsResult<Thing>> + Send;
    fn remove_thing(
        &self,
        token: &str,
        thing_id: Uuid,
    ) -> impl Future<Output = ThingsResult<()>> + Send;

    // -- memberships -------------------------------------------------------

    fn create_group_memberships(
        &self,
        token: &str,
        group_id: Uuid,
        members: Vec<MemberRole>,
    ) -> impl Future<Output = ThingsResult<Vec<GroupMembership>>> + Send;
    fn update_group_membership(
        &self,
        token: &str,
        group_id: Uuid,
        member: MemberRole,
    ) -> impl Future<Output = ThingsResult<GroupMembership>> + Send;
    fn remove_group_memberships(
        &self,
        token: &str,
        group_id: Uuid,
        member_ids: &[Uuid],
    ) -> impl Future<Output = ThingsResult<()>> + Send;
    fn list_group_memberships(
        &self,
        token: &str,
        group_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = ThingsResult<PaginatedResult<GroupMembership>>> + Send;

    // -- invites -------------------------------------------------------------

    fn create_group_invite(
        &self,
        token: &str,
        request: GroupInviteRequest,
    ) -> impl Future<Output = ThingsResult<GroupInvite>> + Send;
    fn view_group_invite(
        &self,
        token: &str,
        invite_id: Uuid,
    ) -> impl Future<Output = ThingsResult<GroupInvite>> + Send;
    fn respond_group_invite(
        &self,
        token: &str,
        invite_id: Uuid,
        accept: bool,
    ) -> impl Future<Output = ThingsResult<GroupInvite>> + Send;
    fn revoke_group_invite(
        &self,
        token: &str,
        invite_id: Uuid,
    ) -> impl Future<Output = ThingsResult<GroupInvite>> + Send;
    fn list_group_invites_by_user(
        &self,
        token: &str,
    ) -> impl Future<Output = ThingsResult<Vec<GroupInvite>>> + Send;
    /// Issue the group invites that travel with an organization invite.
    fn create_dormant_group_invites(
        &self,
        token: &str,
        request: DormantInviteRequest,
    ) -> impl Future<Output = ThingsResult<Vec<GroupInvite>>> + Send;
    /// Called once the organization invite is accepted by `user_id`.
    /// Invites are honoured until the earlier of their own expiry and
    /// `expiration_time`.
    fn activate_group_invites(
        &self,
        org_invite_id: Uuid,
        user_id: Uuid,
        expiration_time: DateTime<Utc>,
    ) -> impl Future<Output = ThingsResult<ActivationSummary>> + Send;
}

fn require_name(name: &str, entity: &str) -> ThingsResult<()> {
    if name.trim().is_empty() {
        return Err(ThingsError::malformed(format!("{entity} name is empty")));
    }
    Ok(())
}

fn distinct_groups(group_ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    group_ids.filter(|id| seen.insert(*id)).collect()
}

pub struct ThingsService<S, L, I> {
    store: Arc<S>,
    cache: Arc<L>,
    identity: I,
    lookup: Lookup<S, L>,
    authz: AuthorizationEngine<S, L>,
    connections: ConnectionManager<S, L>,
    invites: InviteCoordinator<S, L>,
}

impl<S, L, I> ThingsService<S, L, I>
where
    S: ResourceStore,
    L: CacheLayer,
    I: IdentityProvider,
{
    pub fn new(store: Arc<S>, cache: Arc<L>, identity: I, config: ServiceConfig) -> Self {
        let lookup = Lookup::new(Arc::clone(&store), Arc::clone(&cache));
        Self {
            authz: AuthorizationEngine::new(Arc::clone(&store), lookup.clone()),
            connections: ConnectionManager::new(
                Arc::clone(&store),
                Arc::clone(&cache),
                lookup.clone(),
            ),
            invites: InviteCoordinator::new(Arc::clone(&store), Arc::clone(&cache), config),
            lookup,
            store,
            cache,
            identity,
        }
    }

    /// Delete a group from the store, then drop everything cached under it.
    async fn purge_group(&self, group_id: Uuid) -> ThingsResult<()> {
        self.store.groups().delete(group_id).await?;
        logged(
            self.cache.groups().remove_group_entities(group_id).await,
            "group_entities",
        );
        info!(%group_id, "Group removed");
        Ok(())
    }
}

impl<S, L, I> Service for ThingsService<S, L, I>
where
    S: ResourceStore,
    L: CacheLayer,
    I: IdentityProvider,
{
    async fn identify(&self, key: &ThingKey) -> ThingsResult<Uuid> {
        self.authz.identify(key).await
    }

    async fn can_user_access_thing(
        &self,
        token: &str,
        thing_id: Uuid,
        action: Action,
    ) -> ThingsResult<()> {
        let user_id = self.identity.identify(token).await?;
        self.authz.authorize_thing(user_id, thing_id, action).await?;
        Ok(())
    }

    async fn can_user_access_profile(
        &self,
        token: &str,
        profile_id: Uuid,
        action: Action,
    ) -> ThingsResult<()> {
        let user_id = self.identity.identify(token).await?;
        self.authz
            .authorize_profile(user_id, profile_id, action)
            .await?;
        Ok(())
    }

    async fn can_user_access_group(
        &self,
        token: &str,
        group_id: Uuid,
        action: Action,
    ) -> ThingsResult<()> {
        let user_id = self.identity.identify(token).await?;
        self.authz.authorize_group(user_id, group_id, action).await
    }

    async fn can_thing_access_group(&self, key: &ThingKey, group_id: Uuid) -> ThingsResult<()> {
        self.authz.thing_can_access_group(key, group_id).await?;
        Ok(())
    }

    async fn get_pub_conf_by_key(&self, key: &ThingKey) -> ThingsResult<PubConfInfo> {
        self.connections.pub_conf_by_key(key).await
    }

    async fn get_group_id_by_thing(&self, thing_id: Uuid) -> ThingsResult<Uuid> {
        self.lookup.thing_group(thing_id, false).await
    }

    async fn get_group_id_by_profile(&self, profile_id: Uuid) -> ThingsResult<Uuid> {
        self.lookup.profile_group(profile_id, false).await
    }

    async fn retrieve_conn_by_thing_key(&self, key: &ThingKey) -> ThingsResult<Connection> {
        self.connections.retrieve_by_thing_key(key).await
    }

    async fn connect(&self, token: &str, profile_id: Uuid, thing_ids: &[Uuid]) -> ThingsResult<()> {
        let user_id = self.identity.identify(token).await?;
        let group_id = self
            .authz
            .authorize_profile(user_id, profile_id, Action::Write)
            .await?;
        self.connections
            .connect(group_id, profile_id, thing_ids)
            .await
    }

    async fn disconnect(
        &self,
        token: &str,
        profile_id: Uuid,
        thing_ids: &[Uuid],
    ) -> ThingsResult<()> {
        let user_id = self.identity.identify(token).await?;
        self.authz
            .authorize_profile(user_id, profile_id, Action::Write)
            .await?;
        self.connections.disconnect(profile_id, thing_ids).await
    }

    async fn create_organization(
        &self,
        token: &str,
        request: OrganizationRequest,
    ) -> ThingsResult<Organization> {
        let user_id = self.identity.identify(token).await?;
        require_name(&request.name, "organization")?;

        let org = self
            .store
            .organizations()
            .create(CreateOrganization {
                owner_id: user_id,
                name: request.name,
                description: request.description,
                metadata: request.metadata,
            })
            .await?;
        info!(org_id = %org.id, owner_id = %user_id, "Organization created");
        Ok(org)
    }

    async fn remove_organization(&self, token: &str, org_id: Uuid) -> ThingsResult<()> {
        let user_id = self.identity.identify(token).await?;
        self.authz.authorize_org_owner(user_id, org_id).await?;

        // Each pass deletes what it listed, so the first page is re-read
        // until the organization has no groups left.
        let page = Pagination {
            offset: 0,
            limit: 100,
        };
        loop {
            let groups = self
                .store
                .groups()
                .list_by_org(org_id, page.clone())
                .await?;
            if groups.items.is_empty() {
                break;
            }
            for group in groups.items {
                self.purge_group(group.id).await?;
            }
        }

        self.store.organizations().delete(org_id).await?;
        info!(%org_id, "Organization removed");
        Ok(())
    }

    async fn create_group(&self, token: &str, input: CreateGroup) -> ThingsResult<Group> {
        let user_id = self.identity.identify(token).await?;
        require_name(&input.name, "group")?;
        self.authz.authorize_org_owner(user_id, input.org_id).await?;

        let group = self.store.groups().create(input).await?;
        self.store
            .memberships()
            .save(GroupMembership {
                group_id: group.id,
                member_id: user_id,
                role: GroupRole::Owner,
            })
            .await?;

        logged(
            self.cache.groups().save_org(group.id, group.org_id).await,
            "org_by_gr",
        );
        logged(
            self.cache
                .groups()
                .save_role(group.id, user_id, GroupRole::Owner)
                .await,
            "grs_by_mb",
        );
        info!(group_id = %group.id, org_id = %group.org_id, "Group created");
        Ok(group)
    }

    async fn view_group(&self, token: &str, group_id: Uuid) -> ThingsResult<Group> {
        let user_id = self.identity.identify(token).await?;
        self.authz
            .authorize_group(user_id, group_id, Action::Read)
            .await?;
        self.store.groups().get_by_id(group_id).await
    }

    async fn update_group(
        &self,
        token: &str,
        group_id: Uuid,
        input: UpdateGroup,
    ) -> ThingsResult<Group> {
        let user_id = self.identity.identify(token).await?;
        if let Some(name) = &input.name {
            require_name(name, "group")?;
        }
        self.authz
            .authorize_group(user_id, group_id, Action::Write)
            .await?;
        self.store.groups().update(group_id, input).await
    }

    async fn remove_group(&self, token: &str, group_id: Uuid) -> ThingsResult<()> {
        let user_id = self.identity.identify(token).await?;
        self.authz
            .authorize_group(user_id, group_id, Action::Delete)
            .await?;
        self.purge_group(group_id).await
    }

    async fn create_profiles(
        &self,
        token: &str,
        profiles: Vec<CreateProfile>,
    ) -> ThingsResult<Vec<Profile>> {
        let user_id = self.identity.identify(token).await?;
        if profiles.is_empty() {
            return Err(ThingsError::malformed("no profiles given"));
        }
        for input in &profiles {
            require_name(&input.name, "profile")?;
        }
        for group_id in distinct_groups(profiles.iter().map(|p| p.group_id)) {
            self.authz
                .authorize_group(user_id, group_id, Action::Write)
                .await?;
        }

        let mut created = Vec::with_capacity(profiles.len());
        for input in profiles {
            let profile = self.store.profiles().create(input).await?;
            logged(
                self.cache
                    .profiles()
                    .save_group(profile.id, profile.group_id)
                    .await,
                "gr_by_pr",
            );
            created.push(profile);
        }
        info!(count = created.len(), "Profiles created");
        Ok(created)
    }

    async fn view_profile(&self, token: &str, profile_id: Uuid) -> ThingsResult<Profile> {
        let user_id = self.identity.identify(token).await?;
        self.authz
            .authorize_profile(user_id, profile_id, Action::Read)
            .await?;
        self.store.profiles().get_by_id(profile_id).await
    }

    async fn remove_profile(&self, token: &str, profile_id: Uuid) -> ThingsResult<()> {
        let user_id = self.identity.identify(token).await?;
        self.authz
            .authorize_profile(user_id, profile_id, Action::Delete)
            .await?;

        let connections = self.store.profiles().delete(profile_id).await?;

        logged(
            self.cache.profiles().remove_group(profile_id).await,
            "gr_by_pr",
        );
        for conn in &connections {
            logged(
                self.cache.things().remove_profile(conn.thing_id).await,
                "pr_by_th",
            );
        }
        info!(%profile_id, connections = connections.len(), "Profile removed");
        Ok(())
    }

    async fn create_things(&self, token: &str, things: Vec<CreateThing>) -> ThingsResult<Vec<Thing>> {
        let user_id = self.identity.identify(token).await?;
        if things.is_empty() {
            return Err(ThingsError::malformed("no things given"));
        }
        for input in &things {
            require_name(&input.name, "thing")?;
            let blank_key = input.key.as_deref().is_some_and(|k| k.trim().is_empty())
                || input.external_keys.iter().any(|k| k.trim().is_empty());
            if blank_key {
                return Err(ThingsError::malformed("thing keys must not be empty"));
            }
        }
        for group_id in distinct_groups(things.iter().map(|t| t.group_id)) {
            self.authz
                .authorize_group(user_id, group_id, Action::Write)
                .await?;
        }

        let mut created = Vec::with_capacity(things.len());
        for input in things {
            let thing = self.store.things().create(input).await?;
            for key in thing.keys() {
                logged(self.cache.things().save(&key, thing.id).await, "id_by_key");
            }
            logged(
                self.cache
                    .things()
                    .save_group(thing.id, thing.group_id)
                    .await,
                "gr_by_th",
            );
            created.push(thing);
        }
        info!(count = created.len(), "Things created");
        Ok(created)
    }

    async fn view_thing(&self, token: &str, thing_id: Uuid) -> ThingsResult<Thing> {
        let user_id = self.identity.identify(token).await?;
        self.authz
            .authorize_thing(user_id, thing_id, Action::Read)
            .await?;
        self.store.things().get_by_id(thing_id).await
    }

    async fn remove_thing(&self, token: &str, thing_id: Uuid) -> ThingsResult<()> {
        let user_id = self.identity.identify(token).await?;
        self.authz
            .authorize_thing(user_id, thing_id, Action::Delete)
            .await?;

        self.store.things().delete(thing_id).await?;
        logged(self.cache.things().remove_thing(thing_id).await, "keys_by_id");
        logged(self.cache.things().remove_group(thing_id).await, "gr_by_th");
        logged(self.cache.things().remove_profile(thing_id).await, "pr_by_th");
        info!(%thing_id, "Thing removed");
        Ok(())
    }

    async fn create_group_memberships(
        &self,
        token: &str,
        group_id: Uuid,
        members: Vec<MemberRole>,
    ) -> ThingsResult<Vec<GroupMembership>> {
        let user_id = self.identity.identify(token).await?;
        if members.is_empty() {
            return Err(ThingsError::malformed("no members given"));
        }
        let mut seen = HashSet::with_capacity(members.len());
        if !members.iter().all(|m| seen.insert(m.member_id)) {
            return Err(ThingsError::malformed("member listed more than once"));
        }
        self.authz
            .authorize_group(user_id, group_id, Action::ManageMembers)
            .await?;

        let mut saved = Vec::with_capacity(members.len());
        for member in members {
            let membership = self
                .store
                .memberships()
                .save(GroupMembership {
                    group_id,
                    member_id: member.member_id,
                    role: member.role,
                })
                .await?;
            logged(
                self.cache
                    .groups()
                    .save_role(group_id, member.member_id, member.role)
                    .await,
                "grs_by_mb",
            );
            saved.push(membership);
        }
        info!(%group_id, count = saved.len(), "Group memberships created");
        Ok(saved)
    }

    async fn update_group_membership(
        &self,
        token: &str,
        group_id: Uuid,
        member: MemberRole,
    ) -> ThingsResult<GroupMembership> {
        let user_id = self.identity.identify(token).await?;
        self.authz
            .authorize_group(user_id, group_id, Action::ManageMembers)
            .await?;

        let membership = self
            .store
            .memberships()
            .update_role(group_id, member.member_id, member.role)
            .await?;
        logged(
            self.cache
                .groups()
                .save_role(group_id, member.member_id, member.role)
                .await,
            "grs_by_mb",
        );
        info!(%group_id, member_id = %member.member_id, role = %member.role, "Group membership updated");
        Ok(membership)
    }

    async fn remove_group_memberships(
        &self,
        token: &str,
        group_id: Uuid,
        member_ids: &[Uuid],
    ) -> ThingsResult<()> {
        let user_id = self.identity.identify(token).await?;
        if member_ids.is_empty() {
            return Err(ThingsError::malformed("no members given"));
        }
        self.authz
            .authorize_group(user_id, group_id, Action::ManageMembers)
            .await?;

        for &member_id in member_ids {
            self.store.memberships().remove(group_id, member_id).await?;
            logged(
                self.cache.groups().remove_role(group_id, member_id).await,
                "grs_by_mb",
            );
        }
        info!(%group_id, count = member_ids.len(), "Group memberships removed");
        Ok(())
    }

    async fn list_group_memberships(
        &self,
        token: &str,
        group_id: Uuid,
        pagination: Pagination,
    ) -> ThingsResult<PaginatedResult<GroupMembership>> {
        let user_id = self.identity.identify(token).await?;
        self.authz
            .authorize_group(user_id, group_id, Action::Read)
            .await?;
        self.store
            .memberships()
            .list_by_group(group_id, pagination)
            .await
    }

    async fn create_group_invite(
        &self,
        token: &str,
        request: GroupInviteRequest,
    ) -> ThingsResult<GroupInvite> {
        let user_id = self.identity.identify(token).await?;
        self.authz
            .authorize_group(user_id, request.group_id, Action::ManageMembers)
            .await?;
        self.invites.create_invite(user_id, request).await
    }

    async fn view_group_invite(&self, token: &str, invite_id: Uuid) -> ThingsResult<GroupInvite> {
        let user_id = self.identity.identify(token).await?;
        let invite = self.invites.view(invite_id).await?;
        if invite.inviter_id != user_id && invite.invitee_id != Some(user_id) {
            self.authz
                .authorize_group(user_id, invite.group_id, Action::ManageMembers)
                .await?;
        }
        Ok(invite)
    }

    async fn respond_group_invite(
        &self,
        token: &str,
        invite_id: Uuid,
        accept: bool,
    ) -> ThingsResult<GroupInvite> {
        let user_id = self.identity.identify(token).await?;
        self.invites.respond(user_id, invite_id, accept).await
    }

    async fn revoke_group_invite(&self, token: &str, invite_id: Uuid) -> ThingsResult<GroupInvite> {
        let user_id = self.identity.identify(token).await?;
        let invite = self.store.invites().get_by_id(invite_id).await?;
        if invite.inviter_id != user_id {
            self.authz
                .authorize_group(user_id, invite.group_id, Action::ManageMembers)
                .await?;
        }
        self.invites.revoke(invite).await
    }

    async fn list_group_invites_by_user(&self, token: &str) -> ThingsResult<Vec<GroupInvite>> {
        let user_id = self.identity.identify(token).await?;
        self.invites.list_by_user(user_id).await
    }

    async fn create_dormant_group_invites(
        &self,
        token: &str,
        request: DormantInviteRequest,
    ) -> ThingsResult<Vec<GroupInvite>> {
        let user_id = self.identity.identify(token).await?;
        for group_id in distinct_groups(request.grants.iter().map(|g| g.group_id)) {
            self.authz
                .authorize_group(user_id, group_id, Action::ManageMembers)
                .await?;
        }
        self.invites.create_dormant(user_id, request).await
    }

    async fn activate_group_invites(
        &self,
        org_invite_id: Uuid,
        user_id: Uuid,
        expiration_time: DateTime<Utc>,
    ) -> ThingsResult<ActivationSummary> {
        self.invites
            .activate(org_invite_id, user_id, expiration_time)
            .await
    }
}
