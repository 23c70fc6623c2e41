//! Operation deadlines.

use std::time::Duration;

use chrono::{DateTime, Utc};
use things_core::error::{ThingsError, ThingsResult};
use things_core::models::connection::{Connection, PubConfInfo};
use things_core::models::group::{CreateGroup, Group, UpdateGroup};
use things_core::models::invite::{
    ActivationSummary, DormantInviteRequest, GroupInvite, GroupInviteRequest,
};
use things_core::models::membership::{GroupMembership, MemberRole};
use things_core::models::organization::{Organization, OrganizationRequest};
use things_core::models::profile::{CreateProfile, Profile};
use things_core::models::role::Action;
use things_core::models::thing::{CreateThing, Thing, ThingKey};
use things_core::repository::{PaginatedResult, Pagination};
use tracing::warn;
use uuid::Uuid;

use crate::service::Service;

/// Run `operation` with a deadline.
///
/// On expiry the operation's future is dropped, which aborts any store or
/// cache I/O still in flight, and `DeadlineExceeded` is returned.
pub async fn with_deadline<T, F>(deadline: Duration, operation: F) -> ThingsResult<T>
where
    F: Future<Output = ThingsResult<T>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => {
            warn!(deadline_ms = deadline.as_millis() as u64, "Operation deadline exceeded");
            Err(ThingsError::DeadlineExceeded)
        }
    }
}

/// Applies one deadline to every operation of the wrapped service.
///
/// Transports wrap their service in this with
/// [`ServiceConfig::operation_timeout`](crate::ServiceConfig::operation_timeout).
pub struct DeadlineService<T> {
    inner: T,
    deadline: Duration,
}

impl<T: Service> DeadlineService<T> {
    pub fn new(inner: T, deadline: Duration) -> Self {
        Self { inner, deadline }
    }
}

impl<T: Service> Service for DeadlineService<T> {
    async fn identify(&self, key: &ThingKey) -> ThingsResult<Uuid> {
        with_deadline(self.deadline, self.inner.identify(key)).await
    }

    async fn can_user_access_thing(
        &self,
        token: &str,
        thing_id: Uuid,
        action: Action,
    ) -> ThingsResult<()> {
        with_deadline(
            self.deadline,
            self.inner.can_user_access_thing(token, thing_id, action),
        )
        .await
    }

    async fn can_user_access_profile(
        &self,
        token: &str,
        profile_id: Uuid,
        action: Action,
    ) -> ThingsResult<()> {
        with_deadline(
            self.deadline,
            self.inner.can_user_access_profile(token, profile_id, action),
        )
        .await
    }

    async fn can_user_access_group(
        &self,
        token: &str,
        group_id: Uuid,
        action: Action,
    ) -> ThingsResult<()> {
        with_deadline(
            self.deadline,
            self.inner.can_user_access_group(token, group_id, action),
        )
        .await
    }

    async fn can_thing_access_group(&self, key: &ThingKey, group_id: Uuid) -> ThingsResult<()> {
        with_deadline(self.deadline, self.inner.can_thing_access_group(key, group_id)).await
    }

    async fn get_pub_conf_by_key(&self, key: &ThingKey) -> ThingsResult<PubConfInfo> {
        with_deadline(self.deadline, self.inner.get_pub_conf_by_key(key)).await
    }

    async fn get_group_id_by_thing(&self, thing_id: Uuid) -> ThingsResult<Uuid> {
        with_deadline(self.deadline, self.inner.get_group_id_by_thing(thing_id)).await
    }

    async fn get_group_id_by_profile(&self, profile_id: Uuid) -> ThingsResult<Uuid> {
        with_deadline(self.deadline, self.inner.get_group_id_by_profile(profile_id)).await
    }

    async fn retrieve_conn_by_thing_key(&self, key: &ThingKey) -> ThingsResult<Connection> {
        with_deadline(self.deadline, self.inner.retrieve_conn_by_thing_key(key)).await
    }

    async fn connect(&self, token: &str, profile_id: Uuid, thing_ids: &[Uuid]) -> ThingsResult<()> {
        with_deadline(self.deadline, self.inner.connect(token, profile_id, thing_ids)).await
    }

    async fn disconnect(
        &self,
        token: &str,
        profile_id: Uuid,
        thing_ids: &[Uuid],
    ) -> ThingsResult<()> {
        with_deadline(self.deadline, self.inner.disconnect(token, profile_id, thing_ids)).await
    }

    async fn create_organization(
        &self,
        token: &str,
        request: OrganizationRequest,
    ) -> ThingsResult<Organization> {
        with_deadline(self.deadline, self.inner.create_organization(token, request)).await
    }

    async fn remove_organization(&self, token: &str, org_id: Uuid) -> ThingsResult<()> {
        with_deadline(self.deadline, self.inner.remove_organization(token, org_id)).await
    }

    async fn create_group(&self, token: &str, input: CreateGroup) -> ThingsResult<Group> {
        with_deadline(self.deadline, self.inner.create_group(token, input)).await
    }

    async fn view_group(&self, token: &str, group_id: Uuid) -> ThingsResult<Group> {
        with_deadline(self.deadline, self.inner.view_group(token, group_id)).await
    }

    async fn update_group(
        &self,
        token: &str,
        group_id: Uuid,
        input: UpdateGroup,
    ) -> ThingsResult<Group> {
        with_deadline(self.deadline, self.inner.update_group(token, group_id, input)).await
    }

    async fn remove_group(&self, token: &str, group_id: Uuid) -> ThingsResult<()> {
        with_deadline(self.deadline, self.inner.remove_group(token, group_id)).await
    }

    async fn create_profiles(
        &self,
        token: &str,
        profiles: Vec<CreateProfile>,
    ) -> ThingsResult<Vec<Profile>> {
        with_deadline(self.deadline, self.inner.create_profiles(token, profiles)).await
    }

    async fn view_profile(&self, token: &str, profile_id: Uuid) -> ThingsResult<Profile> {
        with_deadline(self.deadline, self.inner.view_profile(token, profile_id)).await
    }

    async fn remove_profile(&self, token: &str, profile_id: Uuid) -> ThingsResult<()> {
        with_deadline(self.deadline, self.inner.remove_profile(token, profile_id)).await
    }

    async fn create_things(&self, token: &str, things: Vec<CreateThing>) -> ThingsResult<Vec<Thing>> {
        with_deadline(self.deadline, self.inner.create_things(token, things)).await
    }

    async fn view_thing(&self, token: &str, thing_id: Uuid) -> ThingsResult<Thing> {
        with_deadline(self.deadline, self.inner.view_thing(token, thing_id)).await
    }

    async fn remove_thing(&self, token: &str, thing_id: Uuid) -> ThingsResult<()> {
        with_deadline(self.deadline, self.inner.remove_thing(token, thing_id)).await
    }

    async fn create_group_memberships(
        &self,
        token: &str,
        group_id: Uuid,
        members: Vec<MemberRole>,
    ) -> ThingsResult<Vec<GroupMembership>> {
        with_deadline(
            self.deadline,
            self.inner.create_group_memberships(token, group_id, members),
        )
        .await
    }

    async fn update_group_membership(
        &self,
        token: &str,
        group_id: Uuid,
        member: MemberRole,
    ) -> ThingsResult<GroupMembership> {
        with_deadline(
            self.deadline,
            self.inner.update_group_membership(token, group_id, member),
        )
        .await
    }

    async fn remove_group_memberships(
        &self,
        token: &str,
        group_id: Uuid,
        member_ids: &[Uuid],
    ) -> ThingsResult<()> {
        with_deadline(
            self.deadline,
            self.inner.remove_group_memberships(token, group_id, member_ids),
        )
        .await
    }

    async fn list_group_memberships(
        &self,
        token: &str,
        group_id: Uuid,
        pagination: Pagination,
    ) -> ThingsResult<PaginatedResult<GroupMembership>> {
        with_deadline(
            self.deadline,
            self.inner.list_group_memberships(token, group_id, pagination),
        )
        .await
    }

    async fn create_group_invite(
        &self,
        token: &str,
        request: GroupInviteRequest,
    ) -> ThingsResult<GroupInvite> {
        with_deadline(self.deadline, self.inner.create_group_invite(token, request)).await
    }

    async fn view_group_invite(&self, token: &str, invite_id: Uuid) -> ThingsResult<GroupInvite> {
        with_deadline(self.deadline, self.inner.view_group_invite(token, invite_id)).await
    }

    async fn respond_group_invite(
        &self,
        token: &str,
        invite_id: Uuid,
        accept: bool,
    ) -> ThingsResult<GroupInvite> {
        with_deadline(
            self.deadline,
            self.inner.respond_group_invite(token, invite_id, accept),
        )
        .await
    }

    async fn revoke_group_invite(&self, token: &str, invite_id: Uuid) -> ThingsResult<GroupInvite> {
        with_deadline(self.deadline, self.inner.revoke_group_invite(token, invite_id)).await
    }

    async fn list_group_invites_by_user(&self, token: &str) -> ThingsResult<Vec<GroupInvite>> {
        with_deadline(self.deadline, self.inner.list_group_invites_by_user(token)).await
    }

    async fn create_dormant_group_invites(
        &self,
        token: &str,
        request: DormantInviteRequest,
    ) -> ThingsResult<Vec<GroupInvite>> {
        with_deadline(
            self.deadline,
            self.inner.create_dormant_group_invites(token, request),
        )
        .await
    }

    async fn activate_group_invites(
        &self,
        org_invite_id: Uuid,
        user_id: Uuid,
        expiration_time: DateTime<Utc>,
    ) -> ThingsResult<ActivationSummary> {
        with_deadline(
            self.deadline,
            self.inner
                .activate_group_invites(org_invite_id, user_id, expiration_time),
        )
        .await
    }
}
