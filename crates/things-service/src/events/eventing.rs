//! Event-emitting decorator around a [`Service`].

use chrono::{DateTime, Utc};
use things_core::error::ThingsResult;
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

use super::{Event, EventPublisher};
use crate::service::Service;

/// Publishes an [`Event`] after every successful mutation of the wrapped
/// service. Reads pass straight through. A failed publish is logged and
/// does not change the operation's result.
pub struct EventingService<T, P> {
    inner: T,
    publisher: P,
}

impl<T: Service, P: EventPublisher> EventingService<T, P> {
    pub fn new(inner: T, publisher: P) -> Self {
        Self { inner, publisher }
    }

    async fn emit(&self, event: Event) {
        let operation = event.operation();
        if let Err(e) = self.publisher.publish(event).await {
            warn!(operation, error = %e, "Failed to publish event");
        }
    }
}

impl<T: Service, P: EventPublisher> Service for EventingService<T, P> {
    async fn identify(&self, key: &ThingKey) -> ThingsResult<Uuid> {
        self.inner.identify(key).await
    }

    async fn can_user_access_thing(
        &self,
        token: &str,
        thing_id: Uuid,
        action: Action,
    ) -> ThingsResult<()> {
        self.inner
            .can_user_access_thing(token, thing_id, action)
            .await
    }

    async fn can_user_access_profile(
        &self,
        token: &str,
        profile_id: Uuid,
        action: Action,
    ) -> ThingsResult<()> {
        self.inner
            .can_user_access_profile(token, profile_id, action)
            .await
    }

    async fn can_user_access_group(
        &self,
        token: &str,
        group_id: Uuid,
        action: Action,
    ) -> ThingsResult<()> {
        self.inner
            .can_user_access_group(token, group_id, action)
            .await
    }

    async fn can_thing_access_group(&self, key: &ThingKey, group_id: Uuid) -> ThingsResult<()> {
        self.inner.can_thing_access_group(key, group_id).await
    }

    async fn get_pub_conf_by_key(&self, key: &ThingKey) -> ThingsResult<PubConfInfo> {
        self.inner.get_pub_conf_by_key(key).await
    }

    async fn get_group_id_by_thing(&self, thing_id: Uuid) -> ThingsResult<Uuid> {
        self.inner.get_group_id_by_thing(thing_id).await
    }

    async fn get_group_id_by_profile(&self, profile_id: Uuid) -> ThingsResult<Uuid> {
        self.inner.get_group_id_by_profile(profile_id).await
    }

    async fn retrieve_conn_by_thing_key(&self, key: &ThingKey) -> ThingsResult<Connection> {
        self.inner.retrieve_conn_by_thing_key(key).await
    }

    async fn connect(&self, token: &str, profile_id: Uuid, thing_ids: &[Uuid]) -> ThingsResult<()> {
        self.inner.connect(token, profile_id, thing_ids).await?;
        self.emit(Event::ThingsConnected {
            profile_id,
            thing_ids: thing_ids.to_vec(),
        })
        .await;
        Ok(())
    }

    async fn disconnect(
        &self,
        token: &str,
        profile_id: Uuid,
        thing_ids: &[Uuid],
    ) -> ThingsResult<()> {
        self.inner.disconnect(token, profile_id, thing_ids).await?;
        self.emit(Event::ThingsDisconnected {
            profile_id,
            thing_ids: thing_ids.to_vec(),
        })
        .await;
        Ok(())
    }

    async fn create_organization(
        &self,
        token: &str,
        request: OrganizationRequest,
    ) -> ThingsResult<Organization> {
        let org = self.inner.create_organization(token, request).await?;
        self.emit(Event::OrganizationCreated {
            org_id: org.id,
            owner_id: org.owner_id,
        })
        .await;
        Ok(org)
    }

    async fn remove_organization(&self, token: &str, org_id: Uuid) -> ThingsResult<()> {
        self.inner.remove_organization(token, org_id).await?;
        self.emit(Event::OrganizationRemoved { org_id }).await;
        Ok(())
    }

    async fn create_group(&self, token: &str, input: CreateGroup) -> ThingsResult<Group> {
        let group = self.inner.create_group(token, input).await?;
        self.emit(Event::GroupCreated {
            group_id: group.id,
            org_id: group.org_id,
        })
        .await;
        Ok(group)
    }

    async fn view_group(&self, token: &str, group_id: Uuid) -> ThingsResult<Group> {
        self.inner.view_group(token, group_id).await
    }

    async fn update_group(
        &self,
        token: &str,
        group_id: Uuid,
        input: UpdateGroup,
    ) -> ThingsResult<Group> {
        let group = self.inner.update_group(token, group_id, input).await?;
        self.emit(Event::GroupUpdated { group_id }).await;
        Ok(group)
    }

    async fn remove_group(&self, token: &str, group_id: Uuid) -> ThingsResult<()> {
        self.inner.remove_group(token, group_id).await?;
        self.emit(Event::GroupRemoved { group_id }).await;
        Ok(())
    }

    async fn create_profiles(
        &self,
        token: &str,
        profiles: Vec<CreateProfile>,
    ) -> ThingsResult<Vec<Profile>> {
        let profiles = self.inner.create_profiles(token, profiles).await?;
        self.emit(Event::ProfilesCreated {
            profile_ids: profiles.iter().map(|p| p.id).collect(),
        })
        .await;
        Ok(profiles)
    }

    async fn view_profile(&self, token: &str, profile_id: Uuid) -> ThingsResult<Profile> {
        self.inner.view_profile(token, profile_id).await
    }

    async fn remove_profile(&self, token: &str, profile_id: Uuid) -> ThingsResult<()> {
        self.inner.remove_profile(token, profile_id).await?;
        self.emit(Event::ProfileRemoved { profile_id }).await;
        Ok(())
    }

    async fn create_things(&self, token: &str, things: Vec<CreateThing>) -> ThingsResult<Vec<Thing>> {
        let things = self.inner.create_things(token, things).await?;
        self.emit(Event::ThingsCreated {
            thing_ids: things.iter().map(|t| t.id).collect(),
        })
        .await;
        Ok(things)
    }

    async fn view_thing(&self, token: &str, thing_id: Uuid) -> ThingsResult<Thing> {
        self.inner.view_thing(token, thing_id).await
    }

    async fn remove_thing(&self, token: &str, thing_id: Uuid) -> ThingsResult<()> {
        self.inner.remove_thing(token, thing_id).await?;
        self.emit(Event::ThingRemoved { thing_id }).await;
        Ok(())
    }

    async fn create_group_memberships(
        &self,
        token: &str,
        group_id: Uuid,
        members: Vec<MemberRole>,
    ) -> ThingsResult<Vec<GroupMembership>> {
        let saved = self
            .inner
            .create_group_memberships(token, group_id, members)
            .await?;
        self.emit(Event::MembershipsCreated {
            group_id,
            member_ids: saved.iter().map(|m| m.member_id).collect(),
        })
        .await;
        Ok(saved)
    }

    async fn update_group_membership(
        &self,
        token: &str,
        group_id: Uuid,
        member: MemberRole,
    ) -> ThingsResult<GroupMembership> {
        let membership = self
            .inner
            .update_group_membership(token, group_id, member)
            .await?;
        self.emit(Event::MembershipUpdated {
            group_id,
            member_id: membership.member_id,
            role: membership.role,
        })
        .await;
        Ok(membership)
    }

    async fn remove_group_memberships(
        &self,
        token: &str,
        group_id: Uuid,
        member_ids: &[Uuid],
    ) -> ThingsResult<()> {
        self.inner
            .remove_group_memberships(token, group_id, member_ids)
            .await?;
        self.emit(Event::MembershipsRemoved {
            group_id,
            member_ids: member_ids.to_vec(),
        })
        .await;
        Ok(())
    }

    async fn list_group_memberships(
        &self,
        token: &str,
        group_id: Uuid,
        pagination: Pagination,
    ) -> ThingsResult<PaginatedResult<GroupMembership>> {
        self.inner
            .list_group_memberships(token, group_id, pagination)
            .await
    }

    async fn create_group_invite(
        &self,
        token: &str,
        request: GroupInviteRequest,
    ) -> ThingsResult<GroupInvite> {
        let invite = self.inner.create_group_invite(token, request).await?;
        self.emit(Event::InviteCreated {
            invite_id: invite.id,
            group_id: invite.group_id,
        })
        .await;
        Ok(invite)
    }

    async fn view_group_invite(&self, token: &str, invite_id: Uuid) -> ThingsResult<GroupInvite> {
        self.inner.view_group_invite(token, invite_id).await
    }

    async fn respond_group_invite(
        &self,
        token: &str,
        invite_id: Uuid,
        accept: bool,
    ) -> ThingsResult<GroupInvite> {
        let invite = self
            .inner
            .respond_group_invite(token, invite_id, accept)
            .await?;
        self.emit(Event::InviteAnswered {
            invite_id,
            state: invite.state,
        })
        .await;
        Ok(invite)
    }

    async fn revoke_group_invite(&self, token: &str, invite_id: Uuid) -> ThingsResult<GroupInvite> {
        let invite = self.inner.revoke_group_invite(token, invite_id).await?;
        self.emit(Event::InviteRevoked { invite_id }).await;
        Ok(invite)
    }

    async fn list_group_invites_by_user(&self, token: &str) -> ThingsResult<Vec<GroupInvite>> {
        self.inner.list_group_invites_by_user(token).await
    }

    async fn create_dormant_group_invites(
        &self,
        token: &str,
        request: DormantInviteRequest,
    ) -> ThingsResult<Vec<GroupInvite>> {
        let org_invite_id = request.org_invite_id;
        let invites = self
            .inner
            .create_dormant_group_invites(token, request)
            .await?;
        self.emit(Event::DormantInvitesCreated {
            org_invite_id,
            invite_ids: invites.iter().map(|i| i.id).collect(),
        })
        .await;
        Ok(invites)
    }

    async fn activate_group_invites(
        &self,
        org_invite_id: Uuid,
        user_id: Uuid,
        expiration_time: DateTime<Utc>,
    ) -> ThingsResult<ActivationSummary> {
        let summary = self
            .inner
            .activate_group_invites(org_invite_id, user_id, expiration_time)
            .await?;
        if !summary.activated.is_empty() {
            self.emit(Event::InvitesActivated {
                org_invite_id,
                member_id: user_id,
                invite_ids: summary.activated.clone(),
            })
            .await;
        }
        Ok(summary)
    }
}
