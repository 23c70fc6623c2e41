//! Group invites: direct invites, dormant invites bundled with an
//! organization invite, and their activation.
//!
//! Callers authorize before reaching the coordinator. The coordinator owns
//! the invite state machine, the duplicate rule and the write-through of
//! roles granted by accepted invites.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use things_core::cache::{CacheLayer, GroupCache};
use things_core::error::{ThingsError, ThingsResult};
use things_core::models::invite::{
    ActivationSummary, CreateGroupInvite, DormantInviteRequest, GroupInvite, GroupInviteRequest,
    InviteState,
};
use things_core::models::membership::GroupMembership;
use things_core::models::role::GroupRole;
use things_core::repository::{GroupInviteRepository, GroupMembershipRepository, ResourceStore};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::lookup::logged;

pub struct InviteCoordinator<S, L> {
    store: Arc<S>,
    cache: Arc<L>,
    config: ServiceConfig,
}

fn validate_grant(role: GroupRole, email: &str) -> ThingsResult<()> {
    if role == GroupRole::Owner {
        return Err(ThingsError::malformed("the owner role cannot be granted by invite"));
    }
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ThingsError::malformed(format!(
            "invalid invitee email: {email:?}"
        ))),
    }
}

impl<S: ResourceStore, L: CacheLayer> InviteCoordinator<S, L> {
    pub fn new(store: Arc<S>, cache: Arc<L>, config: ServiceConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// Fails with `Conflict` if the invitee already belongs to the group.
    async fn ensure_not_member(&self, group_id: Uuid, invitee_id: Option<Uuid>) -> ThingsResult<()> {
        let Some(invitee_id) = invitee_id else {
            return Ok(());
        };
        match self.store.memberships().get(group_id, invitee_id).await {
            Ok(_) => Err(ThingsError::conflict(
                "group_membership",
                format!("user {invitee_id} is already a member of group {group_id}"),
            )),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Fails with `Conflict` if an equivalent invite is still pending.
    /// Stale pending invites met on the way are marked expired.
    async fn ensure_no_pending(
        &self,
        group_id: Uuid,
        inviter_id: Uuid,
        invitee_id: Option<Uuid>,
        invitee_email: &str,
    ) -> ThingsResult<()> {
        let now = Utc::now();
        let pending = self
            .store
            .invites()
            .find_pending(group_id, inviter_id, invitee_id, invitee_email.trim())
            .await?;

        for invite in pending {
            if invite.is_expired_at(now) {
                self.store
                    .invites()
                    .transition(invite.id, InviteState::Pending, InviteState::Expired)
                    .await?;
                continue;
            }
            return Err(ThingsError::conflict(
                "group_invite",
                format!("invite {} is still pending", invite.id),
            ));
        }
        Ok(())
    }

    fn new_invite(
        &self,
        inviter_id: Uuid,
        group_id: Uuid,
        invitee_id: Option<Uuid>,
        invitee_email: &str,
        role: GroupRole,
    ) -> CreateGroupInvite {
        CreateGroupInvite {
            group_id,
            invitee_id,
            invitee_email: invitee_email.trim().to_string(),
            inviter_id,
            invitee_role: role,
            expires_at: Utc::now() + self.config.invite_lifetime(),
        }
    }

    /// Invite a registered user. Invites for people without an account yet
    /// go through [`create_dormant`](Self::create_dormant) and are bound on
    /// activation.
    pub async fn create_invite(
        &self,
        inviter_id: Uuid,
        request: GroupInviteRequest,
    ) -> ThingsResult<GroupInvite> {
        validate_grant(request.role, &request.invitee_email)?;
        let Some(invitee_id) = request.invitee_id else {
            return Err(ThingsError::malformed(
                "a direct invite needs the invitee's user id",
            ));
        };
        if invitee_id == inviter_id {
            return Err(ThingsError::malformed("cannot invite yourself"));
        }
        self.ensure_not_member(request.group_id, Some(invitee_id))
            .await?;
        self.ensure_no_pending(
            request.group_id,
            inviter_id,
            Some(invitee_id),
            &request.invitee_email,
        )
        .await?;

        let invite = self
            .store
            .invites()
            .create(self.new_invite(
                inviter_id,
                request.group_id,
                Some(invitee_id),
                &request.invitee_email,
                request.role,
            ))
            .await?;
        info!(invite_id = %invite.id, group_id = %invite.group_id, "Group invite created");
        Ok(invite)
    }

    /// Issue one pending invite per grant, each linked to the organization
    /// invite. The invites are issued together or not at all.
    pub async fn create_dormant(
        &self,
        inviter_id: Uuid,
        request: DormantInviteRequest,
    ) -> ThingsResult<Vec<GroupInvite>> {
        if request.grants.is_empty() {
            return Err(ThingsError::malformed("no groups given"));
        }
        let mut groups = HashSet::with_capacity(request.grants.len());
        for grant in &request.grants {
            if !groups.insert(grant.group_id) {
                return Err(ThingsError::malformed(format!(
                    "group {} listed more than once",
                    grant.group_id
                )));
            }
            validate_grant(grant.role, &request.invitee_email)?;
            self.ensure_not_member(grant.group_id, request.invitee_id)
                .await?;
            self.ensure_no_pending(
                grant.group_id,
                inviter_id,
                request.invitee_id,
                &request.invitee_email,
            )
            .await?;
        }

        let inputs = request
            .grants
            .iter()
            .map(|grant| {
                self.new_invite(
                    inviter_id,
                    grant.group_id,
                    request.invitee_id,
                    &request.invitee_email,
                    grant.role,
                )
            })
            .collect();
        let invites = self
            .store
            .invites()
            .create_dormant(request.org_invite_id, inputs)
            .await?;

        info!(
            org_invite_id = %request.org_invite_id,
            count = invites.len(),
            "Dormant group invites created"
        );
        Ok(invites)
    }

    /// Grant `role` to `member_id` unless already a member. Returns the role
    /// the member ends up holding.
    async fn join(&self, group_id: Uuid, member_id: Uuid, role: GroupRole) -> ThingsResult<GroupRole> {
        let role = match self
            .store
            .memberships()
            .save(GroupMembership {
                group_id,
                member_id,
                role,
            })
            .await
        {
            Ok(membership) => membership.role,
            Err(e) if e.is_conflict() => {
                self.store
                    .memberships()
                    .get(group_id, member_id)
                    .await?
                    .role
            }
            Err(e) => return Err(e),
        };
        logged(
            self.cache.groups().save_role(group_id, member_id, role).await,
            "grs_by_mb",
        );
        Ok(role)
    }

    /// Turn the dormant invites of an organization invite into memberships.
    ///
    /// Each invite is handled on its own and nothing is rolled back, so a
    /// retry after partial completion finishes the remaining invites.
    pub async fn activate(
        &self,
        org_invite_id: Uuid,
        user_id: Uuid,
        expiration_time: DateTime<Utc>,
    ) -> ThingsResult<ActivationSummary> {
        let invites = self.store.invites().list_dormant(org_invite_id).await?;
        if invites.is_empty() {
            return Err(ThingsError::not_found("dormant_group_invite", org_invite_id));
        }

        let now = Utc::now();
        let mut summary = ActivationSummary::default();
        for invite in invites {
            let foreign = invite.invitee_id.is_some_and(|id| id != user_id);
            if foreign || invite.state != InviteState::Pending {
                debug!(invite_id = %invite.id, state = %invite.state, "Skipping dormant invite");
                summary.skipped.push(invite.id);
                continue;
            }

            if invite.expires_at.min(expiration_time) <= now {
                self.store
                    .invites()
                    .transition(invite.id, InviteState::Pending, InviteState::Expired)
                    .await?;
                summary.expired.push(invite.id);
                continue;
            }

            if invite.invitee_id.is_none() {
                self.store.invites().bind_invitee(invite.id, user_id).await?;
            }
            self.join(invite.group_id, user_id, invite.invitee_role)
                .await?;

            if self
                .store
                .invites()
                .transition(invite.id, InviteState::Pending, InviteState::Accepted)
                .await?
            {
                summary.activated.push(invite.id);
            } else {
                summary.skipped.push(invite.id);
            }
        }

        info!(
            %org_invite_id,
            %user_id,
            activated = summary.activated.len(),
            expired = summary.expired.len(),
            skipped = summary.skipped.len(),
            "Dormant group invites activated"
        );
        Ok(summary)
    }

    /// Persist passive expiry of `invite` and return it as observed now.
    async fn settle(&self, mut invite: GroupInvite) -> ThingsResult<GroupInvite> {
        if invite.state_at(Utc::now()) == InviteState::Expired
            && invite.state == InviteState::Pending
        {
            self.store
                .invites()
                .transition(invite.id, InviteState::Pending, InviteState::Expired)
                .await?;
            invite.state = InviteState::Expired;
        }
        Ok(invite)
    }

    pub async fn view(&self, invite_id: Uuid) -> ThingsResult<GroupInvite> {
        let invite = self.store.invites().get_by_id(invite_id).await?;
        self.settle(invite).await
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> ThingsResult<Vec<GroupInvite>> {
        let invites = self.store.invites().list_by_invitee(user_id).await?;
        let mut settled = Vec::with_capacity(invites.len());
        for invite in invites {
            settled.push(self.settle(invite).await?);
        }
        Ok(settled)
    }

    /// Accept or decline a direct invite addressed to `user_id`.
    ///
    /// Accepting an already accepted invite returns it unchanged.
    pub async fn respond(
        &self,
        user_id: Uuid,
        invite_id: Uuid,
        accept: bool,
    ) -> ThingsResult<GroupInvite> {
        let invite = self.view(invite_id).await?;
        if invite.invitee_id != Some(user_id) {
            return Err(ThingsError::denied(format!(
                "invite {invite_id} is not addressed to user {user_id}"
            )));
        }
        if self.store.invites().dormant_origin(invite_id).await?.is_some() {
            return Err(ThingsError::denied(format!(
                "invite {invite_id} is activated through its organization invite"
            )));
        }

        match invite.state {
            InviteState::Pending => {}
            InviteState::Accepted if accept => return Ok(invite),
            state => {
                return Err(ThingsError::conflict(
                    "group_invite",
                    format!("invite {invite_id} is already {state}"),
                ));
            }
        }

        let next = if accept {
            self.join(invite.group_id, user_id, invite.invitee_role)
                .await?;
            InviteState::Accepted
        } else {
            InviteState::Declined
        };

        if !self
            .store
            .invites()
            .transition(invite_id, InviteState::Pending, next)
            .await?
        {
            let current = self.store.invites().get_by_id(invite_id).await?;
            if current.state == next {
                return Ok(current);
            }
            return Err(ThingsError::conflict(
                "group_invite",
                format!("invite {invite_id} is already {}", current.state),
            ));
        }

        info!(%invite_id, %user_id, state = %next, "Group invite answered");
        Ok(GroupInvite {
            state: next,
            ..invite
        })
    }

    pub async fn revoke(&self, invite: GroupInvite) -> ThingsResult<GroupInvite> {
        let invite = self.settle(invite).await?;
        if invite.state != InviteState::Pending
            || !self
                .store
                .invites()
                .transition(invite.id, InviteState::Pending, InviteState::Revoked)
                .await?
        {
            return Err(ThingsError::conflict(
                "group_invite",
                format!("invite {} is no longer pending", invite.id),
            ));
        }

        info!(invite_id = %invite.id, "Group invite revoked");
        Ok(GroupInvite {
            state: InviteState::Revoked,
            ..invite
        })
    }
}
