//! SurrealDB implementation of [`GroupInviteRepository`].
//!
//! Dormant invites are ordinary `group_invite` records plus a link row in
//! `dormant_group_invite` naming the organization invite they belong to.
//!
//! A pending invite holds `pending_invite` guard records keyed by
//! `(group, inviter, invitee)`, one for the lowercased email and one for the
//! invitee id when known. Guards are created with the invite and dropped
//! when it leaves `pending`, so two pending invites can never share a key.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use things_core::error::ThingsResult;
use things_core::models::invite::{CreateGroupInvite, GroupInvite, InviteState};
use things_core::models::role::GroupRole;
use things_core::repository::GroupInviteRepository;
use tracing::debug;
use uuid::Uuid;

use super::parse_id;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct InviteRow {
    group_id: String,
    invitee_id: Option<String>,
    invitee_email: String,
    inviter_id: String,
    invitee_role: String,
    state: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl InviteRow {
    fn into_invite(self, id: Uuid) -> Result<GroupInvite, DbError> {
        let invitee_id = self
            .invitee_id
            .as_deref()
            .map(|id| parse_id(id, "invitee"))
            .transpose()?;
        let invitee_role = self
            .invitee_role
            .parse::<GroupRole>()
            .map_err(|e| DbError::Decode(e.to_string()))?;
        let state = self
            .state
            .parse::<InviteState>()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        Ok(GroupInvite {
            id,
            group_id: parse_id(&self.group_id, "group")?,
            invitee_id,
            invitee_email: self.invitee_email,
            inviter_id: parse_id(&self.inviter_id, "inviter")?,
            invitee_role,
            created_at: self.created_at,
            expires_at: self.expires_at,
            state,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct InviteRowWithId {
    record_id: String,
    group_id: String,
    invitee_id: Option<String>,
    invitee_email: String,
    inviter_id: String,
    invitee_role: String,
    state: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl InviteRowWithId {
    fn try_into_invite(self) -> Result<GroupInvite, DbError> {
        let id = parse_id(&self.record_id, "group_invite")?;
        InviteRow {
            group_id: self.group_id,
            invitee_id: self.invitee_id,
            invitee_email: self.invitee_email,
            inviter_id: self.inviter_id,
            invitee_role: self.invitee_role,
            state: self.state,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
        .into_invite(id)
    }
}

fn collect_invites(rows: Vec<InviteRowWithId>) -> Result<Vec<GroupInvite>, DbError> {
    rows.into_iter().map(InviteRowWithId::try_into_invite).collect()
}

/// Bound as `$invites` by [`INSERT_INVITES`].
#[derive(Debug, SurrealValue)]
struct NewInviteRow {
    id: String,
    guards: Vec<String>,
    group_id: String,
    invitee_id: Option<String>,
    invitee_email: String,
    inviter_id: String,
    invitee_role: String,
    expires_at: DateTime<Utc>,
}

impl NewInviteRow {
    fn new(id: Uuid, input: CreateGroupInvite) -> Self {
        let email = input.invitee_email.trim().to_lowercase();
        let scope = format!("{}:{}", input.group_id, input.inviter_id);
        let mut guards = vec![format!("{scope}:email:{email}")];
        if let Some(invitee_id) = input.invitee_id {
            guards.push(format!("{scope}:user:{invitee_id}"));
        }

        Self {
            id: id.to_string(),
            guards,
            group_id: input.group_id.to_string(),
            invitee_id: input.invitee_id.map(|u| u.to_string()),
            invitee_email: email,
            inviter_id: input.inviter_id.to_string(),
            invitee_role: input.invitee_role.as_str().to_string(),
            expires_at: input.expires_at,
        }
    }
}

const INSERT_INVITES: &str = "\
BEGIN TRANSACTION;
FOR $invite IN $invites {
    FOR $guard IN $invite.guards {
        CREATE type::record('pending_invite', $guard) SET
            invite_id = $invite.id, group_id = $invite.group_id;
    };
    CREATE type::record('group_invite', $invite.id) SET
        group_id = $invite.group_id, invitee_id = $invite.invitee_id,
        invitee_email = $invite.invitee_email,
        inviter_id = $invite.inviter_id,
        invitee_role = $invite.invitee_role, state = 'pending',
        expires_at = $invite.expires_at;
    IF $org_invite_id != NONE {
        CREATE type::record('dormant_group_invite', $invite.id) SET
            org_invite_id = $org_invite_id,
            group_invite_id = $invite.id, group_id = $invite.group_id;
    };
};
COMMIT TRANSACTION;";

const LEAVE_PENDING: &str = "\
BEGIN TRANSACTION;
UPDATE type::record('group_invite', $id) SET state = $to_state
    WHERE state = 'pending';
DELETE pending_invite WHERE invite_id = $id;
COMMIT TRANSACTION;";

#[derive(Debug, SurrealValue)]
struct DormantLinkRow {
    org_invite_id: String,
    group_invite_id: String,
}

/// SurrealDB implementation of the GroupInvite repository.
#[derive(Clone)]
pub struct SurrealGroupInviteRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGroupInviteRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Write the invites, their guards and optionally their dormant links
    /// in one transaction, then read them back.
    async fn insert(
        &self,
        org_invite_id: Option<Uuid>,
        inputs: Vec<CreateGroupInvite>,
    ) -> ThingsResult<Vec<GroupInvite>> {
        let ids: Vec<Uuid> = inputs.iter().map(|_| Uuid::new_v4()).collect();
        let rows: Vec<NewInviteRow> = ids
            .iter()
            .zip(inputs)
            .map(|(id, input)| NewInviteRow::new(*id, input))
            .collect();

        self.db
            .query(INSERT_INVITES)
            .bind(("invites", rows))
            .bind(("org_invite_id", org_invite_id.map(|u| u.to_string())))
            .await
            .map_err(|e| DbError::from_write("group_invite", e))?
            .check()
            .map_err(|e| DbError::from_write("group_invite", e))?;

        let mut invites = Vec::with_capacity(ids.len());
        for id in ids {
            invites.push(self.get_by_id(id).await?);
        }
        Ok(invites)
    }
}

impl<C: Connection> GroupInviteRepository for SurrealGroupInviteRepository<C> {
    async fn create(&self, input: CreateGroupInvite) -> ThingsResult<GroupInvite> {
        let invite = self
            .insert(None, vec![input])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::Query("invite insert returned nothing".into()))?;
        debug!(invite_id = %invite.id, "Group invite stored");
        Ok(invite)
    }

    async fn get_by_id(&self, id: Uuid) -> ThingsResult<GroupInvite> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('group_invite', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InviteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("group_invite", &id_str))?;

        Ok(row.into_invite(id)?)
    }

    async fn find_pending(
        &self,
        group_id: Uuid,
        inviter_id: Uuid,
        invitee_id: Option<Uuid>,
        invitee_email: &str,
    ) -> ThingsResult<Vec<GroupInvite>> {
        let target = if invitee_id.is_some() {
            "(invitee_email = $invitee_email OR invitee_id = $invitee_id)"
        } else {
            "invitee_email = $invitee_email"
        };
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM group_invite \
             WHERE group_id = $group_id AND inviter_id = $inviter_id \
             AND state = 'pending' AND {target}"
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("group_id", group_id.to_string()))
            .bind(("inviter_id", inviter_id.to_string()))
            .bind(("invitee_email", invitee_email.to_lowercase()));
        if let Some(invitee_id) = invitee_id {
            builder = builder.bind(("invitee_id", invitee_id.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<InviteRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(collect_invites(rows)?)
    }

    async fn transition(&self, id: Uuid, from: InviteState, to: InviteState) -> ThingsResult<bool> {
        let query = if from == InviteState::Pending && to != InviteState::Pending {
            LEAVE_PENDING
        } else {
            "UPDATE type::record('group_invite', $id) SET state = $to_state \
             WHERE state = $from_state"
        };

        let mut result = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("from_state", from.as_str().to_string()))
            .bind(("to_state", to.as_str().to_string()))
            .await
            .map_err(|e| DbError::from_write("group_invite", e))?
            .check()
            .map_err(|e| DbError::from_write("group_invite", e))?;

        let rows: Vec<InviteRow> = result.take(0).map_err(DbError::from)?;
        let moved = !rows.is_empty();
        if moved {
            debug!(invite_id = %id, %from, %to, "Invite state changed");
        }
        Ok(moved)
    }

    async fn bind_invitee(&self, id: Uuid, invitee_id: Uuid) -> ThingsResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('group_invite', $id) SET invitee_id = $invitee_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("invitee_id", invitee_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InviteRowWithId> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::not_found("group_invite", &id_str).into());
        }
        Ok(())
    }

    async fn list_by_invitee(&self, invitee_id: Uuid) -> ThingsResult<Vec<GroupInvite>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM group_invite \
                 WHERE invitee_id = $invitee_id ORDER BY created_at DESC",
            )
            .bind(("invitee_id", invitee_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InviteRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(collect_invites(rows)?)
    }

    async fn create_dormant(
        &self,
        org_invite_id: Uuid,
        inputs: Vec<CreateGroupInvite>,
    ) -> ThingsResult<Vec<GroupInvite>> {
        self.insert(Some(org_invite_id), inputs).await
    }

    async fn list_dormant(&self, org_invite_id: Uuid) -> ThingsResult<Vec<GroupInvite>> {
        let mut result = self
            .db
            .query(
                "SELECT org_invite_id, group_invite_id, created_at \
                 FROM dormant_group_invite \
                 WHERE org_invite_id = $org_invite_id ORDER BY created_at ASC",
            )
            .bind(("org_invite_id", org_invite_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let links: Vec<DormantLinkRow> = result.take(0).map_err(DbError::from)?;

        let mut invites = Vec::with_capacity(links.len());
        for link in links {
            let invite_id = parse_id(&link.group_invite_id, "group_invite")?;
            match self.get_by_id(invite_id).await {
                Ok(invite) => invites.push(invite),
                // The group may have been removed after the link was read.
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(invites)
    }

    async fn dormant_origin(&self, invite_id: Uuid) -> ThingsResult<Option<Uuid>> {
        let mut result = self
            .db
            .query(
                "SELECT org_invite_id, group_invite_id \
                 FROM type::record('dormant_group_invite', $invite_id)",
            )
            .bind(("invite_id", invite_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let links: Vec<DormantLinkRow> = result.take(0).map_err(DbError::from)?;
        Ok(links
            .into_iter()
            .next()
            .map(|link| parse_id(&link.org_invite_id, "org_invite"))
            .transpose()?)
    }
}
