//! SurrealDB implementation of [`GroupMembershipRepository`].

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use things_core::error::ThingsResult;
use things_core::models::membership::GroupMembership;
use things_core::models::role::GroupRole;
use things_core::repository::{GroupMembershipRepository, PaginatedResult, Pagination};
use uuid::Uuid;

use super::{CountRow, parse_id};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct MembershipRow {
    group_id: String,
    member_id: String,
    role: String,
}

impl MembershipRow {
    fn try_into_membership(self) -> Result<GroupMembership, DbError> {
        let role = self
            .role
            .parse::<GroupRole>()
            .map_err(|e| DbError::Decode(e.to_string()))?;
        Ok(GroupMembership {
            group_id: parse_id(&self.group_id, "group")?,
            member_id: parse_id(&self.member_id, "member")?,
            role,
        })
    }
}

fn record_key(group_id: Uuid, member_id: Uuid) -> String {
    format!("{group_id}_{member_id}")
}

/// SurrealDB implementation of the GroupMembership repository.
#[derive(Clone)]
pub struct SurrealGroupMembershipRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGroupMembershipRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> GroupMembershipRepository for SurrealGroupMembershipRepository<C> {
    async fn save(&self, membership: GroupMembership) -> ThingsResult<GroupMembership> {
        let result = self
            .db
            .query(
                "CREATE type::record('group_membership', $key) SET \
                 group_id = $group_id, member_id = $member_id, role = $role",
            )
            .bind(("key", record_key(membership.group_id, membership.member_id)))
            .bind(("group_id", membership.group_id.to_string()))
            .bind(("member_id", membership.member_id.to_string()))
            .bind(("role", membership.role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::from_write("group_membership", e))?;

        Ok(membership)
    }

    async fn get(&self, group_id: Uuid, member_id: Uuid) -> ThingsResult<GroupMembership> {
        let key = record_key(group_id, member_id);

        let mut result = self
            .db
            .query("SELECT * FROM type::record('group_membership', $key)")
            .bind(("key", key.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("group_membership", &key))?;

        Ok(row.try_into_membership()?)
    }

    async fn update_role(
        &self,
        group_id: Uuid,
        member_id: Uuid,
        role: GroupRole,
    ) -> ThingsResult<GroupMembership> {
        let key = record_key(group_id, member_id);

        // No rows come back when the membership does not exist.
        let mut result = self
            .db
            .query(
                "UPDATE type::record('group_membership', $key) \
                 SET role = $role, updated_at = time::now() \
                 WHERE member_id = $member_id",
            )
            .bind(("key", key.clone()))
            .bind(("role", role.as_str().to_string()))
            .bind(("member_id", member_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("group_membership", &key))?;

        Ok(row.try_into_membership()?)
    }

    async fn remove(&self, group_id: Uuid, member_id: Uuid) -> ThingsResult<()> {
        let key = record_key(group_id, member_id);

        let mut result = self
            .db
            .query("DELETE type::record('group_membership', $key) RETURN BEFORE")
            .bind(("key", key.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::not_found("group_membership", &key).into());
        }

        Ok(())
    }

    async fn list_by_group(
        &self,
        group_id: Uuid,
        pagination: Pagination,
    ) -> ThingsResult<PaginatedResult<GroupMembership>> {
        let group_id_str = group_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM group_membership \
                 WHERE group_id = $group_id GROUP ALL",
            )
            .bind(("group_id", group_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT * FROM group_membership \
                 WHERE group_id = $group_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("group_id", group_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(MembershipRow::try_into_membership)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
