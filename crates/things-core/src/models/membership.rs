//! Group membership domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::GroupRole;

/// A member's role within a group. Unique per `(group_id, member_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupMembership {
    pub group_id: Uuid,
    pub member_id: Uuid,
    pub role: GroupRole,
}

/// A member and the role to grant, as supplied by callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberRole {
    pub member_id: Uuid,
    pub role: GroupRole,
}
