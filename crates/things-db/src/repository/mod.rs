//! SurrealDB repository implementations.

mod connection;
mod group;
mod invite;
mod membership;
mod organization;
mod profile;
mod thing;

pub use connection::SurrealConnectionRepository;
pub use group::SurrealGroupRepository;
pub use invite::SurrealGroupInviteRepository;
pub use membership::SurrealGroupMembershipRepository;
pub use organization::SurrealOrganizationRepository;
pub use profile::SurrealProfileRepository;
pub use thing::SurrealThingRepository;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

/// Parse a stored UUID string.
pub(crate) fn parse_id(value: &str, field: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

pub(crate) fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}
