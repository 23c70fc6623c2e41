//! Profile domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named publish configuration that things are connected to.
///
/// The `config` document is opaque to this crate; message transformers read
/// it through [`PubConfInfo`](crate::models::connection::PubConfInfo).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub config: serde_json::Value,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfile {
    pub group_id: Uuid,
    pub name: String,
    pub config: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
}
