//! Thing to profile wiring.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A thing's current profile. A thing has at most one connection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Connection {
    pub thing_id: Uuid,
    pub profile_id: Uuid,
}

/// Publish configuration resolved from a thing key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubConfInfo {
    pub publisher_id: Uuid,
    pub profile_id: Uuid,
    pub profile_config: serde_json::Value,
}
