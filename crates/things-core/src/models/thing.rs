//! Thing domain model and authentication keys.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A device or client identity, authenticated by its secret key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thing {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    /// Primary authentication secret.
    pub key: String,
    /// Alternate secrets that identify the same thing.
    pub external_keys: Vec<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Thing {
    /// Every key that authenticates this thing, internal key first.
    pub fn keys(&self) -> Vec<ThingKey> {
        std::iter::once(ThingKey::internal(self.key.clone()))
            .chain(self.external_keys.iter().cloned().map(ThingKey::external))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateThing {
    pub group_id: Uuid,
    pub name: String,
    /// Generated when `None`.
    pub key: Option<String>,
    pub external_keys: Vec<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Internal,
    External,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Internal => "internal",
            KeyType::External => "external",
        }
    }
}

/// A typed authentication secret presented by a thing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ThingKey {
    pub key_type: KeyType,
    pub value: String,
}

impl ThingKey {
    pub fn internal(value: impl Into<String>) -> Self {
        Self {
            key_type: KeyType::Internal,
            value: value.into(),
        }
    }

    pub fn external(value: impl Into<String>) -> Self {
        Self {
            key_type: KeyType::External,
            value: value.into(),
        }
    }
}

impl fmt::Display for ThingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key_type.as_str(), self.value)
    }
}
