//! Organization domain model.
//!
//! Organizations are the top-level tenants of the things service. They own
//! groups, and their owner implicitly holds the owner role on every group
//! beneath the organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant that owns groups of things and profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    /// User that owns the organization.
    pub owner_id: Uuid,
    /// Human-readable name.
    pub name: String,
    pub description: String,
    /// Arbitrary key-value metadata.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
}

/// Caller request for a new organization; the caller becomes its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationRequest {
    pub name: String,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
}
