//! Domain events emitted after successful mutations.
//!
//! [`EventingService`] wraps any [`Service`](crate::Service) and hands an
//! [`Event`] to an [`EventPublisher`] once the wrapped operation succeeds.

mod eventing;
mod publisher;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use things_core::models::invite::InviteState;
use things_core::models::role::GroupRole;

pub use eventing::EventingService;
pub use publisher::{BroadcastPublisher, EventPublisher, NoopPublisher, RedisStreamPublisher};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Event {
    OrganizationCreated { org_id: Uuid, owner_id: Uuid },
    OrganizationRemoved { org_id: Uuid },

    GroupCreated { group_id: Uuid, org_id: Uuid },
    GroupUpdated { group_id: Uuid },
    GroupRemoved { group_id: Uuid },

    ProfilesCreated { profile_ids: Vec<Uuid> },
    ProfileRemoved { profile_id: Uuid },
    ThingsCreated { thing_ids: Vec<Uuid> },
    ThingRemoved { thing_id: Uuid },

    ThingsConnected { profile_id: Uuid, thing_ids: Vec<Uuid> },
    ThingsDisconnected { profile_id: Uuid, thing_ids: Vec<Uuid> },

    MembershipsCreated { group_id: Uuid, member_ids: Vec<Uuid> },
    MembershipUpdated { group_id: Uuid, member_id: Uuid, role: GroupRole },
    MembershipsRemoved { group_id: Uuid, member_ids: Vec<Uuid> },

    InviteCreated { invite_id: Uuid, group_id: Uuid },
    InviteAnswered { invite_id: Uuid, state: InviteState },
    InviteRevoked { invite_id: Uuid },
    DormantInvitesCreated { org_invite_id: Uuid, invite_ids: Vec<Uuid> },
    InvitesActivated { org_invite_id: Uuid, member_id: Uuid, invite_ids: Vec<Uuid> },
}

impl Event {
    /// Stable operation name, matching the serialized `operation` tag.
    pub fn operation(&self) -> &'static str {
        match self {
            Event::OrganizationCreated { .. } => "organization_created",
            Event::OrganizationRemoved { .. } => "organization_removed",
            Event::GroupCreated { .. } => "group_created",
            Event::GroupUpdated { .. } => "group_updated",
            Event::GroupRemoved { .. } => "group_removed",
            Event::ProfilesCreated { .. } => "profiles_created",
            Event::ProfileRemoved { .. } => "profile_removed",
            Event::ThingsCreated { .. } => "things_created",
            Event::ThingRemoved { .. } => "thing_removed",
            Event::ThingsConnected { .. } => "things_connected",
            Event::ThingsDisconnected { .. } => "things_disconnected",
            Event::MembershipsCreated { .. } => "memberships_created",
            Event::MembershipUpdated { .. } => "membership_updated",
            Event::MembershipsRemoved { .. } => "memberships_removed",
            Event::InviteCreated { .. } => "invite_created",
            Event::InviteAnswered { .. } => "invite_answered",
            Event::InviteRevoked { .. } => "invite_revoked",
            Event::DormantInvitesCreated { .. } => "dormant_invites_created",
            Event::InvitesActivated { .. } => "invites_activated",
        }
    }
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Event encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventsBackend {
    #[default]
    None,
    Broadcast,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub backend: EventsBackend,
    pub redis_url: String,
    /// Redis stream events are appended to.
    pub stream: String,
    /// Approximate stream length kept by `XADD MAXLEN ~`.
    pub stream_max_len: usize,
    /// Buffer of the in-process broadcast channel.
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            backend: EventsBackend::None,
            redis_url: "redis://127.0.0.1:6379/0".into(),
            stream: "things.events".into(),
            stream_max_len: 100_000,
            channel_capacity: 1024,
        }
    }
}
