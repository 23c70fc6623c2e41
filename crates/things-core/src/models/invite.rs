//! Group invite domain model and its state machine.
//!
//! An invite starts `Pending` and moves exactly once to one of the terminal
//! states. Expiry is passive: a pending invite whose `expires_at` has passed
//! is treated as expired whenever it is read or activated, and is persisted
//! as `Expired` at that moment.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::GroupRole;
use crate::error::ThingsError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InviteState {
    Pending,
    Expired,
    Revoked,
    Accepted,
    Declined,
}

impl InviteState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteState::Pending => "pending",
            InviteState::Expired => "expired",
            InviteState::Revoked => "revoked",
            InviteState::Accepted => "accepted",
            InviteState::Declined => "declined",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, InviteState::Pending)
    }

    /// Only pending invites move, and never back to pending.
    pub fn can_transition_to(&self, next: InviteState) -> bool {
        *self == InviteState::Pending && next != InviteState::Pending
    }
}

impl fmt::Display for InviteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InviteState {
    type Err = ThingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InviteState::Pending),
            "expired" => Ok(InviteState::Expired),
            "revoked" => Ok(InviteState::Revoked),
            "accepted" => Ok(InviteState::Accepted),
            "declined" => Ok(InviteState::Declined),
            other => Err(ThingsError::malformed(format!(
                "unknown invite state: {other}"
            ))),
        }
    }
}

/// An invitation to join a group with a given role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInvite {
    pub id: Uuid,
    pub group_id: Uuid,
    /// `None` while the invitee is only known by email.
    pub invitee_id: Option<Uuid>,
    pub invitee_email: String,
    pub inviter_id: Uuid,
    pub invitee_role: GroupRole,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub state: InviteState,
}

impl GroupInvite {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// State as observed at `now`, applying passive expiry.
    pub fn state_at(&self, now: DateTime<Utc>) -> InviteState {
        if self.state == InviteState::Pending && self.is_expired_at(now) {
            InviteState::Expired
        } else {
            self.state
        }
    }

    /// Whether this invite addresses the given user id or email.
    pub fn targets(&self, invitee_id: Option<Uuid>, invitee_email: &str) -> bool {
        let by_id = matches!((self.invitee_id, invitee_id), (Some(a), Some(b)) if a == b);
        by_id || self.invitee_email.eq_ignore_ascii_case(invitee_email)
    }
}

/// Store input for a new invite. The coordinator fills in `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupInvite {
    pub group_id: Uuid,
    pub invitee_id: Option<Uuid>,
    pub invitee_email: String,
    pub inviter_id: Uuid,
    pub invitee_role: GroupRole,
    pub expires_at: DateTime<Utc>,
}

/// Caller request for a direct group invite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInviteRequest {
    pub group_id: Uuid,
    pub invitee_id: Option<Uuid>,
    pub invitee_email: String,
    pub role: GroupRole,
}

/// One group and role bundled into an organization invite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupGrant {
    pub group_id: Uuid,
    pub role: GroupRole,
}

/// Dormant group invites issued alongside an organization invite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DormantInviteRequest {
    pub org_invite_id: Uuid,
    pub invitee_id: Option<Uuid>,
    pub invitee_email: String,
    pub grants: Vec<GroupGrant>,
}

/// Outcome of activating the dormant invites of one organization invite.
///
/// Activation never rolls back: each invite lands in exactly one bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivationSummary {
    /// Invites turned into memberships by this call.
    pub activated: Vec<Uuid>,
    /// Invites found past their deadline and marked expired.
    pub expired: Vec<Uuid>,
    /// Invites already resolved, or addressed to another user.
    pub skipped: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invite(state: InviteState, expires_in: Duration) -> GroupInvite {
        let now = Utc::now();
        GroupInvite {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            invitee_id: None,
            invitee_email: "bob@example.com".into(),
            inviter_id: Uuid::new_v4(),
            invitee_role: GroupRole::Editor,
            created_at: now,
            expires_at: now + expires_in,
            state,
        }
    }

    #[test]
    fn only_pending_transitions() {
        assert!(InviteState::Pending.can_transition_to(InviteState::Accepted));
        assert!(InviteState::Pending.can_transition_to(InviteState::Expired));
        assert!(!InviteState::Pending.can_transition_to(InviteState::Pending));
        assert!(!InviteState::Accepted.can_transition_to(InviteState::Declined));
        assert!(!InviteState::Expired.can_transition_to(InviteState::Accepted));
    }

    #[test]
    fn pending_past_deadline_reads_as_expired() {
        let now = Utc::now();
        let stale = invite(InviteState::Pending, Duration::seconds(-1));
        assert_eq!(stale.state_at(now), InviteState::Expired);

        let fresh = invite(InviteState::Pending, Duration::hours(1));
        assert_eq!(fresh.state_at(now), InviteState::Pending);

        // Terminal states are reported as stored.
        let accepted = invite(InviteState::Accepted, Duration::seconds(-1));
        assert_eq!(accepted.state_at(now), InviteState::Accepted);
    }

    #[test]
    fn targets_matches_email_case_insensitively() {
        let inv = invite(InviteState::Pending, Duration::hours(1));
        assert!(inv.targets(None, "BOB@example.com"));
        assert!(!inv.targets(Some(Uuid::new_v4()), "carol@example.com"));
    }
}
