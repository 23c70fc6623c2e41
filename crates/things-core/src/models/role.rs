//! Group roles and the actions they permit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ThingsError;

/// Role held by a member within a group.
///
/// Variants are declared in rank order, so the derived `Ord` gives
/// `Viewer < Editor < Owner`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Viewer,
    Editor,
    Owner,
}

impl GroupRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRole::Viewer => "viewer",
            GroupRole::Editor => "editor",
            GroupRole::Owner => "owner",
        }
    }

    /// Whether this role is ranked high enough to perform `action`.
    pub fn permits(&self, action: Action) -> bool {
        *self >= action.required_role()
    }
}

impl fmt::Display for GroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupRole {
    type Err = ThingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(GroupRole::Viewer),
            "editor" => Ok(GroupRole::Editor),
            "owner" => Ok(GroupRole::Owner),
            other => Err(ThingsError::malformed(format!("unknown group role: {other}"))),
        }
    }
}

/// Operation a principal wants to perform on a group-scoped resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Write,
    Delete,
    ManageMembers,
    TransferOwnership,
}

impl Action {
    /// Minimum role that satisfies this action.
    pub fn required_role(&self) -> GroupRole {
        match self {
            Action::Read => GroupRole::Viewer,
            Action::Write | Action::Delete => GroupRole::Editor,
            Action::ManageMembers | Action::TransferOwnership => GroupRole::Owner,
        }
    }

    /// Destructive actions are always decided on store state, never on
    /// cached ancestry or roles.
    pub fn is_destructive(&self) -> bool {
        !matches!(self, Action::Read | Action::Write)
    }
}
