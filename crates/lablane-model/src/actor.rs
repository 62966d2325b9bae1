//! Acting identities
//!
//! An [`Actor`] is the identity a request runs as: a username plus role, and
//! for branch users the branch they belong to. What an actor may do to a
//! given job is decided by the capability layer in the `lablane` crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a user account.
///
/// Role is immutable once assigned; changing it means deleting and
/// recreating the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Oversees accounts, announcements, and all jobs; may override status
    Admin,
    /// Branch store; creates jobs and dispatches them to the lab
    Branch,
    /// Processing lab; receives, completes, and returns jobs
    Lab,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Branch => write!(f, "branch"),
            Role::Lab => write!(f, "lab"),
        }
    }
}

/// Error for parsing a role from its wire name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown role: '{0}'")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "branch" => Ok(Role::Branch),
            "lab" => Ok(Role::Lab),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// The identity a request is performed as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Username recorded in job history entries
    pub username: String,
    /// Role deciding transition and annotation authority
    pub role: Role,
    /// Branch this actor belongs to; set for Branch users only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
}

impl Actor {
    /// Create an admin actor.
    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::Admin,
            branch_id: None,
        }
    }

    /// Create a branch actor tied to its branch.
    pub fn branch(username: impl Into<String>, branch_id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::Branch,
            branch_id: Some(branch_id.into()),
        }
    }

    /// Create a lab actor.
    pub fn lab(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::Lab,
            branch_id: None,
        }
    }
}
