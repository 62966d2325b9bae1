//! User accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, Role};

/// A user account.
///
/// The credential is opaque to the tracking core; the account service in the
/// `lablane` crate derives and verifies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Stable account identifier (uuid)
    pub id: String,

    /// Login name, unique across accounts
    pub username: String,

    /// Role; immutable once assigned
    pub role: Role,

    /// Opaque credential material
    pub credential: String,

    /// Branch membership for Branch users
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,

    /// Branch display name for Branch users
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The actor identity this account acts as.
    pub fn actor(&self) -> Actor {
        Actor {
            username: self.username.clone(),
            role: self.role,
            branch_id: self.branch_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_actor_from_user() {
        let user = User {
            id: "u-1".to_string(),
            username: "centro".to_string(),
            role: Role::Branch,
            credential: "opaque".to_string(),
            branch_id: Some("branch-01".to_string()),
            branch_name: Some("Centro".to_string()),
            created_at: Utc.timestamp_opt(1_000, 0).unwrap(),
        };

        let actor = user.actor();
        assert_eq!(actor.username, "centro");
        assert_eq!(actor.role, Role::Branch);
        assert_eq!(actor.branch_id.as_deref(), Some("branch-01"));
    }
}
