//! Account management
//!
//! Validates new accounts and derives the opaque credential stored with
//! them. Role is immutable by construction: there is no update path for it,
//! changing a role means deleting and recreating the account.
//!
//! Credential format: `v1$<base64 salt>$<hex sha256(salt || password)>`.
//! The engine and stores treat the string as opaque; only this module
//! derives and verifies it.

use chrono::{DateTime, Utc};
use rand::RngCore;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use lablane_model::{Role, User};

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// Credential scheme tag.
const SCHEME: &str = "v1";

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Lowercase alphanumeric, dot, dash, underscore; 3..=32 chars
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9._-]{2,31}$").unwrap())
}

/// Errors rejecting an account request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("invalid username '{0}': use 3-32 lowercase letters, digits, '.', '-' or '_'")]
    InvalidUsername(String),

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("branch accounts require branch id and branch name")]
    MissingBranch,

    #[error("only branch accounts carry a branch identity")]
    UnexpectedBranch,
}

/// Opaque credential derivation and verification.
pub struct Credential;

impl Credential {
    /// Derive a fresh credential for a password, with a random salt.
    pub fn derive(password: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::derive_with_salt(password, &salt)
    }

    fn derive_with_salt(password: &str, salt: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        let digest = hasher.finalize();
        format!("{}${}${}", SCHEME, BASE64.encode(salt), hex::encode(digest))
    }

    /// Check a password against a stored credential.
    ///
    /// Unknown schemes and malformed credentials verify as false.
    pub fn verify(password: &str, credential: &str) -> bool {
        let mut parts = credential.splitn(3, '$');
        let (Some(scheme), Some(salt_b64), Some(_)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        if scheme != SCHEME {
            return false;
        }
        let Ok(salt) = BASE64.decode(salt_b64) else {
            return false;
        };
        Self::derive_with_salt(password, &salt) == credential
    }
}

/// A requested new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    /// Login name
    pub username: String,
    /// Initial password; hashed into the stored credential
    pub password: String,
    /// Immutable role
    pub role: Role,
    /// Branch identity, required for Branch accounts
    #[serde(default)]
    pub branch_id: Option<String>,
    /// Branch display name, required for Branch accounts
    #[serde(default)]
    pub branch_name: Option<String>,
}

/// Validate a request and build the account record.
///
/// Uniqueness of the username is enforced by the store on insert.
pub fn build_user(account: NewAccount, now: DateTime<Utc>) -> Result<User, AccountError> {
    if !username_pattern().is_match(&account.username) {
        return Err(AccountError::InvalidUsername(account.username));
    }
    if account.password.is_empty() {
        return Err(AccountError::EmptyPassword);
    }
    match account.role {
        Role::Branch => {
            if account.branch_id.as_deref().map_or(true, str::is_empty)
                || account.branch_name.as_deref().map_or(true, str::is_empty)
            {
                return Err(AccountError::MissingBranch);
            }
        }
        Role::Admin | Role::Lab => {
            if account.branch_id.is_some() || account.branch_name.is_some() {
                return Err(AccountError::UnexpectedBranch);
            }
        }
    }

    Ok(User {
        id: uuid::Uuid::new_v4().to_string(),
        username: account.username,
        role: account.role,
        credential: Credential::derive(&account.password),
        branch_id: account.branch_id,
        branch_name: account.branch_name,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_000, 0).unwrap()
    }

    fn lab_account(username: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            password: "hunter2".to_string(),
            role: Role::Lab,
            branch_id: None,
            branch_name: None,
        }
    }

    #[test]
    fn test_build_lab_user() {
        let user = build_user(lab_account("lab-01"), now()).unwrap();
        assert_eq!(user.username, "lab-01");
        assert_eq!(user.role, Role::Lab);
        assert!(user.branch_id.is_none());
        assert!(Credential::verify("hunter2", &user.credential));
    }

    #[test]
    fn test_username_rules() {
        for bad in ["ab", "UPPER", "with space", "", "-leading", "über"] {
            let err = build_user(lab_account(bad), now()).unwrap_err();
            assert!(
                matches!(err, AccountError::InvalidUsername(_)),
                "username '{bad}' should be rejected"
            );
        }
        for good in ["abc", "lab-01", "centro.norte", "a23456789_b"] {
            assert!(build_user(lab_account(good), now()).is_ok(), "'{good}'");
        }
    }

    #[test]
    fn test_empty_password_rejected() {
        let mut account = lab_account("lab-01");
        account.password = String::new();
        assert_eq!(build_user(account, now()).unwrap_err(), AccountError::EmptyPassword);
    }

    #[test]
    fn test_branch_requires_branch_identity() {
        let account = NewAccount {
            username: "centro".to_string(),
            password: "pw".to_string(),
            role: Role::Branch,
            branch_id: Some("branch-01".to_string()),
            branch_name: None,
        };
        assert_eq!(build_user(account, now()).unwrap_err(), AccountError::MissingBranch);
    }

    #[test]
    fn test_non_branch_rejects_branch_identity() {
        let mut account = lab_account("lab-01");
        account.branch_id = Some("branch-01".to_string());
        assert_eq!(
            build_user(account, now()).unwrap_err(),
            AccountError::UnexpectedBranch
        );
    }

    #[test]
    fn test_credential_salted() {
        let a = Credential::derive("same-password");
        let b = Credential::derive("same-password");
        assert_ne!(a, b);
        assert!(Credential::verify("same-password", &a));
        assert!(Credential::verify("same-password", &b));
        assert!(!Credential::verify("other", &a));
    }

    #[test]
    fn test_malformed_credential_never_verifies() {
        assert!(!Credential::verify("pw", "plaintext"));
        assert!(!Credential::verify("pw", "v0$AAAA$00"));
        assert!(!Credential::verify("pw", "v1$not base64!$00"));
    }
}
