//! Account and Announcement Tests
//!
//! Admin-only management surface: account CRUD with credential derivation,
//! role immutability by construction, and announcement post/list/delete.

use std::sync::Arc;

use lablane::{Actor, Credential, MemoryStore, NewAccount, Role, Tracker, TrackerError};

fn tracker() -> Tracker<MemoryStore> {
    Tracker::new(Arc::new(MemoryStore::new()))
}

fn admin() -> Actor {
    Actor::admin("root")
}

fn lab_account() -> NewAccount {
    NewAccount {
        username: "lab-01".to_string(),
        password: "hunter2".to_string(),
        role: Role::Lab,
        branch_id: None,
        branch_name: None,
    }
}

// =============================================================================
// Accounts
// =============================================================================

#[test]
fn test_create_and_list_accounts() {
    let tracker = tracker();
    let user = tracker.create_account(lab_account(), &admin()).unwrap();

    assert_eq!(user.username, "lab-01");
    assert_eq!(user.role, Role::Lab);
    // The stored credential is derived, never the raw password
    assert_ne!(user.credential, "hunter2");
    assert!(Credential::verify("hunter2", &user.credential));

    let users = tracker.users(&admin()).unwrap();
    assert_eq!(users.len(), 1);
}

#[test]
fn test_duplicate_username_rejected() {
    let tracker = tracker();
    tracker.create_account(lab_account(), &admin()).unwrap();

    let err = tracker.create_account(lab_account(), &admin()).unwrap_err();
    assert!(err.is_duplicate());
}

#[test]
fn test_only_admin_manages_accounts() {
    let tracker = tracker();
    let lab = Actor::lab("lab");

    assert!(matches!(
        tracker.create_account(lab_account(), &lab).unwrap_err(),
        TrackerError::Forbidden { .. }
    ));
    assert!(matches!(
        tracker.users(&lab).unwrap_err(),
        TrackerError::Forbidden { .. }
    ));
    assert!(matches!(
        tracker.delete_account("lab-01", &lab).unwrap_err(),
        TrackerError::Forbidden { .. }
    ));
}

#[test]
fn test_password_update_by_admin_and_self() {
    let tracker = tracker();
    tracker.create_account(lab_account(), &admin()).unwrap();

    // Admin resets it
    let user = tracker
        .update_password("lab-01", "resetme", &admin())
        .unwrap();
    assert!(Credential::verify("resetme", &user.credential));
    assert!(!Credential::verify("hunter2", &user.credential));

    // The user changes its own
    let me = Actor::lab("lab-01");
    let user = tracker.update_password("lab-01", "my-own", &me).unwrap();
    assert!(Credential::verify("my-own", &user.credential));

    // Another non-admin cannot
    let other = Actor::lab("lab-02");
    assert!(matches!(
        tracker.update_password("lab-01", "nope", &other).unwrap_err(),
        TrackerError::Forbidden { .. }
    ));
}

#[test]
fn test_role_change_is_delete_and_recreate() {
    let tracker = tracker();
    tracker.create_account(lab_account(), &admin()).unwrap();

    // No role-update operation exists; the path is delete + recreate.
    tracker.delete_account("lab-01", &admin()).unwrap();
    let recreated = tracker
        .create_account(
            NewAccount {
                username: "lab-01".to_string(),
                password: "hunter2".to_string(),
                role: Role::Admin,
                branch_id: None,
                branch_name: None,
            },
            &admin(),
        )
        .unwrap();
    assert_eq!(recreated.role, Role::Admin);
}

#[test]
fn test_branch_account_requires_branch_identity() {
    let tracker = tracker();
    let err = tracker
        .create_account(
            NewAccount {
                username: "centro".to_string(),
                password: "pw".to_string(),
                role: Role::Branch,
                branch_id: None,
                branch_name: None,
            },
            &admin(),
        )
        .unwrap_err();
    assert!(matches!(err, TrackerError::Account(_)));
}

// =============================================================================
// Announcements
// =============================================================================

#[test]
fn test_post_list_delete_announcements() {
    let tracker = tracker();

    tracker.post_announcement("closed friday", &admin()).unwrap();
    let second = tracker
        .post_announcement("new price list", &admin())
        .unwrap();

    let list = tracker.announcements().unwrap();
    assert_eq!(list.len(), 2);

    tracker.delete_announcement(&second.id, &admin()).unwrap();
    let list = tracker.announcements().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].message, "closed friday");
}

#[test]
fn test_announcements_visible_to_everyone() {
    let tracker = tracker();
    tracker.post_announcement("closed friday", &admin()).unwrap();

    // Listing needs no role; posting does
    assert_eq!(tracker.announcements().unwrap().len(), 1);
    assert!(matches!(
        tracker
            .post_announcement("nope", &Actor::lab("lab"))
            .unwrap_err(),
        TrackerError::Forbidden { .. }
    ));
}

#[test]
fn test_blank_announcement_rejected() {
    let tracker = tracker();
    let err = tracker.post_announcement("   ", &admin()).unwrap_err();
    assert!(matches!(err, TrackerError::Announce(_)));
}

#[test]
fn test_delete_missing_announcement_not_found() {
    let tracker = tracker();
    let err = tracker
        .delete_announcement("01JUNKID", &admin())
        .unwrap_err();
    assert!(err.is_not_found());
}
