//! Store traits
//!
//! The seams between the tracking core and whatever holds the authoritative
//! data. Implementations must serialize concurrent updates to the same
//! record id; `update_job` is compare-and-swap on the status the caller
//! validated against, so two actors racing the same transition cannot
//! silently overwrite each other's history entries.

use lablane_model::{Announcement, Job, JobStatus, User};

use crate::error::StoreError;
use crate::feed::ChangeFeed;

/// Persistence operations for jobs.
pub trait JobStore {
    /// All jobs, in stable id order.
    fn fetch_jobs(&self) -> Result<Vec<Job>, StoreError>;

    /// A single job by job number.
    fn fetch_job(&self, id: &str) -> Result<Job, StoreError>;

    /// Insert a new job. Fails with `DuplicateId` if the job number exists.
    fn insert_job(&self, job: Job) -> Result<Job, StoreError>;

    /// Replace a job, atomically per id.
    ///
    /// `expected_status` is the status of the snapshot the mutation was
    /// validated against; a mismatch fails with `Conflict` and applies
    /// nothing.
    fn update_job(&self, expected_status: JobStatus, job: Job) -> Result<Job, StoreError>;

    /// Administrative hard delete; not restricted by the state machine.
    fn delete_job(&self, id: &str) -> Result<(), StoreError>;
}

/// Persistence operations for user accounts.
pub trait UserStore {
    /// All accounts, in stable id order.
    fn fetch_users(&self) -> Result<Vec<User>, StoreError>;

    /// A single account by username.
    fn fetch_user(&self, username: &str) -> Result<User, StoreError>;

    /// Insert a new account. Fails with `DuplicateId` if the username is
    /// already taken.
    fn insert_user(&self, user: User) -> Result<User, StoreError>;

    /// Replace the opaque credential of an account. Role and username are
    /// immutable; this is the only supported account update.
    fn update_user_credential(&self, username: &str, credential: String)
        -> Result<User, StoreError>;

    /// Delete an account.
    fn delete_user(&self, username: &str) -> Result<(), StoreError>;
}

/// Persistence operations for announcements.
pub trait AnnouncementStore {
    /// All announcements, in stable id order.
    fn fetch_announcements(&self) -> Result<Vec<Announcement>, StoreError>;

    /// Insert a new announcement.
    fn insert_announcement(&self, announcement: Announcement) -> Result<Announcement, StoreError>;

    /// Delete an announcement.
    fn delete_announcement(&self, id: &str) -> Result<(), StoreError>;
}

/// Full collaborator surface: all three tables plus the change feed.
pub trait Store: JobStore + UserStore + AnnouncementStore {
    /// The feed mutations are announced on.
    fn feed(&self) -> &ChangeFeed;
}
