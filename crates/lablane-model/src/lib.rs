//! Lablane Entity Types
//!
//! Shared data model for the order-tracking core: jobs and their lifecycle
//! status, acting users and roles, and announcements. These types are pure
//! data plus the status state machine; authority checks and projections live
//! in the `lablane` crate, persistence in `lablane-store`.

pub mod actor;
pub mod announcement;
pub mod job;
pub mod status;
pub mod user;

pub use actor::{Actor, ParseRoleError, Role};
pub use announcement::Announcement;
pub use job::{HistoryEntry, Job, JobHistory, ParsePriorityError, Priority};
pub use status::{JobStatus, ParseStatusError, TerminalState};
pub use user::User;

use chrono::{DateTime, Utc};

/// Get the current UTC timestamp.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
