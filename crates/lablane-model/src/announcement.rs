//! Announcements
//!
//! Admin-posted notices shown on every dashboard. Create and delete only;
//! there is no edit operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A posted announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    /// Stable identifier (ulid, sorts by creation time)
    pub id: String,

    /// Notice text
    pub message: String,

    /// When the announcement was posted
    pub created_at: DateTime<Utc>,
}
