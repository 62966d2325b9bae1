//! Announcements
//!
//! Admin-posted notices. Create and delete only; listing is newest-first.

use chrono::{DateTime, Utc};

use lablane_model::Announcement;

/// Errors rejecting an announcement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnounceError {
    #[error("announcement message must not be empty")]
    EmptyMessage,
}

/// Validate and build a new announcement.
pub fn compose(message: &str, now: DateTime<Utc>) -> Result<Announcement, AnnounceError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AnnounceError::EmptyMessage);
    }
    Ok(Announcement {
        id: ulid::Ulid::new().to_string(),
        message: message.to_string(),
        created_at: now,
    })
}

/// Order announcements newest-first for display.
pub fn newest_first(announcements: &mut [Announcement]) {
    announcements.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
