//! Job entity and its append-only status history
//!
//! A job is the unit of work tracked through the lab pipeline. The job
//! number (`id`) is assigned by the creating branch and never changes, as do
//! `branch_id`/`branch_name`. Status moves only through validated
//! transitions; every transition appends one history entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::status::{JobStatus, TerminalState};

/// Priority attached to a job, independent of its lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Normal turnaround
    #[default]
    Normal,
    /// Rush order, jumps the queue at the lab
    Urgent,
    /// Remake of a previously delivered job
    Repetition,
}

impl Priority {
    /// Priorities other than NORMAL carry an annotation message.
    pub fn carries_message(&self) -> bool {
        !matches!(self, Priority::Normal)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Normal => write!(f, "NORMAL"),
            Priority::Urgent => write!(f, "URGENT"),
            Priority::Repetition => write!(f, "REPETITION"),
        }
    }
}

/// Error for parsing a priority from its wire name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown priority: '{0}'")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NORMAL" => Ok(Priority::Normal),
            "URGENT" => Ok(Priority::Urgent),
            "REPETITION" => Ok(Priority::Repetition),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

/// One status change in a job's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Status the job entered
    pub status: JobStatus,
    /// Username of the actor who performed the transition
    pub updated_by: String,
    /// When the transition was applied
    pub timestamp: DateTime<Utc>,
}

/// Append-only ordered sequence of status changes.
///
/// Past entries are never edited or removed; the only mutation is `record`.
/// The current job status always equals the status of the last entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHistory(Vec<HistoryEntry>);

impl JobHistory {
    /// Start a history with its seed entry (job creation).
    pub fn seeded(status: JobStatus, updated_by: impl Into<String>, at: DateTime<Utc>) -> Self {
        let mut history = Self::default();
        history.record(status, updated_by, at);
        history
    }

    /// Append one entry. This is the sole mutation on a history.
    pub fn record(&mut self, status: JobStatus, updated_by: impl Into<String>, at: DateTime<Utc>) {
        self.0.push(HistoryEntry {
            status,
            updated_by: updated_by.into(),
            timestamp: at,
        });
    }

    /// The most recent entry, if any.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.0.last()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a freshly-deserialized empty history.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.0.iter()
    }

    /// Check that timestamps never decrease along the trail.
    pub fn is_chronological(&self) -> bool {
        self.0.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
    }
}

/// A tracked lab job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job number assigned by the creating branch; stable identifier
    pub id: String,

    /// Free-text description of the work (lens type, treatments, ...)
    #[serde(default)]
    pub description: String,

    /// Identifier of the originating branch; immutable after creation
    pub branch_id: String,

    /// Display name of the originating branch; immutable after creation
    pub branch_name: String,

    /// Current lifecycle status
    pub status: JobStatus,

    /// Priority flag, independent of status
    #[serde(default)]
    pub priority: Priority,

    /// Annotation accompanying a non-NORMAL priority
    #[serde(default)]
    pub priority_message: String,

    /// When the job was created
    pub created_at: DateTime<Utc>,

    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,

    /// Append-only audit trail; one entry per status transition
    pub history: JobHistory,
}

impl Job {
    /// A job is historical once lab work is done (COMPLETED or
    /// SENT_TO_BRANCH); otherwise it is active in the pipeline.
    pub fn is_historical(&self) -> bool {
        self.status.is_historical()
    }

    /// True once the job has reached the terminal SENT_TO_BRANCH state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check the core invariant: current status equals the status of the
    /// last history entry, and the trail is chronological.
    pub fn history_is_consistent(&self) -> bool {
        self.history
            .last()
            .is_some_and(|entry| entry.status == self.status)
            && self.history.is_chronological()
    }
}
