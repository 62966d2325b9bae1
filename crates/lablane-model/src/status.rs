//! Job status state machine
//!
//! Pipeline order: PENDING_IN_BRANCH → SENT_TO_LAB → RECEIVED_BY_LAB →
//! COMPLETED → SENT_TO_BRANCH. The terminal state is SENT_TO_BRANCH.
//!
//! This module encodes the status chain itself; which *role* may walk a
//! given edge is decided by the capability layer in the `lablane` crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Job lifecycle status.
///
/// Variant order is pipeline order; the derived `Ord` follows it, so grouped
/// views iterate stations in the order work flows through them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Created by a branch store, not yet handed to the lab courier
    PendingInBranch,
    /// In transit from the branch to the lab
    SentToLab,
    /// Checked in at the lab, work in progress
    ReceivedByLab,
    /// Lab work finished, awaiting return dispatch
    Completed,
    /// Returned to the originating branch (terminal)
    SentToBranch,
}

/// Check if a state is terminal (no further transitions possible)
pub trait TerminalState {
    fn is_terminal(&self) -> bool;
}

impl TerminalState for JobStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::SentToBranch)
    }
}

impl JobStatus {
    /// All statuses in pipeline order.
    pub const ALL: [JobStatus; 5] = [
        JobStatus::PendingInBranch,
        JobStatus::SentToLab,
        JobStatus::ReceivedByLab,
        JobStatus::Completed,
        JobStatus::SentToBranch,
    ];

    /// The sole initial status assigned at job creation.
    pub const INITIAL: JobStatus = JobStatus::PendingInBranch;

    /// The next status along the pipeline, or `None` from the terminal state.
    pub fn next(&self) -> Option<JobStatus> {
        match self {
            JobStatus::PendingInBranch => Some(JobStatus::SentToLab),
            JobStatus::SentToLab => Some(JobStatus::ReceivedByLab),
            JobStatus::ReceivedByLab => Some(JobStatus::Completed),
            JobStatus::Completed => Some(JobStatus::SentToBranch),
            JobStatus::SentToBranch => None,
        }
    }

    /// Check if `target` is the single legal forward step from this status.
    ///
    /// No backward transitions, no skipping states, no self-transitions.
    pub fn can_step_to(&self, target: JobStatus) -> bool {
        self.next() == Some(target)
    }

    /// A job is historical once it reaches COMPLETED; before that it is
    /// active in the pipeline.
    pub fn is_historical(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::SentToBranch)
    }
}

impl fmt::Display for JobStatus {
    // Display matches the serde wire form
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::PendingInBranch => write!(f, "PENDING_IN_BRANCH"),
            JobStatus::SentToLab => write!(f, "SENT_TO_LAB"),
            JobStatus::ReceivedByLab => write!(f, "RECEIVED_BY_LAB"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::SentToBranch => write!(f, "SENT_TO_BRANCH"),
        }
    }
}

/// Error for parsing a status from its wire name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown job status: '{0}'")]
pub struct ParseStatusError(pub String);

impl FromStr for JobStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "PENDING_IN_BRANCH" => Ok(JobStatus::PendingInBranch),
            "SENT_TO_LAB" => Ok(JobStatus::SentToLab),
            "RECEIVED_BY_LAB" => Ok(JobStatus::ReceivedByLab),
            "COMPLETED" => Ok(JobStatus::Completed),
            "SENT_TO_BRANCH" => Ok(JobStatus::SentToBranch),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}
