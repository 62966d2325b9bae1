//! Job intake
//!
//! A branch opens a job by assigning it a job number and describing the
//! work. The engine validates shape and authority; uniqueness of the job
//! number is enforced by the store on insert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lablane_model::{Actor, Job, JobHistory, JobStatus, Priority};

use crate::authority::capability_for;

/// Errors rejecting a job draft.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("job number must not be empty")]
    EmptyId,

    #[error("job draft requires branch id and branch name")]
    MissingBranch,

    #[error("actor '{username}' may not create jobs for branch '{branch_id}'")]
    Forbidden { username: String, branch_id: String },
}

/// The fields a branch supplies when opening a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDraft {
    /// Job number; unique, assigned by the branch
    pub id: String,

    /// Free-text description; may be empty
    #[serde(default)]
    pub description: String,

    /// Originating branch
    pub branch_id: String,

    /// Originating branch display name
    pub branch_name: String,
}

/// Validate a draft and produce the new job.
///
/// The job starts at PENDING_IN_BRANCH with NORMAL priority, an empty
/// priority message, and a single seed history entry recorded by the
/// creating actor. The job number is trimmed before use.
pub fn create_job(draft: JobDraft, actor: &Actor, now: DateTime<Utc>) -> Result<Job, IntakeError> {
    let id = draft.id.trim().to_string();
    if id.is_empty() {
        return Err(IntakeError::EmptyId);
    }
    if draft.branch_id.trim().is_empty() || draft.branch_name.trim().is_empty() {
        return Err(IntakeError::MissingBranch);
    }

    if !capability_for(actor).can_create_for(&draft.branch_id) {
        return Err(IntakeError::Forbidden {
            username: actor.username.clone(),
            branch_id: draft.branch_id,
        });
    }

    Ok(Job {
        id,
        description: draft.description,
        branch_id: draft.branch_id,
        branch_name: draft.branch_name,
        status: JobStatus::INITIAL,
        priority: Priority::Normal,
        priority_message: String::new(),
        created_at: now,
        updated_at: now,
        history: JobHistory::seeded(JobStatus::INITIAL, actor.username.clone(), now),
    })
}
