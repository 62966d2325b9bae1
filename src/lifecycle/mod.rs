//! Job lifecycle engine
//!
//! Validated status transitions, bulk application with per-job outcome
//! reporting, and the priority side-channel. All functions here are pure:
//! they take a job snapshot and return the updated job (or a typed
//! rejection) without touching persistence. Every rejection names the
//! offending job id.

mod bulk;
mod priority;
mod transition;

pub use bulk::{
    request_bulk_transition, BulkOutcome, BulkRejection, BulkRejectionError, BulkTransitionReport,
};
pub use priority::set_priority;
pub use transition::request_transition;

use lablane_model::{JobStatus, Role};

/// Rejections produced by lifecycle validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("job '{job_id}': transition {from} → {to} is not allowed for role {role}")]
    InvalidTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
        role: Role,
    },

    #[error("job '{job_id}' has been returned to the branch ({status}) and can no longer change")]
    TerminalState { job_id: String, status: JobStatus },

    #[error("actor '{username}' has no authority over job '{job_id}'")]
    Forbidden { job_id: String, username: String },
}

impl LifecycleError {
    /// The job the rejection refers to.
    pub fn job_id(&self) -> &str {
        match self {
            LifecycleError::InvalidTransition { job_id, .. } => job_id,
            LifecycleError::TerminalState { job_id, .. } => job_id,
            LifecycleError::Forbidden { job_id, .. } => job_id,
        }
    }
}
