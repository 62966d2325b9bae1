//! Bulk transitions with per-job outcome reporting
//!
//! A bulk request applies the single-job rule independently to each job;
//! jobs that fail validation are skipped, never aborting the batch. The
//! report distinguishes fully applied, partially applied, and none applied,
//! and lists every rejected id with its typed reason.

use chrono::{DateTime, Utc};
use lablane_model::{Actor, Job, JobStatus};
use lablane_store::StoreError;

use super::transition::request_transition;
use super::LifecycleError;

/// Why one job in a bulk request was skipped.
#[derive(Debug, thiserror::Error)]
pub enum BulkRejectionError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Store-side failure while applying an already-validated job
    /// (missing id, concurrent modification).
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One skipped job and its reason.
#[derive(Debug)]
pub struct BulkRejection {
    /// Job the rejection refers to
    pub job_id: String,
    /// Typed reason
    pub error: BulkRejectionError,
}

/// Aggregate outcome of a bulk transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOutcome {
    /// Every job in the request was transitioned
    FullyApplied,
    /// Some jobs were transitioned, some rejected
    PartiallyApplied,
    /// No job was transitioned
    NoneApplied,
}

/// Result of a bulk transition request.
#[derive(Debug, Default)]
pub struct BulkTransitionReport {
    /// Updated jobs, in request order
    pub applied: Vec<Job>,
    /// Skipped jobs with their reasons, in request order
    pub rejected: Vec<BulkRejection>,
}

impl BulkTransitionReport {
    /// Empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully transitioned job.
    pub fn accept(&mut self, job: Job) {
        self.applied.push(job);
    }

    /// Record a skipped job.
    pub fn reject(&mut self, job_id: impl Into<String>, error: BulkRejectionError) {
        self.rejected.push(BulkRejection {
            job_id: job_id.into(),
            error,
        });
    }

    /// Number of transitioned jobs.
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Number of skipped jobs.
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// True when nothing was rejected.
    pub fn all_applied(&self) -> bool {
        self.rejected.is_empty()
    }

    /// Classify the batch outcome. An empty request counts as fully
    /// applied: there was nothing to reject.
    pub fn outcome(&self) -> BulkOutcome {
        if self.rejected.is_empty() {
            BulkOutcome::FullyApplied
        } else if self.applied.is_empty() {
            BulkOutcome::NoneApplied
        } else {
            BulkOutcome::PartiallyApplied
        }
    }

    /// Human-readable one-liner.
    pub fn summary(&self) -> String {
        let total = self.applied.len() + self.rejected.len();
        let mut parts = Vec::new();
        if !self.applied.is_empty() {
            parts.push(format!("{} applied", self.applied.len()));
        }
        if !self.rejected.is_empty() {
            parts.push(format!("{} rejected", self.rejected.len()));
        }
        if parts.is_empty() {
            parts.push("nothing to do".to_string());
        }
        format!("{} ({} total)", parts.join(", "), total)
    }
}

/// Apply the single-job transition rule independently to each job.
///
/// Pure counterpart of [`crate::Tracker::bulk_transition`]: validation
/// only, no persistence. The caller persists each applied job atomically
/// per id.
pub fn request_bulk_transition(
    jobs: &[Job],
    target: JobStatus,
    actor: &Actor,
    now: DateTime<Utc>,
) -> BulkTransitionReport {
    let mut report = BulkTransitionReport::new();

    for job in jobs {
        match request_transition(job, target, actor, now) {
            Ok(updated) => report.accept(updated),
            Err(err) => report.reject(job.id.clone(), err.into()),
        }
    }

    report
}
