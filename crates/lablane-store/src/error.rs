//! Store error types

use lablane_model::JobStatus;

use crate::feed::Table;

/// Errors surfaced by the persistence collaborator.
///
/// `DuplicateId`, `NotFound`, and `Conflict` are part of the tracking
/// contract; `Io`/`Json` are opaque persistence failures the caller decides
/// to retry or report.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate id '{id}' in {table}")]
    DuplicateId { table: Table, id: String },

    #[error("{table} record '{id}' not found")]
    NotFound { table: Table, id: String },

    #[error("job '{id}' changed concurrently: expected status {expected}, found {actual}")]
    Conflict {
        id: String,
        expected: JobStatus,
        actual: JobStatus,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Shorthand for a job-table NotFound.
    pub fn job_not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound {
            table: Table::Jobs,
            id: id.into(),
        }
    }
}
