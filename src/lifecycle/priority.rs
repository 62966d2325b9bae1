//! Priority annotation
//!
//! Priority is a side-channel, independent of the status state machine:
//! changing it never appends to the audit trail and never touches status.

use chrono::{DateTime, Utc};
use lablane_model::{Actor, Job, Priority};

use crate::authority::capability_for;

use super::LifecycleError;

/// Set priority and its message on a job.
///
/// Allowed for any actor holding annotation authority on the job: a branch
/// on its own jobs in any state, the lab on jobs not yet returned, admin
/// unconditionally. A NORMAL priority clears the message; a non-NORMAL
/// priority stores the given one. Refreshes `updated_at` only.
pub fn set_priority(
    job: &Job,
    priority: Priority,
    message: &str,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<Job, LifecycleError> {
    let capability = capability_for(actor);

    if !capability.can_annotate(job) {
        return Err(LifecycleError::Forbidden {
            job_id: job.id.clone(),
            username: actor.username.clone(),
        });
    }

    let mut updated = job.clone();
    updated.priority = priority;
    updated.priority_message = if priority.carries_message() {
        message.to_string()
    } else {
        String::new()
    };
    updated.updated_at = now;

    Ok(updated)
}
