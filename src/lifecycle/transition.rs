//! Single-job status transition

use chrono::{DateTime, Utc};
use lablane_model::{Actor, Job, JobStatus, Role, TerminalState};

use crate::authority::capability_for;

use super::LifecycleError;

/// Validate and apply one status transition.
///
/// Checks, in order:
/// 1. ownership — the actor must hold manage authority on the job
///    (`Forbidden` otherwise);
/// 2. terminal state — a non-Admin cannot move a job out of
///    SENT_TO_BRANCH (`TerminalState`);
/// 3. the role edge table (`InvalidTransition`).
///
/// On success returns the updated job: new status, refreshed `updated_at`,
/// and exactly one appended history entry. The input snapshot is not
/// modified; persisting the result (atomically per job id) is the caller's
/// concern.
pub fn request_transition(
    job: &Job,
    target: JobStatus,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<Job, LifecycleError> {
    let capability = capability_for(actor);

    if !capability.can_manage(job) {
        return Err(LifecycleError::Forbidden {
            job_id: job.id.clone(),
            username: actor.username.clone(),
        });
    }

    // The terminal guard is more specific than the edge table; it wins when
    // both would reject.
    if job.status.is_terminal() && actor.role != Role::Admin {
        return Err(LifecycleError::TerminalState {
            job_id: job.id.clone(),
            status: job.status,
        });
    }

    if !capability.can_transition(job.status, target) {
        return Err(LifecycleError::InvalidTransition {
            job_id: job.id.clone(),
            from: job.status,
            to: target,
            role: actor.role,
        });
    }

    let mut updated = job.clone();
    updated.status = target;
    updated.updated_at = now;
    updated.history.record(target, actor.username.clone(), now);

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lablane_model::{JobHistory, Priority};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn job_at(status: JobStatus) -> Job {
        let created = ts(1_000);
        Job {
            id: "1001".to_string(),
            description: "Progresivo antireflex".to_string(),
            branch_id: "branch-01".to_string(),
            branch_name: "Centro".to_string(),
            status,
            priority: Priority::Normal,
            priority_message: String::new(),
            created_at: created,
            updated_at: created,
            history: JobHistory::seeded(status, "seed", created),
        }
    }

    fn branch() -> Actor {
        Actor::branch("centro", "branch-01")
    }

    fn lab() -> Actor {
        Actor::lab("lab")
    }

    #[test]
    fn test_branch_dispatches_pending_job() {
        let job = job_at(JobStatus::PendingInBranch);
        let updated =
            request_transition(&job, JobStatus::SentToLab, &branch(), ts(2_000)).unwrap();

        assert_eq!(updated.status, JobStatus::SentToLab);
        assert_eq!(updated.updated_at, ts(2_000));
        assert_eq!(updated.history.len(), 2);
        let last = updated.history.last().unwrap();
        assert_eq!(last.status, JobStatus::SentToLab);
        assert_eq!(last.updated_by, "centro");
        assert_eq!(last.timestamp, ts(2_000));
        assert!(updated.history_is_consistent());

        // Input snapshot untouched
        assert_eq!(job.status, JobStatus::PendingInBranch);
        assert_eq!(job.history.len(), 1);
    }

    #[test]
    fn test_full_lab_walk() {
        let mut job = job_at(JobStatus::SentToLab);
        for (i, target) in [
            JobStatus::ReceivedByLab,
            JobStatus::Completed,
            JobStatus::SentToBranch,
        ]
        .into_iter()
        .enumerate()
        {
            job = request_transition(&job, target, &lab(), ts(2_000 + i as i64)).unwrap();
        }

        assert_eq!(job.status, JobStatus::SentToBranch);
        assert_eq!(job.history.len(), 4);
        assert!(job.history_is_consistent());
    }

    #[test]
    fn test_branch_cannot_move_non_pending_job() {
        for status in [
            JobStatus::SentToLab,
            JobStatus::ReceivedByLab,
            JobStatus::Completed,
        ] {
            let job = job_at(status);
            let err =
                request_transition(&job, JobStatus::SentToLab, &branch(), ts(2_000)).unwrap_err();
            assert!(
                matches!(err, LifecycleError::InvalidTransition { .. }),
                "status {status}: {err}"
            );
        }
    }

    #[test]
    fn test_lab_cannot_skip_or_go_backward() {
        // Skip: SENT_TO_LAB → COMPLETED
        let job = job_at(JobStatus::SentToLab);
        let err = request_transition(&job, JobStatus::Completed, &lab(), ts(2_000)).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));

        // Backward: COMPLETED → RECEIVED_BY_LAB
        let job = job_at(JobStatus::Completed);
        let err =
            request_transition(&job, JobStatus::ReceivedByLab, &lab(), ts(2_000)).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }

    #[test]
    fn test_no_self_transition() {
        let job = job_at(JobStatus::ReceivedByLab);
        let err =
            request_transition(&job, JobStatus::ReceivedByLab, &lab(), ts(2_000)).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }

    #[test]
    fn test_terminal_state_locked_for_non_admin() {
        let job = job_at(JobStatus::SentToBranch);

        let err = request_transition(&job, JobStatus::PendingInBranch, &lab(), ts(2_000))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::TerminalState { .. }));

        let err = request_transition(&job, JobStatus::SentToLab, &branch(), ts(2_000))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::TerminalState { .. }));
    }

    #[test]
    fn test_admin_override_any_edge() {
        let admin = Actor::admin("root");

        // Backward out of the terminal state
        let job = job_at(JobStatus::SentToBranch);
        let updated =
            request_transition(&job, JobStatus::ReceivedByLab, &admin, ts(2_000)).unwrap();
        assert_eq!(updated.status, JobStatus::ReceivedByLab);

        // Skipping forward
        let job = job_at(JobStatus::PendingInBranch);
        let updated = request_transition(&job, JobStatus::Completed, &admin, ts(2_000)).unwrap();
        assert_eq!(updated.status, JobStatus::Completed);

        // Override still appends history
        assert_eq!(updated.history.len(), 2);
        assert_eq!(updated.history.last().unwrap().updated_by, "root");
    }

    #[test]
    fn test_foreign_branch_job_is_forbidden() {
        let mut job = job_at(JobStatus::PendingInBranch);
        job.branch_id = "branch-02".to_string();

        let err = request_transition(&job, JobStatus::SentToLab, &branch(), ts(2_000)).unwrap_err();
        match err {
            LifecycleError::Forbidden { job_id, username } => {
                assert_eq!(job_id, "1001");
                assert_eq!(username, "centro");
            }
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn test_rejection_names_the_job() {
        let job = job_at(JobStatus::SentToLab);
        let err = request_transition(&job, JobStatus::Completed, &lab(), ts(2_000)).unwrap_err();
        assert_eq!(err.job_id(), "1001");
        assert!(err.to_string().contains("1001"));
    }
}
