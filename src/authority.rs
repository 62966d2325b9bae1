//! Transition and annotation authority
//!
//! What an actor may do to a job is decided here, once per role, behind the
//! [`Capability`] trait. The engine asks the capability, never the role
//! directly, so the per-role rules stay in one place.
//!
//! Authority summary:
//! - Branch: dispatches its own pending jobs to the lab, annotates its own
//!   jobs, sees only its own branch.
//! - Lab: walks jobs through the lab stations (receive, complete, return),
//!   annotates anything not yet returned, sees all jobs.
//! - Admin: unrestricted, including status override out of the terminal
//!   state.

use lablane_model::{Actor, Job, JobStatus, Role, TerminalState};

/// Per-role authority over jobs.
pub trait Capability {
    /// May the actor walk a job from `from` to `to`?
    ///
    /// This is the role edge table only; terminal-state and ownership
    /// checks happen in the lifecycle engine before this is consulted.
    fn can_transition(&self, from: JobStatus, to: JobStatus) -> bool;

    /// May the actor set priority and priority message on this job?
    fn can_annotate(&self, job: &Job) -> bool;

    /// May the actor mutate this job at all (ownership scope)?
    fn can_manage(&self, job: &Job) -> bool;

    /// Is this job visible to the actor?
    fn can_view(&self, job: &Job) -> bool;

    /// May the actor create jobs on behalf of `branch_id`?
    fn can_create_for(&self, branch_id: &str) -> bool;
}

/// Admin authority: unrestricted.
struct AdminCapability;

impl Capability for AdminCapability {
    fn can_transition(&self, _from: JobStatus, _to: JobStatus) -> bool {
        // Administrative override: any value, including out of the
        // terminal state
        true
    }

    fn can_annotate(&self, _job: &Job) -> bool {
        true
    }

    fn can_manage(&self, _job: &Job) -> bool {
        true
    }

    fn can_view(&self, _job: &Job) -> bool {
        true
    }

    fn can_create_for(&self, _branch_id: &str) -> bool {
        true
    }
}

/// Branch authority, scoped to the actor's own branch.
struct BranchCapability {
    branch_id: Option<String>,
}

impl BranchCapability {
    fn owns(&self, job: &Job) -> bool {
        self.branch_id.as_deref() == Some(job.branch_id.as_str())
    }
}

impl Capability for BranchCapability {
    fn can_transition(&self, from: JobStatus, to: JobStatus) -> bool {
        // The branch works a single station: dispatching pending jobs
        from == JobStatus::PendingInBranch && from.can_step_to(to)
    }

    fn can_annotate(&self, job: &Job) -> bool {
        // Own jobs in any state, historical included
        self.owns(job)
    }

    fn can_manage(&self, job: &Job) -> bool {
        self.owns(job)
    }

    fn can_view(&self, job: &Job) -> bool {
        self.owns(job)
    }

    fn can_create_for(&self, branch_id: &str) -> bool {
        self.branch_id.as_deref() == Some(branch_id)
    }
}

/// Lab authority over the lab-side stations.
struct LabCapability;

impl Capability for LabCapability {
    fn can_transition(&self, from: JobStatus, to: JobStatus) -> bool {
        // Lab stations: receive, complete, return — always one forward step
        matches!(
            from,
            JobStatus::SentToLab | JobStatus::ReceivedByLab | JobStatus::Completed
        ) && from.can_step_to(to)
    }

    fn can_annotate(&self, job: &Job) -> bool {
        // Anything not yet returned to the branch
        !job.status.is_terminal()
    }

    fn can_manage(&self, _job: &Job) -> bool {
        true
    }

    fn can_view(&self, _job: &Job) -> bool {
        true
    }

    fn can_create_for(&self, _branch_id: &str) -> bool {
        false
    }
}

/// Resolve the capability for an actor's role.
pub fn capability_for(actor: &Actor) -> Box<dyn Capability> {
    match actor.role {
        Role::Admin => Box::new(AdminCapability),
        Role::Branch => Box::new(BranchCapability {
            branch_id: actor.branch_id.clone(),
        }),
        Role::Lab => Box::new(LabCapability),
    }
}
