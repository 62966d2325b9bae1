//! Job projections
//!
//! Pure, side-effect-free functions over a snapshot of jobs: role-scoped
//! visibility, the active/historical partition, status grouping, text
//! search, and the recency ordering used by management views. Nothing here
//! is stored; every projection is recomputed from the snapshot it is given.

use std::collections::BTreeMap;

use lablane_model::{Actor, Job, JobStatus};

use crate::authority::capability_for;

/// Active vs. historical split of a snapshot.
///
/// A job is historical iff its status is COMPLETED or SENT_TO_BRANCH.
#[derive(Debug, Default)]
pub struct JobPartition {
    /// Jobs still moving through the pipeline, in input order
    pub active: Vec<Job>,
    /// Finished jobs, in input order
    pub historical: Vec<Job>,
}

/// Keep only the jobs visible to the actor.
///
/// Branch users see their own branch; lab and admin see everything. Apply
/// this before any other projection.
pub fn visible_to(jobs: Vec<Job>, actor: &Actor) -> Vec<Job> {
    let capability = capability_for(actor);
    jobs.into_iter().filter(|j| capability.can_view(j)).collect()
}

/// Split a snapshot into active and historical jobs, preserving order.
pub fn partition(jobs: Vec<Job>) -> JobPartition {
    let mut split = JobPartition::default();
    for job in jobs {
        if job.is_historical() {
            split.historical.push(job);
        } else {
            split.active.push(job);
        }
    }
    split
}

/// Group jobs by status, preserving input order within each group.
///
/// Keys iterate in pipeline order; statuses with no jobs are absent.
pub fn group_by_status(jobs: &[Job]) -> BTreeMap<JobStatus, Vec<Job>> {
    let mut groups: BTreeMap<JobStatus, Vec<Job>> = BTreeMap::new();
    for job in jobs {
        groups.entry(job.status).or_default().push(job.clone());
    }
    groups
}

/// Case-insensitive substring match over id, description, and branch name.
pub fn matches_search(job: &Job, term: &str) -> bool {
    let needle = term.to_lowercase();
    job.id.to_lowercase().contains(&needle)
        || job.description.to_lowercase().contains(&needle)
        || job.branch_name.to_lowercase().contains(&needle)
}

/// Keep only the jobs matching the search term.
pub fn search(jobs: Vec<Job>, term: &str) -> Vec<Job> {
    jobs.into_iter().filter(|j| matches_search(j, term)).collect()
}

/// Order for management views: most recently updated first.
pub fn recent_first(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}
