//! Tracking service
//!
//! Binds the lifecycle engine to a store. Validation always completes in
//! the engine before a write is attempted; writes are compare-and-swap per
//! job id; store failures surface verbatim, no retries.
//!
//! The tracker subscribes to the jobs change feed and keeps a snapshot
//! cache for projections: any jobs-table notification invalidates the
//! cache, the next read re-fetches and recomputes. Coarse invalidation
//! only, no diffing.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use lablane_model::{now, Actor, Announcement, Job, JobStatus, Priority, Role, User};
use lablane_store::{Store, StoreError, SubscriptionHandle, Table};

use crate::account::{build_user, AccountError, Credential, NewAccount};
use crate::announce::{self, AnnounceError};
use crate::authority::capability_for;
use crate::intake::{create_job, IntakeError, JobDraft};
use crate::lifecycle::{
    request_bulk_transition, request_transition, set_priority, BulkTransitionReport,
    LifecycleError,
};
use crate::projection;

/// Errors surfaced by tracker operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The actor may not perform a non-job-scoped operation
    /// (account/announcement management, administrative delete).
    #[error("actor '{username}' may not {action}")]
    Forbidden { username: String, action: String },

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Announce(#[from] AnnounceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The order-tracking service.
pub struct Tracker<S: Store> {
    store: Arc<S>,
    snapshot: Arc<Mutex<Option<Vec<Job>>>>,
    subscription: SubscriptionHandle,
}

impl<S: Store> Tracker<S> {
    /// Create a tracker over a store and subscribe to its jobs feed.
    pub fn new(store: Arc<S>) -> Self {
        let snapshot: Arc<Mutex<Option<Vec<Job>>>> = Arc::new(Mutex::new(None));

        let cache = Arc::clone(&snapshot);
        let subscription = store.feed().subscribe(Table::Jobs, move |_| {
            if let Ok(mut guard) = cache.lock() {
                *guard = None;
            }
        });

        Self {
            store,
            snapshot,
            subscription,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Jobs snapshot, served from cache until the feed invalidates it.
    fn jobs_snapshot(&self) -> Result<Vec<Job>, TrackerError> {
        if let Some(cached) = self.snapshot.lock().ok().and_then(|g| g.clone()) {
            return Ok(cached);
        }
        let fresh = self.store.fetch_jobs()?;
        if let Ok(mut guard) = self.snapshot.lock() {
            *guard = Some(fresh.clone());
        }
        Ok(fresh)
    }

    fn require_admin(&self, actor: &Actor, action: &str) -> Result<(), TrackerError> {
        if actor.role != Role::Admin {
            warn!(username = %actor.username, action, "rejected: admin only");
            return Err(TrackerError::Forbidden {
                username: actor.username.clone(),
                action: action.to_string(),
            });
        }
        Ok(())
    }

    // ---- job projections ----------------------------------------------

    /// All jobs visible to the actor, most recently updated first.
    pub fn jobs(&self, actor: &Actor) -> Result<Vec<Job>, TrackerError> {
        let mut jobs = projection::visible_to(self.jobs_snapshot()?, actor);
        projection::recent_first(&mut jobs);
        Ok(jobs)
    }

    /// Visible active jobs grouped by status, pipeline order.
    pub fn active_board(
        &self,
        actor: &Actor,
    ) -> Result<BTreeMap<JobStatus, Vec<Job>>, TrackerError> {
        let visible = projection::visible_to(self.jobs_snapshot()?, actor);
        let split = projection::partition(visible);
        Ok(projection::group_by_status(&split.active))
    }

    /// Visible historical jobs, most recently updated first.
    pub fn historical(&self, actor: &Actor) -> Result<Vec<Job>, TrackerError> {
        let visible = projection::visible_to(self.jobs_snapshot()?, actor);
        let mut jobs = projection::partition(visible).historical;
        projection::recent_first(&mut jobs);
        Ok(jobs)
    }

    /// Visible jobs matching a search term, most recently updated first.
    pub fn search(&self, actor: &Actor, term: &str) -> Result<Vec<Job>, TrackerError> {
        let visible = projection::visible_to(self.jobs_snapshot()?, actor);
        let mut jobs = projection::search(visible, term);
        projection::recent_first(&mut jobs);
        Ok(jobs)
    }

    /// A single job, if visible to the actor.
    pub fn job(&self, actor: &Actor, id: &str) -> Result<Job, TrackerError> {
        let job = self.store.fetch_job(id)?;
        if !capability_for(actor).can_view(&job) {
            return Err(LifecycleError::Forbidden {
                job_id: job.id,
                username: actor.username.clone(),
            }
            .into());
        }
        Ok(job)
    }

    // ---- job mutations ------------------------------------------------

    /// Open a new job.
    pub fn create_job(&self, draft: JobDraft, actor: &Actor) -> Result<Job, TrackerError> {
        let job = create_job(draft, actor, now())?;
        let job = self.store.insert_job(job)?;
        info!(job_id = %job.id, branch = %job.branch_id, "job created");
        Ok(job)
    }

    /// Transition one job.
    pub fn transition(
        &self,
        id: &str,
        target: JobStatus,
        actor: &Actor,
    ) -> Result<Job, TrackerError> {
        let job = self.store.fetch_job(id)?;
        let updated = match request_transition(&job, target, actor, now()) {
            Ok(updated) => updated,
            Err(err) => {
                warn!(job_id = %id, %target, username = %actor.username, %err, "transition rejected");
                return Err(err.into());
            }
        };
        let updated = self.store.update_job(job.status, updated)?;
        info!(job_id = %id, from = %job.status, to = %target, username = %actor.username, "transition applied");
        Ok(updated)
    }

    /// Transition many jobs, skipping failures per job.
    ///
    /// Missing ids and concurrent-modification conflicts are reported in
    /// the same per-job way as validation rejections.
    pub fn bulk_transition(
        &self,
        ids: &[String],
        target: JobStatus,
        actor: &Actor,
    ) -> BulkTransitionReport {
        let mut report = BulkTransitionReport::new();
        let mut jobs = Vec::new();
        for id in ids {
            match self.store.fetch_job(id) {
                Ok(job) => jobs.push(job),
                Err(err) => report.reject(id.clone(), err.into()),
            }
        }

        let expected: BTreeMap<String, JobStatus> =
            jobs.iter().map(|j| (j.id.clone(), j.status)).collect();
        let validated = request_bulk_transition(&jobs, target, actor, now());
        report.rejected.extend(validated.rejected);

        for updated in validated.applied {
            let expected_status = expected[&updated.id];
            let id = updated.id.clone();
            match self.store.update_job(expected_status, updated) {
                Ok(job) => report.accept(job),
                Err(err) => report.reject(id, err.into()),
            }
        }

        info!(%target, username = %actor.username, outcome = ?report.outcome(), "bulk transition: {}", report.summary());
        report
    }

    /// Set priority and message on one job.
    pub fn set_priority(
        &self,
        id: &str,
        priority: Priority,
        message: &str,
        actor: &Actor,
    ) -> Result<Job, TrackerError> {
        let job = self.store.fetch_job(id)?;
        let updated = set_priority(&job, priority, message, actor, now())?;
        let updated = self.store.update_job(job.status, updated)?;
        info!(job_id = %id, %priority, username = %actor.username, "priority set");
        Ok(updated)
    }

    /// Administrative hard delete; not restricted by the state machine.
    pub fn delete_job(&self, id: &str, actor: &Actor) -> Result<(), TrackerError> {
        self.require_admin(actor, "delete jobs")?;
        self.store.delete_job(id)?;
        info!(job_id = %id, "job deleted");
        Ok(())
    }

    // ---- accounts -----------------------------------------------------

    /// All accounts; admin only.
    pub fn users(&self, actor: &Actor) -> Result<Vec<User>, TrackerError> {
        self.require_admin(actor, "list accounts")?;
        Ok(self.store.fetch_users()?)
    }

    /// Create an account; admin only.
    pub fn create_account(
        &self,
        account: NewAccount,
        actor: &Actor,
    ) -> Result<User, TrackerError> {
        self.require_admin(actor, "create accounts")?;
        let user = build_user(account, now())?;
        let user = self.store.insert_user(user)?;
        info!(username = %user.username, role = %user.role, "account created");
        Ok(user)
    }

    /// Replace a user's password; admin, or the user itself.
    pub fn update_password(
        &self,
        username: &str,
        password: &str,
        actor: &Actor,
    ) -> Result<User, TrackerError> {
        if actor.role != Role::Admin && actor.username != username {
            return Err(TrackerError::Forbidden {
                username: actor.username.clone(),
                action: format!("change the password of '{username}'"),
            });
        }
        if password.is_empty() {
            return Err(AccountError::EmptyPassword.into());
        }
        let user = self
            .store
            .update_user_credential(username, Credential::derive(password))?;
        info!(username = %username, "password updated");
        Ok(user)
    }

    /// Delete an account; admin only. Role changes are delete + recreate.
    pub fn delete_account(&self, username: &str, actor: &Actor) -> Result<(), TrackerError> {
        self.require_admin(actor, "delete accounts")?;
        self.store.delete_user(username)?;
        info!(username = %username, "account deleted");
        Ok(())
    }

    // ---- announcements ------------------------------------------------

    /// All announcements, newest first. Visible to every role.
    pub fn announcements(&self) -> Result<Vec<Announcement>, TrackerError> {
        let mut list = self.store.fetch_announcements()?;
        announce::newest_first(&mut list);
        Ok(list)
    }

    /// Post an announcement; admin only.
    pub fn post_announcement(
        &self,
        message: &str,
        actor: &Actor,
    ) -> Result<Announcement, TrackerError> {
        self.require_admin(actor, "post announcements")?;
        let announcement = announce::compose(message, now())?;
        let announcement = self.store.insert_announcement(announcement)?;
        info!(id = %announcement.id, "announcement posted");
        Ok(announcement)
    }

    /// Delete an announcement; admin only.
    pub fn delete_announcement(&self, id: &str, actor: &Actor) -> Result<(), TrackerError> {
        self.require_admin(actor, "delete announcements")?;
        self.store.delete_announcement(id)?;
        info!(%id, "announcement deleted");
        Ok(())
    }
}

impl<S: Store> Drop for Tracker<S> {
    fn drop(&mut self) {
        self.store.feed().unsubscribe(self.subscription);
    }
}

// Convenience: expose the StoreError variants callers match on.
impl TrackerError {
    /// True if the error is a duplicate-id conflict.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, TrackerError::Store(StoreError::DuplicateId { .. }))
    }

    /// True if the error is a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TrackerError::Store(StoreError::NotFound { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lablane_store::MemoryStore;

    fn tracker() -> Tracker<MemoryStore> {
        Tracker::new(Arc::new(MemoryStore::new()))
    }

    fn draft(id: &str) -> JobDraft {
        JobDraft {
            id: id.to_string(),
            description: String::new(),
            branch_id: "branch-01".to_string(),
            branch_name: "Centro".to_string(),
        }
    }

    #[test]
    fn test_snapshot_cache_invalidated_by_mutation() {
        let tracker = tracker();
        let branch = Actor::branch("centro", "branch-01");

        assert!(tracker.jobs(&branch).unwrap().is_empty());

        // A mutation through the store notifies the feed and invalidates
        // the cache; the next read sees the new job.
        tracker.create_job(draft("1001"), &branch).unwrap();
        assert_eq!(tracker.jobs(&branch).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_create_surfaces() {
        let tracker = tracker();
        let branch = Actor::branch("centro", "branch-01");
        tracker.create_job(draft("1001"), &branch).unwrap();

        let err = tracker.create_job(draft("1001"), &branch).unwrap_err();
        assert!(err.is_duplicate());
    }

    #[test]
    fn test_admin_only_guards() {
        let tracker = tracker();
        let lab = Actor::lab("lab");

        assert!(matches!(
            tracker.delete_job("1001", &lab).unwrap_err(),
            TrackerError::Forbidden { .. }
        ));
        assert!(matches!(
            tracker.users(&lab).unwrap_err(),
            TrackerError::Forbidden { .. }
        ));
        assert!(matches!(
            tracker.post_announcement("hi", &lab).unwrap_err(),
            TrackerError::Forbidden { .. }
        ));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let store = Arc::new(MemoryStore::new());
        {
            let _tracker = Tracker::new(Arc::clone(&store));
            assert_eq!(store.feed().subscriber_count(), 1);
        }
        assert_eq!(store.feed().subscriber_count(), 0);
    }
}
