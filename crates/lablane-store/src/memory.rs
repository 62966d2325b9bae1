//! In-memory store
//!
//! Mutex-guarded maps keyed by record id. Each mutation takes the table
//! lock for its whole read-modify-write, which serializes concurrent
//! updates to the same id; `update_job` additionally compares the caller's
//! expected status before applying.

use std::collections::BTreeMap;
use std::sync::Mutex;

use lablane_model::{Announcement, Job, JobStatus, User};

use crate::error::StoreError;
use crate::feed::{ChangeFeed, Table};
use crate::traits::{AnnouncementStore, JobStore, Store, UserStore};

/// Volatile store; the authoritative copy lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    jobs: Mutex<BTreeMap<String, Job>>,
    users: Mutex<BTreeMap<String, User>>,
    announcements: Mutex<BTreeMap<String, Announcement>>,
    feed: ChangeFeed,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records (snapshot load).
    pub fn with_records(
        jobs: Vec<Job>,
        users: Vec<User>,
        announcements: Vec<Announcement>,
    ) -> Self {
        Self {
            jobs: Mutex::new(jobs.into_iter().map(|j| (j.id.clone(), j)).collect()),
            users: Mutex::new(users.into_iter().map(|u| (u.username.clone(), u)).collect()),
            announcements: Mutex::new(
                announcements.into_iter().map(|a| (a.id.clone(), a)).collect(),
            ),
            feed: ChangeFeed::new(),
        }
    }

    fn lock_poisoned() -> StoreError {
        StoreError::Io(std::io::Error::other("store lock poisoned"))
    }
}

impl JobStore for MemoryStore {
    fn fetch_jobs(&self) -> Result<Vec<Job>, StoreError> {
        let jobs = self.jobs.lock().map_err(|_| Self::lock_poisoned())?;
        Ok(jobs.values().cloned().collect())
    }

    fn fetch_job(&self, id: &str) -> Result<Job, StoreError> {
        let jobs = self.jobs.lock().map_err(|_| Self::lock_poisoned())?;
        jobs.get(id).cloned().ok_or_else(|| StoreError::NotFound {
            table: Table::Jobs,
            id: id.to_string(),
        })
    }

    fn insert_job(&self, job: Job) -> Result<Job, StoreError> {
        {
            let mut jobs = self.jobs.lock().map_err(|_| Self::lock_poisoned())?;
            if jobs.contains_key(&job.id) {
                return Err(StoreError::DuplicateId {
                    table: Table::Jobs,
                    id: job.id.clone(),
                });
            }
            jobs.insert(job.id.clone(), job.clone());
        }
        self.feed.notify(Table::Jobs);
        Ok(job)
    }

    fn update_job(&self, expected_status: JobStatus, job: Job) -> Result<Job, StoreError> {
        {
            let mut jobs = self.jobs.lock().map_err(|_| Self::lock_poisoned())?;
            let current = jobs.get(&job.id).ok_or_else(|| StoreError::NotFound {
                table: Table::Jobs,
                id: job.id.clone(),
            })?;
            if current.status != expected_status {
                return Err(StoreError::Conflict {
                    id: job.id.clone(),
                    expected: expected_status,
                    actual: current.status,
                });
            }
            jobs.insert(job.id.clone(), job.clone());
        }
        self.feed.notify(Table::Jobs);
        Ok(job)
    }

    fn delete_job(&self, id: &str) -> Result<(), StoreError> {
        {
            let mut jobs = self.jobs.lock().map_err(|_| Self::lock_poisoned())?;
            if jobs.remove(id).is_none() {
                return Err(StoreError::NotFound {
                    table: Table::Jobs,
                    id: id.to_string(),
                });
            }
        }
        self.feed.notify(Table::Jobs);
        Ok(())
    }
}

impl UserStore for MemoryStore {
    fn fetch_users(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.lock().map_err(|_| Self::lock_poisoned())?;
        Ok(users.values().cloned().collect())
    }

    fn fetch_user(&self, username: &str) -> Result<User, StoreError> {
        let users = self.users.lock().map_err(|_| Self::lock_poisoned())?;
        users
            .get(username)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                table: Table::Users,
                id: username.to_string(),
            })
    }

    fn insert_user(&self, user: User) -> Result<User, StoreError> {
        {
            let mut users = self.users.lock().map_err(|_| Self::lock_poisoned())?;
            if users.contains_key(&user.username) {
                return Err(StoreError::DuplicateId {
                    table: Table::Users,
                    id: user.username.clone(),
                });
            }
            users.insert(user.username.clone(), user.clone());
        }
        self.feed.notify(Table::Users);
        Ok(user)
    }

    fn update_user_credential(
        &self,
        username: &str,
        credential: String,
    ) -> Result<User, StoreError> {
        let updated = {
            let mut users = self.users.lock().map_err(|_| Self::lock_poisoned())?;
            let user = users.get_mut(username).ok_or_else(|| StoreError::NotFound {
                table: Table::Users,
                id: username.to_string(),
            })?;
            user.credential = credential;
            user.clone()
        };
        self.feed.notify(Table::Users);
        Ok(updated)
    }

    fn delete_user(&self, username: &str) -> Result<(), StoreError> {
        {
            let mut users = self.users.lock().map_err(|_| Self::lock_poisoned())?;
            if users.remove(username).is_none() {
                return Err(StoreError::NotFound {
                    table: Table::Users,
                    id: username.to_string(),
                });
            }
        }
        self.feed.notify(Table::Users);
        Ok(())
    }
}

impl AnnouncementStore for MemoryStore {
    fn fetch_announcements(&self) -> Result<Vec<Announcement>, StoreError> {
        let announcements = self
            .announcements
            .lock()
            .map_err(|_| Self::lock_poisoned())?;
        Ok(announcements.values().cloned().collect())
    }

    fn insert_announcement(&self, announcement: Announcement) -> Result<Announcement, StoreError> {
        {
            let mut announcements = self
                .announcements
                .lock()
                .map_err(|_| Self::lock_poisoned())?;
            if announcements.contains_key(&announcement.id) {
                return Err(StoreError::DuplicateId {
                    table: Table::Announcements,
                    id: announcement.id.clone(),
                });
            }
            announcements.insert(announcement.id.clone(), announcement.clone());
        }
        self.feed.notify(Table::Announcements);
        Ok(announcement)
    }

    fn delete_announcement(&self, id: &str) -> Result<(), StoreError> {
        {
            let mut announcements = self
                .announcements
                .lock()
                .map_err(|_| Self::lock_poisoned())?;
            if announcements.remove(id).is_none() {
                return Err(StoreError::NotFound {
                    table: Table::Announcements,
                    id: id.to_string(),
                });
            }
        }
        self.feed.notify(Table::Announcements);
        Ok(())
    }
}

impl Store for MemoryStore {
    fn feed(&self) -> &ChangeFeed {
        &self.feed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use lablane_model::{JobHistory, Priority, Role};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sample_job(id: &str) -> Job {
        let created = Utc.timestamp_opt(1_000, 0).unwrap();
        Job {
            id: id.to_string(),
            description: String::new(),
            branch_id: "branch-01".to_string(),
            branch_name: "Centro".to_string(),
            status: JobStatus::PendingInBranch,
            priority: Priority::Normal,
            priority_message: String::new(),
            created_at: created,
            updated_at: created,
            history: JobHistory::seeded(JobStatus::PendingInBranch, "centro", created),
        }
    }

    fn sample_user(username: &str) -> User {
        User {
            id: format!("id-{}", username),
            username: username.to_string(),
            role: Role::Lab,
            credential: "opaque".to_string(),
            branch_id: None,
            branch_name: None,
            created_at: Utc.timestamp_opt(1_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_insert_and_fetch_job() {
        let store = MemoryStore::new();
        store.insert_job(sample_job("1001")).unwrap();

        let job = store.fetch_job("1001").unwrap();
        assert_eq!(job.status, JobStatus::PendingInBranch);
        assert_eq!(store.fetch_jobs().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_job_id_rejected() {
        let store = MemoryStore::new();
        store.insert_job(sample_job("1001")).unwrap();

        let err = store.insert_job(sample_job("1001")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
    }

    #[test]
    fn test_update_job_cas_mismatch() {
        let store = MemoryStore::new();
        store.insert_job(sample_job("1001")).unwrap();

        let mut updated = sample_job("1001");
        updated.status = JobStatus::SentToLab;

        // Caller validated against a stale snapshot
        let err = store
            .update_job(JobStatus::ReceivedByLab, updated)
            .unwrap_err();
        match err {
            StoreError::Conflict {
                expected, actual, ..
            } => {
                assert_eq!(expected, JobStatus::ReceivedByLab);
                assert_eq!(actual, JobStatus::PendingInBranch);
            }
            other => panic!("expected Conflict, got {other:?}"),
        }

        // Nothing applied
        assert_eq!(
            store.fetch_job("1001").unwrap().status,
            JobStatus::PendingInBranch
        );
    }

    #[test]
    fn test_update_job_cas_match_applies() {
        let store = MemoryStore::new();
        store.insert_job(sample_job("1001")).unwrap();

        let mut updated = sample_job("1001");
        updated.status = JobStatus::SentToLab;
        store
            .update_job(JobStatus::PendingInBranch, updated)
            .unwrap();

        assert_eq!(store.fetch_job("1001").unwrap().status, JobStatus::SentToLab);
    }

    #[test]
    fn test_delete_job_not_found() {
        let store = MemoryStore::new();
        let err = store.delete_job("9999").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_mutations_notify_feed_per_table() {
        let store = MemoryStore::new();
        let jobs_seen = Arc::new(AtomicUsize::new(0));
        let users_seen = Arc::new(AtomicUsize::new(0));

        let j = Arc::clone(&jobs_seen);
        store.feed().subscribe(Table::Jobs, move |_| {
            j.fetch_add(1, Ordering::SeqCst);
        });
        let u = Arc::clone(&users_seen);
        store.feed().subscribe(Table::Users, move |_| {
            u.fetch_add(1, Ordering::SeqCst);
        });

        store.insert_job(sample_job("1001")).unwrap();
        store.delete_job("1001").unwrap();
        store.insert_user(sample_user("lab")).unwrap();

        assert_eq!(jobs_seen.load(Ordering::SeqCst), 2);
        assert_eq!(users_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_mutation_does_not_notify() {
        let store = MemoryStore::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&seen);
        store.feed().subscribe(Table::Jobs, move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        let _ = store.delete_job("missing");
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_username_uniqueness() {
        let store = MemoryStore::new();
        store.insert_user(sample_user("lab")).unwrap();
        let err = store.insert_user(sample_user("lab")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
    }

    #[test]
    fn test_update_credential() {
        let store = MemoryStore::new();
        store.insert_user(sample_user("lab")).unwrap();

        let updated = store
            .update_user_credential("lab", "fresh".to_string())
            .unwrap();
        assert_eq!(updated.credential, "fresh");
        assert_eq!(store.fetch_user("lab").unwrap().credential, "fresh");
    }
}
