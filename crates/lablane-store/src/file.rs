//! JSON-file-backed store
//!
//! Persists the whole dataset as a single versioned JSON snapshot, rewritten
//! atomically (write-then-rename) after every mutation. Suits the scale of a
//! lab tracking deployment: hundreds of jobs, a handful of accounts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use lablane_model::{Announcement, Job, JobStatus, User};

use crate::error::StoreError;
use crate::feed::ChangeFeed;
use crate::memory::MemoryStore;
use crate::traits::{AnnouncementStore, JobStore, Store, UserStore};

/// Schema version for the snapshot file
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "lablane/store@1";

/// On-disk snapshot of the full dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// All jobs
    #[serde(default)]
    pub jobs: Vec<Job>,

    /// All user accounts
    #[serde(default)]
    pub users: Vec<User>,

    /// All announcements
    #[serde(default)]
    pub announcements: Vec<Announcement>,
}

impl Snapshot {
    /// An empty snapshot at the current schema.
    pub fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            jobs: Vec::new(),
            users: Vec::new(),
            announcements: Vec::new(),
        }
    }
}

/// Durable store backed by a JSON snapshot file.
#[derive(Debug)]
pub struct FileStore {
    inner: MemoryStore,
    path: PathBuf,
}

impl FileStore {
    /// Open a store at `path`, loading the existing snapshot or starting
    /// empty if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let inner = if path.exists() {
            let json = fs::read_to_string(&path)?;
            let snapshot: Snapshot = serde_json::from_str(&json)?;
            MemoryStore::with_records(snapshot.jobs, snapshot.users, snapshot.announcements)
        } else {
            MemoryStore::new()
        };
        Ok(Self { inner, path })
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current dataset as a snapshot value.
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(Snapshot {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            jobs: self.inner.fetch_jobs()?,
            users: self.inner.fetch_users()?,
            announcements: self.inner.fetch_announcements()?,
        })
    }

    /// Write the snapshot to a temp file, then rename over the target.
    fn flush(&self) -> Result<(), StoreError> {
        let snapshot = self.snapshot()?;
        let json = serde_json::to_string_pretty(&snapshot)?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &json)?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}

impl JobStore for FileStore {
    fn fetch_jobs(&self) -> Result<Vec<Job>, StoreError> {
        self.inner.fetch_jobs()
    }

    fn fetch_job(&self, id: &str) -> Result<Job, StoreError> {
        self.inner.fetch_job(id)
    }

    fn insert_job(&self, job: Job) -> Result<Job, StoreError> {
        let job = self.inner.insert_job(job)?;
        self.flush()?;
        Ok(job)
    }

    fn update_job(&self, expected_status: JobStatus, job: Job) -> Result<Job, StoreError> {
        let job = self.inner.update_job(expected_status, job)?;
        self.flush()?;
        Ok(job)
    }

    fn delete_job(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete_job(id)?;
        self.flush()
    }
}

impl UserStore for FileStore {
    fn fetch_users(&self) -> Result<Vec<User>, StoreError> {
        self.inner.fetch_users()
    }

    fn fetch_user(&self, username: &str) -> Result<User, StoreError> {
        self.inner.fetch_user(username)
    }

    fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let user = self.inner.insert_user(user)?;
        self.flush()?;
        Ok(user)
    }

    fn update_user_credential(
        &self,
        username: &str,
        credential: String,
    ) -> Result<User, StoreError> {
        let user = self.inner.update_user_credential(username, credential)?;
        self.flush()?;
        Ok(user)
    }

    fn delete_user(&self, username: &str) -> Result<(), StoreError> {
        self.inner.delete_user(username)?;
        self.flush()
    }
}

impl AnnouncementStore for FileStore {
    fn fetch_announcements(&self) -> Result<Vec<Announcement>, StoreError> {
        self.inner.fetch_announcements()
    }

    fn insert_announcement(&self, announcement: Announcement) -> Result<Announcement, StoreError> {
        let announcement = self.inner.insert_announcement(announcement)?;
        self.flush()?;
        Ok(announcement)
    }

    fn delete_announcement(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete_announcement(id)?;
        self.flush()
    }
}

impl Store for FileStore {
    fn feed(&self) -> &ChangeFeed {
        self.inner.feed()
    }
}
