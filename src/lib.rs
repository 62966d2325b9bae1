//! Lablane - Optical-lab order tracking core
//!
//! Implements the job lifecycle engine for an optical-lab tracking
//! workflow: branch stores create jobs and dispatch them to the lab, the
//! lab processes and returns them, an admin oversees accounts and
//! announcements. The engine validates transitions and computes projections
//! over snapshots; the authoritative data lives behind the store traits in
//! `lablane-store`.

pub mod account;
pub mod announce;
pub mod authority;
pub mod config;
pub mod intake;
pub mod lifecycle;
pub mod projection;
pub mod tracker;
pub mod watch;

pub use account::{AccountError, Credential, NewAccount};
pub use announce::AnnounceError;
pub use authority::{capability_for, Capability};
pub use config::{Config, ConfigError};
pub use intake::{IntakeError, JobDraft};
pub use lifecycle::{
    request_bulk_transition, request_transition, set_priority, BulkOutcome, BulkRejection,
    BulkRejectionError, BulkTransitionReport, LifecycleError,
};
pub use tracker::{Tracker, TrackerError};

pub use lablane_model::{
    Actor, Announcement, HistoryEntry, Job, JobHistory, JobStatus, Priority, Role, TerminalState,
    User,
};
pub use lablane_store::{
    AnnouncementStore, ChangeFeed, FileStore, JobStore, MemoryStore, Store, StoreError,
    SubscriptionHandle, Table, UserStore,
};
