//! Change notification feed
//!
//! Coarse invalidation signals: a notification carries no payload beyond
//! which table changed. Subscribers re-fetch and recompute; there is no
//! incremental diffing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Tables a subscriber can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Jobs,
    Users,
    Announcements,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Jobs => write!(f, "jobs"),
            Table::Users => write!(f, "users"),
            Table::Announcements => write!(f, "announcements"),
        }
    }
}

type Handler = Arc<dyn Fn(Table) + Send + Sync>;

struct Subscriber {
    id: u64,
    table: Table,
    handler: Handler,
}

/// Handle returned from [`ChangeFeed::subscribe`]; pass it back to
/// [`ChangeFeed::unsubscribe`] to stop receiving notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle(u64);

/// Subscription registry for table-change notifications.
pub struct ChangeFeed {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl ChangeFeed {
    /// Create an empty feed.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a handler for changes to `table`.
    pub fn subscribe<F>(&self, table: Table, handler: F) -> SubscriptionHandle
    where
        F: Fn(Table) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(Subscriber {
                id,
                table,
                handler: Arc::new(handler),
            });
        }
        SubscriptionHandle(id)
    }

    /// Remove a subscription. Unknown handles are ignored.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|s| s.id != handle.0);
        }
    }

    /// Notify all subscribers of `table` that something in it changed.
    ///
    /// Handlers run on the calling thread, outside the registry lock, so a
    /// handler may itself subscribe or unsubscribe.
    pub fn notify(&self, table: Table) {
        let handlers: Vec<Handler> = match self.subscribers.lock() {
            Ok(subs) => subs
                .iter()
                .filter(|s| s.table == table)
                .map(|s| Arc::clone(&s.handler))
                .collect(),
            Err(_) => return,
        };

        for handler in handlers {
            handler(table);
        }
    }

    /// Number of live subscriptions across all tables.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
