// ── Mutation / alert log ──
//
// Append-only, most-recent-first. New entries are also broadcast to live
// subscribers. There is no retention cap: long-running deployments will
// want rotation here.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::broadcast;

use crate::model::{EntityId, LogEntry, Severity};

/// Facility name used for entries that are not about a single facility.
pub const SYSTEM_FACILITY: &str = "System";

const FEED_CHANNEL_SIZE: usize = 256;

pub struct ActivityLog {
    entries: Mutex<VecDeque<Arc<LogEntry>>>,
    feed: broadcast::Sender<Arc<LogEntry>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CHANNEL_SIZE);
        Self {
            entries: Mutex::new(VecDeque::new()),
            feed,
        }
    }

    /// Insert a new entry at the head.
    pub fn add(
        &self,
        message: impl Into<String>,
        severity: Severity,
        facility_name: impl Into<String>,
    ) -> Arc<LogEntry> {
        let entry = Arc::new(LogEntry {
            id: EntityId::generate(),
            timestamp: Utc::now(),
            message: message.into(),
            severity,
            facility_name: facility_name.into(),
        });
        self.lock().push_front(Arc::clone(&entry));
        // No receivers is fine; the entry is already recorded.
        let _ = self.feed.send(Arc::clone(&entry));
        entry
    }

    /// All entries, most recent first.
    pub fn entries(&self) -> Vec<Arc<LogEntry>> {
        self.lock().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<Arc<LogEntry>> {
        self.lock().front().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Receive each entry as it is added.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<LogEntry>> {
        self.feed.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Arc<LogEntry>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}
