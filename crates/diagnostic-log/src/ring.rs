use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use integrity_core::DiagnosticSink;

use crate::entry::DiagnosticEntry;

/// Default number of entries a [`RingLog`] keeps.
pub const DEFAULT_CAPACITY: usize = 200;

/// Bounded in-memory diagnostic log.
///
/// Oldest entries are evicted once `capacity` is reached. A record whose
/// content equals the latest entry already held for the same subject is
/// dropped, so callers may re-run an evaluation without flooding the log.
#[derive(Debug)]
pub struct RingLog {
    capacity: usize,
    entries: Mutex<VecDeque<DiagnosticEntry>>,
}

impl Default for RingLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl RingLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<DiagnosticEntry>> {
        // A panic while holding the lock cannot leave the deque half-updated.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append `entry` unless it repeats the subject's latest entry. Returns
    /// whether the entry was stored.
    pub fn push(&self, entry: DiagnosticEntry) -> bool {
        let mut entries = self.lock();

        let repeated = entries
            .iter()
            .rev()
            .find(|e| e.subject_id == entry.subject_id)
            .is_some_and(|latest| latest.same_content(&entry));
        if repeated {
            tracing::trace!(subject_id = %entry.subject_id, "duplicate diagnostic skipped");
            return false;
        }

        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        true
    }

    /// Oldest first.
    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn for_subject(&self, subject_id: &str) -> Vec<DiagnosticEntry> {
        self.lock()
            .iter()
            .filter(|e| e.subject_id == subject_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl DiagnosticSink for RingLog {
    fn record(&self, category: &str, payload: serde_json::Value, subject_id: &str) {
        self.push(DiagnosticEntry::new(category, subject_id, payload));
    }
}
