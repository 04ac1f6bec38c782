use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// In-memory set of item ids that have already been through qualification.
///
/// The whole set is dropped on a fixed timer rather than expiring ids one by
/// one, so an id can resurface after a reset. Every method takes `&self`;
/// overlapping cycles share one ledger and `check_and_mark` is the only
/// admission path the worker uses.
#[derive(Debug, Default)]
pub struct Ledger {
    seen: Mutex<HashSet<String>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // A panic while holding the lock cannot leave the set half-updated.
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn seen(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    pub fn mark(&self, id: &str) {
        self.lock().insert(id.to_string());
    }

    /// Record `id` and report whether it was new. Check and insert happen
    /// under one lock acquisition.
    pub fn check_and_mark(&self, id: &str) -> bool {
        self.lock().insert(id.to_string())
    }

    /// Forget every id. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut seen = self.lock();
        let dropped = seen.len();
        seen.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
