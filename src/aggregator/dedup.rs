//! Seen-identifier tracking
//!
//! The aggregator only talks to the `Deduplicator` trait so a bounded or
//! time-windowed set can replace `SeenSet` without touching the cycle logic.

use std::collections::HashSet;

/// Insert-if-absent set of content identifiers
pub trait Deduplicator: Send + Sync {
    /// Whether the identifier has been recorded before
    fn contains(&self, id: &str) -> bool;

    /// Record the identifier; returns false if it was already present
    fn insert(&mut self, id: &str) -> bool;

    /// Number of identifiers recorded
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every identifier ever selected for publishing
///
/// Grows for the life of the process. Never pruned, never persisted.
#[derive(Debug, Default, Clone)]
pub struct SeenSet {
    ids: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Deduplicator for SeenSet {
    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn insert(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string())
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}
