//! Online-presence tracking.

use std::collections::HashSet;

use ripple_core::ContactId;

/// The set of contacts currently online.
///
/// Rebuilt wholesale on every presence snapshot. Presence events are not
/// assumed reliable or order-preserving across reconnects, so the only safe
/// semantics is "last snapshot wins, fully"; the cost is a brief staleness
/// window between snapshots.
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    online: HashSet<ContactId>,
}

impl PresenceTracker {
    /// Create a tracker with nobody online.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the presence set with this snapshot.
    pub fn apply_snapshot(&mut self, ids: impl IntoIterator<Item = ContactId>) {
        self.online = ids.into_iter().collect();
    }

    /// Whether this contact is currently online.
    pub fn is_online(&self, id: &ContactId) -> bool {
        self.online.contains(id)
    }

    /// Drop a single contact (roster removal cleanup).
    pub fn remove(&mut self, id: &ContactId) {
        self.online.remove(id);
    }

    /// Identifiers of everyone currently online, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &ContactId> {
        self.online.iter()
    }

    /// Number of contacts currently online.
    pub fn online_count(&self) -> usize {
        self.online.len()
    }

    /// Mark everyone offline (session teardown).
    pub fn clear(&mut self) {
        self.online.clear();
    }
}
