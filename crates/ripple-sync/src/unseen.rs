//! Per-contact unseen-message counters.

use std::collections::HashMap;

use ripple_core::ContactId;

/// Counts of messages not yet viewed, keyed by contact.
///
/// A contact equal to the active selection never accumulates a count:
/// messages from the open conversation are considered immediately seen.
/// Cleared entries are removed outright; absent means zero, so the map
/// never carries dead weight and the "active has no unseen" invariant is a
/// single lookup.
#[derive(Debug, Clone, Default)]
pub struct UnseenCounter {
    counts: HashMap<ContactId, u32>,
}

impl UnseenCounter {
    /// Create a counter with nothing unseen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an incoming message from `id`.
    ///
    /// No-op when `id` equals the active selection. The selection is passed
    /// in so the check and the increment are a single call under the
    /// engine's exclusion domain; no selection change can interleave
    /// between them.
    pub fn record_incoming(&mut self, id: ContactId, active: Option<&ContactId>) {
        if active == Some(&id) {
            return;
        }
        let count = self.counts.entry(id).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Reset the count for `id` to zero (the entry is dropped).
    pub fn clear(&mut self, id: &ContactId) {
        self.counts.remove(id);
    }

    /// Unseen count for `id`. Zero if absent.
    pub fn count_of(&self, id: &ContactId) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    /// Total unseen messages across all contacts.
    ///
    /// Derived on demand rather than stored, so there is no second
    /// invariant to maintain.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|c| u64::from(*c)).sum()
    }

    /// Contacts with a nonzero count, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&ContactId, u32)> {
        self.counts.iter().map(|(id, count)| (id, *count))
    }

    /// Whether any contact has unseen messages.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Drop every counter (session teardown).
    pub fn clear_all(&mut self) {
        self.counts.clear();
    }
}
