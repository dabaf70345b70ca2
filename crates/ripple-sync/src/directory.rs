//! Contact roster storage and search filtering.

use std::collections::HashSet;

use ripple_core::{Contact, ContactId};

/// The roster of contacts, in server order.
///
/// Replaced wholesale on every reload rather than patched incrementally;
/// the fallible fetch itself lives behind
/// [`DirectoryFetch`](crate::DirectoryFetch), so a failed reload never
/// touches the previous roster.
#[derive(Debug, Clone, Default)]
pub struct ContactDirectory {
    /// Contacts in the order the directory service returned them.
    contacts: Vec<Contact>,
    /// Identifier index for O(1) membership checks.
    ids: HashSet<ContactId>,
}

impl ContactDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster wholesale, preserving the given order.
    ///
    /// Returns the identifiers that were present before and are absent now.
    /// The engine uses the removal set to drop stale presence and unseen
    /// entries and to clear a removed active selection.
    pub fn apply_roster(&mut self, roster: Vec<Contact>) -> Vec<ContactId> {
        let new_ids: HashSet<ContactId> = roster.iter().map(|c| c.id.clone()).collect();
        let removed: Vec<ContactId> =
            self.ids.iter().filter(|id| !new_ids.contains(id)).cloned().collect();

        self.contacts = roster;
        self.ids = new_ids;
        removed
    }

    /// Contacts whose display name contains `query`, case-insensitively.
    ///
    /// An empty query yields the full roster in its existing order. The
    /// iterator is lazy, restartable, and has no side effects.
    pub fn filter<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Contact> {
        self.contacts.iter().filter(move |c| name_matches(&c.display_name, query))
    }

    /// Whether the directory knows this identifier.
    pub fn contains(&self, id: &ContactId) -> bool {
        self.ids.contains(id)
    }

    /// The contact with this identifier, if known.
    pub fn get(&self, id: &ContactId) -> Option<&Contact> {
        self.contacts.iter().find(|c| &c.id == id)
    }

    /// The full roster in server order.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Number of contacts in the roster.
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Drop the whole roster (session teardown).
    pub fn clear(&mut self) {
        self.contacts.clear();
        self.ids.clear();
    }
}

/// Case-insensitive substring match used by directory and view filtering.
pub(crate) fn name_matches(name: &str, query: &str) -> bool {
    query.is_empty() || name.to_lowercase().contains(&query.to_lowercase())
}
