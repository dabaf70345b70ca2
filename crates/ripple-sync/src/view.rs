//! Read-only snapshots exposed to the rendering layer.

use std::collections::{HashMap, HashSet};

use ripple_core::{Contact, ContactId};

use crate::{directory::name_matches, engine::EngineState};

/// Immutable snapshot of everything the sidebar needs to render.
///
/// Published by the runtime after each fully-applied mutation, so readers
/// never observe a half-applied transaction: a new selection always arrives
/// together with its zeroed unseen count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncView {
    /// Connection state, for the "reconnecting" indicator.
    pub connection: EngineState,
    /// Roster in server order.
    pub contacts: Vec<Contact>,
    /// Contacts currently online.
    pub online: HashSet<ContactId>,
    /// Unseen counts; absent means zero.
    pub unseen: HashMap<ContactId, u32>,
    /// The active conversation, if any.
    pub active: Option<ContactId>,
}

impl SyncView {
    /// Whether this contact is currently online.
    pub fn is_online(&self, id: &ContactId) -> bool {
        self.online.contains(id)
    }

    /// Unseen count for this contact. Zero if absent.
    pub fn unseen_count(&self, id: &ContactId) -> u32 {
        self.unseen.get(id).copied().unwrap_or(0)
    }

    /// Total unseen messages across all contacts.
    pub fn total_unseen(&self) -> u64 {
        self.unseen.values().map(|c| u64::from(*c)).sum()
    }

    /// Contacts whose display name contains `query`, case-insensitively.
    ///
    /// Same semantics as
    /// [`ContactDirectory::filter`](crate::ContactDirectory::filter); the
    /// search box filters whichever snapshot it is currently showing.
    pub fn filter<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Contact> {
        self.contacts.iter().filter(move |c| name_matches(&c.display_name, query))
    }
}

/// Outward notifications for the UI/routing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// The bounded reconnect attempts are exhausted; the session will not
    /// recover on its own and the user must re-authenticate.
    ReconnectExhausted,
    /// Session state is fully cleared after logout; it is safe to navigate
    /// away.
    SessionEnded,
}
