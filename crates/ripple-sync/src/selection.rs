//! Active-conversation selection.

use ripple_core::ContactId;

use crate::unseen::UnseenCounter;

/// At most one active conversation.
///
/// Selection and the unseen counter are coupled: selecting a contact zeroes
/// its unseen count in the same call, so no observer of the engine can see
/// a new selection paired with a stale nonzero badge, or vice versa.
#[derive(Debug, Clone, Default)]
pub struct ConversationSelector {
    active: Option<ContactId>,
}

impl ConversationSelector {
    /// Create a selector with no active conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id` the active conversation and zero its unseen count.
    ///
    /// The two updates are one logical transaction; callers must hold the
    /// engine's exclusion domain across this call.
    pub fn select(&mut self, id: ContactId, unseen: &mut UnseenCounter) {
        unseen.clear(&id);
        self.active = Some(id);
    }

    /// Clear the selection.
    ///
    /// Does not touch the unseen map: switching away does not "unsee"
    /// anything.
    pub fn deselect(&mut self) {
        self.active = None;
    }

    /// The active conversation, if any.
    pub fn active(&self) -> Option<&ContactId> {
        self.active.as_ref()
    }
}
