//! Synchronization engine state machine.
//!
//! Consumes connection-lifecycle signals, channel events, and user actions;
//! updates the roster, presence, unseen, and selection components; and
//! returns actions for the driver to execute. This keeps the state machine
//! pure (no I/O) and makes testing straightforward.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐  opened   ┌───────────┐   closed    ┌──────────────┐
//! │ Disconnected │──────────>│ Connected │────────────>│ Reconnecting │
//! └──────────────┘           └───────────┘             └──────────────┘
//!        ▲                         ▲        opened            │
//!        │                         └──────────────────────────┤
//!        │        retries exhausted / logout                  │
//!        └────────────────────────────────────────────────────┘
//! ```
//!
//! Re-entering `Connected` after a drop triggers a roster reload and a
//! fresh presence snapshot request: a burst of repair work instead of
//! attempting event replay for the gap.

use std::{fmt, time::Duration};

use ripple_core::{ChannelEvent, CloseReason, Contact, ContactId, FetchError, SyncError, TransportError};

use crate::{
    directory::ContactDirectory, presence::PresenceTracker, selection::ConversationSelector,
    unseen::UnseenCounter, view::SyncView,
};

/// Reconnect attempts before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// First backoff delay; doubles on each failed attempt.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Ceiling for the exponential backoff.
pub const DEFAULT_BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Time allowed for a channel open attempt.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed for a directory roster fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest exponent applied to the backoff base; the cap dominates anyway.
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Reconnect attempts before surfacing persistent failure.
    pub max_retries: u32,
    /// First backoff delay.
    pub backoff_base: Duration,
    /// Ceiling for backoff delays.
    pub backoff_cap: Duration,
    /// Timeout for a channel open attempt; expiry counts as a failed
    /// attempt.
    pub open_timeout: Duration,
    /// Timeout for a roster fetch; expiry is a [`FetchError::Timeout`].
    pub fetch_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_cap: DEFAULT_BACKOFF_CAP,
            open_timeout: DEFAULT_OPEN_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl EngineConfig {
    /// Backoff delay for the given zero-based failed-attempt count.
    ///
    /// `base * 2^attempt`, capped at `backoff_cap`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(MAX_BACKOFF_SHIFT);
        self.backoff_base.saturating_mul(factor).min(self.backoff_cap)
    }
}

/// Engine connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// No channel and no reconnection in progress.
    #[default]
    Disconnected,
    /// Channel open; events flow.
    Connected,
    /// Channel dropped; bounded retries with backoff in progress.
    Reconnecting,
}

impl EngineState {
    fn name(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Actions returned by the engine for the driver to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Attempt to open the event channel (with the configured timeout).
    OpenChannel,

    /// Close the event channel.
    CloseChannel,

    /// Wait this long, then feed back
    /// [`retry_elapsed`](SyncEngine::retry_elapsed). The wait is
    /// cancellable; logout and manual reconnect win the race.
    ScheduleRetry {
        /// How long to wait before the next open attempt.
        delay: Duration,
    },

    /// Fetch the full roster and feed back
    /// [`roster_loaded`](SyncEngine::roster_loaded) or
    /// [`roster_failed`](SyncEngine::roster_failed).
    FetchRoster,

    /// Ask the server for a fresh presence snapshot.
    RequestPresence,

    /// Publish a fresh [`SyncView`] snapshot to the rendering layer.
    Publish,

    /// Bounded retries are exhausted; surface the terminal failure signal.
    RetriesExhausted,

    /// Session state is fully cleared; surface the teardown signal.
    SessionEnded,
}

/// The conversation-state synchronization engine.
///
/// Single owner of all mutable core state. Pure state machine: no I/O, no
/// timers; the driver executes [`SyncAction`]s and feeds outcomes back in.
/// Cross-component invariants (active selection has no unseen count,
/// presence and unseen keys stay within the roster) hold after every
/// returned action set.
#[derive(Debug, Clone, Default)]
pub struct SyncEngine {
    /// Current connection state.
    state: EngineState,
    /// Configuration.
    config: EngineConfig,
    /// Failed open attempts in the current reconnect cycle.
    attempts: u32,
    /// Contact roster.
    directory: ContactDirectory,
    /// Who is online.
    presence: PresenceTracker,
    /// Unseen-message counts.
    unseen: UnseenCounter,
    /// Active conversation.
    selection: ConversationSelector,
}

impl SyncEngine {
    /// Create a disconnected engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Initiate the first connection.
    ///
    /// # Errors
    ///
    /// - [`SyncError::InvalidState`] unless disconnected.
    pub fn connect(&mut self) -> Result<Vec<SyncAction>, SyncError> {
        if self.state != EngineState::Disconnected {
            return Err(SyncError::InvalidState { state: self.state.name(), operation: "connect" });
        }

        self.attempts = 0;
        Ok(vec![SyncAction::OpenChannel])
    }

    /// The channel opened successfully.
    ///
    /// Entering `Connected` triggers a roster reload and a fresh presence
    /// snapshot request; after a reconnect this repairs any drift
    /// accumulated while the channel was down.
    ///
    /// # Errors
    ///
    /// - [`SyncError::InvalidState`] if already connected.
    pub fn channel_opened(&mut self) -> Result<Vec<SyncAction>, SyncError> {
        if self.state == EngineState::Connected {
            return Err(SyncError::InvalidState {
                state: self.state.name(),
                operation: "channel_opened",
            });
        }

        tracing::debug!(from = %self.state, "channel opened");
        self.state = EngineState::Connected;
        self.attempts = 0;

        Ok(vec![SyncAction::FetchRoster, SyncAction::RequestPresence, SyncAction::Publish])
    }

    /// The channel dropped (network fault or server close).
    ///
    /// Ignored unless connected; a drop racing a logout is benign.
    pub fn channel_closed(&mut self, reason: &CloseReason) -> Vec<SyncAction> {
        if self.state != EngineState::Connected {
            tracing::debug!(state = %self.state, %reason, "ignoring close");
            return vec![];
        }

        tracing::debug!(%reason, "channel closed, reconnecting");
        self.state = EngineState::Reconnecting;
        self.attempts = 0;

        vec![
            SyncAction::ScheduleRetry { delay: self.config.backoff_delay(0) },
            SyncAction::Publish,
        ]
    }

    /// A scheduled backoff wait elapsed; attempt another open.
    ///
    /// Returns nothing if the reconnect cycle was cancelled in the
    /// meantime (logout, or the channel already recovered).
    pub fn retry_elapsed(&mut self) -> Vec<SyncAction> {
        if self.state != EngineState::Reconnecting {
            return vec![];
        }
        vec![SyncAction::OpenChannel]
    }

    /// An open attempt failed or timed out.
    ///
    /// Schedules the next attempt with exponential backoff until the retry
    /// bound; at the bound the engine gives up and emits
    /// [`SyncAction::RetriesExhausted`] exactly once.
    pub fn open_failed(&mut self, err: &TransportError) -> Vec<SyncAction> {
        if self.state == EngineState::Connected {
            tracing::debug!(error = %err, "ignoring stale open failure");
            return vec![];
        }

        // First-connect failures enter the same retry cycle as drops.
        self.state = EngineState::Reconnecting;
        self.attempts = self.attempts.saturating_add(1);

        if self.attempts >= self.config.max_retries {
            tracing::error!(attempts = self.attempts, error = %err, "reconnect attempts exhausted");
            self.state = EngineState::Disconnected;
            return vec![SyncAction::RetriesExhausted, SyncAction::Publish];
        }

        let delay = self.config.backoff_delay(self.attempts);
        tracing::warn!(attempt = self.attempts, ?delay, error = %err, "open failed, will retry");
        vec![SyncAction::ScheduleRetry { delay }, SyncAction::Publish]
    }

    /// Apply an inbound channel event.
    ///
    /// Events are processed strictly in arrival order. Events arriving
    /// while not connected are dropped; the reconnect repair fetches fresh
    /// state anyway.
    pub fn apply_event(&mut self, event: ChannelEvent) -> Vec<SyncAction> {
        if self.state != EngineState::Connected {
            tracing::debug!(state = %self.state, ?event, "dropping event while not connected");
            return vec![];
        }

        match event {
            ChannelEvent::PresenceSnapshot { ids } => {
                // Stale presence for unknown contacts is dropped up front
                // (the directory may have shrunk since the server built
                // the snapshot).
                let directory = &self.directory;
                self.presence.apply_snapshot(ids.into_iter().filter(|id| directory.contains(id)));
                vec![SyncAction::Publish]
            },
            ChannelEvent::MessageArrived { from } => {
                if !self.directory.contains(&from) {
                    tracing::debug!(%from, "dropping message from sender outside roster");
                    return vec![];
                }
                self.unseen.record_incoming(from, self.selection.active());
                vec![SyncAction::Publish]
            },
            ChannelEvent::ContactAdded { id } => {
                tracing::debug!(%id, "contact added, reloading roster");
                vec![SyncAction::FetchRoster]
            },
            ChannelEvent::ContactRemoved { id } => {
                tracing::debug!(%id, "contact removed, reloading roster");
                vec![SyncAction::FetchRoster]
            },
        }
    }

    /// A roster fetch completed; replace the directory wholesale.
    ///
    /// Identifiers no longer in the roster are cleaned up everywhere: their
    /// unseen entries and presence are dropped, and a removed active
    /// selection is cleared.
    pub fn roster_loaded(&mut self, roster: Vec<Contact>) -> Vec<SyncAction> {
        let removed = self.directory.apply_roster(roster);
        for id in &removed {
            self.unseen.clear(id);
            self.presence.remove(id);
            if self.selection.active() == Some(id) {
                self.selection.deselect();
            }
        }

        tracing::debug!(contacts = self.directory.len(), removed = removed.len(), "roster loaded");
        vec![SyncAction::Publish]
    }

    /// A roster fetch failed; the previous roster stays intact.
    pub fn roster_failed(&self, err: &FetchError) -> Vec<SyncAction> {
        tracing::warn!(error = %err, transient = err.is_transient(), "roster reload failed");
        vec![]
    }

    /// Request a roster reload (user-initiated refresh).
    ///
    /// Only meaningful while connected; session state is not worth
    /// refreshing when there is no session.
    pub fn reload(&self) -> Vec<SyncAction> {
        if self.state != EngineState::Connected {
            return vec![];
        }
        vec![SyncAction::FetchRoster]
    }

    /// Make `id` the active conversation and zero its unseen count.
    ///
    /// One atomic transaction: no observer sees the selection updated with
    /// a stale nonzero unseen count for that contact, nor vice versa.
    /// Selecting an identifier the directory does not know is ignored.
    pub fn select(&mut self, id: ContactId) -> Vec<SyncAction> {
        if !self.directory.contains(&id) {
            tracing::debug!(%id, "ignoring selection of unknown contact");
            return vec![];
        }

        self.selection.select(id, &mut self.unseen);
        vec![SyncAction::Publish]
    }

    /// Clear the active conversation. Unseen counts are untouched.
    pub fn deselect(&mut self) -> Vec<SyncAction> {
        self.selection.deselect();
        vec![SyncAction::Publish]
    }

    /// Tear down the session.
    ///
    /// Clears presence, unseen counts, selection, and the roster; session-
    /// scoped state has no life beyond the session. The teardown signal is
    /// emitted after everything is cleared so the routing layer can safely
    /// navigate away.
    pub fn logout(&mut self) -> Vec<SyncAction> {
        let was_connected = self.state == EngineState::Connected;
        tracing::debug!(state = %self.state, "logout, clearing session state");

        self.state = EngineState::Disconnected;
        self.attempts = 0;
        self.presence.clear();
        self.unseen.clear_all();
        self.selection.deselect();
        self.directory.clear();

        let mut actions = Vec::new();
        if was_connected {
            actions.push(SyncAction::CloseChannel);
        }
        actions.push(SyncAction::Publish);
        actions.push(SyncAction::SessionEnded);
        actions
    }

    /// Current connection state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The contact roster.
    pub fn directory(&self) -> &ContactDirectory {
        &self.directory
    }

    /// Online-presence tracker.
    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Unseen-message counters.
    pub fn unseen(&self) -> &UnseenCounter {
        &self.unseen
    }

    /// The active conversation, if any.
    pub fn active(&self) -> Option<&ContactId> {
        self.selection.active()
    }

    /// Assemble a view snapshot for the rendering layer.
    pub fn view(&self) -> SyncView {
        SyncView {
            connection: self.state,
            contacts: self.directory.contacts().to_vec(),
            online: self.presence.iter().cloned().collect(),
            unseen: self.unseen.iter().map(|(id, count)| (id.clone(), count)).collect(),
            active: self.selection.active().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ContactId {
        ContactId::new(s)
    }

    fn roster() -> Vec<Contact> {
        vec![
            Contact::new("a", "Ada Lovelace"),
            Contact::new("b", "Grace Hopper"),
            Contact::new("c", "Adele Goldberg"),
        ]
    }

    /// Engine in `Connected` with the three-contact roster loaded.
    fn connected_engine() -> SyncEngine {
        let mut engine = SyncEngine::new(EngineConfig::default());
        let _ = engine.connect().unwrap();
        let _ = engine.channel_opened().unwrap();
        let _ = engine.roster_loaded(roster());
        engine
    }

    fn drop_channel(engine: &mut SyncEngine) -> Vec<SyncAction> {
        engine.channel_closed(&CloseReason::Network("reset".to_string()))
    }

    #[test]
    fn starts_disconnected_and_empty() {
        let engine = SyncEngine::new(EngineConfig::default());
        assert_eq!(engine.state(), EngineState::Disconnected);
        assert!(engine.directory().is_empty());
        assert!(engine.active().is_none());
    }

    #[test]
    fn connect_requests_channel_open() {
        let mut engine = SyncEngine::new(EngineConfig::default());
        assert_eq!(engine.connect().unwrap(), [SyncAction::OpenChannel]);
        // Still disconnected until the open outcome arrives.
        assert_eq!(engine.state(), EngineState::Disconnected);
    }

    #[test]
    fn connect_while_connected_is_invalid() {
        let mut engine = connected_engine();
        assert!(matches!(engine.connect(), Err(SyncError::InvalidState { .. })));
    }

    #[test]
    fn opened_channel_triggers_initial_sync() {
        let mut engine = SyncEngine::new(EngineConfig::default());
        let _ = engine.connect().unwrap();
        let actions = engine.channel_opened().unwrap();

        assert_eq!(engine.state(), EngineState::Connected);
        assert_eq!(actions, [
            SyncAction::FetchRoster,
            SyncAction::RequestPresence,
            SyncAction::Publish
        ]);
    }

    #[test]
    fn presence_snapshot_replaces_wholesale() {
        let mut engine = connected_engine();
        let _ = engine.apply_event(ChannelEvent::PresenceSnapshot { ids: vec![id("a"), id("b")] });
        assert!(engine.presence().is_online(&id("a")));

        let _ = engine.apply_event(ChannelEvent::PresenceSnapshot { ids: vec![id("c")] });
        assert!(!engine.presence().is_online(&id("a")));
        assert!(!engine.presence().is_online(&id("b")));
        assert!(engine.presence().is_online(&id("c")));
    }

    #[test]
    fn presence_snapshot_drops_ids_outside_roster() {
        let mut engine = connected_engine();
        let _ = engine
            .apply_event(ChannelEvent::PresenceSnapshot { ids: vec![id("a"), id("stranger")] });

        assert!(engine.presence().is_online(&id("a")));
        assert!(!engine.presence().is_online(&id("stranger")));
        assert_eq!(engine.presence().online_count(), 1);
    }

    #[test]
    fn message_increments_unseen() {
        let mut engine = connected_engine();
        let _ = engine.apply_event(ChannelEvent::MessageArrived { from: id("b") });
        let _ = engine.apply_event(ChannelEvent::MessageArrived { from: id("b") });

        assert_eq!(engine.unseen().count_of(&id("b")), 2);
        assert_eq!(engine.unseen().total(), 2);
    }

    #[test]
    fn message_from_active_conversation_stays_seen() {
        let mut engine = connected_engine();
        let _ = engine.select(id("a"));
        let _ = engine.apply_event(ChannelEvent::MessageArrived { from: id("a") });

        assert_eq!(engine.unseen().count_of(&id("a")), 0);
    }

    #[test]
    fn message_from_unknown_sender_is_dropped() {
        let mut engine = connected_engine();
        let actions = engine.apply_event(ChannelEvent::MessageArrived { from: id("stranger") });

        assert!(actions.is_empty());
        assert_eq!(engine.unseen().total(), 0);
    }

    #[test]
    fn roster_change_events_trigger_reload() {
        let mut engine = connected_engine();
        let actions = engine.apply_event(ChannelEvent::ContactAdded { id: id("d") });
        assert_eq!(actions, [SyncAction::FetchRoster]);

        let actions = engine.apply_event(ChannelEvent::ContactRemoved { id: id("c") });
        assert_eq!(actions, [SyncAction::FetchRoster]);
    }

    #[test]
    fn events_while_not_connected_are_dropped() {
        let mut engine = connected_engine();
        let _ = drop_channel(&mut engine);

        let actions = engine.apply_event(ChannelEvent::MessageArrived { from: id("a") });
        assert!(actions.is_empty());
        assert_eq!(engine.unseen().total(), 0);
    }

    #[test]
    fn select_clears_unseen_atomically() {
        let mut engine = connected_engine();
        for _ in 0..3 {
            let _ = engine.apply_event(ChannelEvent::MessageArrived { from: id("a") });
        }
        assert_eq!(engine.unseen().count_of(&id("a")), 3);

        let _ = engine.select(id("a"));
        assert_eq!(engine.active(), Some(&id("a")));
        assert_eq!(engine.unseen().count_of(&id("a")), 0);

        // The published view carries both halves of the transaction.
        let view = engine.view();
        assert_eq!(view.active, Some(id("a")));
        assert_eq!(view.unseen_count(&id("a")), 0);
    }

    #[test]
    fn select_of_unknown_contact_is_ignored() {
        let mut engine = connected_engine();
        let actions = engine.select(id("stranger"));
        assert!(actions.is_empty());
        assert!(engine.active().is_none());
    }

    #[test]
    fn deselect_does_not_unsee() {
        let mut engine = connected_engine();
        let _ = engine.select(id("a"));
        let _ = engine.apply_event(ChannelEvent::MessageArrived { from: id("b") });

        let _ = engine.deselect();
        assert!(engine.active().is_none());
        assert_eq!(engine.unseen().count_of(&id("b")), 1);
    }

    #[test]
    fn removal_cleanup_covers_all_components() {
        let mut engine = connected_engine();
        let _ = engine.select(id("a"));
        let _ = engine.apply_event(ChannelEvent::PresenceSnapshot { ids: vec![id("a"), id("b")] });
        let _ = engine.apply_event(ChannelEvent::MessageArrived { from: id("b") });
        let _ = engine.select(id("a"));
        let _ = engine.apply_event(ChannelEvent::MessageArrived { from: id("a") });

        // Reload omits "a": selection cleared, presence and unseen dropped.
        let _ = engine.roster_loaded(vec![
            Contact::new("b", "Grace Hopper"),
            Contact::new("c", "Adele Goldberg"),
        ]);

        assert_eq!(engine.active(), None);
        assert!(!engine.presence().is_online(&id("a")));
        assert_eq!(engine.unseen().count_of(&id("a")), 0);
        // Unrelated state survives.
        assert!(engine.presence().is_online(&id("b")));
        assert_eq!(engine.unseen().count_of(&id("b")), 1);
    }

    #[test]
    fn failed_reload_keeps_previous_roster() {
        let engine = connected_engine();
        let actions = engine.roster_failed(&FetchError::Rejected { status: 503 });
        assert!(actions.is_empty());
        assert_eq!(engine.directory().len(), 3);
    }

    #[test]
    fn reconnect_repair_requests_roster_and_presence_once() {
        let mut engine = connected_engine();
        let _ = engine.apply_event(ChannelEvent::PresenceSnapshot { ids: vec![id("a"), id("b")] });

        let actions = drop_channel(&mut engine);
        assert_eq!(engine.state(), EngineState::Reconnecting);
        assert!(matches!(actions.first(), Some(SyncAction::ScheduleRetry { .. })));

        let actions = engine.retry_elapsed();
        assert_eq!(actions, [SyncAction::OpenChannel]);

        let actions = engine.channel_opened().unwrap();
        assert_eq!(engine.state(), EngineState::Connected);
        let fetches = actions.iter().filter(|a| **a == SyncAction::FetchRoster).count();
        let presence = actions.iter().filter(|a| **a == SyncAction::RequestPresence).count();
        assert_eq!((fetches, presence), (1, 1));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let config = EngineConfig {
            backoff_base: Duration::from_millis(500),
            backoff_cap: Duration::from_secs(3),
            ..EngineConfig::default()
        };
        assert_eq!(config.backoff_delay(0), Duration::from_millis(500));
        assert_eq!(config.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(config.backoff_delay(3), Duration::from_secs(3));
        assert_eq!(config.backoff_delay(10), Duration::from_secs(3));
    }

    #[test]
    fn open_failures_schedule_growing_delays() {
        let mut engine = connected_engine();
        let _ = drop_channel(&mut engine);
        let err = TransportError::Open("refused".to_string());

        let first = engine.open_failed(&err);
        let second = engine.open_failed(&err);

        let delay_of = |actions: &[SyncAction]| match actions.first() {
            Some(SyncAction::ScheduleRetry { delay }) => *delay,
            other => panic!("expected ScheduleRetry, got {other:?}"),
        };
        assert_eq!(delay_of(&first), Duration::from_secs(1));
        assert_eq!(delay_of(&second), Duration::from_secs(2));
    }

    #[test]
    fn retry_exhaustion_signals_exactly_once() {
        let mut engine = connected_engine();
        let _ = drop_channel(&mut engine);
        let err = TransportError::Timeout { elapsed: Duration::from_secs(10) };

        let mut exhausted = 0;
        for _ in 0..DEFAULT_MAX_RETRIES {
            let actions = engine.open_failed(&err);
            exhausted += actions.iter().filter(|a| **a == SyncAction::RetriesExhausted).count();
        }

        assert_eq!(exhausted, 1);
        assert_eq!(engine.state(), EngineState::Disconnected);

        // Once disconnected, the dead cycle produces nothing further.
        assert!(engine.retry_elapsed().is_empty());
    }

    #[test]
    fn retry_elapsed_after_cancel_is_inert() {
        let mut engine = connected_engine();
        let _ = drop_channel(&mut engine);
        let _ = engine.logout();

        assert!(engine.retry_elapsed().is_empty());
    }

    #[test]
    fn logout_clears_session_state_and_signals_once() {
        let mut engine = connected_engine();
        let _ = engine.select(id("a"));
        let _ = engine.apply_event(ChannelEvent::PresenceSnapshot { ids: vec![id("b")] });
        let _ = engine.apply_event(ChannelEvent::MessageArrived { from: id("c") });

        let actions = engine.logout();

        assert_eq!(engine.state(), EngineState::Disconnected);
        assert!(engine.directory().is_empty());
        assert_eq!(engine.presence().online_count(), 0);
        assert!(engine.unseen().is_empty());
        assert!(engine.active().is_none());

        let ended = actions.iter().filter(|a| **a == SyncAction::SessionEnded).count();
        assert_eq!(ended, 1);
        // Teardown signal comes after everything else.
        assert_eq!(actions.last(), Some(&SyncAction::SessionEnded));
        assert_eq!(actions.first(), Some(&SyncAction::CloseChannel));
    }

    #[test]
    fn reload_is_gated_on_connection() {
        let engine = SyncEngine::new(EngineConfig::default());
        assert!(engine.reload().is_empty());

        let engine = connected_engine();
        assert_eq!(engine.reload(), [SyncAction::FetchRoster]);
    }

    #[test]
    fn view_snapshot_reflects_components() {
        let mut engine = connected_engine();
        let _ = engine.apply_event(ChannelEvent::PresenceSnapshot { ids: vec![id("a")] });
        let _ = engine.apply_event(ChannelEvent::MessageArrived { from: id("b") });
        let _ = engine.select(id("c"));

        let view = engine.view();
        assert_eq!(view.connection, EngineState::Connected);
        assert_eq!(view.contacts.len(), 3);
        assert!(view.is_online(&id("a")));
        assert_eq!(view.unseen_count(&id("b")), 1);
        assert_eq!(view.active, Some(id("c")));
    }
}
