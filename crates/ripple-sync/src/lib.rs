//! Conversation-state synchronization core.
//!
//! Keeps a user's contact roster, online-presence set, active conversation,
//! and per-contact unseen-message counters consistent while presence and
//! message events arrive asynchronously and the user performs local actions
//! (selecting a contact, searching, logging out).
//!
//! # Architecture
//!
//! The core follows the Sans-IO action pattern: [`SyncEngine`] is a pure
//! state machine that consumes inputs and returns [`SyncAction`]s for the
//! caller to execute. [`SyncRuntime`] is the tokio driver that wires the
//! engine to a concrete [`EventChannel`] and [`DirectoryFetch`], serializes
//! every mutation through one task, and publishes immutable [`SyncView`]
//! snapshots for the rendering layer.
//!
//! # Components
//!
//! - [`ContactDirectory`]: roster storage and search filtering
//! - [`PresenceTracker`]: set of currently-online contacts
//! - [`UnseenCounter`]: per-contact unseen-message counts
//! - [`ConversationSelector`]: the single active conversation
//! - [`SyncEngine`]: orchestrating state machine tying them together
//! - [`SyncRuntime`] / [`SyncHandle`]: async driver and caller-side handle

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod channel;
mod directory;
mod engine;
mod presence;
mod runtime;
mod selection;
mod unseen;
mod view;

pub use channel::{DirectoryFetch, EventChannel};
pub use directory::ContactDirectory;
pub use engine::{EngineConfig, EngineState, SyncAction, SyncEngine};
pub use presence::PresenceTracker;
pub use ripple_core::{
    ChannelEvent, CloseReason, Contact, ContactId, Environment, FetchError, ProtocolError,
    SyncError, SystemEnv, TransportError,
};
pub use runtime::{Command, SyncHandle, SyncRuntime};
pub use selection::ConversationSelector;
pub use unseen::UnseenCounter;
pub use view::{SessionSignal, SyncView};
