//! Shared types for the Ripple chat client.
//!
//! Leaf crate with no protocol logic: contact identity and profile types,
//! the event vocabulary delivered by the push channel, the error taxonomy,
//! and the [`Environment`] abstraction that decouples the sync core from
//! system time for deterministic testing.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod contact;
mod env;
mod error;
mod event;

pub use contact::{Contact, ContactId};
pub use env::{Environment, SystemEnv};
pub use error::{FetchError, ProtocolError, SyncError, TransportError};
pub use event::{ChannelEvent, CloseReason};
