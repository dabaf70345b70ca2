//! Events delivered by the push channel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contact::ContactId;

/// An event pushed by the server over the duplex channel.
///
/// The sync core never interprets message payloads, only the sender
/// identifier; content routing belongs to the conversation view, which is
/// outside this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelEvent {
    /// Full replacement of the set of currently-online contacts.
    ///
    /// Snapshots are not assumed reliable or order-preserving across
    /// reconnects, so they replace the presence set wholesale.
    PresenceSnapshot {
        /// Identifiers of every contact currently online.
        ids: Vec<ContactId>,
    },

    /// A message arrived from a contact.
    MessageArrived {
        /// Identifier of the sender.
        from: ContactId,
    },

    /// A contact was added to the roster server-side.
    ContactAdded {
        /// Identifier of the added contact.
        id: ContactId,
    },

    /// A contact was removed from the roster server-side.
    ContactRemoved {
        /// Identifier of the removed contact.
        id: ContactId,
    },
}

/// Why the channel closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    /// The server closed the connection.
    Server(String),
    /// The connection dropped due to a network fault.
    Network(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(reason) => write!(f, "server close: {reason}"),
            Self::Network(reason) => write!(f, "network fault: {reason}"),
        }
    }
}
