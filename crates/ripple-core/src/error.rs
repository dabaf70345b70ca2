//! Error taxonomy for the sync core.
//!
//! Three failure domains with distinct recovery policies: transport errors
//! are retried with backoff, fetch errors leave the previous roster intact
//! and surface to the caller, and protocol errors drop the single offending
//! event while processing continues.

use std::time::Duration;

use thiserror::Error;

/// Channel open or send failure.
///
/// Retried with exponential backoff up to the configured bound. Only
/// exhaustion of the bound is fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Opening the channel failed.
    #[error("channel open failed: {0}")]
    Open(String),

    /// Opening the channel did not complete within the timeout.
    #[error("channel open timed out after {elapsed:?}")]
    Timeout {
        /// How long we waited.
        elapsed: Duration,
    },

    /// Sending on an open channel failed.
    #[error("channel send failed: {0}")]
    Send(String),
}

/// Directory reload failure.
///
/// The previous roster is retained in full; a failed reload never leaves a
/// partial overwrite. Not retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The directory service could not be reached.
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    /// The fetch did not complete within the timeout.
    #[error("directory fetch timed out after {elapsed:?}")]
    Timeout {
        /// How long we waited.
        elapsed: Duration,
    },

    /// The directory service answered with a non-success status.
    #[error("directory rejected request: status {status}")]
    Rejected {
        /// Status code returned by the service.
        status: u16,
    },
}

impl FetchError {
    /// Returns true if a later identical fetch may succeed.
    ///
    /// Timeouts and unavailability are transient. A rejection means the
    /// request itself is bad and repeating it is pointless.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout { .. })
    }
}

/// Malformed or unrecognized event on the channel.
///
/// The offending event is dropped and logged; replay is meaningless for a
/// malformed message, so there is no retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The event could not be decoded.
    #[error("malformed event: {0}")]
    Malformed(String),

    /// The event decoded to a kind this client does not understand.
    #[error("unrecognized event kind: {0}")]
    UnknownKind(String),
}

/// Umbrella error for sync engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// An engine input arrived in a state that cannot accept it.
    #[error("invalid operation: cannot {operation} while {state}")]
    InvalidState {
        /// Engine state when the input arrived.
        state: &'static str,
        /// Input that was attempted.
        operation: &'static str,
    },

    /// Underlying transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Underlying directory fetch failure.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Underlying protocol failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
