//! Consumed external interfaces.
//!
//! The sync core does not define a transport; it consumes a push-capable
//! [`EventChannel`] and a request/response [`DirectoryFetch`]. Production
//! code implements these over its real connection (for example a WebSocket
//! and an HTTP roster endpoint); the test harness substitutes scripted
//! implementations.

use std::future::Future;

use ripple_core::{ChannelEvent, Contact, FetchError, ProtocolError, TransportError};

/// A persistent duplex channel delivering an ordered-per-connection stream
/// of [`ChannelEvent`]s.
///
/// The runtime opens the channel, drains events until it yields `None`
/// (closed), and reopens it for each reconnect attempt.
pub trait EventChannel: Send {
    /// Open (or reopen) the channel.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the channel cannot be established.
    /// The runtime races this against the configured open timeout.
    fn open(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receive the next event.
    ///
    /// `None` means the channel closed. `Some(Err(_))` is a single
    /// malformed event; the stream continues past it.
    fn recv(
        &mut self,
    ) -> impl Future<Output = Option<Result<ChannelEvent, ProtocolError>>> + Send;

    /// Ask the server to push a fresh presence snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request cannot be sent.
    fn request_presence(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Close the channel. Idempotent.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Request/response fetch of the full contact roster.
pub trait DirectoryFetch: Send {
    /// Fetch the complete roster.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on any non-success response; the caller keeps
    /// its previous roster in that case.
    fn fetch_roster(&mut self) -> impl Future<Output = Result<Vec<Contact>, FetchError>> + Send;
}
