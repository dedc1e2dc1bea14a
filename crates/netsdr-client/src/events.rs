//! Client event types.
//!
//! Events are emitted through a [`tokio::sync::broadcast`] channel as the
//! client's state changes and as unsolicited control messages arrive.
//! Delivery is best-effort through a bounded channel; slow consumers may
//! miss events under load.

use crate::codec::Message;

/// An event emitted by [`NetSdrClient`](crate::NetSdrClient).
///
/// Subscribe via [`NetSdrClient::subscribe`](crate::NetSdrClient::subscribe).
/// Inbound control frames that arrive while no request is waiting are
/// dispatched here as [`Unsolicited`](ClientEvent::Unsolicited) -- replies
/// to a pending request never appear on this channel.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// The control channel connected and the handshake completed.
    Connected,

    /// The client disconnected from the receiver.
    Disconnected,

    /// IQ streaming was started.
    StreamingStarted,

    /// IQ streaming was stopped.
    StreamingStopped,

    /// A control message arrived with no request outstanding.
    Unsolicited(Message),
}
