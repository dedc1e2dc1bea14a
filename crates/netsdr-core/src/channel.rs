//! Channel traits for NetSDR communication.
//!
//! A NetSDR receiver exposes two links: a TCP control channel carrying
//! request/response command frames, and a UDP data channel carrying the
//! continuous IQ sample stream. The [`ControlChannel`] and [`DataChannel`]
//! traits abstract those links so the protocol client can run against real
//! sockets (`netsdr-transport`) or deterministic mocks
//! (`netsdr-test-harness`).
//!
//! Inbound bytes are delivered as raw chunks through a
//! [`tokio::sync::mpsc`] receiver. One chunk is one read off the wire, not
//! one logical message: the protocol layer must validate framing itself.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Result;

/// The TCP command link to a NetSDR receiver.
///
/// Implementations own the socket lifecycle and a background read loop.
/// Chunks read off the wire are pushed into the receiver handed out by
/// [`take_incoming`](ControlChannel::take_incoming); the sender side is
/// dropped when the connection closes, so the consumer observes loss of
/// the link as end-of-stream.
#[async_trait]
pub trait ControlChannel: Send + Sync {
    /// Open the transport connection.
    ///
    /// On failure the channel stays disconnected and the error is
    /// returned to the caller.
    async fn connect(&mut self) -> Result<()>;

    /// Close the transport and stop the read loop.
    ///
    /// Safe to call in any state; closing an already-closed channel is a
    /// no-op. The read loop must be fully stopped (not merely signalled)
    /// before this returns.
    async fn disconnect(&mut self) -> Result<()>;

    /// Send a fully-encoded frame.
    ///
    /// Implementations block until all bytes are written to the socket.
    async fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Take the inbound chunk receiver.
    ///
    /// Returns `None` if the receiver was already taken or the channel has
    /// never been connected. There is exactly one consumer of inbound
    /// traffic -- the client's inbound task.
    fn take_incoming(&mut self) -> Option<mpsc::Receiver<Bytes>>;
}

/// The UDP data link carrying IQ datagrams.
///
/// The listening loop is started and stopped by the protocol client;
/// datagram payloads pass through untouched.
#[async_trait]
pub trait DataChannel: Send + Sync {
    /// Bind the socket and start the listening loop.
    ///
    /// Returns a receiver of raw datagrams. The loop runs until
    /// [`stop`](DataChannel::stop); a datagram already read when stop is
    /// requested may still be delivered, but the loop must not block
    /// afterwards.
    async fn start(&mut self) -> Result<mpsc::Receiver<Bytes>>;

    /// Stop the listening loop and close the socket.
    ///
    /// Awaits loop termination; safe to call when not listening.
    async fn stop(&mut self) -> Result<()>;
}
