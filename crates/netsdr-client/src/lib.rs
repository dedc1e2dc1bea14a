//! NetSDR binary protocol codec and client state machine.
//!
//! This crate implements the NetSDR control/data protocol used by
//! networked SDR receivers. It provides:
//!
//! - **Wire codec** ([`codec`]) -- encode and decode the 16-bit-header
//!   binary frame format, with a closed message-kind enum and typed
//!   decode errors that never panic on malformed input.
//! - **Control items** ([`items`]) -- parameter payload layouts for the
//!   receiver-state, frequency, sample-rate, gain, and A/D-mode items,
//!   plus the fixed connection handshake.
//! - **Client** ([`client`]) -- the [`NetSdrClient`] connection state
//!   machine: idempotent connect with handshake, guarded IQ streaming
//!   start/stop, frequency tuning, and single-in-flight request/reply
//!   correlation over channels injected via the
//!   [`ControlChannel`](netsdr_core::ControlChannel) and
//!   [`DataChannel`](netsdr_core::DataChannel) traits.
//! - **Events** ([`events`]) -- broadcast [`ClientEvent`] notifications
//!   for lifecycle changes and unsolicited messages.
//!
//! # Architecture
//!
//! The protocol uses a split transport: TCP for control frames (a 13-bit
//! length and 3-bit kind packed into a little-endian u16 header, then an
//! optional item code and parameters) and UDP for the real-time IQ
//! sample stream. The client decodes control traffic and resolves
//! replies; IQ datagrams are forwarded to subscribers untouched.

pub mod client;
pub mod codec;
pub mod events;
pub mod items;

pub use client::NetSdrClient;
pub use codec::{ControlItem, FrameError, Message, MessageKind};
pub use events::ClientEvent;
