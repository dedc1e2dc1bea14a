//! netsdr-core: Core traits and error definitions for the NetSDR client.
//!
//! This crate defines the transport-agnostic abstractions the protocol
//! client is built on. Applications and test harnesses depend on these
//! types without pulling in real sockets.
//!
//! # Key types
//!
//! - [`ControlChannel`] -- the TCP command link
//! - [`DataChannel`] -- the UDP IQ data link
//! - [`Error`] / [`Result`] -- error handling

pub mod channel;
pub mod error;

// Re-export key types at crate root for ergonomic `use netsdr_core::*`.
pub use channel::{ControlChannel, DataChannel};
pub use error::{Error, Result};
