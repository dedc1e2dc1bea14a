//! # netsdr -- Async NetSDR Receiver Control
//!
//! `netsdr` is an asynchronous Rust library for controlling NetSDR-style
//! networked software-defined radio receivers. The protocol runs binary
//! control frames over TCP and streams raw IQ samples over UDP; this
//! crate handles both links, the connection handshake, and the
//! request/reply discipline of the command channel.
//!
//! ## Quick Start
//!
//! Add `netsdr` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! netsdr = "0.3"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Connect to a receiver, tune it, and stream IQ samples:
//!
//! ```no_run
//! use netsdr::{NetSdrClient, TcpControlChannel, UdpDataChannel};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = NetSdrClient::new(
//!         Box::new(TcpControlChannel::new("192.168.1.100:50000")),
//!         Box::new(UdpDataChannel::new(60000)),
//!     );
//!
//!     client.connect().await?;
//!     client.change_frequency(14_074_000, 0).await?;
//!
//!     let mut iq = client.subscribe_iq();
//!     client.start_iq_streaming().await?;
//!     while let Ok(datagram) = iq.recv().await {
//!         // raw IQ sample bytes
//!         let _ = datagram;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                 | Purpose                                      |
//! |-----------------------|----------------------------------------------|
//! | `netsdr-core`         | Channel traits, error types                  |
//! | `netsdr-client`       | Wire codec, control items, client state machine |
//! | `netsdr-transport`    | TCP control and UDP data channel implementations |
//! | `netsdr-test-harness` | Mock channels for hardware-free testing      |
//! | **`netsdr`**          | This facade crate -- re-exports everything   |
//!
//! The client is written against the [`ControlChannel`] and
//! [`DataChannel`] traits rather than sockets, so tests (and unusual
//! deployments) can substitute their own channel implementations.
//!
//! ## Event Subscription
//!
//! The client emits [`ClientEvent`]s through a broadcast channel:
//! connection and streaming lifecycle changes, plus any control message
//! that arrives while no request is waiting:
//!
//! ```no_run
//! use netsdr::{ClientEvent, NetSdrClient};
//! # async fn example(client: &NetSdrClient) {
//! let mut events = client.subscribe();
//! while let Ok(event) = events.recv().await {
//!     match event {
//!         ClientEvent::Unsolicited(msg) => println!("device said: {:?}", msg),
//!         other => println!("{:?}", other),
//!     }
//! }
//! # }
//! ```

pub use netsdr_core::{ControlChannel, DataChannel, Error, Result};

pub use netsdr_client::{
    ClientEvent, ControlItem, FrameError, Message, MessageKind, NetSdrClient,
};

pub use netsdr_transport::{TcpControlChannel, UdpDataChannel};

/// Wire codec: frame encoding and decoding.
pub mod codec {
    pub use netsdr_client::codec::*;
}

/// Control-item parameter layouts and the connection handshake.
pub mod items {
    pub use netsdr_client::items::*;
}
