//! Network transports for NetSDR receivers.
//!
//! This crate provides the socket-level implementations of the channel
//! traits from `netsdr-core`:
//!
//! - [`TcpControlChannel`] -- the command link. NetSDR receivers accept
//!   a TCP connection (port 50000 by default) carrying binary control
//!   frames in both directions.
//! - [`UdpDataChannel`] -- the IQ data link. While streaming, the
//!   receiver pushes UDP datagrams of IQ samples to a port on the host
//!   (60000 by default).
//!
//! Both channels run a background read loop that forwards received
//! bytes into an [`mpsc`](tokio::sync::mpsc) channel; the client layer
//! consumes those without touching sockets directly.

pub mod tcp;
pub mod udp;

pub use tcp::TcpControlChannel;
pub use udp::UdpDataChannel;
