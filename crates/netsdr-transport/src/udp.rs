//! UDP data channel for the NetSDR IQ sample stream.
//!
//! This module provides [`UdpDataChannel`], which implements the
//! [`DataChannel`](netsdr_core::DataChannel) trait. While streaming, a
//! NetSDR receiver pushes IQ sample datagrams to a known UDP port on
//! the host; this channel binds that port and forwards each datagram
//! payload, untouched, into an mpsc channel.
//!
//! # Example
//!
//! ```no_run
//! use netsdr_transport::UdpDataChannel;
//! use netsdr_core::DataChannel;
//!
//! # async fn example() -> netsdr_core::Result<()> {
//! let mut channel = UdpDataChannel::new(60000);
//! let mut datagrams = channel.start().await?;
//! while let Some(payload) = datagrams.recv().await {
//!     // raw IQ bytes, exactly as received
//! }
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use netsdr_core::channel::DataChannel;
use netsdr_core::error::{Error, Result};

/// Receive buffer size. NetSDR data datagrams are at most 8191 bytes of
/// frame, so one buffer always holds a whole datagram.
const RECV_BUF_SIZE: usize = 8192;

/// Datagram channel capacity. Sized for bursts at high sample rates; a
/// consumer that falls further behind than this loses datagrams, which
/// is acceptable for a real-time stream.
const DATAGRAM_CAPACITY: usize = 1024;

/// UDP data channel for the IQ sample stream.
///
/// Created stopped; [`start`](DataChannel::start) binds the port and
/// spawns the receive loop. [`stop`](DataChannel::stop) cancels the
/// loop, awaits it, and releases the socket so a later `start` can bind
/// the same port again.
#[derive(Debug)]
pub struct UdpDataChannel {
    /// Local bind address for the datagram socket.
    bind_addr: SocketAddr,
    recv_task: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
}

impl UdpDataChannel {
    /// Create a channel that will listen on the given port on all
    /// interfaces. NetSDR receivers default to port 60000.
    pub fn new(port: u16) -> Self {
        Self::with_addr(SocketAddr::from(([0, 0, 0, 0], port)))
    }

    /// Create a channel with an explicit bind address.
    pub fn with_addr(bind_addr: SocketAddr) -> Self {
        UdpDataChannel {
            bind_addr,
            recv_task: None,
            cancel: None,
        }
    }

    /// The address this channel binds when started.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

#[async_trait]
impl DataChannel for UdpDataChannel {
    async fn start(&mut self) -> Result<mpsc::Receiver<Bytes>> {
        if self.recv_task.is_some() {
            return Err(Error::Transport("data channel already started".into()));
        }

        tracing::debug!(addr = %self.bind_addr, "binding IQ data socket");
        let socket = UdpSocket::bind(self.bind_addr).await.map_err(|e| {
            tracing::error!(addr = %self.bind_addr, error = %e, "failed to bind IQ data socket");
            Error::Io(e)
        })?;

        let (tx, rx) = mpsc::channel(DATAGRAM_CAPACITY);
        let cancel = CancellationToken::new();

        self.recv_task = Some(tokio::spawn(recv_loop(socket, tx, cancel.clone())));
        self.cancel = Some(cancel);

        tracing::info!(addr = %self.bind_addr, "IQ data channel listening");
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(task) = self.recv_task.take() {
            let _ = task.await;
            tracing::debug!(addr = %self.bind_addr, "IQ data channel stopped");
        }
        Ok(())
    }
}

impl Drop for UdpDataChannel {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }
}

/// Background task forwarding datagram payloads into the channel.
///
/// Holds the socket for its whole lifetime; cancellation is the only
/// clean exit, and dropping `tx` on exit signals end-of-stream.
async fn recv_loop(socket: UdpSocket, tx: mpsc::Sender<Bytes>, cancel: CancellationToken) {
    let mut buf = vec![0u8; RECV_BUF_SIZE];
    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                tracing::debug!("IQ receive loop cancelled");
                break;
            }

            result = socket.recv_from(&mut buf) => match result {
                Ok((n, src)) => {
                    tracing::trace!(bytes = n, remote = %src, "received IQ datagram");
                    if tx.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
                        // Consumer gone, nothing left to do.
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "IQ datagram receive failed");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Helper: a started channel on an OS-assigned loopback port, plus a
    /// sender socket aimed at it.
    async fn loopback_pair() -> (UdpDataChannel, mpsc::Receiver<Bytes>, UdpSocket, SocketAddr) {
        // Bind first to learn a free port, then hand that port to the
        // channel. The race window is negligible on loopback.
        let probe = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = probe.local_addr().unwrap();
        drop(probe);

        let mut channel = UdpDataChannel::with_addr(addr);
        let rx = channel.start().await.unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        (channel, rx, sender, addr)
    }

    #[tokio::test]
    async fn forwards_datagrams_untouched() {
        let (_channel, mut rx, sender, addr) = loopback_pair().await;

        let payload = [0x04, 0x84, 0xAB, 0xCD];
        sender.send_to(&payload, addr).await.unwrap();

        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&received[..], &payload);
    }

    #[tokio::test]
    async fn preserves_datagram_order() {
        let (_channel, mut rx, sender, addr) = loopback_pair().await;

        for i in 0u8..3 {
            sender.send_to(&[i], addr).await.unwrap();
        }

        for i in 0u8..3 {
            let dgram = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(&dgram[..], &[i]);
        }
    }

    #[tokio::test]
    async fn stop_ends_stream_and_releases_port() {
        let (mut channel, mut rx, _sender, addr) = loopback_pair().await;

        channel.stop().await.unwrap();
        assert!(rx.recv().await.is_none());

        // The port is free again; a fresh start can bind it.
        let mut again = UdpDataChannel::with_addr(addr);
        let _rx2 = again.start().await.unwrap();
        again.stop().await.unwrap();
    }

    #[tokio::test]
    async fn double_start_errors() {
        let (mut channel, _rx, _sender, _addr) = loopback_pair().await;

        let result = channel.start().await;
        assert!(matches!(result, Err(Error::Transport(_))));

        channel.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_without_start_is_safe() {
        let mut channel = UdpDataChannel::new(0);
        channel.stop().await.unwrap();
    }

    #[tokio::test]
    async fn large_datagram() {
        let (_channel, mut rx, sender, addr) = loopback_pair().await;

        // 1500 bytes is a typical Ethernet MTU, the practical datagram
        // size on a real network.
        let payload: Vec<u8> = (0..1500).map(|i| (i % 256) as u8).collect();
        sender.send_to(&payload, addr).await.unwrap();

        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&received[..], &payload[..]);
    }
}
