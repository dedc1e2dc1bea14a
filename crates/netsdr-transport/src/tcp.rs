//! TCP control channel for NetSDR receivers.
//!
//! This module provides [`TcpControlChannel`], which implements the
//! [`ControlChannel`](netsdr_core::ControlChannel) trait over a TCP
//! connection to the receiver's command port. A background read task
//! forwards every received chunk into an mpsc channel; the client layer
//! decodes frames from those chunks.
//!
//! # Example
//!
//! ```no_run
//! use netsdr_transport::TcpControlChannel;
//! use netsdr_core::ControlChannel;
//!
//! # async fn example() -> netsdr_core::Result<()> {
//! let mut channel = TcpControlChannel::new("192.168.1.100:50000");
//! channel.connect().await?;
//! let incoming = channel.take_incoming().expect("fresh connection");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use netsdr_core::channel::ControlChannel;
use netsdr_core::error::{Error, Result};

/// Default connection timeout (5 seconds).
///
/// Generous enough for LAN receivers and remote links, short enough not
/// to hang a UI when the receiver is unreachable.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read buffer size. Control frames never exceed 8191 bytes, so one
/// read always fits a whole frame.
const READ_BUF_SIZE: usize = 8192;

/// Inbound chunk channel capacity.
const INCOMING_CAPACITY: usize = 64;

/// TCP control channel for NetSDR receivers.
///
/// Created disconnected; [`connect`](ControlChannel::connect) dials the
/// receiver's command port and starts the read task. The read task ends
/// on its own when the peer closes or when
/// [`disconnect`](ControlChannel::disconnect) shuts the socket down, and
/// ending drops the inbound sender so consumers observe end-of-stream.
#[derive(Debug)]
pub struct TcpControlChannel {
    /// The receiver's `host:port` command endpoint.
    addr: String,
    connect_timeout: Duration,
    /// Write half of the stream, `None` while disconnected.
    writer: Option<OwnedWriteHalf>,
    /// Receiver stashed by `connect()` until `take_incoming()` claims it.
    incoming_rx: Option<mpsc::Receiver<Bytes>>,
    /// The background read task, awaited on disconnect.
    read_task: Option<JoinHandle<()>>,
}

impl TcpControlChannel {
    /// Create a channel targeting the given `host:port` endpoint.
    ///
    /// No connection is made until [`connect`](ControlChannel::connect).
    pub fn new(addr: impl Into<String>) -> Self {
        Self::with_timeout(addr, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a channel with a custom connection timeout.
    pub fn with_timeout(addr: impl Into<String>, connect_timeout: Duration) -> Self {
        TcpControlChannel {
            addr: addr.into(),
            connect_timeout,
            writer: None,
            incoming_rx: None,
            read_task: None,
        }
    }

    /// The endpoint this channel targets.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Whether the transport is currently connected.
    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
    }
}

#[async_trait]
impl ControlChannel for TcpControlChannel {
    async fn connect(&mut self) -> Result<()> {
        if self.writer.is_some() {
            return Ok(());
        }

        tracing::debug!(
            addr = %self.addr,
            timeout_ms = self.connect_timeout.as_millis(),
            "connecting to command port"
        );

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| {
                tracing::error!(addr = %self.addr, "TCP connection timed out");
                Error::Transport(format!("connection timed out: {}", self.addr))
            })?
            .map_err(|e| {
                tracing::error!(addr = %self.addr, error = %e, "TCP connection failed");
                map_connect_error(e, &self.addr)
            })?;

        // Control frames are small and latency-sensitive.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!(addr = %self.addr, error = %e, "failed to set TCP_NODELAY");
        }

        let (reader, writer) = stream.into_split();
        let (tx, rx) = mpsc::channel(INCOMING_CAPACITY);

        let addr = self.addr.clone();
        self.read_task = Some(tokio::spawn(read_loop(reader, tx, addr)));
        self.writer = Some(writer);
        self.incoming_rx = Some(rx);

        tracing::info!(addr = %self.addr, "command connection established");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            tracing::debug!(addr = %self.addr, "closing command connection");
            if let Err(e) = writer.shutdown().await {
                tracing::warn!(addr = %self.addr, error = %e, "shutdown failed");
            }
        }

        // The read loop exits once the socket closes; await it so the
        // inbound sender is dropped before we return.
        if let Some(task) = self.read_task.take() {
            task.abort();
            let _ = task.await;
        }
        self.incoming_rx = None;
        Ok(())
    }

    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(addr = %self.addr, bytes = frame.len(), "sending frame");

        writer.write_all(frame).await.map_err(map_io_error)?;
        writer.flush().await.map_err(map_io_error)?;
        Ok(())
    }

    fn take_incoming(&mut self) -> Option<mpsc::Receiver<Bytes>> {
        self.incoming_rx.take()
    }
}

impl Drop for TcpControlChannel {
    fn drop(&mut self) {
        if let Some(task) = self.read_task.take() {
            task.abort();
        }
    }
}

/// Background task forwarding received chunks into the inbound channel.
///
/// Exits when the peer closes, the socket errors, or the consumer side
/// of the channel is dropped. Dropping `tx` on exit is what signals
/// end-of-stream to the consumer.
async fn read_loop(
    mut reader: tokio::net::tcp::OwnedReadHalf,
    tx: mpsc::Sender<Bytes>,
    addr: String,
) {
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                tracing::debug!(addr = %addr, "peer closed command connection");
                break;
            }
            Ok(n) => {
                tracing::trace!(addr = %addr, bytes = n, "received chunk");
                if tx.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
                    // Consumer gone, nothing left to do.
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(addr = %addr, error = %e, "command read failed");
                break;
            }
        }
    }
}

/// Map a connection-time I/O error to the appropriate [`Error`] variant.
fn map_connect_error(e: std::io::Error, addr: &str) -> Error {
    match e.kind() {
        std::io::ErrorKind::ConnectionRefused => {
            Error::Transport(format!("connection refused: {}", addr))
        }
        _ => Error::Io(e),
    }
}

/// Map a data-path I/O error to the appropriate [`Error`] variant.
fn map_io_error(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::NotConnected
        | std::io::ErrorKind::ConnectionAborted => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}
