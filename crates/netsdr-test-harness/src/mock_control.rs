//! Mock control channel for deterministic client testing.
//!
//! [`MockControlChannel`] implements the
//! [`ControlChannel`](netsdr_core::ControlChannel) trait entirely in
//! memory. Every sent frame is logged; the paired [`MockControlHandle`]
//! reads the log, counts connect/disconnect calls, and injects inbound
//! chunks as if the device had sent them.
//!
//! # Example
//!
//! ```
//! use netsdr_test_harness::MockControlChannel;
//!
//! // Echo mode mirrors each sent frame back as an inbound chunk,
//! // which is how a device acknowledging every command behaves.
//! let mock = MockControlChannel::new().with_echo(true);
//! let handle = mock.handle();
//! // Box the mock into a client, then assert via `handle.sent()`.
//! ```

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use netsdr_core::channel::ControlChannel;
use netsdr_core::error::{Error, Result};

/// Inbound channel capacity; generous so tests never block on injection.
const INCOMING_CAPACITY: usize = 64;

/// State shared between the mock and its handles.
#[derive(Debug, Default)]
struct Shared {
    /// Every frame passed to `send()`, in order.
    sent: Mutex<Vec<Vec<u8>>>,
    /// Sender side of the inbound chunk stream, present while connected.
    incoming_tx: Mutex<Option<mpsc::Sender<Bytes>>>,
    connect_count: AtomicUsize,
    disconnect_count: AtomicUsize,
    connected: AtomicBool,
}

/// A mock [`ControlChannel`] for testing clients without a receiver.
///
/// Created disconnected; `connect()` opens the inbound stream and
/// `take_incoming()` hands out its receiver. `disconnect()` drops the
/// inbound sender so consumers observe end-of-stream, matching the real
/// transport contract.
#[derive(Debug)]
pub struct MockControlChannel {
    shared: Arc<Shared>,
    /// Receiver stashed by `connect()` until `take_incoming()` claims it.
    incoming_rx: Option<mpsc::Receiver<Bytes>>,
    echo: bool,
    fail_connect: bool,
    latency: Option<Duration>,
}

impl MockControlChannel {
    /// Create a new mock control channel in the disconnected state.
    pub fn new() -> Self {
        MockControlChannel {
            shared: Arc::new(Shared::default()),
            incoming_rx: None,
            echo: false,
            fail_connect: false,
            latency: None,
        }
    }

    /// Enable echo mode: each sent frame is mirrored back verbatim as an
    /// inbound chunk, emulating a device that acknowledges every command.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Make `connect()` fail with a transport error.
    pub fn fail_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Add a delay to every `connect()` and `send()` call.
    ///
    /// Emulates network round-trip time, which widens race windows in
    /// tests that exercise concurrent client operations.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Get a handle for inspecting and driving this mock after it has
    /// been moved into a client.
    pub fn handle(&self) -> MockControlHandle {
        MockControlHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Default for MockControlChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ControlChannel for MockControlChannel {
    async fn connect(&mut self) -> Result<()> {
        if self.fail_connect {
            return Err(Error::Transport("mock connect refused".into()));
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let (tx, rx) = mpsc::channel(INCOMING_CAPACITY);
        *self.shared.incoming_tx.lock().unwrap() = Some(tx);
        self.incoming_rx = Some(rx);

        self.shared.connect_count.fetch_add(1, Ordering::SeqCst);
        self.shared.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        // Dropping the sender ends the inbound stream for any consumer.
        self.shared.incoming_tx.lock().unwrap().take();
        self.incoming_rx = None;

        self.shared.disconnect_count.fetch_add(1, Ordering::SeqCst);
        self.shared.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        if !self.shared.connected.load(Ordering::SeqCst) {
            return Err(Error::NotConnected);
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.shared.sent.lock().unwrap().push(frame.to_vec());

        if self.echo {
            let tx = self.shared.incoming_tx.lock().unwrap().clone();
            if let Some(tx) = tx {
                let _ = tx.send(Bytes::copy_from_slice(frame)).await;
            }
        }
        Ok(())
    }

    fn take_incoming(&mut self) -> Option<mpsc::Receiver<Bytes>> {
        self.incoming_rx.take()
    }
}

impl MockControlChannel {
    /// Whether the mock is in the connected state.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }
}

/// Inspection and injection handle for a [`MockControlChannel`].
///
/// Cheap to clone; all handles observe the same mock.
#[derive(Debug, Clone)]
pub struct MockControlHandle {
    shared: Arc<Shared>,
}

impl MockControlHandle {
    /// Every frame sent through the mock so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.shared.sent.lock().unwrap().clone()
    }

    /// How many times `connect()` was called.
    pub fn connect_count(&self) -> usize {
        self.shared.connect_count.load(Ordering::SeqCst)
    }

    /// How many times `disconnect()` was called.
    pub fn disconnect_count(&self) -> usize {
        self.shared.disconnect_count.load(Ordering::SeqCst)
    }

    /// Inject an inbound chunk, as if the device had sent it.
    ///
    /// Silently dropped when the mock is disconnected.
    pub async fn inject(&self, chunk: &[u8]) {
        let tx = self.shared.incoming_tx.lock().unwrap().clone();
        if let Some(tx) = tx {
            let _ = tx.send(Bytes::copy_from_slice(chunk)).await;
        }
    }
}
