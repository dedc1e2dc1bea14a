//! Mock data channel for testing IQ stream handling.
//!
//! [`MockDataChannel`] implements the
//! [`DataChannel`](netsdr_core::DataChannel) trait without a socket:
//! `start()` opens an in-memory datagram stream and the paired
//! [`MockDataHandle`] injects payloads into it and counts start/stop
//! calls.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use netsdr_core::channel::DataChannel;
use netsdr_core::error::Result;

/// Datagram channel capacity; generous so tests never block on injection.
const DATAGRAM_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct Shared {
    /// Sender side of the datagram stream, present while started.
    datagram_tx: Mutex<Option<mpsc::Sender<Bytes>>>,
    start_count: AtomicUsize,
    stop_count: AtomicUsize,
}

/// A mock [`DataChannel`] for testing clients without a UDP socket.
#[derive(Debug)]
pub struct MockDataChannel {
    shared: Arc<Shared>,
}

impl MockDataChannel {
    /// Create a new mock data channel in the stopped state.
    pub fn new() -> Self {
        MockDataChannel {
            shared: Arc::new(Shared::default()),
        }
    }

    /// Get a handle for driving this mock after it has been moved into a
    /// client.
    pub fn handle(&self) -> MockDataHandle {
        MockDataHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Default for MockDataChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataChannel for MockDataChannel {
    async fn start(&mut self) -> Result<mpsc::Receiver<Bytes>> {
        let (tx, rx) = mpsc::channel(DATAGRAM_CAPACITY);
        *self.shared.datagram_tx.lock().unwrap() = Some(tx);
        self.shared.start_count.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        // Only count stops that actually closed a running stream, so a
        // guarded no-op path in the client stays observable.
        if self.shared.datagram_tx.lock().unwrap().take().is_some() {
            self.shared.stop_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Inspection and injection handle for a [`MockDataChannel`].
///
/// Cheap to clone; all handles observe the same mock.
#[derive(Debug, Clone)]
pub struct MockDataHandle {
    shared: Arc<Shared>,
}

impl MockDataHandle {
    /// How many times `start()` was called.
    pub fn start_count(&self) -> usize {
        self.shared.start_count.load(Ordering::SeqCst)
    }

    /// How many times `stop()` closed a running stream.
    pub fn stop_count(&self) -> usize {
        self.shared.stop_count.load(Ordering::SeqCst)
    }

    /// Inject a datagram payload, as if one had arrived on the socket.
    ///
    /// Silently dropped when the channel is not started.
    pub async fn inject(&self, payload: &[u8]) {
        let tx = self.shared.datagram_tx.lock().unwrap().clone();
        if let Some(tx) = tx {
            let _ = tx.send(Bytes::copy_from_slice(payload)).await;
        }
    }
}
