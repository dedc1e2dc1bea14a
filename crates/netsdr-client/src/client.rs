//! NetSDR protocol client.
//!
//! [`NetSdrClient`] owns the connection lifecycle over an injected
//! [`ControlChannel`] (TCP commands) and [`DataChannel`] (UDP IQ
//! datagrams). It performs the fixed 3-frame handshake on connect,
//! exposes frequency tuning and IQ stream start/stop, and correlates
//! inbound control traffic with the single outstanding request.
//!
//! The wire format carries no correlation identifier, so at most one
//! control request can be in flight: [`request`](NetSdrClient::request)
//! holds an internal lock for the whole send-and-await cycle and resolves
//! with the next decoded inbound frame. Inbound frames that arrive with
//! no request waiting are broadcast as
//! [`ClientEvent::Unsolicited`]; IQ datagrams pass through untouched to
//! [`subscribe_iq`](NetSdrClient::subscribe_iq) subscribers.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use netsdr_core::channel::{ControlChannel, DataChannel};
use netsdr_core::error::{Error, Result};

use crate::codec::{self, FrameError, Message};
use crate::events::ClientEvent;
use crate::items;

/// Broadcast channel capacity for ClientEvent subscribers.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Broadcast channel capacity for IQ datagram subscribers.
const IQ_CHANNEL_CAPACITY: usize = 1024;

/// Control-channel connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Disconnected,
    Connected,
}

/// IQ streaming state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamingState {
    Idle,
    Streaming,
}

/// The result handed to a request waiter: the decoded reply, or the
/// decode-failure marker when the reply chunk was malformed.
type ReplySlot = Option<oneshot::Sender<std::result::Result<Message, FrameError>>>;

/// NetSDR protocol client and state machine.
///
/// The client is safe to share across tasks via interior mutability;
/// all public operations take `&self`. Lifecycle operations (connect,
/// disconnect, streaming start/stop) are serialized internally, so
/// concurrent callers see each operation's state check and transition
/// as one step: two racing `connect()` calls still produce a single
/// transport connect and one handshake.
///
/// State transitions:
///
/// ```text
/// Disconnected --connect--> Connected --start_iq--> Streaming
///       ^                      |  ^                     |
///       |                      |  +-------stop_iq-------+
///       +-----disconnect-------+----------disconnect----+
/// ```
pub struct NetSdrClient {
    /// The TCP command link.
    control: Arc<Mutex<Box<dyn ControlChannel>>>,

    /// The UDP IQ data link.
    data: Arc<Mutex<Box<dyn DataChannel>>>,

    connection: Arc<Mutex<ConnectionState>>,
    streaming: Arc<Mutex<StreamingState>>,

    /// Single reply slot shared with the inbound task. The wire format
    /// has no correlation id, so there is never more than one waiter.
    pending: Arc<Mutex<ReplySlot>>,

    /// Serializes request send-and-await cycles (single in-flight rule).
    request_gate: Arc<Mutex<()>>,

    /// Serializes the lifecycle operations (connect, disconnect, start
    /// and stop streaming) so each one's state check and transition are
    /// atomic with respect to concurrent callers.
    session_gate: Mutex<()>,

    event_tx: broadcast::Sender<ClientEvent>,
    iq_tx: broadcast::Sender<Bytes>,

    /// Background task decoding control-channel chunks.
    inbound_task: Mutex<Option<JoinHandle<()>>>,

    /// Background task forwarding IQ datagrams, with its cancellation
    /// token. Both are awaited to completion on stop/disconnect.
    forward_task: Mutex<Option<JoinHandle<()>>>,
    forward_cancel: Mutex<Option<CancellationToken>>,
}

impl NetSdrClient {
    /// Create a client over the given channels.
    ///
    /// No I/O happens until [`connect`](NetSdrClient::connect).
    pub fn new(control: Box<dyn ControlChannel>, data: Box<dyn DataChannel>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (iq_tx, _) = broadcast::channel(IQ_CHANNEL_CAPACITY);

        Self {
            control: Arc::new(Mutex::new(control)),
            data: Arc::new(Mutex::new(data)),
            connection: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            streaming: Arc::new(Mutex::new(StreamingState::Idle)),
            pending: Arc::new(Mutex::new(None)),
            request_gate: Arc::new(Mutex::new(())),
            session_gate: Mutex::new(()),
            event_tx,
            iq_tx,
            inbound_task: Mutex::new(None),
            forward_task: Mutex::new(None),
            forward_cancel: Mutex::new(None),
        }
    }

    /// Connect the control channel and run the handshake.
    ///
    /// Idempotent: when already connected this returns `Ok` immediately
    /// without touching the transport. Otherwise the transport is opened
    /// (failures surface to the caller and leave the client
    /// disconnected), the inbound task is started, and the 3 handshake
    /// frames are sent strictly in sequence, each awaited before the
    /// next. Only after all 3 complete does the state become connected.
    pub async fn connect(&self) -> Result<()> {
        let _session = self.session_gate.lock().await;

        {
            let state = self.connection.lock().await;
            if *state == ConnectionState::Connected {
                tracing::debug!("already connected, skipping handshake");
                return Ok(());
            }
        }

        let incoming = {
            let mut control = self.control.lock().await;
            control.connect().await?;
            control.take_incoming()
        };

        if let Some(rx) = incoming {
            let pending = Arc::clone(&self.pending);
            let event_tx = self.event_tx.clone();
            let handle = tokio::spawn(inbound_loop(rx, pending, event_tx));
            *self.inbound_task.lock().await = Some(handle);
        }

        if let Err(e) = self.send_handshake().await {
            tracing::debug!(error = %e, "handshake failed, tearing down");
            let _ = self.teardown().await;
            return Err(e);
        }

        *self.connection.lock().await = ConnectionState::Connected;
        let _ = self.event_tx.send(ClientEvent::Connected);
        tracing::debug!("connected");
        Ok(())
    }

    /// Send the fixed handshake frames in order, awaiting each send.
    async fn send_handshake(&self) -> Result<()> {
        let mut control = self.control.lock().await;
        for frame in items::handshake_frames()? {
            control.send(&frame).await?;
        }
        Ok(())
    }

    /// Disconnect from the receiver.
    ///
    /// Always safe to call: stops the IQ forward loop (awaited to
    /// completion), closes the transport, fails any in-flight request
    /// with [`Error::ConnectionLost`], and resets both states. Calling
    /// this while already disconnected still reports success.
    pub async fn disconnect(&self) -> Result<()> {
        let _session = self.session_gate.lock().await;

        tracing::debug!("disconnecting");
        let was_connected = {
            let state = self.connection.lock().await;
            *state == ConnectionState::Connected
        };

        self.teardown().await?;

        if was_connected {
            let _ = self.event_tx.send(ClientEvent::Disconnected);
        }
        Ok(())
    }

    /// Shared teardown for disconnect and failed connects.
    async fn teardown(&self) -> Result<()> {
        self.stop_data_loop().await;
        *self.streaming.lock().await = StreamingState::Idle;

        {
            let mut control = self.control.lock().await;
            let _ = control.disconnect().await;
        }

        // The channel's disconnect drops the inbound sender, so the
        // inbound task exits on its own; await it rather than aborting.
        if let Some(handle) = self.inbound_task.lock().await.take() {
            let _ = handle.await;
        }

        // Dropping the reply sender wakes any waiter with ConnectionLost.
        self.pending.lock().await.take();

        *self.connection.lock().await = ConnectionState::Disconnected;
        Ok(())
    }

    /// Start IQ streaming.
    ///
    /// A no-op while disconnected (nothing is sent, the data channel is
    /// not started) and while already streaming. Otherwise: sends the
    /// receiver-state run command, starts the data channel's listening
    /// loop, and begins forwarding datagrams to
    /// [`subscribe_iq`](NetSdrClient::subscribe_iq) subscribers.
    pub async fn start_iq_streaming(&self) -> Result<()> {
        let _session = self.session_gate.lock().await;

        if !self.is_connected().await {
            tracing::debug!("start IQ requested while disconnected, ignoring");
            return Ok(());
        }
        if *self.streaming.lock().await == StreamingState::Streaming {
            tracing::debug!("already streaming");
            return Ok(());
        }

        let frame = items::start_iq_frame()?;
        self.control.lock().await.send(&frame).await?;

        // The run command goes out before the loop accepts datagrams.
        let rx = self.data.lock().await.start().await?;

        let cancel = CancellationToken::new();
        let iq_tx = self.iq_tx.clone();
        let handle = tokio::spawn(forward_loop(rx, iq_tx, cancel.clone()));
        *self.forward_task.lock().await = Some(handle);
        *self.forward_cancel.lock().await = Some(cancel);

        *self.streaming.lock().await = StreamingState::Streaming;
        let _ = self.event_tx.send(ClientEvent::StreamingStarted);
        tracing::debug!("IQ streaming started");
        Ok(())
    }

    /// Stop IQ streaming.
    ///
    /// A no-op unless currently streaming: no stop command is sent and
    /// the data channel is left alone. Otherwise: sends the
    /// receiver-state stop command (no acknowledgment is awaited), then
    /// stops and awaits the datagram loop.
    pub async fn stop_iq_streaming(&self) -> Result<()> {
        let _session = self.session_gate.lock().await;

        if *self.streaming.lock().await != StreamingState::Streaming {
            tracing::debug!("stop IQ requested while idle, ignoring");
            return Ok(());
        }

        let frame = items::stop_iq_frame()?;
        self.control.lock().await.send(&frame).await?;

        self.stop_data_loop().await;

        *self.streaming.lock().await = StreamingState::Idle;
        let _ = self.event_tx.send(ClientEvent::StreamingStopped);
        tracing::debug!("IQ streaming stopped");
        Ok(())
    }

    /// Cancel and await the forward task, then stop the data channel.
    async fn stop_data_loop(&self) {
        if let Some(cancel) = self.forward_cancel.lock().await.take() {
            cancel.cancel();
        }
        if let Some(handle) = self.forward_task.lock().await.take() {
            let _ = handle.await;
        }
        let _ = self.data.lock().await.stop().await;
    }

    /// Tune a receiver channel.
    ///
    /// A no-op (nothing sent) while disconnected. Otherwise encodes and
    /// sends the ReceiverFrequency set message; no reply is awaited.
    pub async fn change_frequency(&self, freq_hz: u64, channel: u8) -> Result<()> {
        if !self.is_connected().await {
            tracing::debug!(freq_hz, channel, "frequency change while disconnected, ignoring");
            return Ok(());
        }

        let frame = items::set_frequency_frame(freq_hz, channel)?;
        tracing::debug!(freq_hz, channel, "changing frequency");
        self.control.lock().await.send(&frame).await
    }

    /// Send a control request and await the reply.
    ///
    /// Returns `Ok(None)` immediately, without touching the channel,
    /// when disconnected. Otherwise the encoded message is sent and the
    /// call suspends until the next inbound frame is decoded and
    /// delivered as the reply.
    ///
    /// Only one request can be in flight: concurrent callers queue on an
    /// internal lock because the wire format has no correlation id to
    /// match replies by. There is no built-in timeout -- if the receiver
    /// never answers, the call waits until [`disconnect`] fails it with
    /// [`Error::ConnectionLost`].
    ///
    /// A malformed reply chunk resolves the call with
    /// [`Error::Protocol`]; the inbound task itself carries on.
    ///
    /// [`disconnect`]: NetSdrClient::disconnect
    pub async fn request(&self, message: &Message) -> Result<Option<Message>> {
        if !self.is_connected().await {
            tracing::debug!("request while disconnected, dropping");
            return Ok(None);
        }

        let frame = codec::encode(message)?;

        let _gate = self.request_gate.lock().await;

        let (reply_tx, reply_rx) = oneshot::channel();
        *self.pending.lock().await = Some(reply_tx);

        {
            let mut control = self.control.lock().await;
            if let Err(e) = control.send(&frame).await {
                self.pending.lock().await.take();
                return Err(e);
            }
        }

        match reply_rx.await {
            Ok(Ok(reply)) => Ok(Some(reply)),
            Ok(Err(frame_err)) => Err(Error::Protocol(format!("malformed reply: {frame_err}"))),
            Err(_) => Err(Error::ConnectionLost),
        }
    }

    /// Whether the control channel is connected and the handshake done.
    pub async fn is_connected(&self) -> bool {
        *self.connection.lock().await == ConnectionState::Connected
    }

    /// Whether IQ streaming is active.
    pub async fn is_streaming(&self) -> bool {
        *self.streaming.lock().await == StreamingState::Streaming
    }

    /// Subscribe to client events.
    ///
    /// Each subscriber gets an independent copy of every event.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe to the raw IQ datagram stream.
    ///
    /// Datagram payloads are passed through exactly as received; this
    /// client does not decode IQ samples.
    pub fn subscribe_iq(&self) -> broadcast::Receiver<Bytes> {
        self.iq_tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Inbound control loop
// ---------------------------------------------------------------------------

/// Background task decoding control-channel chunks and dispatching them.
///
/// Malformed chunks never propagate to the transport: with a request
/// waiting they resolve it with the decode-failure marker, otherwise
/// they are logged and discarded. The loop exits when the channel closes
/// and drops any still-pending reply sender so the waiter errs out.
async fn inbound_loop(
    mut rx: mpsc::Receiver<Bytes>,
    pending: Arc<Mutex<ReplySlot>>,
    event_tx: broadcast::Sender<ClientEvent>,
) {
    while let Some(chunk) = rx.recv().await {
        match codec::decode(&chunk) {
            Ok(msg) => {
                let mut slot = pending.lock().await;
                if let Some(reply_tx) = slot.take() {
                    let _ = reply_tx.send(Ok(msg));
                } else {
                    tracing::trace!(kind = ?msg.kind, "unsolicited message");
                    let _ = event_tx.send(ClientEvent::Unsolicited(msg));
                }
            }
            Err(frame_err) => {
                let mut slot = pending.lock().await;
                if let Some(reply_tx) = slot.take() {
                    let _ = reply_tx.send(Err(frame_err));
                } else {
                    tracing::trace!(error = %frame_err, len = chunk.len(), "discarding malformed frame");
                }
            }
        }
    }

    // Channel closed: fail any waiter.
    pending.lock().await.take();
    tracing::debug!("control inbound loop ended");
}

// ---------------------------------------------------------------------------
// IQ forward loop
// ---------------------------------------------------------------------------

/// Background task forwarding IQ datagrams to broadcast subscribers.
///
/// A datagram already received when cancellation fires may still be
/// delivered; the loop never blocks after that.
async fn forward_loop(
    mut rx: mpsc::Receiver<Bytes>,
    iq_tx: broadcast::Sender<Bytes>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                tracing::debug!("IQ forward loop cancelled");
                break;
            }

            dgram = rx.recv() => match dgram {
                Some(payload) => {
                    // Best-effort: no subscribers is not an error.
                    let _ = iq_tx.send(payload);
                }
                None => {
                    tracing::debug!("data channel closed, IQ forward loop ending");
                    break;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
