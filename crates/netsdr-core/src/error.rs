//! Error types for the NetSDR client workspace.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer and protocol-layer
//! failures are all captured here.

/// The error type for all NetSDR client operations.
///
/// Variants cover the failure modes encountered when talking to a NetSDR
/// receiver: socket-level transport failures, protocol violations, and
/// frames too large for the 13-bit length field.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (TCP control socket, UDP data socket).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (unexpected reply, malformed frame surfaced
    /// to a waiting request).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A message too large for the 13-bit length field of the frame header.
    ///
    /// Raised at encode time, before any bytes are produced. The maximum
    /// total frame length (header inclusive) is 8191 bytes.
    #[error("message length {total} exceeds the 8191-byte frame capacity")]
    Oversize {
        /// The total frame length that was requested.
        total: usize,
    },

    /// No connection to the receiver has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the receiver was lost unexpectedly.
    ///
    /// A request that was in flight when the control channel went down
    /// resolves with this error.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
