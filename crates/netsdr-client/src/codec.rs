//! NetSDR binary frame encoding and decoding.
//!
//! Every NetSDR message starts with a 16-bit little-endian header that
//! packs the message kind into the top 3 bits and the total frame length
//! (header inclusive) into the low 13 bits. Control messages carry a
//! 16-bit signed control-item code after the header; data messages go
//! straight to the parameter bytes.
//!
//! # Frame formats
//!
//! ```text
//! Control message: [u16 LE header][i16 LE item code][parameters...]
//! Data message:    [u16 LE header][parameters...]
//! header = (kind << 13) | total_length       max total_length = 8191
//! ```
//!
//! All encoding/decoding in this module is pure byte manipulation -- no
//! I/O is performed. Decoding fails softly with a typed [`FrameError`]:
//! the control channel delivers raw read chunks, and a partial or
//! corrupted chunk must never take the client down.

use netsdr_core::{Error, Result};

/// Frame header size in bytes.
pub const HEADER_SIZE: usize = 2;

/// Size of the control-item code field on control messages.
pub const ITEM_CODE_SIZE: usize = 2;

/// Maximum total frame length representable in the 13-bit length field.
pub const MAX_FRAME_LEN: usize = 0x1FFF;

/// Message kind, a closed 3-bit enumeration packed into header bits 15-13.
///
/// The Set/Get/Ack kinds are control messages and carry a
/// [`ControlItem`] code; the four data-item kinds carry raw payload only.
/// Value 7 is unassigned -- decoding it yields
/// [`FrameError::UnknownKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Set a control item on the receiver -- kind 0.
    SetControlItem,
    /// Request the current value of a control item -- kind 1.
    GetControlItem,
    /// Acknowledge / control item response -- kind 2.
    Ack,
    /// Data item 0 (plain, narrow) -- kind 3.
    DataItem0,
    /// Data item 1 (plain, wide) -- kind 4.
    DataItem1,
    /// Data item 2 (compressed, narrow) -- kind 5.
    DataItem2,
    /// Data item 3 (compressed, wide) -- kind 6.
    DataItem3,
}

impl MessageKind {
    /// The 3-bit wire value of this kind.
    pub fn value(self) -> u16 {
        match self {
            MessageKind::SetControlItem => 0,
            MessageKind::GetControlItem => 1,
            MessageKind::Ack => 2,
            MessageKind::DataItem0 => 3,
            MessageKind::DataItem1 => 4,
            MessageKind::DataItem2 => 5,
            MessageKind::DataItem3 => 6,
        }
    }

    /// Map a 3-bit wire value back to a kind. `None` for the unassigned
    /// value 7 (and anything out of 3-bit range).
    pub fn from_value(value: u16) -> Option<Self> {
        match value {
            0 => Some(MessageKind::SetControlItem),
            1 => Some(MessageKind::GetControlItem),
            2 => Some(MessageKind::Ack),
            3 => Some(MessageKind::DataItem0),
            4 => Some(MessageKind::DataItem1),
            5 => Some(MessageKind::DataItem2),
            6 => Some(MessageKind::DataItem3),
            _ => None,
        }
    }

    /// Whether this kind is a control message (carries an item code).
    pub fn is_control(self) -> bool {
        matches!(
            self,
            MessageKind::SetControlItem | MessageKind::GetControlItem | MessageKind::Ack
        )
    }
}

/// A 16-bit control-item code identifying a device parameter.
///
/// The named variants follow the NetSDR control-item table. Codes this
/// client does not use decode as [`ControlItem::Other`] so that inbound
/// traffic for unfamiliar items still parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlItem {
    /// Receiver run/stop state -- 0x0018.
    ReceiverState,
    /// Receiver center frequency -- 0x0020.
    ReceiverFrequency,
    /// RF gain -- 0x0038.
    RfGain,
    /// A/D converter modes -- 0x008A.
    AdModes,
    /// IQ output data sample rate -- 0x00B8.
    IqSampleRate,
    /// Any other item code.
    Other(i16),
}

impl ControlItem {
    /// The 16-bit wire code of this item.
    pub fn code(self) -> i16 {
        match self {
            ControlItem::ReceiverState => 0x0018,
            ControlItem::ReceiverFrequency => 0x0020,
            ControlItem::RfGain => 0x0038,
            ControlItem::AdModes => 0x008A,
            ControlItem::IqSampleRate => 0x00B8,
            ControlItem::Other(code) => code,
        }
    }

    /// Map a wire code to an item, collapsing unknown codes into
    /// [`ControlItem::Other`].
    pub fn from_code(code: i16) -> Self {
        match code {
            0x0018 => ControlItem::ReceiverState,
            0x0020 => ControlItem::ReceiverFrequency,
            0x0038 => ControlItem::RfGain,
            0x008A => ControlItem::AdModes,
            0x00B8 => ControlItem::IqSampleRate,
            other => ControlItem::Other(other),
        }
    }
}

/// A decoded NetSDR message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The message kind from header bits 15-13.
    pub kind: MessageKind,
    /// The control-item code. Present exactly when `kind` is a control
    /// kind.
    pub item: Option<ControlItem>,
    /// Parameter bytes, passed through verbatim.
    pub params: Vec<u8>,
}

/// Soft decode failure.
///
/// The control channel may deliver short reads or corrupted bytes;
/// [`decode`] classifies them here instead of panicking or returning a
/// transport-level [`Error`]. The inbound handler discards malformed
/// frames (or hands them to a waiting request as a failure marker) and
/// keeps running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Fewer than 2 bytes -- no complete header.
    #[error("frame too short for header: {len} bytes")]
    TooShort {
        /// Actual buffer length.
        len: usize,
    },

    /// The header's 13-bit length field disagrees with the buffer length.
    ///
    /// Chunk boundaries are not guaranteed to align with frame
    /// boundaries; a mismatch is treated as malformed rather than
    /// guessed at.
    #[error("declared length {declared} does not match buffer length {actual}")]
    LengthMismatch {
        /// Length declared in the header.
        declared: usize,
        /// Actual buffer length.
        actual: usize,
    },

    /// Header bits 15-13 decode to an unassigned kind.
    #[error("unrecognized message kind {0}")]
    UnknownKind(u16),

    /// A control kind without enough bytes for the item code.
    #[error("control frame too short for item code: {len} bytes")]
    MissingItemCode {
        /// Actual buffer length.
        len: usize,
    },
}

/// Encode a control message: header, item code, parameters.
///
/// Fails with [`Error::Oversize`] when the total frame length would
/// exceed the 13-bit capacity; nothing is partially written. `kind` must
/// be a control kind.
pub fn encode_control(kind: MessageKind, item: ControlItem, params: &[u8]) -> Result<Vec<u8>> {
    if !kind.is_control() {
        return Err(Error::Protocol(format!(
            "{kind:?} is a data kind and carries no control item"
        )));
    }

    let total = HEADER_SIZE + ITEM_CODE_SIZE + params.len();
    if total > MAX_FRAME_LEN {
        return Err(Error::Oversize { total });
    }

    let header = (kind.value() << 13) | total as u16;

    let mut frame = Vec::with_capacity(total);
    frame.extend_from_slice(&header.to_le_bytes());
    frame.extend_from_slice(&item.code().to_le_bytes());
    frame.extend_from_slice(params);
    Ok(frame)
}

/// Encode a data message: header followed directly by parameters.
///
/// Same length rule as [`encode_control`]; `kind` must be one of the
/// data-item kinds.
pub fn encode_data(kind: MessageKind, params: &[u8]) -> Result<Vec<u8>> {
    if kind.is_control() {
        return Err(Error::Protocol(format!(
            "{kind:?} is a control kind and requires an item code"
        )));
    }

    let total = HEADER_SIZE + params.len();
    if total > MAX_FRAME_LEN {
        return Err(Error::Oversize { total });
    }

    let header = (kind.value() << 13) | total as u16;

    let mut frame = Vec::with_capacity(total);
    frame.extend_from_slice(&header.to_le_bytes());
    frame.extend_from_slice(params);
    Ok(frame)
}

/// Encode a whole [`Message`], dispatching on its kind.
///
/// Control kinds require `item` to be present; data kinds require it to
/// be absent.
pub fn encode(msg: &Message) -> Result<Vec<u8>> {
    match (msg.kind.is_control(), msg.item) {
        (true, Some(item)) => encode_control(msg.kind, item, &msg.params),
        (false, None) => encode_data(msg.kind, &msg.params),
        (true, None) => Err(Error::Protocol(format!(
            "{:?} requires a control item code",
            msg.kind
        ))),
        (false, Some(_)) => Err(Error::Protocol(format!(
            "{:?} is a data kind and carries no control item",
            msg.kind
        ))),
    }
}

/// Decode one frame from a buffer.
///
/// The kind is extracted by shifting and the length by masking
/// (`header >> 13` / `header & 0x1FFF`), so the full 3-bit kind range
/// stays correct if more kinds are assigned later. The declared length
/// must equal the buffer length exactly.
pub fn decode(bytes: &[u8]) -> std::result::Result<Message, FrameError> {
    if bytes.len() < HEADER_SIZE {
        return Err(FrameError::TooShort { len: bytes.len() });
    }

    let header = u16::from_le_bytes([bytes[0], bytes[1]]);
    let kind_bits = header >> 13;
    let declared = (header & MAX_FRAME_LEN as u16) as usize;

    let kind = MessageKind::from_value(kind_bits).ok_or(FrameError::UnknownKind(kind_bits))?;

    if declared != bytes.len() {
        return Err(FrameError::LengthMismatch {
            declared,
            actual: bytes.len(),
        });
    }

    if kind.is_control() {
        if bytes.len() < HEADER_SIZE + ITEM_CODE_SIZE {
            return Err(FrameError::MissingItemCode { len: bytes.len() });
        }
        let code = i16::from_le_bytes([bytes[2], bytes[3]]);
        Ok(Message {
            kind,
            item: Some(ControlItem::from_code(code)),
            params: bytes[HEADER_SIZE + ITEM_CODE_SIZE..].to_vec(),
        })
    } else {
        Ok(Message {
            kind,
            item: None,
            params: bytes[HEADER_SIZE..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- header bit layout --

    #[test]
    fn control_header_packs_kind_and_length() {
        let frame = encode_control(MessageKind::Ack, ControlItem::ReceiverState, &[0u8; 7500])
            .unwrap();

        let header = u16::from_le_bytes([frame[0], frame[1]]);
        assert_eq!(header >> 13, MessageKind::Ack.value());
        assert_eq!((header & 0x1FFF) as usize, frame.len());

        let code = i16::from_le_bytes([frame[2], frame[3]]);
        assert_eq!(code, ControlItem::ReceiverState.code());
        assert_eq!(frame.len(), 2 + 2 + 7500);
    }

    #[test]
    fn data_header_packs_kind_and_length() {
        let frame = encode_data(MessageKind::DataItem2, &[0u8; 7500]).unwrap();

        let header = u16::from_le_bytes([frame[0], frame[1]]);
        assert_eq!(header >> 13, MessageKind::DataItem2.value());
        assert_eq!((header & 0x1FFF) as usize, frame.len());
        assert_eq!(frame.len(), 2 + 7500);
    }

    // -- empty parameters --

    #[test]
    fn control_with_empty_params_is_header_and_code_only() {
        let frame =
            encode_control(MessageKind::Ack, ControlItem::ReceiverState, &[]).unwrap();
        assert_eq!(frame.len(), 4);

        let msg = decode(&frame).unwrap();
        assert_eq!(msg.kind, MessageKind::Ack);
        assert_eq!(msg.item, Some(ControlItem::ReceiverState));
        assert!(msg.params.is_empty());
    }

    #[test]
    fn data_with_empty_params_is_header_only() {
        let frame = encode_data(MessageKind::DataItem1, &[]).unwrap();
        assert_eq!(frame.len(), 2);

        let msg = decode(&frame).unwrap();
        assert_eq!(msg.kind, MessageKind::DataItem1);
        assert_eq!(msg.item, None);
        assert!(msg.params.is_empty());
    }

    // -- length limits --

    #[test]
    fn control_overflow_at_u16_max_params() {
        let err = encode_control(
            MessageKind::Ack,
            ControlItem::ReceiverState,
            &vec![0u8; u16::MAX as usize],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Oversize { total: 65539 }));
    }

    #[test]
    fn control_length_boundary() {
        // 8187 params + 2 header + 2 code = 8191, the field maximum.
        let ok = encode_control(
            MessageKind::SetControlItem,
            ControlItem::ReceiverState,
            &vec![0u8; 8187],
        );
        assert_eq!(ok.unwrap().len(), 8191);

        let err = encode_control(
            MessageKind::SetControlItem,
            ControlItem::ReceiverState,
            &vec![0u8; 8188],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Oversize { total: 8192 }));
    }

    #[test]
    fn data_length_boundary() {
        // 8189 params + 2 header = 8191.
        let ok = encode_data(MessageKind::DataItem0, &vec![0u8; 8189]);
        assert_eq!(ok.unwrap().len(), 8191);

        let err = encode_data(MessageKind::DataItem0, &vec![0u8; 8190]).unwrap_err();
        assert!(matches!(err, Error::Oversize { total: 8192 }));
    }

    // -- kind/code validation on encode --

    #[test]
    fn encode_control_rejects_data_kind() {
        let err = encode_control(MessageKind::DataItem0, ControlItem::RfGain, &[]).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn encode_data_rejects_control_kind() {
        let err = encode_data(MessageKind::SetControlItem, &[]).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    // -- round trips --

    #[test]
    fn round_trip_control_message() {
        let params = [0x01, 0x90, 0xD0, 0xA4, 0x08, 0x00];
        let frame = encode_control(
            MessageKind::SetControlItem,
            ControlItem::ReceiverFrequency,
            &params,
        )
        .unwrap();

        let msg = decode(&frame).unwrap();
        assert_eq!(msg.kind, MessageKind::SetControlItem);
        assert_eq!(msg.item, Some(ControlItem::ReceiverFrequency));
        assert_eq!(msg.params, params);
    }

    #[test]
    fn round_trip_every_kind() {
        for value in 0..7u16 {
            let kind = MessageKind::from_value(value).unwrap();
            let frame = if kind.is_control() {
                encode_control(kind, ControlItem::RfGain, &[0xAA, 0xBB]).unwrap()
            } else {
                encode_data(kind, &[0xAA, 0xBB]).unwrap()
            };

            let msg = decode(&frame).unwrap();
            assert_eq!(msg.kind, kind, "kind value {value}");
            assert_eq!(msg.params, vec![0xAA, 0xBB]);
        }
    }

    #[test]
    fn round_trip_unknown_item_code() {
        let frame =
            encode_control(MessageKind::Ack, ControlItem::Other(0x0105), &[0x02]).unwrap();
        let msg = decode(&frame).unwrap();
        assert_eq!(msg.item, Some(ControlItem::Other(0x0105)));
    }

    // -- soft decode failures --

    #[test]
    fn decode_empty_buffer() {
        assert_eq!(decode(&[]), Err(FrameError::TooShort { len: 0 }));
    }

    #[test]
    fn decode_single_byte() {
        assert_eq!(decode(&[0x04]), Err(FrameError::TooShort { len: 1 }));
    }

    #[test]
    fn decode_all_ones_chunk_is_malformed() {
        // 0xFF 0xFF decodes to kind 7, which is unassigned.
        let err = decode(&[0xFF, 0xFF, 0xFF]).unwrap_err();
        assert_eq!(err, FrameError::UnknownKind(7));
    }

    #[test]
    fn decode_length_mismatch() {
        // Header declares a 10-byte Ack frame, buffer has 4 bytes.
        let header = (MessageKind::Ack.value() << 13) | 10;
        let mut frame = header.to_le_bytes().to_vec();
        frame.extend_from_slice(&[0x18, 0x00]);

        assert_eq!(
            decode(&frame),
            Err(FrameError::LengthMismatch {
                declared: 10,
                actual: 4
            })
        );
    }

    #[test]
    fn decode_concatenated_frames_is_length_mismatch() {
        // Chunk boundaries need not align with frame boundaries: two
        // frames arriving in one read must be rejected, not decoded by
        // guessing where the first one ends.
        let frame = encode_control(MessageKind::Ack, ControlItem::ReceiverState, &[]).unwrap();
        let mut chunk = frame.clone();
        chunk.extend_from_slice(&frame);

        assert_eq!(
            decode(&chunk),
            Err(FrameError::LengthMismatch {
                declared: 4,
                actual: 8
            })
        );
    }

    #[test]
    fn decode_truncated_chunk_is_length_mismatch() {
        // A valid frame cut mid-stream by a chunk boundary.
        let frame = encode_control(
            MessageKind::SetControlItem,
            ControlItem::ReceiverFrequency,
            &[0u8; 6],
        )
        .unwrap();
        let err = decode(&frame[..5]).unwrap_err();
        assert!(matches!(err, FrameError::LengthMismatch { .. }));
    }

    #[test]
    fn decode_control_frame_shorter_than_code() {
        // A 2-byte control frame: header is valid and self-consistent but
        // there is no room for the item code.
        let header = (MessageKind::GetControlItem.value() << 13) | 2;
        let frame = header.to_le_bytes();
        assert_eq!(
            decode(&frame),
            Err(FrameError::MissingItemCode { len: 2 })
        );
    }

    #[test]
    fn decode_never_panics_on_fuzzed_short_buffers() {
        for a in [0x00u8, 0x1F, 0x7F, 0xE0, 0xFF] {
            for b in [0x00u8, 0x20, 0x9F, 0xFF] {
                let _ = decode(&[a]);
                let _ = decode(&[a, b]);
                let _ = decode(&[a, b, a]);
            }
        }
    }

    // -- item code mapping --

    #[test]
    fn control_item_code_round_trip() {
        for item in [
            ControlItem::ReceiverState,
            ControlItem::ReceiverFrequency,
            ControlItem::RfGain,
            ControlItem::AdModes,
            ControlItem::IqSampleRate,
            ControlItem::Other(-9),
        ] {
            assert_eq!(ControlItem::from_code(item.code()), item);
        }
    }
}
