//! Parameter payload layouts for the control items this client uses.
//!
//! Each builder returns the parameter bytes WITHOUT the frame header or
//! item code; [`codec::encode_control`](crate::codec::encode_control)
//! adds those. Byte values follow the NetSDR control-item table; where
//! the device manual allows variations (capture mode, gain steps) the
//! constants here are the ones to adjust.

use netsdr_core::Result;

use crate::codec::{self, ControlItem, Message, MessageKind};

/// Receiver-state parameters: start complex IQ capture.
///
/// Layout: `[data type, run/stop, capture mode, FIFO sample count]`.
/// 0x80 selects complex IQ output, 0x02 is the run command.
pub const RECEIVER_STATE_RUN: [u8; 4] = [0x80, 0x02, 0x80, 0x00];

/// Receiver-state parameters: halt IQ capture.
pub const RECEIVER_STATE_STOP: [u8; 4] = [0x00, 0x01, 0x00, 0x00];

/// Default IQ output sample rate sent during the handshake, in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 200_000;

/// Width of the frequency field in the ReceiverFrequency item: the
/// device uses a 40-bit little-endian integer.
pub const FREQUENCY_FIELD_BYTES: usize = 5;

/// Build the ReceiverFrequency parameter payload.
///
/// Layout: 1-byte channel index followed by the frequency in Hz as a
/// 5-byte little-endian integer. Frequencies above 2^40 - 1 Hz do not
/// occur on this hardware; the upper bytes are simply truncated.
pub fn frequency_params(freq_hz: u64, channel: u8) -> Vec<u8> {
    let mut params = Vec::with_capacity(1 + FREQUENCY_FIELD_BYTES);
    params.push(channel);
    params.extend_from_slice(&freq_hz.to_le_bytes()[..FREQUENCY_FIELD_BYTES]);
    params
}

/// Build the frequency-change control message frame.
pub fn set_frequency_frame(freq_hz: u64, channel: u8) -> Result<Vec<u8>> {
    codec::encode_control(
        MessageKind::SetControlItem,
        ControlItem::ReceiverFrequency,
        &frequency_params(freq_hz, channel),
    )
}

/// Build the receiver-state run (start IQ) frame.
pub fn start_iq_frame() -> Result<Vec<u8>> {
    codec::encode_control(
        MessageKind::SetControlItem,
        ControlItem::ReceiverState,
        &RECEIVER_STATE_RUN,
    )
}

/// Build the receiver-state stop frame.
pub fn stop_iq_frame() -> Result<Vec<u8>> {
    codec::encode_control(
        MessageKind::SetControlItem,
        ControlItem::ReceiverState,
        &RECEIVER_STATE_STOP,
    )
}

/// Build the fixed 3-frame connection handshake, in send order.
///
/// 1. IQ output sample rate (channel 0, rate as u32 LE)
/// 2. RF gain (channel 0, automatic)
/// 3. A/D modes (channel 0, dither + A/D gain enabled)
///
/// The frame count and ordering are contractual; the parameter bytes are
/// the defaults from the control-item table and should be confirmed
/// against the target receiver's manual.
pub fn handshake_frames() -> Result<Vec<Vec<u8>>> {
    let mut sample_rate = vec![0x00];
    sample_rate.extend_from_slice(&DEFAULT_SAMPLE_RATE.to_le_bytes());

    Ok(vec![
        codec::encode_control(
            MessageKind::SetControlItem,
            ControlItem::IqSampleRate,
            &sample_rate,
        )?,
        codec::encode_control(
            MessageKind::SetControlItem,
            ControlItem::RfGain,
            &[0x00, 0x00],
        )?,
        codec::encode_control(
            MessageKind::SetControlItem,
            ControlItem::AdModes,
            &[0x00, 0x03],
        )?,
    ])
}

/// Number of frames in the connection handshake.
pub const HANDSHAKE_LEN: usize = 3;

/// Whether a decoded message is an IQ data item (any of the four
/// data-item kinds).
pub fn is_data_item(msg: &Message) -> bool {
    !msg.kind.is_control()
}
