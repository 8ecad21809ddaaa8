//! Frame encoder and byte-at-a-time decoder.

use crc::{Crc, CRC_16_MODBUS};
use heapless::Vec;

use crate::opcode::Opcode;
use crate::ring::RingBuffer;

/// `AA 55` marks the start of every frame.
pub const PREAMBLE: [u8; 2] = [0xAA, 0x55];

/// Maximum payload length the length byte may declare.
pub const MAX_PAYLOAD_LEN: usize = 127;

const HEADER_LEN: usize = 4;
const CRC_LEN: usize = 2;

/// Size of a frame with a maximum-length payload.
pub const MAX_FRAME_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LEN + CRC_LEN;

/// CRC16 over `len ‖ cmd ‖ payload`, init 0xFFFF, polynomial 0x8005.
fn frame_crc(len: u8, command: u8, payload: &[u8]) -> u16 {
    let crc = Crc::<u16>::new(&CRC_16_MODBUS);
    let mut digest = crc.digest();
    digest.update(&[len, command]);
    digest.update(payload);
    digest.finalize()
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum FrameError {
    PayloadTooLarge,
}

/// One validated unit of the wire protocol.
///
/// Frames are ephemeral: decoded, dispatched and discarded. The command is
/// kept as the raw byte because unknown codes are a dispatch concern, not a
/// framing error.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: u8,
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

/// Transmit seam between protocol logic and the underlying serial driver.
///
/// An implementation must hand the encoded frame to the driver as one unit;
/// frames are never interleaved.
pub trait FrameSink {
    fn send(&mut self, command: Opcode, payload: &[u8]);
}

/// Serializes `preamble ‖ len ‖ cmd ‖ payload ‖ crc16` into one buffer.
pub fn encode_frame(command: u8, payload: &[u8]) -> Result<Vec<u8, MAX_FRAME_LEN>, FrameError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameError::PayloadTooLarge);
    }
    let len = payload.len() as u8;
    let crc = frame_crc(len, command, payload);

    let mut out = Vec::new();
    // capacity is MAX_FRAME_LEN, cannot overflow after the length check
    let _ = out.extend_from_slice(&PREAMBLE);
    let _ = out.push(len);
    let _ = out.push(command);
    let _ = out.extend_from_slice(payload);
    let _ = out.extend_from_slice(&crc.to_le_bytes());
    Ok(out)
}

enum DecodeState {
    Preamble1,
    Preamble2,
    Length,
    Command,
    Payload,
    CrcLow,
    CrcHigh,
}

/// Reconstructs frames from an unreliable byte stream.
///
/// Consumes exactly one byte per [`push`] call. Any structural mismatch
/// (wrong preamble byte, oversized length, CRC failure) silently resets the
/// machine to preamble scanning; corrupted frames are dropped without a NACK
/// and the peer retries at a higher layer.
///
/// [`push`]: FrameDecoder::push
pub struct FrameDecoder {
    state: DecodeState,
    len: u8,
    command: u8,
    payload: Vec<u8, MAX_PAYLOAD_LEN>,
    crc_lo: u8,
}

impl FrameDecoder {
    pub const fn new() -> Self {
        Self {
            state: DecodeState::Preamble1,
            len: 0,
            command: 0,
            payload: Vec::new(),
            crc_lo: 0,
        }
    }

    fn reset(&mut self) {
        self.state = DecodeState::Preamble1;
        self.payload.clear();
    }

    /// Feeds one received byte; returns a frame when its CRC checks out.
    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            DecodeState::Preamble1 => {
                if byte == PREAMBLE[0] {
                    self.state = DecodeState::Preamble2;
                }
            }
            DecodeState::Preamble2 => {
                if byte == PREAMBLE[1] {
                    self.state = DecodeState::Length;
                } else {
                    self.reset();
                }
            }
            DecodeState::Length => {
                if byte as usize <= MAX_PAYLOAD_LEN {
                    self.len = byte;
                    self.state = DecodeState::Command;
                } else {
                    self.reset();
                }
            }
            DecodeState::Command => {
                self.command = byte;
                self.payload.clear();
                self.state = if self.len == 0 {
                    DecodeState::CrcLow
                } else {
                    DecodeState::Payload
                };
            }
            DecodeState::Payload => {
                // len <= MAX_PAYLOAD_LEN, push cannot fail
                let _ = self.payload.push(byte);
                if self.payload.len() == self.len as usize {
                    self.state = DecodeState::CrcLow;
                }
            }
            DecodeState::CrcLow => {
                self.crc_lo = byte;
                self.state = DecodeState::CrcHigh;
            }
            DecodeState::CrcHigh => {
                let received = u16::from_le_bytes([self.crc_lo, byte]);
                let expected = frame_crc(self.len, self.command, &self.payload);
                let valid = received == expected;
                self.state = DecodeState::Preamble1;
                if valid {
                    let frame = Frame {
                        command: self.command,
                        payload: self.payload.clone(),
                    };
                    self.payload.clear();
                    return Some(frame);
                }
                self.payload.clear();
            }
        }
        None
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Drains buffered bytes through the decoder until a frame emerges or the
/// ring empties. Called from the link poll loop; never blocks.
pub fn poll_frame<const N: usize>(
    ring: &mut RingBuffer<N>,
    decoder: &mut FrameDecoder,
) -> Option<Frame> {
    while let Some(byte) = ring.dequeue() {
        if let Some(frame) = decoder.push(byte) {
            return Some(frame);
        }
    }
    None
}
