//! Serial link framing for the mesh modem bridge.
//!
//! The modem speaks a byte-oriented protocol over UART:
//! `AA 55 <len> <cmd> <payload..> <crc_lo> <crc_hi>` with `len <= 127` and a
//! CRC16 computed over `len ‖ cmd ‖ payload`. This crate turns the raw byte
//! stream into validated [`Frame`]s and serializes outbound frames. Byte
//! reception is decoupled from parsing by a fixed-capacity [`RingBuffer`] so
//! an interrupt- or DMA-driven producer never waits on the parser.

#![cfg_attr(not(test), no_std)]

pub mod frame;
pub mod opcode;
pub mod ring;

pub use frame::{
    encode_frame, poll_frame, Frame, FrameDecoder, FrameError, FrameSink, MAX_FRAME_LEN,
    MAX_PAYLOAD_LEN,
};
pub use opcode::Opcode;
pub use ring::RingBuffer;
