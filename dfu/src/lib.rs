//! Firmware-update (DFU) engine.
//!
//! The peer pushes a new firmware image over the serial link page by page:
//! `Init` announces size and SHA-256, `PageCreate` opens a page of up to
//! 1024 bytes, `WriteData` events fill it, `PageStore` commits it to flash.
//! After the final page the engine verifies the whole flashed image against
//! the digest from `Init` and, on a match, hands control to the flash layer's
//! commit-and-reboot path, which does not return.
//!
//! The engine is the sole owner of the session state and is driven
//! synchronously by the link dispatcher; one command is handled to completion
//! before the next is parsed.

#![cfg_attr(not(test), no_std)]

#[cfg(test)]
extern crate std;

mod engine;
mod flash;
mod status;
mod wire;

pub use engine::{DfuEngine, FirmwareIdentity};
pub use flash::{FlashBank, FlashError};
pub use status::{DfuStatus, STATE_CHECK_IN_PROGRESS, STATE_CHECK_NOT_IN_PROGRESS};
pub use wire::{
    InitRequest, PageCreateRequest, StatusResponse, WireError, WriteDataEvent, MAX_APP_DATA_LEN,
    MAX_PAGE_SIZE, SHA256_LEN,
};
