//! The firmware-transfer state machine.

use crc::{Crc, CRC_32_ISO_HDLC};
use heapless::Vec;
use meshbridge_protocol::{FrameSink, Opcode};
use sha2::{Digest, Sha256};

use crate::flash::{FlashBank, FlashError};
use crate::status::{DfuStatus, STATE_CHECK_IN_PROGRESS, STATE_CHECK_NOT_IN_PROGRESS};
use crate::wire::{
    InitRequest, PageCreateRequest, StatusResponse, WriteDataEvent, MAX_PAGE_SIZE, SHA256_LEN,
};

/// App data that validates any proposal, used by factory tooling.
const VALIDATION_BYPASS_TOKEN: &[u8] = b"ignore";

/// Read-back chunk for checksumming flashed bytes.
const CHECKSUM_CHUNK_LEN: usize = 64;

/// Identity of the running firmware, checked against the app data of an
/// update proposal (`<product-tag>/<build-number>`).
pub struct FirmwareIdentity {
    pub product: &'static str,
    pub build: &'static str,
}

impl FirmwareIdentity {
    fn validate(&self, app_data: &[u8]) -> DfuStatus {
        if app_data == VALIDATION_BYPASS_TOKEN {
            return DfuStatus::Success;
        }

        let Some(delimiter) = app_data.iter().position(|&b| b == b'/') else {
            return DfuStatus::InvalidObject;
        };
        let (tag, build) = app_data.split_at(delimiter);
        let build = &build[1..];

        if tag != self.product.as_bytes() {
            return DfuStatus::InvalidObject;
        }
        if build == self.build.as_bytes() {
            return DfuStatus::FirmwareAlreadyUpToDate;
        }
        DfuStatus::Success
    }
}

/// Receives an update proposal, accumulates pages, commits them to flash and
/// verifies the final image. Owns the session state exclusively; every
/// terminal event (success, cancellation, validation failure, rejection)
/// resets it.
pub struct DfuEngine<F: FlashBank> {
    flash: F,
    identity: FirmwareIdentity,
    in_progress: bool,
    firmware_size: u32,
    firmware_offset: u32,
    expected_sha256: [u8; SHA256_LEN],
    page: Vec<u8, MAX_PAGE_SIZE>,
    page_size: u32,
}

impl<F: FlashBank> DfuEngine<F> {
    pub fn new(flash: F, identity: FirmwareIdentity) -> Self {
        Self {
            flash,
            identity,
            in_progress: false,
            firmware_size: 0,
            firmware_offset: 0,
            expected_sha256: [0; SHA256_LEN],
            page: Vec::new(),
            page_size: 0,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn region_address(&self) -> u32 {
        self.flash.region_address()
    }

    pub fn region_size(&self) -> usize {
        self.flash.region_size()
    }

    /// Asks the peer for its transfer state so a stale session on either
    /// side is detected and cancelled. Sent once at startup.
    pub fn send_state_check<S: FrameSink>(&self, sink: &mut S) {
        sink.send(Opcode::DfuStateCheckRequest, &[]);
    }

    /// Entry point for every command in the DFU opcode block.
    pub fn on_command<S: FrameSink>(&mut self, command: Opcode, payload: &[u8], sink: &mut S) {
        match command {
            Opcode::DfuInitRequest => self.on_init(payload, sink),
            Opcode::DfuStatusRequest => self.on_status(sink),
            Opcode::DfuPageCreateRequest => self.on_page_create(payload, sink),
            Opcode::DfuWriteDataEvent => self.on_write_data(payload, sink),
            Opcode::DfuPageStoreRequest => self.on_page_store(sink),
            Opcode::DfuStateCheckRequest => {
                let state = if self.in_progress {
                    STATE_CHECK_IN_PROGRESS
                } else {
                    STATE_CHECK_NOT_IN_PROGRESS
                };
                sink.send(Opcode::DfuStateCheckResponse, &[state]);
            }
            Opcode::DfuStateCheckResponse => self.on_state_check_response(payload, sink),
            Opcode::DfuCancelResponse => self.clear_session(),
            _ => {}
        }
    }

    fn on_init<S: FrameSink>(&mut self, payload: &[u8], sink: &mut S) {
        self.clear_session();

        let Ok(request) = InitRequest::decode(payload) else {
            respond(sink, Opcode::DfuInitResponse, DfuStatus::InvalidParameter);
            return;
        };

        let validation = self.identity.validate(&request.app_data);
        if validation != DfuStatus::Success {
            respond(sink, Opcode::DfuInitResponse, validation);
            self.clear_session();
            return;
        }

        if self.flash.region_size() <= request.firmware_size as usize {
            respond(
                sink,
                Opcode::DfuInitResponse,
                DfuStatus::InsufficientResources,
            );
            self.clear_session();
            return;
        }

        if self.flash.erase().is_err() {
            respond(sink, Opcode::DfuInitResponse, DfuStatus::OperationFailed);
            self.clear_session();
            return;
        }

        self.firmware_size = request.firmware_size;
        self.expected_sha256 = request.sha256;
        self.in_progress = true;
        respond(sink, Opcode::DfuInitResponse, DfuStatus::Success);
    }

    fn on_status<S: FrameSink>(&mut self, sink: &mut S) {
        let offset = self.firmware_offset + self.page.len() as u32;
        let response = match self.running_crc32() {
            Ok(crc32) => StatusResponse {
                status: DfuStatus::Success,
                max_page_size: MAX_PAGE_SIZE as u32,
                offset,
                crc32,
            },
            // flash read-back failed; report the failure instead of a bogus checksum
            Err(_) => StatusResponse {
                status: DfuStatus::OperationFailed,
                max_page_size: MAX_PAGE_SIZE as u32,
                offset: 0,
                crc32: 0,
            },
        };
        sink.send(Opcode::DfuStatusResponse, &response.encode());
    }

    fn on_page_create<S: FrameSink>(&mut self, payload: &[u8], sink: &mut S) {
        if !self.in_progress {
            respond(
                sink,
                Opcode::DfuPageCreateResponse,
                DfuStatus::OperationNotPermitted,
            );
            sink.send(Opcode::DfuCancelRequest, &[]);
            return;
        }

        let Ok(request) = PageCreateRequest::decode(payload) else {
            respond(
                sink,
                Opcode::DfuPageCreateResponse,
                DfuStatus::InvalidParameter,
            );
            return;
        };

        if request.page_size as usize > MAX_PAGE_SIZE {
            respond(
                sink,
                Opcode::DfuPageCreateResponse,
                DfuStatus::InsufficientResources,
            );
            return;
        }

        self.page.clear();
        self.page_size = request.page_size;
        respond(sink, Opcode::DfuPageCreateResponse, DfuStatus::Success);
    }

    fn on_write_data<S: FrameSink>(&mut self, payload: &[u8], sink: &mut S) {
        if !self.in_progress {
            sink.send(Opcode::DfuCancelRequest, &[]);
            return;
        }

        // events are never answered; malformed or overflowing chunks are dropped
        let Ok(event) = WriteDataEvent::decode(payload) else {
            return;
        };
        if self.page.len() + event.chunk.len() <= self.page_size as usize {
            let _ = self.page.extend_from_slice(event.chunk);
        }
    }

    fn on_page_store<S: FrameSink>(&mut self, sink: &mut S) {
        if !self.in_progress {
            respond(
                sink,
                Opcode::DfuPageStoreResponse,
                DfuStatus::OperationNotPermitted,
            );
            sink.send(Opcode::DfuCancelRequest, &[]);
            return;
        }

        // nothing was written this round; duplicate/empty stores are a no-op
        if self.page.is_empty() {
            respond(sink, Opcode::DfuPageStoreResponse, DfuStatus::Success);
            return;
        }

        // a partially filled page is a protocol violation
        if self.page.len() != self.page_size as usize {
            respond(
                sink,
                Opcode::DfuPageStoreResponse,
                DfuStatus::OperationNotPermitted,
            );
            return;
        }

        // retryable: session state is kept so the peer can store again
        if self.flash.write(self.firmware_offset, &self.page).is_err() {
            respond(sink, Opcode::DfuPageStoreResponse, DfuStatus::OperationFailed);
            return;
        }

        self.firmware_offset += self.page.len() as u32;
        self.page.clear();
        self.page_size = 0;

        if self.firmware_offset != self.firmware_size {
            respond(sink, Opcode::DfuPageStoreResponse, DfuStatus::Success);
            return;
        }

        match self.verify_image() {
            Ok(true) => {}
            Ok(false) => {
                respond(sink, Opcode::DfuPageStoreResponse, DfuStatus::InvalidObject);
                self.clear_session();
                return;
            }
            Err(_) => {
                respond(sink, Opcode::DfuPageStoreResponse, DfuStatus::OperationFailed);
                self.clear_session();
                return;
            }
        }

        respond(
            sink,
            Opcode::DfuPageStoreResponse,
            DfuStatus::FirmwareSuccessfullyUpdated,
        );

        let size_words = self.firmware_size as usize / 4;
        self.clear_session();
        self.flash.commit_and_reboot(size_words)
    }

    fn on_state_check_response<S: FrameSink>(&mut self, payload: &[u8], sink: &mut S) {
        let Some(&peer_state) = payload.first() else {
            return;
        };
        let peer_in_progress = peer_state == STATE_CHECK_IN_PROGRESS;
        if peer_in_progress != self.in_progress {
            sink.send(Opcode::DfuCancelRequest, &[]);
        }
    }

    fn clear_session(&mut self) {
        self.in_progress = false;
        self.firmware_size = 0;
        self.firmware_offset = 0;
        self.expected_sha256 = [0; SHA256_LEN];
        self.page.clear();
        self.page_size = 0;
    }

    /// CRC32 over everything received so far: flashed bytes first, then the
    /// pending page buffer, as one chained digest.
    fn running_crc32(&mut self) -> Result<u32, FlashError> {
        let crc = Crc::<u32>::new(&CRC_32_ISO_HDLC);
        let mut digest = crc.digest();

        let mut buf = [0u8; CHECKSUM_CHUNK_LEN];
        let mut offset = 0u32;
        while offset < self.firmware_offset {
            let remaining = (self.firmware_offset - offset) as usize;
            let chunk = &mut buf[..remaining.min(CHECKSUM_CHUNK_LEN)];
            self.flash.read(offset, chunk)?;
            digest.update(chunk);
            offset += chunk.len() as u32;
        }

        digest.update(&self.page);
        Ok(digest.finalize())
    }

    /// SHA-256 over the flashed image, compared against the digest captured
    /// at Init without early exit.
    fn verify_image(&mut self) -> Result<bool, FlashError> {
        let mut hasher = Sha256::new();

        let mut buf = [0u8; CHECKSUM_CHUNK_LEN];
        let mut offset = 0u32;
        while offset < self.firmware_size {
            let remaining = (self.firmware_size - offset) as usize;
            let chunk = &mut buf[..remaining.min(CHECKSUM_CHUNK_LEN)];
            self.flash.read(offset, chunk)?;
            hasher.update(&*chunk);
            offset += chunk.len() as u32;
        }

        let computed = hasher.finalize();
        let mut diff = 0u8;
        for (a, b) in computed.iter().zip(self.expected_sha256.iter()) {
            diff |= a ^ b;
        }
        Ok(diff == 0)
    }
}

fn respond<S: FrameSink>(sink: &mut S, command: Opcode, status: DfuStatus) {
    sink.send(command, &[status as u8]);
}
