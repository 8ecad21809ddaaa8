//! Length-checked decode/encode of DFU command payloads.
//!
//! Payloads are decoded field by field instead of reinterpreting the byte
//! buffer as a struct, so alignment and endianness stay explicit.

use heapless::Vec;
use meshbridge_protocol::MAX_PAYLOAD_LEN;

use crate::status::DfuStatus;

pub const SHA256_LEN: usize = 32;

/// Largest page the engine accepts; one flash commit per page.
pub const MAX_PAGE_SIZE: usize = 1024;

/// Init fixed fields: size (4), digest (32), app-data length (1).
const INIT_FIXED_LEN: usize = 4 + SHA256_LEN + 1;

/// App data shares the frame payload with the Init fixed fields.
pub const MAX_APP_DATA_LEN: usize = MAX_PAYLOAD_LEN - INIT_FIXED_LEN;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum WireError {
    Truncated,
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Update proposal: declared image size, expected digest, application data.
#[derive(Debug, PartialEq, Eq)]
pub struct InitRequest {
    pub firmware_size: u32,
    /// Expected SHA-256 of the complete image. Transmitted in reverse byte
    /// order on the wire; stored here un-reversed.
    pub sha256: [u8; SHA256_LEN],
    pub app_data: Vec<u8, MAX_APP_DATA_LEN>,
}

impl InitRequest {
    pub fn decode(payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() < INIT_FIXED_LEN {
            return Err(WireError::Truncated);
        }
        let firmware_size = read_u32_le(payload);

        let mut sha256 = [0u8; SHA256_LEN];
        for (i, &byte) in payload[4..4 + SHA256_LEN].iter().enumerate() {
            sha256[SHA256_LEN - 1 - i] = byte;
        }

        let app_data_len = payload[INIT_FIXED_LEN - 1] as usize;
        let rest = &payload[INIT_FIXED_LEN..];
        if rest.len() < app_data_len {
            return Err(WireError::Truncated);
        }

        let mut app_data = Vec::new();
        // app_data_len <= MAX_APP_DATA_LEN because the frame payload is bounded
        let _ = app_data.extend_from_slice(&rest[..app_data_len]);

        Ok(Self {
            firmware_size,
            sha256,
            app_data,
        })
    }
}

/// Opens a page of `page_size` bytes.
#[derive(Debug, PartialEq, Eq)]
pub struct PageCreateRequest {
    pub page_size: u32,
}

impl PageCreateRequest {
    pub fn decode(payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() < 4 {
            return Err(WireError::Truncated);
        }
        Ok(Self {
            page_size: read_u32_le(payload),
        })
    }
}

/// One chunk of page data. An event, never answered.
#[derive(Debug, PartialEq, Eq)]
pub struct WriteDataEvent<'a> {
    pub chunk: &'a [u8],
}

impl<'a> WriteDataEvent<'a> {
    pub fn decode(payload: &'a [u8]) -> Result<Self, WireError> {
        let Some((&chunk_len, rest)) = payload.split_first() else {
            return Err(WireError::Truncated);
        };
        if rest.len() < chunk_len as usize {
            return Err(WireError::Truncated);
        }
        Ok(Self {
            chunk: &rest[..chunk_len as usize],
        })
    }
}

/// Progress report: `status ‖ max_page ‖ offset ‖ crc32`, all LE.
#[derive(Debug, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: DfuStatus,
    pub max_page_size: u32,
    pub offset: u32,
    pub crc32: u32,
}

impl StatusResponse {
    pub fn encode(&self) -> Vec<u8, 13> {
        let mut out = Vec::new();
        let _ = out.push(self.status as u8);
        let _ = out.extend_from_slice(&self.max_page_size.to_le_bytes());
        let _ = out.extend_from_slice(&self.offset.to_le_bytes());
        let _ = out.extend_from_slice(&self.crc32.to_le_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_payload(size: u32, sha: &[u8; 32], app_data: &[u8]) -> std::vec::Vec<u8> {
        let mut payload = std::vec::Vec::new();
        payload.extend_from_slice(&size.to_le_bytes());
        payload.extend(sha.iter().rev());
        payload.push(app_data.len() as u8);
        payload.extend_from_slice(app_data);
        payload
    }

    #[test]
    fn init_decodes_and_unreverses_digest() {
        let mut sha = [0u8; 32];
        for (i, byte) in sha.iter_mut().enumerate() {
            *byte = i as u8;
        }
        let payload = init_payload(0x0001_2000, &sha, b"bridge/1.2.3");
        let req = InitRequest::decode(&payload).unwrap();
        assert_eq!(req.firmware_size, 0x0001_2000);
        assert_eq!(req.sha256, sha);
        assert_eq!(req.app_data.as_slice(), b"bridge/1.2.3");
    }

    #[test]
    fn init_rejects_truncated_fixed_fields() {
        let payload = [0u8; INIT_FIXED_LEN - 1];
        assert_eq!(InitRequest::decode(&payload), Err(WireError::Truncated));
    }

    #[test]
    fn init_rejects_truncated_app_data() {
        let mut payload = init_payload(64, &[0u8; 32], b"bridge/9");
        payload.truncate(payload.len() - 3);
        assert_eq!(InitRequest::decode(&payload), Err(WireError::Truncated));
    }

    #[test]
    fn page_create_decodes_le_size() {
        let req = PageCreateRequest::decode(&[0x00, 0x04, 0x00, 0x00]).unwrap();
        assert_eq!(req.page_size, 1024);
        assert_eq!(
            PageCreateRequest::decode(&[1, 2, 3]),
            Err(WireError::Truncated)
        );
    }

    #[test]
    fn write_data_bounds_chunk_by_declared_length() {
        let event = WriteDataEvent::decode(&[3, 0xA, 0xB, 0xC, 0xD]).unwrap();
        assert_eq!(event.chunk, &[0xA, 0xB, 0xC]);
        assert_eq!(WriteDataEvent::decode(&[]), Err(WireError::Truncated));
        assert_eq!(WriteDataEvent::decode(&[4, 1, 2, 3]), Err(WireError::Truncated));
    }

    #[test]
    fn status_response_layout() {
        let response = StatusResponse {
            status: DfuStatus::Success,
            max_page_size: 1024,
            offset: 0x0000_1234,
            crc32: 0xDEAD_BEEF,
        };
        assert_eq!(
            response.encode().as_slice(),
            &[
                0x01, // status
                0x00, 0x04, 0x00, 0x00, // max page
                0x34, 0x12, 0x00, 0x00, // offset
                0xEF, 0xBE, 0xAD, 0xDE, // crc32
            ]
        );
    }
}
