//! Command codes of the modem link protocol.

/// First command code of the DFU block.
pub const DFU_OPCODE_BASE: u8 = 0x80;

/// Command byte of a frame.
///
/// Non-DFU commands are forwarded to their respective collaborators
/// (mesh models, sensors, time sync); the `0x80..=0x8C` block belongs to the
/// firmware-update engine.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    PingRequest = 0x01,
    PongResponse = 0x02,
    InitDeviceEvent = 0x03,
    CreateInstancesRequest = 0x04,
    CreateInstancesResponse = 0x05,
    InitNodeEvent = 0x06,
    MeshMessageRequest = 0x07,
    StartNodeRequest = 0x09,
    StartNodeResponse = 0x0B,
    FactoryResetRequest = 0x0C,
    FactoryResetResponse = 0x0D,
    FactoryResetEvent = 0x0E,
    MeshMessageResponse = 0x0F,
    CurrentStateRequest = 0x10,
    CurrentStateResponse = 0x11,
    Error = 0x12,
    ModemFirmwareVersionRequest = 0x13,
    ModemFirmwareVersionResponse = 0x14,
    SensorUpdateRequest = 0x15,
    AttentionEvent = 0x16,
    SoftwareResetRequest = 0x17,
    SoftwareResetResponse = 0x18,
    SensorUpdateResponse = 0x19,
    DeviceUuidRequest = 0x1A,
    DeviceUuidResponse = 0x1B,
    SetFaultRequest = 0x1C,
    SetFaultResponse = 0x1D,
    ClearFaultRequest = 0x1E,
    ClearFaultResponse = 0x1F,
    StartTestRequest = 0x20,
    StartTestResponse = 0x21,
    TestFinishedRequest = 0x22,
    TestFinishedResponse = 0x23,
    FirmwareVersionSetRequest = 0x24,
    FirmwareVersionSetResponse = 0x25,
    BatteryStatusSetRequest = 0x26,
    BatteryStatusSetResponse = 0x27,
    MeshMessageRequest1 = 0x28,
    TimeSourceSetRequest = 0x29,
    TimeSourceSetResponse = 0x2A,
    TimeSourceGetRequest = 0x2B,
    TimeSourceGetResponse = 0x2C,
    TimeGetRequest = 0x2D,
    TimeGetResponse = 0x2E,
    DfuInitRequest = 0x80,
    DfuInitResponse = 0x81,
    DfuStatusRequest = 0x82,
    DfuStatusResponse = 0x83,
    DfuPageCreateRequest = 0x84,
    DfuPageCreateResponse = 0x85,
    DfuWriteDataEvent = 0x86,
    DfuPageStoreRequest = 0x87,
    DfuPageStoreResponse = 0x88,
    DfuStateCheckRequest = 0x89,
    DfuStateCheckResponse = 0x8A,
    DfuCancelRequest = 0x8B,
    DfuCancelResponse = 0x8C,
}

impl Opcode {
    /// Maps a received command byte to a known opcode. Unknown codes yield
    /// `None` and are ignored by the dispatcher.
    pub fn from_u8(byte: u8) -> Option<Self> {
        use Opcode::*;
        let opcode = match byte {
            0x01 => PingRequest,
            0x02 => PongResponse,
            0x03 => InitDeviceEvent,
            0x04 => CreateInstancesRequest,
            0x05 => CreateInstancesResponse,
            0x06 => InitNodeEvent,
            0x07 => MeshMessageRequest,
            0x09 => StartNodeRequest,
            0x0B => StartNodeResponse,
            0x0C => FactoryResetRequest,
            0x0D => FactoryResetResponse,
            0x0E => FactoryResetEvent,
            0x0F => MeshMessageResponse,
            0x10 => CurrentStateRequest,
            0x11 => CurrentStateResponse,
            0x12 => Error,
            0x13 => ModemFirmwareVersionRequest,
            0x14 => ModemFirmwareVersionResponse,
            0x15 => SensorUpdateRequest,
            0x16 => AttentionEvent,
            0x17 => SoftwareResetRequest,
            0x18 => SoftwareResetResponse,
            0x19 => SensorUpdateResponse,
            0x1A => DeviceUuidRequest,
            0x1B => DeviceUuidResponse,
            0x1C => SetFaultRequest,
            0x1D => SetFaultResponse,
            0x1E => ClearFaultRequest,
            0x1F => ClearFaultResponse,
            0x20 => StartTestRequest,
            0x21 => StartTestResponse,
            0x22 => TestFinishedRequest,
            0x23 => TestFinishedResponse,
            0x24 => FirmwareVersionSetRequest,
            0x25 => FirmwareVersionSetResponse,
            0x26 => BatteryStatusSetRequest,
            0x27 => BatteryStatusSetResponse,
            0x28 => MeshMessageRequest1,
            0x29 => TimeSourceSetRequest,
            0x2A => TimeSourceSetResponse,
            0x2B => TimeSourceGetRequest,
            0x2C => TimeSourceGetResponse,
            0x2D => TimeGetRequest,
            0x2E => TimeGetResponse,
            0x80 => DfuInitRequest,
            0x81 => DfuInitResponse,
            0x82 => DfuStatusRequest,
            0x83 => DfuStatusResponse,
            0x84 => DfuPageCreateRequest,
            0x85 => DfuPageCreateResponse,
            0x86 => DfuWriteDataEvent,
            0x87 => DfuPageStoreRequest,
            0x88 => DfuPageStoreResponse,
            0x89 => DfuStateCheckRequest,
            0x8A => DfuStateCheckResponse,
            0x8B => DfuCancelRequest,
            0x8C => DfuCancelResponse,
            _ => return None,
        };
        Some(opcode)
    }

    /// Whether this command is routed to the firmware-update engine.
    pub fn is_dfu(self) -> bool {
        self as u8 >= DFU_OPCODE_BASE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trip() {
        for byte in 0..=u8::MAX {
            if let Some(opcode) = Opcode::from_u8(byte) {
                assert_eq!(opcode as u8, byte);
            }
        }
    }

    #[test]
    fn unknown_codes_rejected() {
        assert_eq!(Opcode::from_u8(0x08), None);
        assert_eq!(Opcode::from_u8(0x0A), None);
        assert_eq!(Opcode::from_u8(0x2F), None);
        assert_eq!(Opcode::from_u8(0x8D), None);
        assert_eq!(Opcode::from_u8(0xFF), None);
    }

    #[test]
    fn dfu_block_detected() {
        assert!(Opcode::DfuInitRequest.is_dfu());
        assert!(Opcode::DfuCancelResponse.is_dfu());
        assert!(!Opcode::TimeGetResponse.is_dfu());
        assert!(!Opcode::PingRequest.is_dfu());
    }
}
