//! DFU response status codes.

/// Status byte carried in every DFU response payload.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DfuStatus {
    InvalidCode = 0x00,
    Success = 0x01,
    OpcodeNotSupported = 0x02,
    InvalidParameter = 0x03,
    InsufficientResources = 0x04,
    InvalidObject = 0x05,
    UnsupportedType = 0x07,
    OperationNotPermitted = 0x08,
    OperationFailed = 0x0A,
    /// The offered image carries the build already running on the device.
    /// A rejection, but not an error.
    FirmwareAlreadyUpToDate = 0x80,
    /// Terminal success; the device commits the image and reboots.
    FirmwareSuccessfullyUpdated = 0xFF,
}

/// Peer state byte of a StateCheck response.
pub const STATE_CHECK_IN_PROGRESS: u8 = 0x00;
pub const STATE_CHECK_NOT_IN_PROGRESS: u8 = 0x01;
