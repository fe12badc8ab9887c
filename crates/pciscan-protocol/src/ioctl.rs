//! Control codes and completion statuses of the scanner endpoint.

use thiserror::Error;

/// Device type for devices that do not fit a predefined category.
pub const FILE_DEVICE_UNKNOWN: u32 = 0x0000_0022;
/// Input/output are copied through an intermediate system buffer.
pub const METHOD_BUFFERED: u32 = 0;
/// The request may be issued on any open handle regardless of its access rights.
pub const FILE_ANY_ACCESS: u32 = 0;

/// Composes a device control code.
///
/// Layout (LSB..MSB):
/// - bits 0..=1: transfer method
/// - bits 2..=13: function
/// - bits 14..=15: required access
/// - bits 16..=31: device type
pub const fn ctl_code(device_type: u32, function: u32, method: u32, access: u32) -> u32 {
    (device_type << 16) | (access << 14) | (function << 2) | method
}

/// The only operation the scanner endpoint supports: run one scan and return a [`DeviceList`].
///
/// Input payload: empty. Output payload: exactly [`DEVICE_LIST_SIZE`] bytes.
///
/// [`DeviceList`]: crate::DeviceList
/// [`DEVICE_LIST_SIZE`]: crate::DEVICE_LIST_SIZE
pub const IOCTL_PCI_GET_DEVICES: u32 =
    ctl_code(FILE_DEVICE_UNKNOWN, 0x800, METHOD_BUFFERED, FILE_ANY_ACCESS);

/// Platform error codes observed by the unprivileged side.
pub const ERROR_INVALID_FUNCTION: u32 = 1;
pub const ERROR_FILE_NOT_FOUND: u32 = 2;
pub const ERROR_INSUFFICIENT_BUFFER: u32 = 122;
pub const ERROR_ALREADY_EXISTS: u32 = 183;

/// Failure statuses a request on the privileged side can complete with.
///
/// Success is expressed as `Ok(bytes_written)` by the dispatch routines; this enum only carries
/// the failure half of the status space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[repr(u32)]
pub enum NtStatus {
    #[error("STATUS_INVALID_DEVICE_REQUEST (0xC0000010)")]
    InvalidDeviceRequest = 0xC000_0010,
    #[error("STATUS_BUFFER_TOO_SMALL (0xC0000023)")]
    BufferTooSmall = 0xC000_0023,
    #[error("STATUS_OBJECT_NAME_NOT_FOUND (0xC0000034)")]
    ObjectNameNotFound = 0xC000_0034,
    #[error("STATUS_OBJECT_NAME_COLLISION (0xC0000035)")]
    ObjectNameCollision = 0xC000_0035,
}

impl NtStatus {
    /// Raw 32-bit status value.
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Maps the status to the platform error code a user-mode caller sees when its request
    /// completes with this status.
    pub const fn to_win32_error(self) -> u32 {
        match self {
            Self::InvalidDeviceRequest => ERROR_INVALID_FUNCTION,
            Self::BufferTooSmall => ERROR_INSUFFICIENT_BUFFER,
            Self::ObjectNameNotFound => ERROR_FILE_NOT_FOUND,
            Self::ObjectNameCollision => ERROR_ALREADY_EXISTS,
        }
    }
}
