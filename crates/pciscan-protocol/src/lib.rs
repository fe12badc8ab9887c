//! Binary contract between the privileged PCI scanner and its unprivileged clients.
//!
//! The scanner and the client are built independently and never share a live connection; the
//! only thing they agree on is what lives in this crate:
//! - the endpoint names ([`DEVICE_NAME`], [`SYMBOLIC_LINK_NAME`], [`USER_DEVICE_PATH`]),
//! - the single control code ([`IOCTL_PCI_GET_DEVICES`]) and its failure statuses,
//! - the fixed `#[repr(C)]` layout of [`DeviceList`] / [`DeviceRecord`].
//!
//! [`loopback`] is an in-process stand-in for the OS object namespace so both sides can be wired
//! together without a kernel.

pub mod bdf;
pub mod ioctl;
pub mod loopback;
pub mod wire;

pub use bdf::{PciBdf, PCI_CONFIG_ADDRESS_ENABLE, PCI_DEVICES_PER_BUS, PCI_FUNCTIONS_PER_DEVICE};
pub use ioctl::{
    ctl_code, NtStatus, ERROR_ALREADY_EXISTS, ERROR_FILE_NOT_FOUND, ERROR_INSUFFICIENT_BUFFER,
    ERROR_INVALID_FUNCTION, FILE_ANY_ACCESS, FILE_DEVICE_UNKNOWN, IOCTL_PCI_GET_DEVICES,
    METHOD_BUFFERED,
};
pub use wire::{
    DeviceList, DeviceListFull, DeviceRecord, WireError, DESCRIPTION_CAPACITY,
    DEVICE_LIST_CAPACITY, DEVICE_LIST_SIZE, DEVICE_RECORD_SIZE, INVALID_VENDOR_ID,
};

/// Kernel object name of the scanner device.
pub const DEVICE_NAME: &str = r"\Device\PCIScanner";

/// Symbolic link that makes [`DEVICE_NAME`] reachable from user mode.
pub const SYMBOLIC_LINK_NAME: &str = r"\DosDevices\PCIScanner";

/// Path a user-mode client opens to reach the scanner.
pub const USER_DEVICE_PATH: &str = r"\\.\PCIScanner";
