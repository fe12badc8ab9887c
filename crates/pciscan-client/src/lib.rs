//! Unprivileged side of the PCI scanner.
//!
//! [`PciScannerClient`] opens the scanner endpoint through a [`DeviceIoBackend`], issues the
//! single control request and turns the fixed-size [`DeviceList`](pciscan_protocol::DeviceList)
//! into a `Vec<PciDeviceInfo>`.
//!
//! Two backends exist: [`Win32Backend`] (the real endpoint, Windows only) and
//! [`ObjectNamespace`](pciscan_protocol::loopback::ObjectNamespace) for in-process use.

pub mod backend;
pub mod client;
pub mod device_info;
pub mod error;
pub mod win32;

pub use backend::{DeviceIoBackend, DeviceIoHandle};
pub use client::PciScannerClient;
pub use device_info::{PciDeviceInfo, ScanStatistics};
pub use error::{ClientError, Result, REMEDIATION_STEPS};
pub use win32::Win32Backend;
