//! Privileged side of the PCI scanner.
//!
//! Walks PCI configuration space through mechanism #1 (`0xCF8`/`0xCFC`), classifies each
//! function it finds and answers the single device control request defined in
//! [`pciscan_protocol`].
//!
//! Port access goes through the [`PortIo`] seam: [`SyntheticConfigSpace`] emulates a bus in
//! memory, and the `port-io` feature adds `HardwarePorts` for real x86 hardware.

pub mod class;
pub mod config;
pub mod device;
pub mod ports;
pub mod registration;
pub mod scanner;
pub mod sim;

pub use class::{classify, known_device, vendor_name};
pub use config::{ConfigMechanism1, ConfigSession, PciClassCode, PciVendorDeviceId};
pub use device::ScannerDevice;
#[cfg(all(feature = "port-io", target_arch = "x86_64"))]
pub use ports::HardwarePorts;
pub use ports::{PortIo, PCI_CFG_ADDR_PORT, PCI_CFG_DATA_PORT};
pub use registration::DriverRegistration;
pub use scanner::{
    scan, ConfigError, ScanConfig, ScanOutcome, BUS_COUNT_ENV, DEFAULT_BUS_COUNT,
    FALLBACK_DESCRIPTION, MAX_BUS_COUNT,
};
pub use sim::{SyntheticConfigSpace, SyntheticFunction};
