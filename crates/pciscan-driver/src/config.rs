//! Guarded access to PCI configuration space through mechanism #1.

use std::sync::{Mutex, MutexGuard, PoisonError};

use pciscan_protocol::{PciBdf, INVALID_VENDOR_ID};

use crate::ports::{PortIo, PCI_CFG_ADDR_PORT, PCI_CFG_DATA_PORT};

/// Vendor ID (low half) / device ID (high half).
pub const PCI_VENDOR_DEVICE_OFFSET: u8 = 0x00;
/// Revision (bits 0..=7), programming interface, subclass, base class (bits 24..=31).
pub const PCI_CLASS_REVISION_OFFSET: u8 = 0x08;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciVendorDeviceId {
    pub vendor_id: u16,
    pub device_id: u16,
}

impl PciVendorDeviceId {
    pub const fn from_dword(value: u32) -> Self {
        Self {
            vendor_id: (value & 0xFFFF) as u16,
            device_id: (value >> 16) as u16,
        }
    }

    /// False for an empty slot, which reads back an all-ones vendor ID.
    pub const fn is_present(&self) -> bool {
        self.vendor_id != INVALID_VENDOR_ID
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciClassCode {
    pub base_class: u8,
    pub sub_class: u8,
    pub prog_if: u8,
    pub revision: u8,
}

impl PciClassCode {
    pub const fn from_dword(value: u32) -> Self {
        Self {
            revision: value as u8,
            prog_if: (value >> 8) as u8,
            sub_class: (value >> 16) as u8,
            base_class: (value >> 24) as u8,
        }
    }
}

/// Configuration mechanism #1 over a [`PortIo`] backend.
///
/// The address/data port pair is shared state: writing `0xCF8` and reading `0xCFC` must not
/// interleave with another agent's pair. Every access goes through the internal lock, and a
/// [`ConfigSession`] keeps it for as many reads as the caller needs.
#[derive(Debug)]
pub struct ConfigMechanism1<P> {
    ports: Mutex<P>,
}

impl<P: PortIo> ConfigMechanism1<P> {
    pub fn new(ports: P) -> Self {
        Self {
            ports: Mutex::new(ports),
        }
    }

    /// Takes the port lock until the returned session is dropped.
    pub fn session(&self) -> ConfigSession<'_, P> {
        ConfigSession {
            // A panic mid-access leaves nothing half-updated that a fresh address write does
            // not overwrite.
            ports: self.ports.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    pub fn read_dword(&self, bdf: PciBdf, register: u8) -> u32 {
        self.session().read_dword(bdf, register)
    }

    /// Runs `f` with the backend while holding the port lock.
    pub fn with_ports<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        f(&mut self.session().ports)
    }

    pub fn into_inner(self) -> P {
        self.ports.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive use of the configuration ports.
pub struct ConfigSession<'a, P> {
    ports: MutexGuard<'a, P>,
}

impl<P: PortIo> ConfigSession<'_, P> {
    /// Reads one dword. `register` is rounded down to dword alignment.
    pub fn read_dword(&mut self, bdf: PciBdf, register: u8) -> u32 {
        self.ports
            .write(PCI_CFG_ADDR_PORT, 4, bdf.config_address(register));
        self.ports.read(PCI_CFG_DATA_PORT, 4)
    }

    pub fn vendor_device(&mut self, bdf: PciBdf) -> PciVendorDeviceId {
        PciVendorDeviceId::from_dword(self.read_dword(bdf, PCI_VENDOR_DEVICE_OFFSET))
    }

    pub fn class_code(&mut self, bdf: PciBdf) -> PciClassCode {
        PciClassCode::from_dword(self.read_dword(bdf, PCI_CLASS_REVISION_OFFSET))
    }
}
