//! In-memory PCI configuration space reachable through emulated mechanism #1 ports.
//!
//! Used by tests and by the loopback console backend, where real port I/O is unavailable.

use std::collections::BTreeMap;

use pciscan_protocol::{PciBdf, PCI_CONFIG_ADDRESS_ENABLE};

use crate::ports::{PortIo, PCI_CFG_ADDR_PORT, PCI_CFG_DATA_PORT};

const CONFIG_SPACE_SIZE: usize = 256;

/// Header type bit 7: the device implements more than one function.
pub const HEADER_TYPE_MULTIFUNCTION: u8 = 0x80;

/// The identifying registers of one synthetic function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticFunction {
    pub vendor_id: u16,
    pub device_id: u16,
    pub base_class: u8,
    pub sub_class: u8,
    pub prog_if: u8,
    pub revision: u8,
    pub header_type: u8,
}

impl SyntheticFunction {
    pub const fn new(vendor_id: u16, device_id: u16, base_class: u8, sub_class: u8) -> Self {
        Self {
            vendor_id,
            device_id,
            base_class,
            sub_class,
            prog_if: 0,
            revision: 0,
            header_type: 0,
        }
    }

    pub const fn revision(mut self, revision: u8) -> Self {
        self.revision = revision;
        self
    }

    pub const fn prog_if(mut self, prog_if: u8) -> Self {
        self.prog_if = prog_if;
        self
    }

    pub const fn header_type(mut self, header_type: u8) -> Self {
        self.header_type = header_type;
        self
    }

    fn config_bytes(&self) -> [u8; CONFIG_SPACE_SIZE] {
        let mut bytes = [0u8; CONFIG_SPACE_SIZE];
        bytes[0x00..0x02].copy_from_slice(&self.vendor_id.to_le_bytes());
        bytes[0x02..0x04].copy_from_slice(&self.device_id.to_le_bytes());
        bytes[0x08] = self.revision;
        bytes[0x09] = self.prog_if;
        bytes[0x0A] = self.sub_class;
        bytes[0x0B] = self.base_class;
        bytes[0x0E] = self.header_type;
        bytes
    }
}

/// A set of functions behind an emulated `0xCF8`/`0xCFC` port pair.
///
/// Reads of functions that are not present return all ones, as does the data port while the
/// address register's enable bit is clear. Writes to the data port are ignored.
#[derive(Debug, Clone, Default)]
pub struct SyntheticConfigSpace {
    functions: BTreeMap<PciBdf, [u8; CONFIG_SPACE_SIZE]>,
    addr: u32,
    data_reads: u64,
}

impl SyntheticConfigSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// A space in which every slot is empty.
    pub fn empty() -> Self {
        Self::new()
    }

    /// The PCI functions of a Hyper-V generation 1 virtual machine: the emulated 440BX host
    /// bridge, the PIIX4 ISA/IDE/ACPI functions, the S3 Trio64 display adapter and the DEC 21140
    /// legacy network adapter.
    pub fn hyperv_gen1() -> Self {
        Self::new()
            .with_function(
                PciBdf::new(0, 0, 0),
                SyntheticFunction::new(0x8086, 0x7192, 0x06, 0x00).revision(0x03),
            )
            .with_function(
                PciBdf::new(0, 7, 0),
                SyntheticFunction::new(0x8086, 0x7110, 0x06, 0x01)
                    .revision(0x01)
                    .header_type(HEADER_TYPE_MULTIFUNCTION),
            )
            .with_function(
                PciBdf::new(0, 7, 1),
                SyntheticFunction::new(0x8086, 0x7111, 0x01, 0x01)
                    .prog_if(0x80)
                    .revision(0x01),
            )
            .with_function(
                PciBdf::new(0, 7, 3),
                SyntheticFunction::new(0x8086, 0x7113, 0x06, 0x80).revision(0x02),
            )
            .with_function(
                PciBdf::new(0, 8, 0),
                SyntheticFunction::new(0x1414, 0x5353, 0x03, 0x00),
            )
            .with_function(
                PciBdf::new(0, 10, 0),
                SyntheticFunction::new(0x1011, 0x0009, 0x02, 0x00),
            )
    }

    pub fn with_function(mut self, bdf: PciBdf, function: SyntheticFunction) -> Self {
        self.insert(bdf, function);
        self
    }

    /// Adds or replaces the function at `bdf`.
    pub fn insert(&mut self, bdf: PciBdf, function: SyntheticFunction) {
        self.functions.insert(bdf, function.config_bytes());
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Present functions in ascending BDF order.
    pub fn functions(&self) -> impl Iterator<Item = PciBdf> + '_ {
        self.functions.keys().copied()
    }

    /// Number of data port reads served so far.
    pub fn data_reads(&self) -> u64 {
        self.data_reads
    }

    fn read_config(&self, bdf: PciBdf, offset: usize, size: u8) -> u32 {
        let Some(bytes) = self.functions.get(&bdf) else {
            return 0xFFFF_FFFF;
        };
        let mut value = 0u32;
        for i in 0..usize::from(size) {
            let byte = bytes.get(offset + i).copied().unwrap_or(0xFF);
            value |= u32::from(byte) << (8 * i);
        }
        value
    }
}

impl PortIo for SyntheticConfigSpace {
    fn read(&mut self, port: u16, size: u8) -> u32 {
        match port {
            PCI_CFG_ADDR_PORT => read_u32_part(self.addr, size),
            PCI_CFG_DATA_PORT..=0xCFF => {
                self.data_reads += 1;
                if self.addr & PCI_CONFIG_ADDRESS_ENABLE == 0 {
                    return 0xFFFF_FFFF;
                }
                let bdf = PciBdf::from_config_address(self.addr);
                let offset = (self.addr & 0xFC) as usize + usize::from(port - PCI_CFG_DATA_PORT);
                self.read_config(bdf, offset, size)
            }
            _ => 0xFFFF_FFFF,
        }
    }

    fn write(&mut self, port: u16, size: u8, value: u32) {
        if port == PCI_CFG_ADDR_PORT {
            self.addr = write_u32_part(self.addr, size, value);
        }
    }
}

fn read_u32_part(value: u32, size: u8) -> u32 {
    match size {
        1 => value & 0xFF,
        2 => value & 0xFFFF,
        _ => value,
    }
}

fn write_u32_part(old: u32, size: u8, value: u32) -> u32 {
    match size {
        1 => (old & !0xFF) | (value & 0xFF),
        2 => (old & !0xFFFF) | (value & 0xFFFF),
        _ => value,
    }
}
