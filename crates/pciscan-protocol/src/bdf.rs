use core::fmt;

/// Number of device slots on one PCI bus.
pub const PCI_DEVICES_PER_BUS: u8 = 32;
/// Number of functions one PCI device can expose.
pub const PCI_FUNCTIONS_PER_DEVICE: u8 = 8;

/// Bit 31 of a configuration mechanism #1 address; activates the address decode.
pub const PCI_CONFIG_ADDRESS_ENABLE: u32 = 0x8000_0000;

/// Location of one PCI function. Orders by bus, then device, then function, which is the
/// enumeration order of a bus walk.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PciBdf {
    pub bus: u8,
    pub device: u8,
    pub function: u8,
}

impl PciBdf {
    /// `device` must be below 32 and `function` below 8.
    pub const fn new(bus: u8, device: u8, function: u8) -> Self {
        Self {
            bus,
            device,
            function,
        }
    }

    /// Composes the configuration mechanism #1 address (the value written to port `0xCF8`).
    ///
    /// Layout:
    /// - bit 31: enable
    /// - bits 16..=23: bus
    /// - bits 11..=15: device
    /// - bits 8..=10: function
    /// - bits 2..=7: register offset (dword aligned; bits 0..=1 are forced to 0)
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `device >= 32` or `function >= 8`.
    pub const fn config_address(self, register: u8) -> u32 {
        debug_assert!(self.device < PCI_DEVICES_PER_BUS);
        debug_assert!(self.function < PCI_FUNCTIONS_PER_DEVICE);
        PCI_CONFIG_ADDRESS_ENABLE
            | (self.bus as u32) << 16
            | (self.device as u32) << 11
            | (self.function as u32) << 8
            | (register as u32 & 0xFC)
    }

    /// Recovers the BDF encoded in a configuration mechanism #1 address.
    ///
    /// The enable bit and register offset are ignored.
    pub const fn from_config_address(addr: u32) -> Self {
        Self {
            bus: (addr >> 16) as u8,
            device: ((addr >> 11) & 0x1F) as u8,
            function: ((addr >> 8) & 0x7) as u8,
        }
    }
}

/// Formats as `BB:DD.F` in hex, the usual PCI location notation.
impl fmt::Display for PciBdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}:{:02X}.{:X}", self.bus, self.device, self.function)
    }
}
