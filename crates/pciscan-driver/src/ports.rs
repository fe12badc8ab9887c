/// PCI configuration mechanism #1 address register (`CONFIG_ADDRESS`).
pub const PCI_CFG_ADDR_PORT: u16 = 0xCF8;
/// PCI configuration mechanism #1 data window (`CONFIG_DATA`), spanning `0xCFC..=0xCFF`.
pub const PCI_CFG_DATA_PORT: u16 = 0xCFC;

/// Raw access to the x86 I/O port space.
///
/// `size` is the access width in bytes (1, 2 or 4). Implementations only need to support the
/// widths their users issue; the scanner only ever uses 4.
pub trait PortIo: Send {
    fn read(&mut self, port: u16, size: u8) -> u32;
    fn write(&mut self, port: u16, size: u8, value: u32);
}

impl<T: PortIo + ?Sized> PortIo for Box<T> {
    fn read(&mut self, port: u16, size: u8) -> u32 {
        (**self).read(port, size)
    }

    fn write(&mut self, port: u16, size: u8, value: u32) {
        (**self).write(port, size, value)
    }
}

#[cfg(all(feature = "port-io", target_arch = "x86_64"))]
pub use hardware::HardwarePorts;

#[cfg(all(feature = "port-io", target_arch = "x86_64"))]
mod hardware {
    use x86_64::instructions::port::Port;

    use super::PortIo;

    /// The machine's real I/O ports, via `in`/`out` instructions.
    #[derive(Debug)]
    pub struct HardwarePorts {
        _private: (),
    }

    impl HardwarePorts {
        /// # Safety
        ///
        /// The caller must run with I/O privilege for every port it will touch and must be the
        /// only agent driving `0xCF8`/`0xCFC` for the lifetime of the value. Port accesses have
        /// side effects the compiler cannot see.
        pub unsafe fn new() -> Self {
            Self { _private: () }
        }
    }

    impl PortIo for HardwarePorts {
        fn read(&mut self, port: u16, size: u8) -> u32 {
            // SAFETY: upheld by the contract of `HardwarePorts::new`.
            unsafe {
                match size {
                    1 => u32::from(Port::<u8>::new(port).read()),
                    2 => u32::from(Port::<u16>::new(port).read()),
                    _ => Port::<u32>::new(port).read(),
                }
            }
        }

        fn write(&mut self, port: u16, size: u8, value: u32) {
            // SAFETY: upheld by the contract of `HardwarePorts::new`.
            unsafe {
                match size {
                    1 => Port::<u8>::new(port).write(value as u8),
                    2 => Port::<u16>::new(port).write(value as u16),
                    _ => Port::<u32>::new(port).write(value),
                }
            }
        }
    }
}
