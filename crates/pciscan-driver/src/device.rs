use std::sync::atomic::{AtomicU64, Ordering};

use pciscan_protocol::loopback::DeviceObject;
use pciscan_protocol::{NtStatus, DEVICE_LIST_SIZE, IOCTL_PCI_GET_DEVICES};
use tracing::{debug, warn};

use crate::config::ConfigMechanism1;
use crate::ports::PortIo;
use crate::scanner::{scan, ScanConfig, ScanOutcome};

/// The scanner endpoint: answers [`IOCTL_PCI_GET_DEVICES`] with one full bus walk.
///
/// Stateless across requests apart from the scan counter.
#[derive(Debug)]
pub struct ScannerDevice<P> {
    access: ConfigMechanism1<P>,
    config: ScanConfig,
    scans: AtomicU64,
}

impl<P: PortIo> ScannerDevice<P> {
    pub fn new(ports: P, config: ScanConfig) -> Self {
        Self {
            access: ConfigMechanism1::new(ports),
            config,
            scans: AtomicU64::new(0),
        }
    }

    pub fn access(&self) -> &ConfigMechanism1<P> {
        &self.access
    }

    /// Number of bus walks performed so far.
    pub fn scans_performed(&self) -> u64 {
        self.scans.load(Ordering::SeqCst)
    }

    /// Runs one scan outside of any request.
    pub fn scan(&self) -> ScanOutcome {
        self.scans.fetch_add(1, Ordering::SeqCst);
        scan(&self.access, &self.config)
    }

    /// Handles one request. Returns the number of bytes written to `output`.
    ///
    /// The input payload is ignored. Nothing is scanned or written unless `output` can hold a
    /// whole [`DeviceList`](pciscan_protocol::DeviceList).
    pub fn handle_control(&self, code: u32, output: &mut [u8]) -> Result<usize, NtStatus> {
        if code != IOCTL_PCI_GET_DEVICES {
            debug!(code = %format_args!("{code:#010x}"), "unsupported control code");
            return Err(NtStatus::InvalidDeviceRequest);
        }
        let Some(out) = output.get_mut(..DEVICE_LIST_SIZE) else {
            warn!(
                len = output.len(),
                required = DEVICE_LIST_SIZE,
                "output buffer too small"
            );
            return Err(NtStatus::BufferTooSmall);
        };

        let outcome = self.scan();
        out.copy_from_slice(outcome.list.as_bytes());
        Ok(DEVICE_LIST_SIZE)
    }
}

impl<P: PortIo> DeviceObject for ScannerDevice<P> {
    fn device_control(&self, code: u32, _input: &[u8], output: &mut [u8]) -> Result<usize, NtStatus> {
        self.handle_control(code, output)
    }
}
