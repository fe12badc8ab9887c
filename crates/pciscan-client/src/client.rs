use pciscan_protocol::{DeviceList, DEVICE_LIST_SIZE, IOCTL_PCI_GET_DEVICES};
use tracing::{debug, warn};

use crate::backend::{DeviceIoBackend, DeviceIoHandle};
use crate::device_info::PciDeviceInfo;
use crate::error::{ClientError, Result};

/// A handle to the scanner endpoint.
///
/// The handle is released when the client is dropped.
#[derive(Debug)]
pub struct PciScannerClient<H> {
    handle: H,
}

impl<H: DeviceIoHandle> PciScannerClient<H> {
    pub fn open<B>(backend: &B, path: &str) -> Result<Self>
    where
        B: DeviceIoBackend<Handle = H>,
    {
        let handle = backend.open(path).map_err(|code| {
            warn!(path, code, "failed to open scanner endpoint");
            ClientError::OpenFailed {
                path: path.to_owned(),
                code,
            }
        })?;
        debug!(path, "scanner endpoint opened");
        Ok(Self { handle })
    }

    /// Runs one scan and returns the list exactly as the endpoint produced it.
    pub fn scan_raw(&mut self) -> Result<DeviceList> {
        let mut buf = vec![0u8; DEVICE_LIST_SIZE];
        let written = self
            .handle
            .device_control(IOCTL_PCI_GET_DEVICES, &[], &mut buf)
            .map_err(|code| ClientError::RequestFailed { code })?;
        if written != DEVICE_LIST_SIZE {
            return Err(ClientError::ShortResponse {
                expected: DEVICE_LIST_SIZE,
                actual: written,
            });
        }
        let list = DeviceList::decode(&buf)?;
        debug!(count = list.len(), "device list received");
        Ok(list)
    }

    /// Runs one scan and returns the populated records.
    pub fn scan(&mut self) -> Result<Vec<PciDeviceInfo>> {
        let list = self.scan_raw()?;
        Ok(list.iter().map(PciDeviceInfo::from).collect())
    }
}
