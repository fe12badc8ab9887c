use std::sync::Arc;

use pciscan_protocol::loopback::{DeviceObject, ObjectNamespace};
use pciscan_protocol::{NtStatus, DEVICE_NAME, SYMBOLIC_LINK_NAME};
use tracing::{info, warn};

/// The scanner's presence in an object namespace. Dropping it unloads the driver.
#[derive(Debug)]
pub struct DriverRegistration {
    namespace: ObjectNamespace,
}

impl DriverRegistration {
    /// Creates the device object and the symbolic link that makes it reachable from user mode.
    ///
    /// If the link cannot be created the device object is deleted again.
    pub fn load(namespace: &ObjectNamespace, device: Arc<dyn DeviceObject>) -> Result<Self, NtStatus> {
        namespace.create_device(DEVICE_NAME, device)?;
        if let Err(status) = namespace.create_symbolic_link(SYMBOLIC_LINK_NAME, DEVICE_NAME) {
            warn!(%status, link = SYMBOLIC_LINK_NAME, "failed to create symbolic link");
            namespace.delete_device(DEVICE_NAME);
            return Err(status);
        }
        info!(device = DEVICE_NAME, link = SYMBOLIC_LINK_NAME, "PCI scanner loaded");
        Ok(Self {
            namespace: namespace.clone(),
        })
    }
}

impl Drop for DriverRegistration {
    fn drop(&mut self) {
        self.namespace.delete_symbolic_link(SYMBOLIC_LINK_NAME);
        self.namespace.delete_device(DEVICE_NAME);
        info!("PCI scanner unloaded");
    }
}
