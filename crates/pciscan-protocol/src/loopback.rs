//! In-process object namespace.
//!
//! Models the small part of the OS object manager the scanner relies on: named device objects,
//! symbolic links pointing at them, and user-mode open handles that dispatch create / device
//! control / close to the device. Names compare ASCII case-insensitively, like the real
//! namespace.
//!
//! The namespace lock is never held while a device callback runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::NtStatus;

/// Prefix of user-mode device paths (`\\.\NAME`).
const USER_PATH_PREFIX: &str = r"\\.\";
/// Native spelling of the per-session DOS device directory.
const GLOBAL_ROOT_PREFIX: &str = r"\??\";
const DOS_DEVICES_DIR: &str = r"\DosDevices\";

/// Dispatch routines of a device object.
pub trait DeviceObject: Send + Sync {
    /// Called when a handle is opened. Failing refuses the open.
    fn create(&self) -> Result<(), NtStatus> {
        Ok(())
    }

    /// Called when a handle is released.
    fn close(&self) {}

    /// Handles one device control request. Returns the number of bytes written to `output`.
    fn device_control(&self, code: u32, input: &[u8], output: &mut [u8]) -> Result<usize, NtStatus>;
}

#[derive(Default)]
struct Objects {
    devices: HashMap<String, Arc<dyn DeviceObject>>,
    /// link name -> device name
    links: HashMap<String, String>,
}

#[derive(Default)]
struct Shared {
    objects: Mutex<Objects>,
    open_handles: AtomicUsize,
}

/// A shareable object namespace. Clones refer to the same namespace.
#[derive(Clone, Default)]
pub struct ObjectNamespace {
    shared: Arc<Shared>,
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl ObjectNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> MutexGuard<'_, Objects> {
        self.shared
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_device(&self, name: &str, device: Arc<dyn DeviceObject>) -> Result<(), NtStatus> {
        let mut objects = self.objects();
        let k = key(name);
        if objects.devices.contains_key(&k) {
            return Err(NtStatus::ObjectNameCollision);
        }
        objects.devices.insert(k, device);
        debug!(name, "device object created");
        Ok(())
    }

    /// Removes a device object. Handles that are already open keep working until released.
    pub fn delete_device(&self, name: &str) -> bool {
        let removed = self.objects().devices.remove(&key(name)).is_some();
        if removed {
            debug!(name, "device object deleted");
        }
        removed
    }

    pub fn create_symbolic_link(&self, link: &str, target: &str) -> Result<(), NtStatus> {
        let mut objects = self.objects();
        let k = key(link);
        if objects.links.contains_key(&k) {
            return Err(NtStatus::ObjectNameCollision);
        }
        objects.links.insert(k, key(target));
        debug!(link, target, "symbolic link created");
        Ok(())
    }

    pub fn delete_symbolic_link(&self, link: &str) -> bool {
        let removed = self.objects().links.remove(&key(link)).is_some();
        if removed {
            debug!(link, "symbolic link deleted");
        }
        removed
    }

    pub fn has_device(&self, name: &str) -> bool {
        self.objects().devices.contains_key(&key(name))
    }

    pub fn has_symbolic_link(&self, link: &str) -> bool {
        self.objects().links.contains_key(&key(link))
    }

    /// Number of handles opened through this namespace and not yet dropped.
    pub fn open_handle_count(&self) -> usize {
        self.shared.open_handles.load(Ordering::SeqCst)
    }

    /// Opens a user-mode path (`\\.\NAME` or `\??\NAME`).
    ///
    /// Errors are platform error codes, as a user-mode caller would observe them.
    pub fn open(&self, path: &str) -> Result<OpenHandle, u32> {
        let not_found = NtStatus::ObjectNameNotFound.to_win32_error();

        let name = strip_prefix_ignore_case(path, USER_PATH_PREFIX)
            .or_else(|| strip_prefix_ignore_case(path, GLOBAL_ROOT_PREFIX))
            .ok_or(not_found)?;
        let link = key(&format!("{DOS_DEVICES_DIR}{name}"));

        let device = {
            let objects = self.objects();
            let target = objects.links.get(&link).ok_or(not_found)?;
            Arc::clone(objects.devices.get(target).ok_or(not_found)?)
        };

        device.create().map_err(NtStatus::to_win32_error)?;
        self.shared.open_handles.fetch_add(1, Ordering::SeqCst);
        trace!(path, "handle opened");

        Ok(OpenHandle {
            device,
            shared: Arc::clone(&self.shared),
            path: path.to_owned(),
        })
    }
}

impl fmt::Debug for ObjectNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let objects = self.objects();
        let mut devices: Vec<_> = objects.devices.keys().collect();
        devices.sort();
        f.debug_struct("ObjectNamespace")
            .field("devices", &devices)
            .field("links", &objects.links)
            .field("open_handles", &self.open_handle_count())
            .finish()
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
        .filter(|rest| !rest.is_empty())
}

/// An open handle to a device object. Dropping it dispatches close.
pub struct OpenHandle {
    device: Arc<dyn DeviceObject>,
    shared: Arc<Shared>,
    path: String,
}

impl OpenHandle {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Issues a device control request; failures surface as platform error codes.
    pub fn device_control(&self, code: u32, input: &[u8], output: &mut [u8]) -> Result<usize, u32> {
        self.device
            .device_control(code, input, output)
            .map_err(NtStatus::to_win32_error)
    }
}

impl fmt::Debug for OpenHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenHandle").field("path", &self.path).finish()
    }
}

impl Drop for OpenHandle {
    fn drop(&mut self) {
        self.device.close();
        self.shared.open_handles.fetch_sub(1, Ordering::SeqCst);
        trace!(path = %self.path, "handle closed");
    }
}
