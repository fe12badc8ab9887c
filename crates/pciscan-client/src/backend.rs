use pciscan_protocol::loopback::{ObjectNamespace, OpenHandle};

/// Something that can open a device path and hand back a handle.
///
/// Errors are platform error codes (`ERROR_FILE_NOT_FOUND`, `ERROR_ACCESS_DENIED`, ...).
pub trait DeviceIoBackend {
    type Handle: DeviceIoHandle;

    fn open(&self, path: &str) -> Result<Self::Handle, u32>;
}

/// An open device. Dropping the handle releases it.
pub trait DeviceIoHandle {
    /// Issues one device control request and returns the number of bytes the device wrote.
    fn device_control(&mut self, code: u32, input: &[u8], output: &mut [u8]) -> Result<usize, u32>;
}

impl<H: DeviceIoHandle + ?Sized> DeviceIoHandle for Box<H> {
    fn device_control(&mut self, code: u32, input: &[u8], output: &mut [u8]) -> Result<usize, u32> {
        (**self).device_control(code, input, output)
    }
}

/// In-process transport: paths resolve through an [`ObjectNamespace`].
impl DeviceIoBackend for ObjectNamespace {
    type Handle = OpenHandle;

    fn open(&self, path: &str) -> Result<OpenHandle, u32> {
        ObjectNamespace::open(self, path)
    }
}

impl DeviceIoHandle for OpenHandle {
    fn device_control(&mut self, code: u32, input: &[u8], output: &mut [u8]) -> Result<usize, u32> {
        OpenHandle::device_control(self, code, input, output)
    }
}
