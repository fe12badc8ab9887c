//! Device I/O through the Win32 file API.

use crate::backend::{DeviceIoBackend, DeviceIoHandle};

/// Opens device paths with `CreateFileW` and issues requests with `DeviceIoControl`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Backend;

/// Recovers the Win32 error code from an `HRESULT_FROM_WIN32` value. Other HRESULTs are
/// returned unchanged.
#[cfg_attr(not(windows), allow(dead_code))]
fn win32_code(hresult: i32) -> u32 {
    let hr = hresult as u32;
    if hr & 0xFFFF_0000 == 0x8007_0000 {
        hr & 0xFFFF
    } else {
        hr
    }
}

#[cfg(windows)]
pub use windows_impl::Win32Handle;

#[cfg(windows)]
mod windows_impl {
    use std::ffi::c_void;

    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{CloseHandle, GENERIC_READ, GENERIC_WRITE, HANDLE};
    use windows::Win32::Storage::FileSystem::{
        CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_MODE, OPEN_EXISTING,
    };
    use windows::Win32::System::IO::DeviceIoControl;

    use super::{win32_code, DeviceIoBackend, DeviceIoHandle, Win32Backend};

    /// An open device handle, closed on drop.
    #[derive(Debug)]
    pub struct Win32Handle(HANDLE);

    impl Drop for Win32Handle {
        fn drop(&mut self) {
            unsafe {
                let _ = CloseHandle(self.0);
            }
        }
    }

    impl DeviceIoBackend for Win32Backend {
        type Handle = Win32Handle;

        fn open(&self, path: &str) -> Result<Win32Handle, u32> {
            let wide = to_wide(path);
            let handle = unsafe {
                CreateFileW(
                    PCWSTR(wide.as_ptr()),
                    GENERIC_READ.0 | GENERIC_WRITE.0,
                    FILE_SHARE_MODE(0),
                    None,
                    OPEN_EXISTING,
                    FILE_ATTRIBUTE_NORMAL,
                    None,
                )
            }
            .map_err(|e| win32_code(e.code().0))?;
            Ok(Win32Handle(handle))
        }
    }

    impl DeviceIoHandle for Win32Handle {
        fn device_control(&mut self, code: u32, input: &[u8], output: &mut [u8]) -> Result<usize, u32> {
            let in_len = u32::try_from(input.len()).map_err(|_| ERROR_INVALID_PARAMETER)?;
            let out_len = u32::try_from(output.len()).map_err(|_| ERROR_INVALID_PARAMETER)?;
            let in_ptr = (!input.is_empty()).then(|| input.as_ptr().cast::<c_void>());
            let mut returned = 0u32;
            unsafe {
                DeviceIoControl(
                    self.0,
                    code,
                    in_ptr,
                    in_len,
                    Some(output.as_mut_ptr().cast::<c_void>()),
                    out_len,
                    Some(&mut returned as *mut u32),
                    None,
                )
            }
            .map_err(|e| win32_code(e.code().0))?;
            Ok(returned as usize)
        }
    }

    const ERROR_INVALID_PARAMETER: u32 = 87;

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }
}

#[cfg(not(windows))]
impl DeviceIoBackend for Win32Backend {
    type Handle = Unsupported;

    fn open(&self, _path: &str) -> Result<Unsupported, u32> {
        Err(ERROR_NOT_SUPPORTED)
    }
}

/// `ERROR_NOT_SUPPORTED`, reported by [`Win32Backend`] off Windows.
#[cfg(not(windows))]
pub const ERROR_NOT_SUPPORTED: u32 = 50;

/// Never constructed: [`Win32Backend`] cannot open anything off Windows.
#[cfg(not(windows))]
#[derive(Debug)]
pub enum Unsupported {}

#[cfg(not(windows))]
impl DeviceIoHandle for Unsupported {
    fn device_control(&mut self, _code: u32, _input: &[u8], _output: &mut [u8]) -> Result<usize, u32> {
        match *self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hresult_from_win32_yields_the_win32_code() {
        assert_eq!(win32_code(0x8007_0002_u32 as i32), 2);
        assert_eq!(win32_code(0x8007_0005_u32 as i32), 5);
        assert_eq!(win32_code(0x8007_007A_u32 as i32), 122);
    }

    #[test]
    fn other_hresults_pass_through() {
        assert_eq!(win32_code(0x8000_4005_u32 as i32), 0x8000_4005);
        assert_eq!(win32_code(0xC000_0010_u32 as i32), 0xC000_0010);
        assert_eq!(win32_code(0), 0);
    }

    #[cfg(not(windows))]
    #[test]
    fn open_is_unsupported_off_windows() {
        assert_eq!(Win32Backend.open(r"\\.\PCIScanner").unwrap_err(), ERROR_NOT_SUPPORTED);
    }
}
