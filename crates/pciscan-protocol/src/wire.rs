//! Fixed binary layout of a scan result.
//!
//! Both structs are `#[repr(C)]` plain-old-data in native byte order (little-endian on every
//! supported target) and match the C declarations bit for bit:
//!
//! ```text
//! DeviceRecord (76 bytes, align 2)     DeviceList (2436 bytes, align 4)
//!   0  u8      bus                       0  u32              count
//!   1  u8      device                    4  DeviceRecord[32] records
//!   2  u8      function
//!   3  u8      (padding)
//!   4  u16     vendor_id
//!   6  u16     device_id
//!   8  u8      base_class
//!   9  u8      sub_class
//!  10  u8      revision
//!  11  u8[64]  description (NUL padded)
//!  75  u8      (padding)
//! ```
//!
//! The padding bytes are spelled out as reserved fields so the structs can be `Pod`; they are
//! always written as zero.

use core::fmt;
use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use crate::PciBdf;

/// Maximum number of records one scan can return.
pub const DEVICE_LIST_CAPACITY: usize = 32;
/// Size of the description field, including the NUL terminator.
pub const DESCRIPTION_CAPACITY: usize = 64;
/// Size in bytes of one [`DeviceRecord`].
pub const DEVICE_RECORD_SIZE: usize = 76;
/// Size in bytes of one [`DeviceList`]; the exact output size of a successful request.
pub const DEVICE_LIST_SIZE: usize = 4 + DEVICE_LIST_CAPACITY * DEVICE_RECORD_SIZE;

/// Vendor id read back from a slot with no function present.
pub const INVALID_VENDOR_ID: u16 = 0xFFFF;

const _: () = assert!(core::mem::size_of::<DeviceRecord>() == DEVICE_RECORD_SIZE);
const _: () = assert!(core::mem::size_of::<DeviceList>() == DEVICE_LIST_SIZE);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("buffer too short: {len} < {min}")]
    BufferTooShort { len: usize, min: usize },
    #[error("device count out of range: {count} > {max}")]
    CountOutOfRange { count: u32, max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("device list is full ({DEVICE_LIST_CAPACITY} records)")]
pub struct DeviceListFull;

/// One PCI function discovered during a scan.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct DeviceRecord {
    pub bus: u8,
    pub device: u8,
    pub function: u8,
    _reserved0: u8,
    pub vendor_id: u16,
    pub device_id: u16,
    pub base_class: u8,
    pub sub_class: u8,
    pub revision: u8,
    description: [u8; DESCRIPTION_CAPACITY],
    _reserved1: u8,
}

impl DeviceRecord {
    pub const SIZE_BYTES: usize = DEVICE_RECORD_SIZE;

    /// Builds a record with an empty description.
    pub fn new(
        bdf: PciBdf,
        vendor_id: u16,
        device_id: u16,
        base_class: u8,
        sub_class: u8,
        revision: u8,
    ) -> Self {
        Self {
            bus: bdf.bus,
            device: bdf.device,
            function: bdf.function,
            vendor_id,
            device_id,
            base_class,
            sub_class,
            revision,
            ..Self::zeroed()
        }
    }

    /// Returns the record with its description replaced by `text`, truncated to fit.
    pub fn with_description(mut self, text: &str) -> Self {
        self.description = [0; DESCRIPTION_CAPACITY];
        let mut writer = DescriptionWriter::new(&mut self.description);
        // Truncation is silent and `write_str` on a `&str` cannot otherwise fail.
        let _ = fmt::Write::write_str(&mut writer, text);
        self
    }

    /// Returns the record with a formatted description, truncated to fit.
    ///
    /// Fails only if one of the formatted values reports an error; truncation is not a failure.
    pub fn with_formatted_description(mut self, args: fmt::Arguments<'_>) -> Result<Self, fmt::Error> {
        self.description = [0; DESCRIPTION_CAPACITY];
        let mut writer = DescriptionWriter::new(&mut self.description);
        fmt::Write::write_fmt(&mut writer, args)?;
        Ok(self)
    }

    pub fn bdf(&self) -> PciBdf {
        PciBdf::new(self.bus, self.device, self.function)
    }

    /// Description bytes up to (not including) the first NUL.
    pub fn description_bytes(&self) -> &[u8] {
        let len = self
            .description
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(DESCRIPTION_CAPACITY);
        &self.description[..len]
    }

    /// Description text. Invalid UTF-8 from a foreign producer is replaced, not rejected.
    pub fn description(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.description_bytes())
    }
}

impl fmt::Debug for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRecord")
            .field("bdf", &self.bdf())
            .field("vendor_id", &format_args!("{:#06x}", self.vendor_id))
            .field("device_id", &format_args!("{:#06x}", self.device_id))
            .field("base_class", &format_args!("{:#04x}", self.base_class))
            .field("sub_class", &format_args!("{:#04x}", self.sub_class))
            .field("revision", &format_args!("{:#04x}", self.revision))
            .field("description", &self.description())
            .finish()
    }
}

/// `fmt::Write` sink over the fixed description field.
///
/// Keeps one byte for the NUL terminator and cuts on a UTF-8 character boundary.
struct DescriptionWriter<'a> {
    buf: &'a mut [u8; DESCRIPTION_CAPACITY],
    len: usize,
}

impl<'a> DescriptionWriter<'a> {
    fn new(buf: &'a mut [u8; DESCRIPTION_CAPACITY]) -> Self {
        Self { buf, len: 0 }
    }
}

impl fmt::Write for DescriptionWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = DESCRIPTION_CAPACITY - 1 - self.len;
        let mut end = s.len().min(room);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        self.buf[self.len..self.len + end].copy_from_slice(&s.as_bytes()[..end]);
        self.len += end;
        Ok(())
    }
}

/// The bounded result of one scan: a count plus a fixed-capacity record array.
///
/// Only `records[0..count)` are meaningful; the rest is padding that consumers never read.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct DeviceList {
    count: u32,
    records: [DeviceRecord; DEVICE_LIST_CAPACITY],
}

impl DeviceList {
    pub const SIZE_BYTES: usize = DEVICE_LIST_SIZE;

    pub fn new() -> Self {
        Self::zeroed()
    }

    /// Builds a list from the first [`DEVICE_LIST_CAPACITY`] records of `records`.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a DeviceRecord>) -> Self {
        let mut list = Self::new();
        for record in records {
            if list.push(*record).is_err() {
                break;
            }
        }
        list
    }

    pub fn len(&self) -> usize {
        // `count` is only ever out of range in a list cast from unvalidated bytes.
        (self.count as usize).min(DEVICE_LIST_CAPACITY)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == DEVICE_LIST_CAPACITY
    }

    pub fn push(&mut self, record: DeviceRecord) -> Result<(), DeviceListFull> {
        let len = self.len();
        if len == DEVICE_LIST_CAPACITY {
            return Err(DeviceListFull);
        }
        self.records[len] = record;
        self.count = len as u32 + 1;
        Ok(())
    }

    /// The populated records, `records[0..count)`.
    pub fn records(&self) -> &[DeviceRecord] {
        &self.records[..self.len()]
    }

    pub fn iter(&self) -> core::slice::Iter<'_, DeviceRecord> {
        self.records().iter()
    }

    /// The full serialized form, including unused record slots.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Writes the full serialized form to the front of `out`, returning the bytes written.
    pub fn encode_into(&self, out: &mut [u8]) -> Result<usize, WireError> {
        let Some(dst) = out.get_mut(..DEVICE_LIST_SIZE) else {
            return Err(WireError::BufferTooShort {
                len: out.len(),
                min: DEVICE_LIST_SIZE,
            });
        };
        dst.copy_from_slice(self.as_bytes());
        Ok(DEVICE_LIST_SIZE)
    }

    /// Parses a serialized list. `bytes` need not be aligned; trailing bytes are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let Some(src) = bytes.get(..DEVICE_LIST_SIZE) else {
            return Err(WireError::BufferTooShort {
                len: bytes.len(),
                min: DEVICE_LIST_SIZE,
            });
        };
        let list: Self = bytemuck::pod_read_unaligned(src);
        if list.count as usize > DEVICE_LIST_CAPACITY {
            return Err(WireError::CountOutOfRange {
                count: list.count,
                max: DEVICE_LIST_CAPACITY,
            });
        }
        Ok(list)
    }
}

impl Default for DeviceList {
    fn default() -> Self {
        Self::new()
    }
}

/// Lists compare by their populated records only.
impl PartialEq for DeviceList {
    fn eq(&self, other: &Self) -> bool {
        self.records() == other.records()
    }
}

impl Eq for DeviceList {}

impl fmt::Debug for DeviceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceList")
            .field("count", &self.count)
            .field("records", &self.records())
            .finish()
    }
}

impl<'a> IntoIterator for &'a DeviceList {
    type Item = &'a DeviceRecord;
    type IntoIter = core::slice::Iter<'a, DeviceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
