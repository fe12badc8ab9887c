use std::collections::BTreeMap;

use pciscan_protocol::{DeviceRecord, PciBdf};
use serde::Serialize;

/// One PCI function, detached from the fixed-size wire record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PciDeviceInfo {
    pub bus: u8,
    pub device: u8,
    pub function: u8,
    pub vendor_id: u16,
    pub device_id: u16,
    pub base_class: u8,
    pub sub_class: u8,
    pub revision: u8,
    pub description: String,
}

impl PciDeviceInfo {
    pub fn bdf(&self) -> PciBdf {
        PciBdf::new(self.bus, self.device, self.function)
    }

    /// `BB:DD.F`
    pub fn location(&self) -> String {
        self.bdf().to_string()
    }

    /// `VVVV:DDDD`
    pub fn vendor_device_id(&self) -> String {
        format!("{:04X}:{:04X}", self.vendor_id, self.device_id)
    }

    /// `CC:SS`
    pub fn class_codes(&self) -> String {
        format!("{:02X}:{:02X}", self.base_class, self.sub_class)
    }
}

impl From<&DeviceRecord> for PciDeviceInfo {
    fn from(record: &DeviceRecord) -> Self {
        Self {
            bus: record.bus,
            device: record.device,
            function: record.function,
            vendor_id: record.vendor_id,
            device_id: record.device_id,
            base_class: record.base_class,
            sub_class: record.sub_class,
            revision: record.revision,
            description: record.description().into_owned(),
        }
    }
}

/// Totals over one scan result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStatistics {
    pub total: usize,
    pub by_class: BTreeMap<u8, usize>,
    pub by_vendor: BTreeMap<u16, usize>,
}

impl ScanStatistics {
    pub fn from_devices<'a>(devices: impl IntoIterator<Item = &'a PciDeviceInfo>) -> Self {
        let mut stats = Self::default();
        for device in devices {
            stats.total += 1;
            *stats.by_class.entry(device.base_class).or_default() += 1;
            *stats.by_vendor.entry(device.vendor_id).or_default() += 1;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(vendor_id: u16, base_class: u8) -> PciDeviceInfo {
        PciDeviceInfo {
            bus: 0,
            device: 0x1F,
            function: 3,
            vendor_id,
            device_id: 0x0A1B,
            base_class,
            sub_class: 0x80,
            revision: 2,
            description: "test".into(),
        }
    }

    #[test]
    fn display_helpers_use_fixed_width_hex() {
        let dev = info(0x8086, 0x06);
        assert_eq!(dev.location(), "00:1F.3");
        assert_eq!(dev.vendor_device_id(), "8086:0A1B");
        assert_eq!(dev.class_codes(), "06:80");
    }

    #[test]
    fn from_record_copies_every_field() {
        let record = DeviceRecord::new(PciBdf::new(1, 2, 3), 0x10EC, 0x8168, 0x02, 0x00, 0x15)
            .with_description("Realtek Ethernet Controller");
        let dev = PciDeviceInfo::from(&record);
        assert_eq!(dev.bdf(), PciBdf::new(1, 2, 3));
        assert_eq!(dev.vendor_id, 0x10EC);
        assert_eq!(dev.device_id, 0x8168);
        assert_eq!(dev.base_class, 0x02);
        assert_eq!(dev.sub_class, 0x00);
        assert_eq!(dev.revision, 0x15);
        assert_eq!(dev.description, "Realtek Ethernet Controller");
    }

    #[test]
    fn statistics_count_by_class_and_vendor() {
        let devices = vec![info(0x8086, 0x06), info(0x8086, 0x01), info(0x1414, 0x06)];
        let stats = ScanStatistics::from_devices(&devices);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_class.get(&0x06), Some(&2));
        assert_eq!(stats.by_class.get(&0x01), Some(&1));
        assert_eq!(stats.by_vendor.get(&0x8086), Some(&2));
        assert_eq!(stats.by_vendor.get(&0x1414), Some(&1));

        assert_eq!(ScanStatistics::from_devices(std::iter::empty()), ScanStatistics::default());
    }

    #[test]
    fn serializes_with_field_names() {
        let json = serde_json::to_value(info(0x8086, 0x06)).unwrap();
        assert_eq!(json["vendor_id"], 0x8086);
        assert_eq!(json["description"], "test");
    }
}
