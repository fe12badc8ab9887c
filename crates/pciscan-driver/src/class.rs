//! Human-readable names for class codes and vendor IDs.
//!
//! Both lookups are total: anything not in the tables maps to a generic fallback string.

/// Name used for base classes the tables do not cover.
pub const UNKNOWN_DEVICE: &str = "Unknown Device";
/// Name used for vendor IDs the tables do not cover.
pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";

struct BaseClass {
    code: u8,
    /// Name for subclasses not listed in `subclasses`.
    fallback: &'static str,
    subclasses: &'static [(u8, &'static str)],
}

const BASE_CLASSES: &[BaseClass] = &[
    // Devices built before class codes were defined; the subclass carries no meaning.
    BaseClass {
        code: 0x00,
        fallback: "Pre-2.0 Device",
        subclasses: &[],
    },
    BaseClass {
        code: 0x01,
        fallback: "Mass Storage Controller",
        subclasses: &[
            (0x00, "SCSI Controller"),
            (0x01, "IDE Controller"),
            (0x02, "Floppy Controller"),
            (0x03, "IPI Controller"),
            (0x04, "RAID Controller"),
            (0x05, "ATA Controller"),
            (0x06, "SATA Controller"),
            (0x80, "Other Mass Storage"),
        ],
    },
    BaseClass {
        code: 0x02,
        fallback: "Network Controller",
        subclasses: &[
            (0x00, "Ethernet Controller"),
            (0x01, "Token Ring Controller"),
            (0x02, "FDDI Controller"),
            (0x03, "ATM Controller"),
            (0x04, "ISDN Controller"),
            (0x80, "Other Network Controller"),
        ],
    },
    BaseClass {
        code: 0x03,
        fallback: "Display Controller",
        subclasses: &[
            (0x00, "VGA Compatible Controller"),
            (0x01, "XGA Controller"),
            (0x02, "3D Controller"),
            (0x80, "Other Display Controller"),
        ],
    },
    BaseClass {
        code: 0x06,
        fallback: "Bridge Device",
        subclasses: &[
            (0x00, "Host Bridge"),
            (0x01, "ISA Bridge"),
            (0x02, "EISA Bridge"),
            (0x03, "MCA Bridge"),
            (0x04, "PCI-to-PCI Bridge"),
            (0x05, "PCMCIA Bridge"),
            (0x06, "NuBus Bridge"),
            (0x07, "CardBus Bridge"),
            (0x08, "RACEway Bridge"),
            (0x80, "Other Bridge"),
        ],
    },
    BaseClass {
        code: 0x0C,
        fallback: "Communications Controller",
        subclasses: &[
            (0x00, "Serial Controller"),
            (0x01, "Parallel Controller"),
            (0x02, "Multiport Serial Controller"),
            (0x03, "Modem"),
            (0x80, "Other Communications"),
        ],
    },
];

const VENDORS: &[(u16, &str)] = &[
    (0x8086, "Intel"),
    (0x10DE, "NVIDIA"),
    (0x1002, "AMD"),
    (0x1414, "Microsoft"),
    (0x5333, "S3"),
    (0x1011, "Digital Equipment"),
    (0x10EC, "Realtek"),
    (0x1969, "Atheros"),
];

/// Specific parts worth calling out in diagnostics. Never affects the produced records.
const KNOWN_DEVICES: &[(u16, u16, &str)] = &[
    (0x8086, 0x7192, "Intel 440BX Host Bridge"),
    (0x8086, 0x7110, "Intel PIIX4 ISA Bridge"),
    (0x8086, 0x7111, "Intel PIIX4 IDE Controller"),
    (0x8086, 0x7113, "Intel PIIX4 ACPI Controller"),
    (0x1414, 0x5353, "Microsoft S3 Trio64 Emulation"),
];

/// Category name for a (base class, subclass) pair.
pub fn classify(base_class: u8, sub_class: u8) -> &'static str {
    let Some(base) = BASE_CLASSES.iter().find(|b| b.code == base_class) else {
        return UNKNOWN_DEVICE;
    };
    base.subclasses
        .iter()
        .find_map(|&(code, name)| (code == sub_class).then_some(name))
        .unwrap_or(base.fallback)
}

pub fn vendor_name(vendor_id: u16) -> &'static str {
    VENDORS
        .iter()
        .find_map(|&(id, name)| (id == vendor_id).then_some(name))
        .unwrap_or(UNKNOWN_VENDOR)
}

pub fn known_device(vendor_id: u16, device_id: u16) -> Option<&'static str> {
    KNOWN_DEVICES
        .iter()
        .find_map(|&(v, d, name)| (v == vendor_id && d == device_id).then_some(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_subclasses_use_their_own_names() {
        assert_eq!(classify(0x01, 0x06), "SATA Controller");
        assert_eq!(classify(0x02, 0x00), "Ethernet Controller");
        assert_eq!(classify(0x03, 0x02), "3D Controller");
        assert_eq!(classify(0x06, 0x04), "PCI-to-PCI Bridge");
        assert_eq!(classify(0x0C, 0x03), "Modem");
        assert_eq!(classify(0x06, 0x80), "Other Bridge");
    }

    #[test]
    fn unlisted_subclasses_fall_back_to_base_class_name() {
        assert_eq!(classify(0x01, 0x07), "Mass Storage Controller");
        assert_eq!(classify(0x02, 0x05), "Network Controller");
        assert_eq!(classify(0x03, 0x03), "Display Controller");
        assert_eq!(classify(0x06, 0x09), "Bridge Device");
        assert_eq!(classify(0x0C, 0x04), "Communications Controller");
    }

    #[test]
    fn pre_2_0_devices_ignore_subclass() {
        for sub in [0x00, 0x01, 0x80, 0xFF] {
            assert_eq!(classify(0x00, sub), "Pre-2.0 Device");
        }
    }

    #[test]
    fn unknown_base_class_is_unknown_device() {
        assert_eq!(classify(0x04, 0x00), UNKNOWN_DEVICE);
        assert_eq!(classify(0x0D, 0x00), UNKNOWN_DEVICE);
        assert_eq!(classify(0xFF, 0xFF), UNKNOWN_DEVICE);
    }

    #[test]
    fn vendor_names() {
        assert_eq!(vendor_name(0x8086), "Intel");
        assert_eq!(vendor_name(0x1414), "Microsoft");
        assert_eq!(vendor_name(0x1969), "Atheros");
        assert_eq!(vendor_name(0x1234), UNKNOWN_VENDOR);
        assert_eq!(vendor_name(0xFFFF), UNKNOWN_VENDOR);
    }

    #[test]
    fn known_devices_match_on_both_ids() {
        assert_eq!(known_device(0x8086, 0x7111), Some("Intel PIIX4 IDE Controller"));
        assert_eq!(known_device(0x1414, 0x5353), Some("Microsoft S3 Trio64 Emulation"));
        assert_eq!(known_device(0x8086, 0x5353), None);
        assert_eq!(known_device(0x10DE, 0x7192), None);
    }
}
