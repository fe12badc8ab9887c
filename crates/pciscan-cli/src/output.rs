use std::io::{self, Write};

use pciscan_client::{PciDeviceInfo, ScanStatistics};
use pciscan_driver::classify;
use serde::Serialize;

const COLUMN_WIDTHS: [usize; 5] = [8, 14, 8, 10, 40];
const SEPARATOR_WIDTH: usize = 80;

pub fn write_header(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "PCI Device Scanner")?;
    writeln!(out, "------------------")?;
    writeln!(out)
}

fn write_row(out: &mut impl Write, columns: [&str; 5]) -> io::Result<()> {
    let mut line = String::new();
    for (column, width) in columns.iter().zip(COLUMN_WIDTHS) {
        line.push_str(&format!("{column:<width$}"));
    }
    writeln!(out, "{}", line.trim_end())
}

pub fn write_table(out: &mut impl Write, devices: &[PciDeviceInfo]) -> io::Result<()> {
    if devices.is_empty() {
        return writeln!(out, "No PCI devices found.");
    }

    write_row(out, ["Addr", "Vendor:Device", "Class", "Rev", "Description"])?;
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
    for device in devices {
        write_row(
            out,
            [
                device.location().as_str(),
                device.vendor_device_id().as_str(),
                device.class_codes().as_str(),
                format!("{:02X}", device.revision).as_str(),
                device.description.as_str(),
            ],
        )?;
    }
    Ok(())
}

pub fn write_statistics(out: &mut impl Write, stats: &ScanStatistics) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Scan Statistics:")?;
    writeln!(out, "----------------")?;
    writeln!(out, "Total devices: {}", stats.total)?;

    writeln!(out)?;
    writeln!(out, "Devices by class:")?;
    for (&class, count) in &stats.by_class {
        // Subclass 0xFF is unassigned in every class, so this yields the class-level name.
        let name = classify(class, 0xFF);
        writeln!(out, "  Class {class:02X} ({name}): {count} devices")?;
    }

    writeln!(out)?;
    writeln!(out, "Devices by vendor:")?;
    for (&vendor, count) in &stats.by_vendor {
        writeln!(out, "  Vendor {vendor:04X}: {count} devices")?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub devices: &'a [PciDeviceInfo],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<&'a ScanStatistics>,
}

pub fn write_json(out: &mut impl Write, report: &JsonReport<'_>) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}
