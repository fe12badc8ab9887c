//! The bus walk.

use pciscan_protocol::{
    DeviceList, DeviceRecord, PciBdf, PCI_DEVICES_PER_BUS, PCI_FUNCTIONS_PER_DEVICE,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::class::{classify, known_device, vendor_name};
use crate::config::ConfigMechanism1;
use crate::ports::PortIo;

/// Buses visited when nothing else is configured.
///
/// Legacy platforms (and the virtual machines this targets) put every function on bus 0 or 1.
pub const DEFAULT_BUS_COUNT: u16 = 2;
/// Bus numbers are 8 bits wide.
pub const MAX_BUS_COUNT: u16 = 256;
/// Environment variable overriding [`DEFAULT_BUS_COUNT`].
pub const BUS_COUNT_ENV: &str = "PCISCAN_BUS_COUNT";

/// Description used when the formatted one cannot be produced.
pub const FALLBACK_DESCRIPTION: &str = "Unknown Device";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("bus count must be between 1 and {MAX_BUS_COUNT}, got {0}")]
    BusCountOutOfRange(u16),
    #[error("invalid value for env var {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    bus_count: u16,
}

impl ScanConfig {
    pub fn with_bus_count(bus_count: u16) -> Result<Self, ConfigError> {
        if bus_count == 0 || bus_count > MAX_BUS_COUNT {
            return Err(ConfigError::BusCountOutOfRange(bus_count));
        }
        Ok(Self { bus_count })
    }

    /// Reads [`BUS_COUNT_ENV`]; unset or blank means the default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let Some(raw) = lookup(BUS_COUNT_ENV) else {
            return Ok(Self::default());
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        match trimmed.parse::<u16>().map(Self::with_bus_count) {
            Ok(Ok(config)) => Ok(config),
            _ => Err(ConfigError::InvalidEnv {
                var: BUS_COUNT_ENV,
                value: raw,
            }),
        }
    }

    pub fn bus_count(&self) -> u16 {
        self.bus_count
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            bus_count: DEFAULT_BUS_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub list: DeviceList,
    /// The list filled up while unvisited slots remained. Not part of the wire format.
    pub stopped_early: bool,
}

/// Walks bus, device and function in ascending order and collects every present function.
///
/// Holds the configuration port lock for the whole walk. Stops as soon as the list is full.
pub fn scan<P: PortIo>(access: &ConfigMechanism1<P>, config: &ScanConfig) -> ScanOutcome {
    let mut session = access.session();
    let mut list = DeviceList::new();
    let mut stopped_early = false;

    'walk: for bus in 0..config.bus_count() {
        for device in 0..PCI_DEVICES_PER_BUS {
            for function in 0..PCI_FUNCTIONS_PER_DEVICE {
                if list.is_full() {
                    stopped_early = true;
                    break 'walk;
                }

                // `bus_count` is at most 256.
                let bdf = PciBdf::new(bus as u8, device, function);
                let ids = session.vendor_device(bdf);
                if !ids.is_present() {
                    continue;
                }
                let class = session.class_code(bdf);

                let vendor = vendor_name(ids.vendor_id);
                let category = classify(class.base_class, class.sub_class);
                let record = DeviceRecord::new(
                    bdf,
                    ids.vendor_id,
                    ids.device_id,
                    class.base_class,
                    class.sub_class,
                    class.revision,
                );
                let record = record
                    .with_formatted_description(format_args!("{vendor} {category}"))
                    .unwrap_or_else(|_| record.with_description(FALLBACK_DESCRIPTION));

                debug!(
                    %bdf,
                    vendor_id = %format_args!("{:04x}", ids.vendor_id),
                    device_id = %format_args!("{:04x}", ids.device_id),
                    class = %format_args!("{:02x}:{:02x}", class.base_class, class.sub_class),
                    description = %record.description(),
                    "found PCI function"
                );
                if let Some(name) = known_device(ids.vendor_id, ids.device_id) {
                    debug!(%bdf, revision = class.revision, name, "recognized device");
                }

                // Cannot fail: fullness is checked at the top of the loop.
                let _ = list.push(record);
            }
        }
    }

    if stopped_early {
        warn!(
            count = list.len(),
            "device list full; remaining slots were not scanned"
        );
    }
    info!(
        count = list.len(),
        buses = config.bus_count(),
        "PCI scan complete"
    );

    ScanOutcome {
        list,
        stopped_early,
    }
}
