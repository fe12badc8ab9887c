use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use pciscan_client::{
    ClientError, DeviceIoBackend, PciDeviceInfo, PciScannerClient, ScanStatistics, Win32Backend,
};
use pciscan_driver::{DriverRegistration, ScanConfig, ScannerDevice, SyntheticConfigSpace};
use pciscan_protocol::loopback::ObjectNamespace;
use pciscan_protocol::USER_DEVICE_PATH;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod output;

#[derive(Parser, Debug)]
#[command(
    name = "pciscan",
    about = "List PCI functions reported by the PCI scanner driver."
)]
struct Args {
    /// Device path of the scanner endpoint
    #[arg(long, value_name = "PATH", default_value = USER_DEVICE_PATH)]
    device_path: String,

    /// Transport used to reach the scanner (defaults to win32 on Windows, loopback elsewhere)
    #[arg(long, value_enum)]
    backend: Option<BackendKind>,

    /// Simulated machine served by the loopback backend
    #[arg(long, value_enum, default_value_t = Platform::HypervGen1)]
    platform: Platform,

    /// Number of buses the loopback scanner visits (defaults to $PCISCAN_BUS_COUNT, then 2)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..=256))]
    bus_count: Option<u16>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Print per-class and per-vendor totals
    #[arg(long, action = clap::ArgAction::SetTrue)]
    stats: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    Win32,
    Loopback,
}

impl BackendKind {
    fn platform_default() -> Self {
        if cfg!(windows) {
            Self::Win32
        } else {
            Self::Loopback
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Platform {
    HypervGen1,
    Empty,
}

impl Platform {
    fn config_space(self) -> SyntheticConfigSpace {
        match self {
            Self::HypervGen1 => SyntheticConfigSpace::hyperv_gen1(),
            Self::Empty => SyntheticConfigSpace::empty(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let backend = args.backend.unwrap_or_else(BackendKind::platform_default);
    debug!(?backend, path = %args.device_path, "selected transport");
    match backend {
        BackendKind::Win32 => scan_and_print(&Win32Backend, args),
        BackendKind::Loopback => {
            let config = match args.bus_count {
                Some(n) => ScanConfig::with_bus_count(n)?,
                None => ScanConfig::from_env().context("invalid scanner configuration")?,
            };
            let namespace = ObjectNamespace::new();
            let device = Arc::new(ScannerDevice::new(args.platform.config_space(), config));
            let _driver = DriverRegistration::load(&namespace, device)
                .context("failed to load the loopback scanner")?;
            scan_and_print(&namespace, args)
        }
    }
}

fn scan_and_print<B: DeviceIoBackend>(backend: &B, args: &Args) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let table = args.format == Format::Table;

    if table {
        output::write_header(&mut out)?;
        write!(out, "Initializing PCI scanner... ")?;
        out.flush()?;
    }
    let mut client = match PciScannerClient::open(backend, &args.device_path) {
        Ok(client) => client,
        Err(err) => {
            if table {
                writeln!(out, "FAILED")?;
                writeln!(out)?;
            }
            return Err(err.into());
        }
    };

    if table {
        writeln!(out, "SUCCESS")?;
        writeln!(out)?;
        write!(out, "Scanning PCI bus... ")?;
        out.flush()?;
    }
    let devices: Vec<PciDeviceInfo> = client.scan().context("PCI scan failed")?;
    // Release the handle before printing.
    drop(client);

    let stats = args.stats.then(|| ScanStatistics::from_devices(&devices));
    match args.format {
        Format::Table => {
            writeln!(out, "COMPLETED")?;
            writeln!(out)?;
            output::write_table(&mut out, &devices)?;
            if let Some(stats) = &stats {
                output::write_statistics(&mut out, stats)?;
            }
            writeln!(out)?;
            writeln!(out, "Operation completed successfully!")?;
        }
        Format::Json => {
            output::write_json(
                &mut out,
                &output::JsonReport {
                    devices: &devices,
                    statistics: stats.as_ref(),
                },
            )?;
        }
    }
    Ok(())
}

fn report_error(err: &anyhow::Error) {
    let client_error = err.chain().find_map(|e| e.downcast_ref::<ClientError>());
    if let Some(client_error) = client_error {
        if let (ClientError::OpenFailed { code, .. }, Some(steps)) =
            (client_error, client_error.remediation())
        {
            eprintln!("Cannot access PCI scanner driver.");
            eprintln!("Error code: {code}");
            eprintln!();
            eprintln!("Some help:");
            for (i, step) in steps.iter().enumerate() {
                eprintln!("{}. {step}", i + 1);
            }
            return;
        }
    }
    eprintln!("Error: {err:#}");
}
