use std::sync::Arc;

use pciscan_driver::{
    DriverRegistration, ScanConfig, ScannerDevice, SyntheticConfigSpace, SyntheticFunction,
};
use pciscan_protocol::loopback::ObjectNamespace;
use pciscan_protocol::{
    DeviceList, PciBdf, DEVICE_LIST_SIZE, ERROR_FILE_NOT_FOUND, ERROR_INSUFFICIENT_BUFFER,
    ERROR_INVALID_FUNCTION, IOCTL_PCI_GET_DEVICES, USER_DEVICE_PATH,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn load(
    space: SyntheticConfigSpace,
) -> (
    ObjectNamespace,
    Arc<ScannerDevice<SyntheticConfigSpace>>,
    DriverRegistration,
) {
    init_tracing();
    let ns = ObjectNamespace::new();
    let device = Arc::new(ScannerDevice::new(space, ScanConfig::default()));
    let reg = DriverRegistration::load(&ns, device.clone()).unwrap();
    (ns, device, reg)
}

#[test]
fn intel_ethernet_function_is_described_by_vendor_and_class() {
    let space = SyntheticConfigSpace::new().with_function(
        PciBdf::new(0, 0, 0),
        SyntheticFunction::new(0x8086, 0x1234, 0x02, 0x00),
    );
    let (ns, _device, _reg) = load(space);

    let handle = ns.open(USER_DEVICE_PATH).unwrap();
    let mut out = vec![0u8; DEVICE_LIST_SIZE];
    let written = handle
        .device_control(IOCTL_PCI_GET_DEVICES, &[], &mut out)
        .unwrap();
    assert_eq!(written, DEVICE_LIST_SIZE);

    let list = DeviceList::decode(&out).unwrap();
    assert_eq!(list.len(), 1);
    let rec = list.records()[0];
    assert_eq!(rec.bdf(), PciBdf::new(0, 0, 0));
    assert_eq!((rec.vendor_id, rec.device_id), (0x8086, 0x1234));
    let description = rec.description();
    assert!(description.contains("Intel"), "{description}");
    assert!(description.contains("Ethernet Controller"), "{description}");
}

#[test]
fn empty_bus_yields_empty_list() {
    let (ns, device, _reg) = load(SyntheticConfigSpace::empty());

    let handle = ns.open(USER_DEVICE_PATH).unwrap();
    let mut out = vec![0xFFu8; DEVICE_LIST_SIZE];
    handle
        .device_control(IOCTL_PCI_GET_DEVICES, &[], &mut out)
        .unwrap();

    assert_eq!(&out[..4], &0u32.to_le_bytes());
    assert!(DeviceList::decode(&out).unwrap().is_empty());
    assert_eq!(device.scans_performed(), 1);
}

#[test]
fn short_output_buffer_reports_insufficient_buffer_and_skips_scan() {
    let (ns, device, _reg) = load(SyntheticConfigSpace::hyperv_gen1());
    let handle = ns.open(USER_DEVICE_PATH).unwrap();

    for len in [0, 4, DEVICE_LIST_SIZE - 1] {
        let mut out = vec![0u8; len];
        assert_eq!(
            handle.device_control(IOCTL_PCI_GET_DEVICES, &[], &mut out),
            Err(ERROR_INSUFFICIENT_BUFFER)
        );
    }
    assert_eq!(device.scans_performed(), 0);
}

#[test]
fn unrecognized_code_reports_invalid_function() {
    let (ns, device, _reg) = load(SyntheticConfigSpace::hyperv_gen1());
    let handle = ns.open(USER_DEVICE_PATH).unwrap();

    let mut out = vec![0u8; DEVICE_LIST_SIZE];
    assert_eq!(
        handle.device_control(0x0022_2004, &[], &mut out),
        Err(ERROR_INVALID_FUNCTION)
    );
    assert_eq!(device.scans_performed(), 0);
}

#[test]
fn endpoint_disappears_after_unload() {
    let (ns, _device, reg) = load(SyntheticConfigSpace::hyperv_gen1());
    assert!(ns.open(USER_DEVICE_PATH).is_ok());
    drop(reg);
    assert_eq!(ns.open(USER_DEVICE_PATH).unwrap_err(), ERROR_FILE_NOT_FOUND);
}

#[test]
fn concurrent_requests_each_see_a_consistent_topology() {
    let (ns, device, _reg) = load(SyntheticConfigSpace::hyperv_gen1());

    std::thread::scope(|s| {
        for _ in 0..4 {
            let ns = ns.clone();
            s.spawn(move || {
                let handle = ns.open(USER_DEVICE_PATH).unwrap();
                for _ in 0..8 {
                    let mut out = vec![0u8; DEVICE_LIST_SIZE];
                    handle
                        .device_control(IOCTL_PCI_GET_DEVICES, &[], &mut out)
                        .unwrap();
                    let list = DeviceList::decode(&out).unwrap();
                    assert_eq!(list.len(), 6);
                    assert_eq!(list.records()[5].bdf(), PciBdf::new(0, 10, 0));
                }
            });
        }
    });

    assert_eq!(device.scans_performed(), 32);
    assert_eq!(ns.open_handle_count(), 0);
}
