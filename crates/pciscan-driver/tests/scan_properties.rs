#![cfg(not(target_arch = "wasm32"))]

use std::collections::BTreeMap;

use pciscan_driver::{
    classify, scan, vendor_name, ConfigMechanism1, ScanConfig, SyntheticConfigSpace,
    SyntheticFunction,
};
use pciscan_protocol::{PciBdf, DEVICE_LIST_CAPACITY, INVALID_VENDOR_ID};
use proptest::prelude::*;

type Slot = (u8, u8, u8);

fn slot() -> impl Strategy<Value = Slot> {
    (0u8..2, 0u8..32, 0u8..8)
}

fn present_function() -> impl Strategy<Value = SyntheticFunction> {
    (0u16..INVALID_VENDOR_ID, any::<u16>(), any::<u8>(), any::<u8>(), any::<u8>()).prop_map(
        |(vendor, device, base, sub, rev)| {
            SyntheticFunction::new(vendor, device, base, sub).revision(rev)
        },
    )
}

fn build(functions: &BTreeMap<Slot, SyntheticFunction>) -> SyntheticConfigSpace {
    let mut space = SyntheticConfigSpace::new();
    for (&(bus, device, function), f) in functions {
        space.insert(PciBdf::new(bus, device, function), *f);
    }
    space
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn records_are_the_first_populated_functions_in_bdf_order(
        functions in proptest::collection::btree_map(slot(), present_function(), 0..=64),
    ) {
        let access = ConfigMechanism1::new(build(&functions));
        let outcome = scan(&access, &ScanConfig::default());
        let list = outcome.list;

        let expected_len = functions.len().min(DEVICE_LIST_CAPACITY);
        prop_assert_eq!(list.len(), expected_len);
        if functions.len() > DEVICE_LIST_CAPACITY {
            prop_assert!(outcome.stopped_early);
        }
        if functions.len() < DEVICE_LIST_CAPACITY {
            prop_assert!(!outcome.stopped_early);
        }

        for (record, (&(bus, device, function), f)) in list.records().iter().zip(&functions) {
            prop_assert_eq!(record.bdf(), PciBdf::new(bus, device, function));
            prop_assert_eq!(record.vendor_id, f.vendor_id);
            prop_assert_eq!(record.device_id, f.device_id);
            prop_assert_eq!(record.base_class, f.base_class);
            prop_assert_eq!(record.sub_class, f.sub_class);
            prop_assert_eq!(record.revision, f.revision);
            let description = format!(
                "{} {}",
                vendor_name(f.vendor_id),
                classify(f.base_class, f.sub_class)
            );
            prop_assert_eq!(record.description(), description.as_str());
        }
    }

    #[test]
    fn all_ones_vendor_never_produces_a_record(
        functions in proptest::collection::btree_map(slot(), present_function(), 0..=24),
        hidden in proptest::collection::btree_map(slot(), any::<u16>(), 1..=24),
    ) {
        let mut space = build(&functions);
        for (&(bus, device, function), &device_id) in &hidden {
            if functions.contains_key(&(bus, device, function)) {
                continue;
            }
            space.insert(
                PciBdf::new(bus, device, function),
                SyntheticFunction::new(INVALID_VENDOR_ID, device_id, 0x02, 0x00),
            );
        }

        let outcome = scan(&ConfigMechanism1::new(space), &ScanConfig::default());
        prop_assert_eq!(outcome.list.len(), functions.len());
        for record in &outcome.list {
            prop_assert_ne!(record.vendor_id, INVALID_VENDOR_ID);
            let key = (record.bus, record.device, record.function);
            prop_assert!(functions.contains_key(&key));
        }
    }

    #[test]
    fn classification_is_pure(base in any::<u8>(), sub in any::<u8>(), vendor in any::<u16>()) {
        prop_assert_eq!(classify(base, sub), classify(base, sub));
        prop_assert_eq!(vendor_name(vendor), vendor_name(vendor));
    }
}

#[test]
fn classification_is_total() {
    for base in 0..=u8::MAX {
        for sub in 0..=u8::MAX {
            assert!(!classify(base, sub).is_empty(), "{base:#04x}/{sub:#04x}");
        }
    }
    for vendor in 0..=u16::MAX {
        assert!(!vendor_name(vendor).is_empty(), "{vendor:#06x}");
    }
}

#[test]
fn more_than_capacity_keeps_exactly_the_first_32() {
    let mut space = SyntheticConfigSpace::new();
    // Function 0 of every slot on bus 0, seven more functions of device 31, one function on bus 1.
    for device in 0..32u8 {
        space.insert(
            PciBdf::new(0, device, 0),
            SyntheticFunction::new(0x8086, u16::from(device), 0x02, 0x00),
        );
    }
    for function in 1..8u8 {
        space.insert(
            PciBdf::new(0, 31, function),
            SyntheticFunction::new(0x8086, 0x100 + u16::from(function), 0x02, 0x00),
        );
    }
    space.insert(
        PciBdf::new(1, 0, 0),
        SyntheticFunction::new(0x10DE, 0x0001, 0x03, 0x00),
    );

    let access = ConfigMechanism1::new(space);
    let outcome = scan(&access, &ScanConfig::default());

    assert!(outcome.stopped_early);
    assert_eq!(outcome.list.len(), 32);
    let ids: Vec<u16> = outcome.list.iter().map(|r| r.device_id).collect();
    assert_eq!(ids, (0..32u16).collect::<Vec<_>>());
    assert!(outcome.list.iter().all(|r| r.vendor_id == 0x8086));
}
