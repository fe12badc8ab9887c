#![cfg(not(target_arch = "wasm32"))]

use pciscan_protocol::{
    DeviceList, DeviceRecord, PciBdf, WireError, DESCRIPTION_CAPACITY, DEVICE_LIST_CAPACITY,
    DEVICE_LIST_SIZE,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..=DEVICE_LIST_SIZE + 64)) {
        match DeviceList::decode(&bytes) {
            Ok(list) => {
                prop_assert!(bytes.len() >= DEVICE_LIST_SIZE);
                prop_assert!(list.len() <= DEVICE_LIST_CAPACITY);
                for record in &list {
                    // Lossy decoding always yields some text.
                    let _ = record.description();
                }
            }
            Err(WireError::BufferTooShort { len, min }) => {
                prop_assert_eq!(len, bytes.len());
                prop_assert_eq!(min, DEVICE_LIST_SIZE);
            }
            Err(WireError::CountOutOfRange { count, max }) => {
                prop_assert!(count as usize > max);
            }
        }
    }

    #[test]
    fn description_is_the_longest_fitting_prefix(text in "\\PC{0,80}") {
        let record = DeviceRecord::new(PciBdf::new(0, 0, 0), 0x8086, 0, 0, 0, 0)
            .with_description(&text);
        let stored = record.description();

        prop_assert!(stored.len() < DESCRIPTION_CAPACITY);
        prop_assert!(text.starts_with(stored.as_ref()));
        if stored.len() < text.len() {
            // Truncated: the next character would not have fit.
            let next = text[stored.len()..].chars().next().unwrap();
            prop_assert!(stored.len() + next.len_utf8() > DESCRIPTION_CAPACITY - 1);
        }
    }
}
