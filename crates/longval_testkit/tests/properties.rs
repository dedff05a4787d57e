//! Property tests for long value reassembly.

use longval_core::{Config, CoreError, LongValue, LongValueId, Ownership};
use longval_testkit::prelude::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn segment_count_matches_chain(id in long_value_id_strategy(), sizes in segment_sizes_strategy(12)) {
        let fixture = LongValueFixture::new(id, &sizes);
        let value = fixture.create(Ownership::Borrow).unwrap();

        prop_assert_eq!(value.segment_count(), sizes.len());

        let mut offset = 0u64;
        for (index, descriptor) in value.segments().iter().enumerate() {
            prop_assert_eq!(u64::from(descriptor.value_offset), offset);
            let data = value.segment_data(index).unwrap();
            prop_assert_eq!(data.len(), sizes[index]);
            offset += data.len() as u64;
        }
        prop_assert_eq!(offset, value.data_size());
        prop_assert_eq!(value.root().data_size as u64, offset);
    }

    #[test]
    fn reassembly_preserves_bytes(id in long_value_id_strategy(), segments in segments_strategy(8)) {
        let fixture = LongValueFixture::with_segments(id, segments);
        let value = fixture.create(Ownership::CloneAndOwn).unwrap();

        prop_assert_eq!(value.read_data().unwrap(), fixture.expected_data());
        prop_assert!(value.release().is_ok());
    }

    #[test]
    fn segment_data_is_idempotent(
        sizes in segment_sizes_strategy(6),
        capacity in 1usize..4,
    ) {
        let fixture = LongValueFixture::new(LongValueId::from_bytes([9, 9, 9, 9]), &sizes);
        let config = Config::new().cache_capacity(capacity);
        let value = fixture.create_with(Ownership::Borrow, &config).unwrap();

        for index in (0..sizes.len()).chain((0..sizes.len()).rev()) {
            let first = value.segment_data(index).unwrap();
            let second = value.segment_data(index).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&first[..], &fixture.segments[index][..]);
        }

        let out_of_range = value.segment_data(sizes.len());
        prop_assert!(matches!(out_of_range, Err(CoreError::UnsupportedValue { .. })), "index past end accepted");
    }

    #[test]
    fn invalid_id_size_is_unsupported(id in invalid_id_strategy()) {
        let fixture = LongValueFixture::scenario();
        let result = LongValue::create(
            &fixture.store,
            &(),
            &(),
            &fixture.handle,
            &id,
            Ownership::CloneAndOwn,
            &Config::default(),
        );
        prop_assert!(matches!(result, Err(CoreError::UnsupportedValue { .. })), "id of {} bytes accepted", id.len());
    }

    #[test]
    fn invalid_flags_are_unsupported(flags in invalid_flags_strategy()) {
        prop_assert!(matches!(
            Ownership::from_flags(flags),
            Err(CoreError::UnsupportedValue { .. })
        ), "flags 0x{:02x} accepted", flags);
    }
}
