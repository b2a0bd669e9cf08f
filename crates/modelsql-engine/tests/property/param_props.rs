use modelsql_core::constants::DEFAULT_EPOCH_MS;
use modelsql_params::idgen::{decompose, to_base36};
use modelsql_params::validate::validate_value;
use modelsql_params::{IdGenerator, ParamSpec, ParamType};
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn test_int_range_is_inclusive(lo in -1_000i64..1_000, width in 0i64..1_000, probe in -3_000i64..3_000) {
        let hi = lo + width;
        let spec = ParamSpec::new("n")
            .with_type(ParamType::Int)
            .with_range(Some(lo as f64), Some(hi as f64));
        let result = validate_value(&spec, Some(&json!(probe)));
        prop_assert_eq!(result.is_ok(), (lo..=hi).contains(&probe));
    }

    #[test]
    fn test_length_counts_characters(min in 0usize..8, width in 0usize..8, text in "[a-zé漢]{0,20}") {
        let max = min + width;
        let spec = ParamSpec::new("s")
            .with_type(ParamType::String)
            .with_len(Some(min), Some(max));
        let chars = text.chars().count();
        let result = validate_value(&spec, Some(&json!(text)));
        // An empty optional string is accepted regardless of bounds.
        let expected = chars == 0 || (min..=max).contains(&chars);
        prop_assert_eq!(result.is_ok(), expected);
    }

    #[test]
    fn test_base36_matches_std_radix(n in any::<u64>()) {
        prop_assert_eq!(u64::from_str_radix(&to_base36(n), 36).unwrap(), n);
    }

    #[test]
    fn test_ids_strictly_increase(worker in 0i64..64, count in 1usize..2_000) {
        let gen = IdGenerator::new(worker, DEFAULT_EPOCH_MS).unwrap();
        let mut last = i64::MIN;
        for _ in 0..count {
            let id = gen.next_id();
            prop_assert!(id > last);
            prop_assert_eq!(decompose(id).1, worker);
            last = id;
        }
    }
}
