use modelsql_core::types::ParamMap;
use proptest::prelude::*;
use serde_json::json;

use crate::common::{count, fixture, params};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_inserted_names_round_trip(names in proptest::collection::vec("[a-z]{1,32}", 1..6)) {
        let fx = fixture();
        let mut ids = Vec::new();
        for name in &names {
            let outcome = fx.engine.exec("biz/demo", "add", &params(json!({"name": name}))).unwrap();
            ids.push(outcome.returned["id"].as_str().unwrap().to_string());
        }
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), ids.len());

        for (id, name) in ids.iter().zip(&names) {
            let rows = fx.engine.select("biz/demo", "profile", &params(json!({"id": id}))).unwrap();
            prop_assert_eq!(rows.len(), 1);
            let stored = count(
                &fx.engine,
                &format!("SELECT COUNT(*) FROM users WHERE id = '{id}' AND name = '{name}'"),
            );
            prop_assert_eq!(stored, 1);
        }
    }

    #[test]
    fn test_invalid_element_aborts_whole_batch(good in 0usize..5, bad_at in 0usize..5) {
        let fx = fixture();
        let mut batch: Vec<ParamMap> = (0..good)
            .map(|i| params(json!({"uid": format!("u{i}"), "total": i})))
            .collect();
        let at = bad_at.min(batch.len());
        batch.insert(at, params(json!({"uid": "bad", "total": -1})));

        prop_assert!(fx.engine.batch_exec("biz/demo", "bulk", &batch).is_err());
        prop_assert_eq!(count(&fx.engine, "SELECT COUNT(*) FROM orders"), 0);
    }
}
