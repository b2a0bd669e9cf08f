use modelsql_engine::cache::duration_of;
use modelsql_engine::ResultCache;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_get_repeats_until_expiry(
        key in "[a-z]{1,8}/[a-z]{1,8}",
        fingerprint in "\\PC{0,24}",
        payload in proptest::collection::vec(any::<u8>(), 1..64),
        minutes in 1i64..10_000,
        reads in 1usize..8,
    ) {
        let cache = ResultCache::new();
        prop_assert!(cache.set(&key, &fingerprint, payload.clone(), minutes).unwrap());
        for _ in 0..reads {
            let hit = cache.get(&key, &fingerprint);
            prop_assert_eq!(hit.as_deref(), Some(payload.as_slice()));
        }
    }

    #[test]
    fn test_fingerprints_never_cross(
        a in "\\PC{0,16}",
        b in "\\PC{0,16}",
        code in -4i64..60,
    ) {
        prop_assume!(a != b);
        let cache = ResultCache::new();
        cache.set("m/c", &a, b"first".to_vec(), code.max(1)).unwrap();
        prop_assert!(cache.get("m/c", &b).is_none());
        prop_assert!(!cache.set("m/c", &b, b"second".to_vec(), code.max(1)).unwrap());
        let got = cache.get("m/c", &a);
        prop_assert_eq!(got.as_deref(), Some(&b"first"[..]));
    }

    #[test]
    fn test_duration_code_domain(code in -1_000i64..1_000) {
        prop_assert_eq!(duration_of(code).is_ok(), code >= -4);
    }
}
