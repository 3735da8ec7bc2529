use std::sync::Arc;
use std::thread;

use recency_core::Guard;
use recency_core::common_tests::lru_cache_core_tests::*;
use recency_core::common_tests::lru_cache_stress_tests::*;
use recency_crossbeam::{EpochGuard, EpochLruCache};
use rstest::rstest;
use serial_test::serial;

#[rstest]
#[case::construction(test_construction::<EpochGuard> as fn())]
#[case::get_unknown_key(test_get_unknown_key::<EpochGuard> as fn())]
#[case::set_and_get(test_set_and_get::<EpochGuard> as fn())]
#[case::eviction_order(test_eviction_order::<EpochGuard> as fn())]
#[case::get_then_fill(test_get_then_fill::<EpochGuard> as fn())]
#[case::repeated_get(test_repeated_get::<EpochGuard> as fn())]
#[case::replace_existing_key(test_replace_existing_key::<EpochGuard> as fn())]
#[case::single_slot(test_single_slot::<EpochGuard> as fn())]
#[case::index_list_agreement(test_index_list_agreement::<EpochGuard> as fn())]
#[case::concurrent_inserts(test_concurrent_inserts_within_capacity::<EpochGuard> as fn())]
fn test_core_epoch(#[case] test: fn()) {
    test();
}

#[rstest]
#[serial(stress_tests)]
#[case::concurrent_eviction(test_concurrent_eviction::<EpochGuard> as fn())]
#[case::hot_key_promotion(test_hot_key_promotion::<EpochGuard> as fn())]
#[case::concurrent_overwrites(test_concurrent_overwrites::<EpochGuard> as fn())]
#[case::mixed_operations(test_mixed_operations::<EpochGuard> as fn())]
#[case::agreement_over_rounds(test_agreement_over_rounds::<EpochGuard> as fn())]
#[case::progress_under_contention(test_progress_under_contention::<EpochGuard> as fn())]
fn stress_epoch(#[case] test: fn()) {
    test();
}

#[test]
fn test_entries_outlive_eviction() {
    let cache: EpochLruCache<String, Vec<u8>> = EpochLruCache::new(2).unwrap();
    cache.set("a".to_string(), vec![1; 64]);

    let held = cache.get_entry(&"a".to_string()).unwrap();
    cache.set("b".to_string(), vec![2; 64]);
    cache.set("c".to_string(), vec![3; 64]);
    assert!(!cache.contains_key(&"a".to_string()));

    // The evicted entry is shared, not freed with its node
    assert_eq!(held.key(), "a");
    assert_eq!(held.value(), &vec![1; 64]);
}

#[test]
fn test_static_borrowed_keys() {
    let cache: EpochLruCache<&'static str, u32> = EpochLruCache::new(2).unwrap();
    cache.set("main", 1);
    cache.set("worker", 2);
    cache.set("main", 3);
    drop(cache);

    // Retired nodes outlive the cache; only 'static data may be in them
    let pinned = EpochGuard::pin();
    pinned.flush();
}

#[test]
#[serial(stress_tests)]
fn test_churn_with_entry_snapshots() {
    let cache: Arc<EpochLruCache<u64, String>> = Arc::new(EpochLruCache::new(32).unwrap());

    let writers: Vec<_> = (0..4u64)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..5000u64 {
                    let key = (t * 5000 + i) % 256;
                    cache.set(key, format!("value_{}", key));
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..200 {
                    // Snapshots race with eviction; every entry seen must be intact
                    for entry in cache.entries() {
                        assert_eq!(entry.value(), &format!("value_{}", entry.key()));
                    }
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert!(cache.size() <= cache.capacity());
    assert_eq!(cache.entries().len(), cache.size());
}
