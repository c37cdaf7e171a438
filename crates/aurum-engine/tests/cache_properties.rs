//! Property-based tests for cache invariants.
//!
//! These tests verify properties that must hold for any sequence of writes:
//! - Size never exceeds capacity
//! - At capacity, a new key evicts exactly the oldest-inserted key
//! - Nothing is returned past its TTL, swept or not

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use aurum_engine::{ManualClock, TtlCache};
use proptest::prelude::*;

/// Model of the expected FIFO order for a sequence of `set` calls.
fn expected_order(keys: &[u8], capacity: usize) -> VecDeque<u8> {
    let mut order = VecDeque::new();
    for key in keys {
        if order.contains(key) {
            continue;
        }
        if order.len() >= capacity {
            order.pop_front();
        }
        order.push_back(*key);
    }
    order
}

proptest! {
    #[test]
    fn size_never_exceeds_capacity(
        capacity in 1usize..16,
        keys in prop::collection::vec(0u8..40, 0..200),
    ) {
        let cache = TtlCache::new(capacity);
        for key in &keys {
            cache.set(key.to_string(), *key, Duration::from_secs(60));
            prop_assert!(cache.len() <= capacity);
        }
    }

    #[test]
    fn eviction_follows_insertion_order(
        capacity in 1usize..8,
        keys in prop::collection::vec(0u8..20, 1..100),
    ) {
        let cache = TtlCache::new(capacity);
        for key in &keys {
            cache.set(key.to_string(), *key, Duration::from_secs(60));
        }

        let expected = expected_order(&keys, capacity);
        let actual: Vec<String> = cache.stats().entries.into_iter().map(|e| e.key).collect();
        let expected: Vec<String> = expected.iter().map(|k| k.to_string()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn expired_entries_are_never_returned(
        ttl_ms in 1u64..5_000,
        elapsed_ms in 0u64..10_000,
    ) {
        let clock = Arc::new(ManualClock::default());
        let cache = TtlCache::with_clock(4, clock.clone());
        cache.set("k", 1u32, Duration::from_millis(ttl_ms));

        clock.advance(Duration::from_millis(elapsed_ms));

        let expired = elapsed_ms > ttl_ms;
        prop_assert_eq!(cache.get("k").is_none(), expired);
        prop_assert_eq!(cache.has("k"), !expired);
    }

    #[test]
    fn sweep_removes_exactly_the_expired(
        ttls in prop::collection::vec(1u64..100, 1..30),
        elapsed in 0u64..120,
    ) {
        let clock = Arc::new(ManualClock::default());
        let cache = TtlCache::with_clock(64, clock.clone());
        for (i, ttl) in ttls.iter().enumerate() {
            cache.set(format!("k{}", i), i, Duration::from_secs(*ttl));
        }

        clock.advance(Duration::from_secs(elapsed));
        let expected_removed = ttls.iter().filter(|ttl| elapsed > **ttl).count();

        prop_assert_eq!(cache.sweep_expired(), expected_removed);
        prop_assert_eq!(cache.len(), ttls.len() - expected_removed);
        prop_assert!(cache.stats().entries.iter().all(|e| !e.expired));
    }
}
