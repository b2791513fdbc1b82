//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store against a simple model.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::{CacheStore, EntryOptions};
use crate::notify::{EventKind, MutationEvent, Notifier};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const LONG_TTL: Duration = Duration::from_secs(3600);

fn long_lived() -> EntryOptions {
    EntryOptions::with_ttl(LONG_TTL)
}

// == Strategies ==
/// Keys drawn from a small alphabet so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,32}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    Clear,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Put { key, value }),
        4 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
        1 => Just(CacheOp::Clear),
    ]
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<MutationEvent<String>>>,
}

impl Notifier<String> for Recorder {
    fn notify(&self, event: MutationEvent<String>) {
        self.events.lock().push(event);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // With no expiry and no eviction pressure, the store behaves exactly like
    // a map: get returns the last put until delete or clear.
    #[test]
    fn prop_matches_map_model(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let store = CacheStore::new(TEST_MAX_ENTRIES, LONG_TTL);
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    store.put(key.clone(), value.clone(), long_lived());
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(store.get(&key), model.get(&key).cloned());
                }
                CacheOp::Delete { key } => {
                    prop_assert_eq!(store.delete(&key), model.remove(&key).is_some());
                }
                CacheOp::Clear => {
                    store.clear();
                    model.clear();
                }
            }
        }
        prop_assert_eq!(store.len(), model.len());
    }

    // Hits and misses count exactly the successful and failed reads.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let store = CacheStore::new(TEST_MAX_ENTRIES, LONG_TTL);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => store.put(key, value, long_lived()),
                CacheOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Delete { key } => {
                    store.delete(&key);
                }
                CacheOp::Clear => store.clear(),
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.size, store.len(), "Size mismatch");
    }

    // Every mutation that changes state is announced once, in order.
    #[test]
    fn prop_mutations_announced_in_order(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let store: CacheStore<String> = CacheStore::new(TEST_MAX_ENTRIES, LONG_TTL);
        let recorder = Arc::new(Recorder::default());
        store.set_notifier(recorder.clone());
        let mut expected = Vec::new();

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    store.put(key.clone(), value, long_lived());
                    expected.push((EventKind::Set, Some(key)));
                }
                CacheOp::Get { key } => {
                    store.get(&key);
                }
                CacheOp::Delete { key } => {
                    if store.delete(&key) {
                        expected.push((EventKind::Delete, Some(key)));
                    }
                }
                CacheOp::Clear => {
                    store.clear();
                    expected.push((EventKind::Clear, None));
                }
            }
        }

        let seen: Vec<_> = recorder
            .events
            .lock()
            .iter()
            .map(|event| (event.kind, event.key.clone()))
            .collect();
        prop_assert_eq!(seen, expected);
    }

    // The number of entries never exceeds the capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec(("[a-z0-9]{1,8}", value_strategy()), 1..200)
    ) {
        let max_entries = 10;
        let store = CacheStore::new(max_entries, LONG_TTL);

        for (key, value) in entries {
            store.put(key, value, long_lived());
            prop_assert!(
                store.len() <= max_entries,
                "Cache size {} exceeds max {}",
                store.len(),
                max_entries
            );
        }
    }

    // A new key at capacity evicts exactly the entry created first, no
    // matter how often the others were read.
    #[test]
    fn prop_evicts_oldest_created(
        initial_keys in prop::collection::hash_set("[a-z]{1,6}", 2..10),
        reads in prop::collection::vec(0usize..10, 0..20),
        new_key in "[A-Z]{1,6}",
    ) {
        let keys: Vec<String> = initial_keys.into_iter().collect();
        let capacity = keys.len();
        let store = CacheStore::new(capacity, LONG_TTL);

        for key in &keys {
            store.put(key.clone(), format!("value_{}", key), long_lived());
        }
        for index in reads {
            store.get(&keys[index % capacity]);
        }

        store.put(new_key.clone(), "new".to_string(), long_lived());

        prop_assert_eq!(store.len(), capacity);
        prop_assert_eq!(store.stats().evictions, 1);
        prop_assert!(store.get(&keys[0]).is_none(), "Oldest key should be evicted");
        prop_assert!(store.get(&new_key).is_some());
        for key in keys.iter().skip(1) {
            prop_assert!(store.get(key).is_some(), "Key '{}' should survive", key);
        }
    }

    // Clear leaves nothing readable behind.
    #[test]
    fn prop_clear_empties_store(keys in prop::collection::hash_set(key_strategy(), 0..10)) {
        let store = CacheStore::new(TEST_MAX_ENTRIES, LONG_TTL);
        for key in &keys {
            store.put(key.clone(), "v".to_string(), long_lived());
        }

        store.clear();

        for key in &keys {
            prop_assert!(store.get(key).is_none());
        }
        prop_assert_eq!(store.stats().size, 0);
    }
}
