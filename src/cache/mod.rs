// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded, time-expiring result cache.
//!
//! A generic memoization layer keyed by strings built from operation name
//! plus a stable serialization of the inputs. Eviction is insertion-order
//! (FIFO) once capacity is reached - an approximation of LRU, not true
//! recency tracking. Expiry is lazy: an entry past its TTL is treated as
//! absent and removed when a read finds it, so an expired entry may occupy
//! memory until then. Disabling the cache clears it and turns both the
//! read and write paths into no-ops.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::observability::messages::cache::{CacheDisabled, EntryEvicted, EntryExpired};

/// One cached value with its insertion time and lifetime.
struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

struct CacheState<T> {
    entries: HashMap<String, CacheEntry<T>>,
    order: VecDeque<String>,
    enabled: bool,
}

pub struct ResultCache<T> {
    state: Mutex<CacheState<T>>,
    capacity: usize,
    default_ttl: Duration,
}

impl<T: Clone> ResultCache<T> {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
                enabled: true,
            }),
            capacity: capacity.max(1),
            default_ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up `key`, treating an expired entry as absent and removing it.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut state = self.lock();
        if !state.enabled {
            return None;
        }
        let expired = state.entries.get(key)?.is_expired();
        if expired {
            state.entries.remove(key);
            state.order.retain(|k| k != key);
            tracing::debug!("{}", EntryExpired { key });
            return None;
        }
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: String, value: T) {
        self.insert_with_ttl(key, value, self.default_ttl)
    }

    /// Inserts, evicting the oldest-inserted entries once at capacity.
    /// Re-inserting an existing key updates it in place and keeps its
    /// original queue position.
    pub fn insert_with_ttl(&self, key: String, value: T, ttl: Duration) {
        let mut state = self.lock();
        if !state.enabled {
            return;
        }

        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
            ttl,
        };

        if let Some(existing) = state.entries.get_mut(&key) {
            *existing = entry;
            return;
        }

        while state.entries.len() >= self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            if state.entries.remove(&oldest).is_some() {
                tracing::debug!("{}", EntryEvicted { key: &oldest });
            }
        }

        state.order.push_back(key.clone());
        state.entries.insert(key, entry);
    }

    /// Switches the cache on or off. Turning it off drops every entry.
    pub fn set_enabled(&self, enabled: bool) {
        let mut state = self.lock();
        if state.enabled && !enabled {
            let dropped = state.entries.len();
            state.entries.clear();
            state.order.clear();
            tracing::info!(
                "{}",
                CacheDisabled {
                    dropped_entries: dropped,
                }
            );
        }
        state.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shifts an entry's insertion time into the past. Test hook for
    /// expiry behavior without sleeping.
    #[cfg(test)]
    fn backdate(&self, key: &str, by: Duration) {
        let mut state = self.lock();
        if let Some(entry) = state.entries.get_mut(key) {
            if let Some(earlier) = entry.inserted_at.checked_sub(by) {
                entry.inserted_at = earlier;
            }
        }
    }
}

/// Builds a deterministic cache key from an operation name and its
/// serializable inputs. Fails only when the inputs cannot be serialized;
/// callers skip caching for that call.
pub fn cache_key<P: Serialize>(operation: &str, params: &P) -> serde_json::Result<String> {
    Ok(format!("{}:{}", operation, serde_json::to_string(params)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    fn cache(capacity: usize) -> ResultCache<u32> {
        ResultCache::new(capacity, Duration::from_secs(60))
    }

    #[test]
    fn test_write_then_read_within_ttl() {
        let cache = cache(4);
        cache.insert("k".to_string(), 42);
        assert_eq!(cache.get("k"), Some(42));
    }

    #[test]
    fn test_expired_read_returns_absent_and_removes() {
        let cache = cache(4);
        cache.insert_with_ttl("k".to_string(), 42, Duration::from_millis(50));
        cache.backdate("k", Duration::from_millis(100));

        assert_eq!(cache.get("k"), None);
        // Removal happened as a side effect of the read.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_unexpired_entries_survive_other_reads() {
        let cache = cache(4);
        cache.insert("a".to_string(), 1);
        cache.insert_with_ttl("b".to_string(), 2, Duration::from_millis(10));
        cache.backdate("b", Duration::from_secs(1));

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_fifo_eviction_at_capacity() {
        let cache = cache(3);
        cache.insert("first".to_string(), 1);
        cache.insert("second".to_string(), 2);
        cache.insert("third".to_string(), 3);
        cache.insert("fourth".to_string(), 4);

        // Exactly the earliest-inserted entry was evicted.
        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), Some(2));
        assert_eq!(cache.get("third"), Some(3));
        assert_eq!(cache.get("fourth"), Some(4));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_eviction_is_insertion_order_not_access_order() {
        let cache = cache(2);
        cache.insert("old".to_string(), 1);
        cache.insert("new".to_string(), 2);
        // Reading "old" does not protect it; eviction ignores recency.
        assert_eq!(cache.get("old"), Some(1));
        cache.insert("newest".to_string(), 3);

        assert_eq!(cache.get("old"), None);
        assert_eq!(cache.get("new"), Some(2));
    }

    #[test]
    fn test_reinsert_updates_in_place() {
        let cache = cache(2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        cache.insert("a".to_string(), 10);

        // No eviction happened; "a" kept its queue position with the new
        // value.
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(10));
        cache.insert("c".to_string(), 3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_disable_clears_and_short_circuits() {
        let cache = cache(4);
        cache.insert("k".to_string(), 42);
        cache.set_enabled(false);

        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get("k"), None);
        cache.insert("k2".to_string(), 7);
        assert_eq!(cache.len(), 0);

        cache.set_enabled(true);
        cache.insert("k3".to_string(), 8);
        assert_eq!(cache.get("k3"), Some(8));
    }

    #[test]
    fn test_zero_capacity_is_clamped_to_one() {
        let cache: ResultCache<u32> = ResultCache::new(0, Duration::from_secs(60));
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get("a"), Some(1));
        cache.insert("b".to_string(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        #[derive(Serialize)]
        struct Params {
            day_number: f64,
            body: i32,
        }

        let a = cache_key(
            "calc_position",
            &Params {
                day_number: 2460000.5,
                body: 4,
            },
        )
        .unwrap();
        let b = cache_key(
            "calc_position",
            &Params {
                day_number: 2460000.5,
                body: 4,
            },
        )
        .unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("calc_position:"));

        let other = cache_key(
            "calc_position",
            &Params {
                day_number: 2460000.5,
                body: 5,
            },
        )
        .unwrap();
        assert_ne!(a, other);
    }
}
