//! `attune-cache` — the two-tier cache from §4.2: a bounded in-process
//! tier backed by an optional networked tier-2 KV, both keyed by the
//! same string space.

mod keys;
mod tier2;

pub use keys::{profile_key, request_key, response_key, sentiment_key, topics_key};
pub use tier2::Tier2;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use attune_core::TtlClass;
use dashmap::DashMap;
use tracing::debug;

struct Entry {
    value: Vec<u8>,
    inserted_at: f64,
    ttl: TtlClass,
}

/// In-process tier 1 plus an optional tier 2. Cheap to clone — internals
/// are `Arc`-shared.
#[derive(Clone)]
pub struct Cache {
    tier1: Arc<DashMap<String, Entry>>,
    tier2: Option<Arc<dyn Tier2>>,
    capacity: usize,
    len_hint: Arc<AtomicUsize>,
}

impl Cache {
    pub fn new(capacity: usize, tier2: Option<Arc<dyn Tier2>>) -> Self {
        Self {
            tier1: Arc::new(DashMap::new()),
            tier2,
            capacity,
            len_hint: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Tier-1 lookup, falling back to tier-2 and back-filling on hit.
    pub async fn get(&self, key: &str, now: f64) -> Option<Vec<u8>> {
        if let Some(entry) = self.tier1.get(key) {
            if !expired(&entry, now) {
                return Some(entry.value.clone());
            }
        }
        self.tier1.remove(key);

        let tier2 = self.tier2.as_ref()?;
        let (value, ttl) = tier2.get(key).await?;
        self.insert_tier1(key.to_string(), value.clone(), now, ttl);
        Some(value)
    }

    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: TtlClass, now: f64) {
        self.insert_tier1(key.to_string(), value.clone(), now, ttl);
        if let Some(tier2) = &self.tier2 {
            tier2.set(key, value, ttl).await;
        }
    }

    fn insert_tier1(&self, key: String, value: Vec<u8>, now: f64, ttl: TtlClass) {
        self.tier1.insert(
            key,
            Entry {
                value,
                inserted_at: now,
                ttl,
            },
        );
        if self.tier1.len() > self.capacity {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&self) {
        let oldest = self
            .tier1
            .iter()
            .min_by(|a, b| a.value().inserted_at.total_cmp(&b.value().inserted_at))
            .map(|e| e.key().clone());
        if let Some(key) = oldest {
            self.tier1.remove(&key);
        }
    }

    /// Drop every expired tier-1 entry and trim overflow; called from the
    /// 300s background sweep (§5).
    pub fn evict_expired(&self, now: f64) -> usize {
        let expired_keys: Vec<String> = self
            .tier1
            .iter()
            .filter(|e| expired(e.value(), now))
            .map(|e| e.key().clone())
            .collect();
        let n = expired_keys.len();
        for key in &expired_keys {
            self.tier1.remove(key);
        }
        while self.tier1.len() > self.capacity {
            self.evict_oldest();
        }
        debug!(evicted = n, remaining = self.tier1.len(), "cache sweep");
        n
    }

    pub fn len(&self) -> usize {
        self.tier1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tier1.is_empty()
    }
}

fn expired(entry: &Entry, now: f64) -> bool {
    now - entry.inserted_at >= entry.ttl.as_secs() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let cache = Cache::new(10, None);
        cache.set("k", b"v".to_vec(), TtlClass::Short, 0.0).await;
        assert_eq!(cache.get("k", 1.0).await, Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn expired_entry_is_not_returned() {
        let cache = Cache::new(10, None);
        cache.set("k", b"v".to_vec(), TtlClass::Short, 0.0).await;
        assert_eq!(cache.get("k", 1000.0).await, None);
    }

    #[tokio::test]
    async fn overflow_evicts_oldest_by_inserted_at() {
        let cache = Cache::new(2, None);
        cache.set("a", b"1".to_vec(), TtlClass::Long, 0.0).await;
        cache.set("b", b"2".to_vec(), TtlClass::Long, 1.0).await;
        cache.set("c", b"3".to_vec(), TtlClass::Long, 2.0).await;
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a", 3.0).await, None);
        assert_eq!(cache.get("c", 3.0).await, Some(b"3".to_vec()));
    }

    #[test]
    fn sweep_removes_only_expired() {
        let cache = Cache::new(10, None);
        cache.tier1.insert(
            "old".to_string(),
            Entry {
                value: vec![],
                inserted_at: 0.0,
                ttl: TtlClass::Short,
            },
        );
        cache.tier1.insert(
            "fresh".to_string(),
            Entry {
                value: vec![],
                inserted_at: 950.0,
                ttl: TtlClass::Long,
            },
        );
        let evicted = cache.evict_expired(1000.0);
        assert_eq!(evicted, 1);
        assert!(cache.tier1.contains_key("fresh"));
    }
}
