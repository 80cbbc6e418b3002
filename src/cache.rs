// Cache service interface and an in-memory implementation
// Sits in front of the durable store on the booking and availability hot paths

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::trace;

use crate::stay::{format_date, NightBucket};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache server error: {0}")]
    Server(String),
}

// Key-value cache. A miss is `Ok(None)`, never an error.
#[async_trait]
pub trait CacheClient: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    // Unconditional overwrite
    async fn set(&self, key: &str, value: Bytes) -> Result<(), CacheError>;
}

// Occupancy key for one hotel night
pub fn occupancy_key(hotel_id: &str, night: &NightBucket) -> String {
    format!(
        "{}_{}_{}",
        hotel_id,
        format_date(night.start),
        format_date(night.end)
    )
}

pub fn capacity_key(hotel_id: &str) -> String {
    format!("{}_cap", hotel_id)
}

// Counts are stored as ASCII decimal
pub fn encode_count(count: u32) -> Bytes {
    Bytes::from(count.to_string())
}

pub fn decode_count(value: &[u8]) -> Option<u32> {
    std::str::from_utf8(value).ok()?.trim().parse().ok()
}

// Stats for the in-memory cache
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hit_count: AtomicUsize,
    pub miss_count: AtomicUsize,
    pub set_count: AtomicUsize,
    pub eviction_count: AtomicUsize,
    pub expired_count: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStatsReport {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub set_count: usize,
    pub eviction_count: usize,
    pub expired_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    #[serde(rename = "lru")]
    LeastRecentlyUsed,
    #[serde(rename = "lfu")]
    LeastFrequentlyUsed,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
    // None keeps entries until evicted
    pub default_ttl_seconds: Option<u64>,
    pub shards_count: usize,
    pub eviction_policy: EvictionPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100_000,
            default_ttl_seconds: None,
            shards_count: 16,
            eviction_policy: EvictionPolicy::LeastRecentlyUsed,
        }
    }
}

struct CacheEntry {
    data: Bytes,
    expires_at: Option<Instant>,
    access_count: usize,
    last_accessed: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |at| Instant::now() >= at)
    }
}

pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
    config: Mutex<CacheConfig>,
    stats: CacheStats,
}

impl MemoryCache {
    pub fn new(config: CacheConfig) -> Self {
        // dashmap wants a power of two above one
        let shards = config.shards_count.max(2).next_power_of_two();
        Self {
            entries: DashMap::with_shard_amount(shards),
            config: Mutex::new(config),
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            items_count: self.entries.len(),
            hit_count: self.stats.hit_count.load(Ordering::SeqCst),
            miss_count: self.stats.miss_count.load(Ordering::SeqCst),
            set_count: self.stats.set_count.load(Ordering::SeqCst),
            eviction_count: self.stats.eviction_count.load(Ordering::SeqCst),
            expired_count: self.stats.expired_count.load(Ordering::SeqCst),
        }
    }

    pub fn set_eviction_policy(&self, policy: EvictionPolicy) {
        self.config.lock().eviction_policy = policy;
    }

    // Shrinking evicts until the new bound holds
    pub fn resize(&self, max_entries: usize) {
        self.config.lock().max_entries = max_entries;
        while self.entries.len() > max_entries {
            if !self.evict_one() {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_one(&self) -> bool {
        let policy = self.config.lock().eviction_policy;

        let victim = match policy {
            EvictionPolicy::LeastRecentlyUsed => self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().last_accessed)
                .map(|entry| entry.key().clone()),
            EvictionPolicy::LeastFrequentlyUsed => self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().access_count)
                .map(|entry| entry.key().clone()),
        };

        match victim {
            Some(key) => {
                if self.entries.remove(&key).is_some() {
                    self.stats.eviction_count.fetch_add(1, Ordering::SeqCst);
                }
                trace!("evicted {}", key);
                true
            }
            None => false,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let expired = match self.entries.get_mut(key) {
            Some(mut entry) => {
                if entry.is_expired() {
                    true
                } else {
                    entry.access_count += 1;
                    entry.last_accessed = Instant::now();
                    self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
                    return Ok(Some(entry.data.clone()));
                }
            }
            None => false,
        };

        if expired && self.entries.remove_if(key, |_, e| e.is_expired()).is_some() {
            self.stats.expired_count.fetch_add(1, Ordering::SeqCst);
        }
        self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<(), CacheError> {
        let (max_entries, ttl) = {
            let config = self.config.lock();
            (config.max_entries, config.default_ttl_seconds)
        };

        if !self.entries.contains_key(key) && self.entries.len() >= max_entries {
            self.evict_one();
        }

        let now = Instant::now();
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                data: value,
                expires_at: ttl.map(|secs| now + Duration::from_secs(secs)),
                access_count: 0,
                last_accessed: now,
            },
        );
        self.stats.set_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
