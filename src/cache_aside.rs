// Cache-aside reads for nightly occupancy and hotel capacity
//
// Both check the cache first and fall back to the store on a miss. Capacity is
// written back immediately. Occupancy is written back only when the caller asks
// for it: the availability path does, the booking path holds the value until the
// whole stay is admitted.

use bytes::Bytes;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::cache::{capacity_key, decode_count, encode_count, occupancy_key, CacheClient};
use crate::error::ReservationError;
use crate::store::ReservationStore;
use crate::stay::NightBucket;

// What to do with a value loaded from the store on a miss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    WriteThrough,
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Store,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupancy {
    pub key: String,
    pub rooms: u32,
    pub source: Source,
}

#[derive(Clone)]
pub struct CacheAside {
    cache: Arc<dyn CacheClient>,
    store: Arc<dyn ReservationStore>,
}

impl CacheAside {
    pub fn new(cache: Arc<dyn CacheClient>, store: Arc<dyn ReservationStore>) -> Self {
        Self { cache, store }
    }

    pub fn cache(&self) -> &Arc<dyn CacheClient> {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn ReservationStore> {
        &self.store
    }

    // Rooms already booked for one hotel night
    pub async fn occupied_rooms(
        &self,
        hotel_id: &str,
        night: &NightBucket,
        policy: WritePolicy,
    ) -> Result<Occupancy, ReservationError> {
        let key = occupancy_key(hotel_id, night);

        if let Some(value) = self.cache.get(&key).await? {
            let rooms = parse_cached(&key, &value)?;
            trace!("cache hit {} = {}", key, rooms);
            return Ok(Occupancy {
                key,
                rooms,
                source: Source::Cache,
            });
        }

        trace!("cache miss {}", key);
        let rooms = self
            .store
            .find_reservations(hotel_id, night)
            .await?
            .iter()
            .fold(0u32, |sum, r| sum.saturating_add(r.room_count));

        if policy == WritePolicy::WriteThrough {
            self.repopulate(&key, rooms).await;
        }

        Ok(Occupancy {
            key,
            rooms,
            source: Source::Store,
        })
    }

    // Total rooms for a hotel. Capacity never changes, so a miss is always written back.
    pub async fn capacity(&self, hotel_id: &str) -> Result<u32, ReservationError> {
        let key = capacity_key(hotel_id);

        if let Some(value) = self.cache.get(&key).await? {
            let rooms = parse_cached(&key, &value)?;
            trace!("cache hit {} = {}", key, rooms);
            return Ok(rooms);
        }

        trace!("cache miss {}", key);
        let rooms = self.store.find_capacity(hotel_id).await?.total_rooms;
        self.repopulate(&key, rooms).await;
        Ok(rooms)
    }

    // The value already came from the store, so a failed write-back only costs a later miss
    async fn repopulate(&self, key: &str, rooms: u32) {
        if let Err(e) = self.cache.set(key, encode_count(rooms)).await {
            warn!("failed to repopulate {}: {}", key, e);
        }
    }
}

fn parse_cached(key: &str, value: &Bytes) -> Result<u32, ReservationError> {
    decode_count(value).ok_or_else(|| ReservationError::CorruptCacheEntry {
        key: key.to_string(),
        value: String::from_utf8_lossy(value).into_owned(),
    })
}
