// Fault-injecting, call-counting wrappers around the in-memory backends

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

use crate::cache::{CacheClient, CacheError, MemoryCache};
use crate::model::{CapacityRecord, ReservationRecord};
use crate::stay::NightBucket;
use crate::store::{MemoryStore, ReservationStore, StoreError};

pub struct FaultyCache {
    pub inner: MemoryCache,
    fail_gets: AtomicBool,
    fail_sets: AtomicBool,
    get_calls: AtomicUsize,
    set_calls: AtomicUsize,
}

impl FaultyCache {
    pub fn new(inner: MemoryCache) -> Self {
        Self {
            inner,
            fail_gets: AtomicBool::new(false),
            fail_sets: AtomicBool::new(false),
            get_calls: AtomicUsize::new(0),
            set_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.get_calls() + self.set_calls()
    }

    // Peek without counting a call
    pub async fn value(&self, key: &str) -> Option<Bytes> {
        self.inner.get(key).await.ok().flatten()
    }
}

#[async_trait]
impl CacheClient for FaultyCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("connection refused".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<(), CacheError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(CacheError::Server("SERVER_ERROR out of memory".to_string()));
        }
        self.inner.set(key, value).await
    }
}

pub struct FaultyStore {
    pub inner: MemoryStore,
    fail_finds: AtomicBool,
    // Index of the insert call that fails, usize::MAX for none
    fail_insert_at: AtomicUsize,
    find_calls: AtomicUsize,
    capacity_calls: AtomicUsize,
    insert_calls: AtomicUsize,
    find_delay: Mutex<Option<Duration>>,
    find_barrier: Mutex<Option<Arc<Barrier>>>,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_finds: AtomicBool::new(false),
            fail_insert_at: AtomicUsize::new(usize::MAX),
            find_calls: AtomicUsize::new(0),
            capacity_calls: AtomicUsize::new(0),
            insert_calls: AtomicUsize::new(0),
            find_delay: Mutex::new(None),
            find_barrier: Mutex::new(None),
        }
    }

    pub fn fail_finds(&self, fail: bool) {
        self.fail_finds.store(fail, Ordering::SeqCst);
    }

    pub fn fail_insert_at(&self, call: usize) {
        self.fail_insert_at.store(call, Ordering::SeqCst);
    }

    pub fn delay_finds(&self, delay: Duration) {
        *self.find_delay.lock() = Some(delay);
    }

    // Every reservation lookup waits until `parties` lookups are in flight
    pub fn rendezvous_finds(&self, parties: usize) {
        *self.find_barrier.lock() = Some(Arc::new(Barrier::new(parties)));
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn capacity_calls(&self) -> usize {
        self.capacity_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.find_calls() + self.capacity_calls() + self.insert_calls()
    }
}

#[async_trait]
impl ReservationStore for FaultyStore {
    async fn find_reservations(
        &self,
        hotel_id: &str,
        night: &NightBucket,
    ) -> Result<Vec<ReservationRecord>, StoreError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_finds.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("no reachable servers".to_string()));
        }

        let barrier = self.find_barrier.lock().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        let delay = *self.find_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.inner.find_reservations(hotel_id, night).await
    }

    async fn find_capacity(&self, hotel_id: &str) -> Result<CapacityRecord, StoreError> {
        self.capacity_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_capacity(hotel_id).await
    }

    async fn insert_reservation(&self, record: ReservationRecord) -> Result<(), StoreError> {
        let call = self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if call == self.fail_insert_at.load(Ordering::SeqCst) {
            return Err(StoreError::InsertFailed("write concern timeout".to_string()));
        }
        self.inner.insert_reservation(record).await
    }
}
