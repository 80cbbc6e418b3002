// Durable store interface plus an in-memory document store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

use crate::model::{CapacityRecord, ReservationRecord};
use crate::stay::NightBucket;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    // A hotel without a capacity record cannot be evaluated
    #[error("No capacity record for hotel {0}")]
    CapacityNotFound(String),

    #[error("Insert failed: {0}")]
    InsertFailed(String),
}

// Batch insert failure, with how many leading records were stored first
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{inserted} records inserted before failure: {source}")]
pub struct BatchInsertError {
    pub inserted: usize,
    pub source: StoreError,
}

#[async_trait]
pub trait ReservationStore: Send + Sync + 'static {
    // All reservation records for exactly this hotel and night
    async fn find_reservations(
        &self,
        hotel_id: &str,
        night: &NightBucket,
    ) -> Result<Vec<ReservationRecord>, StoreError>;

    async fn find_capacity(&self, hotel_id: &str) -> Result<CapacityRecord, StoreError>;

    async fn insert_reservation(&self, record: ReservationRecord) -> Result<(), StoreError>;

    // Stores without transactions insert in order and stop at the first failure.
    // Earlier records stay in place.
    async fn insert_reservations(
        &self,
        records: Vec<ReservationRecord>,
    ) -> Result<(), BatchInsertError> {
        for (inserted, record) in records.into_iter().enumerate() {
            self.insert_reservation(record)
                .await
                .map_err(|source| BatchInsertError { inserted, source })?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    reservations: RwLock<Vec<ReservationRecord>>,
    capacities: RwLock<HashMap<String, CapacityRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacities(records: impl IntoIterator<Item = CapacityRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.put_capacity(record);
        }
        store
    }

    // Capacity records are written by an outside process; this seeds them
    pub fn put_capacity(&self, record: CapacityRecord) {
        self.capacities
            .write()
            .insert(record.hotel_id.clone(), record);
    }

    pub fn reservations(&self) -> Vec<ReservationRecord> {
        self.reservations.read().clone()
    }

    pub fn booked_rooms(&self, hotel_id: &str, night: &NightBucket) -> u32 {
        self.reservations
            .read()
            .iter()
            .filter(|r| r.matches(hotel_id, night))
            .map(|r| r.room_count)
            .sum()
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn find_reservations(
        &self,
        hotel_id: &str,
        night: &NightBucket,
    ) -> Result<Vec<ReservationRecord>, StoreError> {
        Ok(self
            .reservations
            .read()
            .iter()
            .filter(|r| r.matches(hotel_id, night))
            .cloned()
            .collect())
    }

    async fn find_capacity(&self, hotel_id: &str) -> Result<CapacityRecord, StoreError> {
        self.capacities
            .read()
            .get(hotel_id)
            .cloned()
            .ok_or_else(|| StoreError::CapacityNotFound(hotel_id.to_string()))
    }

    async fn insert_reservation(&self, record: ReservationRecord) -> Result<(), StoreError> {
        self.reservations.write().push(record);
        Ok(())
    }

    // Single write lock, so the batch lands all at once
    async fn insert_reservations(
        &self,
        records: Vec<ReservationRecord>,
    ) -> Result<(), BatchInsertError> {
        self.reservations.write().extend(records);
        Ok(())
    }
}
