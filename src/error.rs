// Request-level error taxonomy
//
// Cache misses and rejected stays are not errors. Everything here fails the
// request outright; nothing is retried.

use thiserror::Error;

use crate::cache::CacheError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ReservationError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Corrupt cache entry {key}: {value:?}")]
    CorruptCacheEntry { key: String, value: String },

    // Some nights of the stay were stored before the insert failed. They are not rolled back.
    #[error("Partial commit for hotel {hotel_id}: {committed} of {total} nights stored")]
    PartialCommit {
        hotel_id: String,
        committed: usize,
        total: usize,
        #[source]
        source: StoreError,
    },
}
