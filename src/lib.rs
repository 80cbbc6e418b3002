// Availability and booking engine for the hotel reservation service

pub mod admission;
pub mod availability;
pub mod booking;
pub mod cache;
pub mod cache_aside;
pub mod config;
pub mod error;
pub mod model;
pub mod service;
pub mod stay;
pub mod store;

#[cfg(test)]
pub mod mock;

// Re-export key types for convenience
pub use cache::{
    CacheClient, CacheConfig, CacheError, CacheStatsReport, EvictionPolicy, MemoryCache,
};
pub use config::{ConfigError, ConsistencyMode, ServiceConfig};
pub use error::ReservationError;
pub use model::{
    AvailabilityRequest, BookingRequest, CapacityRecord, ReservationRecord, ReservationResult,
};
pub use service::{ReservationApi, ReservationService, ServiceStatsReport};
pub use stay::{NightBucket, Stay};
pub use store::{MemoryStore, ReservationStore, StoreError};
