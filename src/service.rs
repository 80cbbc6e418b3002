// Request-facing reservation service
// Each call is independent; cache and store clients are injected, never global.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::try_join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::availability::hotel_available;
use crate::booking::{BookingCommitter, BookingOutcome};
use crate::cache::CacheClient;
use crate::cache_aside::CacheAside;
use crate::config::{ConsistencyMode, ServiceConfig};
use crate::error::ReservationError;
use crate::model::{requested_rooms, AvailabilityRequest, BookingRequest, ReservationResult};
use crate::stay::Stay;
use crate::store::ReservationStore;

pub const SERVICE_NAME: &str = "srv-reservation";

#[derive(Debug, Default)]
pub struct ServiceStats {
    pub bookings_committed: AtomicUsize,
    pub bookings_rejected: AtomicUsize,
    pub availability_checks: AtomicUsize,
    pub hotels_offered: AtomicUsize,
    pub requests_failed: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ServiceStatsReport {
    pub bookings_committed: usize,
    pub bookings_rejected: usize,
    pub availability_checks: usize,
    pub hotels_offered: usize,
    pub requests_failed: usize,
}

#[async_trait]
pub trait ReservationApi: Send + Sync + 'static {
    // Books every night of the stay or none. Returns the hotel on success, empty on rejection.
    async fn make_reservation(
        &self,
        request: BookingRequest,
    ) -> Result<ReservationResult, ReservationError>;

    // Candidate hotels that can take the rooms on every night, in request order
    async fn check_availability(
        &self,
        request: AvailabilityRequest,
    ) -> Result<ReservationResult, ReservationError>;

    fn stats(&self) -> ServiceStatsReport;
}

// Holds one hotel's lock. Dropping it releases the lock and forgets the hotel
// once nobody else holds or waits on it.
struct HotelGuard<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    hotel_id: &'a str,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for HotelGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(self.hotel_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

pub struct ReservationService {
    reader: CacheAside,
    consistency: ConsistencyMode,
    hotel_locks: DashMap<String, Arc<Mutex<()>>>,
    stats: ServiceStats,
}

impl ReservationService {
    pub fn new(
        cache: Arc<dyn CacheClient>,
        store: Arc<dyn ReservationStore>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            reader: CacheAside::new(cache, store),
            consistency: config.consistency,
            hotel_locks: DashMap::new(),
            stats: ServiceStats::default(),
        }
    }

    pub fn consistency(&self) -> ConsistencyMode {
        self.consistency
    }

    // Serialized mode only. The guard covers the hotel's whole read-check-write.
    async fn lock_hotel<'a>(&'a self, hotel_id: &'a str) -> Option<HotelGuard<'a>> {
        match self.consistency {
            ConsistencyMode::Racy => None,
            ConsistencyMode::Serialized => {
                let lock = self
                    .hotel_locks
                    .entry(hotel_id.to_string())
                    .or_default()
                    .clone();
                Some(HotelGuard {
                    locks: &self.hotel_locks,
                    hotel_id,
                    guard: Some(lock.lock_owned().await),
                })
            }
        }
    }

    async fn book(&self, request: &BookingRequest) -> Result<ReservationResult, ReservationError> {
        let stay = Stay::parse(&request.check_in, &request.check_out)?;
        let rooms = match requested_rooms(request.room_count) {
            Some(rooms) if !stay.is_empty() => rooms,
            _ => {
                debug!("nothing to book for hotel {}", request.hotel_id);
                return Ok(ReservationResult::empty());
            }
        };

        let _guard = self.lock_hotel(&request.hotel_id).await;
        let outcome = BookingCommitter::new(
            &self.reader,
            &request.hotel_id,
            &request.customer_name,
            stay,
            rooms,
        )
        .run()
        .await?;

        match outcome {
            BookingOutcome::Committed { .. } => {
                self.stats.bookings_committed.fetch_add(1, Ordering::SeqCst);
                Ok(ReservationResult::single(&request.hotel_id))
            }
            BookingOutcome::Rejected { night } => {
                warn!(
                    "no room at hotel {} for {} rooms on {}",
                    request.hotel_id, rooms, night
                );
                self.stats.bookings_rejected.fetch_add(1, Ordering::SeqCst);
                Ok(ReservationResult::empty())
            }
            BookingOutcome::Empty => Ok(ReservationResult::empty()),
        }
    }

    async fn check(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<ReservationResult, ReservationError> {
        let stay = Stay::parse(&request.check_in, &request.check_out)?;
        let rooms = match requested_rooms(request.room_count) {
            Some(rooms) if !stay.is_empty() => rooms,
            _ => return Ok(ReservationResult::empty()),
        };

        let checks = request.hotel_ids.iter().map(|hotel_id| async move {
            let _guard = self.lock_hotel(hotel_id).await;
            debug!("checking hotel {}", hotel_id);
            hotel_available(&self.reader, hotel_id, &stay, rooms).await
        });
        let available = try_join_all(checks).await?;

        let hotel_ids: Vec<String> = request
            .hotel_ids
            .iter()
            .zip(available)
            .filter(|(_, ok)| *ok)
            .map(|(hotel_id, _)| hotel_id.clone())
            .collect();

        self.stats
            .hotels_offered
            .fetch_add(hotel_ids.len(), Ordering::SeqCst);
        Ok(ReservationResult { hotel_ids })
    }

    fn record_failure<T>(&self, result: &Result<T, ReservationError>) {
        if let Err(e) = result {
            warn!("request failed: {}", e);
            self.stats.requests_failed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl ReservationApi for ReservationService {
    async fn make_reservation(
        &self,
        request: BookingRequest,
    ) -> Result<ReservationResult, ReservationError> {
        let result = self.book(&request).await;
        self.record_failure(&result);
        result
    }

    async fn check_availability(
        &self,
        request: AvailabilityRequest,
    ) -> Result<ReservationResult, ReservationError> {
        self.stats.availability_checks.fetch_add(1, Ordering::SeqCst);
        let result = self.check(&request).await;
        self.record_failure(&result);
        result
    }

    fn stats(&self) -> ServiceStatsReport {
        ServiceStatsReport {
            bookings_committed: self.stats.bookings_committed.load(Ordering::SeqCst),
            bookings_rejected: self.stats.bookings_rejected.load(Ordering::SeqCst),
            availability_checks: self.stats.availability_checks.load(Ordering::SeqCst),
            hotels_offered: self.stats.hotels_offered.load(Ordering::SeqCst),
            requests_failed: self.stats.requests_failed.load(Ordering::SeqCst),
        }
    }
}
