// Booking commit: admit every night of a stay, then write cache and store
//
// Pending -> Admitted -> Committed, or Pending -> Rejected.
// Occupancy values read on a cache miss are held in the working set and only
// written back after the whole stay is admitted. A rejected stay writes nothing
// for occupancy; capacity may already have been cached, which is always safe.

use tracing::{debug, error, info};

use crate::admission::check_night;
use crate::cache::encode_count;
use crate::cache_aside::{CacheAside, WritePolicy};
use crate::error::ReservationError;
use crate::model::ReservationRecord;
use crate::stay::{NightBucket, Stay};
use crate::store::BatchInsertError;

// One admitted night waiting to be committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNight {
    pub night: NightBucket,
    pub key: String,
    pub proposed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingState {
    Pending,
    Admitted(Vec<PendingNight>),
    Committed { nights: usize },
    Rejected { night: NightBucket },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Committed { nights: usize },
    Rejected { night: NightBucket },
    // Empty stay: nothing to do
    Empty,
}

pub struct BookingCommitter<'a> {
    reader: &'a CacheAside,
    hotel_id: &'a str,
    customer_name: &'a str,
    stay: Stay,
    rooms: u32,
    state: BookingState,
}

impl<'a> BookingCommitter<'a> {
    pub fn new(
        reader: &'a CacheAside,
        hotel_id: &'a str,
        customer_name: &'a str,
        stay: Stay,
        rooms: u32,
    ) -> Self {
        Self {
            reader,
            hotel_id,
            customer_name,
            stay,
            rooms,
            state: BookingState::Pending,
        }
    }

    pub async fn run(mut self) -> Result<BookingOutcome, ReservationError> {
        if self.stay.is_empty() {
            return Ok(BookingOutcome::Empty);
        }

        self.admit().await?;
        if let BookingState::Admitted(_) = self.state {
            self.commit().await?;
        }

        Ok(match self.state {
            BookingState::Committed { nights } => BookingOutcome::Committed { nights },
            BookingState::Rejected { night } => BookingOutcome::Rejected { night },
            BookingState::Pending | BookingState::Admitted(_) => BookingOutcome::Empty,
        })
    }

    // Pending -> Admitted | Rejected. Stops at the first night that does not fit.
    async fn admit(&mut self) -> Result<(), ReservationError> {
        // sized by admitted nights, not by the requested stay length
        let mut working_set = Vec::new();

        for night in self.stay.nights() {
            let check = check_night(
                self.reader,
                self.hotel_id,
                night,
                self.rooms,
                WritePolicy::Deferred,
            )
            .await?;

            if !check.admitted {
                debug!(
                    "rejecting {} rooms at hotel {}: night {} is full",
                    self.rooms, self.hotel_id, night
                );
                self.state = BookingState::Rejected { night };
                return Ok(());
            }

            working_set.push(PendingNight {
                night,
                proposed: check.proposed(self.rooms),
                key: check.occupancy.key,
            });
        }

        self.state = BookingState::Admitted(working_set);
        Ok(())
    }

    // Admitted -> Committed. Cache first, then one record per night in night order.
    async fn commit(&mut self) -> Result<(), ReservationError> {
        let working_set = match std::mem::replace(&mut self.state, BookingState::Pending) {
            BookingState::Admitted(working_set) => working_set,
            other => {
                self.state = other;
                return Ok(());
            }
        };

        for pending in &working_set {
            self.reader
                .cache()
                .set(&pending.key, encode_count(pending.proposed))
                .await?;
        }

        let records: Vec<ReservationRecord> = working_set
            .iter()
            .map(|p| {
                ReservationRecord::for_night(
                    self.hotel_id,
                    self.customer_name,
                    &p.night,
                    self.rooms,
                )
            })
            .collect();
        let total = records.len();

        if let Err(BatchInsertError { inserted, source }) =
            self.reader.store().insert_reservations(records).await
        {
            if inserted == 0 {
                return Err(source.into());
            }
            error!(
                "partial booking for hotel {}: {} of {} nights stored before {}",
                self.hotel_id, inserted, total, source
            );
            return Err(ReservationError::PartialCommit {
                hotel_id: self.hotel_id.to_string(),
                committed: inserted,
                total,
                source,
            });
        }

        info!(
            "booked {} rooms at hotel {} for {} ({} nights) for {}",
            self.rooms, self.hotel_id, self.stay.check_in, total, self.customer_name
        );
        self.state = BookingState::Committed { nights: total };
        Ok(())
    }
}
