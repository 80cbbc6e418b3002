// Admission control against a hotel's nightly room ceiling

use tracing::debug;

use crate::cache_aside::{CacheAside, Occupancy, WritePolicy};
use crate::error::ReservationError;
use crate::stay::NightBucket;

// occupied + requested <= capacity, without overflow
pub fn admit(occupied: u32, requested: u32, capacity: u32) -> bool {
    u64::from(occupied) + u64::from(requested) <= u64::from(capacity)
}

// Result of evaluating one night of a stay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightCheck {
    pub night: NightBucket,
    pub occupancy: Occupancy,
    pub capacity: u32,
    pub admitted: bool,
}

impl NightCheck {
    // Occupancy the night would have once the request is committed
    pub fn proposed(&self, requested: u32) -> u32 {
        self.occupancy.rooms.saturating_add(requested)
    }
}

// Occupancy, then capacity, then the admission predicate for a single night
pub async fn check_night(
    reader: &CacheAside,
    hotel_id: &str,
    night: NightBucket,
    requested: u32,
    policy: WritePolicy,
) -> Result<NightCheck, ReservationError> {
    let occupancy = reader.occupied_rooms(hotel_id, &night, policy).await?;
    let capacity = reader.capacity(hotel_id).await?;
    let admitted = admit(occupancy.rooms, requested, capacity);

    debug!(
        "hotel {} night {}: {} booked + {} requested vs {} rooms -> {}",
        hotel_id,
        night,
        occupancy.rooms,
        requested,
        capacity,
        if admitted { "admit" } else { "reject" }
    );

    Ok(NightCheck {
        night,
        occupancy,
        capacity,
        admitted,
    })
}
