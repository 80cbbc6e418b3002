// Read-only availability across candidate hotels
//
// Each hotel is evaluated on its own: nights in order, stopping at the first one
// that does not fit. Occupancy misses are written through to the cache at once,
// unlike the booking path, since there is no pending decision to protect.

use tracing::trace;

use crate::admission::check_night;
use crate::cache_aside::{CacheAside, WritePolicy};
use crate::error::ReservationError;
use crate::stay::Stay;

// True when every night of the stay can take `rooms` more rooms
pub async fn hotel_available(
    reader: &CacheAside,
    hotel_id: &str,
    stay: &Stay,
    rooms: u32,
) -> Result<bool, ReservationError> {
    if stay.is_empty() {
        return Ok(false);
    }

    for night in stay.nights() {
        let check = check_night(reader, hotel_id, night, rooms, WritePolicy::WriteThrough).await?;
        if !check.admitted {
            trace!("hotel {} unavailable on {}", hotel_id, night);
            return Ok(false);
        }
    }
    Ok(true)
}
