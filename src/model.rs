use serde::{Deserialize, Serialize};

use crate::stay::{format_date, NightBucket};

// Durable reservation document, one per hotel per night per booking
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRecord {
    pub hotel_id: String,
    pub customer_name: String,
    pub in_date: String,
    pub out_date: String,
    #[serde(rename = "number")]
    pub room_count: u32,
}

impl ReservationRecord {
    pub fn for_night(hotel_id: &str, customer_name: &str, night: &NightBucket, rooms: u32) -> Self {
        Self {
            hotel_id: hotel_id.to_string(),
            customer_name: customer_name.to_string(),
            in_date: format_date(night.start),
            out_date: format_date(night.end),
            room_count: rooms,
        }
    }

    pub fn matches(&self, hotel_id: &str, night: &NightBucket) -> bool {
        self.hotel_id == hotel_id
            && self.in_date == format_date(night.start)
            && self.out_date == format_date(night.end)
    }
}

// Durable capacity document, one per hotel, seeded outside this service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityRecord {
    pub hotel_id: String,
    #[serde(rename = "numberOfRoom")]
    pub total_rooms: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub hotel_id: String,
    pub check_in: String,
    pub check_out: String,
    pub customer_name: String,
    // Non-positive counts are accepted and treated as nothing to book
    pub room_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub hotel_ids: Vec<String>,
    pub check_in: String,
    pub check_out: String,
    pub room_count: i64,
}

// Bookable or booked hotels. Empty means rejected or nothing suitable, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResult {
    pub hotel_ids: Vec<String>,
}

impl ReservationResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(hotel_id: &str) -> Self {
        Self {
            hotel_ids: vec![hotel_id.to_string()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hotel_ids.is_empty()
    }
}

// Room counts arrive as signed integers; anything below one is a no-op request
pub fn requested_rooms(room_count: i64) -> Option<u32> {
    if room_count <= 0 {
        None
    } else {
        Some(u32::try_from(room_count).unwrap_or(u32::MAX))
    }
}
