// Date range decomposition: a stay [check_in, check_out) becomes a sequence of single nights

use chrono::{DateTime, Duration, NaiveDate};
use std::fmt;

use crate::error::ReservationError;

// Boundary date format
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// A single calendar night [start, end), the unit of occupancy tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NightBucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl NightBucket {
    pub fn new(start: NaiveDate) -> Self {
        Self {
            start,
            end: start + Duration::days(1),
        }
    }
}

impl fmt::Display for NightBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

// A requested stay, already normalized to day granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stay {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Stay {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self {
            check_in,
            check_out,
        }
    }

    // Parse both boundary dates
    pub fn parse(check_in: &str, check_out: &str) -> Result<Self, ReservationError> {
        Ok(Self::new(parse_date(check_in)?, parse_date(check_out)?))
    }

    // Equal or inverted ranges contain no nights
    pub fn is_empty(&self) -> bool {
        self.check_in >= self.check_out
    }

    pub fn night_count(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.check_out - self.check_in).num_days() as usize
        }
    }

    // Nights in chronological order. The iterator is lazy and can be cloned to restart.
    pub fn nights(&self) -> Nights {
        Nights {
            next: self.check_in,
            check_out: self.check_out,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Nights {
    next: NaiveDate,
    check_out: NaiveDate,
}

impl Iterator for Nights {
    type Item = NightBucket;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.check_out {
            return None;
        }
        let night = NightBucket::new(self.next);
        self.next = night.end;
        Some(night)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next >= self.check_out {
            0
        } else {
            (self.check_out - self.next).num_days() as usize
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Nights {}

// Accepts `YYYY-MM-DD`, or an RFC 3339 timestamp whose time of day is dropped
pub fn parse_date(value: &str) -> Result<NaiveDate, ReservationError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| ReservationError::InvalidDate(value.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_three_night_stay_decomposes_in_order() {
        let stay = Stay::parse("2024-05-01", "2024-05-04").unwrap();
        let nights: Vec<NightBucket> = stay.nights().collect();

        assert_eq!(
            nights,
            vec![
                NightBucket::new(date("2024-05-01")),
                NightBucket::new(date("2024-05-02")),
                NightBucket::new(date("2024-05-03")),
            ]
        );
        assert_eq!(nights[2].end, date("2024-05-04"));
        assert_eq!(stay.night_count(), 3);
    }

    #[test_case("2024-06-01", "2024-06-01"; "equal dates")]
    #[test_case("2024-06-05", "2024-06-01"; "inverted dates")]
    fn test_empty_ranges(check_in: &str, check_out: &str) {
        let stay = Stay::parse(check_in, check_out).unwrap();
        assert!(stay.is_empty());
        assert_eq!(stay.night_count(), 0);
        assert_eq!(stay.nights().next(), None);
    }

    #[test]
    fn test_nights_cross_month_and_leap_day() {
        let stay = Stay::parse("2024-02-28", "2024-03-02").unwrap();
        let starts: Vec<String> = stay.nights().map(|n| format_date(n.start)).collect();
        assert_eq!(starts, vec!["2024-02-28", "2024-02-29", "2024-03-01"]);
    }

    #[test]
    fn test_nights_iterator_is_restartable() {
        let stay = Stay::parse("2024-05-01", "2024-05-03").unwrap();
        let mut nights = stay.nights();
        let snapshot = nights.clone();

        assert_eq!(nights.len(), 2);
        nights.next();
        assert_eq!(nights.len(), 1);
        assert_eq!(snapshot.count(), 2);
    }

    #[test_case("2024-05-01", "2024-05-01"; "plain date")]
    #[test_case(" 2024-05-01 ", "2024-05-01"; "surrounding whitespace")]
    #[test_case("2024-05-01T23:59:00+00:00", "2024-05-01"; "timestamp drops time of day")]
    fn test_parse_date(input: &str, expected: &str) {
        assert_eq!(parse_date(input).unwrap(), date(expected));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        match parse_date("01/05/2024") {
            Err(ReservationError::InvalidDate(value)) => assert_eq!(value, "01/05/2024"),
            other => panic!("Expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn test_night_display() {
        let night = NightBucket::new(date("2024-12-31"));
        assert_eq!(night.to_string(), "[2024-12-31, 2025-01-01)");
    }
}
