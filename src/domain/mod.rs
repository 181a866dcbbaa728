pub mod entity;
pub mod event;
pub mod repository;
pub mod search;
pub mod service;

use chrono::{DateTime, TimeZone, Utc};

/// Midnight UTC of the day containing `now`.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map_or(now, |midnight| Utc.from_utc_datetime(&midnight))
}
