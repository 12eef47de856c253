//! Calendar-day helpers shared by the streak walk, the "checked in today"
//! query and the CTA policy.
//!
//! Entry dates reach us in two shapes: a native UTC instant, or the
//! `{seconds, nanoseconds}` wrapper a store assigns at write time. Every
//! comparison goes through [`to_canonical_date`] first. Day boundaries are
//! UTC midnights.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned timestamp, as written by the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTimestamp {
    pub seconds: i64,
    pub nanoseconds: u32,
}

impl ServerTimestamp {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            seconds: at.timestamp(),
            nanoseconds: at.timestamp_subsec_nanos(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryDate {
    Instant(DateTime<Utc>),
    ServerTimestamp(ServerTimestamp),
}

impl From<DateTime<Utc>> for EntryDate {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Instant(value)
    }
}

impl From<ServerTimestamp> for EntryDate {
    fn from(value: ServerTimestamp) -> Self {
        Self::ServerTimestamp(value)
    }
}

/// Resolves either representation to a UTC instant. Never fails: a wrapper
/// outside chrono's range clamps to the earliest representable instant.
pub fn to_canonical_date(value: impl Into<EntryDate>) -> DateTime<Utc> {
    match value.into() {
        EntryDate::Instant(at) => at,
        EntryDate::ServerTimestamp(ts) => {
            DateTime::from_timestamp(ts.seconds, ts.nanoseconds).unwrap_or(DateTime::<Utc>::MIN_UTC)
        }
    }
}

pub fn normalize_to_start_of_day(date: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.date_naive().and_time(NaiveTime::MIN))
}

/// Start of a calendar day given as a plain date.
pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

pub fn is_same_day(a: impl Into<EntryDate>, b: impl Into<EntryDate>) -> bool {
    normalize_to_start_of_day(to_canonical_date(a)) == normalize_to_start_of_day(to_canonical_date(b))
}

pub fn is_today(date: impl Into<EntryDate>, now: DateTime<Utc>) -> bool {
    is_same_day(date, now)
}

/// Whole calendar days between two dates, ignoring order.
pub fn days_between(a: impl Into<EntryDate>, b: impl Into<EntryDate>) -> u64 {
    let a = normalize_to_start_of_day(to_canonical_date(a));
    let b = normalize_to_start_of_day(to_canonical_date(b));
    (b - a).num_days().unsigned_abs()
}

pub fn today_start(now: DateTime<Utc>) -> DateTime<Utc> {
    normalize_to_start_of_day(now)
}

pub fn tomorrow_start(now: DateTime<Utc>) -> DateTime<Utc> {
    normalize_to_start_of_day(now + Duration::days(1))
}

pub fn get_today_start() -> DateTime<Utc> {
    today_start(Utc::now())
}

pub fn get_tomorrow_start() -> DateTime<Utc> {
    tomorrow_start(Utc::now())
}
