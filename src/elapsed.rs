//! Time-together counter.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Start date shown by the counter: 2024-12-12, midnight UTC.
pub fn together_since() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 12, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Days/hours/minutes/seconds between two instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Elapsed {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Elapsed {
    /// Breaks `now - start` into whole units. A start in the future yields zero.
    pub fn between(start: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let diff = (now - start).num_milliseconds().max(0);
        Self {
            days: diff / MILLIS_PER_DAY,
            hours: (diff % MILLIS_PER_DAY) / MILLIS_PER_HOUR,
            minutes: (diff % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE,
            seconds: (diff % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND,
        }
    }

    pub fn since_together(now: DateTime<Utc>) -> Self {
        Self::between(together_since(), now)
    }
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_start_date(value: &str) -> Result<DateTime<Utc>, AppResponse> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppResponse::BadRequest(format!("Invalid start date: {value}")))
}
