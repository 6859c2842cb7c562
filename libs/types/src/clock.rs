//! Unix-millisecond clock helper
//!
//! All timestamps in the marketplace are i64 Unix milliseconds. Core
//! operations take `now_ms` as a parameter so tests control the clock;
//! this helper is for the service edges that supply it.

use chrono::Utc;

/// Current time as Unix milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
