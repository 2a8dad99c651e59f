//! Wall-clock helper.
//!
//! All event timestamps are milliseconds since the Unix epoch, matching
//! what browser clients get from `Date.now()`. Every function that cares
//! about time takes `now` as a parameter; only the scheduler loop and the
//! HTTP handlers read the real clock through [`now_millis`].

use chrono::Utc;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
