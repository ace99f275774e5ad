use std::fmt;

use chrono::Utc;

/// Source of the timestamp used for rows appended with timestamp `0`.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time as nanoseconds since the Unix epoch.
    fn now_nanos(&self) -> i64;
}

/// Wall clock backed by [`chrono::Utc`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> i64 {
        // Out of range only after year 2262.
        Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
    }
}
