//! Clock abstraction for testable time.
//!
//! Event metadata carries a `recorded_at` timestamp. Production code uses
//! [`SystemClock`]; tests use the `FixedClock` from `slotbook-testing` so
//! timestamps are deterministic.

use chrono::{DateTime, Utc};

/// Clock trait — abstracts time for testability.
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
