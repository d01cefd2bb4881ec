//! # Slotbook Testing
//!
//! Testing utilities and in-memory infrastructure for the Slotbook
//! architecture.
//!
//! This crate provides:
//! - In-memory [`EventStore`](slotbook_core::event_store::EventStore) and
//!   [`EventBus`](slotbook_core::event_bus::EventBus) implementations that
//!   honor the production contracts (optimistic concurrency, at-least-once
//!   delivery with manual acknowledgement)
//! - [`EntityTest`]: a fluent Given-When-Then harness for entity decision
//!   logic
//! - Deterministic mocks such as [`mocks::FixedClock`]
//!
//! The in-memory implementations are not test doubles in the degenerate
//! sense: the demo binary runs on them too, so they behave like real
//! infrastructure (ordering, redelivery, version conflicts) rather than
//! always succeeding.
//!
//! ## Example
//!
//! ```ignore
//! use slotbook_testing::EntityTest;
//!
//! EntityTest::<BookingSlot>::new()
//!     .given_events([marked(&anna), marked(&gb), marked(&plane)])
//!     .when(SlotCommand::BookReservation { booking_id, student, instructor, aircraft })
//!     .then_event_count(3);
//! ```

pub mod entity_test;
pub mod memory;

pub use entity_test::EntityTest;
pub use memory::{InMemoryEventBus, InMemoryEventStore};

use chrono::{DateTime, TimeZone, Utc};
use slotbook_core::clock::Clock;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, TimeZone, Utc};

    /// Fixed clock for deterministic tests.
    ///
    /// Always returns the same time, making event metadata reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use slotbook_testing::mocks::FixedClock;
    /// use slotbook_core::clock::Clock;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 8, 8, 9, 0, 0).unwrap());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone, Copy)]
    pub struct FixedClock {
        instant: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a clock frozen at the given instant.
        #[must_use]
        pub const fn new(instant: DateTime<Utc>) -> Self {
            Self { instant }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.instant
        }
    }
}

/// A clock frozen at 2025-08-08 09:00:00 UTC, the canonical slot time used
/// throughout the test suite.
#[must_use]
#[allow(clippy::expect_used)] // Panics: the hardcoded timestamp is valid
pub fn test_clock() -> mocks::FixedClock {
    mocks::FixedClock::new(
        Utc.with_ymd_and_hms(2025, 8, 8, 9, 0, 0)
            .single()
            .expect("valid timestamp"),
    )
}
