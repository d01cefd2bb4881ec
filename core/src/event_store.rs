//! Event store trait and related types.
//!
//! The event store is a specialized append-only database for event streams
//! with optimistic concurrency control. It is deliberately minimal:
//!
//! - Append events to a stream, asserting the expected current version
//! - Load events from a stream for state reconstruction
//!
//! Durability of the log itself is the concern of whichever implementation
//! backs the trait; this workspace ships `InMemoryEventStore` (in
//! `slotbook-testing`) for tests and the demo, and production deployments
//! plug in the event-sourcing runtime they run on.
//!
//! # Example
//!
//! ```no_run
//! use slotbook_core::event_store::{EventStore, EventStoreError};
//! use slotbook_core::stream::{StreamId, Version};
//!
//! async fn example<E: EventStore>(store: &E) -> Result<(), EventStoreError> {
//!     let stream_id = StreamId::new("2025-08-08-09");
//!
//!     let events = vec![/* ... */];
//!     let new_version = store
//!         .append_events(stream_id.clone(), Some(Version::INITIAL), events)
//!         .await?;
//!
//!     let all_events = store.load_events(stream_id, None).await?;
//!     Ok(())
//! }
//! ```

use crate::event::SerializedEvent;
use crate::stream::{StreamId, Version};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event store operations.
#[derive(Error, Debug)]
pub enum EventStoreError {
    /// Optimistic concurrency conflict: expected version doesn't match the
    /// stream's current version — another writer appended concurrently.
    #[error("Concurrency conflict: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The stream ID where the conflict occurred.
        stream_id: StreamId,
        /// The version we expected the stream to be at.
        expected: Version,
        /// The actual current version of the stream.
        actual: Version,
    },

    /// Backing storage error.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Event store abstraction for storing and retrieving event streams.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the store is shared behind an
/// `Arc<dyn EventStore>` across entity stores and tasks.
///
/// # Dyn Compatibility
///
/// The trait uses explicit `Pin<Box<dyn Future>>` returns instead of
/// `async fn` so it can be used as a trait object.
pub trait EventStore: Send + Sync {
    /// Append events to a stream with optimistic concurrency control.
    ///
    /// # Optimistic Concurrency
    ///
    /// - `Some(version)`: assert the stream is currently at this version
    /// - `None`: append unconditionally (use with caution)
    ///
    /// Returns the new version after appending. A stream that was at
    /// version 5 and receives 3 events ends at version 8.
    ///
    /// # Errors
    ///
    /// - [`EventStoreError::ConcurrencyConflict`]: version mismatch
    /// - [`EventStoreError::StorageError`]: the backing store failed
    fn append_events(
        &self,
        stream_id: StreamId,
        expected_version: Option<Version>,
        events: Vec<SerializedEvent>,
    ) -> Pin<Box<dyn Future<Output = Result<Version, EventStoreError>> + Send + '_>>;

    /// Load events from a stream, ordered oldest first.
    ///
    /// `from_version` selects a suffix of the stream (inclusive); `None`
    /// loads everything. An unknown stream yields an empty vector, not an
    /// error — new streams start empty.
    ///
    /// # Errors
    ///
    /// - [`EventStoreError::StorageError`]: the backing store failed
    fn load_events(
        &self,
        stream_id: StreamId,
        from_version: Option<Version>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SerializedEvent>, EventStoreError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrency_conflict_error_display() {
        let error = EventStoreError::ConcurrencyConflict {
            stream_id: StreamId::new("2025-08-08-09"),
            expected: Version::new(5),
            actual: Version::new(7),
        };

        let display = format!("{error}");
        assert!(display.contains("expected version 5"));
        assert!(display.contains("found 7"));
    }
}
