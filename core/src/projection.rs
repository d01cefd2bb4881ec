//! Projection support for building read models from events.
//!
//! Projections are the query side of CQRS: while entities handle the write
//! side (commands → events → state), projections materialize events into
//! denormalized views optimized for querying.
//!
//! # Philosophy
//!
//! - **Eventually consistent**: projections lag the event log by the
//!   relay's propagation delay
//! - **Never authoritative**: booking decisions are made from entity state
//!   only; a projection must never gate a command
//! - **Rebuildable**: a projection can be dropped and rebuilt from events
//!   at any time
//! - **Idempotent**: events may be redelivered; applying the same event
//!   twice must leave the view in the same state
//!
//! # Example
//!
//! ```ignore
//! impl Projection for ParticipantSlotsView {
//!     type Event = ParticipantSlotEvent;
//!
//!     fn name(&self) -> &str {
//!         "participant-slots"
//!     }
//!
//!     async fn apply_event(&self, event: &Self::Event) -> Result<()> {
//!         // upsert or delete the row for this event's key
//!     }
//! }
//! ```

use serde::Deserialize;
use std::future::Future;

/// Error type for projection operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Event processing error.
    #[error("Event processing error: {0}")]
    EventProcessing(String),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;

/// A projection builds and maintains a read model from events.
pub trait Projection: Send + Sync {
    /// The event type this projection listens to.
    type Event: for<'de> Deserialize<'de> + Send + Sync;

    /// The projection's name, unique across the system; used for logging
    /// and consumer identification.
    fn name(&self) -> &str;

    /// Apply an event to update the projection.
    ///
    /// Called once per consumed event (possibly more, under redelivery).
    /// Implementations must be idempotent: delivery is at-least-once, not
    /// exactly-once.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] if event processing or storage fails;
    /// the consumer will redeliver.
    fn apply_event(&self, event: &Self::Event) -> impl Future<Output = Result<()>> + Send;

    /// Rebuild the projection from scratch (drop all derived data).
    ///
    /// Default implementation is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] if the rebuild fails.
    fn rebuild(&self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}
