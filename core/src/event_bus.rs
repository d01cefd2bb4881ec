//! Event bus abstraction for cross-entity communication.
//!
//! Events flow from the event store (source of truth) through the event bus
//! to downstream consumers: the projection relay and the read views. The
//! bus provides **at-least-once** delivery with **manual acknowledgement**:
//! a subscriber acknowledges a delivery only after its downstream effect
//! succeeded, and an unacknowledged delivery is handed out again by the next
//! `next()` call.
//!
//! # Key Principles
//!
//! - **Store first**: events are persisted to the event store before they
//!   are published
//! - **At-least-once delivery**: consumers may see an event more than once
//! - **Idempotency**: consumers must derive idempotent downstream effects
//!   (pure overwrites need no deduplication bookkeeping)
//! - **Ordered within a topic**: redelivery of the unacknowledged head
//!   blocks the stream, so per-key order is preserved for free
//!
//! # Topic Naming Convention
//!
//! Topics follow the pattern `{entity-type}-events`:
//! - `booking-slot-events` — events from slot entities
//! - `participant-slot-events` — events from participant-slot entities
//!
//! # Example
//!
//! ```rust,ignore
//! let mut sub = event_bus.subscribe("booking-slot-events").await?;
//! while let Some(result) = sub.next().await {
//!     let delivery = result?;
//!     relay(&delivery.event).await?;
//!     sub.ack(delivery.offset).await?;
//! }
//! ```

use crate::event::SerializedEvent;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// Failed to publish an event to a topic.
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed.
        topic: String,
        /// The reason for failure.
        reason: String,
    },

    /// Failed to subscribe to a topic.
    #[error("Subscription failed for topic '{topic}': {reason}")]
    SubscriptionFailed {
        /// The topic that failed to subscribe.
        topic: String,
        /// The reason for failure.
        reason: String,
    },

    /// Acknowledged an offset that was never delivered.
    #[error("Invalid acknowledgement for offset {offset}")]
    InvalidAck {
        /// The offending offset.
        offset: u64,
    },

    /// Network or transport error.
    #[error("Transport error: {0}")]
    TransportError(String),
}

/// One delivered event plus the offset to acknowledge it with.
#[derive(Clone, Debug)]
pub struct Delivery {
    /// The delivered event.
    pub event: SerializedEvent,
    /// Position of this event in the topic; pass to [`Subscription::ack`].
    pub offset: u64,
}

/// An active subscription to one topic.
///
/// `next()` yields deliveries in topic order. A delivery that has not been
/// acknowledged is redelivered by the following `next()` call — the
/// subscription does not advance past an unacknowledged head. This is what
/// gives consumers at-least-once semantics without losing per-key ordering.
pub trait Subscription: Send {
    /// Wait for the next delivery.
    ///
    /// Returns `None` when the topic is closed and fully consumed.
    fn next(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Option<Result<Delivery, EventBusError>>> + Send + '_>>;

    /// Acknowledge a delivery, allowing the subscription to advance.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::InvalidAck`] for an offset that was never
    /// delivered to this subscription.
    fn ack(
        &mut self,
        offset: u64,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;
}

/// Trait for event bus implementations.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the bus is shared behind an
/// `Arc<dyn EventBus>` between entity stores (publishers) and consumers.
///
/// # Dyn Compatibility
///
/// Explicit `Pin<Box<dyn Future>>` returns keep the trait usable as a trait
/// object.
pub trait EventBus: Send + Sync {
    /// Publish an event to a topic.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the publish fails. The
    /// event remains in the event store regardless; consumers catch up once
    /// the bus recovers.
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Subscribe to a topic from its beginning.
    ///
    /// Each subscription tracks its own cursor; independent subscribers each
    /// see every event.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if the subscription
    /// cannot be established.
    fn subscribe(
        &self,
        topic: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn Subscription>, EventBusError>> + Send + '_>>;
}

/// The topic carrying events for an entity type (`"{entity_type}-events"`).
#[must_use]
pub fn topic_for_entity(entity_type: &str) -> String {
    format!("{entity_type}-events")
}
