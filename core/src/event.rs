//! Event trait and related types for event sourcing.
//!
//! Events represent facts about things that have happened in the past and are
//! immutable. They are the source of truth: entity state is nothing more than
//! a fold over the entity's own event log.
//!
//! # Design
//!
//! Events are serialized as JSON. Field names are part of the wire contract
//! (serde rename attributes on the event enums are honored), and payloads
//! stay inspectable by operators and by consumers written in other
//! languages. Each [`SerializedEvent`] additionally carries JSON metadata
//! with the identifying fields (stream id, entity type, correlation id).
//!
//! # Example
//!
//! ```
//! use slotbook_core::event::Event;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! enum BookingEvent {
//!     ParticipantMarkedAvailable { slot_id: String, participant_id: String },
//!     ParticipantBooked { slot_id: String, participant_id: String, booking_id: String },
//! }
//!
//! impl Event for BookingEvent {
//!     fn event_type(&self) -> &'static str {
//!         match self {
//!             BookingEvent::ParticipantMarkedAvailable { .. } => "ParticipantMarkedAvailable.v1",
//!             BookingEvent::ParticipantBooked { .. } => "ParticipantBooked.v1",
//!         }
//!     }
//! }
//! ```

use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;

/// Error types for event operations.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),

    /// Unknown event type encountered during deserialization.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),
}

/// An event that can be stored in an event store and replayed to reconstruct
/// state.
///
/// # Event Naming Convention
///
/// [`Event::event_type`] returns a stable string identifier with a version
/// suffix, allowing schema evolution over time:
///
/// - `"ParticipantMarkedAvailable.v1"`
/// - `"ParticipantBooked.v1"`
///
/// # Thread Safety
///
/// Events must be `Send + Sync + 'static` so they can cross task boundaries
/// in the async runtime.
pub trait Event: Send + Sync + 'static {
    /// Returns the event type identifier for this event.
    ///
    /// The string is stored alongside the event payload and used to route
    /// events to the correct deserializer and to version event schemas.
    fn event_type(&self) -> &'static str;

    /// Serialize this event to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::SerializationError`] if the event cannot be
    /// serialized.
    fn to_bytes(&self) -> Result<Vec<u8>, EventError>
    where
        Self: Serialize,
    {
        serde_json::to_vec(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Deserialize an event from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::DeserializationError`] if the bytes are
    /// corrupted, belong to a different event type, or the schema changed
    /// incompatibly.
    fn from_bytes(bytes: &[u8]) -> Result<Self, EventError>
    where
        Self: DeserializeOwned + Sized,
    {
        serde_json::from_slice(bytes).map_err(|e| EventError::DeserializationError(e.to_string()))
    }
}

/// A serialized event ready for storage or transport.
///
/// This is the wire format between the application, the event store, and the
/// event bus: the event type name, the serialized payload, and optional
/// JSON metadata.
#[derive(Clone, Debug)]
pub struct SerializedEvent {
    /// The event type identifier (e.g., "ParticipantBooked.v1").
    pub event_type: String,

    /// The JSON-serialized event data.
    pub data: Vec<u8>,

    /// Optional metadata in JSON format.
    ///
    /// Common metadata fields:
    /// - `stream_id`: the stream this event was appended to
    /// - `entity_type`: the entity type that emitted it
    /// - `correlation_id`: links events emitted by the same command
    /// - `recorded_at`: when the event was recorded (RFC 3339)
    pub metadata: Option<serde_json::Value>,
}

impl SerializedEvent {
    /// Create a new serialized event.
    #[must_use]
    pub const fn new(
        event_type: String,
        data: Vec<u8>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            event_type,
            data,
            metadata,
        }
    }

    /// Create a serialized event from an [`Event`].
    ///
    /// # Errors
    ///
    /// Returns [`EventError::SerializationError`] if the event cannot be
    /// serialized.
    pub fn from_event<E: Event + Serialize>(
        event: &E,
        metadata: Option<serde_json::Value>,
    ) -> Result<Self, EventError> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            data: event.to_bytes()?,
            metadata,
        })
    }

    /// Decode the payload back into a concrete event type.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::DeserializationError`] if the payload does not
    /// decode as `E`.
    pub fn decode<E: Event + DeserializeOwned>(&self) -> Result<E, EventError> {
        E::from_bytes(&self.data)
    }
}

impl fmt::Display for SerializedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerializedEvent {{ type: {}, size: {} bytes }}",
            self.event_type,
            self.data.len()
        )
    }
}
