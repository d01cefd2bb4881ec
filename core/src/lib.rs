//! # Slotbook Core
//!
//! Core traits and types for the Slotbook event-sourcing architecture.
//!
//! This crate provides the fundamental abstractions for building systems
//! where shared, time-slotted resources are booked across several
//! participants, using CQRS and Event Sourcing.
//!
//! ## Core Concepts
//!
//! - **Entity**: a single-writer consistency boundary whose state is derived
//!   solely from its own ordered event log ([`entity::Entity`])
//! - **Event**: an immutable fact about something that happened
//!   ([`event::Event`])
//! - **Event Store**: append-only storage for event streams with optimistic
//!   concurrency ([`event_store::EventStore`])
//! - **Event Bus**: at-least-once, acknowledged delivery of events between
//!   entities ([`event_bus::EventBus`])
//! - **Projection**: a derived, queryable read model, never authoritative
//!   ([`projection::Projection`])
//!
//! ## Architecture Principles
//!
//! - Commands are decided against the entity's own state only — projections
//!   are eventually consistent reflections and never gate decisions
//! - `apply` is the only place state mutates, shared between live command
//!   handling and replay
//! - Downstream commands derived from events are pure overwrites, so
//!   redelivery is safe without deduplication bookkeeping
//!
//! ## Example
//!
//! ```ignore
//! use slotbook_core::entity::Entity;
//!
//! struct BookingSlot;
//!
//! impl Entity for BookingSlot {
//!     const ENTITY_TYPE: &'static str = "booking-slot";
//!     type State = Timeslot;
//!     type Command = SlotCommand;
//!     type Event = BookingEvent;
//!     type Error = SlotError;
//!
//!     fn empty_state() -> Timeslot { Timeslot::default() }
//!
//!     fn handle(state: &Timeslot, command: SlotCommand)
//!         -> Result<SmallVec<[BookingEvent; 4]>, SlotError> {
//!         // Validation and event emission; no mutation here
//!     }
//!
//!     fn apply(state: &mut Timeslot, event: &BookingEvent) {
//!         // The only place state changes
//!     }
//! }
//! ```

pub mod clock;
pub mod entity;
pub mod event;
pub mod event_bus;
pub mod event_store;
pub mod projection;
pub mod stream;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::SmallVec;
