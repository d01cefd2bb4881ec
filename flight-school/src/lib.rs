//! # Flight School
//!
//! Timeslot booking for a flight school: a reservation is valid only when a
//! student, an instructor, and an aircraft are all free for the same slot.
//!
//! Built on the Slotbook architecture:
//!
//! - [`slot::BookingSlot`] — the authoritative slot aggregate; enforces the
//!   bookability rule under the runtime's single-writer lock
//! - [`participant_slot::ParticipantSlot`] — per-(slot, participant) status,
//!   keyed `{slot_id}-{participant_id}`; a pure command-to-event translator
//! - [`relay::SlotToParticipantRelay`] — the bridge between the two
//!   aggregate streams, idempotent under at-least-once delivery
//! - [`view::ParticipantSlotsView`] — the read-view answering "which slots
//!   does this participant have, and in what status"
//!
//! Data flow:
//!
//! ```text
//! command ─► BookingSlot ─► booking-slot-events ─► relay
//!                                                   │
//!                                  ParticipantSlot ◄┘
//!                                        │
//!                        participant-slot-events ─► ParticipantSlotsView
//! ```

pub mod config;
pub mod participant_slot;
pub mod relay;
pub mod slot;
pub mod types;
pub mod view;

pub use config::Config;
pub use participant_slot::{
    ParticipantSlot, ParticipantSlotCommand, ParticipantSlotEvent, ParticipantSlotState,
    SlotStatus, participant_slot_stream_id,
};
pub use relay::SlotToParticipantRelay;
pub use slot::{BookingEvent, BookingSlot, SlotCommand, SlotError};
pub use types::{Booking, BookingId, Participant, ParticipantType, Timeslot};
pub use view::{ParticipantSlotsView, RowStatus, SlotRow, ViewUpdater};
