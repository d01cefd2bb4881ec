//! The slot aggregate: authoritative state machine for one timeslot.
//!
//! One entity instance per slot id (a time bucket such as `2025-08-08-09`).
//! The slot is the single source of truth for bookability: the decision in
//! [`BookingSlot::handle`] is made against this instance's own state under
//! the runtime's single-writer lock, never against a projection.

use crate::types::{Booking, BookingId, Participant, ParticipantType, Timeslot};
use slotbook_core::entity::{EmittedEvents, Entity};
use slotbook_core::event::Event;
use smallvec::smallvec;
use thiserror::Error;

/// Domain errors for slot commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// Not all three required roles are currently available.
    #[error("Timeslot is not bookable")]
    NotBookable,
}

/// Commands accepted by the slot aggregate.
///
/// Each command names its slot explicitly; the runtime routes it to the
/// entity instance for that stream id.
#[derive(Clone, Debug)]
pub enum SlotCommand {
    /// Offer a participant's availability for this slot. Always succeeds.
    MarkAvailable {
        /// The slot being offered.
        slot_id: String,
        /// Who is available.
        participant: Participant,
    },
    /// Withdraw a participant's availability. Always succeeds, even if the
    /// participant was never marked.
    UnmarkAvailable {
        /// The slot being withdrawn from.
        slot_id: String,
        /// Who is no longer available.
        participant: Participant,
    },
    /// Reserve the slot for a student/instructor/aircraft triple.
    ///
    /// Succeeds only if all three ids are currently available; the caller
    /// supplies the role-to-id mapping.
    BookReservation {
        /// The slot being reserved.
        slot_id: String,
        /// Groups the three resulting booking entries.
        booking_id: BookingId,
        /// The student's id.
        student_id: String,
        /// The instructor's id.
        instructor_id: String,
        /// The aircraft's id.
        aircraft_id: String,
    },
    /// Cancel a reservation. Canceling an unknown booking id is a
    /// successful no-op.
    CancelBooking {
        /// The slot the reservation was made on.
        slot_id: String,
        /// The reservation to cancel.
        booking_id: BookingId,
    },
}

/// Events emitted by the slot aggregate.
///
/// Field names are the wire contract shared with downstream consumers.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all_fields = "camelCase")]
pub enum BookingEvent {
    /// A participant offered availability.
    ParticipantMarkedAvailable {
        /// The slot.
        slot_id: String,
        /// The participant's id.
        participant_id: String,
        /// The participant's role.
        participant_type: ParticipantType,
    },
    /// A participant withdrew availability.
    ParticipantUnmarkedAvailable {
        /// The slot.
        slot_id: String,
        /// The participant's id.
        participant_id: String,
        /// The participant's role.
        participant_type: ParticipantType,
    },
    /// A participant was booked into a reservation.
    ParticipantBooked {
        /// The slot.
        slot_id: String,
        /// The participant's id.
        participant_id: String,
        /// The participant's role.
        participant_type: ParticipantType,
        /// The reservation.
        booking_id: BookingId,
    },
    /// A participant's booking entry was canceled.
    ParticipantCanceled {
        /// The slot.
        slot_id: String,
        /// The participant's id.
        participant_id: String,
        /// The participant's role.
        participant_type: ParticipantType,
        /// The reservation.
        booking_id: BookingId,
    },
}

impl BookingEvent {
    /// The participant this event concerns, reconstructed from its fields.
    #[must_use]
    pub fn participant(&self) -> Participant {
        match self {
            Self::ParticipantMarkedAvailable {
                participant_id,
                participant_type,
                ..
            }
            | Self::ParticipantUnmarkedAvailable {
                participant_id,
                participant_type,
                ..
            }
            | Self::ParticipantBooked {
                participant_id,
                participant_type,
                ..
            }
            | Self::ParticipantCanceled {
                participant_id,
                participant_type,
                ..
            } => Participant::new(participant_id.clone(), *participant_type),
        }
    }

    /// The slot this event concerns.
    #[must_use]
    pub fn slot_id(&self) -> &str {
        match self {
            Self::ParticipantMarkedAvailable { slot_id, .. }
            | Self::ParticipantUnmarkedAvailable { slot_id, .. }
            | Self::ParticipantBooked { slot_id, .. }
            | Self::ParticipantCanceled { slot_id, .. } => slot_id,
        }
    }
}

impl Event for BookingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::ParticipantMarkedAvailable { .. } => "ParticipantMarkedAvailable.v1",
            Self::ParticipantUnmarkedAvailable { .. } => "ParticipantUnmarkedAvailable.v1",
            Self::ParticipantBooked { .. } => "ParticipantBooked.v1",
            Self::ParticipantCanceled { .. } => "ParticipantCanceled.v1",
        }
    }
}

/// The slot aggregate entity.
pub struct BookingSlot;

impl BookingSlot {
    fn booked(
        slot_id: &str,
        id: &str,
        participant_type: ParticipantType,
        booking_id: &BookingId,
    ) -> BookingEvent {
        BookingEvent::ParticipantBooked {
            slot_id: slot_id.to_string(),
            participant_id: id.to_string(),
            participant_type,
            booking_id: booking_id.clone(),
        }
    }
}

impl Entity for BookingSlot {
    const ENTITY_TYPE: &'static str = "booking-slot";
    type State = Timeslot;
    type Command = SlotCommand;
    type Event = BookingEvent;
    type Error = SlotError;

    fn empty_state() -> Timeslot {
        Timeslot::default()
    }

    fn handle(state: &Timeslot, command: SlotCommand) -> Result<EmittedEvents<BookingEvent>, SlotError> {
        match command {
            // Re-marking an already-available participant emits again: the
            // log grows while the visible set stays a single membership.
            SlotCommand::MarkAvailable {
                slot_id,
                participant,
            } => Ok(smallvec![BookingEvent::ParticipantMarkedAvailable {
                slot_id,
                participant_id: participant.id,
                participant_type: participant.participant_type,
            }]),

            // Unmarking a never-marked participant still emits; removal of
            // an absent member is a no-op at apply time.
            SlotCommand::UnmarkAvailable {
                slot_id,
                participant,
            } => Ok(smallvec![BookingEvent::ParticipantUnmarkedAvailable {
                slot_id,
                participant_id: participant.id,
                participant_type: participant.participant_type,
            }]),

            SlotCommand::BookReservation {
                slot_id,
                booking_id,
                student_id,
                instructor_id,
                aircraft_id,
            } => {
                if !state.is_bookable(&student_id, &instructor_id, &aircraft_id) {
                    return Err(SlotError::NotBookable);
                }
                Ok(smallvec![
                    Self::booked(&slot_id, &aircraft_id, ParticipantType::Aircraft, &booking_id),
                    Self::booked(
                        &slot_id,
                        &instructor_id,
                        ParticipantType::Instructor,
                        &booking_id
                    ),
                    Self::booked(&slot_id, &student_id, ParticipantType::Student, &booking_id),
                ])
            }

            SlotCommand::CancelBooking {
                slot_id,
                booking_id,
            } => Ok(state
                .bookings_for(&booking_id)
                .into_iter()
                .map(|booking| BookingEvent::ParticipantCanceled {
                    slot_id: slot_id.clone(),
                    participant_id: booking.participant.id.clone(),
                    participant_type: booking.participant.participant_type,
                    booking_id: booking_id.clone(),
                })
                .collect()),
        }
    }

    fn apply(state: &mut Timeslot, event: &BookingEvent) {
        match event {
            BookingEvent::ParticipantMarkedAvailable { .. } => {
                state.available.insert(event.participant());
            }
            BookingEvent::ParticipantUnmarkedAvailable { .. } => {
                state.available.remove(&event.participant());
            }
            // Booking consumes availability: one event drives the compound
            // transition.
            BookingEvent::ParticipantBooked { booking_id, .. } => {
                let participant = event.participant();
                state.bookings.insert(Booking {
                    participant: participant.clone(),
                    booking_id: booking_id.clone(),
                });
                state.available.remove(&participant);
            }
            // Cancellation is terminal: availability is not restored.
            BookingEvent::ParticipantCanceled { booking_id, .. } => {
                state.bookings.remove(&Booking {
                    participant: event.participant(),
                    booking_id: booking_id.clone(),
                });
            }
        }
    }
}
