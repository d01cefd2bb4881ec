//! The participant-slot aggregate: per-(slot, participant) status.
//!
//! One entity instance per composite key `{slot_id}-{participant_id}`
//! (participant ids are globally unique, so the role is an attribute rather
//! than part of the key). This aggregate exists purely as a projection
//! target: it makes slot facts addressable by participant and is the unit
//! the read-view subscribes to. It decides nothing — every command
//! deterministically becomes exactly one event, and applying an event is a
//! pure last-write-wins overwrite of the status snapshot. That purity is
//! what makes relay redelivery safe without deduplication bookkeeping.

use crate::types::{BookingId, Participant, ParticipantType};
use slotbook_core::entity::{EmittedEvents, Entity};
use slotbook_core::event::Event;
use slotbook_core::stream::StreamId;
use smallvec::smallvec;
use std::convert::Infallible;

/// Derive the composite stream id for a (slot, participant) pair.
#[must_use]
pub fn participant_slot_stream_id(slot_id: &str, participant_id: &str) -> StreamId {
    StreamId::new(format!("{slot_id}-{participant_id}"))
}

/// Current status of one (slot, participant) pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SlotStatus {
    /// No live status; the read-view holds no row for this pair.
    #[default]
    Cleared,
    /// The participant is offering this slot.
    Available,
    /// The participant is booked into this reservation.
    Booked(BookingId),
}

/// State snapshot: identity attributes plus the latest status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParticipantSlotState {
    /// The slot.
    pub slot_id: String,
    /// The participant's id.
    pub participant_id: String,
    /// The participant's role, known after the first event.
    pub participant_type: Option<ParticipantType>,
    /// Latest status.
    pub status: SlotStatus,
}

/// Commands relayed from slot events.
#[derive(Clone, Debug)]
pub enum ParticipantSlotCommand {
    /// Record that the participant offered this slot.
    MarkAvailable {
        /// The slot.
        slot_id: String,
        /// The participant.
        participant: Participant,
    },
    /// Record that the participant withdrew this slot.
    UnmarkAvailable {
        /// The slot.
        slot_id: String,
        /// The participant.
        participant: Participant,
    },
    /// Record that the participant was booked.
    Book {
        /// The slot.
        slot_id: String,
        /// The participant.
        participant: Participant,
        /// The reservation.
        booking_id: BookingId,
    },
    /// Record that the participant's booking was canceled.
    Cancel {
        /// The slot.
        slot_id: String,
        /// The participant.
        participant: Participant,
        /// The reservation.
        booking_id: BookingId,
    },
}

/// Events emitted by the participant-slot aggregate, consumed by the
/// read-view.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all_fields = "camelCase")]
pub enum ParticipantSlotEvent {
    /// Status became available.
    MarkedAvailable {
        /// The slot.
        slot_id: String,
        /// The participant's id.
        participant_id: String,
        /// The participant's role.
        participant_type: ParticipantType,
    },
    /// Status cleared after a withdrawal.
    UnmarkedAvailable {
        /// The slot.
        slot_id: String,
        /// The participant's id.
        participant_id: String,
        /// The participant's role.
        participant_type: ParticipantType,
    },
    /// Status became booked.
    Booked {
        /// The slot.
        slot_id: String,
        /// The participant's id.
        participant_id: String,
        /// The participant's role.
        participant_type: ParticipantType,
        /// The reservation.
        booking_id: BookingId,
    },
    /// Status cleared after a cancellation.
    Canceled {
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

impl Event for ParticipantSlotEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::MarkedAvailable { .. } => "ParticipantSlotMarkedAvailable.v1",
            Self::UnmarkedAvailable { .. } => "ParticipantSlotUnmarkedAvailable.v1",
            Self::Booked { .. } => "ParticipantSlotBooked.v1",
            Self::Canceled { .. } => "ParticipantSlotCanceled.v1",
        }
    }
}

/// The participant-slot aggregate entity.
pub struct ParticipantSlot;

impl Entity for ParticipantSlot {
    const ENTITY_TYPE: &'static str = "participant-slot";
    type State = ParticipantSlotState;
    type Command = ParticipantSlotCommand;
    type Event = ParticipantSlotEvent;
    type Error = Infallible;

    fn empty_state() -> ParticipantSlotState {
        ParticipantSlotState::default()
    }

    // A pure translator: one command, one event, no rejection.
    fn handle(
        _state: &ParticipantSlotState,
        command: ParticipantSlotCommand,
    ) -> Result<EmittedEvents<ParticipantSlotEvent>, Infallible> {
        let event = match command {
            ParticipantSlotCommand::MarkAvailable {
                slot_id,
                participant,
            } => ParticipantSlotEvent::MarkedAvailable {
                slot_id,
                participant_id: participant.id,
                participant_type: participant.participant_type,
            },
            ParticipantSlotCommand::UnmarkAvailable {
                slot_id,
                participant,
            } => ParticipantSlotEvent::UnmarkedAvailable {
                slot_id,
                participant_id: participant.id,
                participant_type: participant.participant_type,
            },
            ParticipantSlotCommand::Book {
                slot_id,
                participant,
                booking_id,
            } => ParticipantSlotEvent::Booked {
                slot_id,
                participant_id: participant.id,
                participant_type: participant.participant_type,
                booking_id,
            },
            ParticipantSlotCommand::Cancel {
                slot_id,
                participant,
                booking_id,
            } => ParticipantSlotEvent::Canceled {
                slot_id,
                participant_id: participant.id,
                participant_type: participant.participant_type,
                booking_id,
            },
        };
        Ok(smallvec![event])
    }

    fn apply(state: &mut ParticipantSlotState, event: &ParticipantSlotEvent) {
        match event {
            ParticipantSlotEvent::MarkedAvailable {
                slot_id,
                participant_id,
                participant_type,
            } => {
                state.slot_id = slot_id.clone();
                state.participant_id = participant_id.clone();
                state.participant_type = Some(*participant_type);
                state.status = SlotStatus::Available;
            }
            ParticipantSlotEvent::UnmarkedAvailable {
                slot_id,
                participant_id,
                participant_type,
            } => {
                state.slot_id = slot_id.clone();
                state.participant_id = participant_id.clone();
                state.participant_type = Some(*participant_type);
                state.status = SlotStatus::Cleared;
            }
            ParticipantSlotEvent::Booked {
                slot_id,
                participant_id,
                participant_type,
                booking_id,
            } => {
                state.slot_id = slot_id.clone();
                state.participant_id = participant_id.clone();
                state.participant_type = Some(*participant_type);
                state.status = SlotStatus::Booked(booking_id.clone());
            }
            ParticipantSlotEvent::Canceled {
                slot_id,
                participant_id,
                participant_type,
                ..
            } => {
                state.slot_id = slot_id.clone();
                state.participant_id = participant_id.clone();
                state.participant_type = Some(*participant_type);
                state.status = SlotStatus::Cleared;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotbook_testing::EntityTest;

    const SLOT: &str = "2025-08-08-09";

    fn anna() -> Participant {
        Participant::student("anna")
    }

    #[test]
    fn composite_key_derivation() {
        assert_eq!(
            participant_slot_stream_id(SLOT, "anna"),
            StreamId::new("2025-08-08-09-anna")
        );
    }

    #[test]
    fn mark_emits_exactly_one_event_and_sets_status() {
        EntityTest::<ParticipantSlot>::new()
            .when(ParticipantSlotCommand::MarkAvailable {
                slot_id: SLOT.to_string(),
                participant: anna(),
            })
            .then_events(&[ParticipantSlotEvent::MarkedAvailable {
                slot_id: SLOT.to_string(),
                participant_id: "anna".to_string(),
                participant_type: ParticipantType::Student,
            }])
            .then_state(|state| assert_eq!(state.status, SlotStatus::Available));
    }

    #[test]
    fn status_is_last_write_wins() {
        EntityTest::<ParticipantSlot>::new()
            .when(ParticipantSlotCommand::MarkAvailable {
                slot_id: SLOT.to_string(),
                participant: anna(),
            })
            .when(ParticipantSlotCommand::Book {
                slot_id: SLOT.to_string(),
                participant: anna(),
                booking_id: BookingId::from("newBooking"),
            })
            .then_state(|state| {
                assert_eq!(state.status, SlotStatus::Booked(BookingId::from("newBooking")));
            })
            .when(ParticipantSlotCommand::Cancel {
                slot_id: SLOT.to_string(),
                participant: anna(),
                booking_id: BookingId::from("newBooking"),
            })
            .then_events(&[ParticipantSlotEvent::Canceled {
                slot_id: SLOT.to_string(),
                participant_id: "anna".to_string(),
                participant_type: ParticipantType::Student,
                booking_id: BookingId::from("newBooking"),
            }])
            .then_state(|state| assert_eq!(state.status, SlotStatus::Cleared));
    }

    #[test]
    fn unmark_without_prior_mark_clears() {
        EntityTest::<ParticipantSlot>::new()
            .when(ParticipantSlotCommand::UnmarkAvailable {
                slot_id: SLOT.to_string(),
                participant: anna(),
            })
            .then_event_count(1)
            .then_state(|state| assert_eq!(state.status, SlotStatus::Cleared));
    }

    #[test]
    fn redelivered_event_is_a_pure_overwrite() {
        let event = ParticipantSlotEvent::Booked {
            slot_id: SLOT.to_string(),
            participant_id: "anna".to_string(),
            participant_type: ParticipantType::Student,
            booking_id: BookingId::from("newBooking"),
        };

        let mut once = ParticipantSlot::empty_state();
        ParticipantSlot::apply(&mut once, &event);

        let mut twice = ParticipantSlot::empty_state();
        ParticipantSlot::apply(&mut twice, &event);
        ParticipantSlot::apply(&mut twice, &event);

        assert_eq!(once, twice);
    }
}
