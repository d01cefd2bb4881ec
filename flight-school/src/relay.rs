//! Projection relay: slot events become participant-slot commands.
//!
//! The sole bridge between the two aggregate streams. For each event on
//! `booking-slot-events` it derives the target stream id
//! `{slot_id}-{participant_id}` and issues the structurally corresponding
//! command against the participant-slot entity store.
//!
//! Delivery is at-least-once; the relay is safe under redelivery because
//! every derived command is a deterministic status overwrite. Per-key order
//! is preserved by the consumer's ack-gated subscription: the unacked head
//! blocks the topic, so events for one key are applied in emission order.

use crate::participant_slot::{ParticipantSlot, ParticipantSlotCommand, participant_slot_stream_id};
use crate::slot::BookingEvent;
use async_trait::async_trait;
use slotbook_core::event::SerializedEvent;
use slotbook_core::stream::StreamId;
use slotbook_runtime::EntityStore;
use slotbook_runtime::consumer::{EventHandler, HandlerError};
use std::sync::Arc;
use tracing::debug;

/// Relays slot aggregate events to participant-slot aggregate instances.
pub struct SlotToParticipantRelay {
    participants: Arc<EntityStore<ParticipantSlot>>,
}

impl SlotToParticipantRelay {
    /// Create a relay targeting the given participant-slot store.
    #[must_use]
    pub fn new(participants: Arc<EntityStore<ParticipantSlot>>) -> Self {
        Self { participants }
    }

    /// Derive the target instance and command for one slot event.
    fn translate(event: BookingEvent) -> (StreamId, ParticipantSlotCommand) {
        let participant = event.participant();
        let target = participant_slot_stream_id(event.slot_id(), &participant.id);

        let command = match event {
            BookingEvent::ParticipantMarkedAvailable { slot_id, .. } => {
                ParticipantSlotCommand::MarkAvailable {
                    slot_id,
                    participant,
                }
            }
            BookingEvent::ParticipantUnmarkedAvailable { slot_id, .. } => {
                ParticipantSlotCommand::UnmarkAvailable {
                    slot_id,
                    participant,
                }
            }
            BookingEvent::ParticipantBooked {
                slot_id,
                booking_id,
                ..
            } => ParticipantSlotCommand::Book {
                slot_id,
                participant,
                booking_id,
            },
            BookingEvent::ParticipantCanceled {
                slot_id,
                booking_id,
                ..
            } => ParticipantSlotCommand::Cancel {
                slot_id,
                participant,
                booking_id,
            },
        };

        (target, command)
    }
}

#[async_trait]
impl EventHandler for SlotToParticipantRelay {
    async fn handle(&self, event: &SerializedEvent) -> Result<(), HandlerError> {
        let booking_event: BookingEvent =
            event.decode().map_err(|error| HandlerError::Decode {
                event_type: event.event_type.clone(),
                reason: error.to_string(),
            })?;

        let (target, command) = Self::translate(booking_event);
        debug!(target_stream = %target, "Relaying slot event");

        self.participants
            .execute(&target, command)
            .await
            .map_err(|error| HandlerError::Downstream(error.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BookingId, ParticipantType};

    #[test]
    fn translate_derives_composite_key_and_matching_command() {
        let event = BookingEvent::ParticipantBooked {
            slot_id: "2025-08-08-09".to_string(),
            participant_id: "anna".to_string(),
            participant_type: ParticipantType::Student,
            booking_id: BookingId::from("newBooking"),
        };

        let (target, command) = SlotToParticipantRelay::translate(event);
        assert_eq!(target, StreamId::new("2025-08-08-09-anna"));
        assert!(matches!(
            command,
            ParticipantSlotCommand::Book { booking_id, .. }
                if booking_id == BookingId::from("newBooking")
        ));
    }

    #[test]
    fn translate_maps_every_variant_structurally() {
        let unmarked = BookingEvent::ParticipantUnmarkedAvailable {
            slot_id: "2025-08-08-09".to_string(),
            participant_id: "gb".to_string(),
            participant_type: ParticipantType::Aircraft,
        };
        let (target, command) = SlotToParticipantRelay::translate(unmarked);
        assert_eq!(target, StreamId::new("2025-08-08-09-gb"));
        assert!(matches!(
            command,
            ParticipantSlotCommand::UnmarkAvailable { .. }
        ));
    }
}
