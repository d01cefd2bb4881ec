//! Participant read-view: slots queryable by participant.
//!
//! Materializes participant-slot events into a row per
//! `(slot_id, participant_id)`. The view is derived and eventually
//! consistent; it lags the slot aggregate by the relay's propagation delay
//! and is never consulted for bookability decisions.

use crate::participant_slot::ParticipantSlotEvent;
use crate::types::ParticipantType;
use async_trait::async_trait;
use slotbook_core::event::SerializedEvent;
use slotbook_core::projection::{Projection, Result as ProjectionResult};
use slotbook_runtime::consumer::{EventHandler, HandlerError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Row status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowStatus {
    /// The participant is offering the slot.
    Available,
    /// The participant is booked for the slot.
    Booked,
}

/// One row of the view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotRow {
    /// The slot.
    pub slot_id: String,
    /// The participant's id.
    pub participant_id: String,
    /// The participant's role.
    pub participant_type: ParticipantType,
    /// The reservation, or empty when merely available.
    pub booking_id: String,
    /// Current status.
    pub status: RowStatus,
}

/// In-memory read-view keyed by `(slot_id, participant_id)`.
#[derive(Default)]
pub struct ParticipantSlotsView {
    rows: RwLock<HashMap<(String, String), SlotRow>>,
}

impl ParticipantSlotsView {
    /// Create an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows for one participant, across slots.
    pub async fn slots_by_participant(&self, participant_id: &str) -> Vec<SlotRow> {
        self.rows
            .read()
            .await
            .values()
            .filter(|row| row.participant_id == participant_id)
            .cloned()
            .collect()
    }

    /// Rows for one participant filtered by status.
    pub async fn slots_by_participant_and_status(
        &self,
        participant_id: &str,
        status: RowStatus,
    ) -> Vec<SlotRow> {
        self.rows
            .read()
            .await
            .values()
            .filter(|row| row.participant_id == participant_id && row.status == status)
            .cloned()
            .collect()
    }

    /// Total row count, for the demo output.
    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }
}

impl Projection for ParticipantSlotsView {
    type Event = ParticipantSlotEvent;

    fn name(&self) -> &str {
        "participant-slots"
    }

    async fn apply_event(&self, event: &ParticipantSlotEvent) -> ProjectionResult<()> {
        let mut rows = self.rows.write().await;
        match event {
            ParticipantSlotEvent::MarkedAvailable {
                slot_id,
                participant_id,
                participant_type,
            } => {
                rows.insert(
                    (slot_id.clone(), participant_id.clone()),
                    SlotRow {
                        slot_id: slot_id.clone(),
                        participant_id: participant_id.clone(),
                        participant_type: *participant_type,
                        booking_id: String::new(),
                        status: RowStatus::Available,
                    },
                );
            }
            ParticipantSlotEvent::Booked {
                slot_id,
                participant_id,
                participant_type,
                booking_id,
            } => {
                rows.insert(
                    (slot_id.clone(), participant_id.clone()),
                    SlotRow {
                        slot_id: slot_id.clone(),
                        participant_id: participant_id.clone(),
                        participant_type: *participant_type,
                        booking_id: booking_id.as_str().to_string(),
                        status: RowStatus::Booked,
                    },
                );
            }
            ParticipantSlotEvent::UnmarkedAvailable {
                slot_id,
                participant_id,
                ..
            }
            | ParticipantSlotEvent::Canceled {
                slot_id,
                participant_id,
                ..
            } => {
                rows.remove(&(slot_id.clone(), participant_id.clone()));
            }
        }
        Ok(())
    }

    async fn rebuild(&self) -> ProjectionResult<()> {
        self.rows.write().await.clear();
        Ok(())
    }
}

/// Feeds the view from the `participant-slot-events` topic.
pub struct ViewUpdater {
    view: Arc<ParticipantSlotsView>,
}

impl ViewUpdater {
    /// Create an updater for the given view.
    #[must_use]
    pub fn new(view: Arc<ParticipantSlotsView>) -> Self {
        Self { view }
    }
}

#[async_trait]
impl EventHandler for ViewUpdater {
    async fn handle(&self, event: &SerializedEvent) -> Result<(), HandlerError> {
        let event: ParticipantSlotEvent =
            event.decode().map_err(|error| HandlerError::Decode {
                event_type: event.event_type.clone(),
                reason: error.to_string(),
            })?;

        self.view
            .apply_event(&event)
            .await
            .map_err(|error| HandlerError::Downstream(error.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Panics: Test will fail if the view errors
mod tests {
    use super::*;
    use crate::types::BookingId;

    const SLOT: &str = "2025-08-08-09";

    fn marked(participant_id: &str, participant_type: ParticipantType) -> ParticipantSlotEvent {
        ParticipantSlotEvent::MarkedAvailable {
            slot_id: SLOT.to_string(),
            participant_id: participant_id.to_string(),
            participant_type,
        }
    }

    #[tokio::test]
    async fn marked_upserts_available_row_with_empty_booking_id() {
        let view = ParticipantSlotsView::new();
        view.apply_event(&marked("anna", ParticipantType::Student))
            .await
            .expect("apply should succeed");

        let rows = view.slots_by_participant("anna").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, RowStatus::Available);
        assert_eq!(rows[0].booking_id, "");
    }

    #[tokio::test]
    async fn booked_overwrites_available_row() {
        let view = ParticipantSlotsView::new();
        view.apply_event(&marked("anna", ParticipantType::Student))
            .await
            .expect("apply should succeed");
        view.apply_event(&ParticipantSlotEvent::Booked {
            slot_id: SLOT.to_string(),
            participant_id: "anna".to_string(),
            participant_type: ParticipantType::Student,
            booking_id: BookingId::from("newBooking"),
        })
        .await
        .expect("apply should succeed");

        let rows = view.slots_by_participant("anna").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, RowStatus::Booked);
        assert_eq!(rows[0].booking_id, "newBooking");
    }

    #[tokio::test]
    async fn unmarked_and_canceled_delete_the_row() {
        let view = ParticipantSlotsView::new();
        view.apply_event(&marked("anna", ParticipantType::Student))
            .await
            .expect("apply should succeed");
        view.apply_event(&ParticipantSlotEvent::UnmarkedAvailable {
            slot_id: SLOT.to_string(),
            participant_id: "anna".to_string(),
            participant_type: ParticipantType::Student,
        })
        .await
        .expect("apply should succeed");

        assert!(view.slots_by_participant("anna").await.is_empty());
    }

    #[tokio::test]
    async fn queries_filter_by_participant_and_status() {
        let view = ParticipantSlotsView::new();
        view.apply_event(&marked("anna", ParticipantType::Student))
            .await
            .expect("apply should succeed");
        view.apply_event(&ParticipantSlotEvent::MarkedAvailable {
            slot_id: "2025-08-08-10".to_string(),
            participant_id: "anna".to_string(),
            participant_type: ParticipantType::Student,
        })
        .await
        .expect("apply should succeed");
        view.apply_event(&ParticipantSlotEvent::Booked {
            slot_id: "2025-08-08-10".to_string(),
            participant_id: "anna".to_string(),
            participant_type: ParticipantType::Student,
            booking_id: BookingId::from("newBooking"),
        })
        .await
        .expect("apply should succeed");

        assert_eq!(view.slots_by_participant("anna").await.len(), 2);
        assert_eq!(
            view.slots_by_participant_and_status("anna", RowStatus::Available)
                .await
                .len(),
            1
        );
        assert_eq!(
            view.slots_by_participant_and_status("anna", RowStatus::Booked)
                .await
                .len(),
            1
        );
        assert!(view.slots_by_participant("fiona").await.is_empty());
    }

    #[tokio::test]
    async fn rebuild_clears_all_rows() {
        let view = ParticipantSlotsView::new();
        view.apply_event(&marked("anna", ParticipantType::Student))
            .await
            .expect("apply should succeed");
        view.rebuild().await.expect("apply should succeed");
        assert_eq!(view.row_count().await, 0);
    }
}
