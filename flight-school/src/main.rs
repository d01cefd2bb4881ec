//! Demo binary: runs the booking scenarios end to end on in-memory
//! infrastructure.
//!
//! Wires both entity stores, the relay, and the read-view, then walks
//! through mark/unmark, a full three-party booking, a rejected booking, and
//! a cancellation, printing the slot state and the view contents as the
//! events propagate.

use flight_school::{
    BookingId, BookingSlot, Config, Participant, ParticipantSlot, ParticipantSlotsView,
    SlotCommand, SlotToParticipantRelay, ViewUpdater,
};
use slotbook_core::clock::SystemClock;
use slotbook_core::event_bus::EventBus;
use slotbook_core::event_store::EventStore;
use slotbook_core::stream::StreamId;
use slotbook_runtime::EntityStore;
use slotbook_runtime::consumer::EventConsumer;
use slotbook_testing::{InMemoryEventBus, InMemoryEventStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let event_store: Arc<dyn EventStore> = Arc::new(InMemoryEventStore::new());
    let event_bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
    let clock = Arc::new(SystemClock);

    let slots: Arc<EntityStore<BookingSlot>> = Arc::new(EntityStore::new(
        Arc::clone(&event_store),
        Arc::clone(&event_bus),
        clock.clone(),
    ));
    let participants: Arc<EntityStore<ParticipantSlot>> = Arc::new(EntityStore::new(
        Arc::clone(&event_store),
        Arc::clone(&event_bus),
        clock,
    ));
    let view = Arc::new(ParticipantSlotsView::new());

    let (shutdown_tx, _) = broadcast::channel(1);

    let relay_handle = EventConsumer::builder()
        .name(config.relay.name.clone())
        .topic(config.slot_topic.clone())
        .event_bus(Arc::clone(&event_bus))
        .handler(Arc::new(SlotToParticipantRelay::new(Arc::clone(
            &participants,
        ))))
        .shutdown(shutdown_tx.subscribe())
        .retry_policy(config.relay.retry_policy())
        .build()?
        .spawn();

    let view_handle = EventConsumer::builder()
        .name(config.view.name.clone())
        .topic(config.participant_topic.clone())
        .event_bus(Arc::clone(&event_bus))
        .handler(Arc::new(ViewUpdater::new(Arc::clone(&view))))
        .shutdown(shutdown_tx.subscribe())
        .retry_policy(config.view.retry_policy())
        .build()?
        .spawn();

    println!("=== Flight School: Timeslot Booking ===\n");

    let slot_id = StreamId::new("2025-08-08-09");
    let anna = Participant::student("anna");
    let fiona = Participant::instructor("fiona");
    let gb = Participant::aircraft("gb");

    println!("Anna marks herself available for {slot_id}...");
    slots
        .execute(
            &slot_id,
            SlotCommand::MarkAvailable {
                slot_id: slot_id.as_str().to_string(),
                participant: anna.clone(),
            },
        )
        .await?;
    let state = slots.state(&slot_id).await?;
    println!("  available: {:?}", ids(&state.available));

    println!("\nAnna withdraws...");
    slots
        .execute(
            &slot_id,
            SlotCommand::UnmarkAvailable {
                slot_id: slot_id.as_str().to_string(),
                participant: anna.clone(),
            },
        )
        .await?;
    let state = slots.state(&slot_id).await?;
    println!("  available: {:?}", ids(&state.available));

    println!("\nAnna, Fiona and GB all mark themselves available...");
    for participant in [anna, fiona, gb] {
        slots
            .execute(
                &slot_id,
                SlotCommand::MarkAvailable {
                    slot_id: slot_id.as_str().to_string(),
                    participant,
                },
            )
            .await?;
    }

    println!("Booking the slot as \"newBooking\"...");
    slots
        .execute(
            &slot_id,
            SlotCommand::BookReservation {
                slot_id: slot_id.as_str().to_string(),
                booking_id: BookingId::from("newBooking"),
                student_id: "anna".to_string(),
                instructor_id: "fiona".to_string(),
                aircraft_id: "gb".to_string(),
            },
        )
        .await?;
    let state = slots.state(&slot_id).await?;
    println!("  available: {:?}", ids(&state.available));
    println!("  bookings:  {} entries", state.bookings.len());

    println!("\nBooking again with the same ids (no longer available)...");
    let rejected = slots
        .execute(
            &slot_id,
            SlotCommand::BookReservation {
                slot_id: slot_id.as_str().to_string(),
                booking_id: BookingId::from("secondBooking"),
                student_id: "anna".to_string(),
                instructor_id: "fiona".to_string(),
                aircraft_id: "gb".to_string(),
            },
        )
        .await;
    match rejected {
        Err(error) => println!("  rejected: {error}"),
        Ok(_) => println!("  unexpectedly accepted"),
    }

    // Let the relay and the view catch up before querying.
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("\nAnna's slots in the read-view:");
    for row in view.slots_by_participant("anna").await {
        println!(
            "  {} {} status={:?} booking={:?}",
            row.slot_id, row.participant_id, row.status, row.booking_id
        );
    }

    println!("\nCanceling \"newBooking\"...");
    slots
        .execute(
            &slot_id,
            SlotCommand::CancelBooking {
                slot_id: slot_id.as_str().to_string(),
                booking_id: BookingId::from("newBooking"),
            },
        )
        .await?;
    let state = slots.state(&slot_id).await?;
    println!("  available: {:?}", ids(&state.available));
    println!("  bookings:  {} entries", state.bookings.len());

    tokio::time::sleep(Duration::from_millis(200)).await;
    println!(
        "\nRead-view rows after cancellation: {}",
        view.row_count().await
    );

    shutdown_tx.send(()).ok();
    relay_handle.await?;
    view_handle.await?;

    Ok(())
}

fn ids(participants: &std::collections::HashSet<Participant>) -> Vec<&str> {
    let mut ids: Vec<&str> = participants.iter().map(|p| p.id.as_str()).collect();
    ids.sort_unstable();
    ids
}
