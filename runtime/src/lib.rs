//! # Slotbook Runtime
//!
//! Execution layer for the Slotbook architecture.
//!
//! This crate provides:
//!
//! - [`EntityStore`]: the runtime coordinator for one entity type. It keeps
//!   a per-instance, single-writer actor for every stream id: commands
//!   against the same instance are processed strictly one at a time, which
//!   is what makes a check-then-act decision (such as booking a slot only
//!   when all participants are available) atomic per instance. Different
//!   instances proceed concurrently with no shared lock.
//! - [`consumer::EventConsumer`]: an at-least-once event bus consumer with
//!   manual acknowledgement, reconnect, and backoff.
//! - [`retry::RetryPolicy`]: exponential backoff configuration shared by
//!   consumers.
//!
//! ## Command Flow
//!
//! ```text
//! execute(stream_id, command)
//!     │  lock instance (serializes writers)
//!     ▼
//! hydrate lazily: load_events + replay over empty_state
//!     │
//!     ▼
//! Entity::handle(state, command) ──Err──► rejected, nothing persisted
//!     │ Ok(events)
//!     ▼
//! append_events(expected = cached version)   (store is source of truth)
//!     │
//!     ▼
//! Entity::apply for each event (cached state)
//!     │
//!     ▼
//! publish to "{ENTITY_TYPE}-events"          (best effort, logged on error)
//! ```

pub mod consumer;
pub mod retry;

use slotbook_core::clock::Clock;
use slotbook_core::entity::{Entity, replay};
use slotbook_core::event::{EventError, SerializedEvent};
use slotbook_core::event_bus::{EventBus, topic_for_entity};
use slotbook_core::event_store::{EventStore, EventStoreError};
use slotbook_core::stream::{StreamId, Version};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors surfaced by [`EntityStore`] operations.
///
/// `Rejected` carries the entity's domain error: the command was refused,
/// nothing was persisted, and state is unchanged. The remaining variants are
/// infrastructure failures.
#[derive(Error, Debug)]
pub enum EntityStoreError<D>
where
    D: std::fmt::Debug + std::fmt::Display,
{
    /// The entity rejected the command; no events, no state change.
    #[error("Command rejected: {0}")]
    Rejected(D),

    /// The event store failed.
    #[error(transparent)]
    Store(#[from] EventStoreError),

    /// An event could not be serialized or deserialized.
    #[error(transparent)]
    Event(#[from] EventError),
}

/// Cached materialization of one entity instance.
struct Instance<S> {
    state: S,
    version: Version,
    hydrated: bool,
}

/// Runtime coordinator for one entity type.
///
/// The store owns a map of stream id to instance, each instance guarded by
/// its own `Mutex`. Holding the instance lock across
/// hydrate → decide → append → apply is the single-writer guarantee; the
/// optimistic `expected_version` on append is the backstop in case two
/// stores for the same streams share one event store.
///
/// # Type Parameters
///
/// - `E`: the [`Entity`] this store coordinates
///
/// # Example
///
/// ```ignore
/// let slots: EntityStore<BookingSlot> =
///     EntityStore::new(event_store, event_bus, Arc::new(SystemClock));
///
/// slots
///     .execute(&StreamId::new("2025-08-08-09"), SlotCommand::MarkAvailable {
///         participant: anna,
///     })
///     .await?;
/// ```
pub struct EntityStore<E: Entity> {
    event_store: Arc<dyn EventStore>,
    event_bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
    topic: String,
    instances: RwLock<HashMap<StreamId, Arc<Mutex<Instance<E::State>>>>>,
    _entity: PhantomData<E>,
}

impl<E: Entity> EntityStore<E> {
    /// Create a new store backed by the given event store and bus.
    #[must_use]
    pub fn new(
        event_store: Arc<dyn EventStore>,
        event_bus: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            event_store,
            event_bus,
            clock,
            topic: topic_for_entity(E::ENTITY_TYPE),
            instances: RwLock::new(HashMap::new()),
            _entity: PhantomData,
        }
    }

    /// The bus topic this store publishes to (`"{ENTITY_TYPE}-events"`).
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Execute a command against one instance, serialized with all other
    /// commands for the same stream id.
    ///
    /// On success the emitted events have been appended to the event store,
    /// folded into the cached state, and published to the bus. The returned
    /// events are the ones the command emitted (possibly zero for no-op
    /// commands).
    ///
    /// # Errors
    ///
    /// - [`EntityStoreError::Rejected`]: the entity refused the command;
    ///   nothing was persisted and state is unchanged
    /// - [`EntityStoreError::Store`] / [`EntityStoreError::Event`]:
    ///   infrastructure failure
    pub async fn execute(
        &self,
        stream_id: &StreamId,
        command: E::Command,
    ) -> Result<Vec<E::Event>, EntityStoreError<E::Error>>
    where
        E::Error: std::fmt::Debug + std::fmt::Display,
    {
        let instance = self.instance(stream_id).await;
        let mut guard = instance.lock().await;
        self.hydrate(stream_id, &mut guard).await?;

        let events = E::handle(&guard.state, command).map_err(EntityStoreError::Rejected)?;
        if events.is_empty() {
            debug!(
                entity_type = E::ENTITY_TYPE,
                stream_id = %stream_id,
                "Command accepted with no events"
            );
            return Ok(Vec::new());
        }

        let correlation_id = Uuid::new_v4();
        let serialized = events
            .iter()
            .map(|event| {
                SerializedEvent::from_event(event, Some(self.metadata(stream_id, correlation_id)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let new_version = self
            .event_store
            .append_events(stream_id.clone(), Some(guard.version), serialized.clone())
            .await?;

        for event in &events {
            E::apply(&mut guard.state, event);
        }
        guard.version = new_version;

        debug!(
            entity_type = E::ENTITY_TYPE,
            stream_id = %stream_id,
            events = events.len(),
            version = %new_version,
            "Events persisted"
        );

        // The log is the source of truth; a publish failure must not unwind
        // the append. A dropped publish means downstream views miss the
        // event until they are rebuilt from the store.
        for event in &serialized {
            if let Err(error) = self.event_bus.publish(&self.topic, event).await {
                warn!(
                    entity_type = E::ENTITY_TYPE,
                    stream_id = %stream_id,
                    topic = %self.topic,
                    error = %error,
                    "Failed to publish persisted event"
                );
            }
        }

        Ok(events.into_vec())
    }

    /// Read-only snapshot of one instance's current state.
    ///
    /// Hydrates the instance from its event log if this is the first touch.
    /// An unknown stream yields the entity's empty state — instances are
    /// created lazily and never explicitly deleted.
    ///
    /// # Errors
    ///
    /// Returns [`EntityStoreError::Store`] or [`EntityStoreError::Event`]
    /// if hydration fails.
    pub async fn state(
        &self,
        stream_id: &StreamId,
    ) -> Result<E::State, EntityStoreError<E::Error>>
    where
        E::Error: std::fmt::Debug + std::fmt::Display,
    {
        let instance = self.instance(stream_id).await;
        let mut guard = instance.lock().await;
        self.hydrate(stream_id, &mut guard).await?;
        Ok(guard.state.clone())
    }

    /// Get or lazily create the instance entry for a stream id.
    async fn instance(&self, stream_id: &StreamId) -> Arc<Mutex<Instance<E::State>>> {
        if let Some(instance) = self.instances.read().await.get(stream_id) {
            return Arc::clone(instance);
        }

        let mut instances = self.instances.write().await;
        Arc::clone(instances.entry(stream_id.clone()).or_insert_with(|| {
            Arc::new(Mutex::new(Instance {
                state: E::empty_state(),
                version: Version::INITIAL,
                hydrated: false,
            }))
        }))
    }

    /// Replay the stream's log into the cached state on first touch.
    ///
    /// Must be called with the instance lock held.
    async fn hydrate(
        &self,
        stream_id: &StreamId,
        instance: &mut Instance<E::State>,
    ) -> Result<(), EntityStoreError<E::Error>>
    where
        E::Error: std::fmt::Debug + std::fmt::Display,
    {
        if instance.hydrated {
            return Ok(());
        }

        let stored = self
            .event_store
            .load_events(stream_id.clone(), None)
            .await?;
        let events = stored
            .iter()
            .map(SerializedEvent::decode::<E::Event>)
            .collect::<Result<Vec<_>, _>>()?;

        instance.state = replay::<E, _>(&events);
        instance.version = Version::new(events.len() as u64);
        instance.hydrated = true;

        if !events.is_empty() {
            debug!(
                entity_type = E::ENTITY_TYPE,
                stream_id = %stream_id,
                events = events.len(),
                "Hydrated instance from event log"
            );
        }

        Ok(())
    }

    fn metadata(&self, stream_id: &StreamId, correlation_id: Uuid) -> serde_json::Value {
        serde_json::json!({
            "entity_type": E::ENTITY_TYPE,
            "stream_id": stream_id.as_str(),
            "correlation_id": correlation_id,
            "recorded_at": self.clock.now().to_rfc3339(),
        })
    }
}
