//! In-memory event store and event bus.
//!
//! Faithful implementations of the storage and messaging contracts, backed
//! by process memory. They enforce the same semantics production backends
//! would: the store rejects stale-version appends, and the bus redelivers
//! unacknowledged heads in order. Tests and the demo binary run on these.

use slotbook_core::event::SerializedEvent;
use slotbook_core::event_bus::{Delivery, EventBus, EventBusError, Subscription};
use slotbook_core::event_store::{EventStore, EventStoreError};
use slotbook_core::stream::{StreamId, Version};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Notify, RwLock};

/// In-memory append-only event store with optimistic concurrency.
///
/// Streams are keyed by [`StreamId`]; each stream is an ordered vector of
/// serialized events. The stream's version is its event count.
#[derive(Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<StreamId, Vec<SerializedEvent>>>,
}

impl InMemoryEventStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events currently in one stream, for test inspection.
    pub async fn stream_events(&self, stream_id: &StreamId) -> Vec<SerializedEvent> {
        self.streams
            .read()
            .await
            .get(stream_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of streams that have at least one event.
    pub async fn stream_count(&self) -> usize {
        self.streams
            .read()
            .await
            .values()
            .filter(|events| !events.is_empty())
            .count()
    }
}

impl EventStore for InMemoryEventStore {
    fn append_events(
        &self,
        stream_id: StreamId,
        expected_version: Option<Version>,
        events: Vec<SerializedEvent>,
    ) -> Pin<Box<dyn Future<Output = Result<Version, EventStoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut streams = self.streams.write().await;
            let stream = streams.entry(stream_id.clone()).or_default();
            let actual = Version::new(stream.len() as u64);

            if let Some(expected) = expected_version {
                if expected != actual {
                    return Err(EventStoreError::ConcurrencyConflict {
                        stream_id,
                        expected,
                        actual,
                    });
                }
            }

            stream.extend(events);
            Ok(Version::new(stream.len() as u64))
        })
    }

    fn load_events(
        &self,
        stream_id: StreamId,
        from_version: Option<Version>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SerializedEvent>, EventStoreError>> + Send + '_>>
    {
        Box::pin(async move {
            let streams = self.streams.read().await;
            let Some(stream) = streams.get(&stream_id) else {
                return Ok(Vec::new());
            };

            // Versions number events from 1; from_version selects an
            // inclusive suffix.
            let skip = from_version.map_or(0, |v| v.value().saturating_sub(1) as usize);
            Ok(stream.iter().skip(skip).cloned().collect())
        })
    }
}

struct TopicState {
    log: Mutex<Vec<SerializedEvent>>,
    notify: Notify,
    closed: AtomicBool,
}

impl TopicState {
    fn new() -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }
}

/// In-memory event bus with per-topic logs and cursor subscriptions.
///
/// Every subscription sees the topic from its beginning and tracks its own
/// cursor. A delivery is redelivered until acknowledged; the cursor never
/// advances past the unacknowledged head, so topic order is preserved even
/// under handler retries.
#[derive(Default)]
pub struct InMemoryEventBus {
    topics: Mutex<HashMap<String, Arc<TopicState>>>,
}

impl InMemoryEventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn topic(&self, name: &str) -> Arc<TopicState> {
        let mut topics = self.topics.lock().await;
        Arc::clone(
            topics
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(TopicState::new())),
        )
    }

    /// All events published to one topic, for test inspection.
    pub async fn published(&self, topic: &str) -> Vec<SerializedEvent> {
        let state = self.topic(topic).await;
        let log = state.log.lock().await;
        log.clone()
    }

    /// Close a topic: subscriptions drain the remaining log, then see `None`.
    pub async fn close_topic(&self, topic: &str) {
        let state = self.topic(topic).await;
        state.closed.store(true, Ordering::Release);
        state.notify.notify_waiters();
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let event = event.clone();
        Box::pin(async move {
            let state = self.topic(&topic).await;
            if state.closed.load(Ordering::Acquire) {
                return Err(EventBusError::PublishFailed {
                    topic,
                    reason: "topic is closed".to_string(),
                });
            }
            state.log.lock().await.push(event);
            state.notify.notify_waiters();
            Ok(())
        })
    }

    fn subscribe(
        &self,
        topic: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn Subscription>, EventBusError>> + Send + '_>>
    {
        let topic = topic.to_string();
        Box::pin(async move {
            let state = self.topic(&topic).await;
            Ok(Box::new(InMemorySubscription {
                state,
                cursor: 0,
                pending: None,
            }) as Box<dyn Subscription>)
        })
    }
}

/// Cursor over one topic's log with manual acknowledgement.
struct InMemorySubscription {
    state: Arc<TopicState>,
    /// Offset of the next unprocessed event.
    cursor: u64,
    /// Offset delivered but not yet acknowledged; redelivered by `next()`.
    pending: Option<u64>,
}

impl Subscription for InMemorySubscription {
    fn next(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Option<Result<Delivery, EventBusError>>> + Send + '_>> {
        Box::pin(async move {
            loop {
                // Register for wakeups before checking the log so a publish
                // between the check and the await is not missed.
                let notified = self.state.notify.notified();
                {
                    let log = self.state.log.lock().await;
                    let offset = self.pending.unwrap_or(self.cursor);
                    if let Some(event) = log.get(offset as usize) {
                        self.pending = Some(offset);
                        return Some(Ok(Delivery {
                            event: event.clone(),
                            offset,
                        }));
                    }
                    if self.state.closed.load(Ordering::Acquire) {
                        return None;
                    }
                }
                notified.await;
            }
        })
    }

    fn ack(
        &mut self,
        offset: u64,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        Box::pin(async move {
            if self.pending == Some(offset) {
                self.pending = None;
                self.cursor = offset + 1;
                Ok(())
            } else {
                Err(EventBusError::InvalidAck { offset })
            }
        })
    }
}
