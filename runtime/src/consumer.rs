//! Event consumer: subscribes to a bus topic and feeds events to a handler.
//!
//! A consumer runs as a background task. It subscribes to its topic,
//! delivers each event to an [`EventHandler`], and acknowledges the
//! delivery only after the handler succeeded. A failing handler leaves the
//! delivery unacknowledged, so the bus hands it out again — at-least-once
//! processing with per-topic order preserved.
//!
//! Transport failures (a lost subscription) are handled by resubscribing
//! with backoff. Shutdown is signalled through a broadcast channel shared
//! by all consumers.
//!
//! # Example
//!
//! ```ignore
//! let (shutdown_tx, _) = broadcast::channel(1);
//!
//! let consumer = EventConsumer::builder()
//!     .name("slot-to-participant")
//!     .topic("booking-slot-events")
//!     .event_bus(Arc::clone(&bus))
//!     .handler(Arc::new(relay))
//!     .shutdown(shutdown_tx.subscribe())
//!     .build()?;
//!
//! let handle = consumer.spawn();
//! ```

use crate::retry::RetryPolicy;
use async_trait::async_trait;
use slotbook_core::event::SerializedEvent;
use slotbook_core::event_bus::{EventBus, Subscription as _};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Errors returned by event handlers.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The event could not be decoded into the handler's event type.
    #[error("Failed to decode event '{event_type}': {reason}")]
    Decode {
        /// The event type that failed to decode.
        event_type: String,
        /// The decode failure.
        reason: String,
    },

    /// A downstream operation failed; the delivery will be retried.
    #[error("Downstream operation failed: {0}")]
    Downstream(String),
}

/// Processes one event from the bus.
///
/// Implementations must be idempotent: the consumer acknowledges only after
/// `handle` succeeds, so a crash between handling and acknowledging causes
/// redelivery of an already-processed event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one delivered event.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] to leave the delivery unacknowledged; the
    /// consumer retries it with backoff.
    async fn handle(&self, event: &SerializedEvent) -> Result<(), HandlerError>;
}

/// Errors from consumer construction.
#[derive(Error, Debug)]
pub enum ConsumerBuildError {
    /// A required builder field was not set.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// A background consumer for one topic.
pub struct EventConsumer {
    name: String,
    topic: String,
    event_bus: Arc<dyn EventBus>,
    handler: Arc<dyn EventHandler>,
    shutdown: broadcast::Receiver<()>,
    retry_policy: RetryPolicy,
}

impl EventConsumer {
    /// Start building a consumer.
    #[must_use]
    pub fn builder() -> EventConsumerBuilder {
        EventConsumerBuilder::default()
    }

    /// Spawn the consumer loop onto the runtime.
    ///
    /// The task runs until the shutdown channel fires or the topic closes.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// The consumer loop: subscribe, process, resubscribe on failure.
    async fn run(mut self) {
        info!(consumer = %self.name, topic = %self.topic, "Consumer starting");

        let mut reconnect_attempt = 0;
        loop {
            let mut subscription = match self.event_bus.subscribe(&self.topic).await {
                Ok(subscription) => {
                    reconnect_attempt = 0;
                    subscription
                }
                Err(error) => {
                    let delay = self.retry_policy.delay_for_attempt(reconnect_attempt);
                    warn!(
                        consumer = %self.name,
                        topic = %self.topic,
                        error = %error,
                        delay_ms = delay.as_millis() as u64,
                        "Subscription failed, retrying"
                    );
                    reconnect_attempt += 1;
                    tokio::select! {
                        _ = self.shutdown.recv() => break,
                        () = tokio::time::sleep(delay) => continue,
                    }
                }
            };

            let mut handler_attempt = 0;
            loop {
                let delivery = tokio::select! {
                    _ = self.shutdown.recv() => {
                        info!(consumer = %self.name, "Shutdown signal received");
                        return;
                    }
                    next = subscription.next() => next,
                };

                match delivery {
                    Some(Ok(delivery)) => {
                        match self.handler.handle(&delivery.event).await {
                            Ok(()) => {
                                handler_attempt = 0;
                                if let Err(error) = subscription.ack(delivery.offset).await {
                                    warn!(
                                        consumer = %self.name,
                                        offset = delivery.offset,
                                        error = %error,
                                        "Acknowledgement failed"
                                    );
                                }
                            }
                            Err(error) => {
                                // No ack: the bus redelivers this event on
                                // the next iteration, after the backoff.
                                let delay =
                                    self.retry_policy.delay_for_attempt(handler_attempt);
                                warn!(
                                    consumer = %self.name,
                                    topic = %self.topic,
                                    event_type = %delivery.event.event_type,
                                    offset = delivery.offset,
                                    attempt = handler_attempt,
                                    error = %error,
                                    "Handler failed, delivery will be retried"
                                );
                                handler_attempt += 1;
                                tokio::select! {
                                    _ = self.shutdown.recv() => return,
                                    () = tokio::time::sleep(delay) => {}
                                }
                            }
                        }
                    }
                    Some(Err(error)) => {
                        warn!(
                            consumer = %self.name,
                            topic = %self.topic,
                            error = %error,
                            "Subscription error, reconnecting"
                        );
                        break;
                    }
                    None => {
                        debug!(consumer = %self.name, topic = %self.topic, "Topic closed");
                        return;
                    }
                }
            }
        }

        info!(consumer = %self.name, "Consumer stopped");
    }
}

/// Builder for [`EventConsumer`].
#[derive(Default)]
pub struct EventConsumerBuilder {
    name: Option<String>,
    topic: Option<String>,
    event_bus: Option<Arc<dyn EventBus>>,
    handler: Option<Arc<dyn EventHandler>>,
    shutdown: Option<broadcast::Receiver<()>>,
    retry_policy: Option<RetryPolicy>,
}

impl EventConsumerBuilder {
    /// Set the consumer name, used in logs.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the topic to consume.
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the event bus to subscribe on.
    #[must_use]
    pub fn event_bus(mut self, event_bus: Arc<dyn EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Set the handler deliveries are fed to.
    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Set the shutdown receiver.
    #[must_use]
    pub fn shutdown(mut self, shutdown: broadcast::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Override the default retry policy.
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Build the consumer.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerBuildError::MissingField`] if a required field is
    /// unset.
    pub fn build(self) -> Result<EventConsumer, ConsumerBuildError> {
        Ok(EventConsumer {
            name: self
                .name
                .ok_or(ConsumerBuildError::MissingField("name"))?,
            topic: self
                .topic
                .ok_or(ConsumerBuildError::MissingField("topic"))?,
            event_bus: self
                .event_bus
                .ok_or(ConsumerBuildError::MissingField("event_bus"))?,
            handler: self
                .handler
                .ok_or(ConsumerBuildError::MissingField("handler"))?,
            shutdown: self
                .shutdown
                .ok_or(ConsumerBuildError::MissingField("shutdown"))?,
            retry_policy: self.retry_policy.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopHandler;

    #[async_trait]
    impl EventHandler for NoopHandler {
        async fn handle(&self, _event: &SerializedEvent) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[test]
    fn builder_requires_all_fields() {
        let result = EventConsumer::builder()
            .name("incomplete")
            .handler(Arc::new(NoopHandler))
            .build();
        assert!(matches!(
            result,
            Err(ConsumerBuildError::MissingField("topic"))
        ));
    }
}
