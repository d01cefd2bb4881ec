//! Configuration management for the flight school application.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use slotbook_runtime::retry::RetryPolicy;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Topic carrying slot aggregate events.
    pub slot_topic: String,
    /// Topic carrying participant-slot aggregate events.
    pub participant_topic: String,
    /// Relay consumer configuration.
    pub relay: ConsumerConfig,
    /// Read-view consumer configuration.
    pub view: ConsumerConfig,
}

/// Consumer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Consumer name, used in logs.
    pub name: String,
    /// Maximum handler/subscription retries before giving up on backoff
    /// growth (delivery itself is never dropped).
    pub max_retries: usize,
    /// Initial backoff delay in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_delay_ms: u64,
}

impl ConsumerConfig {
    /// The retry policy this configuration describes.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(self.max_retries)
            .initial_delay(Duration::from_millis(self.initial_delay_ms))
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .build()
    }
}

impl Config {
    /// Load configuration from environment variables, with defaults for
    /// everything.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            slot_topic: env::var("SLOT_TOPIC")
                .unwrap_or_else(|_| "booking-slot-events".to_string()),
            participant_topic: env::var("PARTICIPANT_TOPIC")
                .unwrap_or_else(|_| "participant-slot-events".to_string()),
            relay: ConsumerConfig {
                name: env::var("RELAY_CONSUMER_NAME")
                    .unwrap_or_else(|_| "slot-to-participant".to_string()),
                max_retries: env::var("RELAY_MAX_RETRIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
                initial_delay_ms: env::var("RELAY_INITIAL_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(100),
                max_delay_ms: env::var("RELAY_MAX_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5_000),
            },
            view: ConsumerConfig {
                name: env::var("VIEW_CONSUMER_NAME")
                    .unwrap_or_else(|_| "participant-slots-view".to_string()),
                max_retries: env::var("VIEW_MAX_RETRIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
                initial_delay_ms: env::var("VIEW_INITIAL_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(100),
                max_delay_ms: env::var("VIEW_MAX_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5_000),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_topic_naming_convention() {
        let config = Config::from_env();
        assert_eq!(config.slot_topic, "booking-slot-events");
        assert_eq!(config.participant_topic, "participant-slot-events");
    }

    #[test]
    fn consumer_config_builds_retry_policy() {
        let consumer = ConsumerConfig {
            name: "test".to_string(),
            max_retries: 3,
            initial_delay_ms: 50,
            max_delay_ms: 1_000,
        };
        let policy = consumer.retry_policy();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(50));
        assert_eq!(policy.max_delay, Duration::from_millis(1_000));
    }
}
