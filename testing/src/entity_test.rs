//! Ergonomic testing utilities for entity decision logic.
//!
//! This module provides a fluent API for testing entities with readable
//! Given-When-Then syntax, exercising `handle` and `apply` directly without
//! any runtime or storage.

#![allow(clippy::module_name_repetitions)] // EntityTest is the natural name
#![allow(clippy::missing_panics_doc)] // Assertions panic, that's the point

use slotbook_core::entity::Entity;
use std::fmt::Debug;

/// Fluent API for testing entities with Given-When-Then syntax.
///
/// `given_events` replays history into the state through `apply`;
/// `when` runs `handle` and, on success, folds the emitted events into the
/// state so calls can be chained the way commands arrive in production.
///
/// # Example
///
/// ```ignore
/// use slotbook_testing::EntityTest;
///
/// EntityTest::<BookingSlot>::new()
///     .given_events([marked(&anna)])
///     .when(SlotCommand::UnmarkAvailable { participant: anna.clone() })
///     .then_events(&[unmarked(&anna)])
///     .then_state(|slot| {
///         assert!(slot.available.is_empty());
///     });
/// ```
pub struct EntityTest<E: Entity> {
    state: E::State,
    outcome: Option<Result<Vec<E::Event>, E::Error>>,
}

impl<E: Entity> Default for EntityTest<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityTest<E> {
    /// Start a test from the entity's empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: E::empty_state(),
            outcome: None,
        }
    }

    /// Replay prior events into the state (Given).
    #[must_use]
    pub fn given_events(mut self, events: impl IntoIterator<Item = E::Event>) -> Self {
        for event in events {
            E::apply(&mut self.state, &event);
        }
        self
    }

    /// Handle a command (When).
    ///
    /// On success the emitted events are folded into the state, so further
    /// `when` calls observe them.
    #[must_use]
    pub fn when(mut self, command: E::Command) -> Self {
        let outcome = E::handle(&self.state, command).map(|events| {
            for event in &events {
                E::apply(&mut self.state, event);
            }
            events.into_vec()
        });
        self.outcome = Some(outcome);
        self
    }

    /// Assert the last command emitted exactly these events, in order (Then).
    #[allow(clippy::panic)] // Test assertion
    #[allow(clippy::expect_used)] // Test assertion
    pub fn then_events(self, expected: &[E::Event]) -> Self
    where
        E::Event: PartialEq + Debug,
        E::Error: Debug,
    {
        match self.outcome.as_ref().expect("call when() first") {
            Ok(events) => assert_eq!(events.as_slice(), expected),
            Err(error) => panic!("expected events, command was rejected: {error:?}"),
        }
        self
    }

    /// Assert the last command emitted this many events, regardless of
    /// order or content (Then).
    #[allow(clippy::panic)] // Test assertion
    #[allow(clippy::expect_used)] // Test assertion
    pub fn then_event_count(self, expected: usize) -> Self
    where
        E::Error: Debug,
    {
        match self.outcome.as_ref().expect("call when() first") {
            Ok(events) => assert_eq!(events.len(), expected),
            Err(error) => panic!("expected events, command was rejected: {error:?}"),
        }
        self
    }

    /// Assert the last command succeeded with zero events (Then).
    pub fn then_no_events(self) -> Self
    where
        E::Error: Debug,
    {
        self.then_event_count(0)
    }

    /// Assert the last command was rejected, and inspect the error (Then).
    #[allow(clippy::panic)] // Test assertion
    #[allow(clippy::expect_used)] // Test assertion
    pub fn then_rejected<F>(self, assertion: F) -> Self
    where
        F: FnOnce(&E::Error),
        E::Event: Debug,
    {
        match self.outcome.as_ref().expect("call when() first") {
            Ok(events) => panic!("expected rejection, command emitted: {events:?}"),
            Err(error) => assertion(error),
        }
        self
    }

    /// Assert on the current state (Then).
    pub fn then_state<F>(self, assertion: F) -> Self
    where
        F: FnOnce(&E::State),
    {
        assertion(&self.state);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use slotbook_core::entity::EmittedEvents;
    use slotbook_core::event::Event;

    #[derive(Clone, Debug, Default)]
    struct Register {
        value: Option<String>,
    }

    enum RegisterCommand {
        Set(String),
        Clear,
    }

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    enum RegisterEvent {
        Written(String),
        Cleared,
    }

    impl Event for RegisterEvent {
        fn event_type(&self) -> &'static str {
            match self {
                RegisterEvent::Written(_) => "RegisterEvent.Written.v1",
                RegisterEvent::Cleared => "RegisterEvent.Cleared.v1",
            }
        }
    }

    struct RegisterEntity;

    impl Entity for RegisterEntity {
        const ENTITY_TYPE: &'static str = "register";
        type State = Register;
        type Command = RegisterCommand;
        type Event = RegisterEvent;
        type Error = String;

        fn empty_state() -> Register {
            Register::default()
        }

        fn handle(
            state: &Register,
            command: RegisterCommand,
        ) -> Result<EmittedEvents<RegisterEvent>, String> {
            match command {
                RegisterCommand::Set(value) => {
                    Ok(smallvec::smallvec![RegisterEvent::Written(value)])
                }
                RegisterCommand::Clear if state.value.is_none() => {
                    Err("nothing to clear".to_string())
                }
                RegisterCommand::Clear => Ok(smallvec::smallvec![RegisterEvent::Cleared]),
            }
        }

        fn apply(state: &mut Register, event: &RegisterEvent) {
            match event {
                RegisterEvent::Written(value) => state.value = Some(value.clone()),
                RegisterEvent::Cleared => state.value = None,
            }
        }
    }

    #[test]
    fn when_folds_events_into_state() {
        EntityTest::<RegisterEntity>::new()
            .when(RegisterCommand::Set("anna".to_string()))
            .then_events(&[RegisterEvent::Written("anna".to_string())])
            .when(RegisterCommand::Clear)
            .then_events(&[RegisterEvent::Cleared])
            .then_state(|state| assert!(state.value.is_none()));
    }

    #[test]
    fn given_events_replays_history() {
        EntityTest::<RegisterEntity>::new()
            .given_events([RegisterEvent::Written("anna".to_string())])
            .then_state(|state| assert_eq!(state.value.as_deref(), Some("anna")));
    }

    #[test]
    fn rejection_is_observable() {
        EntityTest::<RegisterEntity>::new()
            .when(RegisterCommand::Clear)
            .then_rejected(|error| assert_eq!(error, "nothing to clear"));
    }
}
