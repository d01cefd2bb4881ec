//! The event-sourced entity contract.
//!
//! An entity is a single-writer consistency boundary: its state is derived
//! solely from its own ordered event log, and commands against one instance
//! are processed strictly one at a time. The contract splits command
//! handling into two pure functions:
//!
//! - [`Entity::handle`] decides: it validates a command against the current
//!   state and returns the events to persist, or a domain error. It never
//!   mutates state.
//! - [`Entity::apply`] evolves: it folds one event into the state. It is the
//!   only place state changes, and it is shared verbatim between live
//!   command handling and replay.
//!
//! Keeping the fold separate from the decision is what makes replay
//! trustworthy: `replay(log) == incremental application`, always.
//!
//! # Example
//!
//! ```ignore
//! impl Entity for BookingSlot {
//!     const ENTITY_TYPE: &'static str = "booking-slot";
//!     type State = Timeslot;
//!     type Command = SlotCommand;
//!     type Event = BookingEvent;
//!     type Error = SlotError;
//!
//!     fn empty_state() -> Timeslot { Timeslot::default() }
//!
//!     fn handle(state: &Timeslot, command: SlotCommand)
//!         -> Result<SmallVec<[BookingEvent; 4]>, SlotError> { /* decide */ }
//!
//!     fn apply(state: &mut Timeslot, event: &BookingEvent) { /* evolve */ }
//! }
//! ```

use crate::event::Event;
use serde::Serialize;
use serde::de::DeserializeOwned;
use smallvec::SmallVec;

/// Events produced by a single command.
///
/// Most commands emit zero or one event; a multi-party booking emits three.
/// Four inline slots keep the common cases off the heap.
pub type EmittedEvents<E> = SmallVec<[E; 4]>;

/// An event-sourced entity: a single-writer consistency boundary whose state
/// is a fold over its own event log.
///
/// # Lifecycle
///
/// Instances are created lazily: the first command against an unknown stream
/// id starts from [`Entity::empty_state`]. Instances are never physically
/// deleted; events accumulate for the lifetime of the stream.
///
/// # Contract
///
/// - `handle` is pure and side-effect free. A rejected command (an `Err`)
///   means zero events and no state change, surfaced synchronously to the
///   caller.
/// - `apply` must be total over all event variants and must tolerate events
///   that are no-ops against the current state (e.g. removing an absent set
///   member), because the log may contain them.
pub trait Entity: Send + Sync + 'static {
    /// Stable identifier for this entity type.
    ///
    /// Also names the event bus topic (`"{ENTITY_TYPE}-events"`) that
    /// carries this entity's events to downstream consumers.
    const ENTITY_TYPE: &'static str;

    /// The state built from this entity's event log.
    type State: Clone + Send + Sync;

    /// Commands accepted by this entity.
    type Command: Send;

    /// Events this entity emits and replays.
    type Event: Event + Serialize + DeserializeOwned + Clone;

    /// Domain error for rejected commands.
    type Error: Send;

    /// The state of a stream with no events.
    fn empty_state() -> Self::State;

    /// Decide: validate `command` against `state` and return the events to
    /// persist.
    ///
    /// # Errors
    ///
    /// Returns the domain error when the command is rejected; the caller
    /// persists nothing and the state is untouched.
    fn handle(
        state: &Self::State,
        command: Self::Command,
    ) -> Result<EmittedEvents<Self::Event>, Self::Error>;

    /// Evolve: fold one event into the state.
    fn apply(state: &mut Self::State, event: &Self::Event);
}

/// Rebuild entity state by folding a sequence of events over the empty
/// state.
///
/// This is the explicit replay fold:
/// `state = events.fold(empty_state(), apply)`. Because it goes through the
/// same [`Entity::apply`] as live command handling, replaying a full log
/// reproduces the exact snapshot that incremental application produced.
pub fn replay<'a, E, I>(events: I) -> E::State
where
    E: Entity,
    E::Event: 'a,
    I: IntoIterator<Item = &'a E::Event>,
{
    let mut state = E::empty_state();
    for event in events {
        E::apply(&mut state, event);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct CounterState {
        value: i64,
    }

    #[derive(Debug)]
    enum CounterCommand {
        Add(i64),
        FailAlways,
    }

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    enum CounterEvent {
        Added(i64),
    }

    impl Event for CounterEvent {
        fn event_type(&self) -> &'static str {
            "CounterEvent.Added.v1"
        }
    }

    struct Counter;

    impl Entity for Counter {
        const ENTITY_TYPE: &'static str = "counter";
        type State = CounterState;
        type Command = CounterCommand;
        type Event = CounterEvent;
        type Error = String;

        fn empty_state() -> CounterState {
            CounterState::default()
        }

        fn handle(
            _state: &CounterState,
            command: CounterCommand,
        ) -> Result<EmittedEvents<CounterEvent>, String> {
            match command {
                CounterCommand::Add(n) => Ok(smallvec::smallvec![CounterEvent::Added(n)]),
                CounterCommand::FailAlways => Err("rejected".to_string()),
            }
        }

        fn apply(state: &mut CounterState, event: &CounterEvent) {
            match event {
                CounterEvent::Added(n) => state.value += n,
            }
        }
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if handle rejects
    fn handle_emits_without_mutating() {
        let state = CounterState::default();
        let events =
            Counter::handle(&state, CounterCommand::Add(5)).expect("command should succeed");
        assert_eq!(events.as_slice(), &[CounterEvent::Added(5)]);
        assert_eq!(state.value, 0);
    }

    #[test]
    fn rejected_command_returns_error() {
        let state = CounterState::default();
        let result = Counter::handle(&state, CounterCommand::FailAlways);
        assert!(result.is_err());
    }

    #[test]
    fn replay_equals_incremental_application() {
        let events = vec![
            CounterEvent::Added(1),
            CounterEvent::Added(2),
            CounterEvent::Added(3),
        ];

        let mut incremental = Counter::empty_state();
        for event in &events {
            Counter::apply(&mut incremental, event);
        }

        let replayed = replay::<Counter, _>(&events);
        assert_eq!(replayed, incremental);
        assert_eq!(replayed.value, 6);
    }
}
