//! Domain types for flight school timeslot booking.
//!
//! A reservation pairs one student, one instructor, and one aircraft for a
//! single timeslot. The types here are plain values; the state machines
//! live in [`crate::slot`] and [`crate::participant_slot`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// The role a participant plays in a reservation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantType {
    /// A student pilot.
    Student,
    /// A flight instructor.
    Instructor,
    /// An aircraft.
    Aircraft,
}

impl fmt::Display for ParticipantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Instructor => write!(f, "instructor"),
            Self::Aircraft => write!(f, "aircraft"),
        }
    }
}

/// A participant: an opaque id plus its role.
///
/// Immutable value; equality is by (id, type). Participant ids are assumed
/// globally unique across roles, which is why derived keys omit the role.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// Opaque participant identifier.
    pub id: String,
    /// The participant's role.
    pub participant_type: ParticipantType,
}

impl Participant {
    /// Create a participant.
    #[must_use]
    pub fn new(id: impl Into<String>, participant_type: ParticipantType) -> Self {
        Self {
            id: id.into(),
            participant_type,
        }
    }

    /// Shorthand for a student participant.
    #[must_use]
    pub fn student(id: impl Into<String>) -> Self {
        Self::new(id, ParticipantType::Student)
    }

    /// Shorthand for an instructor participant.
    #[must_use]
    pub fn instructor(id: impl Into<String>) -> Self {
        Self::new(id, ParticipantType::Instructor)
    }

    /// Shorthand for an aircraft participant.
    #[must_use]
    pub fn aircraft(id: impl Into<String>) -> Self {
        Self::new(id, ParticipantType::Aircraft)
    }
}

/// Identifier grouping the three booking entries of one reservation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(String);

impl BookingId {
    /// Create a booking id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BookingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One participant's membership in a reservation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Booking {
    /// The booked participant.
    pub participant: Participant,
    /// The reservation this entry belongs to.
    pub booking_id: BookingId,
}

/// Authoritative state of one timeslot.
///
/// Invariants maintained by the slot entity's event application:
/// - a participant in any booking is not simultaneously in `available`
///   (booking consumes availability)
/// - entries for one booking id come as a complete student/instructor/
///   aircraft triple or not at all
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Timeslot {
    /// Participants currently offering this slot.
    pub available: HashSet<Participant>,
    /// Booking entries, one per (participant, booking id).
    pub bookings: HashSet<Booking>,
}

impl Timeslot {
    /// Whether a participant with this id is marked available.
    ///
    /// Checked by id only: the caller supplies the role-to-id mapping, and
    /// ids are globally unique across roles.
    #[must_use]
    pub fn is_available(&self, id: &str) -> bool {
        self.available.iter().any(|p| p.id == id)
    }

    /// Whether a reservation for these three ids can be made right now.
    #[must_use]
    pub fn is_bookable(&self, student_id: &str, instructor_id: &str, aircraft_id: &str) -> bool {
        self.is_available(student_id)
            && self.is_available(instructor_id)
            && self.is_available(aircraft_id)
    }

    /// All booking entries for one booking id (expected: 0 or 3).
    #[must_use]
    pub fn bookings_for(&self, booking_id: &BookingId) -> Vec<&Booking> {
        self.bookings
            .iter()
            .filter(|b| &b.booking_id == booking_id)
            .collect()
    }
}
