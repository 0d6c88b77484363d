//! Core domain types for the ticketing marketplace.
//!
//! Identifiers are newtypes so that an event id can never be passed where a
//! class id is expected. [`Money`] is a checked fixed-point amount in the
//! smallest currency unit; all arithmetic on it is explicit and fallible.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an account (organizer, buyer, or platform).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Creates a new random account identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an account identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically assigned identifier for an event.
///
/// Identifiers start at 1 and are never reused, including after cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(u64);

impl EventId {
    /// Wraps a raw event identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a ticket class within an event.
///
/// Class identifiers are chosen by the organizer and are scoped to one event;
/// class 1 of event A and class 1 of event B are unrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(u64);

impl ClassId {
    /// Wraps a raw class identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money
// ============================================================================

/// Money amount in the smallest currency unit (cents).
///
/// All arithmetic is checked; operations that could wrap return `None`
/// instead of silently corrupting balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a money amount from cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// The zero amount.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts, returning `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Subtracts an amount, returning `None` if the result would be negative.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Computes `percent` percent of the amount, rounding down.
    ///
    /// Returns `None` if `percent` exceeds 100 or the intermediate product
    /// overflows.
    #[must_use]
    pub const fn checked_percentage(self, percent: u8) -> Option<Self> {
        if percent > 100 {
            return None;
        }
        match self.0.checked_mul(percent as u64) {
            Some(product) => Some(Self(product / 100)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Event Details & Schedule
// ============================================================================

/// Full descriptive payload for creating or updating an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    /// Human-readable event name
    pub name: String,
    /// Longer description of the event
    pub description: String,
    /// Venue or address; informational only for virtual events
    pub location: String,
    /// Calendar date of the event
    pub date: NaiveDate,
    /// Moment the event starts
    pub start_time: DateTime<Utc>,
    /// Moment the event ends
    pub end_time: DateTime<Utc>,
    /// Whether the event is held online
    pub virtual_event: bool,
    /// Whether the event is invitation-only
    pub private_event: bool,
}

/// Scheduling fields for rescheduling an existing event.
///
/// Carries everything from [`EventDetails`] except the descriptive text,
/// which a reschedule leaves untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// New calendar date
    pub date: NaiveDate,
    /// New start moment
    pub start_time: DateTime<Utc>,
    /// New end moment
    pub end_time: DateTime<Utc>,
    /// Whether the event is held online
    pub virtual_event: bool,
    /// Whether the event is invitation-only
    pub private_event: bool,
}

// ============================================================================
// Events
// ============================================================================

/// A listed event and its lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Registry-assigned identifier
    pub id: EventId,
    /// Account that created the event and owns it
    pub organizer: AccountId,
    /// Human-readable event name
    pub name: String,
    /// Longer description of the event
    pub description: String,
    /// Venue or address
    pub location: String,
    /// Calendar date of the event
    pub date: NaiveDate,
    /// Moment the event starts
    pub start_time: DateTime<Utc>,
    /// Moment the event ends
    pub end_time: DateTime<Utc>,
    /// Whether the event is held online
    pub virtual_event: bool,
    /// Whether the event is invitation-only
    pub private_event: bool,
    /// Set once by cancellation; never cleared
    pub cancelled: bool,
    /// Running count of sold (and not refunded) tickets across all classes
    pub sold_tickets: u64,
    /// When the event was listed
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Creates a new active event from its details.
    #[must_use]
    pub fn new(
        id: EventId,
        organizer: AccountId,
        details: EventDetails,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            organizer,
            name: details.name,
            description: details.description,
            location: details.location,
            date: details.date,
            start_time: details.start_time,
            end_time: details.end_time,
            virtual_event: details.virtual_event,
            private_event: details.private_event,
            cancelled: false,
            sold_tickets: 0,
            created_at,
        }
    }

    /// Returns `true` if the event's start time is at or before `now`.
    #[must_use]
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now
    }

    /// Returns `true` if the event's end time is strictly before `now`.
    #[must_use]
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_time < now
    }
}

// ============================================================================
// Ticket Classes
// ============================================================================

/// Inventory and price for one ticket class of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketClass {
    /// Price per ticket
    pub price: Money,
    /// Total quantity ever minted for this class
    pub minted: u32,
    /// Quantity currently sold and not refunded
    pub sold: u32,
}

impl TicketClass {
    /// Creates an empty class at the given price.
    #[must_use]
    pub const fn new(price: Money) -> Self {
        Self {
            price,
            minted: 0,
            sold: 0,
        }
    }

    /// Quantity still available for sale.
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.minted - self.sold
    }

    /// Returns `true` if at least `quantity` tickets remain unsold.
    #[must_use]
    pub const fn has_supply(&self, quantity: u32) -> bool {
        quantity <= self.available()
    }
}

// ============================================================================
// Settlement Records
// ============================================================================

/// One settled purchase line, aggregated per ticket class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Event the tickets belong to
    pub event_id: EventId,
    /// Class that was purchased
    pub class_id: ClassId,
    /// Account that bought the tickets
    pub buyer: AccountId,
    /// Quantity bought in this line
    pub quantity: u32,
    /// Price per ticket at purchase time
    pub unit_price: Money,
    /// Quantity times unit price
    pub line_total: Money,
    /// When the purchase settled
    pub at: DateTime<Utc>,
}

/// One settled refund line, aggregated per ticket class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRecord {
    /// Event the tickets belonged to
    pub event_id: EventId,
    /// Class that was returned
    pub class_id: ClassId,
    /// Account that returned the tickets
    pub buyer: AccountId,
    /// Quantity returned in this line
    pub quantity: u32,
    /// Price per ticket at refund time
    pub unit_price: Money,
    /// Quantity times unit price
    pub line_total: Money,
    /// When the refund settled
    pub at: DateTime<Utc>,
}

// ============================================================================
// Profiles
// ============================================================================

/// Directory profile attached to a registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Name shown on receipts and listings
    pub display_name: String,
    /// Contact address for confirmations
    pub email: String,
}

impl Profile {
    /// Creates a new profile.
    #[must_use]
    pub fn new(display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            email: email.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn money_checked_add_detects_overflow() {
        let max = Money::from_cents(u64::MAX);
        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(500).checked_add(Money::from_cents(50)),
            Some(Money::from_cents(550))
        );
    }

    #[test]
    fn money_checked_sub_stops_at_zero() {
        let small = Money::from_cents(10);
        assert_eq!(small.checked_sub(Money::from_cents(20)), None);
        assert_eq!(
            small.checked_sub(Money::from_cents(10)),
            Some(Money::zero())
        );
    }

    #[test]
    fn money_checked_multiply() {
        assert_eq!(
            Money::from_cents(250).checked_multiply(4),
            Some(Money::from_cents(1000))
        );
        assert_eq!(Money::from_cents(u64::MAX).checked_multiply(2), None);
    }

    #[test]
    fn money_percentage_rounds_down() {
        let amount = Money::from_cents(999);
        assert_eq!(amount.checked_percentage(90), Some(Money::from_cents(899)));
        assert_eq!(amount.checked_percentage(0), Some(Money::zero()));
        assert_eq!(amount.checked_percentage(100), Some(amount));
        assert_eq!(amount.checked_percentage(101), None);
    }

    #[test]
    fn money_display_formats_cents() {
        assert_eq!(Money::from_cents(550).to_string(), "$5.50");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn id_newtypes_display_raw_values() {
        assert_eq!(EventId::new(7).to_string(), "7");
        assert_eq!(ClassId::new(3).value(), 3);
        let account = AccountId::new();
        assert_eq!(account.to_string(), account.as_uuid().to_string());
    }

    #[test]
    fn ticket_class_tracks_availability() {
        let mut class = TicketClass::new(Money::from_cents(100));
        class.minted = 10;
        class.sold = 4;
        assert_eq!(class.available(), 6);
        assert!(class.has_supply(6));
        assert!(!class.has_supply(7));
    }

    #[test]
    fn event_lifecycle_predicates() {
        let start = DateTime::from_timestamp(1_000, 0).unwrap();
        let end = DateTime::from_timestamp(2_000, 0).unwrap();
        let details = EventDetails {
            name: "Concert".to_string(),
            description: "An evening of music".to_string(),
            location: "Main Hall".to_string(),
            date: start.date_naive(),
            start_time: start,
            end_time: end,
            virtual_event: false,
            private_event: false,
        };
        let event = Event::new(
            EventId::new(1),
            AccountId::new(),
            details,
            DateTime::from_timestamp(500, 0).unwrap(),
        );

        let before = DateTime::from_timestamp(999, 0).unwrap();
        let during = DateTime::from_timestamp(1_500, 0).unwrap();
        let after = DateTime::from_timestamp(2_001, 0).unwrap();
        assert!(!event.has_started(before));
        assert!(event.has_started(during));
        assert!(!event.has_ended(during));
        assert!(event.has_ended(after));
    }

    #[test]
    fn event_serializes_round_trip() {
        let start = DateTime::from_timestamp(1_000, 0).unwrap();
        let details = EventDetails {
            name: "Workshop".to_string(),
            description: "Hands-on session".to_string(),
            location: "Room 2".to_string(),
            date: start.date_naive(),
            start_time: start,
            end_time: DateTime::from_timestamp(2_000, 0).unwrap(),
            virtual_event: true,
            private_event: true,
        };
        let event = Event::new(EventId::new(42), AccountId::new(), details, start);

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
