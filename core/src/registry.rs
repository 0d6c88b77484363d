//! Event catalog and lifecycle.
//!
//! The registry assigns monotonically increasing event ids starting at 1 and
//! never reuses them, including for cancelled events. Cancellation is a
//! one-way flag; cancelled events stay listed so refunds can find them.

use crate::constants::{MAX_DESCRIPTION_LEN, MAX_LOCATION_LEN, MAX_NAME_LEN};
use crate::error::{MarketError, Result};
use crate::types::{AccountId, Event, EventDetails, EventId, Schedule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// All listed events, keyed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRegistry {
    events: BTreeMap<EventId, Event>,
    by_organizer: HashMap<AccountId, Vec<EventId>>,
    next_id: u64,
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates descriptive fields and schedule ordering.
fn validate_details(details: &EventDetails) -> Result<()> {
    if details.name.trim().is_empty() {
        return Err(MarketError::InvalidInput {
            reason: "event name must not be empty".to_string(),
        });
    }
    if details.name.chars().count() > MAX_NAME_LEN {
        return Err(MarketError::InvalidInput {
            reason: format!("event name exceeds {MAX_NAME_LEN} characters"),
        });
    }
    if details.description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(MarketError::InvalidInput {
            reason: format!("event description exceeds {MAX_DESCRIPTION_LEN} characters"),
        });
    }
    if details.location.chars().count() > MAX_LOCATION_LEN {
        return Err(MarketError::InvalidInput {
            reason: format!("event location exceeds {MAX_LOCATION_LEN} characters"),
        });
    }
    if details.end_time <= details.start_time {
        return Err(MarketError::InvalidStartTime);
    }
    Ok(())
}

impl EventRegistry {
    /// Creates an empty registry. The first event gets id 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: BTreeMap::new(),
            by_organizer: HashMap::new(),
            next_id: 1,
        }
    }

    /// Lists a new event and returns its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidInput`] if a descriptive field is empty
    /// or over its length limit, and [`MarketError::InvalidStartTime`] if
    /// the end time is not after the start time.
    pub fn create(
        &mut self,
        organizer: AccountId,
        details: EventDetails,
        now: DateTime<Utc>,
    ) -> Result<EventId> {
        validate_details(&details)?;
        let id = EventId::new(self.next_id);
        self.next_id += 1;
        self.events.insert(id, Event::new(id, organizer, details, now));
        self.by_organizer.entry(organizer).or_default().push(id);
        Ok(id)
    }

    /// Replaces an event's descriptive and scheduling fields.
    ///
    /// The new start time must be strictly in the future at the moment of
    /// the call. Identity fields (id, organizer, sold count, creation time)
    /// are preserved.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::EventDoesNotExist`] for an unknown id,
    /// [`MarketError::EventCancelled`] for a cancelled event, validation
    /// errors as in [`Self::create`], and
    /// [`MarketError::EventAlreadyStarted`] if the new start time is not
    /// after `now`.
    pub fn update(
        &mut self,
        event_id: EventId,
        details: EventDetails,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let event = self
            .events
            .get_mut(&event_id)
            .ok_or(MarketError::EventDoesNotExist { event_id })?;
        if event.cancelled {
            return Err(MarketError::EventCancelled { event_id });
        }
        validate_details(&details)?;
        if details.start_time <= now {
            return Err(MarketError::EventAlreadyStarted);
        }

        event.name = details.name;
        event.description = details.description;
        event.location = details.location;
        event.date = details.date;
        event.start_time = details.start_time;
        event.end_time = details.end_time;
        event.virtual_event = details.virtual_event;
        event.private_event = details.private_event;
        Ok(())
    }

    /// Moves an event to a later slot, leaving descriptive text untouched.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::EventDoesNotExist`] for an unknown id,
    /// [`MarketError::EventCancelled`] for a cancelled event, and
    /// [`MarketError::InvalidStartTime`] if the new start does not move
    /// strictly forward or the new end is not after the new start.
    pub fn reschedule(&mut self, event_id: EventId, schedule: Schedule) -> Result<()> {
        let event = self
            .events
            .get_mut(&event_id)
            .ok_or(MarketError::EventDoesNotExist { event_id })?;
        if event.cancelled {
            return Err(MarketError::EventCancelled { event_id });
        }
        if schedule.start_time <= event.start_time {
            return Err(MarketError::InvalidStartTime);
        }
        if schedule.end_time <= schedule.start_time {
            return Err(MarketError::InvalidStartTime);
        }

        event.date = schedule.date;
        event.start_time = schedule.start_time;
        event.end_time = schedule.end_time;
        event.virtual_event = schedule.virtual_event;
        event.private_event = schedule.private_event;
        Ok(())
    }

    /// Cancels an event. Cancellation is permanent.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::EventDoesNotExist`] for an unknown id and
    /// [`MarketError::EventCancelled`] if the event is already cancelled.
    pub fn cancel(&mut self, event_id: EventId) -> Result<()> {
        let event = self
            .events
            .get_mut(&event_id)
            .ok_or(MarketError::EventDoesNotExist { event_id })?;
        if event.cancelled {
            return Err(MarketError::EventCancelled { event_id });
        }
        event.cancelled = true;
        Ok(())
    }

    /// Adds to an event's running sold-tickets counter.
    pub(crate) fn add_sold(&mut self, event_id: EventId, quantity: u64) -> Result<()> {
        let event = self
            .events
            .get_mut(&event_id)
            .ok_or(MarketError::EventDoesNotExist { event_id })?;
        event.sold_tickets = event
            .sold_tickets
            .checked_add(quantity)
            .ok_or(MarketError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Subtracts from an event's running sold-tickets counter.
    pub(crate) fn sub_sold(&mut self, event_id: EventId, quantity: u64) -> Result<()> {
        let event = self
            .events
            .get_mut(&event_id)
            .ok_or(MarketError::EventDoesNotExist { event_id })?;
        event.sold_tickets = event
            .sold_tickets
            .checked_sub(quantity)
            .ok_or(MarketError::Underflow)?;
        Ok(())
    }

    /// Looks up one event.
    #[must_use]
    pub fn get(&self, event_id: EventId) -> Option<&Event> {
        self.events.get(&event_id)
    }

    /// Returns `true` if the event exists, cancelled or not.
    #[must_use]
    pub fn exists(&self, event_id: EventId) -> bool {
        self.events.contains_key(&event_id)
    }

    /// All events in ascending id order.
    #[must_use]
    pub fn get_all(&self) -> Vec<&Event> {
        self.events.values().collect()
    }

    /// Events created by one organizer, in creation order.
    #[must_use]
    pub fn by_organizer(&self, organizer: &AccountId) -> Vec<&Event> {
        self.by_organizer.get(organizer).map_or_else(Vec::new, |ids| {
            ids.iter().filter_map(|id| self.events.get(id)).collect()
        })
    }

    /// Number of listed events, including cancelled ones.
    #[must_use]
    pub fn count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn details(start_secs: i64, end_secs: i64) -> EventDetails {
        EventDetails {
            name: "Opening Night".to_string(),
            description: "Season opener".to_string(),
            location: "Grand Theatre".to_string(),
            date: ts(start_secs).date_naive(),
            start_time: ts(start_secs),
            end_time: ts(end_secs),
            virtual_event: false,
            private_event: false,
        }
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let mut registry = EventRegistry::new();
        let organizer = AccountId::new();

        let first = registry.create(organizer, details(2_000, 3_000), ts(1_000)).unwrap();
        let second = registry.create(organizer, details(4_000, 5_000), ts(1_000)).unwrap();

        assert_eq!(first, EventId::new(1));
        assert_eq!(second, EventId::new(2));
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn ids_are_not_reused_after_cancellation() {
        let mut registry = EventRegistry::new();
        let organizer = AccountId::new();

        let first = registry.create(organizer, details(2_000, 3_000), ts(1_000)).unwrap();
        registry.cancel(first).unwrap();
        let second = registry.create(organizer, details(4_000, 5_000), ts(1_000)).unwrap();

        assert_eq!(second, EventId::new(2));
        assert!(registry.get(first).unwrap().cancelled);
    }

    #[test]
    fn create_rejects_empty_name() {
        let mut registry = EventRegistry::new();
        let mut bad = details(2_000, 3_000);
        bad.name = "   ".to_string();

        let err = registry.create(AccountId::new(), bad, ts(1_000)).unwrap_err();
        assert!(matches!(err, MarketError::InvalidInput { .. }));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn create_enforces_field_length_limits() {
        let mut registry = EventRegistry::new();
        let organizer = AccountId::new();

        let mut long_name = details(2_000, 3_000);
        long_name.name = "n".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            registry.create(organizer, long_name, ts(1_000)),
            Err(MarketError::InvalidInput { .. })
        ));

        let mut long_description = details(2_000, 3_000);
        long_description.description = "d".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(matches!(
            registry.create(organizer, long_description, ts(1_000)),
            Err(MarketError::InvalidInput { .. })
        ));

        let mut long_location = details(2_000, 3_000);
        long_location.location = "l".repeat(MAX_LOCATION_LEN + 1);
        assert!(matches!(
            registry.create(organizer, long_location, ts(1_000)),
            Err(MarketError::InvalidInput { .. })
        ));
    }

    #[test]
    fn create_requires_start_before_end() {
        let mut registry = EventRegistry::new();
        let err = registry
            .create(AccountId::new(), details(3_000, 3_000), ts(1_000))
            .unwrap_err();
        assert_eq!(err, MarketError::InvalidStartTime);
    }

    #[test]
    fn update_overwrites_details_and_preserves_identity() {
        let mut registry = EventRegistry::new();
        let organizer = AccountId::new();
        let id = registry.create(organizer, details(2_000, 3_000), ts(1_000)).unwrap();
        registry.add_sold(id, 7).unwrap();

        let mut new_details = details(5_000, 6_000);
        new_details.name = "Encore Night".to_string();
        new_details.virtual_event = true;
        registry.update(id, new_details, ts(1_500)).unwrap();

        let event = registry.get(id).unwrap();
        assert_eq!(event.name, "Encore Night");
        assert!(event.virtual_event);
        assert_eq!(event.start_time, ts(5_000));
        assert_eq!(event.sold_tickets, 7);
        assert_eq!(event.organizer, organizer);
        assert_eq!(event.created_at, ts(1_000));
    }

    #[test]
    fn update_rejects_unknown_event() {
        let mut registry = EventRegistry::new();
        let err = registry
            .update(EventId::new(9), details(5_000, 6_000), ts(1_000))
            .unwrap_err();
        assert_eq!(
            err,
            MarketError::EventDoesNotExist {
                event_id: EventId::new(9)
            }
        );
    }

    #[test]
    fn update_rejects_cancelled_event() {
        let mut registry = EventRegistry::new();
        let id = registry
            .create(AccountId::new(), details(2_000, 3_000), ts(1_000))
            .unwrap();
        registry.cancel(id).unwrap();

        let err = registry.update(id, details(5_000, 6_000), ts(1_500)).unwrap_err();
        assert_eq!(err, MarketError::EventCancelled { event_id: id });
    }

    #[test]
    fn update_requires_future_start() {
        let mut registry = EventRegistry::new();
        let id = registry
            .create(AccountId::new(), details(2_000, 3_000), ts(1_000))
            .unwrap();

        // A start at or before the current time is rejected.
        let err = registry.update(id, details(2_000, 3_000), ts(2_000)).unwrap_err();
        assert_eq!(err, MarketError::EventAlreadyStarted);

        registry.update(id, details(2_001, 3_000), ts(2_000)).unwrap();
        assert_eq!(registry.get(id).unwrap().start_time, ts(2_001));
    }

    #[test]
    fn reschedule_moves_start_strictly_forward() {
        let mut registry = EventRegistry::new();
        let id = registry
            .create(AccountId::new(), details(2_000, 3_000), ts(1_000))
            .unwrap();

        let earlier = Schedule {
            date: ts(1_500).date_naive(),
            start_time: ts(1_500),
            end_time: ts(3_000),
            virtual_event: false,
            private_event: false,
        };
        assert_eq!(
            registry.reschedule(id, earlier).unwrap_err(),
            MarketError::InvalidStartTime
        );

        let same = Schedule { start_time: ts(2_000), ..earlier };
        assert_eq!(
            registry.reschedule(id, same).unwrap_err(),
            MarketError::InvalidStartTime
        );

        let later = Schedule {
            date: ts(4_000).date_naive(),
            start_time: ts(4_000),
            end_time: ts(5_000),
            virtual_event: true,
            private_event: false,
        };
        registry.reschedule(id, later).unwrap();

        let event = registry.get(id).unwrap();
        assert_eq!(event.start_time, ts(4_000));
        assert_eq!(event.end_time, ts(5_000));
        assert!(event.virtual_event);
        // Descriptive fields stay as they were.
        assert_eq!(event.name, "Opening Night");
    }

    #[test]
    fn reschedule_requires_end_after_start() {
        let mut registry = EventRegistry::new();
        let id = registry
            .create(AccountId::new(), details(2_000, 3_000), ts(1_000))
            .unwrap();

        let inverted = Schedule {
            date: ts(4_000).date_naive(),
            start_time: ts(4_000),
            end_time: ts(4_000),
            virtual_event: false,
            private_event: false,
        };
        assert_eq!(
            registry.reschedule(id, inverted).unwrap_err(),
            MarketError::InvalidStartTime
        );
    }

    #[test]
    fn cancel_is_permanent_and_single_shot() {
        let mut registry = EventRegistry::new();
        let id = registry
            .create(AccountId::new(), details(2_000, 3_000), ts(1_000))
            .unwrap();

        registry.cancel(id).unwrap();
        assert!(registry.get(id).unwrap().cancelled);

        let err = registry.cancel(id).unwrap_err();
        assert_eq!(err, MarketError::EventCancelled { event_id: id });
    }

    #[test]
    fn by_organizer_lists_in_creation_order() {
        let mut registry = EventRegistry::new();
        let alice = AccountId::new();
        let bob = AccountId::new();

        let first = registry.create(alice, details(2_000, 3_000), ts(1_000)).unwrap();
        registry.create(bob, details(2_000, 3_000), ts(1_000)).unwrap();
        let third = registry.create(alice, details(4_000, 5_000), ts(1_000)).unwrap();

        let listed: Vec<EventId> = registry.by_organizer(&alice).iter().map(|e| e.id).collect();
        assert_eq!(listed, vec![first, third]);
        assert!(registry.by_organizer(&AccountId::new()).is_empty());
    }

    #[test]
    fn sold_counter_moves_both_ways() {
        let mut registry = EventRegistry::new();
        let id = registry
            .create(AccountId::new(), details(2_000, 3_000), ts(1_000))
            .unwrap();

        registry.add_sold(id, 5).unwrap();
        registry.sub_sold(id, 2).unwrap();
        assert_eq!(registry.get(id).unwrap().sold_tickets, 3);

        assert_eq!(registry.sub_sold(id, 4).unwrap_err(), MarketError::Underflow);
        assert_eq!(registry.get(id).unwrap().sold_tickets, 3);
    }
}
