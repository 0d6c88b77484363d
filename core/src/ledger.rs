//! Ticket inventory and holdings ledger.
//!
//! The ledger tracks, per event, the minted supply of each ticket class and
//! the quantity of each class held by each buyer. All operations take
//! parallel batches of class ids and quantities and settle atomically: the
//! whole batch is validated against a scratch plan first, and stored state
//! is only touched once every line has passed. Duplicate class ids within a
//! batch are merged, so purchase and refund emit one record per class
//! touched.
//!
//! The ledger knows nothing about roles, payments, or event lifecycle; the
//! marketplace enforces those before delegating here.

use crate::constants::MAX_BATCH_CLASSES;
use crate::error::{MarketError, Result};
use crate::types::{AccountId, ClassId, EventId, Money, PurchaseRecord, RefundRecord, TicketClass};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inventory and holdings for all events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketLedger {
    /// Ticket classes per event
    classes: HashMap<EventId, HashMap<ClassId, TicketClass>>,
    /// Class ids per event in creation order, for stable listings
    created_order: HashMap<EventId, Vec<ClassId>>,
    /// Quantity of one class held by one buyer
    holdings: HashMap<(AccountId, EventId, ClassId), u32>,
}

/// Validates the common shape rules for a batch call.
fn check_shape(class_ids: &[ClassId], quantities: &[u32]) -> Result<()> {
    if class_ids.is_empty() {
        return Err(MarketError::InvalidInput {
            reason: "batch must contain at least one entry".to_string(),
        });
    }
    if class_ids.len() > MAX_BATCH_CLASSES {
        return Err(MarketError::InvalidInput {
            reason: format!("batch exceeds {MAX_BATCH_CLASSES} entries"),
        });
    }
    if quantities.len() != class_ids.len() {
        return Err(MarketError::InputMismatch {
            expected: class_ids.len(),
            actual: quantities.len(),
        });
    }
    if quantities.contains(&0) {
        return Err(MarketError::InvalidInput {
            reason: "quantity must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Merges duplicate class ids, preserving first-touch order.
fn aggregate_lines(class_ids: &[ClassId], quantities: &[u32]) -> Result<Vec<(ClassId, u32)>> {
    let mut lines: Vec<(ClassId, u32)> = Vec::with_capacity(class_ids.len());
    for (class_id, quantity) in class_ids.iter().zip(quantities) {
        match lines.iter_mut().find(|(id, _)| id == class_id) {
            Some((_, total)) => {
                *total = total
                    .checked_add(*quantity)
                    .ok_or(MarketError::ArithmeticOverflow)?;
            }
            None => lines.push((*class_id, *quantity)),
        }
    }
    Ok(lines)
}

impl TicketLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch-creates ticket classes for an event.
    ///
    /// Each line mints `quantity` tickets of `class_id` at `price`. A line
    /// naming a class that already exists tops up its minted supply and
    /// replaces its price. The batch is atomic: on any error no class is
    /// created or changed.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InputMismatch`] if the arrays differ in
    /// length, [`MarketError::InvalidInput`] for an empty or oversized batch
    /// or a zero quantity, and [`MarketError::ArithmeticOverflow`] if a
    /// minted count would overflow.
    pub fn create_classes(
        &mut self,
        event_id: EventId,
        class_ids: &[ClassId],
        quantities: &[u32],
        prices: &[Money],
    ) -> Result<()> {
        check_shape(class_ids, quantities)?;
        if prices.len() != class_ids.len() {
            return Err(MarketError::InputMismatch {
                expected: class_ids.len(),
                actual: prices.len(),
            });
        }

        // Merge duplicates: quantities accumulate, the last price wins.
        let mut lines: Vec<(ClassId, u32, Money)> = Vec::with_capacity(class_ids.len());
        for ((class_id, quantity), price) in class_ids.iter().zip(quantities).zip(prices) {
            match lines.iter_mut().find(|(id, _, _)| id == class_id) {
                Some((_, total, line_price)) => {
                    *total = total
                        .checked_add(*quantity)
                        .ok_or(MarketError::ArithmeticOverflow)?;
                    *line_price = *price;
                }
                None => lines.push((*class_id, *quantity, *price)),
            }
        }

        if let Some(event_classes) = self.classes.get(&event_id) {
            for (class_id, quantity, _) in &lines {
                if let Some(existing) = event_classes.get(class_id) {
                    existing
                        .minted
                        .checked_add(*quantity)
                        .ok_or(MarketError::ArithmeticOverflow)?;
                }
            }
        }

        let event_classes = self.classes.entry(event_id).or_default();
        let order = self.created_order.entry(event_id).or_default();
        for (class_id, quantity, price) in lines {
            let class = event_classes.entry(class_id).or_insert_with(|| {
                order.push(class_id);
                TicketClass::new(price)
            });
            class.minted += quantity;
            class.price = price;
        }
        Ok(())
    }

    /// Computes the total price of a batch without touching any state.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::TicketClassNotFound`] for an unknown class,
    /// shape errors as in [`Self::create_classes`], and
    /// [`MarketError::ArithmeticOverflow`] if the total overflows.
    pub fn quote(
        &self,
        event_id: EventId,
        class_ids: &[ClassId],
        quantities: &[u32],
    ) -> Result<Money> {
        check_shape(class_ids, quantities)?;
        let mut total = Money::zero();
        for (class_id, quantity) in class_ids.iter().zip(quantities) {
            let class = self
                .class(event_id, *class_id)
                .ok_or(MarketError::TicketClassNotFound {
                    class_id: *class_id,
                })?;
            let line_total = class
                .price
                .checked_multiply(*quantity)
                .ok_or(MarketError::ArithmeticOverflow)?;
            total = total
                .checked_add(line_total)
                .ok_or(MarketError::ArithmeticOverflow)?;
        }
        Ok(total)
    }

    /// Settles a batch purchase for `buyer`.
    ///
    /// Validates every line against current supply, then increments sold
    /// counts and the buyer's holdings and returns the charged total with
    /// one [`PurchaseRecord`] per class touched.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InsufficientSupply`] if any line exceeds the
    /// unsold remainder of its class, [`MarketError::TicketClassNotFound`]
    /// for an unknown class, shape errors as in [`Self::create_classes`],
    /// and [`MarketError::ArithmeticOverflow`] on counter or price overflow.
    /// On any error no inventory changes.
    pub fn purchase(
        &mut self,
        event_id: EventId,
        class_ids: &[ClassId],
        quantities: &[u32],
        buyer: AccountId,
        at: DateTime<Utc>,
    ) -> Result<(Money, Vec<PurchaseRecord>)> {
        check_shape(class_ids, quantities)?;
        let lines = aggregate_lines(class_ids, quantities)?;

        let mut total = Money::zero();
        let mut plan: Vec<(ClassId, u32, Money, Money)> = Vec::with_capacity(lines.len());
        for (class_id, quantity) in lines {
            let class =
                self.class(event_id, class_id)
                    .ok_or(MarketError::TicketClassNotFound { class_id })?;
            let new_sold = class
                .sold
                .checked_add(quantity)
                .ok_or(MarketError::ArithmeticOverflow)?;
            if new_sold > class.minted {
                return Err(MarketError::InsufficientSupply {
                    class_id,
                    requested: quantity,
                    available: class.available(),
                });
            }
            let held = self.balance_of(event_id, &buyer, class_id);
            held.checked_add(quantity)
                .ok_or(MarketError::ArithmeticOverflow)?;
            let line_total = class
                .price
                .checked_multiply(quantity)
                .ok_or(MarketError::ArithmeticOverflow)?;
            total = total
                .checked_add(line_total)
                .ok_or(MarketError::ArithmeticOverflow)?;
            plan.push((class_id, quantity, class.price, line_total));
        }

        let mut records = Vec::with_capacity(plan.len());
        for (class_id, quantity, unit_price, line_total) in plan {
            if let Some(class) = self.class_mut(event_id, class_id) {
                class.sold += quantity;
            }
            *self
                .holdings
                .entry((buyer, event_id, class_id))
                .or_insert(0) += quantity;
            records.push(PurchaseRecord {
                event_id,
                class_id,
                buyer,
                quantity,
                unit_price,
                line_total,
                at,
            });
        }
        Ok((total, records))
    }

    /// Settles a batch refund for `buyer`.
    ///
    /// Validates that the buyer holds every ticket being returned, then
    /// decrements sold counts and holdings and returns the gross refund
    /// value with one [`RefundRecord`] per class touched.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Underflow`] if any line exceeds the buyer's
    /// holding or the class's sold count, [`MarketError::TicketClassNotFound`]
    /// for an unknown class, and shape errors as in
    /// [`Self::create_classes`]. On any error no inventory changes.
    pub fn refund(
        &mut self,
        event_id: EventId,
        class_ids: &[ClassId],
        quantities: &[u32],
        buyer: AccountId,
        at: DateTime<Utc>,
    ) -> Result<(Money, Vec<RefundRecord>)> {
        check_shape(class_ids, quantities)?;
        let lines = aggregate_lines(class_ids, quantities)?;

        let mut total = Money::zero();
        let mut plan: Vec<(ClassId, u32, Money, Money)> = Vec::with_capacity(lines.len());
        for (class_id, quantity) in lines {
            let class =
                self.class(event_id, class_id)
                    .ok_or(MarketError::TicketClassNotFound { class_id })?;
            if quantity > class.sold {
                return Err(MarketError::Underflow);
            }
            if quantity > self.balance_of(event_id, &buyer, class_id) {
                return Err(MarketError::Underflow);
            }
            let line_total = class
                .price
                .checked_multiply(quantity)
                .ok_or(MarketError::ArithmeticOverflow)?;
            total = total
                .checked_add(line_total)
                .ok_or(MarketError::ArithmeticOverflow)?;
            plan.push((class_id, quantity, class.price, line_total));
        }

        let mut records = Vec::with_capacity(plan.len());
        for (class_id, quantity, unit_price, line_total) in plan {
            if let Some(class) = self.class_mut(event_id, class_id) {
                class.sold -= quantity;
            }
            if let Some(held) = self.holdings.get_mut(&(buyer, event_id, class_id)) {
                *held -= quantity;
            }
            records.push(RefundRecord {
                event_id,
                class_id,
                buyer,
                quantity,
                unit_price,
                line_total,
                at,
            });
        }
        Ok((total, records))
    }

    /// Reinstates inventory from refund records whose settlement failed
    /// downstream.
    pub(crate) fn rollback_refund(&mut self, event_id: EventId, records: &[RefundRecord]) {
        for record in records {
            if let Some(class) = self.class_mut(event_id, record.class_id) {
                class.sold += record.quantity;
            }
            *self
                .holdings
                .entry((record.buyer, event_id, record.class_id))
                .or_insert(0) += record.quantity;
        }
    }

    /// Quantity of one class held by one buyer. Zero for unknown keys.
    #[must_use]
    pub fn balance_of(&self, event_id: EventId, account: &AccountId, class_id: ClassId) -> u32 {
        self.holdings
            .get(&(*account, event_id, class_id))
            .copied()
            .unwrap_or(0)
    }

    /// Looks up one ticket class.
    #[must_use]
    pub fn class(&self, event_id: EventId, class_id: ClassId) -> Option<&TicketClass> {
        self.classes.get(&event_id)?.get(&class_id)
    }

    fn class_mut(&mut self, event_id: EventId, class_id: ClassId) -> Option<&mut TicketClass> {
        self.classes.get_mut(&event_id)?.get_mut(&class_id)
    }

    /// All ticket classes of an event in creation order.
    #[must_use]
    pub fn classes(&self, event_id: EventId) -> Vec<(ClassId, TicketClass)> {
        let Some(order) = self.created_order.get(&event_id) else {
            return Vec::new();
        };
        order
            .iter()
            .filter_map(|class_id| {
                self.class(event_id, *class_id)
                    .map(|class| (*class_id, *class))
            })
            .collect()
    }

    /// Minted supply of one class. Zero for unknown classes.
    #[must_use]
    pub fn class_supply(&self, event_id: EventId, class_id: ClassId) -> u32 {
        self.class(event_id, class_id).map_or(0, |class| class.minted)
    }

    /// Sold count of one class. Zero for unknown classes.
    #[must_use]
    pub fn class_sold(&self, event_id: EventId, class_id: ClassId) -> u32 {
        self.class(event_id, class_id).map_or(0, |class| class.sold)
    }

    /// Total minted supply across all classes of an event.
    #[must_use]
    pub fn total_supply(&self, event_id: EventId) -> u64 {
        self.classes.get(&event_id).map_or(0, |classes| {
            classes.values().map(|class| u64::from(class.minted)).sum()
        })
    }

    /// Total sold count across all classes of an event.
    #[must_use]
    pub fn total_sold(&self, event_id: EventId) -> u64 {
        self.classes.get(&event_id).map_or(0, |classes| {
            classes.values().map(|class| u64::from(class.sold)).sum()
        })
    }
}
