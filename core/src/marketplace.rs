//! Marketplace facade tying registry, ledger, roles, and settlement together.
//!
//! Every mutating operation runs the same guard chain before touching state:
//! the acting account must be registered with the directory, the target
//! event must exist, the required role (if any) must be held, and the
//! event's lifecycle state must allow the operation. Only then is the call
//! delegated to the registry or ledger, and settlement applied.
//!
//! Money from sales is split at purchase time: the configured organizer
//! share accrues to the event's escrow balance and the remainder of the
//! payment becomes platform revenue. Escrow leaves the marketplace in
//! exactly two ways, payout to the owner after the event has ended, or
//! per-ticket refunds after cancellation.
//!
//! A single busy flag serializes mutating calls. The payment gateway is
//! invoked with the flag still held, so a gateway that calls back into the
//! marketplace gets [`MarketError::ReentrantCall`] instead of observing
//! half-settled state. If a transfer fails, the bookkeeping committed just
//! before it is rolled back.

use crate::access_control::{AccessControl, RoleKey, RoleKind};
use crate::config::MarketplaceConfig;
use crate::error::{MarketError, Result};
use crate::ledger::TicketLedger;
use crate::providers::{Clock, Directory, PaymentGateway};
use crate::registry::EventRegistry;
use crate::types::{
    AccountId, ClassId, Event, EventDetails, EventId, Money, Schedule, TicketClass,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// External dependencies of the marketplace.
#[derive(Clone)]
pub struct MarketEnvironment {
    /// Account directory consulted on every mutating call
    pub directory: Arc<dyn Directory>,
    /// Payment rail for payouts and refunds
    pub gateway: Arc<dyn PaymentGateway>,
    /// Time source for scheduling rules
    pub clock: Arc<dyn Clock>,
}

impl MarketEnvironment {
    /// Bundles the marketplace's external dependencies.
    #[must_use]
    pub fn new(
        directory: Arc<dyn Directory>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            gateway,
            clock,
        }
    }
}

/// Everything the marketplace stores.
#[derive(Debug, Clone, Default)]
struct MarketState {
    registry: EventRegistry,
    ledger: TicketLedger,
    access: AccessControl,
    escrow: HashMap<EventId, Money>,
    platform_revenue: Money,
    tickets_owned: HashMap<AccountId, Vec<EventId>>,
}

/// Clears the busy flag when a mutating call finishes, normally or early.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

fn ensure_exists(state: &MarketState, event_id: EventId) -> Result<()> {
    if state.registry.exists(event_id) {
        Ok(())
    } else {
        Err(MarketError::EventDoesNotExist { event_id })
    }
}

fn ensure_active(state: &MarketState, event_id: EventId) -> Result<()> {
    let event = state
        .registry
        .get(event_id)
        .ok_or(MarketError::EventDoesNotExist { event_id })?;
    if event.cancelled {
        return Err(MarketError::EventCancelled { event_id });
    }
    Ok(())
}

fn ensure_role(state: &MarketState, key: RoleKey, account: &AccountId) -> Result<()> {
    if state.access.has_role(key, account) {
        Ok(())
    } else {
        Err(MarketError::Unauthorized { required: key.kind })
    }
}

/// The ticketing marketplace.
///
/// All methods take `&self`; interior state lives behind a mutex and
/// mutating calls are additionally serialized by a busy flag.
pub struct Marketplace {
    config: MarketplaceConfig,
    env: MarketEnvironment,
    state: Mutex<MarketState>,
    busy: AtomicBool,
}

impl Marketplace {
    /// Creates a marketplace with default configuration.
    #[must_use]
    pub fn new(env: MarketEnvironment) -> Self {
        Self::with_config(MarketplaceConfig::default(), env)
    }

    /// Creates a marketplace with explicit configuration.
    #[must_use]
    pub fn with_config(config: MarketplaceConfig, env: MarketEnvironment) -> Self {
        Self {
            config,
            env,
            state: Mutex::new(MarketState::default()),
            busy: AtomicBool::new(false),
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    /// Claims the busy flag for the duration of a mutating call.
    fn enter(&self) -> Result<BusyGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(MarketError::ReentrantCall);
        }
        Ok(BusyGuard { flag: &self.busy })
    }

    fn lock_state(&self) -> MutexGuard<'_, MarketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_registered(&self, account: &AccountId) -> Result<()> {
        if self.env.directory.is_registered(account) {
            Ok(())
        } else {
            Err(MarketError::UnregisteredUser { account: *account })
        }
    }

    // ========================================================================
    // Event lifecycle
    // ========================================================================

    /// Lists a new event and grants its creator the owner and organizer
    /// roles.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::UnregisteredUser`] for an unknown organizer,
    /// [`MarketError::ReentrantCall`] if another mutating call is in
    /// progress, and validation errors from [`EventRegistry::create`].
    pub fn create_event(&self, organizer: AccountId, details: EventDetails) -> Result<EventId> {
        let _busy = self.enter()?;
        self.ensure_registered(&organizer)?;
        let now = self.env.clock.now();

        let mut guard = self.lock_state();
        let state = &mut *guard;
        let event_id = state.registry.create(organizer, details, now)?;
        state.access.grant_role(RoleKey::owner(event_id), organizer);
        state.access.grant_role(RoleKey::organizer(event_id), organizer);

        info!(event_id = %event_id, organizer = %organizer, "Event created");
        Ok(event_id)
    }

    /// Replaces an event's details. Requires the organizer role.
    ///
    /// # Errors
    ///
    /// Returns guard-chain errors ([`MarketError::UnregisteredUser`],
    /// [`MarketError::EventDoesNotExist`], [`MarketError::Unauthorized`],
    /// [`MarketError::ReentrantCall`]) and anything from
    /// [`EventRegistry::update`].
    pub fn update_event(
        &self,
        event_id: EventId,
        organizer: AccountId,
        details: EventDetails,
    ) -> Result<()> {
        let _busy = self.enter()?;
        self.ensure_registered(&organizer)?;
        let now = self.env.clock.now();

        let mut guard = self.lock_state();
        let state = &mut *guard;
        ensure_exists(state, event_id)?;
        ensure_role(state, RoleKey::organizer(event_id), &organizer)?;
        state.registry.update(event_id, details, now)?;

        debug!(event_id = %event_id, "Event details updated");
        Ok(())
    }

    /// Moves an event to a later slot. Requires the organizer role.
    ///
    /// # Errors
    ///
    /// Returns guard-chain errors as in [`Self::update_event`] and anything
    /// from [`EventRegistry::reschedule`].
    pub fn reschedule_event(
        &self,
        event_id: EventId,
        organizer: AccountId,
        schedule: Schedule,
    ) -> Result<()> {
        let _busy = self.enter()?;
        self.ensure_registered(&organizer)?;

        let mut guard = self.lock_state();
        let state = &mut *guard;
        ensure_exists(state, event_id)?;
        ensure_role(state, RoleKey::organizer(event_id), &organizer)?;
        state.registry.reschedule(event_id, schedule)?;

        info!(event_id = %event_id, "Event rescheduled");
        Ok(())
    }

    /// Cancels an event. Requires the organizer role.
    ///
    /// Cancellation stops sales and class creation and opens the refund
    /// window; it cannot be undone.
    ///
    /// # Errors
    ///
    /// Returns guard-chain errors as in [`Self::update_event`] and
    /// [`MarketError::EventCancelled`] if already cancelled.
    pub fn cancel_event(&self, event_id: EventId, organizer: AccountId) -> Result<()> {
        let _busy = self.enter()?;
        self.ensure_registered(&organizer)?;

        let mut guard = self.lock_state();
        let state = &mut *guard;
        ensure_exists(state, event_id)?;
        ensure_role(state, RoleKey::organizer(event_id), &organizer)?;
        state.registry.cancel(event_id)?;

        info!(event_id = %event_id, "Event cancelled");
        Ok(())
    }

    // ========================================================================
    // Roles
    // ========================================================================

    /// Grants the organizer role for an event. Requires the owner role.
    ///
    /// Granting a role the account already holds is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::UnregisteredUser`] for an unknown caller,
    /// [`MarketError::EventDoesNotExist`], [`MarketError::Unauthorized`] if
    /// the caller is not the owner, and [`MarketError::ReentrantCall`].
    pub fn grant_organizer(
        &self,
        event_id: EventId,
        owner: AccountId,
        account: AccountId,
    ) -> Result<()> {
        let _busy = self.enter()?;
        self.ensure_registered(&owner)?;

        let mut guard = self.lock_state();
        let state = &mut *guard;
        ensure_exists(state, event_id)?;
        ensure_role(state, RoleKey::owner(event_id), &owner)?;
        let changed = state
            .access
            .grant_role(RoleKey::organizer(event_id), account);

        debug!(event_id = %event_id, account = %account, changed, "Organizer role granted");
        Ok(())
    }

    /// Revokes the organizer role for an event. Requires the owner role.
    ///
    /// Revoking a role the account does not hold is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the same guard-chain errors as [`Self::grant_organizer`].
    pub fn revoke_organizer(
        &self,
        event_id: EventId,
        owner: AccountId,
        account: &AccountId,
    ) -> Result<()> {
        let _busy = self.enter()?;
        self.ensure_registered(&owner)?;

        let mut guard = self.lock_state();
        let state = &mut *guard;
        ensure_exists(state, event_id)?;
        ensure_role(state, RoleKey::owner(event_id), &owner)?;
        let changed = state
            .access
            .revoke_role(RoleKey::organizer(event_id), account);

        debug!(event_id = %event_id, account = %account, changed, "Organizer role revoked");
        Ok(())
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    /// Batch-creates ticket classes for an active event. Requires the
    /// organizer role.
    ///
    /// # Errors
    ///
    /// Returns guard-chain errors as in [`Self::update_event`],
    /// [`MarketError::EventCancelled`] for a cancelled event, and anything
    /// from [`TicketLedger::create_classes`].
    pub fn create_ticket_classes(
        &self,
        event_id: EventId,
        organizer: AccountId,
        class_ids: &[ClassId],
        quantities: &[u32],
        prices: &[Money],
    ) -> Result<()> {
        let _busy = self.enter()?;
        self.ensure_registered(&organizer)?;

        let mut guard = self.lock_state();
        let state = &mut *guard;
        ensure_exists(state, event_id)?;
        ensure_role(state, RoleKey::organizer(event_id), &organizer)?;
        ensure_active(state, event_id)?;
        state
            .ledger
            .create_classes(event_id, class_ids, quantities, prices)?;

        info!(event_id = %event_id, classes = class_ids.len(), "Ticket classes created");
        Ok(())
    }

    // ========================================================================
    // Settlement
    // ========================================================================

    /// Purchases a batch of tickets with an attached payment.
    ///
    /// The payment must cover the quoted total; overpayment is kept. The
    /// organizer share of the total accrues to the event's escrow and the
    /// remainder of the payment becomes platform revenue. Returns the
    /// charged total.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::UnregisteredUser`],
    /// [`MarketError::EventDoesNotExist`], [`MarketError::EventCancelled`],
    /// [`MarketError::InsufficientAmount`] if the payment is short,
    /// [`MarketError::ReentrantCall`], and anything from
    /// [`TicketLedger::purchase`]. On any error nothing is charged.
    pub fn buy_ticket(
        &self,
        event_id: EventId,
        buyer: AccountId,
        class_ids: &[ClassId],
        quantities: &[u32],
        payment: Money,
    ) -> Result<Money> {
        let _busy = self.enter()?;
        self.ensure_registered(&buyer)?;
        let now = self.env.clock.now();
        let share_percent = self.config.organizer_share.value();

        let mut guard = self.lock_state();
        let state = &mut *guard;
        ensure_active(state, event_id)?;

        let total = state.ledger.quote(event_id, class_ids, quantities)?;
        if payment < total {
            return Err(MarketError::InsufficientAmount {
                required: total,
                provided: payment,
            });
        }

        // Work out all settlement arithmetic before mutating anything.
        let escrow_credit = total
            .checked_percentage(share_percent)
            .ok_or(MarketError::ArithmeticOverflow)?;
        let platform_cut = payment
            .checked_sub(escrow_credit)
            .ok_or(MarketError::ArithmeticOverflow)?;
        let escrow_next = state
            .escrow
            .get(&event_id)
            .copied()
            .unwrap_or_default()
            .checked_add(escrow_credit)
            .ok_or(MarketError::ArithmeticOverflow)?;
        let revenue_next = state
            .platform_revenue
            .checked_add(platform_cut)
            .ok_or(MarketError::ArithmeticOverflow)?;
        let quantity_total: u64 = quantities.iter().copied().map(u64::from).sum();
        let sold_before = state
            .registry
            .get(event_id)
            .map_or(0, |event| event.sold_tickets);
        sold_before
            .checked_add(quantity_total)
            .ok_or(MarketError::ArithmeticOverflow)?;

        let (charged, records) = state
            .ledger
            .purchase(event_id, class_ids, quantities, buyer, now)?;
        state.registry.add_sold(event_id, quantity_total)?;
        state.escrow.insert(event_id, escrow_next);
        state.platform_revenue = revenue_next;
        let owned = state.tickets_owned.entry(buyer).or_default();
        if !owned.contains(&event_id) {
            owned.push(event_id);
        }

        for record in &records {
            debug!(
                class_id = %record.class_id,
                quantity = record.quantity,
                line_total = record.line_total.cents(),
                "Purchase line settled"
            );
        }
        info!(
            event_id = %event_id,
            buyer = %buyer,
            total = charged.cents(),
            escrow_credit = escrow_credit.cents(),
            "Ticket purchase settled"
        );
        Ok(charged)
    }

    /// Pays the event's escrow balance out to its owner.
    ///
    /// Only allowed once the event has ended. Draining an empty escrow is a
    /// no-op that returns zero without touching the gateway. Returns the
    /// amount transferred.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::UnregisteredUser`],
    /// [`MarketError::EventDoesNotExist`], [`MarketError::Unauthorized`] if
    /// the caller is not the owner, [`MarketError::EventCancelled`],
    /// [`MarketError::EventNotEnded`] before the end time has passed,
    /// [`MarketError::ReentrantCall`], and [`MarketError::TransferFailed`]
    /// if the gateway declines; in that case the escrow balance is
    /// restored.
    pub fn payout(&self, event_id: EventId, organizer: AccountId) -> Result<Money> {
        let _busy = self.enter()?;
        self.ensure_registered(&organizer)?;
        let now = self.env.clock.now();

        let amount = {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            let event = state
                .registry
                .get(event_id)
                .ok_or(MarketError::EventDoesNotExist { event_id })?;
            ensure_role(state, RoleKey::owner(event_id), &organizer)?;
            if event.cancelled {
                return Err(MarketError::EventCancelled { event_id });
            }
            if !event.has_ended(now) {
                return Err(MarketError::EventNotEnded);
            }
            state.escrow.remove(&event_id).unwrap_or_default()
        };

        if amount.is_zero() {
            debug!(event_id = %event_id, "Payout requested with empty escrow");
            return Ok(Money::zero());
        }

        // The state lock is released during the transfer; the busy flag
        // still rejects reentrant mutating calls.
        match self.env.gateway.transfer(&organizer, amount) {
            Ok(()) => {
                info!(
                    event_id = %event_id,
                    organizer = %organizer,
                    amount = amount.cents(),
                    "Escrow paid out"
                );
                Ok(amount)
            }
            Err(err) => {
                self.lock_state().escrow.insert(event_id, amount);
                warn!(event_id = %event_id, error = %err, "Payout transfer failed, escrow restored");
                Err(MarketError::TransferFailed {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Refunds a batch of tickets after cancellation.
    ///
    /// The buyer gets back the organizer share of the current quoted value,
    /// paid from the event's escrow; the platform's cut is not returned.
    /// Returns the amount transferred.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::UnregisteredUser`],
    /// [`MarketError::EventDoesNotExist`],
    /// [`MarketError::EventNotCancelled`] while the event is still active,
    /// [`MarketError::Underflow`] if the escrow cannot cover the refund or
    /// the buyer does not hold the tickets, [`MarketError::ReentrantCall`],
    /// and [`MarketError::TransferFailed`] if the gateway declines; in that
    /// case inventory and escrow are restored.
    pub fn refund(
        &self,
        event_id: EventId,
        buyer: AccountId,
        class_ids: &[ClassId],
        quantities: &[u32],
    ) -> Result<Money> {
        let _busy = self.enter()?;
        self.ensure_registered(&buyer)?;
        let now = self.env.clock.now();
        let share_percent = self.config.organizer_share.value();

        let (share, records, quantity_total, escrow_before) = {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            let event = state
                .registry
                .get(event_id)
                .ok_or(MarketError::EventDoesNotExist { event_id })?;
            if !event.cancelled {
                return Err(MarketError::EventNotCancelled { event_id });
            }

            let gross = state.ledger.quote(event_id, class_ids, quantities)?;
            let share = gross
                .checked_percentage(share_percent)
                .ok_or(MarketError::ArithmeticOverflow)?;
            let escrow_before = state.escrow.get(&event_id).copied().unwrap_or_default();
            let escrow_next = escrow_before
                .checked_sub(share)
                .ok_or(MarketError::Underflow)?;

            let (_, records) = state
                .ledger
                .refund(event_id, class_ids, quantities, buyer, now)?;
            let quantity_total: u64 = records.iter().map(|record| u64::from(record.quantity)).sum();
            if let Err(err) = state.registry.sub_sold(event_id, quantity_total) {
                state.ledger.rollback_refund(event_id, &records);
                return Err(err);
            }
            state.escrow.insert(event_id, escrow_next);
            (share, records, quantity_total, escrow_before)
        };

        if share.is_zero() {
            debug!(event_id = %event_id, buyer = %buyer, "Refund settled with zero payout");
            return Ok(Money::zero());
        }

        match self.env.gateway.transfer(&buyer, share) {
            Ok(()) => {
                info!(
                    event_id = %event_id,
                    buyer = %buyer,
                    amount = share.cents(),
                    tickets = quantity_total,
                    "Refund paid from escrow"
                );
                Ok(share)
            }
            Err(err) => {
                let mut guard = self.lock_state();
                let state = &mut *guard;
                state.ledger.rollback_refund(event_id, &records);
                // Restoring a counter that was just decremented cannot fail.
                let _ = state.registry.add_sold(event_id, quantity_total);
                state.escrow.insert(event_id, escrow_before);
                warn!(event_id = %event_id, error = %err, "Refund transfer failed, ledger restored");
                Err(MarketError::TransferFailed {
                    reason: err.to_string(),
                })
            }
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Looks up one event.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::EventDoesNotExist`] for an unknown id.
    pub fn event(&self, event_id: EventId) -> Result<Event> {
        self.lock_state()
            .registry
            .get(event_id)
            .cloned()
            .ok_or(MarketError::EventDoesNotExist { event_id })
    }

    /// All events in ascending id order, including cancelled ones.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.lock_state().registry.get_all().into_iter().cloned().collect()
    }

    /// Events created by one organizer, in creation order.
    #[must_use]
    pub fn events_by_organizer(&self, organizer: &AccountId) -> Vec<Event> {
        self.lock_state()
            .registry
            .by_organizer(organizer)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Ticket classes of an event in creation order.
    #[must_use]
    pub fn ticket_classes(&self, event_id: EventId) -> Vec<(ClassId, TicketClass)> {
        self.lock_state().ledger.classes(event_id)
    }

    /// Quantity of one class held by one buyer.
    #[must_use]
    pub fn balance_of(&self, event_id: EventId, account: &AccountId, class_id: ClassId) -> u32 {
        self.lock_state().ledger.balance_of(event_id, account, class_id)
    }

    /// Total minted supply across all classes of an event.
    #[must_use]
    pub fn total_supply(&self, event_id: EventId) -> u64 {
        self.lock_state().ledger.total_supply(event_id)
    }

    /// Minted supply of one class.
    #[must_use]
    pub fn class_supply(&self, event_id: EventId, class_id: ClassId) -> u32 {
        self.lock_state().ledger.class_supply(event_id, class_id)
    }

    /// Total sold count across all classes of an event.
    #[must_use]
    pub fn total_sold(&self, event_id: EventId) -> u64 {
        self.lock_state().ledger.total_sold(event_id)
    }

    /// Escrow currently held for an event.
    #[must_use]
    pub fn escrow_balance(&self, event_id: EventId) -> Money {
        self.lock_state()
            .escrow
            .get(&event_id)
            .copied()
            .unwrap_or_default()
    }

    /// Platform revenue accumulated across all sales.
    #[must_use]
    pub fn platform_revenue(&self) -> Money {
        self.lock_state().platform_revenue
    }

    /// Events the account has ever bought tickets for, in first-purchase
    /// order. Refunds do not remove entries.
    #[must_use]
    pub fn tickets_owned(&self, account: &AccountId) -> Vec<EventId> {
        self.lock_state()
            .tickets_owned
            .get(account)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns `true` if the account holds the role for the event.
    #[must_use]
    pub fn has_role(&self, event_id: EventId, kind: RoleKind, account: &AccountId) -> bool {
        self.lock_state()
            .access
            .has_role(RoleKey::new(kind, event_id), account)
    }
}
