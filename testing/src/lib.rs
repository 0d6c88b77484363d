//! # Boxoffice Testing
//!
//! Testing utilities for the boxoffice marketplace.
//!
//! This crate provides:
//! - A controllable [`FixedClock`] for time-dependent rules
//! - The [`TestMarket`] harness wiring a marketplace to mock providers
//! - Assertion helpers for inventory and money invariants
//! - Proptest strategies for batch inputs
//!
//! ## Example
//!
//! ```
//! use boxoffice_testing::TestMarket;
//!
//! let test = TestMarket::new();
//! let (_organizer, event_id) = test.seeded_event();
//!
//! assert_eq!(test.market.total_supply(event_id), 100);
//! assert!(test.market.event(event_id).is_ok());
//! ```

use chrono::{DateTime, Utc};

/// Mock implementations of provider traits.
pub mod mocks {
    use super::{DateTime, Utc};
    use boxoffice_core::Clock;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    /// Controllable clock for deterministic tests.
    ///
    /// Returns the same time until a test moves it with [`FixedClock::set`]
    /// or [`FixedClock::advance`]. Clones share the underlying time, so the
    /// handle a test keeps stays in sync with the one the marketplace holds.
    ///
    /// # Example
    ///
    /// ```
    /// use boxoffice_testing::mocks::FixedClock;
    /// use boxoffice_core::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let before = clock.now();
    /// clock.advance(Duration::hours(2));
    /// assert_eq!(clock.now(), before + Duration::hours(2));
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Creates a clock pinned to the given time.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Moves the clock to an absolute time.
        pub fn set(&self, time: DateTime<Utc>) {
            *self.guard() = time;
        }

        /// Moves the clock forward by a delta.
        pub fn advance(&self, delta: chrono::Duration) {
            let mut time = self.guard();
            *time = *time + delta;
        }

        fn guard(&self) -> MutexGuard<'_, DateTime<Utc>> {
            self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.guard()
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test harness and helpers.
pub mod helpers {
    use crate::mocks::{FixedClock, test_clock};
    use boxoffice_core::mocks::{MockDirectory, MockPaymentGateway};
    use boxoffice_core::{
        AccountId, ClassId, Clock, Directory, EventDetails, EventId, MarketEnvironment,
        Marketplace, MarketplaceConfig, Money, Profile,
    };
    use chrono::Duration;
    use std::sync::Arc;

    /// A marketplace wired to mock providers and a controllable clock.
    ///
    /// The directory, gateway, and clock fields are handles to the same
    /// objects the marketplace uses, so tests can register accounts,
    /// inspect transfers, and move time directly.
    pub struct TestMarket {
        /// The marketplace under test
        pub market: Marketplace,
        /// Handle to the marketplace's account directory
        pub directory: MockDirectory,
        /// Handle to the marketplace's payment gateway
        pub gateway: MockPaymentGateway,
        /// Handle to the marketplace's clock
        pub clock: FixedClock,
    }

    impl TestMarket {
        /// Creates a harness with default marketplace configuration.
        #[must_use]
        pub fn new() -> Self {
            Self::with_config(MarketplaceConfig::default())
        }

        /// Creates a harness with explicit marketplace configuration.
        #[must_use]
        pub fn with_config(config: MarketplaceConfig) -> Self {
            let directory = MockDirectory::new();
            let gateway = MockPaymentGateway::new();
            let clock = test_clock();
            let env = MarketEnvironment::new(
                Arc::new(directory.clone()),
                Arc::new(gateway.clone()),
                Arc::new(clock.clone()),
            );
            Self {
                market: Marketplace::with_config(config, env),
                directory,
                gateway,
                clock,
            }
        }

        /// Registers a fresh account under the given display name.
        #[must_use]
        pub fn register(&self, name: &str) -> AccountId {
            let account = AccountId::new();
            self.directory
                .register(account, Profile::new(name, format!("{name}@example.com")));
            account
        }

        /// Event details starting 24 hours after the current clock time and
        /// running for six hours.
        #[must_use]
        pub fn details(&self, name: &str) -> EventDetails {
            let start = self.clock.now() + Duration::hours(24);
            EventDetails {
                name: name.to_string(),
                description: format!("{name} description"),
                location: "Test Hall".to_string(),
                date: start.date_naive(),
                start_time: start,
                end_time: start + Duration::hours(6),
                virtual_event: false,
                private_event: false,
            }
        }

        /// Registers an organizer, lists an event starting in 24 hours, and
        /// mints one class of 100 tickets at $5.00 (class id 1).
        ///
        /// Returns the organizer account and the event id.
        ///
        /// # Panics
        ///
        /// Panics if listing the event fails, which indicates a broken
        /// harness rather than a failing test subject.
        #[must_use]
        #[allow(clippy::expect_used)]
        pub fn seeded_event(&self) -> (AccountId, EventId) {
            let organizer = self.register("organizer");
            let event_id = self
                .market
                .create_event(organizer, self.details("Seeded Event"))
                .expect("seeded event should list");
            self.market
                .create_ticket_classes(
                    event_id,
                    organizer,
                    &[ClassId::new(1)],
                    &[100],
                    &[Money::from_cents(500)],
                )
                .expect("seeded classes should mint");
            (organizer, event_id)
        }
    }

    impl Default for TestMarket {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Initializes a compact tracing subscriber for test output.
    ///
    /// Safe to call from every test; only the first call installs the
    /// subscriber.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .compact()
            .try_init();
    }
}

/// Assertion helpers for cross-component invariants.
pub mod assertions {
    use crate::helpers::TestMarket;
    use boxoffice_core::{EventId, Money};

    /// Checks that no class is oversold and that the per-event sold counter
    /// agrees with the per-class sold counts.
    ///
    /// # Panics
    ///
    /// Panics if any invariant is violated or the event does not exist.
    #[allow(clippy::expect_used)]
    pub fn assert_inventory_consistent(test: &TestMarket, event_id: EventId) {
        let mut sold_total: u64 = 0;
        for (class_id, class) in test.market.ticket_classes(event_id) {
            assert!(
                class.sold <= class.minted,
                "class {class_id} oversold: {} of {}",
                class.sold,
                class.minted
            );
            sold_total += u64::from(class.sold);
        }
        assert_eq!(test.market.total_sold(event_id), sold_total);

        let event = test.market.event(event_id).expect("event should exist");
        assert_eq!(event.sold_tickets, sold_total, "event sold counter drifted");
    }

    /// Checks that every cent paid in is accounted for: still in escrow,
    /// kept as platform revenue, or transferred out by the gateway.
    ///
    /// # Panics
    ///
    /// Panics if the balances do not add up to `paid_in`.
    pub fn assert_money_conserved(test: &TestMarket, paid_in: Money) {
        let escrow_total: u64 = test
            .market
            .events()
            .iter()
            .map(|event| test.market.escrow_balance(event.id).cents())
            .sum();
        let retained = test.market.platform_revenue().cents();
        let transferred = test.gateway.total_transferred().cents();

        assert_eq!(
            escrow_total + retained + transferred,
            paid_in.cents(),
            "money not conserved: escrow {escrow_total} + revenue {retained} + out {transferred}"
        );
    }
}

/// Proptest strategies for batch inputs.
pub mod properties {
    use proptest::prelude::*;

    /// Batch of quantities, each at least 1.
    pub fn quantities(max_len: usize, max_each: u32) -> impl Strategy<Value = Vec<u32>> {
        prop::collection::vec(1..=max_each, 1..=max_len)
    }

    /// Batch of prices in cents of exactly `len` entries, zero allowed.
    pub fn prices(len: usize, max_cents: u64) -> impl Strategy<Value = Vec<u64>> {
        prop::collection::vec(0..=max_cents, len)
    }
}

// Re-export commonly used items
pub use helpers::{TestMarket, init_test_tracing};
pub use mocks::{FixedClock, test_clock};
