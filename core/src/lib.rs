//! # Boxoffice Core
//!
//! Event ticketing marketplace with a registry of events, a multi-class
//! ticket ledger, per-event roles, and escrow-based settlement.
//!
//! The [`Marketplace`] facade is the single entry point. It runs a fixed
//! guard chain on every mutating call (registration, existence, role,
//! lifecycle) before delegating to the [`EventRegistry`] and
//! [`TicketLedger`], and it owns all money movement: purchases split into
//! organizer escrow and platform revenue, payouts drain escrow to the owner
//! after the event ends, and refunds return the organizer share to buyers
//! of cancelled events.
//!
//! External concerns are traits in [`providers`]: account registration
//! ([`Directory`]), outbound transfers ([`PaymentGateway`]), and time
//! ([`Clock`]). In-memory mocks for the directory and the gateway ship
//! behind the `test-utils` feature.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use boxoffice_core::mocks::{MockDirectory, MockPaymentGateway};
//! use boxoffice_core::{
//!     AccountId, ClassId, Directory, EventDetails, MarketEnvironment, Marketplace, Money,
//!     Profile, SystemClock,
//! };
//! use chrono::{Duration, Utc};
//!
//! let directory = MockDirectory::new();
//! let env = MarketEnvironment::new(
//!     Arc::new(directory.clone()),
//!     Arc::new(MockPaymentGateway::new()),
//!     Arc::new(SystemClock),
//! );
//! let market = Marketplace::new(env);
//!
//! let organizer = AccountId::new();
//! directory.register(organizer, Profile::new("Sasha", "sasha@example.com"));
//!
//! let start = Utc::now() + Duration::hours(24);
//! let event_id = market.create_event(
//!     organizer,
//!     EventDetails {
//!         name: "Club Night".to_string(),
//!         description: "Doors at nine".to_string(),
//!         location: "Warehouse 12".to_string(),
//!         date: start.date_naive(),
//!         start_time: start,
//!         end_time: start + Duration::hours(6),
//!         virtual_event: false,
//!         private_event: false,
//!     },
//! )?;
//!
//! market.create_ticket_classes(
//!     event_id,
//!     organizer,
//!     &[ClassId::new(1)],
//!     &[100],
//!     &[Money::from_cents(2_500)],
//! )?;
//! assert_eq!(market.total_supply(event_id), 100);
//! # Ok::<(), boxoffice_core::MarketError>(())
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod access_control;
pub mod config;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod marketplace;
#[cfg(feature = "test-utils")]
pub mod mocks;
pub mod providers;
pub mod registry;
pub mod types;

pub use access_control::{AccessControl, RoleKey, RoleKind};
pub use config::{MarketplaceConfig, SharePercent};
pub use error::{MarketError, Result};
pub use ledger::TicketLedger;
pub use marketplace::{MarketEnvironment, Marketplace};
pub use providers::{Clock, Directory, GatewayResult, PaymentError, PaymentGateway, SystemClock};
pub use registry::EventRegistry;
pub use types::{
    AccountId, ClassId, Event, EventDetails, EventId, Money, Profile, PurchaseRecord,
    RefundRecord, Schedule, TicketClass,
};
