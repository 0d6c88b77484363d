//! In-memory mock providers for testing.
//!
//! Available with the `test-utils` feature (enabled by default). Hosts
//! building against real account storage and payment rails can disable the
//! feature to drop these from the build.

pub mod directory;
pub mod payment;

pub use directory::MockDirectory;
pub use payment::{FailingPaymentGateway, MockPaymentGateway};
