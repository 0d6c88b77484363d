//! External dependency traits for the marketplace.
//!
//! The core never talks to account storage, payment rails, or the wall clock
//! directly. Each concern is a trait implemented by the host, which keeps the
//! settlement logic deterministic and testable with in-memory fakes.

pub mod clock;
pub mod directory;
pub mod payment;

pub use clock::{Clock, SystemClock};
pub use directory::Directory;
pub use payment::{GatewayResult, PaymentError, PaymentGateway};
