//! Payment gateway trait and errors.

use crate::types::{AccountId, Money};
use thiserror::Error;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, PaymentError>;

/// Errors reported by a payment gateway.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// The gateway refused the transfer.
    #[error("Transfer declined: {reason}")]
    Declined {
        /// Reason given by the gateway
        reason: String,
    },

    /// The paying side had insufficient funds.
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// The gateway did not respond in time.
    #[error("Gateway timeout")]
    Timeout,

    /// Any other gateway failure.
    #[error("Gateway error: {message}")]
    Other {
        /// Description of the failure
        message: String,
    },
}

/// Outbound money transfers.
///
/// The marketplace calls this exactly once per payout or refund, after its
/// own bookkeeping has been committed. A transfer that returns an error
/// causes that bookkeeping to be rolled back, so implementations must not
/// report failure for transfers that actually went through.
pub trait PaymentGateway: Send + Sync {
    /// Transfers `amount` to the given account.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`] if the transfer could not be completed.
    fn transfer(&self, to: &AccountId, amount: Money) -> GatewayResult<()>;
}
