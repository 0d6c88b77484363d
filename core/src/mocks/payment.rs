//! Mock payment gateways.

use crate::providers::{GatewayResult, PaymentError, PaymentGateway};
use crate::types::{AccountId, Money};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// In-memory gateway that accepts every transfer and records it.
#[derive(Debug, Clone, Default)]
pub struct MockPaymentGateway {
    transfers: Arc<Mutex<Vec<(AccountId, Money)>>>,
}

impl MockPaymentGateway {
    /// Creates a gateway with no recorded transfers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All transfers in the order they were made.
    #[must_use]
    pub fn transfers(&self) -> Vec<(AccountId, Money)> {
        self.guard().clone()
    }

    /// Number of transfers made.
    #[must_use]
    pub fn transfer_count(&self) -> usize {
        self.guard().len()
    }

    /// Sum of all transferred amounts, saturating on overflow.
    #[must_use]
    pub fn total_transferred(&self) -> Money {
        let cents = self
            .guard()
            .iter()
            .fold(0_u64, |sum, (_, amount)| sum.saturating_add(amount.cents()));
        Money::from_cents(cents)
    }

    fn guard(&self) -> MutexGuard<'_, Vec<(AccountId, Money)>> {
        self.transfers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn transfer(&self, to: &AccountId, amount: Money) -> GatewayResult<()> {
        self.guard().push((*to, amount));
        Ok(())
    }
}

/// Gateway that fails every transfer with a fixed error.
#[derive(Debug, Clone)]
pub struct FailingPaymentGateway {
    error: PaymentError,
}

impl FailingPaymentGateway {
    /// Creates a gateway that always returns the given error.
    #[must_use]
    pub const fn new(error: PaymentError) -> Self {
        Self { error }
    }

    /// Convenience constructor for a declined transfer.
    #[must_use]
    pub fn declined() -> Self {
        Self::new(PaymentError::Declined {
            reason: "card declined".to_string(),
        })
    }
}

impl PaymentGateway for FailingPaymentGateway {
    fn transfer(&self, _to: &AccountId, _amount: Money) -> GatewayResult<()> {
        Err(self.error.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mock_gateway_records_transfers() {
        let gateway = MockPaymentGateway::new();
        let to = AccountId::new();

        gateway.transfer(&to, Money::from_cents(500)).unwrap();
        gateway.transfer(&to, Money::from_cents(250)).unwrap();

        assert_eq!(gateway.transfer_count(), 2);
        assert_eq!(gateway.total_transferred(), Money::from_cents(750));
        assert_eq!(gateway.transfers()[0], (to, Money::from_cents(500)));
    }

    #[test]
    fn failing_gateway_returns_its_error() {
        let gateway = FailingPaymentGateway::declined();
        let err = gateway
            .transfer(&AccountId::new(), Money::from_cents(100))
            .unwrap_err();
        assert!(matches!(err, PaymentError::Declined { .. }));
    }
}
