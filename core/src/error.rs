//! Error types for marketplace, registry, and ledger operations.

use crate::access_control::RoleKind;
use crate::types::{AccountId, ClassId, EventId, Money};
use thiserror::Error;

/// Result type alias for marketplace operations.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Comprehensive error taxonomy for the ticketing marketplace.
///
/// Every failed operation leaves stored state unchanged and reports one of
/// these kinds. All errors are synchronous and non-retryable from the core's
/// perspective; the caller decides whether to retry with corrected input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MarketError {
    // ═══════════════════════════════════════════════════════════
    // Registration & Authorization
    // ═══════════════════════════════════════════════════════════

    /// The acting account is not registered with the directory.
    #[error("Account {account} is not registered")]
    UnregisteredUser {
        /// Account that failed the registration check
        account: AccountId,
    },

    /// The acting account lacks the required role for the target event.
    #[error("Missing required role: {required}")]
    Unauthorized {
        /// Role that was required
        required: RoleKind,
    },

    // ═══════════════════════════════════════════════════════════
    // Event Lifecycle
    // ═══════════════════════════════════════════════════════════

    /// No event exists under the given identifier.
    #[error("Event {event_id} does not exist")]
    EventDoesNotExist {
        /// Identifier that resolved to nothing
        event_id: EventId,
    },

    /// The event has been cancelled and the operation requires an active one.
    #[error("Event {event_id} has been cancelled")]
    EventCancelled {
        /// Cancelled event
        event_id: EventId,
    },

    /// The operation requires a cancelled event (refund processing).
    #[error("Event {event_id} is not cancelled")]
    EventNotCancelled {
        /// Still-active event
        event_id: EventId,
    },

    /// Scheduling-order violation: start must precede end, and a reschedule
    /// must move the start forward.
    #[error("Invalid start time")]
    InvalidStartTime,

    /// The new start time is not in the future at the moment of the call.
    #[error("Event has already started")]
    EventAlreadyStarted,

    /// Payout requested before the event's end time has passed.
    #[error("Event has not ended yet")]
    EventNotEnded,

    // ═══════════════════════════════════════════════════════════
    // Input Validation
    // ═══════════════════════════════════════════════════════════

    /// Malformed request (empty batch, zero quantity, oversized field).
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// What was wrong with the input
        reason: String,
    },

    /// Parallel input arrays have different lengths.
    #[error("Input length mismatch: expected {expected} entries, got {actual}")]
    InputMismatch {
        /// Length of the class id array
        expected: usize,
        /// Length of the mismatched companion array
        actual: usize,
    },

    // ═══════════════════════════════════════════════════════════
    // Inventory & Accounting
    // ═══════════════════════════════════════════════════════════

    /// No ticket class exists under the given identifier for this event.
    #[error("Ticket class {class_id} not found")]
    TicketClassNotFound {
        /// Unknown class identifier
        class_id: ClassId,
    },

    /// Purchase would exceed the minted supply of a class.
    #[error("Insufficient supply for class {class_id}: requested {requested}, available {available}")]
    InsufficientSupply {
        /// Class that ran short
        class_id: ClassId,
        /// Quantity requested
        requested: u32,
        /// Quantity still available
        available: u32,
    },

    /// Payment below the computed total price.
    #[error("Insufficient payment: required {required}, provided {provided}")]
    InsufficientAmount {
        /// Computed total price
        required: Money,
        /// Payment that was offered
        provided: Money,
    },

    /// A decrement would drive a recorded balance below zero.
    #[error("Accounting underflow")]
    Underflow,

    /// A checked arithmetic operation overflowed; the operation fails closed.
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    // ═══════════════════════════════════════════════════════════
    // Settlement
    // ═══════════════════════════════════════════════════════════

    /// A mutating call arrived while another one was still in progress.
    #[error("Reentrant call rejected")]
    ReentrantCall,

    /// The external payment transfer failed; bookkeeping was rolled back.
    #[error("Payment transfer failed: {reason}")]
    TransferFailed {
        /// Reason reported by the payment gateway
        reason: String,
    },
}

impl MarketError {
    /// Returns `true` if this error is due to invalid or unaffordable input.
    ///
    /// # Examples
    ///
    /// ```
    /// # use boxoffice_core::MarketError;
    /// assert!(MarketError::Underflow.is_user_error());
    /// assert!(!MarketError::ReentrantCall.is_user_error());
    /// ```
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::InputMismatch { .. }
                | Self::InsufficientAmount { .. }
                | Self::InsufficientSupply { .. }
                | Self::TicketClassNotFound { .. }
                | Self::Underflow
        )
    }

    /// Returns `true` if this error reflects the event's lifecycle state
    /// rather than the request itself.
    ///
    /// # Examples
    ///
    /// ```
    /// # use boxoffice_core::MarketError;
    /// assert!(MarketError::EventAlreadyStarted.is_lifecycle_error());
    /// assert!(!MarketError::Underflow.is_lifecycle_error());
    /// ```
    pub const fn is_lifecycle_error(&self) -> bool {
        matches!(
            self,
            Self::EventCancelled { .. }
                | Self::EventNotCancelled { .. }
                | Self::EventAlreadyStarted
                | Self::EventNotEnded
                | Self::InvalidStartTime
        )
    }

    /// Returns `true` if this error means the caller was not allowed to act.
    ///
    /// # Examples
    ///
    /// ```
    /// # use boxoffice_core::{MarketError, RoleKind};
    /// let err = MarketError::Unauthorized { required: RoleKind::Owner };
    /// assert!(err.is_authorization_error());
    /// assert!(!MarketError::EventNotEnded.is_authorization_error());
    /// ```
    pub const fn is_authorization_error(&self) -> bool {
        matches!(
            self,
            Self::UnregisteredUser { .. } | Self::Unauthorized { .. }
        )
    }
}
