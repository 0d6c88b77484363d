//! Clock trait for time-dependent rules.

use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// Scheduling rules (start in the future, payout after the end) compare
/// against this trait instead of [`Utc::now`] so tests can pin the clock.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
