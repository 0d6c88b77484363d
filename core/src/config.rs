//! Marketplace configuration.

use crate::constants::DEFAULT_ORGANIZER_SHARE;

/// A validated percentage in the range 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharePercent(u8);

impl SharePercent {
    /// Creates a share percentage, returning `None` above 100.
    #[must_use]
    pub const fn new(percent: u8) -> Option<Self> {
        if percent > 100 {
            None
        } else {
            Some(Self(percent))
        }
    }

    /// Returns the raw percentage value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for SharePercent {
    fn default() -> Self {
        Self(DEFAULT_ORGANIZER_SHARE)
    }
}

/// Configuration for marketplace settlement.
///
/// # Examples
///
/// ```
/// use boxoffice_core::{MarketplaceConfig, SharePercent};
///
/// let config = MarketplaceConfig::new();
/// assert_eq!(config.organizer_share.value(), 90);
///
/// let config = MarketplaceConfig::new()
///     .with_organizer_share(SharePercent::new(80).unwrap());
/// assert_eq!(config.organizer_share.value(), 80);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarketplaceConfig {
    /// Share of each sale escrowed for the organizer; the remainder of the
    /// payment becomes platform revenue
    pub organizer_share: SharePercent,
}

impl MarketplaceConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the organizer's share of each sale.
    #[must_use]
    pub const fn with_organizer_share(mut self, share: SharePercent) -> Self {
        self.organizer_share = share;
        self
    }
}
