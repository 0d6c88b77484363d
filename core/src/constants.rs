//! Limits and defaults shared across the marketplace.

/// Maximum length of an event name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of an event description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum length of an event location string, in characters.
pub const MAX_LOCATION_LEN: usize = 200;

/// Default share of each sale escrowed for the organizer, in percent.
/// The remainder is platform revenue.
pub const DEFAULT_ORGANIZER_SHARE: u8 = 90;

/// Maximum number of entries accepted in one batch call.
pub const MAX_BATCH_CLASSES: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organizer_share_is_a_valid_percentage() {
        assert!(DEFAULT_ORGANIZER_SHARE <= 100);
    }

    #[test]
    fn limits_are_nonzero() {
        assert!(MAX_NAME_LEN > 0);
        assert!(MAX_DESCRIPTION_LEN > 0);
        assert!(MAX_LOCATION_LEN > 0);
        assert!(MAX_BATCH_CLASSES > 0);
    }
}
