//! Account directory trait.

use crate::types::{AccountId, Profile};

/// Registry of known accounts.
///
/// Every mutating marketplace operation checks the acting account against
/// the directory before anything else. The directory is maintained by the
/// host; the marketplace only reads from it.
pub trait Directory: Send + Sync {
    /// Returns `true` if the account has completed registration.
    fn is_registered(&self, account: &AccountId) -> bool;

    /// Registers an account with its profile, overwriting any previous one.
    fn register(&self, account: AccountId, profile: Profile);

    /// Looks up the profile of a registered account.
    fn lookup(&self, account: &AccountId) -> Option<Profile>;
}
