//! Mock account directory.

use crate::providers::Directory;
use crate::types::{AccountId, Profile};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// In-memory directory for testing.
///
/// Cloning shares the underlying account table, so a test can keep a handle
/// for registering accounts while the marketplace holds another.
#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
    accounts: Arc<Mutex<HashMap<AccountId, Profile>>>,
}

impl MockDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Returns `true` if no accounts are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<AccountId, Profile>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Directory for MockDirectory {
    fn is_registered(&self, account: &AccountId) -> bool {
        self.guard().contains_key(account)
    }

    fn register(&self, account: AccountId, profile: Profile) {
        self.guard().insert(account, profile);
    }

    fn lookup(&self, account: &AccountId) -> Option<Profile> {
        self.guard().get(account).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let directory = MockDirectory::new();
        let account = AccountId::new();
        assert!(!directory.is_registered(&account));

        directory.register(account, Profile::new("Riley", "riley@example.com"));

        assert!(directory.is_registered(&account));
        assert_eq!(
            directory.lookup(&account).map(|p| p.display_name),
            Some("Riley".to_string())
        );
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn clones_share_the_account_table() {
        let directory = MockDirectory::new();
        let handle = directory.clone();
        let account = AccountId::new();

        handle.register(account, Profile::new("Riley", "riley@example.com"));

        assert!(directory.is_registered(&account));
    }
}
