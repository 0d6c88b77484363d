//! Per-event role management.
//!
//! Roles are scoped to a single event: holding [`RoleKind::Organizer`] for
//! event 3 says nothing about event 4. The marketplace grants the creator
//! both roles at listing time and consults this table on every privileged
//! call.

use crate::types::{AccountId, EventId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Kinds of per-event authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    /// Held only by the event creator; required for payout and for managing
    /// organizer grants.
    Owner,
    /// Required for event mutation and ticket class creation; delegable by
    /// the owner.
    Organizer,
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Organizer => write!(f, "organizer"),
        }
    }
}

/// A role scoped to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleKey {
    /// Which authority the key names
    pub kind: RoleKind,
    /// Event the authority applies to
    pub event_id: EventId,
}

impl RoleKey {
    /// Creates a role key.
    #[must_use]
    pub const fn new(kind: RoleKind, event_id: EventId) -> Self {
        Self { kind, event_id }
    }

    /// Owner role for the given event.
    #[must_use]
    pub const fn owner(event_id: EventId) -> Self {
        Self::new(RoleKind::Owner, event_id)
    }

    /// Organizer role for the given event.
    #[must_use]
    pub const fn organizer(event_id: EventId) -> Self {
        Self::new(RoleKind::Organizer, event_id)
    }
}

/// Membership table mapping each per-event role to its holders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessControl {
    roles: HashMap<RoleKey, HashSet<AccountId>>,
}

impl AccessControl {
    /// Creates an empty role table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the account holds the role.
    #[must_use]
    pub fn has_role(&self, key: RoleKey, account: &AccountId) -> bool {
        self.roles
            .get(&key)
            .is_some_and(|holders| holders.contains(account))
    }

    /// Grants the role to the account.
    ///
    /// Granting an already-held role is a no-op. Returns `true` if the
    /// membership actually changed.
    pub fn grant_role(&mut self, key: RoleKey, account: AccountId) -> bool {
        self.roles.entry(key).or_default().insert(account)
    }

    /// Revokes the role from the account.
    ///
    /// Revoking a role the account does not hold is a no-op. Returns `true`
    /// if the membership actually changed.
    pub fn revoke_role(&mut self, key: RoleKey, account: &AccountId) -> bool {
        self.roles
            .get_mut(&key)
            .is_some_and(|holders| holders.remove(account))
    }

    /// Number of accounts holding the role.
    #[must_use]
    pub fn holder_count(&self, key: RoleKey) -> usize {
        self.roles.get(&key).map_or(0, HashSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_is_idempotent() {
        let mut access = AccessControl::new();
        let account = AccountId::new();
        let key = RoleKey::organizer(EventId::new(1));

        assert!(access.grant_role(key, account));
        assert!(!access.grant_role(key, account));
        assert!(access.has_role(key, &account));
        assert_eq!(access.holder_count(key), 1);
    }

    #[test]
    fn revoke_without_grant_is_a_noop() {
        let mut access = AccessControl::new();
        let account = AccountId::new();
        let key = RoleKey::owner(EventId::new(1));

        assert!(!access.revoke_role(key, &account));
        assert!(access.grant_role(key, account));
        assert!(access.revoke_role(key, &account));
        assert!(!access.has_role(key, &account));
    }

    #[test]
    fn roles_are_scoped_per_event() {
        let mut access = AccessControl::new();
        let account = AccountId::new();

        access.grant_role(RoleKey::organizer(EventId::new(1)), account);

        assert!(access.has_role(RoleKey::organizer(EventId::new(1)), &account));
        assert!(!access.has_role(RoleKey::organizer(EventId::new(2)), &account));
        assert!(!access.has_role(RoleKey::owner(EventId::new(1)), &account));
    }
}
