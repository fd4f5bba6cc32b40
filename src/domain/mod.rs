//! Domain primitives for the credential subsystem.
//!
//! Identities are wrapped in newtypes so a user id cannot be confused with
//! any other integer flowing through the application shell.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a user row.
///
/// Assigned by the store on creation and never changed afterwards.
///
/// # Examples
///
/// ```rust
/// use finledger::domain::UserId;
///
/// let id = UserId::new(7);
/// assert_eq!(id.value(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UserId(i32);

impl UserId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "UserId should be non-negative");
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for i32 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for UserId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// The authenticated party performing an operation: who they are and
/// whether they hold the admin role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Identity {
    /// Whether this identity may act on `target`'s credentials: admins may act
    /// on anyone, everyone else only on themselves.
    #[must_use]
    pub fn may_manage(&self, target: UserId) -> bool {
        self.is_admin || self.user_id == target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_conversions() {
        let id = UserId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i32::from(id), 42);
        assert_eq!(UserId::from(42), id);
    }

    #[test]
    fn user_id_serialization() {
        let id = UserId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let deserialized: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn identity_may_manage_self_or_as_admin() {
        let alice = Identity {
            user_id: UserId::new(2),
            is_admin: false,
        };
        let admin = Identity {
            user_id: UserId::new(1),
            is_admin: true,
        };

        assert!(alice.may_manage(UserId::new(2)));
        assert!(!alice.may_manage(UserId::new(3)));
        assert!(admin.may_manage(UserId::new(1)));
        assert!(admin.may_manage(UserId::new(3)));
    }
}
