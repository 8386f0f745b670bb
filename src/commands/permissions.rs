//! # Permission Gate
//!
//! Exact-match permission grants per user. Uses DashMap so grants and checks can
//! happen concurrently from any dispatch task.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Add revoke and per-user listing
//! - 1.0.0: Grant and authorize

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::context::User;

/// Capability a command may require
///
/// Levels do not imply each other: holding `Moderator` does not satisfy a
/// command that requires `Subscriber`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Everyone,
    Subscriber,
    Vip,
    Moderator,
    Broadcaster,
    Owner,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Everyone => write!(f, "everyone"),
            Permission::Subscriber => write!(f, "subscriber"),
            Permission::Vip => write!(f, "vip"),
            Permission::Moderator => write!(f, "moderator"),
            Permission::Broadcaster => write!(f, "broadcaster"),
            Permission::Owner => write!(f, "owner"),
        }
    }
}

impl std::str::FromStr for Permission {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "everyone" => Ok(Permission::Everyone),
            "subscriber" => Ok(Permission::Subscriber),
            "vip" => Ok(Permission::Vip),
            "moderator" => Ok(Permission::Moderator),
            "broadcaster" => Ok(Permission::Broadcaster),
            "owner" => Ok(Permission::Owner),
            _ => Err(anyhow::anyhow!("Invalid permission: {}", s)),
        }
    }
}

/// Set of (user, permission) grants, keyed by user id
#[derive(Clone, Default)]
pub struct PermissionGate {
    grants: Arc<DashMap<String, HashSet<Permission>>>,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a permission. Granting the same pair twice has no further effect.
    pub fn grant(&self, user: &User, permission: Permission) {
        self.grants
            .entry(user.id.clone())
            .or_default()
            .insert(permission);
    }

    /// Remove a grant, returning whether it existed
    pub fn revoke(&self, user: &User, permission: Permission) -> bool {
        let removed = match self.grants.get_mut(&user.id) {
            Some(mut held) => held.remove(&permission),
            None => return false,
        };
        self.grants.remove_if(&user.id, |_, held| held.is_empty());
        removed
    }

    /// True iff exactly this pair was granted
    pub fn authorize(&self, user: &User, permission: Permission) -> bool {
        self.grants
            .get(&user.id)
            .map(|held| held.contains(&permission))
            .unwrap_or(false)
    }

    /// Permissions held by a user, sorted
    pub fn permissions_of(&self, user: &User) -> Vec<Permission> {
        let mut held: Vec<Permission> = self
            .grants
            .get(&user.id)
            .map(|held| held.iter().copied().collect())
            .unwrap_or_default();
        held.sort();
        held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bob() -> User {
        User::new("2002", "bob")
    }

    #[test]
    fn test_authorize_requires_grant() {
        let gate = PermissionGate::new();
        assert!(!gate.authorize(&bob(), Permission::Everyone));

        gate.grant(&bob(), Permission::Everyone);
        assert!(gate.authorize(&bob(), Permission::Everyone));
    }

    #[test]
    fn test_grant_is_idempotent() {
        let gate = PermissionGate::new();
        gate.grant(&bob(), Permission::Moderator);
        gate.grant(&bob(), Permission::Moderator);

        assert_eq!(gate.permissions_of(&bob()), vec![Permission::Moderator]);
        assert!(gate.revoke(&bob(), Permission::Moderator));
        assert!(!gate.authorize(&bob(), Permission::Moderator));
    }

    #[test]
    fn test_grants_are_exact_match() {
        let gate = PermissionGate::new();
        gate.grant(&bob(), Permission::Owner);

        assert!(gate.authorize(&bob(), Permission::Owner));
        assert!(!gate.authorize(&bob(), Permission::Moderator));
        assert!(!gate.authorize(&bob(), Permission::Everyone));
    }

    #[test]
    fn test_grants_are_per_user() {
        let gate = PermissionGate::new();
        gate.grant(&bob(), Permission::Vip);

        let carol = User::new("3003", "carol");
        assert!(!gate.authorize(&carol, Permission::Vip));
    }

    #[test]
    fn test_grant_keyed_by_id_not_name() {
        let gate = PermissionGate::new();
        gate.grant(&bob(), Permission::Vip);

        let renamed = User::new("2002", "bobby");
        assert!(gate.authorize(&renamed, Permission::Vip));
    }

    #[test]
    fn test_revoke_missing_grant() {
        let gate = PermissionGate::new();
        assert!(!gate.revoke(&bob(), Permission::Vip));

        gate.grant(&bob(), Permission::Subscriber);
        assert!(!gate.revoke(&bob(), Permission::Vip));
        assert!(gate.authorize(&bob(), Permission::Subscriber));
    }

    #[test]
    fn test_permission_from_str() {
        assert_eq!("Moderator".parse::<Permission>().unwrap(), Permission::Moderator);
        assert_eq!("vip".parse::<Permission>().unwrap(), Permission::Vip);
        assert!("admin".parse::<Permission>().is_err());
    }

    #[test]
    fn test_permission_display_round_trips() {
        for permission in [Permission::Everyone, Permission::Broadcaster] {
            assert_eq!(permission.to_string().parse::<Permission>().unwrap(), permission);
        }
    }
}
