//! Capabilities of the remote directory service.
//!
//! Reads and writes are split so that reconciliation can only ever read.

use std::{collections::BTreeSet, fmt::Display};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// The result of looking up an entity that may not exist yet.
///
/// Not-found is a meaningful branch (create vs. diff), not a failure, so it
/// is returned as a value rather than as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The entity exists
    Found(T),
    /// The entity doesn't exist
    NotFound,
}

impl<T> Lookup<T> {
    /// Convert into an option, dropping the distinction.
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(t) => Some(t),
            Lookup::NotFound => None,
        }
    }
}

/// Read access to roles, groups, users, and their memberships.
///
/// Every set returned is complete: paginated collections are fully drained
/// before returning.
#[async_trait]
pub trait DirectoryReader: Send + Sync {
    /// Names of all roles.
    async fn list_roles(&self) -> Result<BTreeSet<String>>;
    /// The stored policy of an existing role, if it has one.
    async fn get_role_policy(&self, role: &str) -> Result<Option<Value>>;
    /// Names of all groups.
    async fn list_groups(&self) -> Result<BTreeSet<String>>;
    /// Roles attached to a group.
    async fn list_group_roles(&self, group: &str) -> Result<Lookup<BTreeSet<String>>>;
    /// Users in a group.
    async fn list_group_users(&self, group: &str) -> Result<Lookup<BTreeSet<String>>>;
    /// Groups a user belongs to.
    async fn list_user_groups(&self, user: &str) -> Result<Lookup<BTreeSet<String>>>;
}

/// Whether members are being attached to or detached from a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MembershipAction {
    /// Attach
    Add,
    /// Detach
    Remove,
}

impl MembershipAction {
    /// The value used for the `action` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipAction::Add => "add",
            MembershipAction::Remove => "remove",
        }
    }
}

impl Display for MembershipAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Write access to the directory. Membership calls take at most
/// [`crate::apply::MEMBERSHIP_BATCH_SIZE`] entities at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryWriter: Send + Sync {
    /// Create a role with a policy.
    async fn create_role(&self, role: &str, policy: &Value) -> Result<()>;
    /// Replace the policy of an existing role.
    async fn update_role_policy(&self, role: &str, policy: &Value) -> Result<()>;
    /// Create a user.
    async fn create_user(&self, user: &str) -> Result<()>;
    /// Create an empty group.
    async fn create_group(&self, group: &str) -> Result<()>;
    /// Attach or detach a batch of roles.
    async fn modify_group_roles(
        &self,
        group: &str,
        action: MembershipAction,
        roles: &[String],
    ) -> Result<()>;
    /// Add or remove a batch of users.
    async fn modify_group_users(
        &self,
        group: &str,
        action: MembershipAction,
        users: &[String],
    ) -> Result<()>;
}
