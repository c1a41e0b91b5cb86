//! An in-memory directory for tests.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Mutex,
};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::{
    apply::MEMBERSHIP_BATCH_SIZE,
    remote::{DirectoryReader, DirectoryWriter, Lookup, MembershipAction},
};

#[derive(Default, Clone)]
struct FakeGroup {
    roles: BTreeSet<String>,
    users: BTreeSet<String>,
}

#[derive(Default, Clone)]
struct FakeState {
    roles: BTreeMap<String, Value>,
    groups: BTreeMap<String, FakeGroup>,
    users: BTreeSet<String>,
}

/// Behaves like the directory service: writes must respect existence
/// (roles and users before memberships) and the batch size.
#[derive(Default)]
pub(crate) struct FakeDirectory {
    state: Mutex<FakeState>,
    calls: Mutex<Vec<String>>,
    reads: Mutex<Vec<String>>,
}

pub(crate) fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl FakeDirectory {
    pub(crate) fn with_role(self, name: &str, policy: Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .roles
            .insert(name.to_owned(), policy);
        self
    }

    pub(crate) fn with_user(self, name: &str) -> Self {
        self.state.lock().unwrap().users.insert(name.to_owned());
        self
    }

    /// Adds the group, registering its users as existing users.
    pub(crate) fn with_group(self, name: &str, roles: &[&str], users: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.users.extend(set(users));
            state.groups.insert(
                name.to_owned(),
                FakeGroup {
                    roles: set(roles),
                    users: set(users),
                },
            );
        }
        self
    }

    /// Every write made so far, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Every per-entity read made so far, in order.
    pub(crate) fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    pub(crate) fn group_users(&self, group: &str) -> BTreeSet<String> {
        self.state.lock().unwrap().groups[group].users.clone()
    }

    pub(crate) fn group_roles(&self, group: &str) -> BTreeSet<String> {
        self.state.lock().unwrap().groups[group].roles.clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn read(&self, call: String) {
        self.reads.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DirectoryReader for FakeDirectory {
    async fn list_roles(&self) -> Result<BTreeSet<String>> {
        Ok(self.state.lock().unwrap().roles.keys().cloned().collect())
    }

    async fn get_role_policy(&self, role: &str) -> Result<Option<Value>> {
        self.read(format!("role {role}"));
        let state = self.state.lock().unwrap();
        let policy = state
            .roles
            .get(role)
            .ok_or_else(|| anyhow!("404 for role {role}"))?;
        Ok(match policy {
            Value::Null => None,
            p => Some(p.to_owned()),
        })
    }

    async fn list_groups(&self) -> Result<BTreeSet<String>> {
        Ok(self.state.lock().unwrap().groups.keys().cloned().collect())
    }

    async fn list_group_roles(&self, group: &str) -> Result<Lookup<BTreeSet<String>>> {
        self.read(format!("group roles {group}"));
        let state = self.state.lock().unwrap();
        Ok(match state.groups.get(group) {
            Some(g) => Lookup::Found(g.roles.clone()),
            None => Lookup::NotFound,
        })
    }

    async fn list_group_users(&self, group: &str) -> Result<Lookup<BTreeSet<String>>> {
        self.read(format!("group users {group}"));
        let state = self.state.lock().unwrap();
        Ok(match state.groups.get(group) {
            Some(g) => Lookup::Found(g.users.clone()),
            None => Lookup::NotFound,
        })
    }

    async fn list_user_groups(&self, user: &str) -> Result<Lookup<BTreeSet<String>>> {
        self.read(format!("user groups {user}"));
        let state = self.state.lock().unwrap();
        if !state.users.contains(user) {
            return Ok(Lookup::NotFound);
        }
        Ok(Lookup::Found(
            state
                .groups
                .iter()
                .filter(|(_, g)| g.users.contains(user))
                .map(|(n, _)| n.to_owned())
                .collect(),
        ))
    }
}

#[async_trait]
impl DirectoryWriter for FakeDirectory {
    async fn create_role(&self, role: &str, policy: &Value) -> Result<()> {
        self.record(format!("create_role {role}"));
        let mut state = self.state.lock().unwrap();
        if state.roles.contains_key(role) {
            bail!("409: role {role} exists");
        }
        state.roles.insert(role.to_owned(), policy.to_owned());
        Ok(())
    }

    async fn update_role_policy(&self, role: &str, policy: &Value) -> Result<()> {
        self.record(format!("update_role_policy {role}"));
        let mut state = self.state.lock().unwrap();
        let stored = state
            .roles
            .get_mut(role)
            .ok_or_else(|| anyhow!("404: role {role}"))?;
        *stored = policy.to_owned();
        Ok(())
    }

    async fn create_user(&self, user: &str) -> Result<()> {
        self.record(format!("create_user {user}"));
        if !self.state.lock().unwrap().users.insert(user.to_owned()) {
            bail!("409: user {user} exists");
        }
        Ok(())
    }

    async fn create_group(&self, group: &str) -> Result<()> {
        self.record(format!("create_group {group}"));
        let mut state = self.state.lock().unwrap();
        if state.groups.contains_key(group) {
            bail!("409: group {group} exists");
        }
        state.groups.insert(group.to_owned(), Default::default());
        Ok(())
    }

    async fn modify_group_roles(
        &self,
        group: &str,
        action: MembershipAction,
        roles: &[String],
    ) -> Result<()> {
        self.record(format!("modify_group_roles {group} {action} {}", roles.len()));
        if roles.len() > MEMBERSHIP_BATCH_SIZE {
            bail!("400: too many roles");
        }
        let mut state = self.state.lock().unwrap();
        let known_roles: BTreeSet<String> = state.roles.keys().cloned().collect();
        let g = state
            .groups
            .get_mut(group)
            .ok_or_else(|| anyhow!("404: group {group}"))?;
        for role in roles {
            match action {
                MembershipAction::Add => {
                    if !known_roles.contains(role) {
                        bail!("404: role {role}");
                    }
                    g.roles.insert(role.to_owned());
                }
                MembershipAction::Remove => {
                    g.roles.remove(role);
                }
            }
        }
        Ok(())
    }

    async fn modify_group_users(
        &self,
        group: &str,
        action: MembershipAction,
        users: &[String],
    ) -> Result<()> {
        self.record(format!("modify_group_users {group} {action} {}", users.len()));
        if users.len() > MEMBERSHIP_BATCH_SIZE {
            bail!("400: too many users");
        }
        let mut state = self.state.lock().unwrap();
        let known_users = state.users.clone();
        let g = state
            .groups
            .get_mut(group)
            .ok_or_else(|| anyhow!("404: group {group}"))?;
        for user in users {
            match action {
                MembershipAction::Add => {
                    if !known_users.contains(user) {
                        bail!("404: user {user}");
                    }
                    g.users.insert(user.to_owned());
                }
                MembershipAction::Remove => {
                    g.users.remove(user);
                }
            }
        }
        Ok(())
    }
}
