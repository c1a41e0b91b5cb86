//! The desired-state document: roles, groups, and the users in each group.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::ConfigError, logging::debug};

/// Desired state, as represented in the JSON document.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct DesiredConfig {
    /// Role name -> role definition
    #[serde(default)]
    pub roles: BTreeMap<String, RoleConfig>,
    /// Group name -> group definition
    #[serde(default)]
    pub groups: BTreeMap<String, GroupConfig>,
}

/// A role and the policy it should carry.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RoleConfig {
    /// Opaque policy document
    pub policy: Value,
}

/// A group, with the roles attached to it and the users in it.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    /// Names of the roles attached to the group
    #[serde(default)]
    pub roles: Vec<String>,
    /// Identifiers of the users in the group
    #[serde(default)]
    pub users: Vec<String>,
}

impl DesiredConfig {
    /// Read and validate a desired-state document from disk.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        debug!("reading desired state from {:?}", path.as_ref());
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.as_ref().display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing {}", path.as_ref().display()))
    }

    /// Parse and validate a desired-state document.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: DesiredConfig =
            serde_json::from_str(raw).context("deserializing configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Names are plain strings, but they can't be empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roles.keys().any(String::is_empty) {
            return Err(ConfigError::EmptyName { kind: "role" });
        }
        for (name, group) in &self.groups {
            if name.is_empty() {
                return Err(ConfigError::EmptyName { kind: "group" });
            }
            if group.roles.iter().any(String::is_empty) {
                return Err(ConfigError::EmptyName { kind: "role" });
            }
            if group.users.iter().any(String::is_empty) {
                return Err(ConfigError::EmptyName { kind: "user" });
            }
        }
        Ok(())
    }

    /// Every role referenced by any group.
    pub fn group_roles(&self) -> BTreeSet<String> {
        self.groups
            .values()
            .flat_map(|g| g.roles.iter().cloned())
            .collect()
    }

    /// Every user referenced by any group, with the groups that reference them.
    pub fn user_memberships(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut users: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (name, group) in &self.groups {
            for user in &group.users {
                users
                    .entry(user.to_owned())
                    .or_default()
                    .insert(name.to_owned());
            }
        }
        users
    }
}
