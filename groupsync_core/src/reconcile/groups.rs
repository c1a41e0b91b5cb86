//! Diffing of configured groups vs. the directory

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};

use crate::{
    changeset::{GroupChange, Membership},
    config::{DesiredConfig, GroupConfig},
    logging::{debug, warn},
    remote::{DirectoryReader, Lookup},
};

use super::utils::membership_between;

/// Every user belongs to this group. Membership is managed elsewhere, so
/// users are never removed from it, and only ever added when the group is
/// first created.
pub const DEFAULT_GROUP: &str = "user_default";

/// Generate the changes for every group in the config.
pub(crate) async fn group_changes(
    desired: &DesiredConfig,
    missing_groups: &BTreeSet<String>,
    missing_roles: &BTreeSet<String>,
    remote: &dyn DirectoryReader,
) -> Result<BTreeMap<String, GroupChange>> {
    let mut changes = BTreeMap::new();

    for (name, group) in &desired.groups {
        let (desired_roles, desired_users) = desired_members(group, missing_roles);

        let change = if missing_groups.contains(name) {
            new_group(&desired_roles, &desired_users)
        } else {
            match diff_existing_group(name, &desired_roles, &desired_users, remote)
                .await
                .with_context(|| format!("diffing group {name}"))?
            {
                Lookup::Found(change) => change,
                Lookup::NotFound => {
                    warn!("group {name} was listed but could not be found; it will be created");
                    new_group(&desired_roles, &desired_users)
                }
            }
        };
        changes.insert(name.to_owned(), change);
    }

    Ok(changes)
}

/// The configured roles (minus the ones that can't be attached) and users.
fn desired_members(
    group: &GroupConfig,
    missing_roles: &BTreeSet<String>,
) -> (BTreeSet<String>, BTreeSet<String>) {
    (
        group
            .roles
            .iter()
            .filter(|r| !missing_roles.contains(*r))
            .cloned()
            .collect(),
        group.users.iter().cloned().collect(),
    )
}

fn new_group(desired_roles: &BTreeSet<String>, desired_users: &BTreeSet<String>) -> GroupChange {
    GroupChange {
        new: true,
        roles: Membership::adding(desired_roles),
        users: Membership::adding(desired_users),
    }
}

/// Diff the roles and users of a group the directory already has.
async fn diff_existing_group(
    name: &str,
    desired_roles: &BTreeSet<String>,
    desired_users: &BTreeSet<String>,
    remote: &dyn DirectoryReader,
) -> Result<Lookup<GroupChange>> {
    let users = if name == DEFAULT_GROUP {
        debug!("leaving the membership of {name} alone");
        Membership::default()
    } else {
        match remote.list_group_users(name).await? {
            Lookup::Found(current) => membership_between(desired_users, &current),
            Lookup::NotFound => return Ok(Lookup::NotFound),
        }
    };

    let roles = match remote.list_group_roles(name).await? {
        Lookup::Found(current) => membership_between(desired_roles, &current),
        Lookup::NotFound => return Ok(Lookup::NotFound),
    };

    Ok(Lookup::Found(GroupChange {
        new: false,
        roles,
        users,
    }))
}
