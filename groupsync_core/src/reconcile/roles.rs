//! Diffing of configured roles vs. the directory

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::{
    changeset::RoleChange,
    config::DesiredConfig,
    logging::{debug, warn},
    remote::DirectoryReader,
};

/// Configured and referenced roles, split by what the directory already has.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RolePartition {
    /// Configured and already in the directory
    pub(crate) update: BTreeSet<String>,
    /// Configured, not yet in the directory
    pub(crate) new: BTreeSet<String>,
    /// Referenced by a group, but neither configured nor in the directory
    pub(crate) missing: BTreeSet<String>,
}

/// Split roles into those to update, to create, and those that can't be found anywhere.
pub(crate) fn partition_roles(
    desired: &DesiredConfig,
    existing_roles: &BTreeSet<String>,
) -> RolePartition {
    let config_roles: BTreeSet<String> = desired.roles.keys().cloned().collect();
    let update: BTreeSet<String> = config_roles.intersection(existing_roles).cloned().collect();
    let new: BTreeSet<String> = config_roles.difference(&update).cloned().collect();
    let missing = desired
        .group_roles()
        .into_iter()
        .filter(|r| !existing_roles.contains(r) && !new.contains(r))
        .collect::<BTreeSet<_>>();

    for role in &missing {
        warn!("role `{role}` is referenced by a group but does not exist; it will not be attached");
    }

    RolePartition {
        update,
        new,
        missing,
    }
}

/// Create entries for new roles, and update entries for existing roles whose
/// stored policy differs from the configured one.
pub(crate) async fn role_changes(
    desired: &DesiredConfig,
    partition: &RolePartition,
    remote: &dyn DirectoryReader,
) -> Result<BTreeMap<String, RoleChange>> {
    let mut changes = BTreeMap::new();

    for name in &partition.new {
        changes.insert(
            name.to_owned(),
            RoleChange {
                new: true,
                policy: desired.roles[name].policy.to_owned(),
            },
        );
    }

    for name in &partition.update {
        let configured = &desired.roles[name].policy;
        let stored = remote
            .get_role_policy(name)
            .await
            .with_context(|| format!("fetching policy for role {name}"))?;
        // a role stored without a policy matches a configured null policy
        if stored.unwrap_or(Value::Null) == *configured {
            debug!("role {name} is up to date");
            continue;
        }
        changes.insert(
            name.to_owned(),
            RoleChange {
                new: false,
                policy: configured.to_owned(),
            },
        );
    }

    Ok(changes)
}
