//! Reconcile the desired-state config with the directory. Return a ChangeSet.

mod groups;
mod roles;
mod users;
pub(crate) mod utils;

pub use groups::DEFAULT_GROUP;

use std::collections::BTreeSet;

use anyhow::{Context, Result};

use crate::{
    changeset::ChangeSet,
    config::DesiredConfig,
    logging::{debug, info},
    remote::DirectoryReader,
};

/// Compute the changes needed to make the directory match `desired`.
///
/// Nothing is written. The directory is read once, up front for the role
/// and group listings and then lazily per group and per user; any read
/// failure other than not-found aborts the whole reconciliation.
pub async fn reconcile(desired: &DesiredConfig, remote: &dyn DirectoryReader) -> Result<ChangeSet> {
    let existing_roles = remote.list_roles().await.context("listing roles")?;
    let role_partition = roles::partition_roles(desired, &existing_roles);

    let current_groups = remote.list_groups().await.context("listing groups")?;
    let config_groups: BTreeSet<String> = desired.groups.keys().cloned().collect();
    let missing_groups: BTreeSet<String> =
        config_groups.difference(&current_groups).cloned().collect();
    let unmanaged_groups: BTreeSet<String> =
        current_groups.difference(&config_groups).cloned().collect();
    if !unmanaged_groups.is_empty() {
        info!(
            "{} groups exist but are not configured; they will be left alone",
            unmanaged_groups.len()
        );
        debug!("unmanaged groups: {unmanaged_groups:?}");
    }

    let role_changes = roles::role_changes(desired, &role_partition, remote).await?;
    let group_changes =
        groups::group_changes(desired, &missing_groups, &role_partition.missing, remote).await?;
    let user_changes = users::user_changes(&desired.user_memberships(), remote).await?;

    Ok(ChangeSet {
        groups: group_changes,
        roles: role_changes,
        users: user_changes,
        missing_roles: role_partition.missing,
        unmanaged_groups,
    })
}
