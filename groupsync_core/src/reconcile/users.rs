//! Diffing of the users referenced by the config vs. the directory

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};

use crate::{
    changeset::UserChange,
    remote::{DirectoryReader, Lookup},
};

/// Work out which users need creating and which groups each one is joining.
///
/// Users are never taken out of groups here: removals happen at the group
/// level, and only for groups in the config.
pub(crate) async fn user_changes(
    config_users: &BTreeMap<String, BTreeSet<String>>,
    remote: &dyn DirectoryReader,
) -> Result<BTreeMap<String, UserChange>> {
    let mut changes = BTreeMap::new();
    for (user, desired_groups) in config_users {
        let change = match remote
            .list_user_groups(user)
            .await
            .with_context(|| format!("fetching groups for user {user}"))?
        {
            Lookup::Found(current) => UserChange {
                groups: desired_groups.difference(&current).cloned().collect(),
                new: false,
            },
            Lookup::NotFound => UserChange {
                groups: desired_groups.to_owned(),
                new: true,
            },
        };
        changes.insert(user.to_owned(), change);
    }
    Ok(changes)
}
