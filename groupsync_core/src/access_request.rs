//! Edit the desired-state document on behalf of a user requesting access.
//!
//! These work on the raw JSON document rather than [`crate::DesiredConfig`]
//! so that whatever else is in the file, and the order of its keys, comes
//! through untouched.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::{error::ConfigError, reconcile::DEFAULT_GROUP};

/// Groups a user can ask to join: everything in the document except the
/// default group, which everyone is already in.
pub fn requestable_groups(document: &Value) -> Result<Vec<String>, ConfigError> {
    let groups = document
        .get("groups")
        .and_then(Value::as_object)
        .ok_or(ConfigError::MissingGroups)?;
    Ok(groups
        .keys()
        .filter(|g| g.as_str() != DEFAULT_GROUP)
        .cloned()
        .collect())
}

/// Return a copy of `document` with `user` added to each of `groups`.
///
/// The user is inserted in sorted position. Groups the user is already in
/// are left as they are.
pub fn add_user_to_groups(
    document: &Value,
    user: &str,
    groups: &[String],
) -> Result<Value, ConfigError> {
    let mut modified = document.to_owned();
    let config_groups = modified
        .get_mut("groups")
        .and_then(Value::as_object_mut)
        .ok_or(ConfigError::MissingGroups)?;

    for group in groups {
        let available = config_groups
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        let group_data = config_groups
            .get_mut(group)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| ConfigError::MalformedConfig {
                group: group.to_owned(),
                available,
            })?;

        let users = group_data
            .entry("users")
            .or_insert_with(|| Value::Array(vec![]));
        if users.is_null() {
            *users = Value::Array(vec![]);
        }
        let users = users
            .as_array_mut()
            .ok_or_else(|| ConfigError::InvalidUsers {
                group: group.to_owned(),
            })?;

        if users.iter().any(|u| u.as_str() == Some(user)) {
            continue;
        }
        let position = users
            .iter()
            .position(|u| u.as_str().map_or(false, |u| u > user))
            .unwrap_or(users.len());
        users.insert(position, Value::String(user.to_owned()));
    }

    Ok(modified)
}

/// Serialize a document the way it's committed: two-space indentation.
pub fn to_document_string(document: &Value) -> Result<String> {
    serde_json::to_string_pretty(document).context("serializing configuration document")
}
