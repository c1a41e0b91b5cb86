//! Typed errors for problems with the desired-state document.

use thiserror::Error;

/// Problems found while reading or editing a desired-state document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A requested group does not exist in the document.
    #[error("group `{group}` not found in configuration groups: [{available}]")]
    MalformedConfig {
        /// The group that was asked for
        group: String,
        /// Comma-separated names of the groups that do exist
        available: String,
    },
    /// The document has no `groups` object at all.
    #[error("configuration has no `groups` object")]
    MissingGroups,
    /// A group's `users` entry is present but isn't a list.
    #[error("`users` of group `{group}` is not a list")]
    InvalidUsers {
        /// The offending group
        group: String,
    },
    /// A role, group or user name is empty.
    #[error("configuration contains an empty {kind} name")]
    EmptyName {
        /// What kind of name was empty
        kind: &'static str,
    },
}
