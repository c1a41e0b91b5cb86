//! The change set produced by reconciliation, and the ways it is shown to
//! the operator.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

/// Entities to attach to and detach from a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Membership {
    /// Present in the config, not in the environment
    pub add: BTreeSet<String>,
    /// Present in the environment, not in the config
    pub remove: BTreeSet<String>,
}

impl Membership {
    /// Everything in `desired` is added, nothing is removed.
    pub fn adding(desired: &BTreeSet<String>) -> Self {
        Membership {
            add: desired.to_owned(),
            remove: Default::default(),
        }
    }

    /// Whether there's nothing to do.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// A role to create or whose policy to replace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleChange {
    /// Whether the role has to be created
    pub new: bool,
    /// The policy the role should end up with
    pub policy: Value,
}

/// Changes to one configured group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupChange {
    /// Whether the group has to be created
    pub new: bool,
    /// Role attachments
    pub roles: Membership,
    /// User memberships
    pub users: Membership,
}

impl GroupChange {
    /// Whether applying this would make no calls.
    pub fn is_empty(&self) -> bool {
        !self.new && self.roles.is_empty() && self.users.is_empty()
    }
}

/// What happens to one configured user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserChange {
    /// Groups the user is joining
    pub groups: BTreeSet<String>,
    /// Whether the user has to be created
    pub new: bool,
}

/// Everything needed to bring the directory in line with the config.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    /// Changes per configured group
    pub groups: BTreeMap<String, GroupChange>,
    /// Roles to create or update
    pub roles: BTreeMap<String, RoleChange>,
    /// Changes per configured user
    pub users: BTreeMap<String, UserChange>,
    /// Roles referenced by groups that neither exist nor are configured
    #[serde(skip)]
    pub missing_roles: BTreeSet<String>,
    /// Groups in the directory that the config doesn't mention. These are
    /// never touched.
    #[serde(skip)]
    pub unmanaged_groups: BTreeSet<String>,
}

impl ChangeSet {
    /// Whether applying this change set would make no calls at all.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
            && self.groups.values().all(GroupChange::is_empty)
            && self.users.values().all(|u| !u.new)
    }

    /// Roles that will be created.
    pub fn new_roles(&self) -> impl Iterator<Item = &String> {
        self.roles.iter().filter(|(_, r)| r.new).map(|(n, _)| n)
    }

    /// Existing roles whose policy will be replaced.
    pub fn updated_roles(&self) -> impl Iterator<Item = &String> {
        self.roles.iter().filter(|(_, r)| !r.new).map(|(n, _)| n)
    }

    /// Groups that will be created.
    pub fn new_groups(&self) -> impl Iterator<Item = &String> {
        self.groups.iter().filter(|(_, g)| g.new).map(|(n, _)| n)
    }

    /// Users that will be created.
    pub fn new_users(&self) -> impl Iterator<Item = &String> {
        self.users.iter().filter(|(_, u)| u.new).map(|(n, _)| n)
    }

    /// The operator-facing summary.
    pub fn preview(&self) -> Preview<'_> {
        Preview(self)
    }

    /// Per-group colored diff.
    pub fn group_diff(&self) -> GroupDiff<'_> {
        GroupDiff(self)
    }

    /// Pretty-printed JSON of everything that will be applied.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing change set")
    }
}

/// Summary of a [`ChangeSet`]: missing roles, then what will be created or
/// updated.
pub struct Preview<'a>(&'a ChangeSet);

impl Display for Preview<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cs = self.0;
        write_list(f, "The following roles do not exist:", cs.missing_roles.iter())?;
        write_list(f, "The following roles will be created:", cs.new_roles())?;
        write_list(f, "The following roles will be updated:", cs.updated_roles())?;
        write_list(f, "The following groups will be created:", cs.new_groups())?;
        write_list(f, "The following users will be created:", cs.new_users())
    }
}

fn write_list<'a>(
    f: &mut std::fmt::Formatter<'_>,
    header: &str,
    items: impl Iterator<Item = &'a String>,
) -> std::fmt::Result {
    write!(f, "{header}")?;
    for item in items {
        write!(f, "\n\t- {item}")?;
    }
    writeln!(f)
}

/// Colored diff of the configured groups that will change.
pub struct GroupDiff<'a>(&'a ChangeSet);

impl Display for GroupDiff<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut text = "".to_owned();
        for (name, group) in self.0.groups.iter().filter(|(_, g)| !g.is_empty()) {
            if group.new {
                text += format!("{}", format!("+ group: {name}\n").green()).as_str();
            } else {
                text += format!("{}{}\n", "~ group: ".yellow(), name.yellow()).as_str();
            }
            text += &membership_lines("roles", &group.roles);
            text += &membership_lines("users", &group.users);
        }
        write!(f, "{text}")
    }
}

fn membership_lines(label: &str, membership: &Membership) -> String {
    let mut text = "".to_owned();
    if membership.is_empty() {
        return text;
    }
    text += format!("  {label}:\n").as_str();
    for added in &membership.add {
        text += format!("{}", format!("    + {added}\n").green()).as_str();
    }
    for removed in &membership.remove {
        text += format!("{}", format!("    - {removed}\n").red()).as_str();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::test_util::set;

    fn sample() -> ChangeSet {
        ChangeSet {
            roles: [
                (
                    "admin".to_owned(),
                    RoleChange {
                        new: true,
                        policy: json!({"a": 1}),
                    },
                ),
                (
                    "reader".to_owned(),
                    RoleChange {
                        new: false,
                        policy: json!({"b": 2}),
                    },
                ),
            ]
            .into(),
            groups: [(
                "biologists".to_owned(),
                GroupChange {
                    new: true,
                    roles: Membership::adding(&set(&["admin"])),
                    users: Membership::adding(&set(&["a@x.org"])),
                },
            )]
            .into(),
            users: [(
                "a@x.org".to_owned(),
                UserChange {
                    new: true,
                    groups: set(&["biologists"]),
                },
            )]
            .into(),
            missing_roles: set(&["ghost"]),
            unmanaged_groups: set(&["legacy"]),
        }
    }

    #[test]
    fn preview_lists_everything() {
        let preview = sample().preview().to_string();
        assert_eq!(
            preview,
            "The following roles do not exist:\n\t- ghost\n\
             The following roles will be created:\n\t- admin\n\
             The following roles will be updated:\n\t- reader\n\
             The following groups will be created:\n\t- biologists\n\
             The following users will be created:\n\t- a@x.org\n"
        );
    }

    #[test]
    fn preview_of_empty_change_set_has_only_headers() {
        let preview = ChangeSet::default().preview().to_string();
        assert_eq!(preview.lines().count(), 5);
        assert!(!preview.contains("\t- "));
    }

    #[test]
    fn json_skips_report_only_fields() -> Result<()> {
        let value: Value = serde_json::from_str(&sample().to_json()?)?;
        assert_eq!(
            value,
            json!({
                "groups": {
                    "biologists": {
                        "new": true,
                        "roles": {"add": ["admin"], "remove": []},
                        "users": {"add": ["a@x.org"], "remove": []}
                    }
                },
                "roles": {
                    "admin": {"new": true, "policy": {"a": 1}},
                    "reader": {"new": false, "policy": {"b": 2}}
                },
                "users": {"a@x.org": {"groups": ["biologists"], "new": true}}
            })
        );
        Ok(())
    }

    #[test]
    fn is_empty_ignores_unchanged_entries() {
        let mut cs = ChangeSet::default();
        cs.groups.insert("g".to_owned(), GroupChange::default());
        cs.users.insert("u".to_owned(), UserChange::default());
        cs.missing_roles.insert("ghost".to_owned());
        assert!(cs.is_empty());

        cs.users.get_mut("u").unwrap().new = true;
        assert!(!cs.is_empty());
    }

    #[test]
    fn group_diff_shows_changed_groups_only() {
        colored::control::set_override(false);
        let mut cs = sample();
        cs.groups.insert("quiet".to_owned(), GroupChange::default());
        cs.groups.insert(
            "chemists".to_owned(),
            GroupChange {
                new: false,
                roles: Membership::default(),
                users: Membership {
                    add: set(&["c@x.org"]),
                    remove: set(&["d@x.org"]),
                },
            },
        );
        let diff = cs.group_diff().to_string();
        assert_eq!(
            diff,
            "+ group: biologists\n  roles:\n    + admin\n  users:\n    + a@x.org\n\
             ~ group: chemists\n  users:\n    + c@x.org\n    - d@x.org\n"
        );
    }
}
