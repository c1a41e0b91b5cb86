//! Apply a ChangeSet to the directory.
//!
//! Changes are applied in a fixed order, roles, then users, then groups, so
//! that group memberships only ever refer to roles and users that exist.
//! The first failure stops the run; nothing already written is rolled back.
//! Re-running reconciliation picks up where a failed run left off.

use std::{collections::BTreeSet, fmt::Display};

use anyhow::{Context, Result};

use crate::{
    changeset::{ChangeSet, GroupChange},
    logging::{debug, info},
    remote::{DirectoryWriter, MembershipAction},
};

/// The directory rejects membership calls carrying more entities than this.
pub const MEMBERSHIP_BATCH_SIZE: usize = 10;

/// What was done, in order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// One line per role, user, or group touched
    pub actions: Vec<String>,
}

impl Display for ApplyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for action in &self.actions {
            writeln!(f, "{action}")?;
        }
        Ok(())
    }
}

impl ApplyReport {
    fn push(&mut self, action: String) {
        info!("{action}");
        self.actions.push(action);
    }
}

#[derive(Debug, Clone, Copy)]
enum Member {
    Roles,
    Users,
}

/// Apply every change in `change_set`.
pub async fn apply(change_set: &ChangeSet, writer: &dyn DirectoryWriter) -> Result<ApplyReport> {
    let mut report = ApplyReport::default();

    for (name, role) in &change_set.roles {
        if role.new {
            writer
                .create_role(name, &role.policy)
                .await
                .with_context(|| format!("creating role {name}"))?;
            report.push(format!("Created role {name}."));
        } else {
            writer
                .update_role_policy(name, &role.policy)
                .await
                .with_context(|| format!("updating role {name}"))?;
            report.push(format!("Updated role {name}."));
        }
    }

    for user in change_set.new_users() {
        writer
            .create_user(user)
            .await
            .with_context(|| format!("creating user {user}"))?;
        report.push(format!("Created user {user}."));
    }

    for (name, group) in change_set.groups.iter().filter(|(_, g)| !g.is_empty()) {
        apply_group(name, group, writer).await?;
        report.push(if group.new {
            format!("Created group {name}.")
        } else {
            format!("Updated group {name}.")
        });
    }

    Ok(report)
}

async fn apply_group(name: &str, group: &GroupChange, writer: &dyn DirectoryWriter) -> Result<()> {
    if group.new {
        writer
            .create_group(name)
            .await
            .with_context(|| format!("creating group {name}"))?;
    }
    modify_in_batches(writer, name, Member::Roles, MembershipAction::Add, &group.roles.add).await?;
    modify_in_batches(writer, name, Member::Roles, MembershipAction::Remove, &group.roles.remove)
        .await?;
    modify_in_batches(writer, name, Member::Users, MembershipAction::Add, &group.users.add).await?;
    modify_in_batches(writer, name, Member::Users, MembershipAction::Remove, &group.users.remove)
        .await
}

async fn modify_in_batches(
    writer: &dyn DirectoryWriter,
    group: &str,
    member: Member,
    action: MembershipAction,
    entities: &BTreeSet<String>,
) -> Result<()> {
    let entities = entities.iter().cloned().collect::<Vec<_>>();
    for batch in entities.chunks(MEMBERSHIP_BATCH_SIZE) {
        debug!("{action} {} {member:?} for group {group}", batch.len());
        let res = match member {
            Member::Roles => writer.modify_group_roles(group, action, batch).await,
            Member::Users => writer.modify_group_users(group, action, batch).await,
        };
        res.with_context(|| format!("trying to {action} {member:?} for group {group}"))?;
    }
    Ok(())
}
