//! Propose a group membership by merge request

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;

use groupsync_core::{
    access_request::{add_user_to_groups, requestable_groups, to_document_string},
    error::ConfigError,
    logging::info,
    project,
};
use groupsync_gitlab::{GitlabClient, MergeRequest};

use crate::cmd::GitlabArgs;

pub(super) async fn request(
    user: &str,
    groups: &[String],
    gitlab: &GitlabArgs,
    dry_run: bool,
) -> Result<()> {
    let client = GitlabClient::new(gitlab.settings())?;
    match request_with(&client, user, groups, dry_run).await? {
        Some(mr) => println!(
            "{} {}",
            format!("Opened merge request !{}:", mr.iid).green(),
            mr.web_url
        ),
        None => println!("No merge request opened."),
    }
    Ok(())
}

async fn request_with(
    client: &GitlabClient,
    user: &str,
    groups: &[String],
    dry_run: bool,
) -> Result<Option<MergeRequest>> {
    let path = project::groups_document_path()
        .to_string_lossy()
        .replace('\\', "/");
    let raw = client.get_file(&path).await?;
    let document: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {path} from branch {}", client.base_branch()))?;

    check_requestable(&document, groups)?;
    let updated = add_user_to_groups(&document, user, groups)?;
    if updated == document {
        println!("{user} is already in every requested group");
        return Ok(None);
    }

    let content = to_document_string(&updated)?;
    if dry_run {
        println!("{}", textwrap::indent(&content, "  "));
        return Ok(None);
    }

    info!("committing request to {}", client.branch());
    client.commit_file(&path, &content).await?;
    let title = format!("Request to add {user} to {}", groups.join(", "));
    client.create_merge_request(&title).await.map(Some)
}

/// Everyone is already in the default group, so it can't be asked for.
fn check_requestable(document: &Value, groups: &[String]) -> Result<(), ConfigError> {
    let requestable = requestable_groups(document)?;
    match groups.iter().find(|g| !requestable.contains(g)) {
        Some(group) => Err(ConfigError::MalformedConfig {
            group: group.to_owned(),
            available: requestable.join(", "),
        }),
        None => Ok(()),
    }
}
