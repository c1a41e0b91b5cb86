//! Reconcile a groups document with a deployment and apply the changes

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use inquire::Text;

use groupsync_core::{
    apply::{apply, ApplyReport},
    credentials::{deployer_secret_id, DirectoryCredentials},
    log_runtime,
    logging::info,
    project, reconcile, DesiredConfig,
};
use groupsync_directory::DirectoryClient;

use crate::cmd::Stage;

pub(super) struct SyncOptions<'a> {
    pub(super) stage: Stage,
    pub(super) secret: &'a str,
    pub(super) dry_run: bool,
    pub(super) force: bool,
    pub(super) url: Option<&'a str>,
}

/// How a sync ended.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Outcome {
    NoChanges,
    DryRun,
    Declined,
    Applied(ApplyReport),
}

pub(super) async fn sync(file: &Path, options: &SyncOptions<'_>) -> Result<()> {
    let desired = DesiredConfig::read_from_file(file)?;

    let secret_id = deployer_secret_id(options.stage.as_str(), options.secret);
    let credentials = DirectoryCredentials::resolve(&secret_id, project::credentials_cfg_path())?;
    let url = options.url.unwrap_or_else(|| options.stage.url());
    info!("syncing {} with {url}", file.display());
    let client = DirectoryClient::new(url, credentials)?;

    sync_with(&desired, &client, options, confirm).await?;
    Ok(())
}

async fn sync_with(
    desired: &DesiredConfig,
    client: &DirectoryClient,
    options: &SyncOptions<'_>,
    confirm: impl FnOnce() -> Result<bool>,
) -> Result<Outcome> {
    let change_set = log_runtime!("reconciling", reconcile(desired, client).await?);

    print!("{}", change_set.preview());
    // Exit early if there haven't been any changes
    if change_set.is_empty() {
        println!("No changes found");
        return Ok(Outcome::NoChanges);
    }
    println!("The following changes will be made:\n{}", change_set.to_json()?);

    if options.dry_run {
        println!("\n{}", change_set.group_diff());
        return Ok(Outcome::DryRun);
    }
    if !options.force && !confirm()? {
        println!("Changes were not applied.");
        return Ok(Outcome::Declined);
    }

    let report = log_runtime!("applying changes", apply(&change_set, client).await?);
    println!("{}", textwrap::indent(&report.to_string(), "  "));
    println!("{}", "Done!".green());
    Ok(Outcome::Applied(report))
}

fn confirm() -> Result<bool> {
    let answer = Text::new("Type 'yes' to confirm these changes:").prompt()?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}
