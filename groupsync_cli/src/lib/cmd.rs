//! Commands for the groupsync CLI
//!

use std::{fmt::Display, path::PathBuf};

use clap::{self, Args, Parser, Subcommand, ValueEnum};

use groupsync_core::{credentials::DEFAULT_SECRET, logging::LevelFilter};
use groupsync_gitlab::GitlabSettings;

/// groupsync: keep a directory service's roles, groups, and users in line
/// with a reviewed document
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
pub(crate) struct GroupsyncArgs {
    #[clap(subcommand)]
    pub(crate) command: GroupsyncCommand,
    #[clap(global = true, short = 'v', long)]
    pub(crate) log_level: Option<LevelFilter>,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum GroupsyncCommand {
    /// Reconcile a groups document with a deployment of the directory service
    Sync {
        /// The deployment to sync
        #[arg(value_enum)]
        stage: Stage,
        /// Path to the groups document
        #[clap(long, value_parser)]
        file: PathBuf,
        /// Name of the deployer secret to authenticate with
        #[clap(long, default_value_t = DEFAULT_SECRET.to_owned())]
        secret: String,
        /// Show the changes without applying them
        #[clap(short, long, value_parser, default_value = "false")]
        dry_run: bool,
        /// Apply the changes without asking for confirmation
        #[clap(short, long, value_parser, default_value = "false")]
        force: bool,
        /// Use this directory url instead of the stage's deployment
        #[clap(long, hide = true)]
        url: Option<String>,
    },
    /// List the groups in a groups document that can be requested
    Groups {
        /// Path to the groups document
        #[clap(long, value_parser)]
        file: PathBuf,
    },
    /// Propose adding a user to groups with a merge request
    Request {
        /// The user to add
        #[clap(long)]
        user: String,
        /// A group to add the user to. Can be repeated.
        #[clap(long = "group", required = true)]
        groups: Vec<String>,
        #[clap(flatten)]
        gitlab: GitlabArgs,
        /// Print the modified document instead of committing it
        #[clap(short, long, value_parser, default_value = "false")]
        dry_run: bool,
    },
}

/// Where the groups document is kept.
#[derive(Args, Debug, Clone)]
pub(crate) struct GitlabArgs {
    /// GitLab API root
    #[clap(long, env = "GITLAB_API_URL")]
    pub(crate) gitlab_api_url: String,
    /// Id of the project holding the groups document
    #[clap(long, env = "GITLAB_PROJECT_ID")]
    pub(crate) gitlab_project_id: String,
    /// GitLab private token
    #[clap(long, env = "GROUPSYNC_GITLAB_TOKEN", hide_env_values = true)]
    pub(crate) gitlab_token: String,
    /// The deployment the request is for
    #[clap(long, value_enum, env = "GROUPSYNC_STAGE", default_value = "dev")]
    pub(crate) stage: Stage,
}

impl GitlabArgs {
    pub(crate) fn settings(&self) -> GitlabSettings {
        GitlabSettings {
            api_url: self.gitlab_api_url.to_owned(),
            project_id: self.gitlab_project_id.to_owned(),
            token: self.gitlab_token.to_owned(),
            stage: self.stage.to_string(),
        }
    }
}

/// A deployment of the directory service
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
pub(crate) enum Stage {
    Dev,
    Integration,
    Staging,
    Testing,
    Production,
}

impl Stage {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Stage::Dev => "dev",
            Stage::Integration => "integration",
            Stage::Staging => "staging",
            Stage::Testing => "testing",
            Stage::Production => "production",
        }
    }

    /// The deployment's base url.
    pub(crate) fn url(&self) -> &'static str {
        match self {
            Stage::Dev => "https://auth.dev.data.humancellatlas.org",
            Stage::Integration => "https://auth.integration.data.humancellatlas.org",
            Stage::Staging => "https://auth.staging.data.humancellatlas.org",
            Stage::Testing => "https://auth.testing.data.humancellatlas.org",
            Stage::Production => "https://auth.data.humancellatlas.org",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;

    #[test]
    fn production_has_no_stage_subdomain() {
        assert_eq!(Stage::Production.url(), "https://auth.data.humancellatlas.org");
        assert_eq!(
            Stage::Integration.url(),
            "https://auth.integration.data.humancellatlas.org"
        );
    }

    #[test]
    fn stage_names_match_the_cli() -> Result<()> {
        for stage in Stage::value_variants() {
            assert_eq!(Stage::from_str(stage.as_str(), false).ok(), Some(*stage));
        }
        Ok(())
    }

    #[test]
    fn sync_defaults() -> Result<()> {
        let args = GroupsyncArgs::try_parse_from([
            "groupsync",
            "sync",
            "staging",
            "--file",
            "config/groups.json",
            "-d",
        ])?;
        match args.command {
            GroupsyncCommand::Sync {
                stage,
                secret,
                dry_run,
                force,
                url,
                ..
            } => {
                assert_eq!(stage, Stage::Staging);
                assert_eq!(secret, "deployer_service_account.json");
                assert!(dry_run);
                assert!(!force);
                assert_eq!(url, None);
            }
            other => panic!("parsed the wrong command: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn unknown_stage_is_rejected() {
        assert!(
            GroupsyncArgs::try_parse_from(["groupsync", "sync", "qa", "--file", "g.json"]).is_err()
        );
    }

    #[test]
    fn request_takes_repeated_groups() -> Result<()> {
        let args = GroupsyncArgs::try_parse_from([
            "groupsync",
            "request",
            "--user",
            "a@x.org",
            "--group",
            "biologists",
            "--group",
            "chemists",
            "--gitlab-api-url",
            "https://gitlab.example.org/api/v4",
            "--gitlab-project-id",
            "42",
            "--gitlab-token",
            "abc",
            "--stage",
            "integration",
        ])?;
        match args.command {
            GroupsyncCommand::Request { groups, gitlab, .. } => {
                assert_eq!(groups, vec!["biologists", "chemists"]);
                assert_eq!(gitlab.settings().stage, "integration");
                assert_eq!(gitlab.settings().project_id, "42");
            }
            other => panic!("parsed the wrong command: {other:?}"),
        }
        Ok(())
    }
}
