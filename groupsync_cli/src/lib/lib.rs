//! Full CLI library for groupsync
//!

#![deny(missing_docs)]

mod cmd;
mod groups;
mod request;
mod sync;

use anyhow::Result;
use clap::Parser;
use human_panic::setup_panic;

use groupsync_core::logging;

use cmd::{GroupsyncArgs, GroupsyncCommand};

/// Main CLI entrypoint.
pub async fn cli() -> Result<()> {
    setup_panic!();
    let args = GroupsyncArgs::parse();
    logging::setup(args.log_level);

    match &args.command {
        GroupsyncCommand::Sync {
            stage,
            file,
            secret,
            dry_run,
            force,
            url,
        } => {
            let options = sync::SyncOptions {
                stage: *stage,
                secret,
                dry_run: *dry_run,
                force: *force,
                url: url.as_deref(),
            };
            sync::sync(file, &options).await?;
        }
        GroupsyncCommand::Groups { file } => {
            groups::groups(file)?;
        }
        GroupsyncCommand::Request {
            user,
            groups,
            gitlab,
            dry_run,
        } => {
            request::request(user, groups, gitlab, *dry_run).await?;
        }
    }

    Ok(())
}
