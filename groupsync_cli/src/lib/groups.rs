//! List the groups a user can ask to join

use std::{fs, path::Path};

use anyhow::{Context, Result};
use groupsync_core::access_request::requestable_groups;
use serde_json::Value;

pub(super) fn groups(file: &Path) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("unable to read {}", file.display()))?;
    let document: Value = serde_json::from_str(&raw).context("parsing groups document")?;

    for group in requestable_groups(&document)? {
        println!("{group}");
    }
    Ok(())
}
