//! groupsync CLI
//!

#![deny(missing_docs)]

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    groupsync_lib::cli().await
}
