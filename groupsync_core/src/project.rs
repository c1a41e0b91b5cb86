//! Path utilities for groupsync.
//!
//! Local state lives in the user's home directory:
//!
//! ```text
//! ~
//!  └── .groupsync
//!       └── credentials.yaml
//! ```
//!
//! The desired-state document lives in the configuration repository at
//! `config/groups.json`.

use std::path::PathBuf;

use dirs::home_dir;
use lazy_static::lazy_static;

lazy_static! {
    static ref PROFILE_CFG_DIR: PathBuf = PathBuf::from(".groupsync");
    static ref CREDENTIALS_CFG: PathBuf = PathBuf::from("credentials.yaml");
    static ref GROUPS_DOCUMENT: PathBuf = PathBuf::from("config").join("groups.json");
}

/// Path to the user-level profile directory (`~/.groupsync`).
pub fn profile_cfg_path() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(PROFILE_CFG_DIR.as_path())
}

/// Path to the credentials file (`~/.groupsync/credentials.yaml`).
pub fn credentials_cfg_path() -> PathBuf {
    profile_cfg_path().join(CREDENTIALS_CFG.as_path())
}

/// Repository-relative path of the desired-state document.
pub fn groups_document_path() -> PathBuf {
    GROUPS_DOCUMENT.to_owned()
}
