//! GitLab client for proposing changes to the groups document.
//!
//! A request is made by committing the modified document to a new branch
//! and opening a merge request back into the stage's branch.

#![deny(missing_docs)]

mod client;
mod error;

pub use client::{base_branch, GitlabClient, GitlabSettings, MergeRequest};
pub use error::GitlabError;
