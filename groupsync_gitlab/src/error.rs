use reqwest::StatusCode;
use thiserror::Error;

/// A GitLab call that didn't go through.
#[derive(Error, Debug)]
pub enum GitlabError {
    /// The file couldn't be read from the base branch.
    #[error("unable to fetch {path} from branch ({branch}): {status}")]
    FileNotFetched {
        /// Path in the repository
        path: String,
        /// Branch read from
        branch: String,
        /// Response status
        status: StatusCode,
    },
    /// The commit was rejected.
    #[error("error calling GitLab to commit proposed changes to branch ({branch}): {status}")]
    CommitFailed {
        /// Branch written to
        branch: String,
        /// Response status
        status: StatusCode,
    },
    /// The merge request couldn't be opened.
    #[error("error opening a merge request from branch ({branch}): {status}")]
    MergeRequestFailed {
        /// Source branch
        branch: String,
        /// Response status
        status: StatusCode,
    },
}
