use anyhow::{Context, Result};
use groupsync_core::logging::{debug, error};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use time::{macros::format_description, OffsetDateTime};

use crate::GitlabError;

const COMMIT_MESSAGE: &str = "This commit was created by groupsync";
const MERGE_REQUEST_DESCRIPTION: &str = "This merge request was opened automatically.";

/// Where the groups document lives and how to reach it.
#[derive(Debug, Clone, Default)]
pub struct GitlabSettings {
    /// GitLab API root, e.g. `https://gitlab.example.org/api/v4`
    pub api_url: String,
    /// Id of the project holding the document
    pub project_id: String,
    /// Private access token
    pub token: String,
    /// Deployment stage the request is for
    pub stage: String,
}

/// The merge request that was opened.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MergeRequest {
    /// Project-scoped id
    pub iid: u64,
    /// Link for humans
    pub web_url: String,
}

/// The branch a stage's document lives on. `dev` is on `master`.
pub fn base_branch(stage: &str) -> String {
    match stage {
        "dev" => "master".to_owned(),
        other => other.to_owned(),
    }
}

/// Talks to a single GitLab project. Every client proposes its changes on
/// one new branch, named when the client is created.
pub struct GitlabClient {
    settings: GitlabSettings,
    base_branch: String,
    branch: String,
    http_client: reqwest::Client,
}

impl GitlabClient {
    /// Create a client whose new branch is stamped with the current time.
    pub fn new(settings: GitlabSettings) -> Result<Self> {
        Self::with_timestamp(settings, OffsetDateTime::now_utc())
    }

    /// Create a client whose new branch is stamped with `at`.
    pub fn with_timestamp(settings: GitlabSettings, at: OffsetDateTime) -> Result<Self> {
        let base_branch = base_branch(&settings.stage);
        let stamp = at
            .format(format_description!(
                "[year][month][day]-[hour][minute][second]"
            ))
            .context("formatting branch timestamp")?;
        let branch = format!("{base_branch}-{stamp}");
        Ok(GitlabClient {
            settings,
            base_branch,
            branch,
            http_client: reqwest::Client::builder()
                .gzip(true)
                .build()
                .context("building http client")?,
        })
    }

    /// The branch changes are proposed against.
    pub fn base_branch(&self) -> &str {
        &self.base_branch
    }

    /// The branch changes are committed to.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    fn build_request(
        &self,
        endpoint: String,
        body: Option<Value>,
        method: Method,
    ) -> RequestBuilder {
        let request_url = format!(
            "{}/projects/{}/{}",
            self.settings.api_url.trim_end_matches('/'),
            urlencoding::encode(&self.settings.project_id),
            endpoint
        );
        let mut req = self
            .http_client
            .request(method, request_url)
            .header("PRIVATE-TOKEN", &self.settings.token);
        if let Some(b) = body {
            req = req.json(&b);
        }
        req
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let request = req.build().context("building request")?;
        debug!("{} {}", request.method(), request.url());
        self.http_client
            .execute(request)
            .await
            .map_err(|e| {
                error!("error with gitlab request: {e}");
                e
            })
            .context("making request")
    }

    /// The raw content of a file on the base branch. `path` is relative to
    /// the repository root.
    pub async fn get_file(&self, path: &str) -> Result<String> {
        let req = self
            .build_request(
                format!("repository/files/{}/raw", urlencoding::encode(path)),
                None,
                Method::GET,
            )
            .query(&[("ref", &self.base_branch)]);
        let resp = self.send(req).await?;
        if !resp.status().is_success() {
            return Err(GitlabError::FileNotFetched {
                path: path.to_owned(),
                branch: self.base_branch.to_owned(),
                status: resp.status(),
            }
            .into());
        }
        resp.text().await.context("reading file content")
    }

    /// Commit `content` as the new version of `path`, creating the new
    /// branch from the base branch.
    pub async fn commit_file(&self, path: &str, content: &str) -> Result<Value> {
        let payload = json!({
            "branch": self.branch,
            "start_branch": self.base_branch,
            "commit_message": COMMIT_MESSAGE,
            "force": false,
            "actions": [{
                "action": "update",
                "file_path": path,
                "content": content,
            }],
        });
        let req = self.build_request("repository/commits".to_owned(), Some(payload), Method::POST);
        let resp = self.send(req).await?;
        if !resp.status().is_success() {
            let err = GitlabError::CommitFailed {
                branch: self.branch.to_owned(),
                status: resp.status(),
            };
            error!("{err}");
            return Err(err.into());
        }
        resp.json::<Value>().await.context("parsing commit response")
    }

    /// Open a merge request from the new branch into the base branch.
    pub async fn create_merge_request(&self, title: &str) -> Result<MergeRequest> {
        let payload = json!({
            "id": self.settings.project_id,
            "source_branch": self.branch,
            "target_branch": self.base_branch,
            "title": title,
            "description": MERGE_REQUEST_DESCRIPTION,
            "remove_source_branch": true,
            "allow_collaboration": true,
            "squash": true,
        });
        let req = self.build_request("merge_requests".to_owned(), Some(payload), Method::POST);
        let resp = self.send(req).await?;
        if !resp.status().is_success() {
            let err = GitlabError::MergeRequestFailed {
                branch: self.branch.to_owned(),
                status: resp.status(),
            };
            error!("{err}");
            return Err(err.into());
        }
        resp.json::<MergeRequest>()
            .await
            .context("parsing merge request response")
    }
}
