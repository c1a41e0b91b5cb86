//! DirectoryClient and the request/pagination plumbing shared by reads and
//! writes.

use std::collections::{BTreeSet, HashSet};

use anyhow::{Context, Result};
use groupsync_core::{
    credentials::DirectoryCredentials,
    logging::{debug, error},
    Lookup,
};
use reqwest::{
    header::{HeaderMap, ACCEPT, CONTENT_TYPE, LINK},
    Method, RequestBuilder, Response, StatusCode,
};
use serde_json::Value;
use url::Url;

use crate::DirectoryError;

/// Wrapper struct for http functionality
pub struct DirectoryClient {
    base_url: Url,
    credentials: DirectoryCredentials,
    http_client: reqwest::Client,
}

impl DirectoryClient {
    /// Initialize a new client for the deployment at `base_url`.
    pub fn new(base_url: &str, credentials: DirectoryCredentials) -> Result<Self> {
        credentials.validate()?;
        let base_url =
            Url::parse(base_url).with_context(|| format!("parsing directory url {base_url}"))?;
        if base_url.cannot_be_a_base() {
            return Err(DirectoryError::InvalidBaseUrl(base_url.to_string()).into());
        }
        Ok(DirectoryClient {
            base_url,
            credentials,
            http_client: reqwest::Client::builder()
                .gzip(true)
                .build()
                .context("building http client")?,
        })
    }

    /// The url for a path under the deployment. Each segment is escaped, so
    /// names can be passed as they are.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DirectoryError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Builds an authenticated request
    pub(crate) fn build_request(
        &self,
        url: Url,
        body: Option<Value>,
        method: Method,
    ) -> RequestBuilder {
        let mut req = self
            .http_client
            .request(method, url)
            .bearer_auth(&self.credentials.token)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        if let Some(b) = body {
            req = req.json(&b);
        }
        req
    }

    /// Send a request. Anything but a success status is an error.
    pub(crate) async fn execute(&self, req: RequestBuilder) -> Result<Response> {
        let (method, resp) = self.send(req).await?;
        ensure_success(method, resp)
    }

    /// Send a request where a 404 means the entity doesn't exist.
    pub(crate) async fn execute_lookup(&self, req: RequestBuilder) -> Result<Lookup<Response>> {
        let (method, resp) = self.send(req).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            debug!("{method} {} returned 404", resp.url());
            return Ok(Lookup::NotFound);
        }
        ensure_success(method, resp).map(Lookup::Found)
    }

    async fn send(&self, req: RequestBuilder) -> Result<(Method, Response)> {
        let request = req.build().context("building request")?;
        let (method, url) = (request.method().to_owned(), request.url().to_owned());
        debug!("{method} {url}");

        let resp = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| {
                error!("error with request ({method} {url}): {e}");
                e
            })
            .context("making request")?;
        Ok((method, resp))
    }

    /// Drain every page of a listing into a set. A 404 on the first page
    /// means the parent entity doesn't exist.
    pub(crate) async fn paginate(&self, url: Url, key: &str) -> Result<Lookup<BTreeSet<String>>> {
        let mut pages = Pages::new(self, url, key);
        let mut items = BTreeSet::new();
        loop {
            match pages.next_page().await? {
                Page::Items(batch) => items.extend(batch),
                Page::Missing => return Ok(Lookup::NotFound),
                Page::End => return Ok(Lookup::Found(items)),
            }
        }
    }

    /// Like [`DirectoryClient::paginate`], for listings that always exist.
    pub(crate) async fn paginate_all(&self, url: Url, key: &str) -> Result<BTreeSet<String>> {
        match self.paginate(url.clone(), key).await? {
            Lookup::Found(items) => Ok(items),
            Lookup::NotFound => Err(DirectoryError::Transport {
                method: Method::GET,
                url,
                status: StatusCode::NOT_FOUND,
            }
            .into()),
        }
    }
}

fn ensure_success(method: Method, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let err = DirectoryError::Transport {
        method,
        url: resp.url().to_owned(),
        status,
    };
    error!("error with request - bad response: {err}");
    Err(err.into())
}

/// Parse a response body as json.
pub(crate) async fn json_body(resp: Response) -> Result<Value> {
    let url = resp.url().to_owned();
    resp.json::<Value>()
        .await
        .map_err(|e| {
            error!("error parsing json response ({url}): {e}");
            e
        })
        .context("parsing json response")
}

/// Walk `path` down from `val`.
pub(crate) fn get_json_from_path<'a>(
    val: &'a Value,
    path: &[&str],
    url: &Url,
) -> Result<&'a Value, DirectoryError> {
    let mut full_path = String::new();
    let mut return_val = val;
    for p in path {
        if !full_path.is_empty() {
            full_path.push('.');
        }
        full_path.push_str(p);
        return_val = return_val
            .get(p)
            .ok_or_else(|| DirectoryError::MalformedResponse {
                url: url.to_owned(),
                key: full_path.to_owned(),
            })?;
    }
    Ok(return_val)
}

/// One step of a paginated listing.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Page {
    Items(Vec<String>),
    /// The listing's owner doesn't exist
    Missing,
    End,
}

enum Cursor {
    Start,
    Next(Url),
    Done,
}

/// A paginated listing, fetched one page at a time as it's consumed.
pub(crate) struct Pages<'a> {
    client: &'a DirectoryClient,
    start: Url,
    key: &'a str,
    cursor: Cursor,
    /// Pages fetched so far. A link back to any of them is a cycle.
    visited: HashSet<Url>,
}

impl<'a> Pages<'a> {
    pub(crate) fn new(client: &'a DirectoryClient, start: Url, key: &'a str) -> Self {
        Pages {
            client,
            start,
            key,
            cursor: Cursor::Start,
            visited: HashSet::new(),
        }
    }

    pub(crate) async fn next_page(&mut self) -> Result<Page> {
        let (url, first) = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Start => (self.start.to_owned(), true),
            Cursor::Next(url) => (url, false),
            Cursor::Done => return Ok(Page::End),
        };

        self.visited.insert(url.to_owned());
        let req = self.client.build_request(url.to_owned(), None, Method::GET);
        let resp = if first {
            match self.client.execute_lookup(req).await? {
                Lookup::Found(resp) => resp,
                Lookup::NotFound => return Ok(Page::Missing),
            }
        } else {
            // a listing that disappears halfway through is not "not found"
            self.client.execute(req).await?
        };

        let next = next_link(resp.headers(), &url)?;
        let body = json_body(resp).await?;
        let items = string_items(&body, self.key, &url)?;

        if let Some(next) = next {
            if self.visited.contains(&next) {
                return Err(DirectoryError::InvalidLink {
                    link: next.to_string(),
                }
                .into());
            }
            self.cursor = Cursor::Next(next);
        }
        Ok(Page::Items(items))
    }
}

fn string_items(body: &Value, key: &str, url: &Url) -> Result<Vec<String>, DirectoryError> {
    let malformed = || DirectoryError::MalformedResponse {
        url: url.to_owned(),
        key: key.to_owned(),
    };
    get_json_from_path(body, &[key], url)?
        .as_array()
        .ok_or_else(malformed)?
        .iter()
        .map(|v| v.as_str().map(str::to_owned).ok_or_else(malformed))
        .collect()
}

/// The next page's url: the part between `<` and `>` before the first `;`.
/// Relative links are resolved against the current page.
fn next_link(headers: &HeaderMap, current: &Url) -> Result<Option<Url>, DirectoryError> {
    let link = match headers.get(LINK) {
        Some(link) => link,
        None => return Ok(None),
    };
    let link = link.to_str().map_err(|_| DirectoryError::InvalidLink {
        link: format!("{link:?}"),
    })?;
    let invalid = || DirectoryError::InvalidLink {
        link: link.to_owned(),
    };

    let target = link.split(';').next().unwrap_or_default().trim();
    let target = target
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .ok_or_else(invalid)?;
    current.join(target).map(Some).map_err(|_| invalid())
}
