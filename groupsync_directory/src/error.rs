//! Errors raised by the directory client.

use reqwest::{Method, StatusCode};
use thiserror::Error;
use url::Url;

/// Something the directory service did that we can't work with.
///
/// A 404 on a membership lookup is not an error; it comes back as
/// [`groupsync_core::Lookup::NotFound`].
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// A request came back with a non-success status.
    #[error("{method} {url} returned {status}")]
    Transport {
        /// Request method
        method: Method,
        /// Request url
        url: Url,
        /// Response status
        status: StatusCode,
    },
    /// The response body didn't have the field we expected.
    #[error("response from {url} is missing `{key}`")]
    MalformedResponse {
        /// Request url
        url: Url,
        /// The expected key
        key: String,
    },
    /// A `Link` header we couldn't follow.
    #[error("unable to follow link header: {link}")]
    InvalidLink {
        /// The header value
        link: String,
    },
    /// The configured service url can't have paths appended to it.
    #[error("invalid directory url: {0}")]
    InvalidBaseUrl(String),
}
