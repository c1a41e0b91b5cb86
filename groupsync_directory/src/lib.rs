//! HTTP client for the directory service.
//!
//! [`DirectoryClient`] implements both [`groupsync_core::DirectoryReader`] and
//! [`groupsync_core::DirectoryWriter`] over the service's `/v1` REST API.

#![deny(missing_docs)]

mod error;
mod read;
mod rest;
mod write;

pub use error::DirectoryError;
pub use rest::DirectoryClient;
