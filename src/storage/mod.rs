//! Read-only access to the content store holding recipe revisions
//!
//! The store is addressed by a fixed key template (see [`StoreLayout`]):
//!
//! ```text
//! {user}/{channel}/{tag}/{name}/{version}/latest.json
//! {user}/{channel}/{tag}/{name}/{version}/{revision}/files.json
//! {user}/{channel}/{tag}/{name}/{version}/{revision}/snapshot.json
//! {user}/{channel}/{tag}/{name}/{version}/{revision}/files/{file}
//! ```
//!
//! [`HttpContentStore`] resolves keys against a base URL; [`MemoryContentStore`]
//! keeps documents in a map for tests and local development.

mod http;
mod layout;
mod memory;

pub use http::HttpContentStore;
pub use layout::{StoreKey, StoreLayout};
pub use memory::MemoryContentStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Request to {url} failed: {message}")]
    RequestFailed { url: String, message: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Unexpected HTTP {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Document at {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: usize },

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Immutable content store
///
/// `get` distinguishes absence (`Ok(None)`) from failure (`Err`); callers
/// decide whether the two collapse into one outward condition.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch the document stored at `key`
    async fn get(&self, key: &StoreKey) -> Result<Option<Bytes>>;

    /// Absolute URL clients can fetch `key` from
    fn url_for(&self, key: &StoreKey) -> String;
}
