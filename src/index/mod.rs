//! Relational index
//!
//! The index holds everything the gateway knows that is not in the content
//! store: the searchable package and project tables, the service status row,
//! and the download audit log. Handlers depend on the traits below; the
//! SQLite store implements all of them.

pub mod error;
pub mod models;
pub mod query;
mod store;

pub use error::{IndexError, Result as IndexResult};
pub use models::{
    DownloadRecord, PendingDownload, ProjectDetail, ProjectPage, ProjectRecord, RollupReport,
};
pub use query::{ListingQuery, MatchScope, SearchFlags};
pub use store::SqliteIndex;

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    pub projects: i64,
    pub packages: i64,
    pub downloads: i64,
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Recipe references whose `name/version` matches the glob `raw_query`
    async fn search_references(&self, raw_query: &str, flags: SearchFlags)
    -> IndexResult<Vec<String>>;

    async fn search_projects(&self, query: &ListingQuery) -> IndexResult<ProjectPage>;

    async fn project(&self, name: &str) -> IndexResult<Option<ProjectDetail>>;

    async fn summary(&self) -> IndexResult<IndexSummary>;
}

/// Append-only sink for observed downloads
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record_download(&self, record: &DownloadRecord) -> IndexResult<()>;
}
