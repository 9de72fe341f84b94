use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

use crate::recipe::{RecipeCoordinates, UNSCOPED};

/// Raw `project` row as selected by the listing queries
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub uuid: String,
    pub name: String,
    pub description_brief: Option<String>,
    pub topic: Option<String>,
    pub license: Option<String>,
    pub updated: Option<String>,
    pub info: Option<String>,
    pub downloads: i64,
}

/// Project as served by the listing API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRecord {
    pub uuid: String,
    pub name: String,
    pub description: String,
    pub topics: Vec<String>,
    pub license: Option<String>,
    pub updated: Option<String>,
    pub info: Value,
    /// Rolled-up total over the project's packages
    pub downloads: i64,
}

impl From<ProjectRow> for ProjectRecord {
    fn from(row: ProjectRow) -> Self {
        // `topic` is stored space-delimited; `info` is a JSON document that
        // older rows may lack or carry as plain text.
        let topics = row
            .topic
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let info = match row.info {
            Some(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
            None => Value::Object(Default::default()),
        };

        Self {
            uuid: row.uuid,
            name: row.name,
            description: row.description_brief.unwrap_or_default(),
            topics,
            license: row.license,
            updated: row.updated,
            info,
            downloads: row.downloads,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectPage {
    pub total: i64,
    pub offset: i64,
    pub projects: Vec<ProjectRecord>,
}

/// A project and every recipe reference published under it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: ProjectRecord,
    pub packages: Vec<String>,
}

/// One observed export-archive download, appended to `track`
#[derive(Debug, Clone, bon::Builder)]
pub struct DownloadRecord {
    pub coords: RecipeCoordinates,
    #[builder(into)]
    pub revision: String,
    /// Original request path (`dp`)
    #[builder(into)]
    pub path: String,
    #[builder(into)]
    pub user_agent: Option<String>,
    #[builder(into)]
    pub source: Option<String>,
    #[builder(default = Utc::now())]
    pub at: DateTime<Utc>,
}

/// `track` row not yet folded into the download counters
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct PendingDownload {
    pub package_name: String,
    pub package_version: String,
    pub package_username: String,
    pub package_channel: String,
    pub revision: String,
    pub t: DateTime<Utc>,
}

/// Package `identity` for a user/channel pair; unscoped recipes have none
pub fn package_identity(user: &str, channel: &str) -> Option<String> {
    if user == UNSCOPED && channel == UNSCOPED {
        None
    } else {
        Some(format!("{}/{}", user, channel))
    }
}

/// Outcome of one `tracklog` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RollupReport {
    /// `track` rows counted
    pub entries: i64,
    /// Packages whose counter moved
    pub packages: usize,
    pub packages_created: usize,
    pub projects_created: usize,
    /// `track` rows removed afterwards
    pub deleted: u64,
}
