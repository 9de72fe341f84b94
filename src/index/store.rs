use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqlitePoolOptions};
use sqlx::{Arguments, Pool, Sqlite};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{IndexError, Result};
use super::models::{
    DownloadRecord, PendingDownload, ProjectDetail, ProjectPage, ProjectRecord, ProjectRow,
    RollupReport, package_identity,
};
use super::query::{ListingQuery, PACKAGER, SearchFlags, SqlParam, translate, translate_listing};
use super::{AuditSink, IndexSummary, SearchIndex};
use crate::config::IndexConfig;
use crate::gate::{GateError, ServiceStatus, StatusSource};

const STATUS_KEY: &str = "service_status";

/// Columns added after the first release, for databases created before them
const ADDED_COLUMNS: &[(&str, &str, &str)] = &[
    ("project", "downloads", "INTEGER NOT NULL DEFAULT 0"),
    ("package", "downloads", "INTEGER NOT NULL DEFAULT 0"),
];

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS project (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        uuid TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL UNIQUE,
        description_brief TEXT,
        topic TEXT,
        license TEXT,
        updated TEXT,
        info TEXT,
        downloads INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS package (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project INTEGER REFERENCES project(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        version TEXT NOT NULL,
        identity TEXT,
        packager TEXT NOT NULL DEFAULT 'conan',
        downloads INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_package_packager_name ON package(packager, name)",
    "CREATE TABLE IF NOT EXISTS meta (
        id TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS track (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        package_name TEXT NOT NULL,
        package_version TEXT NOT NULL,
        package_username TEXT NOT NULL,
        package_channel TEXT NOT NULL,
        revision TEXT NOT NULL,
        dp TEXT NOT NULL,
        ua TEXT,
        uip TEXT,
        t TEXT NOT NULL
    )",
    "CREATE VIRTUAL TABLE IF NOT EXISTS project_fts USING fts5(
        name, description_brief, topic,
        content='project', content_rowid='id'
    )",
    "CREATE TRIGGER IF NOT EXISTS project_fts_insert AFTER INSERT ON project BEGIN
        INSERT INTO project_fts(rowid, name, description_brief, topic)
        VALUES (new.id, new.name, new.description_brief, new.topic);
    END",
    "CREATE TRIGGER IF NOT EXISTS project_fts_delete AFTER DELETE ON project BEGIN
        INSERT INTO project_fts(project_fts, rowid, name, description_brief, topic)
        VALUES ('delete', old.id, old.name, old.description_brief, old.topic);
    END",
    "CREATE TRIGGER IF NOT EXISTS project_fts_update AFTER UPDATE ON project BEGIN
        INSERT INTO project_fts(project_fts, rowid, name, description_brief, topic)
        VALUES ('delete', old.id, old.name, old.description_brief, old.topic);
        INSERT INTO project_fts(rowid, name, description_brief, topic)
        VALUES (new.id, new.name, new.description_brief, new.topic);
    END",
];

/// SQLite-backed search index, status source and download audit log
#[derive(Debug, Clone)]
pub struct SqliteIndex {
    pool: Pool<Sqlite>,
}

impl SqliteIndex {
    /// Open (creating if missing) the database named by `config.url`
    pub async fn connect(config: &IndexConfig) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs));
        let opts = Self::with_pragmas(opts);

        let filename = opts.get_filename();
        if let Some(parent) = filename.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!("Opening index at: {}", filename.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(opts)
            .await?;

        Ok(Self { pool })
    }

    /// Private in-memory database, schema applied
    ///
    /// A single connection that never expires, so the database lives as long
    /// as the pool.
    pub async fn in_memory() -> Result<Self> {
        let opts = Self::with_pragmas(SqliteConnectOptions::from_str("sqlite::memory:")?);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        let index = Self { pool };
        index.migrate().await?;
        Ok(index)
    }

    fn with_pragmas(opts: SqliteConnectOptions) -> SqliteConnectOptions {
        // LIKE is case-folded only where the query asks for it with lower()
        opts.pragma("case_sensitive_like", "ON")
    }

    /// Create tables and triggers, and seed the service status as in service
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        for &(table, column, declaration) in ADDED_COLUMNS {
            let present: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
                    .bind(table)
                    .bind(column)
                    .fetch_one(&self.pool)
                    .await?;
            if present == 0 {
                info!(%table, %column, "Adding index column");
                sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column} {declaration}"))
                    .execute(&self.pool)
                    .await?;
            }
        }

        let seed = serde_json::to_string(&ServiceStatus::in_service())?;
        let seeded = sqlx::query("INSERT OR IGNORE INTO meta (id, value) VALUES (?, ?)")
            .bind(STATUS_KEY)
            .bind(seed)
            .execute(&self.pool)
            .await?
            .rows_affected();

        info!(seeded_status = seeded > 0, "Index schema is up to date");
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn set_service_status(&self, status: &ServiceStatus) -> Result<()> {
        let value = serde_json::to_string(status)?;
        sqlx::query(
            "INSERT INTO meta (id, value) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET value = excluded.value",
        )
        .bind(STATUS_KEY)
        .bind(value)
        .execute(&self.pool)
        .await?;

        info!(in_service = status.in_service, reason = ?status.reason, "Service status updated");
        Ok(())
    }

    pub async fn read_service_status(&self) -> Result<Option<ServiceStatus>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM meta WHERE id = ?")
            .bind(STATUS_KEY)
            .fetch_optional(&self.pool)
            .await?;

        match value {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

impl SqliteIndex {
    /// Audit rows recorded before `cutoff`, oldest first
    pub async fn pending_downloads(&self, cutoff: DateTime<Utc>) -> Result<Vec<PendingDownload>> {
        let pending = sqlx::query_as(
            "SELECT package_name, package_version, package_username, package_channel, revision, t
             FROM track WHERE t < ? ORDER BY t, id",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(pending)
    }

    /// Fold audit rows recorded before `cutoff` into package and project counters
    ///
    /// Packages and projects seen for the first time are created. Everything
    /// runs in one transaction, so a failed pass leaves counters and `track`
    /// untouched.
    pub async fn roll_up_downloads(
        &self,
        cutoff: DateTime<Utc>,
        delete_processed: bool,
    ) -> Result<RollupReport> {
        let mut tx = self.pool.begin().await?;

        let groups: Vec<(String, String, String, String, i64)> = sqlx::query_as(
            "SELECT package_name, package_version, package_username, package_channel, COUNT(*)
             FROM track WHERE t < ?
             GROUP BY package_name, package_version, package_username, package_channel
             ORDER BY package_name, package_version, package_username, package_channel",
        )
        .bind(cutoff)
        .fetch_all(&mut *tx)
        .await?;

        let mut report = RollupReport::default();
        let mut touched = BTreeSet::new();

        for (name, version, user, channel, count) in groups {
            let identity = package_identity(&user, &channel);
            let (project, project_created) = obtain_project(&mut *tx, &name).await?;
            let package_created =
                add_package_downloads(&mut *tx, project, &name, &version, identity.as_deref(), count)
                    .await?;

            debug!(%name, %version, ?identity, count, "Rolled up downloads");
            report.entries += count;
            report.packages += 1;
            report.projects_created += usize::from(project_created);
            report.packages_created += usize::from(package_created);
            touched.insert(project);
        }

        for project in touched {
            sqlx::query(
                "UPDATE project SET downloads =
                    (SELECT COALESCE(SUM(downloads), 0) FROM package WHERE package.project = project.id)
                 WHERE id = ?",
            )
            .bind(project)
            .execute(&mut *tx)
            .await?;
        }

        if delete_processed {
            report.deleted = sqlx::query("DELETE FROM track WHERE t < ?")
                .bind(cutoff)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;
        info!(
            entries = report.entries,
            packages = report.packages,
            projects_created = report.projects_created,
            deleted = report.deleted,
            "Download rollup complete"
        );
        Ok(report)
    }
}

/// Project owning packages named `name`, else the project called `name`,
/// else a new one; the flag tells whether it was created
async fn obtain_project(conn: &mut SqliteConnection, name: &str) -> Result<(i64, bool)> {
    let owner: Option<i64> = sqlx::query_scalar(
        "SELECT project FROM package
         WHERE name = ? AND packager = ? AND project IS NOT NULL
         ORDER BY id LIMIT 1",
    )
    .bind(name)
    .bind(PACKAGER)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(project) = owner {
        return Ok((project, false));
    }

    let named: Option<i64> = sqlx::query_scalar("SELECT id FROM project WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(project) = named {
        return Ok((project, false));
    }

    let created = sqlx::query("INSERT INTO project (uuid, name) VALUES (?, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();
    Ok((created, true))
}

/// Add `count` to the matching package, creating it when absent
async fn add_package_downloads(
    conn: &mut SqliteConnection,
    project: i64,
    name: &str,
    version: &str,
    identity: Option<&str>,
    count: i64,
) -> Result<bool> {
    let updated = sqlx::query(
        "UPDATE package SET downloads = downloads + ?
         WHERE project = ? AND name = ? AND version = ? AND identity IS ? AND packager = ?",
    )
    .bind(count)
    .bind(project)
    .bind(name)
    .bind(version)
    .bind(identity)
    .bind(PACKAGER)
    .execute(&mut *conn)
    .await?
    .rows_affected();
    if updated > 0 {
        return Ok(false);
    }

    sqlx::query(
        "INSERT INTO package (project, name, version, identity, packager, downloads)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(project)
    .bind(name)
    .bind(version)
    .bind(identity)
    .bind(PACKAGER)
    .bind(count)
    .execute(&mut *conn)
    .await?;
    Ok(true)
}

fn arguments<'q>(params: &[SqlParam]) -> Result<SqliteArguments<'q>> {
    let mut args = SqliteArguments::default();
    for param in params {
        let added = match param {
            SqlParam::Text(text) => args.add(text.clone()),
            SqlParam::Int(value) => args.add(*value),
        };
        added.map_err(|e| IndexError::Bind(e.to_string()))?;
    }
    Ok(args)
}

#[async_trait]
impl SearchIndex for SqliteIndex {
    async fn search_references(&self, raw_query: &str, flags: SearchFlags) -> Result<Vec<String>> {
        let query = translate(raw_query, flags);
        let references: Vec<String> =
            sqlx::query_scalar_with::<Sqlite, String, _>(&query.sql, arguments(&query.params)?)
                .fetch_all(&self.pool)
                .await?;

        debug!(query = raw_query, hits = references.len(), "Reference search");
        Ok(references)
    }

    async fn search_projects(&self, query: &ListingQuery) -> Result<ProjectPage> {
        let Some(queries) = translate_listing(query) else {
            return Ok(ProjectPage {
                total: 0,
                offset: query.offset,
                projects: Vec::new(),
            });
        };

        let mut tx = self.pool.begin().await?;
        let rows: Vec<ProjectRow> =
            sqlx::query_as_with::<Sqlite, ProjectRow, _>(&queries.page.sql, arguments(&queries.page.params)?)
                .fetch_all(&mut *tx)
                .await?;
        let total: i64 =
            sqlx::query_scalar_with::<Sqlite, i64, _>(&queries.count.sql, arguments(&queries.count.params)?)
                .fetch_one(&mut *tx)
                .await?;
        tx.commit().await?;

        debug!(text = %query.text, total, "Project search");
        Ok(ProjectPage {
            total,
            offset: query.offset,
            projects: rows.into_iter().map(ProjectRecord::from).collect(),
        })
    }

    async fn project(&self, name: &str) -> Result<Option<ProjectDetail>> {
        let row: Option<ProjectRow> = sqlx::query_as(
            "SELECT uuid, name, description_brief, topic, license, updated, info, downloads
             FROM project WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let packages: Vec<String> = sqlx::query_scalar(
            "SELECT package.name || '/' || package.version || '@' || COALESCE(package.identity, '_/_')
             FROM package JOIN project ON project.id = package.project
             WHERE project.name = ? AND package.packager = ?
             ORDER BY package.name, package.version, package.identity",
        )
        .bind(name)
        .bind(PACKAGER)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ProjectDetail {
            project: ProjectRecord::from(row),
            packages,
        }))
    }

    async fn summary(&self) -> Result<IndexSummary> {
        let (projects, packages, downloads): (i64, i64, i64) = sqlx::query_as(
            "SELECT
                (SELECT COUNT(*) FROM project),
                (SELECT COUNT(*) FROM package),
                (SELECT COUNT(*) FROM track)",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(IndexSummary {
            projects,
            packages,
            downloads,
        })
    }
}

#[async_trait]
impl StatusSource for SqliteIndex {
    async fn service_status(&self) -> std::result::Result<Option<ServiceStatus>, GateError> {
        self.read_service_status()
            .await
            .map_err(|e| GateError::Unreadable(e.to_string()))
    }
}

#[async_trait]
impl AuditSink for SqliteIndex {
    async fn record_download(&self, record: &DownloadRecord) -> Result<()> {
        let coords = &record.coords;
        sqlx::query(
            "INSERT INTO track
                (package_name, package_version, package_username, package_channel,
                 revision, dp, ua, uip, t)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&coords.name)
        .bind(&coords.version)
        .bind(&coords.user)
        .bind(&coords.channel)
        .bind(&record.revision)
        .bind(&record.path)
        .bind(&record.user_agent)
        .bind(&record.source)
        .bind(record.at)
        .execute(&self.pool)
        .await?;

        debug!(recipe = %coords, revision = %record.revision, "Download recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::query::MatchScope;
    use crate::recipe::RecipeCoordinates;

    async fn seeded() -> SqliteIndex {
        let index = SqliteIndex::in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO project (uuid, name, description_brief, topic, info) VALUES
                ('p-1', 'lyra', 'Command line parser', 'cli header-only', '{}'),
                ('p-2', 'zlib', 'Compression library', 'compression', NULL),
                ('p-3', 'json_dto', 'JSON binding', 'json serialization', NULL)",
        )
        .execute(index.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO package (project, name, version, identity, packager) VALUES
                (1, 'lyra', '1.5.1', NULL, 'conan'),
                (1, 'lyra', '1.6.0', NULL, 'conan'),
                (2, 'zlib', '1.2.11', 'conan/stable', 'conan'),
                (2, 'zlib', '1.2.11', NULL, 'npm'),
                (3, 'json_dto', '0.2.8', NULL, 'conan'),
                (3, 'jsonxdto', '0.1.0', NULL, 'conan'),
                (3, 'Lyra-fork', '1.0', NULL, 'conan')",
        )
        .execute(index.pool())
        .await
        .unwrap();
        index
    }

    #[tokio::test]
    async fn migrate_is_repeatable_and_seeds_status() {
        let index = SqliteIndex::in_memory().await.unwrap();
        index.migrate().await.unwrap();

        let status = index.read_service_status().await.unwrap();
        assert_eq!(status, Some(ServiceStatus::in_service()));
    }

    #[tokio::test]
    async fn migrate_keeps_existing_status() {
        let index = SqliteIndex::in_memory().await.unwrap();
        let closed = ServiceStatus::maintenance(Some("upgrade".into()));
        index.set_service_status(&closed).await.unwrap();
        index.migrate().await.unwrap();

        assert_eq!(index.read_service_status().await.unwrap(), Some(closed));
    }

    #[tokio::test]
    async fn glob_search_treats_underscore_literally() {
        let index = seeded().await;
        let hits = index
            .search_references("json_*", SearchFlags::default())
            .await
            .unwrap();
        assert_eq!(hits, vec!["json_dto/0.2.8@_/_"]);
    }

    #[tokio::test]
    async fn search_filters_packager_and_renders_identity() {
        let index = seeded().await;
        let hits = index
            .search_references("zlib*", SearchFlags::default())
            .await
            .unwrap();
        assert_eq!(hits, vec!["zlib/1.2.11@conan/stable"]);
    }

    #[tokio::test]
    async fn case_sensitivity_follows_flags() {
        let index = seeded().await;

        let insensitive = index
            .search_references("lyra*", SearchFlags::default())
            .await
            .unwrap();
        assert_eq!(
            insensitive,
            vec!["Lyra-fork/1.0@_/_", "lyra/1.5.1@_/_", "lyra/1.6.0@_/_"]
        );

        let sensitive = index
            .search_references("lyra*", SearchFlags { case_sensitive: true })
            .await
            .unwrap();
        assert_eq!(sensitive, vec!["lyra/1.5.1@_/_", "lyra/1.6.0@_/_"]);
    }

    #[tokio::test]
    async fn listing_search_counts_and_pages() {
        let index = seeded().await;
        let page = index
            .search_projects(&ListingQuery {
                text: "compression".into(),
                scope: MatchScope::All,
                offset: 0,
            })
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.projects[0].name, "zlib");
    }

    #[tokio::test]
    async fn listing_scope_restricts_columns() {
        let index = seeded().await;
        let by_topic = index
            .search_projects(&ListingQuery {
                text: "json".into(),
                scope: MatchScope::Topic,
                offset: 0,
            })
            .await
            .unwrap();
        assert_eq!(by_topic.total, 1);

        let by_name = index
            .search_projects(&ListingQuery {
                text: "cli".into(),
                scope: MatchScope::Name,
                offset: 0,
            })
            .await
            .unwrap();
        assert_eq!(by_name.total, 0);
    }

    #[tokio::test]
    async fn listing_survives_fts_syntax_in_input() {
        let index = seeded().await;
        let page = index
            .search_projects(&ListingQuery {
                text: "NEAR( \"lyra OR name:".into(),
                scope: MatchScope::All,
                offset: 0,
            })
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn project_detail_lists_packages() {
        let index = seeded().await;
        let detail = index.project("lyra").await.unwrap().unwrap();
        assert_eq!(detail.project.topics, vec!["cli", "header-only"]);
        assert_eq!(detail.packages, vec!["lyra/1.5.1@_/_", "lyra/1.6.0@_/_"]);

        assert!(index.project("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn records_downloads() {
        let index = seeded().await;
        let record = DownloadRecord::builder()
            .coords(RecipeCoordinates::new("lyra", "1.5.1", "_", "_").unwrap())
            .revision("abc123")
            .path("/github/v2/conans/lyra/1.5.1/_/_/revisions/abc123/files/conan_export.tgz")
            .user_agent("Conan/1.59")
            .source("10.0.0.1")
            .build();
        index.record_download(&record).await.unwrap();

        let summary = index.summary().await.unwrap();
        assert_eq!(summary.downloads, 1);
        assert_eq!(summary.projects, 3);
        assert_eq!(summary.packages, 7);
    }

    fn download(name: &str, version: &str, user: &str, channel: &str) -> DownloadRecord {
        DownloadRecord::builder()
            .coords(RecipeCoordinates::new(name, version, user, channel).unwrap())
            .revision("abc123")
            .path(format!("/github/v1/files/{user}/{name}/{version}/{channel}/abc123/export/conan_export.tgz"))
            .build()
    }

    async fn package_downloads(
        index: &SqliteIndex,
        name: &str,
        version: &str,
        identity: Option<&str>,
    ) -> i64 {
        sqlx::query_scalar(
            "SELECT downloads FROM package
             WHERE name = ? AND version = ? AND identity IS ? AND packager = 'conan'",
        )
        .bind(name)
        .bind(version)
        .bind(identity)
        .fetch_one(index.pool())
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn rollup_counts_into_existing_and_new_packages() {
        let index = seeded().await;
        for record in [
            download("lyra", "1.5.1", "_", "_"),
            download("lyra", "1.5.1", "_", "_"),
            download("zlib", "1.2.11", "conan", "stable"),
            download("boost", "1.76.0", "_", "_"),
        ] {
            index.record_download(&record).await.unwrap();
        }

        let cutoff = Utc::now() + chrono::Duration::seconds(1);
        let report = index.roll_up_downloads(cutoff, true).await.unwrap();
        assert_eq!(
            report,
            RollupReport {
                entries: 4,
                packages: 3,
                packages_created: 1,
                projects_created: 1,
                deleted: 4,
            }
        );

        assert_eq!(package_downloads(&index, "lyra", "1.5.1", None).await, 2);
        assert_eq!(package_downloads(&index, "zlib", "1.2.11", Some("conan/stable")).await, 1);
        assert_eq!(package_downloads(&index, "boost", "1.76.0", None).await, 1);

        let lyra = index.project("lyra").await.unwrap().unwrap();
        assert_eq!(lyra.project.downloads, 2);
        let boost = index.project("boost").await.unwrap().unwrap();
        assert_eq!(boost.project.downloads, 1);
        assert_eq!(boost.packages, vec!["boost/1.76.0@_/_"]);

        assert_eq!(index.summary().await.unwrap().downloads, 0);
    }

    #[tokio::test]
    async fn rollup_respects_cutoff_and_skip_delete() {
        let index = seeded().await;
        let cutoff = Utc::now();
        let early = DownloadRecord {
            at: cutoff - chrono::Duration::minutes(5),
            ..download("lyra", "1.6.0", "_", "_")
        };
        let late = DownloadRecord {
            at: cutoff + chrono::Duration::minutes(5),
            ..download("lyra", "1.6.0", "_", "_")
        };
        index.record_download(&early).await.unwrap();
        index.record_download(&late).await.unwrap();

        let pending = index.pending_downloads(cutoff).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].package_version, "1.6.0");

        let report = index.roll_up_downloads(cutoff, false).await.unwrap();
        assert_eq!(report.entries, 1);
        assert_eq!(report.deleted, 0);
        assert_eq!(package_downloads(&index, "lyra", "1.6.0", None).await, 1);
        assert_eq!(index.summary().await.unwrap().downloads, 2);

        let lyra = index.project("lyra").await.unwrap().unwrap();
        assert_eq!(lyra.project.downloads, 1);
    }

    #[tokio::test]
    async fn migrate_adds_download_columns_to_older_databases() {
        let index = SqliteIndex::in_memory().await.unwrap();
        sqlx::query("ALTER TABLE package DROP COLUMN downloads")
            .execute(index.pool())
            .await
            .unwrap();

        index.migrate().await.unwrap();

        let present: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('package') WHERE name = 'downloads'",
        )
        .fetch_one(index.pool())
        .await
        .unwrap();
        assert_eq!(present, 1);
    }
}
