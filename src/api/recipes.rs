//! Request pieces shared by both protocol versions: path segment parsing,
//! self-referential URLs and the observed store redirect

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, warn};

use super::error::ApiError;
use super::origin::RequestOrigin;
use super::state::AppState;
use crate::index::DownloadRecord;
use crate::recipe::{
    CoordinateError, EXPORT_ARCHIVE, RecipeCoordinates, validate_filename, validate_revision,
};

#[derive(Debug, Deserialize)]
pub struct RecipePath {
    pub name: String,
    pub version: String,
    pub user: String,
    pub channel: String,
}

impl RecipePath {
    pub fn coordinates(self) -> Result<RecipeCoordinates, ApiError> {
        RecipeCoordinates::new(self.name, self.version, self.user, self.channel)
            .map_err(invalid_segments)
    }
}

#[derive(Debug, Deserialize)]
pub struct RevisionPath {
    pub name: String,
    pub version: String,
    pub user: String,
    pub channel: String,
    pub revision: String,
}

impl RevisionPath {
    pub fn parse(self) -> Result<(RecipeCoordinates, String), ApiError> {
        let (coords, revision) = parse_revision(
            RecipeCoordinates::new(self.name, self.version, self.user, self.channel),
            self.revision,
            Vec::new(),
        )
        .map_err(invalid_segments)?;
        Ok((coords, revision))
    }
}

#[derive(Debug, Deserialize)]
pub struct FilePath {
    pub name: String,
    pub version: String,
    pub user: String,
    pub channel: String,
    pub revision: String,
    pub file: String,
}

impl FilePath {
    pub fn parse(self) -> Result<(RecipeCoordinates, String, String), ApiError> {
        let file_errors = validate_filename(&self.file).err().into_iter().collect();
        let (coords, revision) = parse_revision(
            RecipeCoordinates::new(self.name, self.version, self.user, self.channel),
            self.revision,
            file_errors,
        )
        .map_err(invalid_segments)?;
        Ok((coords, revision, self.file))
    }
}

/// Merge coordinate, revision and any `extra` errors into one report
fn parse_revision(
    coords: Result<RecipeCoordinates, Vec<CoordinateError>>,
    revision: String,
    extra: Vec<CoordinateError>,
) -> Result<(RecipeCoordinates, String), Vec<CoordinateError>> {
    let mut errors = match &coords {
        Ok(_) => Vec::new(),
        Err(errors) => errors.clone(),
    };
    errors.extend(validate_revision(&revision).err());
    errors.extend(extra);

    match coords {
        Ok(coords) if errors.is_empty() => Ok((coords, revision)),
        _ => Err(errors),
    }
}

fn invalid_segments(errors: Vec<CoordinateError>) -> ApiError {
    debug!(?errors, "Rejecting request path");
    ApiError::Validation(errors.iter().map(ToString::to_string).collect())
}

/// `{base}/v1/files/{user}/{name}/{version}/{channel}/{revision}/export/{file}`
pub fn v1_file_url(base: &str, coords: &RecipeCoordinates, revision: &str, file: &str) -> String {
    format!(
        "{}/v1/files/{}/{}/{}/{}/{}/export/{}",
        base, coords.user, coords.name, coords.version, coords.channel, revision, file
    )
}

/// 302 to the file's store location, auditing export-archive downloads
pub fn redirect_to_store(
    state: &AppState,
    origin: &RequestOrigin,
    coords: &RecipeCoordinates,
    revision: &str,
    file: &str,
) -> Response {
    if file == EXPORT_ARCHIVE {
        observe_download(state, origin, coords, revision);
    }

    let location = state.resolver.file_location(coords, revision, file);
    debug!(recipe = %coords, %revision, %file, %location, "Redirecting to store");
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Record one download on a tracked task; failures are logged and counted only
fn observe_download(
    state: &AppState,
    origin: &RequestOrigin,
    coords: &RecipeCoordinates,
    revision: &str,
) {
    let record = DownloadRecord::builder()
        .coords(coords.clone())
        .revision(revision)
        .path(origin.path.clone())
        .maybe_user_agent(origin.user_agent.clone())
        .maybe_source(origin.source.clone())
        .build();

    let audit = state.audit.clone();
    let metrics = state.metrics.clone();
    metrics.download_observed();

    state.audits.spawn(async move {
        if let Err(err) = audit.record_download(&record).await {
            warn!(
                recipe = %record.coords,
                revision = %record.revision,
                error = %err,
                "Failed to record download"
            );
            metrics.audit_failed();
        }
    });
}
