//! Protocol V1 adapter
//!
//! V1 has no revisions on the wire: every recipe endpoint implicitly targets
//! the current revision, and file URLs embed the revision so that the later
//! download hits the same immutable snapshot.

use axum::{
    Json, Router,
    extract::State,
    http::Uri,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use super::error::ApiError;
use super::extract::Path;
use super::models::{DownloadUrls, Snapshot, Welcome};
use super::origin::RequestOrigin;
use super::recipes::{FilePath, RecipePath, redirect_to_store, v1_file_url};
use super::search::search;
use super::state::AppState;
use crate::recipe::{FileManifest, RECIPE_MANIFEST, RecipeCoordinates};
use crate::resolver::ResolvedRevision;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(welcome))
        .route("/conans/search", get(search))
        .route("/conans/{name}/{version}/{user}/{channel}", get(snapshot))
        .route("/conans/{name}/{version}/{user}/{channel}/digest", get(digest))
        .route(
            "/conans/{name}/{version}/{user}/{channel}/download_urls",
            get(download_urls),
        )
        .route(
            "/files/{user}/{name}/{version}/{channel}/{revision}/export/{file}",
            get(download),
        )
        .fallback(fallback)
}

async fn welcome(State(state): State<AppState>) -> Json<Welcome> {
    Json(Welcome {
        hello: format!("Welcome to {}!", state.config.server.name),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Upload and package-search endpoints answer with an empty object; every
/// other unknown path gets the welcome payload
async fn fallback(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    if path.contains("/conans/") && (path.ends_with("/search") || path.ends_with("/upload_urls")) {
        return Json(json!({})).into_response();
    }
    welcome(State(state)).await.into_response()
}

async fn latest(state: &AppState, coords: &RecipeCoordinates) -> Result<ResolvedRevision, ApiError> {
    state
        .resolver
        .resolve_latest(coords)
        .await
        .ok_or(ApiError::NotFound)
}

async fn latest_manifest(
    state: &AppState,
    coords: &RecipeCoordinates,
) -> Result<FileManifest, ApiError> {
    let resolved = latest(state, coords).await?;
    state
        .resolver
        .resolve_files(coords, &resolved.revision.revision)
        .await
        .ok_or(ApiError::NotFound)
}

/// Filename -> md5 of the current revision; files without a checksum are left out
async fn snapshot(
    State(state): State<AppState>,
    Path(path): Path<RecipePath>,
) -> Result<Json<Snapshot>, ApiError> {
    let coords = path.coordinates()?;
    let mut manifest = latest_manifest(&state, &coords).await?;

    if let Some(checksums) = state
        .resolver
        .resolve_checksums(&coords, &manifest.revision)
        .await
    {
        manifest.apply_checksums(checksums);
    }

    let snapshot = manifest
        .files
        .into_iter()
        .filter_map(|(name, entry)| entry.checksum.map(|md5| (name, md5)))
        .collect();
    Ok(Json(snapshot))
}

async fn digest(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Path(path): Path<RecipePath>,
) -> Result<Json<DownloadUrls>, ApiError> {
    let coords = path.coordinates()?;
    let resolved = latest(&state, &coords).await?;
    let base = origin.remote_base(&state.config.server);

    let urls = DownloadUrls::from([(
        RECIPE_MANIFEST.to_string(),
        v1_file_url(&base, &coords, &resolved.revision.revision, RECIPE_MANIFEST),
    )]);
    Ok(Json(urls))
}

/// Well-known files of the current revision mapped to gateway download URLs
async fn download_urls(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Path(path): Path<RecipePath>,
) -> Result<Json<DownloadUrls>, ApiError> {
    let coords = path.coordinates()?;
    let manifest = latest_manifest(&state, &coords).await?;
    let base = origin.remote_base(&state.config.server);

    let urls = manifest
        .well_known()
        .map(|file| {
            (
                file.to_string(),
                v1_file_url(&base, &coords, &manifest.revision, file),
            )
        })
        .collect();
    Ok(Json(urls))
}

async fn download(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Path(path): Path<FilePath>,
) -> Result<Response, ApiError> {
    let (coords, revision, file) = path.parse()?;
    Ok(redirect_to_store(&state, &origin, &coords, &revision, &file))
}
