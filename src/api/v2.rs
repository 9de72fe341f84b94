//! Protocol V2 adapter: revisions are explicit in every recipe path

use axum::{
    Json, Router,
    extract::State,
    response::Response,
    routing::get,
};

use super::error::ApiError;
use super::extract::Path;
use super::models::RevisionFiles;
use super::origin::RequestOrigin;
use super::recipes::{FilePath, RecipePath, RevisionPath, redirect_to_store};
use super::search::search;
use super::state::AppState;
use crate::recipe::Revision;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/conans/search", get(search))
        .route("/conans/{name}/{version}/{user}/{channel}/latest", get(latest))
        .route(
            "/conans/{name}/{version}/{user}/{channel}/revisions/{revision}/files",
            get(files),
        )
        .route(
            "/conans/{name}/{version}/{user}/{channel}/revisions/{revision}/files/{file}",
            get(download),
        )
        .fallback(not_found)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn latest(
    State(state): State<AppState>,
    Path(path): Path<RecipePath>,
) -> Result<Json<Revision>, ApiError> {
    let coords = path.coordinates()?;
    let resolved = state
        .resolver
        .resolve_latest(&coords)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(resolved.revision))
}

async fn files(
    State(state): State<AppState>,
    Path(path): Path<RevisionPath>,
) -> Result<Json<RevisionFiles>, ApiError> {
    let (coords, revision) = path.parse()?;
    let manifest = state
        .resolver
        .resolve_files(&coords, &revision)
        .await
        .ok_or(ApiError::NotFound)?;

    let files = manifest
        .files
        .into_iter()
        .map(|(name, entry)| (name, entry.metadata))
        .collect();
    Ok(Json(RevisionFiles { files }))
}

async fn download(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Path(path): Path<FilePath>,
) -> Result<Response, ApiError> {
    let (coords, revision, file) = path.parse()?;
    Ok(redirect_to_store(&state, &origin, &coords, &revision, &file))
}
