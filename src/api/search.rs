use axum::{Json, extract::State};

use super::error::ApiError;
use super::extract::Query;
use super::models::{SearchParams, SearchResults};
use super::state::AppState;
use crate::index::SearchFlags;

/// `GET .../conans/search?q=&ignorecase=`, shared by both protocol versions
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, ApiError> {
    let query = match params.q.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => query,
        _ => return Ok(Json(SearchResults { results: Vec::new() })),
    };

    let results = state
        .index
        .search_references(query, search_flags(&params))
        .await?;

    Ok(Json(SearchResults { results }))
}

/// Clients send `ignorecase=False` to ask for a case-sensitive match
fn search_flags(params: &SearchParams) -> SearchFlags {
    let case_sensitive = params
        .ignorecase
        .as_deref()
        .is_some_and(|value| value.eq_ignore_ascii_case("false"));
    SearchFlags { case_sensitive }
}
