//! Listing API (`/corum`)
//!
//! A closed set of read-only operations over the project index. Each route
//! parses its input into a [`ListingOperation`] and [`dispatch`] runs it.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};

use super::error::ApiError;
use super::extract::{Path, Query};
use super::models::ListingMeta;
use super::state::AppState;
use crate::config::Environment;
use crate::index::{ListingQuery, MatchScope};

pub const API_VERSION: &str = "1.0.0";

const MAX_QUERY_BYTES: usize = 256;
const MAX_OFFSET: i64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingOperation {
    Meta,
    Search(ListingQuery),
    Project(String),
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/meta", get(meta))
        .route("/search", get(search))
        .route("/projects/{name}", get(project))
}

async fn meta(State(state): State<AppState>) -> Result<Response, ApiError> {
    dispatch(&state, ListingOperation::Meta).await
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let query = parse_listing_query(&params).map_err(ApiError::Validation)?;
    dispatch(&state, ListingOperation::Search(query)).await
}

async fn project(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    dispatch(&state, ListingOperation::Project(name)).await
}

pub async fn dispatch(state: &AppState, operation: ListingOperation) -> Result<Response, ApiError> {
    match operation {
        ListingOperation::Meta => {
            let server = &state.config.server;
            let stability = match server.environment {
                Environment::Production => "release",
                Environment::Development => "dev",
            };
            Ok(Json(ListingMeta {
                api_version: API_VERSION,
                server_version: env!("CARGO_PKG_VERSION"),
                server_name: server.name.clone(),
                stability,
            })
            .into_response())
        }
        ListingOperation::Search(query) => {
            let page = state.index.search_projects(&query).await?;
            Ok(Json(page).into_response())
        }
        ListingOperation::Project(name) => {
            let detail = state.index.project(&name).await?.ok_or(ApiError::NotFound)?;
            Ok(Json(detail).into_response())
        }
    }
}

/// Parse `q`, `in` and `offset`, reporting every bad parameter at once
pub fn parse_listing_query(params: &HashMap<String, String>) -> Result<ListingQuery, Vec<String>> {
    let mut errors = Vec::new();

    let text = params.get("q").map(|q| q.trim()).unwrap_or_default();
    if text.is_empty() {
        errors.push("q: required".to_string());
    } else if text.len() > MAX_QUERY_BYTES {
        errors.push(format!("q: longer than {} bytes", MAX_QUERY_BYTES));
    }

    let scope = match params.get("in") {
        None => MatchScope::All,
        Some(value) => MatchScope::parse(value).unwrap_or_else(|| {
            errors.push(format!("in: expected one of all, name, topic, got '{}'", value));
            MatchScope::All
        }),
    };

    let offset = match params.get("offset") {
        None => 0,
        Some(value) => match value.parse::<i64>() {
            Ok(offset) if (0..=MAX_OFFSET).contains(&offset) => offset,
            _ => {
                errors.push(format!(
                    "offset: expected an integer between 0 and {}, got '{}'",
                    MAX_OFFSET, value
                ));
                0
            }
        },
    };

    if errors.is_empty() {
        Ok(ListingQuery {
            text: text.to_string(),
            scope,
            offset,
        })
    } else {
        Err(errors)
    }
}
