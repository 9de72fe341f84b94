use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::ApiError;
use super::state::AppState;
use crate::gate::Admission;

pub const CAPABILITIES_HEADER: &str = "x-conan-server-capabilities";
pub const VERSION_HEADER: &str = "x-recipegate-version";

/// Consult the availability gate before any route runs
pub async fn admission(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match state.gate.check().await {
        Admission::Admit => {
            state.metrics.request_admitted();
            next.run(request).await
        }
        Admission::Reject {
            reason,
            retry_after,
        } => {
            state.metrics.request_rejected();
            ApiError::Unavailable {
                reason,
                retry_after,
            }
            .into_response()
        }
        Admission::Fail(err) => ApiError::from(err).into_response(),
    }
}

/// Stamp every response, rejections included, with the server capabilities
pub async fn advertise_capabilities(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(CAPABILITIES_HEADER, HeaderValue::from_static("revisions"));
    headers.insert(
        VERSION_HEADER,
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    response
}
