use std::time::Duration;

use axum::{
    Json,
    extract::rejection::{PathRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use super::models::ErrorResponse;
use crate::gate::GateError;
use crate::index::IndexError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not Found")]
    NotFound,
    #[error("Invalid request")]
    Validation(Vec<String>),
    #[error("{reason}")]
    Unavailable { reason: String, retry_after: Duration },
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            ApiError::Internal(detail) => {
                error!(%detail, "Request failed");
                ErrorResponse {
                    status: status.as_u16(),
                    message: "Internal Server Error".to_string(),
                    errors: None,
                }
            }
            ApiError::Validation(errors) => ErrorResponse {
                status: status.as_u16(),
                message: self.to_string(),
                errors: Some(errors.clone()),
            },
            _ => ErrorResponse {
                status: status.as_u16(),
                message: self.to_string(),
                errors: None,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let ApiError::Unavailable { retry_after, .. } = &self {
            // Clients read this as whole seconds, never zero
            let seconds = retry_after.as_secs().max(1);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

impl From<IndexError> for ApiError {
    fn from(value: IndexError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(vec![rejection.body_text()])
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(vec![rejection.body_text()])
    }
}

impl From<GateError> for ApiError {
    fn from(value: GateError) -> Self {
        ApiError::Internal(value.to_string())
    }
}
