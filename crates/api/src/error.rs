//! API error types and the envelope-to-HTTP mapping.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{EntityId, ErrorCode, ServiceResponse};
use serde::Serialize;
use thiserror::Error;

/// A service envelope on its way out as an HTTP response.
///
/// Success answers with the status chosen by the handler (200, or 201 for
/// creates). Failures answer 404 for `NOT_FOUND` and every `*_NOT_FOUND`
/// code, 400 for everything else.
#[derive(Debug)]
pub struct Envelope<T> {
    success_status: StatusCode,
    response: ServiceResponse<T>,
}

impl<T> Envelope<T> {
    pub fn ok(response: ServiceResponse<T>) -> Self {
        Self {
            success_status: StatusCode::OK,
            response,
        }
    }

    pub fn created(response: ServiceResponse<T>) -> Self {
        Self {
            success_status: StatusCode::CREATED,
            response,
        }
    }

    /// HTTP status this envelope will be sent with.
    pub fn status(&self) -> StatusCode {
        match self.response.error_code() {
            None => self.success_status,
            Some(code) => status_for(code),
        }
    }
}

impl<T> From<ServiceResponse<T>> for Envelope<T> {
    fn from(response: ServiceResponse<T>) -> Self {
        Self::ok(response)
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self.response)).into_response()
    }
}

/// Maps a failure code to its HTTP status.
pub fn status_for(code: ErrorCode) -> StatusCode {
    if code.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::BAD_REQUEST
    }
}

/// Request-level failures caught before a service is called.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A path segment is not a valid identifier.
    #[error("Invalid {name} '{value}': expected a UUID")]
    InvalidId { name: &'static str, value: String },

    /// The JSON body could not be read.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// The query string could not be read.
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::InvalidId { .. } => ErrorCode::INVALID_ID,
            ApiError::InvalidBody(_) | ApiError::InvalidQuery(_) => ErrorCode::INVALID_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        tracing::debug!(%code, error = %self, "request rejected");
        metrics::counter!("api_rejected_requests_total", "code" => code.as_str()).increment(1);

        let body: ServiceResponse<()> = ServiceResponse::failure(code, self.to_string());
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidQuery(rejection.body_text())
    }
}

/// Parses a path segment into a typed identifier.
pub fn parse_id<I: EntityId>(name: &'static str, value: &str) -> Result<I, ApiError> {
    uuid::Uuid::parse_str(value)
        .map(I::from)
        .map_err(|_| ApiError::InvalidId {
            name,
            value: value.to_string(),
        })
}
