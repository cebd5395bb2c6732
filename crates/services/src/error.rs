//! Service error type and its conversion into the result envelope.

use std::fmt::Display;

use common::{ErrorCode, ServiceResponse};
use domain::{DomainError, StatusSet};
use store::StoreError;
use thiserror::Error;

use crate::lookup::LookupError;

/// Message returned for every failure that is not the caller's fault.
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

/// Why a service operation did not succeed.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// An expected rejection: not found, duplicate, blocked by dependents.
    #[error("{message}")]
    Rejected { code: ErrorCode, message: String },

    /// An entity guard refused the change.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The claims directory failed.
    #[error("Claims lookup error: {0}")]
    Lookup(#[from] LookupError),
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub fn rejected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    /// `NOT_FOUND` for the entity being operated on, naming the key that
    /// was looked up.
    pub fn not_found(entity: &str, key: impl Display) -> Self {
        Self::rejected(ErrorCode::NOT_FOUND, format!("{entity} {key} not found"))
    }
}

/// Turns a constraint violation into the rejection `describe` gives for it.
///
/// `describe` receives the violated constraint name and answers `None` for
/// constraints the operation does not expect; those stay store errors. The
/// service checks these conditions before writing, but the store is the
/// final authority when two requests race.
pub fn on_conflict(
    err: StoreError,
    describe: impl FnOnce(&str) -> Option<ServiceError>,
) -> ServiceError {
    let rejection = match &err {
        StoreError::UniqueViolation { constraint }
        | StoreError::ForeignKeyViolation { constraint } => describe(constraint),
        _ => None,
    };
    rejection.unwrap_or(ServiceError::Store(err))
}

/// True when a commit was refused because rows still reference the target.
pub fn is_still_referenced(err: &StoreError) -> bool {
    matches!(err, StoreError::ForeignKeyViolation { .. })
}

/// Parses a status name, rejecting unknown values with `INVALID_STATUS`.
pub fn parse_status<S: StatusSet>(value: &str) -> Result<S> {
    S::parse(value).ok_or_else(|| {
        ServiceError::rejected(
            ErrorCode::INVALID_STATUS,
            format!(
                "Invalid status '{}'. Allowed values: {}",
                value.trim(),
                S::allowed()
            ),
        )
    })
}

/// Builds the envelope for an operation outcome and records it.
///
/// Rejections and guard failures keep their code and message. Store and
/// lookup failures are logged and answered with a generic `INTERNAL_ERROR`.
pub fn respond<T>(
    operation: &'static str,
    success_message: &str,
    outcome: Result<T>,
) -> ServiceResponse<T> {
    let (label, response) = match outcome {
        Ok(data) => ("success", ServiceResponse::ok(success_message, data)),
        Err(ServiceError::Rejected { code, message }) => {
            tracing::debug!(operation, %code, %message, "operation rejected");
            ("rejected", ServiceResponse::failure(code, message))
        }
        Err(ServiceError::Domain(err)) => {
            tracing::warn!(operation, code = %err.code(), error = %err, "domain guard failed");
            ("rejected", ServiceResponse::failure(err.code(), err.to_string()))
        }
        Err(err) => {
            tracing::error!(operation, error = %err, "operation failed");
            (
                "error",
                ServiceResponse::failure(ErrorCode::INTERNAL_ERROR, INTERNAL_ERROR_MESSAGE),
            )
        }
    };
    metrics::counter!(
        "service_operations_total",
        "operation" => operation,
        "outcome" => label
    )
    .increment(1);
    response
}
