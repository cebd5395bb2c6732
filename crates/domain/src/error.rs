//! Domain error types.

use common::ErrorCode;
use thiserror::Error;

/// A guard inside an entity mutator rejected the requested change.
///
/// Each variant carries a fixed [`ErrorCode`] so callers can surface the
/// violation without inspecting the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A required text field was empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// A text field exceeded its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// The email address is malformed.
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    /// The vehicle identification number is malformed.
    #[error("'{0}' is not a valid VIN (17 letters or digits, excluding I, O and Q)")]
    InvalidVin(String),

    /// A numeric field was outside its legal range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },

    /// A numeric field that must not be negative was negative.
    #[error("{field} cannot be negative, got {value}")]
    Negative { field: &'static str, value: i64 },

    /// Odometer readings only move forward.
    #[error("Mileage cannot decrease from {current} km to {requested} km")]
    MileageDecrease { current: i64, requested: i64 },

    /// Soft delete on an already deleted record.
    #[error("{entity} is already deleted")]
    AlreadyDeleted { entity: &'static str },

    /// Restore on a record that is not deleted.
    #[error("{entity} is not deleted")]
    NotDeleted { entity: &'static str },

    /// A category cannot sit below itself.
    #[error("A category cannot be its own parent or a descendant of itself")]
    InvalidParentCategory,

    /// Retired parts are terminal.
    #[error("Part {serial_number} is retired and its status can no longer change")]
    PartRetired { serial_number: String },

    /// The entity is in a terminal status.
    #[error("Cannot change {entity} status from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },
}

impl DomainError {
    /// Returns the stable code for this violation.
    pub fn code(&self) -> ErrorCode {
        let code = match self {
            DomainError::Required { .. } => "FIELD_REQUIRED",
            DomainError::TooLong { .. } => "FIELD_TOO_LONG",
            DomainError::InvalidEmail(_) => "INVALID_EMAIL",
            DomainError::InvalidVin(_) => "INVALID_VIN",
            DomainError::OutOfRange { .. } | DomainError::Negative { .. } => "VALUE_OUT_OF_RANGE",
            DomainError::MileageDecrease { .. } => "INVALID_MILEAGE",
            DomainError::AlreadyDeleted { .. } => "ALREADY_DELETED",
            DomainError::NotDeleted { .. } => "NOT_DELETED",
            DomainError::InvalidParentCategory => "INVALID_PARENT_CATEGORY",
            DomainError::PartRetired { .. } => "PART_RETIRED",
            DomainError::InvalidTransition { .. } => "INVALID_STATUS_TRANSITION",
        };
        ErrorCode::new(code)
    }
}
