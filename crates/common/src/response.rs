//! The uniform operation result envelope.
//!
//! Every service operation answers with a [`ServiceResponse`]: either a
//! success carrying a message and an optional payload, or a failure carrying
//! a stable machine-readable [`ErrorCode`] and a human-readable message.
//! On the wire both variants share one shape:
//!
//! ```json
//! { "is_success": false, "message": "...", "error_code": "NOT_FOUND", "data": null }
//! ```

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Stable machine-readable failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    pub const NOT_FOUND: Self = Self("NOT_FOUND");
    pub const INVALID_STATUS: Self = Self("INVALID_STATUS");
    pub const INVALID_ID: Self = Self("INVALID_ID");
    pub const INVALID_REQUEST: Self = Self("INVALID_REQUEST");
    pub const INTERNAL_ERROR: Self = Self("INTERNAL_ERROR");

    // Conflicts
    pub const DUPLICATE_EMAIL: Self = Self("DUPLICATE_EMAIL");
    pub const DUPLICATE_VIN: Self = Self("DUPLICATE_VIN");
    pub const DUPLICATE_VEHICLE_MODEL: Self = Self("DUPLICATE_VEHICLE_MODEL");
    pub const DUPLICATE_CATEGORY_NAME: Self = Self("DUPLICATE_CATEGORY_NAME");
    pub const DUPLICATE_SERIAL_NUMBER: Self = Self("DUPLICATE_SERIAL_NUMBER");
    pub const DUPLICATE_POLICY_NAME: Self = Self("DUPLICATE_POLICY_NAME");
    pub const DUPLICATE_COVERAGE: Self = Self("DUPLICATE_COVERAGE");

    // Missing references
    pub const CUSTOMER_NOT_FOUND: Self = Self("CUSTOMER_NOT_FOUND");
    pub const MODEL_NOT_FOUND: Self = Self("MODEL_NOT_FOUND");
    pub const CATEGORY_NOT_FOUND: Self = Self("CATEGORY_NOT_FOUND");
    pub const PARENT_CATEGORY_NOT_FOUND: Self = Self("PARENT_CATEGORY_NOT_FOUND");
    pub const POLICY_NOT_FOUND: Self = Self("POLICY_NOT_FOUND");
    pub const PART_NOT_FOUND: Self = Self("PART_NOT_FOUND");
    pub const CLAIM_NOT_FOUND: Self = Self("CLAIM_NOT_FOUND");
    pub const TECHNICIAN_NOT_FOUND: Self = Self("TECHNICIAN_NOT_FOUND");
    pub const COVERAGE_NOT_FOUND: Self = Self("COVERAGE_NOT_FOUND");

    // State preconditions
    pub const MODEL_IN_USE: Self = Self("MODEL_IN_USE");
    pub const PART_IN_USE: Self = Self("PART_IN_USE");
    pub const CATEGORY_HAS_CHILDREN: Self = Self("CATEGORY_HAS_CHILDREN");
    pub const CATEGORY_HAS_ACTIVE_PARTS: Self = Self("CATEGORY_HAS_ACTIVE_PARTS");
    pub const CATEGORY_INACTIVE: Self = Self("CATEGORY_INACTIVE");
    pub const CATEGORY_IN_USE: Self = Self("CATEGORY_IN_USE");
    pub const CUSTOMER_HAS_ACTIVE_VEHICLES: Self = Self("CUSTOMER_HAS_ACTIVE_VEHICLES");
    pub const POLICY_HAS_COVERAGE: Self = Self("POLICY_HAS_COVERAGE");
    pub const POLICY_NOT_EDITABLE: Self = Self("POLICY_NOT_EDITABLE");
    pub const TECHNICIAN_INACTIVE: Self = Self("TECHNICIAN_INACTIVE");
    pub const WORK_ORDER_NOT_DELETABLE: Self = Self("WORK_ORDER_NOT_DELETABLE");

    /// Creates a code from a static string.
    ///
    /// Used for codes that originate outside this module, such as domain
    /// guard violations.
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Returns true for `NOT_FOUND` and every `<THING>_NOT_FOUND` code.
    pub fn is_not_found(&self) -> bool {
        self.0 == Self::NOT_FOUND.0 || self.0.ends_with("_NOT_FOUND")
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

/// Result of a service operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceResponse<T> {
    /// The operation succeeded. `data` is absent for operations without a
    /// natural payload, such as deletes.
    Success { message: String, data: Option<T> },
    /// The operation failed with a stable code.
    Failure { code: ErrorCode, message: String },
}

impl<T> ServiceResponse<T> {
    /// Successful result carrying a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::Success {
            message: message.into(),
            data: Some(data),
        }
    }

    /// Successful result without a payload.
    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
            data: None,
        }
    }

    /// Failed result.
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Failure {
            code,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Failure { message, .. } => message,
        }
    }

    /// Returns the failure code, or `None` on success.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { code, .. } => Some(*code),
        }
    }

    /// Returns the payload, if any.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => data.as_ref(),
            Self::Failure { .. } => None,
        }
    }

    /// Consumes the response and returns the payload, if any.
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success { data, .. } => data,
            Self::Failure { .. } => None,
        }
    }

    /// Maps the payload, leaving failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceResponse<U> {
        match self {
            Self::Success { message, data } => ServiceResponse::Success {
                message,
                data: data.map(f),
            },
            Self::Failure { code, message } => ServiceResponse::Failure { code, message },
        }
    }
}

impl<T: Serialize> Serialize for ServiceResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ServiceResponse", 4)?;
        state.serialize_field("is_success", &self.is_success())?;
        state.serialize_field("message", self.message())?;
        state.serialize_field("error_code", &self.error_code())?;
        state.serialize_field("data", &self.data())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_serializes_with_null_error_code() {
        let response = ServiceResponse::ok("Customer created", json!({"first_name": "Mark"}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "is_success": true,
                "message": "Customer created",
                "error_code": null,
                "data": {"first_name": "Mark"}
            })
        );
    }

    #[test]
    fn failure_serializes_with_null_data() {
        let response: ServiceResponse<u32> =
            ServiceResponse::failure(ErrorCode::NOT_FOUND, "Part 42 not found");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "is_success": false,
                "message": "Part 42 not found",
                "error_code": "NOT_FOUND",
                "data": null
            })
        );
    }

    #[test]
    fn empty_success_has_no_data() {
        let response: ServiceResponse<u32> = ServiceResponse::ok_empty("Deleted");
        assert!(response.is_success());
        assert!(response.data().is_none());
        assert_eq!(response.error_code(), None);
    }

    #[test]
    fn not_found_family() {
        assert!(ErrorCode::NOT_FOUND.is_not_found());
        assert!(ErrorCode::CUSTOMER_NOT_FOUND.is_not_found());
        assert!(ErrorCode::new("WIDGET_NOT_FOUND").is_not_found());
        assert!(!ErrorCode::DUPLICATE_EMAIL.is_not_found());
        assert!(!ErrorCode::INTERNAL_ERROR.is_not_found());
    }

    #[test]
    fn map_preserves_failure() {
        let response: ServiceResponse<u32> =
            ServiceResponse::failure(ErrorCode::PART_IN_USE, "installed");
        let mapped = response.map(|n| n.to_string());
        assert_eq!(mapped.error_code(), Some(ErrorCode::PART_IN_USE));
        assert_eq!(mapped.message(), "installed");
    }
}
