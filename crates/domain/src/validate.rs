//! Field checks shared by entity constructors and mutators.

use common::Money;

use crate::error::DomainError;

/// Largest price or claim cap accepted, in cents ($1,000,000,000.00).
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// Trims `value` and rejects it when empty or longer than `max` characters.
pub(crate) fn required(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Required { field });
    }
    if trimmed.chars().count() > max {
        return Err(DomainError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

/// Like [`required`], but blank input becomes `None`.
pub(crate) fn optional(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, DomainError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > max => Err(DomainError::TooLong { field, max }),
        Some(v) => Ok(Some(v.to_string())),
    }
}

pub(crate) fn in_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<i64, DomainError> {
    if value < min || value > max {
        return Err(DomainError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(value)
}

pub(crate) fn non_negative(field: &'static str, value: i64) -> Result<i64, DomainError> {
    if value < 0 {
        return Err(DomainError::Negative { field, value });
    }
    Ok(value)
}

/// A money amount between zero and [`MAX_AMOUNT_CENTS`].
pub(crate) fn amount(field: &'static str, value: Money) -> Result<Money, DomainError> {
    let cents = non_negative(field, value.cents())?;
    in_range(field, cents, 0, MAX_AMOUNT_CENTS)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_checks_length() {
        assert_eq!(required("name", "  Brake  ", 10).unwrap(), "Brake");
        assert_eq!(
            required("name", "   ", 10),
            Err(DomainError::Required { field: "name" })
        );
        assert_eq!(
            required("name", "abcdefghijk", 10),
            Err(DomainError::TooLong {
                field: "name",
                max: 10
            })
        );
    }

    #[test]
    fn optional_blank_is_none() {
        assert_eq!(optional("notes", Some("  "), 5).unwrap(), None);
        assert_eq!(optional("notes", None, 5).unwrap(), None);
        assert_eq!(optional("notes", Some(" ok "), 5).unwrap(), Some("ok".into()));
        assert!(optional("notes", Some("too long"), 5).is_err());
    }

    #[test]
    fn range_is_inclusive() {
        assert!(in_range("year", 1900, 1900, 2100).is_ok());
        assert!(in_range("year", 2100, 1900, 2100).is_ok());
        assert!(in_range("year", 1899, 1900, 2100).is_err());
    }
}
