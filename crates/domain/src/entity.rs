//! Core abstractions shared by every aggregate.

use chrono::{DateTime, Utc};
use common::EntityId;

/// A persisted aggregate root with a typed identifier.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Typed identifier of this entity.
    type Id: EntityId;

    /// Human-readable entity name used in messages ("Customer", "Part").
    const NAME: &'static str;

    /// Returns the identifier.
    fn id(&self) -> Self::Id;

    /// Creation time; repositories list rows in this order.
    fn created_at(&self) -> DateTime<Utc>;
}

/// A finite set of named statuses.
///
/// Parsing is case-insensitive; [`StatusSet::allowed`] lists the canonical
/// names for error messages.
pub trait StatusSet: Copy + Eq + Sized + 'static {
    /// Every member, in declaration order.
    const ALL: &'static [Self];

    /// Canonical name of this status.
    fn as_str(&self) -> &'static str;

    /// Parses a status name, ignoring case and surrounding whitespace.
    fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(value))
    }

    /// Comma separated list of the canonical names.
    fn allowed() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
