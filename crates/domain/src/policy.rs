//! Warranty policies.

use chrono::{DateTime, Utc};
use common::WarrantyPolicyId;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, StatusSet};
use crate::error::DomainError;
use crate::validate;

const NAME_MAX: usize = 150;
const DESCRIPTION_MAX: usize = 1000;
pub const DURATION_MIN_MONTHS: i32 = 1;
pub const DURATION_MAX_MONTHS: i32 = 120;

/// Lifecycle of a warranty policy.
///
/// ```text
/// Draft ──► Active ──► Archived
///   └──────────────────────┘
/// ```
///
/// The entity accepts any member as the next status; only `Draft`
/// policies may have their terms or coverage edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PolicyStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

impl StatusSet for PolicyStatus {
    const ALL: &'static [Self] = &[
        PolicyStatus::Draft,
        PolicyStatus::Active,
        PolicyStatus::Archived,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            PolicyStatus::Draft => "Draft",
            PolicyStatus::Active => "Active",
            PolicyStatus::Archived => "Archived",
        }
    }
}

impl std::fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named warranty product with a duration and optional mileage cap.
#[derive(Debug, Clone, PartialEq)]
pub struct WarrantyPolicy {
    id: WarrantyPolicyId,
    name: String,
    description: Option<String>,
    duration_months: i32,
    mileage_limit_km: Option<i64>,
    status: PolicyStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored representation of a [`WarrantyPolicy`].
#[derive(Debug, Clone)]
pub struct WarrantyPolicyRecord {
    pub id: WarrantyPolicyId,
    pub name: String,
    pub description: Option<String>,
    pub duration_months: i32,
    pub mileage_limit_km: Option<i64>,
    pub status: PolicyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WarrantyPolicyRecord> for WarrantyPolicy {
    fn from(r: WarrantyPolicyRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            duration_months: r.duration_months,
            mileage_limit_km: r.mileage_limit_km,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl Entity for WarrantyPolicy {
    type Id = WarrantyPolicyId;
    const NAME: &'static str = "Warranty policy";

    fn id(&self) -> WarrantyPolicyId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// The editable terms of a policy, validated as a unit.
struct Terms {
    name: String,
    description: Option<String>,
    duration_months: i32,
    mileage_limit_km: Option<i64>,
}

impl Terms {
    fn validate(
        name: &str,
        description: Option<&str>,
        duration_months: i32,
        mileage_limit_km: Option<i64>,
    ) -> Result<Self, DomainError> {
        let name = validate::required("name", name, NAME_MAX)?;
        let description = validate::optional("description", description, DESCRIPTION_MAX)?;
        validate::in_range(
            "duration_months",
            i64::from(duration_months),
            i64::from(DURATION_MIN_MONTHS),
            i64::from(DURATION_MAX_MONTHS),
        )?;
        if let Some(limit) = mileage_limit_km {
            validate::in_range("mileage_limit_km", limit, 1, i64::from(i32::MAX))?;
        }
        Ok(Self {
            name,
            description,
            duration_months,
            mileage_limit_km,
        })
    }
}

/// Trims a policy name and checks its length.
pub fn normalize_policy_name(name: &str) -> Result<String, DomainError> {
    validate::required("name", name, NAME_MAX)
}

impl WarrantyPolicy {
    /// Creates a `Draft` policy.
    pub fn new(
        name: &str,
        description: Option<&str>,
        duration_months: i32,
        mileage_limit_km: Option<i64>,
    ) -> Result<Self, DomainError> {
        let terms = Terms::validate(name, description, duration_months, mileage_limit_km)?;
        let now = Utc::now();
        Ok(Self {
            id: WarrantyPolicyId::new(),
            name: terms.name,
            description: terms.description,
            duration_months: terms.duration_months,
            mileage_limit_km: terms.mileage_limit_km,
            status: PolicyStatus::Draft,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn duration_months(&self) -> i32 {
        self.duration_months
    }

    pub fn mileage_limit_km(&self) -> Option<i64> {
        self.mileage_limit_km
    }

    pub fn status(&self) -> PolicyStatus {
        self.status
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Only draft policies may change their terms or coverage.
    pub fn is_editable(&self) -> bool {
        self.status == PolicyStatus::Draft
    }

    /// Replaces all editable terms at once.
    pub fn update_terms(
        &mut self,
        name: &str,
        description: Option<&str>,
        duration_months: i32,
        mileage_limit_km: Option<i64>,
    ) -> Result<(), DomainError> {
        let terms = Terms::validate(name, description, duration_months, mileage_limit_km)?;
        self.name = terms.name;
        self.description = terms.description;
        self.duration_months = terms.duration_months;
        self.mileage_limit_km = terms.mileage_limit_km;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn change_status(&mut self, status: PolicyStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> WarrantyPolicy {
        WarrantyPolicy::new("Powertrain 5y", None, 60, Some(100_000)).unwrap()
    }

    #[test]
    fn new_policy_is_editable_draft() {
        let policy = policy();
        assert_eq!(policy.status(), PolicyStatus::Draft);
        assert!(policy.is_editable());
    }

    #[test]
    fn duration_bounds() {
        assert!(WarrantyPolicy::new("P", None, 0, None).is_err());
        assert!(WarrantyPolicy::new("P", None, 121, None).is_err());
        assert!(WarrantyPolicy::new("P", None, 120, None).is_ok());
    }

    #[test]
    fn mileage_limit_must_be_positive() {
        let err = WarrantyPolicy::new("P", None, 12, Some(0)).unwrap_err();
        assert_eq!(err.code().as_str(), "VALUE_OUT_OF_RANGE");
    }

    #[test]
    fn draft_may_jump_straight_to_archived() {
        let mut policy = policy();
        policy.change_status(PolicyStatus::Archived);
        assert_eq!(policy.status(), PolicyStatus::Archived);
        assert!(!policy.is_editable());
        policy.change_status(PolicyStatus::Draft);
        assert!(policy.is_editable());
    }

    #[test]
    fn status_parse() {
        assert_eq!(PolicyStatus::parse("active"), Some(PolicyStatus::Active));
        assert_eq!(PolicyStatus::parse("Suspended"), None);
        assert_eq!(PolicyStatus::allowed(), "Draft, Active, Archived");
    }
}
