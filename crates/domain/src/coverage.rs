//! Part categories covered by a warranty policy.

use chrono::{DateTime, Utc};
use common::{CoverageId, Money, PartCategoryId, WarrantyPolicyId};

use crate::entity::Entity;
use crate::error::DomainError;
use crate::validate;

const NOTES_MAX: usize = 500;

/// Links a policy to a part category with a reimbursement share.
///
/// A policy covers each category at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyCoveragePart {
    id: CoverageId,
    policy_id: WarrantyPolicyId,
    category_id: PartCategoryId,
    coverage_percent: u8,
    max_claim_amount: Option<Money>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored representation of a [`PolicyCoveragePart`].
#[derive(Debug, Clone)]
pub struct PolicyCoveragePartRecord {
    pub id: CoverageId,
    pub policy_id: WarrantyPolicyId,
    pub category_id: PartCategoryId,
    pub coverage_percent: u8,
    pub max_claim_amount: Option<Money>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PolicyCoveragePartRecord> for PolicyCoveragePart {
    fn from(r: PolicyCoveragePartRecord) -> Self {
        Self {
            id: r.id,
            policy_id: r.policy_id,
            category_id: r.category_id,
            coverage_percent: r.coverage_percent,
            max_claim_amount: r.max_claim_amount,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl Entity for PolicyCoveragePart {
    type Id = CoverageId;
    const NAME: &'static str = "Coverage";

    fn id(&self) -> CoverageId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn check_percent(percent: i64) -> Result<u8, DomainError> {
    let percent = validate::in_range("coverage_percent", percent, 1, 100)?;
    // in range 1..=100, fits in u8
    Ok(percent as u8)
}

fn check_cap(cap: Option<Money>) -> Result<Option<Money>, DomainError> {
    cap.map(|cap| validate::amount("max_claim_amount", cap))
        .transpose()
}

impl PolicyCoveragePart {
    pub fn new(
        policy_id: WarrantyPolicyId,
        category_id: PartCategoryId,
        coverage_percent: i64,
        max_claim_amount: Option<Money>,
        notes: Option<&str>,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();
        Ok(Self {
            id: CoverageId::new(),
            policy_id,
            category_id,
            coverage_percent: check_percent(coverage_percent)?,
            max_claim_amount: check_cap(max_claim_amount)?,
            notes: validate::optional("notes", notes, NOTES_MAX)?,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn policy_id(&self) -> WarrantyPolicyId {
        self.policy_id
    }

    pub fn category_id(&self) -> PartCategoryId {
        self.category_id
    }

    pub fn coverage_percent(&self) -> u8 {
        self.coverage_percent
    }

    pub fn max_claim_amount(&self) -> Option<Money> {
        self.max_claim_amount
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Amount reimbursed for a part at `price`: the covered share, capped at
    /// `max_claim_amount` when one is set.
    pub fn covered_amount(&self, price: Money) -> Money {
        let share = price.percent(self.coverage_percent);
        match self.max_claim_amount {
            Some(cap) => share.min(cap),
            None => share,
        }
    }

    pub fn change_terms(
        &mut self,
        coverage_percent: i64,
        max_claim_amount: Option<Money>,
        notes: Option<&str>,
    ) -> Result<(), DomainError> {
        let coverage_percent = check_percent(coverage_percent)?;
        let max_claim_amount = check_cap(max_claim_amount)?;
        let notes = validate::optional("notes", notes, NOTES_MAX)?;
        self.coverage_percent = coverage_percent;
        self.max_claim_amount = max_claim_amount;
        self.notes = notes;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage(percent: i64, cap: Option<i64>) -> PolicyCoveragePart {
        PolicyCoveragePart::new(
            WarrantyPolicyId::new(),
            PartCategoryId::new(),
            percent,
            cap.map(Money::from_cents),
            None,
        )
        .unwrap()
    }

    #[test]
    fn percent_bounds() {
        for bad in [0, 101, -5] {
            let err = PolicyCoveragePart::new(
                WarrantyPolicyId::new(),
                PartCategoryId::new(),
                bad,
                None,
                None,
            )
            .unwrap_err();
            assert_eq!(err.code().as_str(), "VALUE_OUT_OF_RANGE");
        }
    }

    #[test]
    fn covered_amount_applies_share_and_cap() {
        let uncapped = coverage(80, None);
        assert_eq!(uncapped.covered_amount(Money::from_cents(10_000)).cents(), 8_000);

        let capped = coverage(80, Some(5_000));
        assert_eq!(capped.covered_amount(Money::from_cents(10_000)).cents(), 5_000);
        assert_eq!(capped.covered_amount(Money::from_cents(1_000)).cents(), 800);
    }

    #[test]
    fn cap_above_the_ceiling_is_rejected() {
        let too_large = Money::from_cents(crate::MAX_AMOUNT_CENTS + 1);
        let mut half = coverage(50, None);
        let err = half.change_terms(50, Some(too_large), None).unwrap_err();
        assert_eq!(err.code().as_str(), "VALUE_OUT_OF_RANGE");
        assert_eq!(half.max_claim_amount(), None);

        let at_ceiling = coverage(100, Some(crate::MAX_AMOUNT_CENTS));
        let price = Money::from_cents(crate::MAX_AMOUNT_CENTS);
        assert_eq!(at_ceiling.covered_amount(price).cents(), crate::MAX_AMOUNT_CENTS);
    }

    #[test]
    fn change_terms_is_all_or_nothing() {
        let mut coverage = coverage(50, None);
        assert!(coverage.change_terms(60, Some(Money::from_cents(-1)), None).is_err());
        assert_eq!(coverage.coverage_percent(), 50);
    }
}
