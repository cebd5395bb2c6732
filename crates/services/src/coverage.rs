//! Policy coverage service: which part categories a policy covers, and for
//! how much.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::{
    CoverageId, ErrorCode, Money, PartCategoryId, PartId, ServiceResponse, WarrantyPolicyId,
};
use domain::{Entity, PolicyCoveragePart, WarrantyPolicy};
use serde::{Deserialize, Serialize};
use store::constraints;
use store::{CoverageRepository, Repository, Store, UnitOfWork};

use crate::error::{Result, ServiceError, on_conflict, respond};
use crate::policy::ensure_editable;

fn duplicate_coverage(policy: &WarrantyPolicy, category_id: PartCategoryId) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::DUPLICATE_COVERAGE,
        format!(
            "Warranty policy '{}' already covers category {category_id}",
            policy.name()
        ),
    )
}

fn policy_not_found(id: WarrantyPolicyId) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::POLICY_NOT_FOUND,
        format!("Warranty policy {id} not found"),
    )
}

fn category_not_found(id: PartCategoryId) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::CATEGORY_NOT_FOUND,
        format!("Part category {id} not found"),
    )
}

/// Rejection for a constraint a new entry violated at commit.
fn conflict(
    constraint: &str,
    policy: &WarrantyPolicy,
    coverage: &PolicyCoveragePart,
) -> Option<ServiceError> {
    match constraint {
        constraints::COVERAGE_POLICY_CATEGORY => {
            Some(duplicate_coverage(policy, coverage.category_id()))
        }
        constraints::COVERAGE_POLICY => Some(policy_not_found(coverage.policy_id())),
        constraints::COVERAGE_CATEGORY => Some(category_not_found(coverage.category_id())),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageDto {
    pub id: CoverageId,
    pub policy_id: WarrantyPolicyId,
    pub category_id: PartCategoryId,
    pub coverage_percent: u8,
    pub max_claim_amount_cents: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PolicyCoveragePart> for CoverageDto {
    fn from(coverage: &PolicyCoveragePart) -> Self {
        Self {
            id: coverage.id(),
            policy_id: coverage.policy_id(),
            category_id: coverage.category_id(),
            coverage_percent: coverage.coverage_percent(),
            max_claim_amount_cents: coverage.max_claim_amount().map(|m| m.cents()),
            notes: coverage.notes().map(str::to_string),
            created_at: coverage.created_at(),
            updated_at: coverage.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCoverageRequest {
    pub category_id: PartCategoryId,
    pub coverage_percent: i64,
    #[serde(default)]
    pub max_claim_amount_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCoverageRequest {
    pub coverage_percent: i64,
    #[serde(default)]
    pub max_claim_amount_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// What a policy pays towards one part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageQuoteDto {
    pub policy_id: WarrantyPolicyId,
    pub part_id: PartId,
    pub coverage_id: CoverageId,
    /// Category the matching entry is attached to: the part's own category
    /// or its nearest covered ancestor.
    pub category_id: PartCategoryId,
    pub coverage_percent: u8,
    pub price_cents: i64,
    pub covered_amount_cents: i64,
}

#[derive(Clone)]
pub struct PolicyCoverageService<S> {
    store: S,
}

impl<S: Store> PolicyCoverageService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds a coverage entry to a draft policy.
    #[tracing::instrument(skip(self, request))]
    pub async fn add(
        &self,
        policy_id: WarrantyPolicyId,
        request: AddCoverageRequest,
    ) -> ServiceResponse<CoverageDto> {
        let outcome: Result<CoverageDto> = async {
            let coverage = PolicyCoveragePart::new(
                policy_id,
                request.category_id,
                request.coverage_percent,
                request.max_claim_amount_cents.map(Money::from_cents),
                request.notes.as_deref(),
            )?;

            let work = self.store.begin();
            let policy = work
                .policies()
                .get_by_id(policy_id)
                .await?
                .ok_or_else(|| policy_not_found(policy_id))?;
            if !work.part_categories().exists(request.category_id).await? {
                return Err(category_not_found(request.category_id));
            }
            ensure_editable(&policy)?;
            if work
                .coverage()
                .find_by_policy_and_category(policy_id, request.category_id)
                .await?
                .is_some()
            {
                return Err(duplicate_coverage(&policy, request.category_id));
            }

            work.coverage().add(coverage.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &policy, &coverage)))?;
            Ok(CoverageDto::from(&coverage))
        }
        .await;
        respond("coverage.add", "Coverage added successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: CoverageId) -> ServiceResponse<CoverageDto> {
        let outcome: Result<CoverageDto> = async {
            let work = self.store.begin();
            Ok(CoverageDto::from(&load(&work, id).await?))
        }
        .await;
        respond("coverage.get", "Coverage retrieved successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_by_policy(
        &self,
        policy_id: WarrantyPolicyId,
    ) -> ServiceResponse<Vec<CoverageDto>> {
        let outcome: Result<Vec<CoverageDto>> = async {
            let work = self.store.begin();
            if !work.policies().exists(policy_id).await? {
                return Err(policy_not_found(policy_id));
            }
            let entries = work.coverage().list_by_policy(policy_id).await?;
            Ok(entries.iter().map(CoverageDto::from).collect())
        }
        .await;
        respond("coverage.list", "Coverage retrieved successfully", outcome)
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: CoverageId,
        request: UpdateCoverageRequest,
    ) -> ServiceResponse<CoverageDto> {
        let outcome: Result<CoverageDto> = async {
            let work = self.store.begin();
            let mut coverage = load(&work, id).await?;
            let policy = crate::policy::load(&work, coverage.policy_id()).await?;
            ensure_editable(&policy)?;

            coverage.change_terms(
                request.coverage_percent,
                request.max_claim_amount_cents.map(Money::from_cents),
                request.notes.as_deref(),
            )?;
            work.coverage().update(coverage.clone()).await?;
            work.commit().await?;
            Ok(CoverageDto::from(&coverage))
        }
        .await;
        respond("coverage.update", "Coverage updated successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, id: CoverageId) -> ServiceResponse<()> {
        let outcome: Result<()> = async {
            let work = self.store.begin();
            let coverage = load(&work, id).await?;
            let policy = crate::policy::load(&work, coverage.policy_id()).await?;
            ensure_editable(&policy)?;

            work.coverage().remove(id).await?;
            work.commit().await?;
            Ok(())
        }
        .await;
        respond("coverage.remove", "Coverage removed successfully", outcome)
    }

    /// Works out what `policy_id` pays towards `part_id`.
    ///
    /// The part's own category is tried first, then each ancestor in turn;
    /// the nearest entry wins.
    #[tracing::instrument(skip(self))]
    pub async fn coverage_for_part(
        &self,
        policy_id: WarrantyPolicyId,
        part_id: PartId,
    ) -> ServiceResponse<CoverageQuoteDto> {
        let outcome: Result<CoverageQuoteDto> = async {
            let work = self.store.begin();
            if !work.policies().exists(policy_id).await? {
                return Err(policy_not_found(policy_id));
            }
            let part = work.parts().get_by_id(part_id).await?.ok_or_else(|| {
                ServiceError::rejected(
                    ErrorCode::PART_NOT_FOUND,
                    format!("Part {part_id} not found"),
                )
            })?;

            let mut seen = HashSet::new();
            let mut cursor = Some(part.category_id());
            while let Some(category_id) = cursor
                && seen.insert(category_id)
            {
                if let Some(entry) = work
                    .coverage()
                    .find_by_policy_and_category(policy_id, category_id)
                    .await?
                {
                    return Ok(CoverageQuoteDto {
                        policy_id,
                        part_id,
                        coverage_id: entry.id(),
                        category_id,
                        coverage_percent: entry.coverage_percent(),
                        price_cents: part.price().cents(),
                        covered_amount_cents: entry.covered_amount(part.price()).cents(),
                    });
                }
                cursor = work
                    .part_categories()
                    .get_by_id(category_id)
                    .await?
                    .and_then(|c| c.parent_id());
            }

            Err(ServiceError::rejected(
                ErrorCode::COVERAGE_NOT_FOUND,
                format!(
                    "Warranty policy {policy_id} does not cover part {} or any parent category",
                    part.serial_number()
                ),
            ))
        }
        .await;
        respond(
            "coverage.for_part",
            "Coverage calculated successfully",
            outcome,
        )
    }
}

async fn load<W: UnitOfWork>(work: &W, id: CoverageId) -> Result<PolicyCoveragePart> {
    work.coverage()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(PolicyCoveragePart::NAME, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::{CreatePartRequest, PartService};
    use crate::part_category::{CreatePartCategoryRequest, PartCategoryService};
    use crate::policy::{WarrantyPolicyRequest, WarrantyPolicyService};
    use store::{MemoryStore, WriteKind};

    struct Fixture {
        store: MemoryStore,
        coverage: PolicyCoverageService<MemoryStore>,
        policies: WarrantyPolicyService<MemoryStore>,
        categories: PartCategoryService<MemoryStore>,
        policy: WarrantyPolicyId,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let policies = WarrantyPolicyService::new(store.clone());
        let policy = policies
            .create(WarrantyPolicyRequest {
                name: "Brakes 2y".to_string(),
                description: None,
                duration_months: 24,
                mileage_limit_km: None,
            })
            .await
            .into_data()
            .unwrap()
            .id;
        Fixture {
            coverage: PolicyCoverageService::new(store.clone()),
            categories: PartCategoryService::new(store.clone()),
            policies,
            store,
            policy,
        }
    }

    impl Fixture {
        async fn category(&self, name: &str, parent_id: Option<PartCategoryId>) -> PartCategoryId {
            self.categories
                .create(CreatePartCategoryRequest {
                    name: name.to_string(),
                    description: None,
                    parent_id,
                })
                .await
                .into_data()
                .unwrap()
                .id
        }
    }

    fn terms(category_id: PartCategoryId, percent: i64, cap: Option<i64>) -> AddCoverageRequest {
        AddCoverageRequest {
            category_id,
            coverage_percent: percent,
            max_claim_amount_cents: cap,
            notes: None,
        }
    }

    #[tokio::test]
    async fn add_checks_references_and_duplicates() {
        let f = fixture().await;
        let brakes = f.category("Brakes", None).await;

        assert!(f.coverage.add(f.policy, terms(brakes, 80, None)).await.is_success());
        let duplicate = f.coverage.add(f.policy, terms(brakes, 50, None)).await;
        assert_eq!(duplicate.error_code(), Some(ErrorCode::DUPLICATE_COVERAGE));
        assert_eq!(
            duplicate.message(),
            format!("Warranty policy 'Brakes 2y' already covers category {brakes}")
        );
        assert_eq!(
            f.coverage
                .add(WarrantyPolicyId::new(), terms(brakes, 50, None))
                .await
                .error_code(),
            Some(ErrorCode::POLICY_NOT_FOUND)
        );
        assert_eq!(
            f.coverage
                .add(f.policy, terms(PartCategoryId::new(), 50, None))
                .await
                .error_code(),
            Some(ErrorCode::CATEGORY_NOT_FOUND)
        );
        assert_eq!(
            f.store.write_calls::<PolicyCoveragePart>(WriteKind::Insert),
            1
        );
    }

    #[tokio::test]
    async fn coverage_is_frozen_once_policy_is_active() {
        let f = fixture().await;
        let brakes = f.category("Brakes", None).await;
        let entry = f
            .coverage
            .add(f.policy, terms(brakes, 80, None))
            .await
            .into_data()
            .unwrap();
        f.policies.change_status(f.policy, "Active").await;

        let update = f
            .coverage
            .update(
                entry.id,
                UpdateCoverageRequest {
                    coverage_percent: 90,
                    max_claim_amount_cents: None,
                    notes: None,
                },
            )
            .await;
        assert_eq!(update.error_code(), Some(ErrorCode::POLICY_NOT_EDITABLE));
        assert_eq!(
            f.coverage.remove(entry.id).await.error_code(),
            Some(ErrorCode::POLICY_NOT_EDITABLE)
        );
    }

    #[tokio::test]
    async fn policy_with_coverage_cannot_be_deleted() {
        let f = fixture().await;
        let brakes = f.category("Brakes", None).await;
        let entry = f
            .coverage
            .add(f.policy, terms(brakes, 80, None))
            .await
            .into_data()
            .unwrap();

        let blocked = f.policies.delete(f.policy).await;
        assert_eq!(blocked.error_code(), Some(ErrorCode::POLICY_HAS_COVERAGE));
        assert!(blocked.message().contains('1'));

        assert!(f.coverage.remove(entry.id).await.is_success());
        assert!(f.policies.delete(f.policy).await.is_success());
    }

    #[tokio::test]
    async fn coverage_for_part_uses_nearest_covered_ancestor() {
        let f = fixture().await;
        let brakes = f.category("Brakes", None).await;
        let pads = f.category("Pads", Some(brakes)).await;
        f.coverage
            .add(f.policy, terms(brakes, 50, Some(3_000)))
            .await;

        let part = PartService::new(f.store.clone())
            .create(CreatePartRequest {
                part_number: "BP-100".to_string(),
                name: "Brake pad".to_string(),
                serial_number: "SN-1".to_string(),
                category_id: pads,
                price_cents: 10_000,
            })
            .await
            .into_data()
            .unwrap();

        let quote = f
            .coverage
            .coverage_for_part(f.policy, part.id)
            .await
            .into_data()
            .unwrap();
        assert_eq!(quote.category_id, brakes);
        assert_eq!(quote.covered_amount_cents, 3_000);

        f.coverage.add(f.policy, terms(pads, 20, None)).await;
        let nearer = f
            .coverage
            .coverage_for_part(f.policy, part.id)
            .await
            .into_data()
            .unwrap();
        assert_eq!(nearer.category_id, pads);
        assert_eq!(nearer.covered_amount_cents, 2_000);
    }

    #[tokio::test]
    async fn coverage_for_part_at_the_price_ceiling() {
        let f = fixture().await;
        let engines = f.category("Engines", None).await;
        f.coverage.add(f.policy, terms(engines, 80, None)).await;
        let part = PartService::new(f.store.clone())
            .create(CreatePartRequest {
                part_number: "EN-1".to_string(),
                name: "Marine engine".to_string(),
                serial_number: "SN-MAX".to_string(),
                category_id: engines,
                price_cents: domain::MAX_AMOUNT_CENTS,
            })
            .await
            .into_data()
            .unwrap();

        let quote = f
            .coverage
            .coverage_for_part(f.policy, part.id)
            .await
            .into_data()
            .unwrap();
        assert_eq!(quote.price_cents, domain::MAX_AMOUNT_CENTS);
        assert_eq!(quote.covered_amount_cents, domain::MAX_AMOUNT_CENTS / 100 * 80);
    }

    #[tokio::test]
    async fn coverage_for_part_failures() {
        let f = fixture().await;
        let trim = f.category("Trim", None).await;
        let part = PartService::new(f.store.clone())
            .create(CreatePartRequest {
                part_number: "TR-1".to_string(),
                name: "Door trim".to_string(),
                serial_number: "SN-9".to_string(),
                category_id: trim,
                price_cents: 2_000,
            })
            .await
            .into_data()
            .unwrap();

        let uncovered = f.coverage.coverage_for_part(f.policy, part.id).await;
        assert_eq!(uncovered.error_code(), Some(ErrorCode::COVERAGE_NOT_FOUND));
        assert!(uncovered.message().contains("SN-9"));

        let unknown = PartId::new();
        let missing = f.coverage.coverage_for_part(f.policy, unknown).await;
        assert_eq!(missing.error_code(), Some(ErrorCode::PART_NOT_FOUND));
        assert_eq!(missing.message(), format!("Part {unknown} not found"));
    }
}
