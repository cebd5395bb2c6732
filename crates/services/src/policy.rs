//! Warranty policy service.

use chrono::{DateTime, Utc};
use common::{ErrorCode, ServiceResponse, WarrantyPolicyId};
use domain::{Entity, PolicyStatus, StatusSet, WarrantyPolicy};
use serde::{Deserialize, Serialize};
use store::constraints;
use store::{CoverageRepository, Repository, Store, UnitOfWork, WarrantyPolicyRepository};

use crate::error::{
    Result, ServiceError, is_still_referenced, on_conflict, parse_status, respond,
};

fn duplicate_name(name: &str) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::DUPLICATE_POLICY_NAME,
        format!("A warranty policy named '{name}' already exists"),
    )
}

fn has_coverage(entries: u64) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::POLICY_HAS_COVERAGE,
        format!("Warranty policy has {entries} coverage entries and cannot be deleted"),
    )
}

fn conflict(constraint: &str, policy: &WarrantyPolicy) -> Option<ServiceError> {
    (constraint == constraints::WARRANTY_POLICIES_NAME).then(|| duplicate_name(policy.name()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarrantyPolicyDto {
    pub id: WarrantyPolicyId,
    pub name: String,
    pub description: Option<String>,
    pub duration_months: i32,
    pub mileage_limit_km: Option<i64>,
    pub status: PolicyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&WarrantyPolicy> for WarrantyPolicyDto {
    fn from(policy: &WarrantyPolicy) -> Self {
        Self {
            id: policy.id(),
            name: policy.name().to_string(),
            description: policy.description().map(str::to_string),
            duration_months: policy.duration_months(),
            mileage_limit_km: policy.mileage_limit_km(),
            status: policy.status(),
            created_at: policy.created_at(),
            updated_at: policy.updated_at(),
        }
    }
}

/// Policy terms, used for both create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarrantyPolicyRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration_months: i32,
    #[serde(default)]
    pub mileage_limit_km: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyFilter {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone)]
pub struct WarrantyPolicyService<S> {
    store: S,
}

impl<S: Store> WarrantyPolicyService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(
        &self,
        request: WarrantyPolicyRequest,
    ) -> ServiceResponse<WarrantyPolicyDto> {
        let outcome: Result<WarrantyPolicyDto> = async {
            let policy = WarrantyPolicy::new(
                &request.name,
                request.description.as_deref(),
                request.duration_months,
                request.mileage_limit_km,
            )?;

            let work = self.store.begin();
            ensure_unique_name(&work, &policy).await?;
            work.policies().add(policy.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &policy)))?;
            Ok(WarrantyPolicyDto::from(&policy))
        }
        .await;
        respond("policy.create", "Warranty policy created successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: WarrantyPolicyId) -> ServiceResponse<WarrantyPolicyDto> {
        let outcome: Result<WarrantyPolicyDto> = async {
            let work = self.store.begin();
            Ok(WarrantyPolicyDto::from(&load(&work, id).await?))
        }
        .await;
        respond("policy.get", "Warranty policy retrieved successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, filter: PolicyFilter) -> ServiceResponse<Vec<WarrantyPolicyDto>> {
        let outcome: Result<Vec<WarrantyPolicyDto>> = async {
            let status = match filter.status.as_deref() {
                Some(value) => Some(parse_status::<PolicyStatus>(value)?),
                None => None,
            };
            let work = self.store.begin();
            let policies = match status {
                Some(status) => work.policies().list_by_status(status).await?,
                None => work.policies().list().await?,
            };
            Ok(policies.iter().map(WarrantyPolicyDto::from).collect())
        }
        .await;
        respond("policy.list", "Warranty policies retrieved successfully", outcome)
    }

    /// Replaces the terms of a draft policy.
    #[tracing::instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: WarrantyPolicyId,
        request: WarrantyPolicyRequest,
    ) -> ServiceResponse<WarrantyPolicyDto> {
        let outcome: Result<WarrantyPolicyDto> = async {
            let work = self.store.begin();
            let mut policy = load(&work, id).await?;
            ensure_editable(&policy)?;

            policy.update_terms(
                &request.name,
                request.description.as_deref(),
                request.duration_months,
                request.mileage_limit_km,
            )?;
            ensure_unique_name(&work, &policy).await?;

            work.policies().update(policy.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &policy)))?;
            Ok(WarrantyPolicyDto::from(&policy))
        }
        .await;
        respond("policy.update", "Warranty policy updated successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn change_status(
        &self,
        id: WarrantyPolicyId,
        status: &str,
    ) -> ServiceResponse<WarrantyPolicyDto> {
        let outcome: Result<WarrantyPolicyDto> = async {
            let status = parse_status::<PolicyStatus>(status)?;

            let work = self.store.begin();
            let mut policy = load(&work, id).await?;
            let previous = policy.status();
            policy.change_status(status);

            work.policies().update(policy.clone()).await?;
            work.commit().await?;
            tracing::info!(
                policy_id = %id,
                from = previous.as_str(),
                to = status.as_str(),
                "policy status changed"
            );
            Ok(WarrantyPolicyDto::from(&policy))
        }
        .await;
        respond(
            "policy.change_status",
            "Warranty policy status updated successfully",
            outcome,
        )
    }

    /// Removes a policy that has no coverage entries left.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: WarrantyPolicyId) -> ServiceResponse<()> {
        let outcome: Result<()> = async {
            let work = self.store.begin();
            load(&work, id).await?;

            let entries = work.coverage().count_by_policy(id).await?;
            if entries > 0 {
                return Err(has_coverage(entries));
            }

            work.policies().remove(id).await?;
            match work.commit().await {
                Ok(()) => Ok(()),
                Err(err) if is_still_referenced(&err) => {
                    let entries = self.store.begin().coverage().count_by_policy(id).await?;
                    Err(has_coverage(entries))
                }
                Err(err) => Err(err.into()),
            }
        }
        .await;
        respond("policy.delete", "Warranty policy deleted successfully", outcome)
    }
}

pub(crate) async fn load<W: UnitOfWork>(
    work: &W,
    id: WarrantyPolicyId,
) -> Result<WarrantyPolicy> {
    work.policies()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(WarrantyPolicy::NAME, id))
}

pub(crate) fn ensure_editable(policy: &WarrantyPolicy) -> Result<()> {
    if policy.is_editable() {
        Ok(())
    } else {
        Err(ServiceError::rejected(
            ErrorCode::POLICY_NOT_EDITABLE,
            format!(
                "Warranty policy '{}' is {} and can no longer be edited",
                policy.name(),
                policy.status()
            ),
        ))
    }
}

async fn ensure_unique_name<W: UnitOfWork>(work: &W, policy: &WarrantyPolicy) -> Result<()> {
    match work.policies().find_by_name(policy.name()).await? {
        Some(other) if other.id() != policy.id() => Err(duplicate_name(policy.name())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{MemoryStore, WriteKind};

    fn powertrain() -> WarrantyPolicyRequest {
        WarrantyPolicyRequest {
            name: "Powertrain 5y".to_string(),
            description: Some("Engine and transmission".to_string()),
            duration_months: 60,
            mileage_limit_km: Some(100_000),
        }
    }

    #[tokio::test]
    async fn new_policy_starts_as_draft() {
        let store = MemoryStore::new();
        let service = WarrantyPolicyService::new(store.clone());
        let policy = service.create(powertrain()).await.into_data().unwrap();
        assert_eq!(policy.status, PolicyStatus::Draft);

        let duplicate = service.create(powertrain()).await;
        assert_eq!(duplicate.error_code(), Some(ErrorCode::DUPLICATE_POLICY_NAME));
        assert_eq!(store.write_calls::<WarrantyPolicy>(WriteKind::Insert), 1);
    }

    #[tokio::test]
    async fn active_policy_is_not_editable() {
        let store = MemoryStore::new();
        let service = WarrantyPolicyService::new(store.clone());
        let policy = service.create(powertrain()).await.into_data().unwrap();
        service.change_status(policy.id, "active").await;

        let mut request = powertrain();
        request.duration_months = 72;
        let response = service.update(policy.id, request).await;
        assert_eq!(response.error_code(), Some(ErrorCode::POLICY_NOT_EDITABLE));
        assert!(response.message().contains("Active"));
    }

    #[tokio::test]
    async fn unknown_status_is_rejected_without_update() {
        let store = MemoryStore::new();
        let service = WarrantyPolicyService::new(store.clone());
        let policy = service.create(powertrain()).await.into_data().unwrap();

        let response = service.change_status(policy.id, "Suspended").await;
        assert_eq!(response.error_code(), Some(ErrorCode::INVALID_STATUS));
        assert!(response.message().contains("Draft, Active, Archived"));
        assert_eq!(store.write_calls::<WarrantyPolicy>(WriteKind::Update), 0);
    }

    #[tokio::test]
    async fn duplicate_name_message_names_the_policy() {
        let service = WarrantyPolicyService::new(MemoryStore::new());
        service.create(powertrain()).await;
        let response = service.create(powertrain()).await;
        assert_eq!(
            response.message(),
            "A warranty policy named 'Powertrain 5y' already exists"
        );

        let id = WarrantyPolicyId::new();
        let missing = service.get_by_id(id).await;
        assert_eq!(missing.message(), format!("Warranty policy {id} not found"));
    }

    #[tokio::test]
    async fn list_by_status() {
        let service = WarrantyPolicyService::new(MemoryStore::new());
        let first = service.create(powertrain()).await.into_data().unwrap();
        let mut corrosion = powertrain();
        corrosion.name = "Corrosion 10y".to_string();
        service.create(corrosion).await;
        service.change_status(first.id, "Archived").await;

        let archived = service
            .list(PolicyFilter {
                status: Some("archived".to_string()),
            })
            .await
            .into_data()
            .unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].id, first.id);

        let all = service.list(PolicyFilter::default()).await.into_data().unwrap();
        assert_eq!(all.len(), 2);
    }
}
