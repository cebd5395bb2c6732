//! Serialized parts inventory service.

use chrono::{DateTime, Utc};
use common::{ErrorCode, Money, PartCategoryId, PartId, ServiceResponse};
use domain::part::normalize_serial;
use domain::{Entity, Part, PartStatus, StatusSet};
use serde::{Deserialize, Serialize};
use store::constraints;
use store::{PartRepository, Repository, Store, UnitOfWork};

use crate::error::{Result, ServiceError, on_conflict, parse_status, respond};

fn duplicate_serial(serial_number: &str) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::DUPLICATE_SERIAL_NUMBER,
        format!("A part with serial number '{serial_number}' already exists"),
    )
}

fn category_not_found(id: PartCategoryId) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::CATEGORY_NOT_FOUND,
        format!("Part category {id} not found"),
    )
}

/// Rejection for a constraint the part row violated at commit.
fn conflict(constraint: &str, part: &Part) -> Option<ServiceError> {
    match constraint {
        constraints::PARTS_SERIAL_NUMBER => Some(duplicate_serial(part.serial_number())),
        constraints::PARTS_CATEGORY => Some(category_not_found(part.category_id())),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartDto {
    pub id: PartId,
    pub part_number: String,
    pub name: String,
    pub serial_number: String,
    pub category_id: PartCategoryId,
    pub price_cents: i64,
    pub status: PartStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Part> for PartDto {
    fn from(part: &Part) -> Self {
        Self {
            id: part.id(),
            part_number: part.part_number().to_string(),
            name: part.name().to_string(),
            serial_number: part.serial_number().to_string(),
            category_id: part.category_id(),
            price_cents: part.price().cents(),
            status: part.status(),
            created_at: part.created_at(),
            updated_at: part.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePartRequest {
    pub part_number: String,
    pub name: String,
    pub serial_number: String,
    pub category_id: PartCategoryId,
    pub price_cents: i64,
}

/// Catalog fields of a part. Serial number and status are not edited here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePartRequest {
    pub part_number: String,
    pub name: String,
    pub category_id: PartCategoryId,
    pub price_cents: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartFilter {
    #[serde(default)]
    pub category_id: Option<PartCategoryId>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone)]
pub struct PartService<S> {
    store: S,
}

impl<S: Store> PartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, request: CreatePartRequest) -> ServiceResponse<PartDto> {
        let outcome: Result<PartDto> = async {
            let part = Part::new(
                &request.part_number,
                &request.name,
                &request.serial_number,
                request.category_id,
                Money::from_cents(request.price_cents),
            )?;

            let work = self.store.begin();
            if work.parts().find_by_serial(part.serial_number()).await?.is_some() {
                return Err(duplicate_serial(part.serial_number()));
            }
            ensure_usable_category(&work, part.category_id()).await?;

            work.parts().add(part.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &part)))?;
            tracing::info!(
                part_id = %part.id(),
                serial = part.serial_number(),
                "part registered"
            );
            Ok(PartDto::from(&part))
        }
        .await;
        respond("part.create", "Part created successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: PartId) -> ServiceResponse<PartDto> {
        let outcome: Result<PartDto> = async {
            let work = self.store.begin();
            Ok(PartDto::from(&load(&work, id).await?))
        }
        .await;
        respond("part.get", "Part retrieved successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_serial(&self, serial_number: &str) -> ServiceResponse<PartDto> {
        let outcome: Result<PartDto> = async {
            let serial_number = normalize_serial(serial_number)?;
            let work = self.store.begin();
            let part = work
                .parts()
                .find_by_serial(&serial_number)
                .await?
                .ok_or_else(|| ServiceError::not_found(Part::NAME, &serial_number))?;
            Ok(PartDto::from(&part))
        }
        .await;
        respond("part.get_by_serial", "Part retrieved successfully", outcome)
    }

    /// Lists parts, optionally narrowed to one category and one status.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, filter: PartFilter) -> ServiceResponse<Vec<PartDto>> {
        let outcome: Result<Vec<PartDto>> = async {
            let status = match filter.status.as_deref() {
                Some(value) => Some(parse_status::<PartStatus>(value)?),
                None => None,
            };

            let work = self.store.begin();
            let parts = match filter.category_id {
                Some(category_id) => work.parts().list_by_category(category_id).await?,
                None => work.parts().list().await?,
            };
            Ok(parts
                .iter()
                .filter(|p| status.is_none_or(|s| p.status() == s))
                .map(PartDto::from)
                .collect())
        }
        .await;
        respond("part.list", "Parts retrieved successfully", outcome)
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: PartId,
        request: UpdatePartRequest,
    ) -> ServiceResponse<PartDto> {
        let outcome: Result<PartDto> = async {
            let work = self.store.begin();
            let mut part = load(&work, id).await?;

            part.change_part_number(&request.part_number)?;
            part.rename(&request.name)?;
            part.change_price(Money::from_cents(request.price_cents))?;
            if request.category_id != part.category_id() {
                ensure_usable_category(&work, request.category_id).await?;
                part.change_category(request.category_id);
            }

            work.parts().update(part.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &part)))?;
            Ok(PartDto::from(&part))
        }
        .await;
        respond("part.update", "Part updated successfully", outcome)
    }

    /// Sets the part status. The name is matched without regard to case;
    /// an unknown name leaves the part untouched.
    #[tracing::instrument(skip(self))]
    pub async fn change_status(&self, id: PartId, status: &str) -> ServiceResponse<PartDto> {
        let outcome: Result<PartDto> = async {
            let status = parse_status::<PartStatus>(status)?;

            let work = self.store.begin();
            let mut part = load(&work, id).await?;
            let previous = part.status();
            part.change_status(status)?;

            work.parts().update(part.clone()).await?;
            work.commit().await?;
            tracing::info!(
                part_id = %id,
                from = previous.as_str(),
                to = status.as_str(),
                "part status changed"
            );
            Ok(PartDto::from(&part))
        }
        .await;
        respond("part.change_status", "Part status updated successfully", outcome)
    }

    /// Removes a part that is not installed on a vehicle.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: PartId) -> ServiceResponse<()> {
        let outcome: Result<()> = async {
            let work = self.store.begin();
            let part = load(&work, id).await?;
            if part.status() == PartStatus::Installed {
                return Err(ServiceError::rejected(
                    ErrorCode::PART_IN_USE,
                    format!(
                        "Part {} is installed and cannot be deleted",
                        part.serial_number()
                    ),
                ));
            }

            work.parts().remove(id).await?;
            work.commit().await?;
            Ok(())
        }
        .await;
        respond("part.delete", "Part deleted successfully", outcome)
    }
}

async fn load<W: UnitOfWork>(work: &W, id: PartId) -> Result<Part> {
    work.parts()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(Part::NAME, id))
}

/// New parts may only be filed under an existing, active category.
async fn ensure_usable_category<W: UnitOfWork>(work: &W, id: PartCategoryId) -> Result<()> {
    match work.part_categories().get_by_id(id).await? {
        None => Err(category_not_found(id)),
        Some(category) if !category.is_active() => Err(ServiceError::rejected(
            ErrorCode::CATEGORY_INACTIVE,
            format!("Part category '{}' is inactive", category.name()),
        )),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part_category::{
        CreatePartCategoryRequest, PartCategoryService, UpdatePartCategoryRequest,
    };
    use store::{MemoryStore, WriteKind};

    async fn category(store: &MemoryStore, name: &str) -> PartCategoryId {
        PartCategoryService::new(store.clone())
            .create(CreatePartCategoryRequest {
                name: name.to_string(),
                description: None,
                parent_id: None,
            })
            .await
            .into_data()
            .unwrap()
            .id
    }

    fn brake_pad(category_id: PartCategoryId, serial: &str) -> CreatePartRequest {
        CreatePartRequest {
            part_number: "BP-100".to_string(),
            name: "Brake pad".to_string(),
            serial_number: serial.to_string(),
            category_id,
            price_cents: 4_500,
        }
    }

    #[tokio::test]
    async fn create_requires_active_category() {
        let store = MemoryStore::new();
        let service = PartService::new(store.clone());
        let brakes = category(&store, "Brakes").await;

        PartCategoryService::new(store.clone())
            .update(
                brakes,
                UpdatePartCategoryRequest {
                    name: "Brakes".to_string(),
                    description: None,
                    parent_id: None,
                    is_active: false,
                },
            )
            .await;

        let inactive = service.create(brake_pad(brakes, "SN-1")).await;
        assert_eq!(inactive.error_code(), Some(ErrorCode::CATEGORY_INACTIVE));

        let missing = service.create(brake_pad(PartCategoryId::new(), "SN-1")).await;
        assert_eq!(missing.error_code(), Some(ErrorCode::CATEGORY_NOT_FOUND));
        assert_eq!(store.write_calls::<Part>(WriteKind::Insert), 0);
    }

    #[tokio::test]
    async fn negative_price_is_a_guard_failure() {
        let store = MemoryStore::new();
        let service = PartService::new(store.clone());
        let brakes = category(&store, "Brakes").await;

        let mut request = brake_pad(brakes, "SN-1");
        request.price_cents = -1;
        let response = service.create(request).await;
        assert_eq!(response.error_code(), Some(ErrorCode::new("VALUE_OUT_OF_RANGE")));
    }

    #[tokio::test]
    async fn price_above_the_ceiling_is_a_guard_failure() {
        let store = MemoryStore::new();
        let service = PartService::new(store.clone());
        let brakes = category(&store, "Brakes").await;

        let mut request = brake_pad(brakes, "SN-1");
        request.price_cents = i64::MAX / 2;
        let response = service.create(request).await;
        assert_eq!(response.error_code(), Some(ErrorCode::new("VALUE_OUT_OF_RANGE")));
        assert_eq!(store.write_calls::<Part>(WriteKind::Insert), 0);
    }

    #[tokio::test]
    async fn unknown_serial_message_names_the_serial() {
        let service = PartService::new(MemoryStore::new());
        let response = service.get_by_serial(" SN-404 ").await;
        assert_eq!(response.error_code(), Some(ErrorCode::NOT_FOUND));
        assert_eq!(response.message(), "Part SN-404 not found");

        let brakes = PartCategoryId::new();
        let response = service.create(brake_pad(brakes, "SN-1")).await;
        assert_eq!(
            response.message(),
            format!("Part category {brakes} not found")
        );
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let store = MemoryStore::new();
        let service = PartService::new(store.clone());
        let brakes = category(&store, "Brakes").await;
        let first = service.create(brake_pad(brakes, "SN-1")).await.into_data().unwrap();
        service.create(brake_pad(brakes, "SN-2")).await;
        service.change_status(first.id, "Defective").await;

        let defective = service
            .list(PartFilter {
                category_id: Some(brakes),
                status: Some("defective".to_string()),
            })
            .await
            .into_data()
            .unwrap();
        assert_eq!(defective.len(), 1);
        assert_eq!(defective[0].serial_number, "SN-1");

        let bad = service
            .list(PartFilter {
                category_id: None,
                status: Some("Lost".to_string()),
            })
            .await;
        assert_eq!(bad.error_code(), Some(ErrorCode::INVALID_STATUS));
    }

    #[tokio::test]
    async fn retired_part_stays_retired() {
        let store = MemoryStore::new();
        let service = PartService::new(store.clone());
        let brakes = category(&store, "Brakes").await;
        let part = service.create(brake_pad(brakes, "SN-1")).await.into_data().unwrap();

        assert!(service.change_status(part.id, "Retired").await.is_success());
        let response = service.change_status(part.id, "Available").await;
        assert_eq!(response.error_code(), Some(ErrorCode::new("PART_RETIRED")));
    }

    #[tokio::test]
    async fn update_moves_part_between_categories() {
        let store = MemoryStore::new();
        let service = PartService::new(store.clone());
        let brakes = category(&store, "Brakes").await;
        let rotors = category(&store, "Rotors").await;
        let part = service.create(brake_pad(brakes, "SN-1")).await.into_data().unwrap();

        let updated = service
            .update(
                part.id,
                UpdatePartRequest {
                    part_number: "RT-200".to_string(),
                    name: "Front rotor".to_string(),
                    category_id: rotors,
                    price_cents: 12_000,
                },
            )
            .await
            .into_data()
            .unwrap();
        assert_eq!(updated.category_id, rotors);
        assert_eq!(updated.price_cents, 12_000);
        assert_eq!(updated.serial_number, "SN-1");

        let fetched = service.get_by_serial(" SN-1 ").await;
        assert_eq!(fetched.data().unwrap().name, "Front rotor");
    }
}
