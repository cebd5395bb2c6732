//! Vehicle model catalog service.

use chrono::{DateTime, Utc};
use common::{ErrorCode, ServiceResponse, VehicleModelId};
use domain::{Entity, VehicleModel};
use serde::{Deserialize, Serialize};
use store::constraints;
use store::{Repository, Store, UnitOfWork, VehicleModelRepository};

use crate::error::{Result, ServiceError, is_still_referenced, on_conflict, respond};

fn duplicate_model(model: &VehicleModel) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::DUPLICATE_VEHICLE_MODEL,
        format!("Vehicle model '{}' already exists", model.label()),
    )
}

fn model_in_use(vehicles: u64) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::MODEL_IN_USE,
        format!("Vehicle model is used by {vehicles} vehicle(s) and cannot be deleted"),
    )
}

fn conflict(constraint: &str, model: &VehicleModel) -> Option<ServiceError> {
    (constraint == constraints::VEHICLE_MODELS_IDENTITY).then(|| duplicate_model(model))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleModelDto {
    pub id: VehicleModelId,
    pub brand: String,
    pub model_name: String,
    pub year: i32,
    pub label: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&VehicleModel> for VehicleModelDto {
    fn from(model: &VehicleModel) -> Self {
        Self {
            id: model.id(),
            brand: model.brand().to_string(),
            model_name: model.model_name().to_string(),
            year: model.year(),
            label: model.label(),
            description: model.description().map(str::to_string),
            created_at: model.created_at(),
            updated_at: model.updated_at(),
        }
    }
}

/// Fields for creating or replacing a vehicle model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleModelRequest {
    pub brand: String,
    pub model_name: String,
    pub year: i32,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct VehicleModelService<S> {
    store: S,
}

impl<S: Store> VehicleModelService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, request: VehicleModelRequest) -> ServiceResponse<VehicleModelDto> {
        let outcome: Result<VehicleModelDto> = async {
            let model = VehicleModel::new(
                &request.brand,
                &request.model_name,
                request.year,
                request.description.as_deref(),
            )?;

            let work = self.store.begin();
            ensure_unique(&work, &model).await?;
            work.vehicle_models().add(model.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &model)))?;
            Ok(VehicleModelDto::from(&model))
        }
        .await;
        respond(
            "vehicle_model.create",
            "Vehicle model created successfully",
            outcome,
        )
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: VehicleModelId) -> ServiceResponse<VehicleModelDto> {
        let outcome: Result<VehicleModelDto> = async {
            let work = self.store.begin();
            let model = load(&work, id).await?;
            Ok(VehicleModelDto::from(&model))
        }
        .await;
        respond(
            "vehicle_model.get",
            "Vehicle model retrieved successfully",
            outcome,
        )
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> ServiceResponse<Vec<VehicleModelDto>> {
        let outcome: Result<Vec<VehicleModelDto>> = async {
            let work = self.store.begin();
            let models = work.vehicle_models().list().await?;
            Ok(models.iter().map(VehicleModelDto::from).collect())
        }
        .await;
        respond(
            "vehicle_model.list",
            "Vehicle models retrieved successfully",
            outcome,
        )
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: VehicleModelId,
        request: VehicleModelRequest,
    ) -> ServiceResponse<VehicleModelDto> {
        let outcome: Result<VehicleModelDto> = async {
            let work = self.store.begin();
            let mut model = load(&work, id).await?;
            model.change_identity(&request.brand, &request.model_name, request.year)?;
            model.change_description(request.description.as_deref())?;

            ensure_unique(&work, &model).await?;
            work.vehicle_models().update(model.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &model)))?;
            Ok(VehicleModelDto::from(&model))
        }
        .await;
        respond(
            "vehicle_model.update",
            "Vehicle model updated successfully",
            outcome,
        )
    }

    /// Removes the model. Refused while any vehicle, soft-deleted or not,
    /// still refers to it.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: VehicleModelId) -> ServiceResponse<()> {
        let outcome: Result<()> = async {
            let work = self.store.begin();
            load(&work, id).await?;

            let in_use = work.vehicle_models().count_vehicles(id).await?;
            if in_use > 0 {
                return Err(model_in_use(in_use));
            }

            work.vehicle_models().remove(id).await?;
            match work.commit().await {
                Ok(()) => Ok(()),
                Err(err) if is_still_referenced(&err) => {
                    let in_use = self.store.begin().vehicle_models().count_vehicles(id).await?;
                    Err(model_in_use(in_use))
                }
                Err(err) => Err(err.into()),
            }
        }
        .await;
        respond(
            "vehicle_model.delete",
            "Vehicle model deleted successfully",
            outcome,
        )
    }
}

async fn load<W: UnitOfWork>(work: &W, id: VehicleModelId) -> Result<VehicleModel> {
    work.vehicle_models()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(VehicleModel::NAME, id))
}

async fn ensure_unique<W: UnitOfWork>(work: &W, model: &VehicleModel) -> Result<()> {
    let existing = work
        .vehicle_models()
        .find_by_identity(model.brand(), model.model_name(), model.year())
        .await?;
    match existing {
        Some(other) if other.id() != model.id() => Err(duplicate_model(model)),
        _ => Ok(()),
    }
}
