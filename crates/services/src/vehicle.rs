//! Vehicle registry service.

use chrono::{DateTime, NaiveDate, Utc};
use common::{CustomerId, ErrorCode, ServiceResponse, VehicleId, VehicleModelId};
use domain::{Customer, Entity, Vehicle};
use serde::{Deserialize, Serialize};
use store::constraints;
use store::{Repository, Store, UnitOfWork, VehicleRepository};

use crate::error::{Result, ServiceError, on_conflict, respond};

fn duplicate_vin(vin: &str) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::DUPLICATE_VIN,
        format!("A vehicle with VIN '{vin}' already exists"),
    )
}

/// Rejection for a constraint the vehicle row violated at commit.
fn conflict(constraint: &str, vehicle: &Vehicle) -> Option<ServiceError> {
    match constraint {
        constraints::VEHICLES_VIN => Some(duplicate_vin(vehicle.vin())),
        constraints::VEHICLES_CUSTOMER => Some(customer_not_found(vehicle.customer_id())),
        constraints::VEHICLES_MODEL => Some(model_not_found(vehicle.model_id())),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDto {
    pub id: VehicleId,
    pub vin: String,
    pub license_plate: Option<String>,
    pub customer_id: CustomerId,
    pub model_id: VehicleModelId,
    pub purchase_date: Option<NaiveDate>,
    pub mileage_km: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&Vehicle> for VehicleDto {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id(),
            vin: vehicle.vin().to_string(),
            license_plate: vehicle.license_plate().map(str::to_string),
            customer_id: vehicle.customer_id(),
            model_id: vehicle.model_id(),
            purchase_date: vehicle.purchase_date(),
            mileage_km: vehicle.mileage_km(),
            is_deleted: vehicle.is_deleted(),
            created_at: vehicle.created_at(),
            updated_at: vehicle.updated_at(),
            deleted_at: vehicle.deleted_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVehicleRequest {
    pub vin: String,
    pub customer_id: CustomerId,
    pub model_id: VehicleModelId,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub mileage_km: i64,
}

/// Editable vehicle details. The VIN and owner are fixed; ownership moves
/// through [`VehicleService::transfer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateVehicleRequest {
    pub model_id: VehicleModelId,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    pub mileage_km: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VehicleFilter {
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Clone)]
pub struct VehicleService<S> {
    store: S,
}

impl<S: Store> VehicleService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, request: CreateVehicleRequest) -> ServiceResponse<VehicleDto> {
        let outcome: Result<VehicleDto> = async {
            let vehicle = Vehicle::new(
                &request.vin,
                request.customer_id,
                request.model_id,
                request.license_plate.as_deref(),
                request.purchase_date,
                request.mileage_km,
            )?;

            let work = self.store.begin();
            active_owner(&work, request.customer_id).await?;
            ensure_model(&work, request.model_id).await?;
            if work.vehicles().find_by_vin(vehicle.vin()).await?.is_some() {
                return Err(duplicate_vin(vehicle.vin()));
            }

            work.vehicles().add(vehicle.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &vehicle)))?;
            tracing::info!(
                vehicle_id = %vehicle.id(),
                vin = vehicle.vin(),
                "vehicle registered"
            );
            Ok(VehicleDto::from(&vehicle))
        }
        .await;
        respond("vehicle.create", "Vehicle created successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: VehicleId) -> ServiceResponse<VehicleDto> {
        let outcome: Result<VehicleDto> = async {
            let work = self.store.begin();
            Ok(VehicleDto::from(&load(&work, id).await?))
        }
        .await;
        respond("vehicle.get", "Vehicle retrieved successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_vin(&self, vin: &str) -> ServiceResponse<VehicleDto> {
        let outcome: Result<VehicleDto> = async {
            let vin = vin.trim().to_uppercase();
            let work = self.store.begin();
            let vehicle = work
                .vehicles()
                .find_by_vin(&vin)
                .await?
                .ok_or_else(|| ServiceError::not_found(Vehicle::NAME, &vin))?;
            Ok(VehicleDto::from(&vehicle))
        }
        .await;
        respond("vehicle.get_by_vin", "Vehicle retrieved successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, filter: VehicleFilter) -> ServiceResponse<Vec<VehicleDto>> {
        let outcome: Result<Vec<VehicleDto>> = async {
            let work = self.store.begin();
            let vehicles = work.vehicles().list().await?;
            Ok(vehicles
                .iter()
                .filter(|v| filter.include_deleted || !v.is_deleted())
                .map(VehicleDto::from)
                .collect())
        }
        .await;
        respond("vehicle.list", "Vehicles retrieved successfully", outcome)
    }

    /// Vehicles of one customer that are not deleted.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> ServiceResponse<Vec<VehicleDto>> {
        let outcome: Result<Vec<VehicleDto>> = async {
            let work = self.store.begin();
            if !work.customers().exists(customer_id).await? {
                return Err(customer_not_found(customer_id));
            }
            let vehicles = work.vehicles().list_by_customer(customer_id).await?;
            Ok(vehicles.iter().map(VehicleDto::from).collect())
        }
        .await;
        respond(
            "vehicle.list_by_customer",
            "Vehicles retrieved successfully",
            outcome,
        )
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: VehicleId,
        request: UpdateVehicleRequest,
    ) -> ServiceResponse<VehicleDto> {
        let outcome: Result<VehicleDto> = async {
            let work = self.store.begin();
            let mut vehicle = load(&work, id).await?;

            if request.model_id != vehicle.model_id() {
                ensure_model(&work, request.model_id).await?;
                vehicle.change_model(request.model_id);
            }
            vehicle.change_license_plate(request.license_plate.as_deref())?;
            vehicle.change_purchase_date(request.purchase_date);
            vehicle.record_mileage(request.mileage_km)?;

            work.vehicles().update(vehicle.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &vehicle)))?;
            Ok(VehicleDto::from(&vehicle))
        }
        .await;
        respond("vehicle.update", "Vehicle updated successfully", outcome)
    }

    /// Moves the vehicle to another customer who is not deleted.
    #[tracing::instrument(skip(self))]
    pub async fn transfer(
        &self,
        id: VehicleId,
        new_customer_id: CustomerId,
    ) -> ServiceResponse<VehicleDto> {
        let outcome: Result<VehicleDto> = async {
            let work = self.store.begin();
            let mut vehicle = load(&work, id).await?;
            active_owner(&work, new_customer_id).await?;

            let previous = vehicle.customer_id();
            vehicle.transfer_to(new_customer_id);
            work.vehicles().update(vehicle.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &vehicle)))?;
            tracing::info!(
                vehicle_id = %id,
                from = %previous,
                to = %new_customer_id,
                "vehicle transferred"
            );
            Ok(VehicleDto::from(&vehicle))
        }
        .await;
        respond("vehicle.transfer", "Vehicle transferred successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn soft_delete(&self, id: VehicleId) -> ServiceResponse<VehicleDto> {
        let outcome: Result<VehicleDto> = async {
            let work = self.store.begin();
            let mut vehicle = load(&work, id).await?;
            vehicle.soft_delete()?;
            work.vehicles().update(vehicle.clone()).await?;
            work.commit().await?;
            Ok(VehicleDto::from(&vehicle))
        }
        .await;
        respond("vehicle.delete", "Vehicle deleted successfully", outcome)
    }

    /// Restores a deleted vehicle. Its owner must not be deleted.
    #[tracing::instrument(skip(self))]
    pub async fn restore(&self, id: VehicleId) -> ServiceResponse<VehicleDto> {
        let outcome: Result<VehicleDto> = async {
            let work = self.store.begin();
            let mut vehicle = load(&work, id).await?;
            vehicle.restore()?;
            active_owner(&work, vehicle.customer_id()).await?;
            work.vehicles().update(vehicle.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &vehicle)))?;
            Ok(VehicleDto::from(&vehicle))
        }
        .await;
        respond("vehicle.restore", "Vehicle restored successfully", outcome)
    }
}

async fn load<W: UnitOfWork>(work: &W, id: VehicleId) -> Result<Vehicle> {
    work.vehicles()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(Vehicle::NAME, id))
}

fn customer_not_found(id: CustomerId) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::CUSTOMER_NOT_FOUND,
        format!("{} {id} not found", Customer::NAME),
    )
}

fn model_not_found(id: VehicleModelId) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::MODEL_NOT_FOUND,
        format!("Vehicle model {id} not found"),
    )
}

/// Loads a customer that can own vehicles: present and not deleted.
async fn active_owner<W: UnitOfWork>(work: &W, id: CustomerId) -> Result<Customer> {
    match work.customers().get_by_id(id).await? {
        Some(customer) if !customer.is_deleted() => Ok(customer),
        _ => Err(customer_not_found(id)),
    }
}

async fn ensure_model<W: UnitOfWork>(work: &W, id: VehicleModelId) -> Result<()> {
    if work.vehicle_models().exists(id).await? {
        Ok(())
    } else {
        Err(model_not_found(id))
    }
}
