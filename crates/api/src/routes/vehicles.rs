//! Vehicle registry endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use common::{CustomerId, VehicleId};
use serde::Deserialize;
use services::{CreateVehicleRequest, UpdateVehicleRequest, VehicleDto, VehicleFilter};
use store::Store;

use super::AppState;
use crate::error::{ApiError, Envelope, parse_id};

/// Body of POST /api/vehicles/{id}/transfer.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub customer_id: CustomerId,
}

#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<CreateVehicleRequest>, JsonRejection>,
) -> Result<Envelope<VehicleDto>, ApiError> {
    let Json(request) = body?;
    Ok(Envelope::created(state.vehicles.create(request).await))
}

/// GET /api/vehicles?include_deleted=
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<VehicleFilter>, QueryRejection>,
) -> Result<Envelope<Vec<VehicleDto>>, ApiError> {
    let Query(filter) = query?;
    Ok(state.vehicles.list(filter).await.into())
}

#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<VehicleDto>, ApiError> {
    let id: VehicleId = parse_id("vehicle id", &id)?;
    Ok(state.vehicles.get_by_id(id).await.into())
}

/// GET /api/vehicles/by-vin/{vin}
#[tracing::instrument(skip(state))]
pub async fn get_by_vin<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(vin): Path<String>,
) -> Envelope<VehicleDto> {
    state.vehicles.get_by_vin(&vin).await.into()
}

#[tracing::instrument(skip(state, body))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateVehicleRequest>, JsonRejection>,
) -> Result<Envelope<VehicleDto>, ApiError> {
    let id: VehicleId = parse_id("vehicle id", &id)?;
    let Json(request) = body?;
    Ok(state.vehicles.update(id, request).await.into())
}

#[tracing::instrument(skip(state, body))]
pub async fn transfer<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Envelope<VehicleDto>, ApiError> {
    let id: VehicleId = parse_id("vehicle id", &id)?;
    let Json(request) = body?;
    Ok(state.vehicles.transfer(id, request.customer_id).await.into())
}

/// DELETE /api/vehicles/{id}: soft delete.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<VehicleDto>, ApiError> {
    let id: VehicleId = parse_id("vehicle id", &id)?;
    Ok(state.vehicles.soft_delete(id).await.into())
}

#[tracing::instrument(skip(state))]
pub async fn restore<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<VehicleDto>, ApiError> {
    let id: VehicleId = parse_id("vehicle id", &id)?;
    Ok(state.vehicles.restore(id).await.into())
}
