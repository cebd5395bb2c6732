//! Vehicle model catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::VehicleModelId;
use services::{VehicleModelDto, VehicleModelRequest};
use store::Store;

use super::AppState;
use crate::error::{ApiError, Envelope, parse_id};

#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<VehicleModelRequest>, JsonRejection>,
) -> Result<Envelope<VehicleModelDto>, ApiError> {
    let Json(request) = body?;
    Ok(Envelope::created(state.vehicle_models.create(request).await))
}

#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Envelope<Vec<VehicleModelDto>> {
    state.vehicle_models.list().await.into()
}

#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<VehicleModelDto>, ApiError> {
    let id: VehicleModelId = parse_id("vehicle model id", &id)?;
    Ok(state.vehicle_models.get_by_id(id).await.into())
}

#[tracing::instrument(skip(state, body))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<VehicleModelRequest>, JsonRejection>,
) -> Result<Envelope<VehicleModelDto>, ApiError> {
    let id: VehicleModelId = parse_id("vehicle model id", &id)?;
    let Json(request) = body?;
    Ok(state.vehicle_models.update(id, request).await.into())
}

#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<()>, ApiError> {
    let id: VehicleModelId = parse_id("vehicle model id", &id)?;
    Ok(state.vehicle_models.delete(id).await.into())
}
