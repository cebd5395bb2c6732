//! Work order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::{ClaimId, TechnicianId, WorkOrderId};
use services::{CreateWorkOrderRequest, WorkOrderDto};
use store::Store;

use super::{AppState, StatusRequest};
use crate::error::{ApiError, Envelope, parse_id};

#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<CreateWorkOrderRequest>, JsonRejection>,
) -> Result<Envelope<WorkOrderDto>, ApiError> {
    let Json(request) = body?;
    Ok(Envelope::created(state.work_orders.create(request).await))
}

#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<WorkOrderDto>, ApiError> {
    let id: WorkOrderId = parse_id("work order id", &id)?;
    Ok(state.work_orders.get_by_id(id).await.into())
}

/// GET /api/claims/{id}/work-orders
#[tracing::instrument(skip(state))]
pub async fn list_by_claim<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(claim_id): Path<String>,
) -> Result<Envelope<Vec<WorkOrderDto>>, ApiError> {
    let claim_id: ClaimId = parse_id("claim id", &claim_id)?;
    Ok(state.work_orders.list_by_claim(claim_id).await.into())
}

/// GET /api/technicians/{id}/work-orders
#[tracing::instrument(skip(state))]
pub async fn list_by_technician<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(technician_id): Path<String>,
) -> Result<Envelope<Vec<WorkOrderDto>>, ApiError> {
    let technician_id: TechnicianId = parse_id("technician id", &technician_id)?;
    Ok(state.work_orders.list_by_technician(technician_id).await.into())
}

/// PUT /api/work-orders/{id}/status
#[tracing::instrument(skip(state, body))]
pub async fn update_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Envelope<WorkOrderDto>, ApiError> {
    let id: WorkOrderId = parse_id("work order id", &id)?;
    let Json(request) = body?;
    Ok(state.work_orders.update_status(id, &request.status).await.into())
}

#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<()>, ApiError> {
    let id: WorkOrderId = parse_id("work order id", &id)?;
    Ok(state.work_orders.delete(id).await.into())
}
