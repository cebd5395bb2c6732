//! Warranty policy endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use common::WarrantyPolicyId;
use services::{PolicyFilter, WarrantyPolicyDto, WarrantyPolicyRequest};
use store::Store;

use super::{AppState, StatusRequest};
use crate::error::{ApiError, Envelope, parse_id};

#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<WarrantyPolicyRequest>, JsonRejection>,
) -> Result<Envelope<WarrantyPolicyDto>, ApiError> {
    let Json(request) = body?;
    Ok(Envelope::created(state.policies.create(request).await))
}

/// GET /api/policies?status=
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<PolicyFilter>, QueryRejection>,
) -> Result<Envelope<Vec<WarrantyPolicyDto>>, ApiError> {
    let Query(filter) = query?;
    Ok(state.policies.list(filter).await.into())
}

#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<WarrantyPolicyDto>, ApiError> {
    let id: WarrantyPolicyId = parse_id("policy id", &id)?;
    Ok(state.policies.get_by_id(id).await.into())
}

#[tracing::instrument(skip(state, body))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<WarrantyPolicyRequest>, JsonRejection>,
) -> Result<Envelope<WarrantyPolicyDto>, ApiError> {
    let id: WarrantyPolicyId = parse_id("policy id", &id)?;
    let Json(request) = body?;
    Ok(state.policies.update(id, request).await.into())
}

/// PUT /api/policies/{id}/status
#[tracing::instrument(skip(state, body))]
pub async fn change_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Envelope<WarrantyPolicyDto>, ApiError> {
    let id: WarrantyPolicyId = parse_id("policy id", &id)?;
    let Json(request) = body?;
    Ok(state.policies.change_status(id, &request.status).await.into())
}

#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<()>, ApiError> {
    let id: WarrantyPolicyId = parse_id("policy id", &id)?;
    Ok(state.policies.delete(id).await.into())
}
