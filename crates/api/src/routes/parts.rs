//! Parts inventory endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use common::PartId;
use services::{CreatePartRequest, PartDto, PartFilter, UpdatePartRequest};
use store::Store;

use super::{AppState, StatusRequest};
use crate::error::{ApiError, Envelope, parse_id};

#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<CreatePartRequest>, JsonRejection>,
) -> Result<Envelope<PartDto>, ApiError> {
    let Json(request) = body?;
    Ok(Envelope::created(state.parts.create(request).await))
}

/// GET /api/parts?category_id=&status=
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<PartFilter>, QueryRejection>,
) -> Result<Envelope<Vec<PartDto>>, ApiError> {
    let Query(filter) = query?;
    Ok(state.parts.list(filter).await.into())
}

#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<PartDto>, ApiError> {
    let id: PartId = parse_id("part id", &id)?;
    Ok(state.parts.get_by_id(id).await.into())
}

/// GET /api/parts/by-serial/{serial}
#[tracing::instrument(skip(state))]
pub async fn get_by_serial<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(serial): Path<String>,
) -> Envelope<PartDto> {
    state.parts.get_by_serial(&serial).await.into()
}

#[tracing::instrument(skip(state, body))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<UpdatePartRequest>, JsonRejection>,
) -> Result<Envelope<PartDto>, ApiError> {
    let id: PartId = parse_id("part id", &id)?;
    let Json(request) = body?;
    Ok(state.parts.update(id, request).await.into())
}

/// PUT /api/parts/{id}/status
#[tracing::instrument(skip(state, body))]
pub async fn change_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Envelope<PartDto>, ApiError> {
    let id: PartId = parse_id("part id", &id)?;
    let Json(request) = body?;
    Ok(state.parts.change_status(id, &request.status).await.into())
}

#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<()>, ApiError> {
    let id: PartId = parse_id("part id", &id)?;
    Ok(state.parts.delete(id).await.into())
}
