//! Part category endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::PartCategoryId;
use services::{CreatePartCategoryRequest, PartCategoryDto, UpdatePartCategoryRequest};
use store::Store;

use super::AppState;
use crate::error::{ApiError, Envelope, parse_id};

#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<CreatePartCategoryRequest>, JsonRejection>,
) -> Result<Envelope<PartCategoryDto>, ApiError> {
    let Json(request) = body?;
    Ok(Envelope::created(state.part_categories.create(request).await))
}

#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Envelope<Vec<PartCategoryDto>> {
    state.part_categories.list().await.into()
}

#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<PartCategoryDto>, ApiError> {
    let id: PartCategoryId = parse_id("category id", &id)?;
    Ok(state.part_categories.get_by_id(id).await.into())
}

/// GET /api/part-categories/{id}/children
#[tracing::instrument(skip(state))]
pub async fn children<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<Vec<PartCategoryDto>>, ApiError> {
    let id: PartCategoryId = parse_id("category id", &id)?;
    Ok(state.part_categories.list_children(id).await.into())
}

#[tracing::instrument(skip(state, body))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<UpdatePartCategoryRequest>, JsonRejection>,
) -> Result<Envelope<PartCategoryDto>, ApiError> {
    let id: PartCategoryId = parse_id("category id", &id)?;
    let Json(request) = body?;
    Ok(state.part_categories.update(id, request).await.into())
}

#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<()>, ApiError> {
    let id: PartCategoryId = parse_id("category id", &id)?;
    Ok(state.part_categories.delete(id).await.into())
}
