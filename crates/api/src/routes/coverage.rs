//! Policy coverage endpoints.
//!
//! Entries are created and listed under their policy
//! (`/api/policies/{id}/coverage`) and addressed by their own id afterwards
//! (`/api/coverage/{id}`).

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::{CoverageId, PartId, WarrantyPolicyId};
use services::{AddCoverageRequest, CoverageDto, CoverageQuoteDto, UpdateCoverageRequest};
use store::Store;

use super::AppState;
use crate::error::{ApiError, Envelope, parse_id};

/// POST /api/policies/{id}/coverage
#[tracing::instrument(skip(state, body))]
pub async fn add<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(policy_id): Path<String>,
    body: Result<Json<AddCoverageRequest>, JsonRejection>,
) -> Result<Envelope<CoverageDto>, ApiError> {
    let policy_id: WarrantyPolicyId = parse_id("policy id", &policy_id)?;
    let Json(request) = body?;
    Ok(Envelope::created(state.coverage.add(policy_id, request).await))
}

/// GET /api/policies/{id}/coverage
#[tracing::instrument(skip(state))]
pub async fn list_by_policy<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(policy_id): Path<String>,
) -> Result<Envelope<Vec<CoverageDto>>, ApiError> {
    let policy_id: WarrantyPolicyId = parse_id("policy id", &policy_id)?;
    Ok(state.coverage.list_by_policy(policy_id).await.into())
}

/// GET /api/policies/{id}/coverage/parts/{part_id}
#[tracing::instrument(skip(state))]
pub async fn for_part<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path((policy_id, part_id)): Path<(String, String)>,
) -> Result<Envelope<CoverageQuoteDto>, ApiError> {
    let policy_id: WarrantyPolicyId = parse_id("policy id", &policy_id)?;
    let part_id: PartId = parse_id("part id", &part_id)?;
    Ok(state.coverage.coverage_for_part(policy_id, part_id).await.into())
}

#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<CoverageDto>, ApiError> {
    let id: CoverageId = parse_id("coverage id", &id)?;
    Ok(state.coverage.get_by_id(id).await.into())
}

#[tracing::instrument(skip(state, body))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateCoverageRequest>, JsonRejection>,
) -> Result<Envelope<CoverageDto>, ApiError> {
    let id: CoverageId = parse_id("coverage id", &id)?;
    let Json(request) = body?;
    Ok(state.coverage.update(id, request).await.into())
}

#[tracing::instrument(skip(state))]
pub async fn remove<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<()>, ApiError> {
    let id: CoverageId = parse_id("coverage id", &id)?;
    Ok(state.coverage.remove(id).await.into())
}
