//! Customer endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use common::CustomerId;
use services::{CustomerDto, CustomerFilter, CustomerRequest, VehicleDto};
use store::Store;

use super::AppState;
use crate::error::{ApiError, Envelope, parse_id};

/// POST /api/customers
#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<Envelope<CustomerDto>, ApiError> {
    let Json(request) = body?;
    Ok(Envelope::created(state.customers.create(request).await))
}

/// GET /api/customers?include_deleted=&search=
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<CustomerFilter>, QueryRejection>,
) -> Result<Envelope<Vec<CustomerDto>>, ApiError> {
    let Query(filter) = query?;
    Ok(state.customers.list(filter).await.into())
}

/// GET /api/customers/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<CustomerDto>, ApiError> {
    let id: CustomerId = parse_id("customer id", &id)?;
    Ok(state.customers.get_by_id(id).await.into())
}

/// GET /api/customers/by-email/{email}
#[tracing::instrument(skip(state))]
pub async fn get_by_email<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(email): Path<String>,
) -> Envelope<CustomerDto> {
    state.customers.get_by_email(&email).await.into()
}

/// PUT /api/customers/{id}
#[tracing::instrument(skip(state, body))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<Envelope<CustomerDto>, ApiError> {
    let id: CustomerId = parse_id("customer id", &id)?;
    let Json(request) = body?;
    Ok(state.customers.update(id, request).await.into())
}

/// DELETE /api/customers/{id}: soft delete.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<CustomerDto>, ApiError> {
    let id: CustomerId = parse_id("customer id", &id)?;
    Ok(state.customers.soft_delete(id).await.into())
}

/// POST /api/customers/{id}/restore
#[tracing::instrument(skip(state))]
pub async fn restore<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<CustomerDto>, ApiError> {
    let id: CustomerId = parse_id("customer id", &id)?;
    Ok(state.customers.restore(id).await.into())
}

/// GET /api/customers/{id}/vehicles
#[tracing::instrument(skip(state))]
pub async fn vehicles<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<Vec<VehicleDto>>, ApiError> {
    let id: CustomerId = parse_id("customer id", &id)?;
    Ok(state.vehicles.list_by_customer(id).await.into())
}
