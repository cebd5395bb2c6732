//! Work orders raised against warranty claims.

use chrono::{DateTime, Utc};
use common::{ClaimId, ErrorCode, ServiceResponse, TechnicianId, WorkOrderId};
use domain::{Entity, StatusSet, WorkOrder, WorkOrderStatus};
use serde::{Deserialize, Serialize};
use store::{Repository, Store, UnitOfWork, WorkOrderRepository};

use crate::error::{Result, ServiceError, parse_status, respond};
use crate::lookup::ClaimDirectory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderDto {
    pub id: WorkOrderId,
    pub claim_id: ClaimId,
    pub technician_id: TechnicianId,
    pub description: String,
    pub status: WorkOrderStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&WorkOrder> for WorkOrderDto {
    fn from(order: &WorkOrder) -> Self {
        Self {
            id: order.id(),
            claim_id: order.claim_id(),
            technician_id: order.technician_id(),
            description: order.description().to_string(),
            status: order.status(),
            started_at: order.started_at(),
            completed_at: order.completed_at(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkOrderRequest {
    pub claim_id: ClaimId,
    pub technician_id: TechnicianId,
    pub description: String,
}

/// Schedules repair work. Claims and technicians are resolved through a
/// [`ClaimDirectory`]; work orders themselves live in the store.
#[derive(Clone)]
pub struct WorkOrderService<S, L> {
    store: S,
    directory: L,
}

impl<S: Store, L: ClaimDirectory> WorkOrderService<S, L> {
    pub fn new(store: S, directory: L) -> Self {
        Self { store, directory }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, request: CreateWorkOrderRequest) -> ServiceResponse<WorkOrderDto> {
        let outcome: Result<WorkOrderDto> = async {
            let order = WorkOrder::new(
                request.claim_id,
                request.technician_id,
                &request.description,
            )?;

            self.ensure_claim(request.claim_id).await?;
            let technician = self
                .directory
                .find_technician(request.technician_id)
                .await?
                .ok_or_else(|| technician_not_found(request.technician_id))?;
            if !technician.is_active {
                return Err(ServiceError::rejected(
                    ErrorCode::TECHNICIAN_INACTIVE,
                    format!("Technician {} is inactive", technician.name),
                ));
            }

            let work = self.store.begin();
            work.work_orders().add(order.clone()).await?;
            work.commit().await?;
            tracing::info!(
                work_order_id = %order.id(),
                claim_id = %order.claim_id(),
                technician_id = %order.technician_id(),
                "work order created"
            );
            Ok(WorkOrderDto::from(&order))
        }
        .await;
        respond("work_order.create", "Work order created successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: WorkOrderId) -> ServiceResponse<WorkOrderDto> {
        let outcome: Result<WorkOrderDto> = async {
            let work = self.store.begin();
            Ok(WorkOrderDto::from(&load(&work, id).await?))
        }
        .await;
        respond("work_order.get", "Work order retrieved successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_by_claim(&self, claim_id: ClaimId) -> ServiceResponse<Vec<WorkOrderDto>> {
        let outcome: Result<Vec<WorkOrderDto>> = async {
            self.ensure_claim(claim_id).await?;
            let work = self.store.begin();
            let orders = work.work_orders().list_by_claim(claim_id).await?;
            Ok(orders.iter().map(WorkOrderDto::from).collect())
        }
        .await;
        respond(
            "work_order.list_by_claim",
            "Work orders retrieved successfully",
            outcome,
        )
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_by_technician(
        &self,
        technician_id: TechnicianId,
    ) -> ServiceResponse<Vec<WorkOrderDto>> {
        let outcome: Result<Vec<WorkOrderDto>> = async {
            self.directory
                .find_technician(technician_id)
                .await?
                .ok_or_else(|| technician_not_found(technician_id))?;
            let work = self.store.begin();
            let orders = work.work_orders().list_by_technician(technician_id).await?;
            Ok(orders.iter().map(WorkOrderDto::from).collect())
        }
        .await;
        respond(
            "work_order.list_by_technician",
            "Work orders retrieved successfully",
            outcome,
        )
    }

    /// Moves the order to `status`. Unknown names are rejected before the
    /// order is loaded; leaving a terminal status is a guard failure.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: WorkOrderId,
        status: &str,
    ) -> ServiceResponse<WorkOrderDto> {
        let outcome: Result<WorkOrderDto> = async {
            let status = parse_status::<WorkOrderStatus>(status)?;

            let work = self.store.begin();
            let mut order = load(&work, id).await?;
            let previous = order.status();
            order.change_status(status)?;

            work.work_orders().update(order.clone()).await?;
            work.commit().await?;
            tracing::info!(
                work_order_id = %id,
                from = previous.as_str(),
                to = status.as_str(),
                "work order status changed"
            );
            Ok(WorkOrderDto::from(&order))
        }
        .await;
        respond(
            "work_order.update_status",
            "Work order status updated successfully",
            outcome,
        )
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: WorkOrderId) -> ServiceResponse<()> {
        let outcome: Result<()> = async {
            let work = self.store.begin();
            let order = load(&work, id).await?;
            if !order.is_deletable() {
                return Err(ServiceError::rejected(
                    ErrorCode::WORK_ORDER_NOT_DELETABLE,
                    format!(
                        "Work order is {} and can only be deleted while Open or Cancelled",
                        order.status()
                    ),
                ));
            }

            work.work_orders().remove(id).await?;
            work.commit().await?;
            Ok(())
        }
        .await;
        respond("work_order.delete", "Work order deleted successfully", outcome)
    }

    async fn ensure_claim(&self, claim_id: ClaimId) -> Result<()> {
        match self.directory.find_claim(claim_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::rejected(
                ErrorCode::CLAIM_NOT_FOUND,
                format!("Warranty claim {claim_id} not found"),
            )),
        }
    }
}

async fn load<W: UnitOfWork>(work: &W, id: WorkOrderId) -> Result<WorkOrder> {
    work.work_orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(WorkOrder::NAME, id))
}

fn technician_not_found(id: TechnicianId) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::TECHNICIAN_NOT_FOUND,
        format!("Technician {id} not found"),
    )
}
