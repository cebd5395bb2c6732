//! Repair work orders raised against warranty claims.

use chrono::{DateTime, Utc};
use common::{ClaimId, TechnicianId, WorkOrderId};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, StatusSet};
use crate::error::DomainError;
use crate::validate;

const DESCRIPTION_MAX: usize = 1000;

/// Progress of a work order.
///
/// ```text
/// Open ◄──► InProgress ──► Completed
///   │            │
///   └────────────┴──► Cancelled
/// ```
///
/// `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkOrderStatus {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl StatusSet for WorkOrderStatus {
    const ALL: &'static [Self] = &[
        WorkOrderStatus::Open,
        WorkOrderStatus::InProgress,
        WorkOrderStatus::Completed,
        WorkOrderStatus::Cancelled,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Open => "Open",
            WorkOrderStatus::InProgress => "InProgress",
            WorkOrderStatus::Completed => "Completed",
            WorkOrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl WorkOrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Completed | WorkOrderStatus::Cancelled)
    }
}

impl std::fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of repair work assigned to a technician for a claim.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkOrder {
    id: WorkOrderId,
    claim_id: ClaimId,
    technician_id: TechnicianId,
    description: String,
    status: WorkOrderStatus,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored representation of a [`WorkOrder`].
#[derive(Debug, Clone)]
pub struct WorkOrderRecord {
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

impl From<WorkOrderRecord> for WorkOrder {
    fn from(r: WorkOrderRecord) -> Self {
        Self {
            id: r.id,
            claim_id: r.claim_id,
            technician_id: r.technician_id,
            description: r.description,
            status: r.status,
            started_at: r.started_at,
            completed_at: r.completed_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl Entity for WorkOrder {
    type Id = WorkOrderId;
    const NAME: &'static str = "Work order";

    fn id(&self) -> WorkOrderId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl WorkOrder {
    /// Creates an `Open` work order.
    pub fn new(
        claim_id: ClaimId,
        technician_id: TechnicianId,
        description: &str,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();
        Ok(Self {
            id: WorkOrderId::new(),
            claim_id,
            technician_id,
            description: validate::required("description", description, DESCRIPTION_MAX)?,
            status: WorkOrderStatus::Open,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn claim_id(&self) -> ClaimId {
        self.claim_id
    }

    pub fn technician_id(&self) -> TechnicianId {
        self.technician_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> WorkOrderStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Work orders can only be removed before work has begun or after
    /// they were cancelled.
    pub fn is_deletable(&self) -> bool {
        matches!(self.status, WorkOrderStatus::Open | WorkOrderStatus::Cancelled)
    }

    pub fn change_description(&mut self, description: &str) -> Result<(), DomainError> {
        self.description = validate::required("description", description, DESCRIPTION_MAX)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Moves to `status`, stamping the start and completion times the first
    /// time the order enters `InProgress` and `Completed`.
    pub fn change_status(&mut self, status: WorkOrderStatus) -> Result<(), DomainError> {
        if self.status.is_terminal() && status != self.status {
            return Err(DomainError::InvalidTransition {
                entity: Self::NAME,
                from: self.status.as_str(),
                to: status.as_str(),
            });
        }
        let now = Utc::now();
        match status {
            WorkOrderStatus::InProgress if self.started_at.is_none() => {
                self.started_at = Some(now);
            }
            WorkOrderStatus::Completed => {
                self.started_at.get_or_insert(now);
                self.completed_at.get_or_insert(now);
            }
            _ => {}
        }
        self.status = status;
        self.updated_at = now;
        Ok(())
    }
}
