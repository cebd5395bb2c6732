//! Shared types for the warranty back office.
//!
//! Typed identifiers for every aggregate, a cents-based [`Money`] amount and
//! the [`ServiceResponse`] envelope returned by every service operation.

pub mod money;
pub mod response;
pub mod types;

pub use money::Money;
pub use response::{ErrorCode, ServiceResponse};
pub use types::{
    ClaimId, CoverageId, CustomerId, EntityId, PartCategoryId, PartId, TechnicianId, VehicleId,
    VehicleModelId, WarrantyPolicyId, WorkOrderId,
};
