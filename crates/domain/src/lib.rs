//! Domain layer for the warranty back office.
//!
//! Entities keep their fields private and change only through named
//! mutators. Every mutator validates its input and reports a violation as a
//! [`DomainError`] carrying a stable error code.

pub mod coverage;
pub mod customer;
pub mod entity;
pub mod error;
pub mod part;
pub mod part_category;
pub mod policy;
pub mod vehicle;
pub mod vehicle_model;
pub mod work_order;

mod validate;

pub use coverage::{PolicyCoveragePart, PolicyCoveragePartRecord};
pub use customer::{Customer, CustomerRecord};
pub use entity::{Entity, StatusSet};
pub use error::DomainError;
pub use part::{Part, PartRecord, PartStatus};
pub use part_category::{PartCategory, PartCategoryRecord};
pub use validate::MAX_AMOUNT_CENTS;
pub use policy::{PolicyStatus, WarrantyPolicy, WarrantyPolicyRecord};
pub use vehicle::{Vehicle, VehicleRecord};
pub use vehicle_model::{VehicleModel, VehicleModelRecord};
pub use work_order::{WorkOrder, WorkOrderRecord, WorkOrderStatus};
