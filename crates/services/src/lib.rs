//! Application services for the warranty back office.
//!
//! One service per aggregate, each generic over a [`store::Store`]. Every
//! operation runs in its own unit of work and answers with a
//! [`common::ServiceResponse`]; failures never escape as errors. Expected
//! rejections keep their code, anything unexpected is logged and reported
//! as `INTERNAL_ERROR`.

pub mod coverage;
pub mod customer;
pub mod error;
pub mod lookup;
pub mod part;
pub mod part_category;
pub mod policy;
pub mod vehicle;
pub mod vehicle_model;
pub mod work_order;

pub use coverage::{
    AddCoverageRequest, CoverageDto, CoverageQuoteDto, PolicyCoverageService,
    UpdateCoverageRequest,
};
pub use customer::{CustomerDto, CustomerFilter, CustomerRequest, CustomerService};
pub use error::{INTERNAL_ERROR_MESSAGE, Result, ServiceError};
pub use lookup::{
    ClaimDirectory, ClaimRecord, InMemoryClaimDirectory, LookupError, TechnicianRecord,
};
pub use part::{CreatePartRequest, PartDto, PartFilter, PartService, UpdatePartRequest};
pub use part_category::{
    CreatePartCategoryRequest, PartCategoryDto, PartCategoryService, UpdatePartCategoryRequest,
};
pub use policy::{PolicyFilter, WarrantyPolicyDto, WarrantyPolicyRequest, WarrantyPolicyService};
pub use vehicle::{
    CreateVehicleRequest, UpdateVehicleRequest, VehicleDto, VehicleFilter, VehicleService,
};
pub use vehicle_model::{VehicleModelDto, VehicleModelRequest, VehicleModelService};
pub use work_order::{CreateWorkOrderRequest, WorkOrderDto, WorkOrderService};
