//! Route handlers, one module per resource.

pub mod coverage;
pub mod customers;
pub mod health;
pub mod metrics;
pub mod part_categories;
pub mod parts;
pub mod policies;
pub mod vehicle_models;
pub mod vehicles;
pub mod work_orders;

use serde::Deserialize;
use services::{
    CustomerService, InMemoryClaimDirectory, PartCategoryService, PartService,
    PolicyCoverageService, VehicleModelService, VehicleService, WarrantyPolicyService,
    WorkOrderService,
};
use store::Store;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub customers: CustomerService<S>,
    pub vehicle_models: VehicleModelService<S>,
    pub vehicles: VehicleService<S>,
    pub part_categories: PartCategoryService<S>,
    pub parts: PartService<S>,
    pub policies: WarrantyPolicyService<S>,
    pub coverage: PolicyCoverageService<S>,
    pub work_orders: WorkOrderService<S, InMemoryClaimDirectory>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, directory: InMemoryClaimDirectory) -> Self {
        Self {
            customers: CustomerService::new(store.clone()),
            vehicle_models: VehicleModelService::new(store.clone()),
            vehicles: VehicleService::new(store.clone()),
            part_categories: PartCategoryService::new(store.clone()),
            parts: PartService::new(store.clone()),
            policies: WarrantyPolicyService::new(store.clone()),
            coverage: PolicyCoverageService::new(store.clone()),
            work_orders: WorkOrderService::new(store, directory),
        }
    }
}

/// Body of the status-change endpoints.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}
