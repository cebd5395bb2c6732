//! Repository traits, one generic CRUD trait plus a query trait per aggregate.

use async_trait::async_trait;
use common::{
    ClaimId, CustomerId, PartCategoryId, TechnicianId, VehicleModelId, WarrantyPolicyId,
};
use domain::{
    Customer, Entity, Part, PartCategory, PolicyCoveragePart, PolicyStatus, Vehicle,
    VehicleModel, WarrantyPolicy, WorkOrder,
};

use crate::Result;

/// Basic persistence operations shared by every aggregate.
///
/// `add`, `update` and `remove` only stage the change; nothing is written
/// until the owning unit of work commits.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Loads an entity by id. Soft-deleted rows are returned as well.
    async fn get_by_id(&self, id: E::Id) -> Result<Option<E>>;

    /// Lists every row, oldest first.
    async fn list(&self) -> Result<Vec<E>>;

    async fn exists(&self, id: E::Id) -> Result<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }

    /// Stages an insert.
    async fn add(&self, entity: E) -> Result<()>;

    /// Stages a full-row update.
    async fn update(&self, entity: E) -> Result<()>;

    /// Stages a hard delete.
    async fn remove(&self, id: E::Id) -> Result<()>;
}

#[async_trait]
pub trait CustomerRepository: Repository<Customer> {
    /// Looks up a customer by normalized (lowercase) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>>;

    async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    /// Case-insensitive substring match on first name, last name or email.
    async fn search(&self, term: &str) -> Result<Vec<Customer>>;
}

#[async_trait]
pub trait VehicleModelRepository: Repository<VehicleModel> {
    async fn find_by_identity(
        &self,
        brand: &str,
        model_name: &str,
        year: i32,
    ) -> Result<Option<VehicleModel>>;

    /// Number of vehicles of this model, soft-deleted ones included: every
    /// one of them holds the foreign key.
    async fn count_vehicles(&self, model_id: VehicleModelId) -> Result<u64>;
}

#[async_trait]
pub trait VehicleRepository: Repository<Vehicle> {
    async fn find_by_vin(&self, vin: &str) -> Result<Option<Vehicle>>;

    /// Vehicles owned by the customer that are not soft-deleted.
    async fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Vehicle>>;

    async fn count_active_by_customer(&self, customer_id: CustomerId) -> Result<u64>;
}

#[async_trait]
pub trait PartCategoryRepository: Repository<PartCategory> {
    async fn find_by_name(&self, name: &str) -> Result<Option<PartCategory>>;

    async fn list_children(&self, parent_id: PartCategoryId) -> Result<Vec<PartCategory>>;

    async fn count_children(&self, parent_id: PartCategoryId) -> Result<u64>;
}

#[async_trait]
pub trait PartRepository: Repository<Part> {
    async fn find_by_serial(&self, serial_number: &str) -> Result<Option<Part>>;

    async fn list_by_category(&self, category_id: PartCategoryId) -> Result<Vec<Part>>;

    /// Parts in the category that are not retired.
    async fn count_active_in_category(&self, category_id: PartCategoryId) -> Result<u64>;

    /// Every part in the category, retired ones included.
    async fn count_in_category(&self, category_id: PartCategoryId) -> Result<u64>;
}

#[async_trait]
pub trait WarrantyPolicyRepository: Repository<WarrantyPolicy> {
    async fn find_by_name(&self, name: &str) -> Result<Option<WarrantyPolicy>>;

    async fn list_by_status(&self, status: PolicyStatus) -> Result<Vec<WarrantyPolicy>>;
}

#[async_trait]
pub trait CoverageRepository: Repository<PolicyCoveragePart> {
    async fn list_by_policy(&self, policy_id: WarrantyPolicyId)
    -> Result<Vec<PolicyCoveragePart>>;

    async fn find_by_policy_and_category(
        &self,
        policy_id: WarrantyPolicyId,
        category_id: PartCategoryId,
    ) -> Result<Option<PolicyCoveragePart>>;

    async fn count_by_policy(&self, policy_id: WarrantyPolicyId) -> Result<u64>;

    async fn count_by_category(&self, category_id: PartCategoryId) -> Result<u64>;
}

#[async_trait]
pub trait WorkOrderRepository: Repository<WorkOrder> {
    async fn list_by_claim(&self, claim_id: ClaimId) -> Result<Vec<WorkOrder>>;

    async fn list_by_technician(&self, technician_id: TechnicianId) -> Result<Vec<WorkOrder>>;
}
