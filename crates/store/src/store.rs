use async_trait::async_trait;

use crate::Result;
use crate::repository::{
    CoverageRepository, CustomerRepository, PartCategoryRepository, PartRepository,
    VehicleModelRepository, VehicleRepository, WarrantyPolicyRepository, WorkOrderRepository,
};

/// One operation's view of the store.
///
/// Repositories obtained from the same unit of work share a write buffer.
/// `commit` applies every staged write atomically: either all of them land
/// or none do. A unit of work that is dropped without committing discards
/// its writes.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Customers: CustomerRepository;
    type VehicleModels: VehicleModelRepository;
    type Vehicles: VehicleRepository;
    type PartCategories: PartCategoryRepository;
    type Parts: PartRepository;
    type Policies: WarrantyPolicyRepository;
    type Coverage: CoverageRepository;
    type WorkOrders: WorkOrderRepository;

    fn customers(&self) -> &Self::Customers;
    fn vehicle_models(&self) -> &Self::VehicleModels;
    fn vehicles(&self) -> &Self::Vehicles;
    fn part_categories(&self) -> &Self::PartCategories;
    fn parts(&self) -> &Self::Parts;
    fn policies(&self) -> &Self::Policies;
    fn coverage(&self) -> &Self::Coverage;
    fn work_orders(&self) -> &Self::WorkOrders;

    /// Applies all staged writes. A commit with nothing staged is a no-op.
    async fn commit(&self) -> Result<()>;
}

/// Shared handle to a backing store.
///
/// Cheap to clone; every service holds one and starts a fresh unit of work
/// per call.
pub trait Store: Clone + Send + Sync + 'static {
    type Work: UnitOfWork;

    fn begin(&self) -> Self::Work;
}
