use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use common::{
    ClaimId, CoverageId, CustomerId, PartCategoryId, PartId, TechnicianId, VehicleId,
    VehicleModelId, WarrantyPolicyId, WorkOrderId,
};
use domain::{
    Customer, Entity, Part, PartCategory, PolicyCoveragePart, PolicyStatus, Vehicle,
    VehicleModel, WarrantyPolicy, WorkOrder,
};
use tokio::sync::RwLock;

use crate::constraints;
use crate::pending::{PendingWrite, Staged, WriteBuffer, WriteKind, WriteOp};
use crate::repository::{
    CoverageRepository, CustomerRepository, PartCategoryRepository, PartRepository, Repository,
    VehicleModelRepository, VehicleRepository, WarrantyPolicyRepository, WorkOrderRepository,
};
use crate::store::{Store, UnitOfWork};
use crate::{Result, StoreError};

/// Every table of the in-memory store.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    customers: HashMap<CustomerId, Customer>,
    vehicle_models: HashMap<VehicleModelId, VehicleModel>,
    vehicles: HashMap<VehicleId, Vehicle>,
    part_categories: HashMap<PartCategoryId, PartCategory>,
    parts: HashMap<PartId, Part>,
    policies: HashMap<WarrantyPolicyId, WarrantyPolicy>,
    coverage: HashMap<CoverageId, PolicyCoveragePart>,
    work_orders: HashMap<WorkOrderId, WorkOrder>,
}

impl Tables {
    fn apply(&mut self, write: PendingWrite) -> Result<()> {
        match write {
            PendingWrite::Customer(op) => self.apply_op(op),
            PendingWrite::VehicleModel(op) => self.apply_op(op),
            PendingWrite::Vehicle(op) => self.apply_op(op),
            PendingWrite::PartCategory(op) => self.apply_op(op),
            PendingWrite::Part(op) => self.apply_op(op),
            PendingWrite::Policy(op) => self.apply_op(op),
            PendingWrite::Coverage(op) => self.apply_op(op),
            PendingWrite::WorkOrder(op) => self.apply_op(op),
        }
    }

    fn apply_op<E: MemoryTable>(&mut self, op: WriteOp<E>) -> Result<()> {
        match op {
            WriteOp::Insert(entity) => {
                if E::rows(self).contains_key(&entity.id()) {
                    return Err(StoreError::UniqueViolation {
                        constraint: format!("{}_pkey", E::TABLE),
                    });
                }
                self.check_row(&entity)?;
                E::rows_mut(self).insert(entity.id(), entity);
            }
            WriteOp::Update(entity) => {
                if !E::rows(self).contains_key(&entity.id()) {
                    return Err(StoreError::RowNotFound {
                        entity: E::NAME,
                        id: entity.id().to_string(),
                    });
                }
                self.check_row(&entity)?;
                E::rows_mut(self).insert(entity.id(), entity);
            }
            WriteOp::Delete(id) => {
                if let Some(constraint) = E::referenced_by(id, self) {
                    return Err(StoreError::ForeignKeyViolation {
                        constraint: constraint.to_string(),
                    });
                }
                if E::rows_mut(self).remove(&id).is_none() {
                    return Err(StoreError::RowNotFound {
                        entity: E::NAME,
                        id: id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_row<E: MemoryTable>(&self, entity: &E) -> Result<()> {
        if let Some(constraint) = entity.dangling_reference(self) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: constraint.to_string(),
            });
        }
        for (constraint, key) in entity.unique_keys() {
            let taken = E::rows(self)
                .values()
                .filter(|other| other.id() != entity.id())
                .any(|other| other.unique_keys().contains(&(constraint, key.clone())));
            if taken {
                return Err(StoreError::UniqueViolation {
                    constraint: constraint.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// An entity stored in one of the in-memory [`Tables`].
///
/// Mirrors the constraints of the SQL schema so both backends reject the
/// same writes with the same constraint names.
pub(crate) trait MemoryTable: Staged {
    fn rows(tables: &Tables) -> &HashMap<Self::Id, Self>;

    fn rows_mut(tables: &mut Tables) -> &mut HashMap<Self::Id, Self>;

    /// Unique keys of this row as `(constraint, key)` pairs.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Foreign key of this row that points at a missing row, if any.
    fn dangling_reference(&self, _tables: &Tables) -> Option<&'static str> {
        None
    }

    /// Foreign key elsewhere that still points at `id`, if any.
    fn referenced_by(_id: Self::Id, _tables: &Tables) -> Option<&'static str> {
        None
    }
}

impl MemoryTable for Customer {
    fn rows(tables: &Tables) -> &HashMap<CustomerId, Self> {
        &tables.customers
    }

    fn rows_mut(tables: &mut Tables) -> &mut HashMap<CustomerId, Self> {
        &mut tables.customers
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![(constraints::CUSTOMERS_EMAIL, self.email().to_string())]
    }

    fn referenced_by(id: CustomerId, tables: &Tables) -> Option<&'static str> {
        tables
            .vehicles
            .values()
            .any(|v| v.customer_id() == id)
            .then_some(constraints::VEHICLES_CUSTOMER)
    }
}

impl MemoryTable for VehicleModel {
    fn rows(tables: &Tables) -> &HashMap<VehicleModelId, Self> {
        &tables.vehicle_models
    }

    fn rows_mut(tables: &mut Tables) -> &mut HashMap<VehicleModelId, Self> {
        &mut tables.vehicle_models
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![(
            constraints::VEHICLE_MODELS_IDENTITY,
            format!("{}\u{1f}{}\u{1f}{}", self.brand(), self.model_name(), self.year()),
        )]
    }

    fn referenced_by(id: VehicleModelId, tables: &Tables) -> Option<&'static str> {
        tables
            .vehicles
            .values()
            .any(|v| v.model_id() == id)
            .then_some(constraints::VEHICLES_MODEL)
    }
}

impl MemoryTable for Vehicle {
    fn rows(tables: &Tables) -> &HashMap<VehicleId, Self> {
        &tables.vehicles
    }

    fn rows_mut(tables: &mut Tables) -> &mut HashMap<VehicleId, Self> {
        &mut tables.vehicles
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![(constraints::VEHICLES_VIN, self.vin().to_string())]
    }

    fn dangling_reference(&self, tables: &Tables) -> Option<&'static str> {
        if !tables.customers.contains_key(&self.customer_id()) {
            return Some(constraints::VEHICLES_CUSTOMER);
        }
        if !tables.vehicle_models.contains_key(&self.model_id()) {
            return Some(constraints::VEHICLES_MODEL);
        }
        None
    }
}

impl MemoryTable for PartCategory {
    fn rows(tables: &Tables) -> &HashMap<PartCategoryId, Self> {
        &tables.part_categories
    }

    fn rows_mut(tables: &mut Tables) -> &mut HashMap<PartCategoryId, Self> {
        &mut tables.part_categories
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![(constraints::PART_CATEGORIES_NAME, self.name().to_string())]
    }

    fn dangling_reference(&self, tables: &Tables) -> Option<&'static str> {
        match self.parent_id() {
            Some(parent) if !tables.part_categories.contains_key(&parent) => {
                Some(constraints::PART_CATEGORIES_PARENT)
            }
            _ => None,
        }
    }

    fn referenced_by(id: PartCategoryId, tables: &Tables) -> Option<&'static str> {
        if tables
            .part_categories
            .values()
            .any(|c| c.parent_id() == Some(id))
        {
            return Some(constraints::PART_CATEGORIES_PARENT);
        }
        if tables.parts.values().any(|p| p.category_id() == id) {
            return Some(constraints::PARTS_CATEGORY);
        }
        if tables.coverage.values().any(|c| c.category_id() == id) {
            return Some(constraints::COVERAGE_CATEGORY);
        }
        None
    }
}

impl MemoryTable for Part {
    fn rows(tables: &Tables) -> &HashMap<PartId, Self> {
        &tables.parts
    }

    fn rows_mut(tables: &mut Tables) -> &mut HashMap<PartId, Self> {
        &mut tables.parts
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![(
            constraints::PARTS_SERIAL_NUMBER,
            self.serial_number().to_string(),
        )]
    }

    fn dangling_reference(&self, tables: &Tables) -> Option<&'static str> {
        (!tables.part_categories.contains_key(&self.category_id()))
            .then_some(constraints::PARTS_CATEGORY)
    }
}

impl MemoryTable for WarrantyPolicy {
    fn rows(tables: &Tables) -> &HashMap<WarrantyPolicyId, Self> {
        &tables.policies
    }

    fn rows_mut(tables: &mut Tables) -> &mut HashMap<WarrantyPolicyId, Self> {
        &mut tables.policies
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![(constraints::WARRANTY_POLICIES_NAME, self.name().to_string())]
    }

    fn referenced_by(id: WarrantyPolicyId, tables: &Tables) -> Option<&'static str> {
        tables
            .coverage
            .values()
            .any(|c| c.policy_id() == id)
            .then_some(constraints::COVERAGE_POLICY)
    }
}

impl MemoryTable for PolicyCoveragePart {
    fn rows(tables: &Tables) -> &HashMap<CoverageId, Self> {
        &tables.coverage
    }

    fn rows_mut(tables: &mut Tables) -> &mut HashMap<CoverageId, Self> {
        &mut tables.coverage
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![(
            constraints::COVERAGE_POLICY_CATEGORY,
            format!("{}:{}", self.policy_id(), self.category_id()),
        )]
    }

    fn dangling_reference(&self, tables: &Tables) -> Option<&'static str> {
        if !tables.policies.contains_key(&self.policy_id()) {
            return Some(constraints::COVERAGE_POLICY);
        }
        if !tables.part_categories.contains_key(&self.category_id()) {
            return Some(constraints::COVERAGE_CATEGORY);
        }
        None
    }
}

impl MemoryTable for WorkOrder {
    fn rows(tables: &Tables) -> &HashMap<WorkOrderId, Self> {
        &tables.work_orders
    }

    fn rows_mut(tables: &mut Tables) -> &mut HashMap<WorkOrderId, Self> {
        &mut tables.work_orders
    }
}

/// Counts repository write calls per entity, for assertions in tests.
#[derive(Debug, Default)]
struct CallLog(Mutex<HashMap<(&'static str, WriteKind), usize>>);

impl CallLog {
    fn record(&self, entity: &'static str, kind: WriteKind) {
        *self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((entity, kind))
            .or_default() += 1;
    }

    fn get(&self, entity: &'static str, kind: WriteKind) -> usize {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(entity, kind))
            .copied()
            .unwrap_or(0)
    }

    fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// In-memory store for tests and local runs.
///
/// Enforces the same unique and foreign-key constraints as the PostgreSQL
/// schema. A commit applies its writes to a copy of the tables and swaps it
/// in only when every write succeeded.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    calls: Arc<CallLog>,
    fail_commits: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `add`, `update` or `remove` was called on the
    /// repository of `E`, committed or not.
    pub fn write_calls<E: Entity>(&self, kind: WriteKind) -> usize {
        self.calls.get(E::NAME, kind)
    }

    /// Makes every non-empty commit fail with [`StoreError::CommitRejected`].
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Clears all rows and call counts.
    pub async fn clear(&self) {
        *self.tables.write().await = Tables::default();
        self.calls.clear();
    }

    fn repository<E>(&self, buffer: &WriteBuffer) -> MemoryRepository<E> {
        MemoryRepository {
            tables: Arc::clone(&self.tables),
            calls: Arc::clone(&self.calls),
            buffer: buffer.clone(),
            _entity: PhantomData,
        }
    }
}

impl Store for MemoryStore {
    type Work = MemoryWork;

    fn begin(&self) -> MemoryWork {
        let buffer = WriteBuffer::default();
        MemoryWork {
            customers: self.repository(&buffer),
            vehicle_models: self.repository(&buffer),
            vehicles: self.repository(&buffer),
            part_categories: self.repository(&buffer),
            parts: self.repository(&buffer),
            policies: self.repository(&buffer),
            coverage: self.repository(&buffer),
            work_orders: self.repository(&buffer),
            store: self.clone(),
            buffer,
        }
    }
}

/// Repository over one in-memory table.
pub struct MemoryRepository<E> {
    tables: Arc<RwLock<Tables>>,
    calls: Arc<CallLog>,
    buffer: WriteBuffer,
    _entity: PhantomData<fn() -> E>,
}

impl<E: MemoryTable> MemoryRepository<E> {
    /// Rows matching `filter`, oldest first.
    async fn select(&self, filter: impl Fn(&E) -> bool) -> Vec<E> {
        let tables = self.tables.read().await;
        let mut rows: Vec<E> = E::rows(&tables)
            .values()
            .filter(|&row| filter(row))
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.created_at(), row.id()));
        rows
    }

    async fn find(&self, filter: impl Fn(&E) -> bool) -> Option<E> {
        let tables = self.tables.read().await;
        E::rows(&tables).values().find(|&row| filter(row)).cloned()
    }

    async fn count(&self, filter: impl Fn(&E) -> bool) -> u64 {
        let tables = self.tables.read().await;
        E::rows(&tables).values().filter(|&row| filter(row)).count() as u64
    }

    fn stage(&self, op: WriteOp<E>) {
        self.calls.record(E::NAME, op.kind());
        self.buffer.push(op);
    }
}

#[async_trait]
impl<E: MemoryTable> Repository<E> for MemoryRepository<E> {
    async fn get_by_id(&self, id: E::Id) -> Result<Option<E>> {
        let tables = self.tables.read().await;
        Ok(E::rows(&tables).get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<E>> {
        Ok(self.select(|_| true).await)
    }

    async fn add(&self, entity: E) -> Result<()> {
        self.stage(WriteOp::Insert(entity));
        Ok(())
    }

    async fn update(&self, entity: E) -> Result<()> {
        self.stage(WriteOp::Update(entity));
        Ok(())
    }

    async fn remove(&self, id: E::Id) -> Result<()> {
        self.stage(WriteOp::Delete(id));
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for MemoryRepository<Customer> {
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>> {
        Ok(self.find(|c| c.email() == email).await)
    }

    async fn search(&self, term: &str) -> Result<Vec<Customer>> {
        let term = term.to_lowercase();
        Ok(self
            .select(|c| {
                c.first_name().to_lowercase().contains(&term)
                    || c.last_name().to_lowercase().contains(&term)
                    || c.email().contains(&term)
            })
            .await)
    }
}

#[async_trait]
impl VehicleModelRepository for MemoryRepository<VehicleModel> {
    async fn find_by_identity(
        &self,
        brand: &str,
        model_name: &str,
        year: i32,
    ) -> Result<Option<VehicleModel>> {
        Ok(self
            .find(|m| m.brand() == brand && m.model_name() == model_name && m.year() == year)
            .await)
    }

    async fn count_vehicles(&self, model_id: VehicleModelId) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .vehicles
            .values()
            .filter(|v| v.model_id() == model_id)
            .count() as u64)
    }
}

#[async_trait]
impl VehicleRepository for MemoryRepository<Vehicle> {
    async fn find_by_vin(&self, vin: &str) -> Result<Option<Vehicle>> {
        Ok(self.find(|v| v.vin() == vin).await)
    }

    async fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Vehicle>> {
        Ok(self
            .select(|v| v.customer_id() == customer_id && !v.is_deleted())
            .await)
    }

    async fn count_active_by_customer(&self, customer_id: CustomerId) -> Result<u64> {
        Ok(self
            .count(|v| v.customer_id() == customer_id && !v.is_deleted())
            .await)
    }
}

#[async_trait]
impl PartCategoryRepository for MemoryRepository<PartCategory> {
    async fn find_by_name(&self, name: &str) -> Result<Option<PartCategory>> {
        Ok(self.find(|c| c.name() == name).await)
    }

    async fn list_children(&self, parent_id: PartCategoryId) -> Result<Vec<PartCategory>> {
        Ok(self.select(|c| c.parent_id() == Some(parent_id)).await)
    }

    async fn count_children(&self, parent_id: PartCategoryId) -> Result<u64> {
        Ok(self.count(|c| c.parent_id() == Some(parent_id)).await)
    }
}

#[async_trait]
impl PartRepository for MemoryRepository<Part> {
    async fn find_by_serial(&self, serial_number: &str) -> Result<Option<Part>> {
        Ok(self.find(|p| p.serial_number() == serial_number).await)
    }

    async fn list_by_category(&self, category_id: PartCategoryId) -> Result<Vec<Part>> {
        Ok(self.select(|p| p.category_id() == category_id).await)
    }

    async fn count_active_in_category(&self, category_id: PartCategoryId) -> Result<u64> {
        Ok(self
            .count(|p| p.category_id() == category_id && p.status().is_active())
            .await)
    }

    async fn count_in_category(&self, category_id: PartCategoryId) -> Result<u64> {
        Ok(self.count(|p| p.category_id() == category_id).await)
    }
}

#[async_trait]
impl WarrantyPolicyRepository for MemoryRepository<WarrantyPolicy> {
    async fn find_by_name(&self, name: &str) -> Result<Option<WarrantyPolicy>> {
        Ok(self.find(|p| p.name() == name).await)
    }

    async fn list_by_status(&self, status: PolicyStatus) -> Result<Vec<WarrantyPolicy>> {
        Ok(self.select(|p| p.status() == status).await)
    }
}

#[async_trait]
impl CoverageRepository for MemoryRepository<PolicyCoveragePart> {
    async fn list_by_policy(
        &self,
        policy_id: WarrantyPolicyId,
    ) -> Result<Vec<PolicyCoveragePart>> {
        Ok(self.select(|c| c.policy_id() == policy_id).await)
    }

    async fn find_by_policy_and_category(
        &self,
        policy_id: WarrantyPolicyId,
        category_id: PartCategoryId,
    ) -> Result<Option<PolicyCoveragePart>> {
        Ok(self
            .find(|c| c.policy_id() == policy_id && c.category_id() == category_id)
            .await)
    }

    async fn count_by_policy(&self, policy_id: WarrantyPolicyId) -> Result<u64> {
        Ok(self.count(|c| c.policy_id() == policy_id).await)
    }

    async fn count_by_category(&self, category_id: PartCategoryId) -> Result<u64> {
        Ok(self.count(|c| c.category_id() == category_id).await)
    }
}

#[async_trait]
impl WorkOrderRepository for MemoryRepository<WorkOrder> {
    async fn list_by_claim(&self, claim_id: ClaimId) -> Result<Vec<WorkOrder>> {
        Ok(self.select(|w| w.claim_id() == claim_id).await)
    }

    async fn list_by_technician(&self, technician_id: TechnicianId) -> Result<Vec<WorkOrder>> {
        Ok(self.select(|w| w.technician_id() == technician_id).await)
    }
}

/// Unit of work over a [`MemoryStore`].
pub struct MemoryWork {
    customers: MemoryRepository<Customer>,
    vehicle_models: MemoryRepository<VehicleModel>,
    vehicles: MemoryRepository<Vehicle>,
    part_categories: MemoryRepository<PartCategory>,
    parts: MemoryRepository<Part>,
    policies: MemoryRepository<WarrantyPolicy>,
    coverage: MemoryRepository<PolicyCoveragePart>,
    work_orders: MemoryRepository<WorkOrder>,
    store: MemoryStore,
    buffer: WriteBuffer,
}

#[async_trait]
impl UnitOfWork for MemoryWork {
    type Customers = MemoryRepository<Customer>;
    type VehicleModels = MemoryRepository<VehicleModel>;
    type Vehicles = MemoryRepository<Vehicle>;
    type PartCategories = MemoryRepository<PartCategory>;
    type Parts = MemoryRepository<Part>;
    type Policies = MemoryRepository<WarrantyPolicy>;
    type Coverage = MemoryRepository<PolicyCoveragePart>;
    type WorkOrders = MemoryRepository<WorkOrder>;

    fn customers(&self) -> &Self::Customers {
        &self.customers
    }

    fn vehicle_models(&self) -> &Self::VehicleModels {
        &self.vehicle_models
    }

    fn vehicles(&self) -> &Self::Vehicles {
        &self.vehicles
    }

    fn part_categories(&self) -> &Self::PartCategories {
        &self.part_categories
    }

    fn parts(&self) -> &Self::Parts {
        &self.parts
    }

    fn policies(&self) -> &Self::Policies {
        &self.policies
    }

    fn coverage(&self) -> &Self::Coverage {
        &self.coverage
    }

    fn work_orders(&self) -> &Self::WorkOrders {
        &self.work_orders
    }

    async fn commit(&self) -> Result<()> {
        let writes = self.buffer.drain();
        if writes.is_empty() {
            return Ok(());
        }
        if self.store.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::CommitRejected(
                "in-memory store is rejecting commits".to_string(),
            ));
        }

        let count = writes.len();
        let mut tables = self.store.tables.write().await;
        let mut staged = tables.clone();
        for write in writes {
            staged.apply(write)?;
        }
        *tables = staged;
        tracing::debug!(writes = count, "committed in-memory unit of work");
        Ok(())
    }
}
