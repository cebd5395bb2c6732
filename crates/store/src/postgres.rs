use std::marker::PhantomData;

use async_trait::async_trait;
use common::{
    ClaimId, CoverageId, CustomerId, EntityId, Money, PartCategoryId, PartId, TechnicianId,
    VehicleId, VehicleModelId, WarrantyPolicyId, WorkOrderId,
};
use domain::{
    Customer, CustomerRecord, Entity, Part, PartCategory, PartCategoryRecord, PartRecord,
    PolicyCoveragePart, PolicyCoveragePartRecord, PolicyStatus, StatusSet, Vehicle,
    VehicleModel, VehicleModelRecord, VehicleRecord, WarrantyPolicy, WarrantyPolicyRecord,
    WorkOrder, WorkOrderRecord,
};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgConnection, PgPool, Postgres, Row};
use uuid::Uuid;

use crate::pending::{PendingWrite, Staged, WriteBuffer, WriteOp};
use crate::repository::{
    CoverageRepository, CustomerRepository, PartCategoryRepository, PartRepository, Repository,
    VehicleModelRepository, VehicleRepository, WarrantyPolicyRepository, WorkOrderRepository,
};
use crate::store::{Store, UnitOfWork};
use crate::{Result, StoreError};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool to `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn repository<E>(&self, buffer: &WriteBuffer) -> PgRepository<E> {
        PgRepository {
            pool: self.pool.clone(),
            buffer: buffer.clone(),
            _entity: PhantomData,
        }
    }
}

impl Store for PgStore {
    type Work = PgWork;

    fn begin(&self) -> PgWork {
        let buffer = WriteBuffer::default();
        PgWork {
            customers: self.repository(&buffer),
            vehicle_models: self.repository(&buffer),
            vehicles: self.repository(&buffer),
            part_categories: self.repository(&buffer),
            parts: self.repository(&buffer),
            policies: self.repository(&buffer),
            coverage: self.repository(&buffer),
            work_orders: self.repository(&buffer),
            pool: self.pool.clone(),
            buffer,
        }
    }
}

/// Row mapping for one table.
pub(crate) trait PgTable: Staged {
    /// Column names in bind order, `id` first.
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &PgRow) -> sqlx::Result<Self>;

    /// Binds every column of [`PgTable::COLUMNS`], in order.
    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q>;

    fn select_sql(filter: &str) -> String {
        format!(
            "SELECT {} FROM {} {filter} ORDER BY created_at, id",
            Self::COLUMNS.join(", "),
            Self::TABLE
        )
    }

    fn insert_sql() -> String {
        let params: Vec<String> = (1..=Self::COLUMNS.len()).map(|i| format!("${i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            Self::TABLE,
            Self::COLUMNS.join(", "),
            params.join(", ")
        )
    }

    fn update_sql() -> String {
        let assignments: Vec<String> = Self::COLUMNS
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, column)| format!("{column} = ${}", i + 1))
            .collect();
        format!(
            "UPDATE {} SET {} WHERE id = $1",
            Self::TABLE,
            assignments.join(", ")
        )
    }
}

fn status_column<S: StatusSet>(row: &PgRow, column: &str) -> sqlx::Result<S> {
    let value: String = row.try_get(column)?;
    S::parse(&value).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("unknown status {value:?}, expected one of {}", S::allowed()).into(),
    })
}

fn id_column<I: EntityId>(row: &PgRow, column: &str) -> sqlx::Result<I> {
    Ok(I::from(row.try_get::<Uuid, _>(column)?))
}

impl PgTable for Customer {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "first_name",
        "last_name",
        "email",
        "phone",
        "address",
        "created_at",
        "updated_at",
        "deleted_at",
    ];

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(CustomerRecord {
            id: id_column::<CustomerId>(row, "id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        }
        .into())
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.id().as_uuid())
            .bind(self.first_name())
            .bind(self.last_name())
            .bind(self.email())
            .bind(self.phone())
            .bind(self.address())
            .bind(self.created_at())
            .bind(self.updated_at())
            .bind(self.deleted_at())
    }
}

impl PgTable for VehicleModel {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "brand",
        "model_name",
        "year",
        "description",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(VehicleModelRecord {
            id: id_column::<VehicleModelId>(row, "id")?,
            brand: row.try_get("brand")?,
            model_name: row.try_get("model_name")?,
            year: row.try_get("year")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }
        .into())
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.id().as_uuid())
            .bind(self.brand())
            .bind(self.model_name())
            .bind(self.year())
            .bind(self.description())
            .bind(self.created_at())
            .bind(self.updated_at())
    }
}

impl PgTable for Vehicle {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "vin",
        "license_plate",
        "customer_id",
        "model_id",
        "purchase_date",
        "mileage_km",
        "created_at",
        "updated_at",
        "deleted_at",
    ];

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(VehicleRecord {
            id: id_column::<VehicleId>(row, "id")?,
            vin: row.try_get("vin")?,
            license_plate: row.try_get("license_plate")?,
            customer_id: id_column(row, "customer_id")?,
            model_id: id_column(row, "model_id")?,
            purchase_date: row.try_get("purchase_date")?,
            mileage_km: row.try_get("mileage_km")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        }
        .into())
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.id().as_uuid())
            .bind(self.vin())
            .bind(self.license_plate())
            .bind(self.customer_id().as_uuid())
            .bind(self.model_id().as_uuid())
            .bind(self.purchase_date())
            .bind(self.mileage_km())
            .bind(self.created_at())
            .bind(self.updated_at())
            .bind(self.deleted_at())
    }
}

impl PgTable for PartCategory {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "parent_id",
        "is_active",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(PartCategoryRecord {
            id: id_column::<PartCategoryId>(row, "id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            parent_id: row
                .try_get::<Option<Uuid>, _>("parent_id")?
                .map(PartCategoryId::from_uuid),
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }
        .into())
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.id().as_uuid())
            .bind(self.name())
            .bind(self.description())
            .bind(self.parent_id().map(|id| id.as_uuid()))
            .bind(self.is_active())
            .bind(self.created_at())
            .bind(self.updated_at())
    }
}

impl PgTable for Part {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "part_number",
        "name",
        "serial_number",
        "category_id",
        "price_cents",
        "status",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(PartRecord {
            id: id_column::<PartId>(row, "id")?,
            part_number: row.try_get("part_number")?,
            name: row.try_get("name")?,
            serial_number: row.try_get("serial_number")?,
            category_id: id_column(row, "category_id")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            status: status_column(row, "status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }
        .into())
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.id().as_uuid())
            .bind(self.part_number())
            .bind(self.name())
            .bind(self.serial_number())
            .bind(self.category_id().as_uuid())
            .bind(self.price().cents())
            .bind(self.status().as_str())
            .bind(self.created_at())
            .bind(self.updated_at())
    }
}

impl PgTable for WarrantyPolicy {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "duration_months",
        "mileage_limit_km",
        "status",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(WarrantyPolicyRecord {
            id: id_column::<WarrantyPolicyId>(row, "id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            duration_months: row.try_get("duration_months")?,
            mileage_limit_km: row.try_get("mileage_limit_km")?,
            status: status_column(row, "status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }
        .into())
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.id().as_uuid())
            .bind(self.name())
            .bind(self.description())
            .bind(self.duration_months())
            .bind(self.mileage_limit_km())
            .bind(self.status().as_str())
            .bind(self.created_at())
            .bind(self.updated_at())
    }
}

impl PgTable for PolicyCoveragePart {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "policy_id",
        "category_id",
        "coverage_percent",
        "max_claim_amount_cents",
        "notes",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        let percent: i16 = row.try_get("coverage_percent")?;
        let coverage_percent =
            u8::try_from(percent).map_err(|e| sqlx::Error::ColumnDecode {
                index: "coverage_percent".to_string(),
                source: Box::new(e),
            })?;
        Ok(PolicyCoveragePartRecord {
            id: id_column::<CoverageId>(row, "id")?,
            policy_id: id_column(row, "policy_id")?,
            category_id: id_column(row, "category_id")?,
            coverage_percent,
            max_claim_amount: row
                .try_get::<Option<i64>, _>("max_claim_amount_cents")?
                .map(Money::from_cents),
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }
        .into())
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.id().as_uuid())
            .bind(self.policy_id().as_uuid())
            .bind(self.category_id().as_uuid())
            .bind(i16::from(self.coverage_percent()))
            .bind(self.max_claim_amount().map(|m| m.cents()))
            .bind(self.notes())
            .bind(self.created_at())
            .bind(self.updated_at())
    }
}

impl PgTable for WorkOrder {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "claim_id",
        "technician_id",
        "description",
        "status",
        "started_at",
        "completed_at",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(WorkOrderRecord {
            id: id_column::<WorkOrderId>(row, "id")?,
            claim_id: id_column(row, "claim_id")?,
            technician_id: id_column(row, "technician_id")?,
            description: row.try_get("description")?,
            status: status_column(row, "status")?,
            started_at: row.try_get("started_at")?,
            completed_at: row.try_get("completed_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }
        .into())
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.id().as_uuid())
            .bind(self.claim_id().as_uuid())
            .bind(self.technician_id().as_uuid())
            .bind(self.description())
            .bind(self.status().as_str())
            .bind(self.started_at())
            .bind(self.completed_at())
            .bind(self.created_at())
            .bind(self.updated_at())
    }
}

/// Maps constraint violations to their typed [`StoreError`] variants.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && let Some(constraint) = db_err.constraint()
    {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation {
                constraint: constraint.to_string(),
            };
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::ForeignKeyViolation {
                constraint: constraint.to_string(),
            };
        }
    }
    StoreError::Database(err)
}

async fn apply_op<E: PgTable>(conn: &mut PgConnection, op: WriteOp<E>) -> Result<()> {
    let (id, affected) = match &op {
        WriteOp::Insert(entity) => {
            let sql = E::insert_sql();
            let result = entity
                .bind_columns(sqlx::query(&sql))
                .execute(&mut *conn)
                .await
                .map_err(map_write_error)?;
            (entity.id(), result.rows_affected())
        }
        WriteOp::Update(entity) => {
            let sql = E::update_sql();
            let result = entity
                .bind_columns(sqlx::query(&sql))
                .execute(&mut *conn)
                .await
                .map_err(map_write_error)?;
            (entity.id(), result.rows_affected())
        }
        WriteOp::Delete(id) => {
            let sql = format!("DELETE FROM {} WHERE id = $1", E::TABLE);
            let result = sqlx::query(&sql)
                .bind(id.as_uuid())
                .execute(&mut *conn)
                .await
                .map_err(map_write_error)?;
            (*id, result.rows_affected())
        }
    };

    if affected == 0 {
        return Err(StoreError::RowNotFound {
            entity: E::NAME,
            id: id.to_string(),
        });
    }
    Ok(())
}

async fn apply(conn: &mut PgConnection, write: PendingWrite) -> Result<()> {
    match write {
        PendingWrite::Customer(op) => apply_op(conn, op).await,
        PendingWrite::VehicleModel(op) => apply_op(conn, op).await,
        PendingWrite::Vehicle(op) => apply_op(conn, op).await,
        PendingWrite::PartCategory(op) => apply_op(conn, op).await,
        PendingWrite::Part(op) => apply_op(conn, op).await,
        PendingWrite::Policy(op) => apply_op(conn, op).await,
        PendingWrite::Coverage(op) => apply_op(conn, op).await,
        PendingWrite::WorkOrder(op) => apply_op(conn, op).await,
    }
}

/// Repository over one PostgreSQL table.
pub struct PgRepository<E> {
    pool: PgPool,
    buffer: WriteBuffer,
    _entity: PhantomData<fn() -> E>,
}

impl<E: PgTable> PgRepository<E> {
    async fn fetch_all(&self, query: PgQuery<'_>) -> Result<Vec<E>> {
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(E::from_row).collect::<sqlx::Result<_>>()?)
    }

    async fn fetch_optional(&self, query: PgQuery<'_>) -> Result<Option<E>> {
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(E::from_row).transpose()?)
    }

    async fn count(&self, sql: &str, id: Uuid) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl<E: PgTable> Repository<E> for PgRepository<E> {
    async fn get_by_id(&self, id: E::Id) -> Result<Option<E>> {
        let sql = E::select_sql("WHERE id = $1");
        self.fetch_optional(sqlx::query(&sql).bind(id.as_uuid()))
            .await
    }

    async fn list(&self) -> Result<Vec<E>> {
        let sql = E::select_sql("");
        self.fetch_all(sqlx::query(&sql)).await
    }

    async fn add(&self, entity: E) -> Result<()> {
        self.buffer.push(WriteOp::Insert(entity));
        Ok(())
    }

    async fn update(&self, entity: E) -> Result<()> {
        self.buffer.push(WriteOp::Update(entity));
        Ok(())
    }

    async fn remove(&self, id: E::Id) -> Result<()> {
        self.buffer.push(WriteOp::<E>::Delete(id));
        Ok(())
    }
}

/// Escapes `LIKE` wildcards so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl CustomerRepository for PgRepository<Customer> {
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let sql = Customer::select_sql("WHERE email = $1");
        self.fetch_optional(sqlx::query(&sql).bind(email)).await
    }

    async fn search(&self, term: &str) -> Result<Vec<Customer>> {
        let sql = Customer::select_sql(
            "WHERE first_name ILIKE $1 OR last_name ILIKE $1 OR email ILIKE $1",
        );
        self.fetch_all(sqlx::query(&sql).bind(like_pattern(term)))
            .await
    }
}

#[async_trait]
impl VehicleModelRepository for PgRepository<VehicleModel> {
    async fn find_by_identity(
        &self,
        brand: &str,
        model_name: &str,
        year: i32,
    ) -> Result<Option<VehicleModel>> {
        let sql = VehicleModel::select_sql("WHERE brand = $1 AND model_name = $2 AND year = $3");
        self.fetch_optional(sqlx::query(&sql).bind(brand).bind(model_name).bind(year))
            .await
    }

    async fn count_vehicles(&self, model_id: VehicleModelId) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM vehicles WHERE model_id = $1",
            model_id.as_uuid(),
        )
        .await
    }
}

#[async_trait]
impl VehicleRepository for PgRepository<Vehicle> {
    async fn find_by_vin(&self, vin: &str) -> Result<Option<Vehicle>> {
        let sql = Vehicle::select_sql("WHERE vin = $1");
        self.fetch_optional(sqlx::query(&sql).bind(vin)).await
    }

    async fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Vehicle>> {
        let sql = Vehicle::select_sql("WHERE customer_id = $1 AND deleted_at IS NULL");
        self.fetch_all(sqlx::query(&sql).bind(customer_id.as_uuid()))
            .await
    }

    async fn count_active_by_customer(&self, customer_id: CustomerId) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM vehicles WHERE customer_id = $1 AND deleted_at IS NULL",
            customer_id.as_uuid(),
        )
        .await
    }
}

#[async_trait]
impl PartCategoryRepository for PgRepository<PartCategory> {
    async fn find_by_name(&self, name: &str) -> Result<Option<PartCategory>> {
        let sql = PartCategory::select_sql("WHERE name = $1");
        self.fetch_optional(sqlx::query(&sql).bind(name)).await
    }

    async fn list_children(&self, parent_id: PartCategoryId) -> Result<Vec<PartCategory>> {
        let sql = PartCategory::select_sql("WHERE parent_id = $1");
        self.fetch_all(sqlx::query(&sql).bind(parent_id.as_uuid()))
            .await
    }

    async fn count_children(&self, parent_id: PartCategoryId) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM part_categories WHERE parent_id = $1",
            parent_id.as_uuid(),
        )
        .await
    }
}

#[async_trait]
impl PartRepository for PgRepository<Part> {
    async fn find_by_serial(&self, serial_number: &str) -> Result<Option<Part>> {
        let sql = Part::select_sql("WHERE serial_number = $1");
        self.fetch_optional(sqlx::query(&sql).bind(serial_number))
            .await
    }

    async fn list_by_category(&self, category_id: PartCategoryId) -> Result<Vec<Part>> {
        let sql = Part::select_sql("WHERE category_id = $1");
        self.fetch_all(sqlx::query(&sql).bind(category_id.as_uuid()))
            .await
    }

    async fn count_active_in_category(&self, category_id: PartCategoryId) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM parts WHERE category_id = $1 AND status <> 'Retired'",
            category_id.as_uuid(),
        )
        .await
    }

    async fn count_in_category(&self, category_id: PartCategoryId) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM parts WHERE category_id = $1",
            category_id.as_uuid(),
        )
        .await
    }
}

#[async_trait]
impl WarrantyPolicyRepository for PgRepository<WarrantyPolicy> {
    async fn find_by_name(&self, name: &str) -> Result<Option<WarrantyPolicy>> {
        let sql = WarrantyPolicy::select_sql("WHERE name = $1");
        self.fetch_optional(sqlx::query(&sql).bind(name)).await
    }

    async fn list_by_status(&self, status: PolicyStatus) -> Result<Vec<WarrantyPolicy>> {
        let sql = WarrantyPolicy::select_sql("WHERE status = $1");
        self.fetch_all(sqlx::query(&sql).bind(status.as_str()))
            .await
    }
}

#[async_trait]
impl CoverageRepository for PgRepository<PolicyCoveragePart> {
    async fn list_by_policy(
        &self,
        policy_id: WarrantyPolicyId,
    ) -> Result<Vec<PolicyCoveragePart>> {
        let sql = PolicyCoveragePart::select_sql("WHERE policy_id = $1");
        self.fetch_all(sqlx::query(&sql).bind(policy_id.as_uuid()))
            .await
    }

    async fn find_by_policy_and_category(
        &self,
        policy_id: WarrantyPolicyId,
        category_id: PartCategoryId,
    ) -> Result<Option<PolicyCoveragePart>> {
        let sql = PolicyCoveragePart::select_sql("WHERE policy_id = $1 AND category_id = $2");
        self.fetch_optional(
            sqlx::query(&sql)
                .bind(policy_id.as_uuid())
                .bind(category_id.as_uuid()),
        )
        .await
    }

    async fn count_by_policy(&self, policy_id: WarrantyPolicyId) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM policy_coverage_parts WHERE policy_id = $1",
            policy_id.as_uuid(),
        )
        .await
    }

    async fn count_by_category(&self, category_id: PartCategoryId) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM policy_coverage_parts WHERE category_id = $1",
            category_id.as_uuid(),
        )
        .await
    }
}

#[async_trait]
impl WorkOrderRepository for PgRepository<WorkOrder> {
    async fn list_by_claim(&self, claim_id: ClaimId) -> Result<Vec<WorkOrder>> {
        let sql = WorkOrder::select_sql("WHERE claim_id = $1");
        self.fetch_all(sqlx::query(&sql).bind(claim_id.as_uuid()))
            .await
    }

    async fn list_by_technician(&self, technician_id: TechnicianId) -> Result<Vec<WorkOrder>> {
        let sql = WorkOrder::select_sql("WHERE technician_id = $1");
        self.fetch_all(sqlx::query(&sql).bind(technician_id.as_uuid()))
            .await
    }
}

/// Unit of work over a [`PgStore`]. Staged writes run in one transaction.
pub struct PgWork {
    customers: PgRepository<Customer>,
    vehicle_models: PgRepository<VehicleModel>,
    vehicles: PgRepository<Vehicle>,
    part_categories: PgRepository<PartCategory>,
    parts: PgRepository<Part>,
    policies: PgRepository<WarrantyPolicy>,
    coverage: PgRepository<PolicyCoveragePart>,
    work_orders: PgRepository<WorkOrder>,
    pool: PgPool,
    buffer: WriteBuffer,
}

#[async_trait]
impl UnitOfWork for PgWork {
    type Customers = PgRepository<Customer>;
    type VehicleModels = PgRepository<VehicleModel>;
    type Vehicles = PgRepository<Vehicle>;
    type PartCategories = PgRepository<PartCategory>;
    type Parts = PgRepository<Part>;
    type Policies = PgRepository<WarrantyPolicy>;
    type Coverage = PgRepository<PolicyCoveragePart>;
    type WorkOrders = PgRepository<WorkOrder>;

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

        let count = writes.len();
        let mut tx = self.pool.begin().await?;
        for write in writes {
            apply(&mut *tx, write).await?;
        }
        tx.commit().await?;
        tracing::debug!(writes = count, "committed unit of work");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_sql_lists_every_column() {
        assert_eq!(
            VehicleModel::insert_sql(),
            "INSERT INTO vehicle_models \
             (id, brand, model_name, year, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)"
        );
    }

    #[test]
    fn update_sql_skips_the_key() {
        assert_eq!(
            VehicleModel::update_sql(),
            "UPDATE vehicle_models SET brand = $2, model_name = $3, year = $4, description = $5, \
             created_at = $6, updated_at = $7 WHERE id = $1"
        );
    }

    #[test]
    fn select_sql_orders_by_creation() {
        assert_eq!(
            Part::select_sql("WHERE category_id = $1"),
            "SELECT id, part_number, name, serial_number, category_id, price_cents, status, \
             created_at, updated_at FROM parts WHERE category_id = $1 ORDER BY created_at, id"
        );
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
