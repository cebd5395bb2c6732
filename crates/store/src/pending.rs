use std::sync::{Arc, Mutex, PoisonError};

use domain::{
    Customer, Entity, Part, PartCategory, PolicyCoveragePart, Vehicle, VehicleModel,
    WarrantyPolicy, WorkOrder,
};

/// Kind of a staged write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    Insert,
    Update,
    Delete,
}

/// A write against one table, waiting for commit.
#[derive(Debug, Clone)]
pub(crate) enum WriteOp<E: Entity> {
    Insert(E),
    Update(E),
    Delete(E::Id),
}

impl<E: Entity> WriteOp<E> {
    pub(crate) fn kind(&self) -> WriteKind {
        match self {
            Self::Insert(_) => WriteKind::Insert,
            Self::Update(_) => WriteKind::Update,
            Self::Delete(_) => WriteKind::Delete,
        }
    }
}

/// A staged write tagged with its table.
#[derive(Debug, Clone)]
pub(crate) enum PendingWrite {
    Customer(WriteOp<Customer>),
    VehicleModel(WriteOp<VehicleModel>),
    Vehicle(WriteOp<Vehicle>),
    PartCategory(WriteOp<PartCategory>),
    Part(WriteOp<Part>),
    Policy(WriteOp<WarrantyPolicy>),
    Coverage(WriteOp<PolicyCoveragePart>),
    WorkOrder(WriteOp<WorkOrder>),
}

/// Entities that can be staged in a [`WriteBuffer`].
pub(crate) trait Staged: Entity + std::fmt::Debug {
    /// Backing table name.
    const TABLE: &'static str;

    fn stage(op: WriteOp<Self>) -> PendingWrite;
}

macro_rules! staged {
    ($entity:ty, $variant:ident, $table:literal) => {
        impl Staged for $entity {
            const TABLE: &'static str = $table;

            fn stage(op: WriteOp<Self>) -> PendingWrite {
                PendingWrite::$variant(op)
            }
        }
    };
}

staged!(Customer, Customer, "customers");
staged!(VehicleModel, VehicleModel, "vehicle_models");
staged!(Vehicle, Vehicle, "vehicles");
staged!(PartCategory, PartCategory, "part_categories");
staged!(Part, Part, "parts");
staged!(WarrantyPolicy, Policy, "warranty_policies");
staged!(PolicyCoveragePart, Coverage, "policy_coverage_parts");
staged!(WorkOrder, WorkOrder, "work_orders");

/// Writes staged by the repositories of one unit of work, in call order.
#[derive(Debug, Clone, Default)]
pub(crate) struct WriteBuffer(Arc<Mutex<Vec<PendingWrite>>>);

impl WriteBuffer {
    pub(crate) fn push<E: Staged>(&self, op: WriteOp<E>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(E::stage(op));
    }

    /// Takes every staged write, leaving the buffer empty.
    pub(crate) fn drain(&self) -> Vec<PendingWrite> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
