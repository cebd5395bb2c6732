//! Persistence for the warranty back office.
//!
//! Services talk to a [`Store`], which hands out one [`UnitOfWork`] per
//! operation. Reads go straight to the backing storage; writes are staged
//! and applied atomically by [`UnitOfWork::commit`]. Two backends share the
//! same traits: [`MemoryStore`] for tests and local runs, [`PgStore`] for
//! PostgreSQL.

pub mod constraints;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod store;

mod pending;

pub use error::{Result, StoreError};
pub use memory::{MemoryRepository, MemoryStore, MemoryWork};
pub use pending::WriteKind;
pub use postgres::{PgRepository, PgStore, PgWork};
pub use repository::{
    CoverageRepository, CustomerRepository, PartCategoryRepository, PartRepository, Repository,
    VehicleModelRepository, VehicleRepository, WarrantyPolicyRepository, WorkOrderRepository,
};
pub use store::{Store, UnitOfWork};
