//! Claims and technician lookup, owned by the claims service.
//!
//! Work orders reference claims and technicians that live elsewhere; this
//! module is the seam to that system plus an in-memory stand-in.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::{ClaimId, TechnicianId, VehicleId};
use thiserror::Error;

/// Errors from the claims directory.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The directory could not be reached.
    #[error("Claims directory unavailable: {0}")]
    Unavailable(String),
}

/// A warranty claim as seen by the back office.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimRecord {
    pub id: ClaimId,
    pub claim_number: String,
    pub vehicle_id: VehicleId,
}

/// A technician who can be assigned work orders.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnicianRecord {
    pub id: TechnicianId,
    pub name: String,
    pub is_active: bool,
}

/// Read access to claims and technicians.
#[async_trait]
pub trait ClaimDirectory: Send + Sync + 'static {
    async fn find_claim(&self, id: ClaimId) -> Result<Option<ClaimRecord>, LookupError>;

    async fn find_technician(
        &self,
        id: TechnicianId,
    ) -> Result<Option<TechnicianRecord>, LookupError>;
}

#[derive(Debug, Default)]
struct DirectoryState {
    claims: HashMap<ClaimId, ClaimRecord>,
    technicians: HashMap<TechnicianId, TechnicianRecord>,
    unavailable: bool,
}

/// In-memory claims directory for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClaimDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

impl InMemoryClaimDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a claim and returns its id.
    pub fn add_claim(&self, claim_number: &str, vehicle_id: VehicleId) -> ClaimId {
        let id = ClaimId::new();
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .claims
            .insert(
                id,
                ClaimRecord {
                    id,
                    claim_number: claim_number.to_string(),
                    vehicle_id,
                },
            );
        id
    }

    /// Registers a technician and returns its id.
    pub fn add_technician(&self, name: &str, is_active: bool) -> TechnicianId {
        let id = TechnicianId::new();
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .technicians
            .insert(
                id,
                TechnicianRecord {
                    id,
                    name: name.to_string(),
                    is_active,
                },
            );
        id
    }

    /// Makes every lookup fail with [`LookupError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unavailable = unavailable;
    }

    fn read<T>(&self, f: impl FnOnce(&DirectoryState) -> T) -> Result<T, LookupError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.unavailable {
            return Err(LookupError::Unavailable(
                "in-memory directory is offline".to_string(),
            ));
        }
        Ok(f(&state))
    }
}

#[async_trait]
impl ClaimDirectory for InMemoryClaimDirectory {
    async fn find_claim(&self, id: ClaimId) -> Result<Option<ClaimRecord>, LookupError> {
        self.read(|state| state.claims.get(&id).cloned())
    }

    async fn find_technician(
        &self,
        id: TechnicianId,
    ) -> Result<Option<TechnicianRecord>, LookupError> {
        self.read(|state| state.technicians.get(&id).cloned())
    }
}
