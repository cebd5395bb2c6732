//! Vehicle aggregate.

use chrono::{DateTime, NaiveDate, Utc};
use common::{CustomerId, VehicleId, VehicleModelId};

use crate::entity::Entity;
use crate::error::DomainError;
use crate::validate;

const PLATE_MAX: usize = 15;
const VIN_LEN: usize = 17;

/// A customer's vehicle, identified by its VIN.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    id: VehicleId,
    vin: String,
    license_plate: Option<String>,
    customer_id: CustomerId,
    model_id: VehicleModelId,
    purchase_date: Option<NaiveDate>,
    mileage_km: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

/// Stored representation of a [`Vehicle`].
#[derive(Debug, Clone)]
pub struct VehicleRecord {
    pub id: VehicleId,
    pub vin: String,
    pub license_plate: Option<String>,
    pub customer_id: CustomerId,
    pub model_id: VehicleModelId,
    pub purchase_date: Option<NaiveDate>,
    pub mileage_km: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<VehicleRecord> for Vehicle {
    fn from(r: VehicleRecord) -> Self {
        Self {
            id: r.id,
            vin: r.vin,
            license_plate: r.license_plate,
            customer_id: r.customer_id,
            model_id: r.model_id,
            purchase_date: r.purchase_date,
            mileage_km: r.mileage_km,
            created_at: r.created_at,
            updated_at: r.updated_at,
            deleted_at: r.deleted_at,
        }
    }
}

impl Entity for Vehicle {
    type Id = VehicleId;
    const NAME: &'static str = "Vehicle";

    fn id(&self) -> VehicleId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Uppercases a VIN and checks it is 17 characters from the VIN alphabet.
pub fn normalize_vin(vin: &str) -> Result<String, DomainError> {
    let vin = validate::required("vin", vin, VIN_LEN)?.to_uppercase();
    let valid = vin.len() == VIN_LEN
        && vin
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && !matches!(c, 'I' | 'O' | 'Q'));
    if !valid {
        return Err(DomainError::InvalidVin(vin));
    }
    Ok(vin)
}

impl Vehicle {
    pub fn new(
        vin: &str,
        customer_id: CustomerId,
        model_id: VehicleModelId,
        license_plate: Option<&str>,
        purchase_date: Option<NaiveDate>,
        mileage_km: i64,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();
        Ok(Self {
            id: VehicleId::new(),
            vin: normalize_vin(vin)?,
            license_plate: validate::optional("license_plate", license_plate, PLATE_MAX)?,
            customer_id,
            model_id,
            purchase_date,
            mileage_km: validate::non_negative("mileage_km", mileage_km)?,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    pub fn vin(&self) -> &str {
        &self.vin
    }

    pub fn license_plate(&self) -> Option<&str> {
        self.license_plate.as_deref()
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn model_id(&self) -> VehicleModelId {
        self.model_id
    }

    pub fn purchase_date(&self) -> Option<NaiveDate> {
        self.purchase_date
    }

    pub fn mileage_km(&self) -> i64 {
        self.mileage_km
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Records a new odometer reading. Readings never go backwards.
    pub fn record_mileage(&mut self, mileage_km: i64) -> Result<(), DomainError> {
        let mileage_km = validate::non_negative("mileage_km", mileage_km)?;
        if mileage_km < self.mileage_km {
            return Err(DomainError::MileageDecrease {
                current: self.mileage_km,
                requested: mileage_km,
            });
        }
        self.mileage_km = mileage_km;
        self.touch();
        Ok(())
    }

    pub fn change_license_plate(&mut self, plate: Option<&str>) -> Result<(), DomainError> {
        self.license_plate = validate::optional("license_plate", plate, PLATE_MAX)?;
        self.touch();
        Ok(())
    }

    pub fn change_purchase_date(&mut self, purchase_date: Option<NaiveDate>) {
        self.purchase_date = purchase_date;
        self.touch();
    }

    pub fn change_model(&mut self, model_id: VehicleModelId) {
        self.model_id = model_id;
        self.touch();
    }

    /// Moves ownership to another customer.
    pub fn transfer_to(&mut self, customer_id: CustomerId) {
        self.customer_id = customer_id;
        self.touch();
    }

    pub fn soft_delete(&mut self) -> Result<(), DomainError> {
        if self.is_deleted() {
            return Err(DomainError::AlreadyDeleted { entity: Self::NAME });
        }
        let now = Utc::now();
        self.deleted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn restore(&mut self) -> Result<(), DomainError> {
        if !self.is_deleted() {
            return Err(DomainError::NotDeleted { entity: Self::NAME });
        }
        self.deleted_at = None;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
