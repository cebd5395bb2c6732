//! Vehicle model catalogue entries.

use chrono::{DateTime, Utc};
use common::VehicleModelId;

use crate::entity::Entity;
use crate::error::DomainError;
use crate::validate;

const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;
pub const YEAR_MIN: i32 = 1900;
pub const YEAR_MAX: i32 = 2100;

/// A brand / model / year combination. The triple is unique.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleModel {
    id: VehicleModelId,
    brand: String,
    model_name: String,
    year: i32,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored representation of a [`VehicleModel`].
#[derive(Debug, Clone)]
pub struct VehicleModelRecord {
    pub id: VehicleModelId,
    pub brand: String,
    pub model_name: String,
    pub year: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VehicleModelRecord> for VehicleModel {
    fn from(r: VehicleModelRecord) -> Self {
        Self {
            id: r.id,
            brand: r.brand,
            model_name: r.model_name,
            year: r.year,
            description: r.description,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl Entity for VehicleModel {
    type Id = VehicleModelId;
    const NAME: &'static str = "Vehicle model";

    fn id(&self) -> VehicleModelId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn check_year(year: i32) -> Result<i32, DomainError> {
    validate::in_range("year", i64::from(year), i64::from(YEAR_MIN), i64::from(YEAR_MAX))?;
    Ok(year)
}

impl VehicleModel {
    pub fn new(
        brand: &str,
        model_name: &str,
        year: i32,
        description: Option<&str>,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();
        Ok(Self {
            id: VehicleModelId::new(),
            brand: validate::required("brand", brand, NAME_MAX)?,
            model_name: validate::required("model_name", model_name, NAME_MAX)?,
            year: check_year(year)?,
            description: validate::optional("description", description, DESCRIPTION_MAX)?,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Display label such as "Toyota Corolla 2021".
    pub fn label(&self) -> String {
        format!("{} {} {}", self.brand, self.model_name, self.year)
    }

    /// Replaces brand, model name and year together.
    pub fn change_identity(
        &mut self,
        brand: &str,
        model_name: &str,
        year: i32,
    ) -> Result<(), DomainError> {
        let brand = validate::required("brand", brand, NAME_MAX)?;
        let model_name = validate::required("model_name", model_name, NAME_MAX)?;
        self.year = check_year(year)?;
        self.brand = brand;
        self.model_name = model_name;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn change_description(&mut self, description: Option<&str>) -> Result<(), DomainError> {
        self.description = validate::optional("description", description, DESCRIPTION_MAX)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_fields() {
        let model = VehicleModel::new(" Toyota ", "Corolla", 2021, None).unwrap();
        assert_eq!(model.brand(), "Toyota");
        assert_eq!(model.label(), "Toyota Corolla 2021");
    }

    #[test]
    fn year_out_of_range_is_rejected() {
        let err = VehicleModel::new("Ford", "Model T", 1899, None).unwrap_err();
        assert_eq!(err.code().as_str(), "VALUE_OUT_OF_RANGE");
    }

    #[test]
    fn failed_identity_change_leaves_entity_untouched() {
        let mut model = VehicleModel::new("Honda", "Civic", 2020, None).unwrap();
        assert!(model.change_identity("Honda", "", 2022).is_err());
        assert_eq!(model.model_name(), "Civic");
        assert_eq!(model.year(), 2020);
    }
}
