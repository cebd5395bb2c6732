//! Part aggregate and its status set.

use chrono::{DateTime, Utc};
use common::{Money, PartCategoryId, PartId};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, StatusSet};
use crate::error::DomainError;
use crate::validate;

const PART_NUMBER_MAX: usize = 50;
const NAME_MAX: usize = 200;
const SERIAL_MAX: usize = 100;

/// Where a physical part currently is.
///
/// Any status may follow any other, except that `Retired` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PartStatus {
    /// In stock.
    #[default]
    Available,
    /// Held for a pending repair.
    Reserved,
    /// Fitted to a vehicle.
    Installed,
    /// Found faulty, awaiting return.
    Defective,
    /// Written off (terminal).
    Retired,
}

impl StatusSet for PartStatus {
    const ALL: &'static [Self] = &[
        PartStatus::Available,
        PartStatus::Reserved,
        PartStatus::Installed,
        PartStatus::Defective,
        PartStatus::Retired,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            PartStatus::Available => "Available",
            PartStatus::Reserved => "Reserved",
            PartStatus::Installed => "Installed",
            PartStatus::Defective => "Defective",
            PartStatus::Retired => "Retired",
        }
    }
}

impl PartStatus {
    /// Parts count as active for their category until retired.
    pub fn is_active(&self) -> bool {
        !matches!(self, PartStatus::Retired)
    }
}

impl std::fmt::Display for PartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A serialized physical part.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    id: PartId,
    part_number: String,
    name: String,
    serial_number: String,
    category_id: PartCategoryId,
    price: Money,
    status: PartStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored representation of a [`Part`].
#[derive(Debug, Clone)]
pub struct PartRecord {
    pub id: PartId,
    pub part_number: String,
    pub name: String,
    pub serial_number: String,
    pub category_id: PartCategoryId,
    pub price: Money,
    pub status: PartStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PartRecord> for Part {
    fn from(r: PartRecord) -> Self {
        Self {
            id: r.id,
            part_number: r.part_number,
            name: r.name,
            serial_number: r.serial_number,
            category_id: r.category_id,
            price: r.price,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl Entity for Part {
    type Id = PartId;
    const NAME: &'static str = "Part";

    fn id(&self) -> PartId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn check_price(price: Money) -> Result<Money, DomainError> {
    validate::amount("price", price)
}

/// Trims a serial number and checks its length.
pub fn normalize_serial(serial_number: &str) -> Result<String, DomainError> {
    validate::required("serial_number", serial_number, SERIAL_MAX)
}

impl Part {
    /// Creates an `Available` part.
    pub fn new(
        part_number: &str,
        name: &str,
        serial_number: &str,
        category_id: PartCategoryId,
        price: Money,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();
        Ok(Self {
            id: PartId::new(),
            part_number: validate::required("part_number", part_number, PART_NUMBER_MAX)?,
            name: validate::required("name", name, NAME_MAX)?,
            serial_number: normalize_serial(serial_number)?,
            category_id,
            price: check_price(price)?,
            status: PartStatus::Available,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn part_number(&self) -> &str {
        &self.part_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn category_id(&self) -> PartCategoryId {
        self.category_id
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn status(&self) -> PartStatus {
        self.status
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn rename(&mut self, name: &str) -> Result<(), DomainError> {
        self.name = validate::required("name", name, NAME_MAX)?;
        self.touch();
        Ok(())
    }

    pub fn change_part_number(&mut self, part_number: &str) -> Result<(), DomainError> {
        self.part_number = validate::required("part_number", part_number, PART_NUMBER_MAX)?;
        self.touch();
        Ok(())
    }

    pub fn change_price(&mut self, price: Money) -> Result<(), DomainError> {
        self.price = check_price(price)?;
        self.touch();
        Ok(())
    }

    pub fn change_category(&mut self, category_id: PartCategoryId) {
        self.category_id = category_id;
        self.touch();
    }

    pub fn change_status(&mut self, status: PartStatus) -> Result<(), DomainError> {
        if self.status == PartStatus::Retired && status != PartStatus::Retired {
            return Err(DomainError::PartRetired {
                serial_number: self.serial_number.clone(),
            });
        }
        self.status = status;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part() -> Part {
        Part::new("BP-100", "Brake pad", "SN-0001", PartCategoryId::new(), Money::from_cents(4500))
            .unwrap()
    }

    #[test]
    fn new_part_is_available() {
        assert_eq!(part().status(), PartStatus::Available);
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(PartStatus::parse("reserved"), Some(PartStatus::Reserved));
        assert_eq!(PartStatus::parse(" INSTALLED "), Some(PartStatus::Installed));
        assert_eq!(PartStatus::parse("Lost"), None);
    }

    #[test]
    fn allowed_lists_every_status() {
        assert_eq!(
            PartStatus::allowed(),
            "Available, Reserved, Installed, Defective, Retired"
        );
    }

    #[test]
    fn any_status_may_follow_any_other_until_retired() {
        let mut part = part();
        part.change_status(PartStatus::Installed).unwrap();
        part.change_status(PartStatus::Available).unwrap();
        part.change_status(PartStatus::Retired).unwrap();

        let err = part.change_status(PartStatus::Available).unwrap_err();
        assert_eq!(err.code().as_str(), "PART_RETIRED");
        assert_eq!(part.status(), PartStatus::Retired);
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut part = part();
        assert!(part.change_price(Money::from_cents(-1)).is_err());
        assert_eq!(part.price(), Money::from_cents(4500));

        let err = part
            .change_price(Money::from_cents(crate::MAX_AMOUNT_CENTS + 1))
            .unwrap_err();
        assert_eq!(err.code().as_str(), "VALUE_OUT_OF_RANGE");
        assert!(part.change_price(Money::from_cents(crate::MAX_AMOUNT_CENTS)).is_ok());
    }

    #[test]
    fn retired_parts_are_not_active() {
        assert!(PartStatus::Installed.is_active());
        assert!(!PartStatus::Retired.is_active());
    }
}
