//! Customer aggregate.

use chrono::{DateTime, Utc};
use common::CustomerId;

use crate::entity::Entity;
use crate::error::DomainError;
use crate::validate;

const NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 255;
const PHONE_MAX: usize = 20;
const ADDRESS_MAX: usize = 255;

/// A vehicle owner.
///
/// Customers are soft-deleted: `deleted_at` is set instead of removing the
/// row, and [`Customer::restore`] clears it again.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    id: CustomerId,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    address: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

/// Stored representation of a [`Customer`], used by repositories.
#[derive(Debug, Clone)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<CustomerRecord> for Customer {
    fn from(r: CustomerRecord) -> Self {
        Self {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            phone: r.phone,
            address: r.address,
            created_at: r.created_at,
            updated_at: r.updated_at,
            deleted_at: r.deleted_at,
        }
    }
}

impl Entity for Customer {
    type Id = CustomerId;
    const NAME: &'static str = "Customer";

    fn id(&self) -> CustomerId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Normalizes an email address to lowercase and checks its shape.
pub fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = validate::required("email", email, EMAIL_MAX)?.to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
                && domain
                    .rsplit_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::InvalidEmail(email));
    }
    Ok(email)
}

impl Customer {
    /// Creates a new customer after validating every field.
    pub fn new(
        first_name: &str,
        last_name: &str,
        email: &str,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();
        Ok(Self {
            id: CustomerId::new(),
            first_name: validate::required("first_name", first_name, NAME_MAX)?,
            last_name: validate::required("last_name", last_name, NAME_MAX)?,
            email: normalize_email(email)?,
            phone: validate::optional("phone", phone, PHONE_MAX)?,
            address: validate::optional("address", address, ADDRESS_MAX)?,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns true if the customer has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn change_name(&mut self, first_name: &str, last_name: &str) -> Result<(), DomainError> {
        let first_name = validate::required("first_name", first_name, NAME_MAX)?;
        let last_name = validate::required("last_name", last_name, NAME_MAX)?;
        self.first_name = first_name;
        self.last_name = last_name;
        self.touch();
        Ok(())
    }

    pub fn change_email(&mut self, email: &str) -> Result<(), DomainError> {
        self.email = normalize_email(email)?;
        self.touch();
        Ok(())
    }

    /// Replaces phone and address. Blank values clear the field.
    pub fn change_contact(
        &mut self,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<(), DomainError> {
        let phone = validate::optional("phone", phone, PHONE_MAX)?;
        let address = validate::optional("address", address, ADDRESS_MAX)?;
        self.phone = phone;
        self.address = address;
        self.touch();
        Ok(())
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
