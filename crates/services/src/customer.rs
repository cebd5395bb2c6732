//! Customer service.

use chrono::{DateTime, Utc};
use common::{CustomerId, ErrorCode, ServiceResponse};
use domain::{Customer, Entity};
use serde::{Deserialize, Serialize};
use store::constraints;
use store::{CustomerRepository, Repository, Store, UnitOfWork, VehicleRepository};

use crate::error::{Result, ServiceError, on_conflict, respond};

fn duplicate_email(email: &str) -> ServiceError {
    ServiceError::rejected(
        ErrorCode::DUPLICATE_EMAIL,
        format!("A customer with email '{email}' already exists"),
    )
}

/// Rejection for a constraint the customer row violated at commit.
fn conflict(constraint: &str, customer: &Customer) -> Option<ServiceError> {
    (constraint == constraints::CUSTOMERS_EMAIL).then(|| duplicate_email(customer.email()))
}

/// Customer as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDto {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&Customer> for CustomerDto {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id(),
            first_name: customer.first_name().to_string(),
            last_name: customer.last_name().to_string(),
            full_name: customer.full_name(),
            email: customer.email().to_string(),
            phone: customer.phone().map(str::to_string),
            address: customer.address().map(str::to_string),
            is_deleted: customer.is_deleted(),
            created_at: customer.created_at(),
            updated_at: customer.updated_at(),
            deleted_at: customer.deleted_at(),
        }
    }
}

/// Fields for creating or replacing a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Filters for [`CustomerService::list`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerFilter {
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(default)]
    pub search: Option<String>,
}

/// Registers customers and manages their soft-delete lifecycle.
#[derive(Clone)]
pub struct CustomerService<S> {
    store: S,
}

impl<S: Store> CustomerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, request: CustomerRequest) -> ServiceResponse<CustomerDto> {
        let outcome: Result<CustomerDto> = async {
            let customer = Customer::new(
                &request.first_name,
                &request.last_name,
                &request.email,
                request.phone.as_deref(),
                request.address.as_deref(),
            )?;

            let work = self.store.begin();
            if work.customers().email_exists(customer.email()).await? {
                return Err(duplicate_email(customer.email()));
            }

            work.customers().add(customer.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &customer)))?;
            tracing::info!(customer_id = %customer.id(), "customer created");
            Ok(CustomerDto::from(&customer))
        }
        .await;
        respond("customer.create", "Customer created successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: CustomerId) -> ServiceResponse<CustomerDto> {
        let outcome: Result<CustomerDto> = async {
            let work = self.store.begin();
            let customer = load(&work, id).await?;
            Ok(CustomerDto::from(&customer))
        }
        .await;
        respond("customer.get", "Customer retrieved successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> ServiceResponse<CustomerDto> {
        let outcome: Result<CustomerDto> = async {
            let email = email.trim().to_lowercase();
            let work = self.store.begin();
            let customer = work
                .customers()
                .find_by_email(&email)
                .await?
                .ok_or_else(|| ServiceError::not_found(Customer::NAME, &email))?;
            Ok(CustomerDto::from(&customer))
        }
        .await;
        respond(
            "customer.get_by_email",
            "Customer retrieved successfully",
            outcome,
        )
    }

    /// Lists customers, oldest first. Soft-deleted customers are left out
    /// unless `include_deleted` is set.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, filter: CustomerFilter) -> ServiceResponse<Vec<CustomerDto>> {
        let outcome: Result<Vec<CustomerDto>> = async {
            let work = self.store.begin();
            let customers = match filter.search.as_deref().map(str::trim) {
                Some(term) if !term.is_empty() => work.customers().search(term).await?,
                _ => work.customers().list().await?,
            };
            Ok(customers
                .iter()
                .filter(|c| filter.include_deleted || !c.is_deleted())
                .map(CustomerDto::from)
                .collect())
        }
        .await;
        respond("customer.list", "Customers retrieved successfully", outcome)
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: CustomerId,
        request: CustomerRequest,
    ) -> ServiceResponse<CustomerDto> {
        let outcome: Result<CustomerDto> = async {
            let work = self.store.begin();
            let mut customer = load(&work, id).await?;

            customer.change_name(&request.first_name, &request.last_name)?;
            customer.change_email(&request.email)?;
            customer.change_contact(request.phone.as_deref(), request.address.as_deref())?;

            if let Some(other) = work.customers().find_by_email(customer.email()).await?
                && other.id() != id
            {
                return Err(duplicate_email(customer.email()));
            }

            work.customers().update(customer.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &customer)))?;
            Ok(CustomerDto::from(&customer))
        }
        .await;
        respond("customer.update", "Customer updated successfully", outcome)
    }

    /// Marks the customer deleted. Refused while the customer still owns
    /// vehicles that are not deleted.
    #[tracing::instrument(skip(self))]
    pub async fn soft_delete(&self, id: CustomerId) -> ServiceResponse<CustomerDto> {
        let outcome: Result<CustomerDto> = async {
            let work = self.store.begin();
            let mut customer = load(&work, id).await?;

            let vehicles = work.vehicles().count_active_by_customer(id).await?;
            if vehicles > 0 {
                return Err(ServiceError::rejected(
                    ErrorCode::CUSTOMER_HAS_ACTIVE_VEHICLES,
                    format!("Customer has {vehicles} active vehicle(s) and cannot be deleted"),
                ));
            }

            customer.soft_delete()?;
            work.customers().update(customer.clone()).await?;
            work.commit().await?;
            Ok(CustomerDto::from(&customer))
        }
        .await;
        respond("customer.delete", "Customer deleted successfully", outcome)
    }

    #[tracing::instrument(skip(self))]
    pub async fn restore(&self, id: CustomerId) -> ServiceResponse<CustomerDto> {
        let outcome: Result<CustomerDto> = async {
            let work = self.store.begin();
            let mut customer = load(&work, id).await?;
            customer.restore()?;
            work.customers().update(customer.clone()).await?;
            work.commit()
                .await
                .map_err(|e| on_conflict(e, |c| conflict(c, &customer)))?;
            Ok(CustomerDto::from(&customer))
        }
        .await;
        respond("customer.restore", "Customer restored successfully", outcome)
    }
}

async fn load<W: UnitOfWork>(work: &W, id: CustomerId) -> Result<Customer> {
    work.customers()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(Customer::NAME, id))
}
