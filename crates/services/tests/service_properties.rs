//! Integration tests for the service layer.
//!
//! These tests drive the services against the in-memory store and check the
//! envelope contract: codes, messages, payloads and which writes reach the
//! repositories.

use common::{CustomerId, ErrorCode, PartCategoryId, PartId, ServiceResponse, VehicleModelId};
use domain::{Customer, Part, PartCategory, PartStatus, VehicleModel, WarrantyPolicy};
use services::{
    AddCoverageRequest, CreatePartCategoryRequest, CreatePartRequest, CreateVehicleRequest,
    CustomerRequest, CustomerService, PartCategoryService, PartService, PolicyCoverageService,
    VehicleModelRequest, VehicleModelService, VehicleService, WarrantyPolicyRequest,
    WarrantyPolicyService,
};
use store::{MemoryStore, WriteKind};

fn mark_le() -> CustomerRequest {
    CustomerRequest {
        first_name: "Mark".to_string(),
        last_name: "Le".to_string(),
        email: "mark.le@example.com".to_string(),
        phone: Some("555-0100".to_string()),
        address: Some("12 Harbour St".to_string()),
    }
}

async fn category(
    store: &MemoryStore,
    name: &str,
    parent_id: Option<PartCategoryId>,
) -> PartCategoryId {
    PartCategoryService::new(store.clone())
        .create(CreatePartCategoryRequest {
            name: name.to_string(),
            description: None,
            parent_id,
        })
        .await
        .into_data()
        .unwrap()
        .id
}

async fn part(store: &MemoryStore, category_id: PartCategoryId, serial: &str) -> PartId {
    priced_part(store, category_id, serial, 4_500).await
}

async fn priced_part(
    store: &MemoryStore,
    category_id: PartCategoryId,
    serial: &str,
    price_cents: i64,
) -> PartId {
    PartService::new(store.clone())
        .create(CreatePartRequest {
            part_number: "BP-100".to_string(),
            name: "Brake pad".to_string(),
            serial_number: serial.to_string(),
            category_id,
            price_cents,
        })
        .await
        .into_data()
        .unwrap()
        .id
}

async fn accord(store: &MemoryStore) -> VehicleModelId {
    VehicleModelService::new(store.clone())
        .create(VehicleModelRequest {
            brand: "Honda".to_string(),
            model_name: "Accord".to_string(),
            year: 2003,
            description: None,
        })
        .await
        .into_data()
        .unwrap()
        .id
}

fn vehicle(vin: &str, customer_id: CustomerId, model_id: VehicleModelId) -> CreateVehicleRequest {
    CreateVehicleRequest {
        vin: vin.to_string(),
        customer_id,
        model_id,
        license_plate: None,
        purchase_date: None,
        mileage_km: 0,
    }
}

fn covers(category_id: PartCategoryId, coverage_percent: i64) -> AddCoverageRequest {
    AddCoverageRequest {
        category_id,
        coverage_percent,
        max_claim_amount_cents: None,
        notes: None,
    }
}

async fn powertrain_policy(store: &MemoryStore) -> common::WarrantyPolicyId {
    WarrantyPolicyService::new(store.clone())
        .create(WarrantyPolicyRequest {
            name: "Powertrain 5y".to_string(),
            description: None,
            duration_months: 60,
            mileage_limit_km: Some(100_000),
        })
        .await
        .into_data()
        .unwrap()
        .id
}

mod create {
    use super::*;

    #[tokio::test]
    async fn create_customer_mark_le() {
        let store = MemoryStore::new();
        let service = CustomerService::new(store.clone());

        let response = service.create(mark_le()).await;
        assert!(response.is_success());
        assert_eq!(response.error_code(), None);
        assert_eq!(response.message(), "Customer created successfully");

        let customer = response.into_data().unwrap();
        assert_eq!(customer.first_name, "Mark");
        assert_eq!(customer.last_name, "Le");
        assert_eq!(customer.full_name, "Mark Le");
        assert_eq!(customer.email, "mark.le@example.com");
        assert!(!customer.is_deleted);
        assert_eq!(store.write_calls::<Customer>(WriteKind::Insert), 1);

        let fetched = service.get_by_id(customer.id).await.into_data().unwrap();
        assert_eq!(fetched, customer);
    }

    #[tokio::test]
    async fn each_create_gets_a_new_id() {
        let service = CustomerService::new(MemoryStore::new());
        let first = service.create(mark_le()).await.into_data().unwrap();

        let mut other = mark_le();
        other.email = "mark.le2@example.com".to_string();
        let second = service.create(other).await.into_data().unwrap();
        assert_ne!(first.id, second.id);
    }
}

mod duplicates {
    use super::*;

    #[tokio::test]
    async fn duplicate_email_never_reaches_add() {
        let store = MemoryStore::new();
        let service = CustomerService::new(store.clone());
        service.create(mark_le()).await;

        let mut again = mark_le();
        again.email = "MARK.LE@example.com".to_string();
        let response = service.create(again).await;

        assert!(!response.is_success());
        assert_eq!(response.error_code(), Some(ErrorCode::DUPLICATE_EMAIL));
        assert!(response.message().contains("mark.le@example.com"));
        assert!(response.data().is_none());
        assert_eq!(store.write_calls::<Customer>(WriteKind::Insert), 1);
    }

    #[tokio::test]
    async fn duplicate_serial_number_never_reaches_add() {
        let store = MemoryStore::new();
        let brakes = category(&store, "Brakes", None).await;
        part(&store, brakes, "SN-0001").await;

        let response = PartService::new(store.clone())
            .create(CreatePartRequest {
                part_number: "BP-200".to_string(),
                name: "Other pad".to_string(),
                serial_number: "SN-0001".to_string(),
                category_id: brakes,
                price_cents: 100,
            })
            .await;
        assert_eq!(response.error_code(), Some(ErrorCode::DUPLICATE_SERIAL_NUMBER));
        assert!(response.message().contains("SN-0001"));
        assert_eq!(store.write_calls::<Part>(WriteKind::Insert), 1);
    }
}

mod lookups {
    use super::*;

    #[tokio::test]
    async fn unknown_id_is_not_found_without_payload() {
        let service = CustomerService::new(MemoryStore::new());
        let id = CustomerId::new();
        let response = service.get_by_id(id).await;

        assert!(!response.is_success());
        assert_eq!(response.error_code(), Some(ErrorCode::NOT_FOUND));
        assert_eq!(response.message(), format!("Customer {id} not found"));
        assert!(response.data().is_none());
    }

    #[tokio::test]
    async fn natural_key_lookups_name_the_key() {
        let store = MemoryStore::new();
        let response = CustomerService::new(store.clone())
            .get_by_email("nobody@example.com")
            .await;
        assert_eq!(response.message(), "Customer nobody@example.com not found");

        let response = VehicleService::new(store).get_by_vin("1HGCM82633A004352").await;
        assert_eq!(response.error_code(), Some(ErrorCode::NOT_FOUND));
        assert!(response.message().contains("1HGCM82633A004352"));
    }

    #[tokio::test]
    async fn repeated_reads_are_identical() {
        let store = MemoryStore::new();
        let brakes = category(&store, "Brakes", None).await;
        let id = part(&store, brakes, "SN-0001").await;
        let service = PartService::new(store);

        let first = service.get_by_id(id).await;
        let second = service.get_by_id(id).await;
        assert_eq!(first.data(), second.data());
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn envelope_serializes_with_snake_case_fields() {
        let service = CustomerService::new(MemoryStore::new());
        let response: ServiceResponse<_> = service.get_by_id(CustomerId::new()).await;
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["is_success"], false);
        assert_eq!(json["error_code"], "NOT_FOUND");
        assert!(json["data"].is_null());
    }
}

mod part_status {
    use super::*;

    #[tokio::test]
    async fn change_status_to_reserved() {
        let store = MemoryStore::new();
        let brakes = category(&store, "Brakes", None).await;
        let id = part(&store, brakes, "SN-0001").await;
        let service = PartService::new(store.clone());

        let response = service.change_status(id, "Reserved").await;
        assert!(response.is_success());
        assert_eq!(response.data().unwrap().status, PartStatus::Reserved);

        let fetched = service.get_by_id(id).await.into_data().unwrap();
        assert_eq!(fetched.status, PartStatus::Reserved);
    }

    #[tokio::test]
    async fn unknown_status_stages_no_update() {
        let store = MemoryStore::new();
        let brakes = category(&store, "Brakes", None).await;
        let id = part(&store, brakes, "SN-0001").await;
        let service = PartService::new(store.clone());

        let response = service.change_status(id, "Misplaced").await;
        assert_eq!(response.error_code(), Some(ErrorCode::INVALID_STATUS));
        assert!(
            response
                .message()
                .contains("Available, Reserved, Installed, Defective, Retired")
        );
        assert_eq!(store.write_calls::<Part>(WriteKind::Update), 0);

        let unchanged = service.get_by_id(id).await.into_data().unwrap();
        assert_eq!(unchanged.status, PartStatus::Available);
    }

    #[tokio::test]
    async fn installed_part_cannot_be_deleted() {
        let store = MemoryStore::new();
        let brakes = category(&store, "Brakes", None).await;
        let id = part(&store, brakes, "SN-0001").await;
        let service = PartService::new(store.clone());
        service.change_status(id, "Installed").await;

        let response = service.delete(id).await;
        assert_eq!(response.error_code(), Some(ErrorCode::PART_IN_USE));
        assert_eq!(store.write_calls::<Part>(WriteKind::Delete), 0);
        assert!(service.get_by_id(id).await.is_success());
    }

    #[tokio::test]
    async fn available_part_can_be_deleted() {
        let store = MemoryStore::new();
        let brakes = category(&store, "Brakes", None).await;
        let id = part(&store, brakes, "SN-0001").await;
        let service = PartService::new(store.clone());

        assert!(service.delete(id).await.is_success());
        assert_eq!(store.write_calls::<Part>(WriteKind::Delete), 1);
    }
}

mod category_delete {
    use super::*;

    #[tokio::test]
    async fn category_with_active_parts_is_kept() {
        let store = MemoryStore::new();
        let brakes = category(&store, "Brakes", None).await;
        part(&store, brakes, "SN-0001").await;
        part(&store, brakes, "SN-0002").await;

        let response = PartCategoryService::new(store.clone()).delete(brakes).await;
        assert_eq!(
            response.error_code(),
            Some(ErrorCode::CATEGORY_HAS_ACTIVE_PARTS)
        );
        assert_eq!(
            response.message(),
            "Category has 2 active part(s) and cannot be deleted"
        );
        assert_eq!(store.write_calls::<PartCategory>(WriteKind::Delete), 0);
    }

    #[tokio::test]
    async fn category_with_children_is_kept() {
        let store = MemoryStore::new();
        let brakes = category(&store, "Brakes", None).await;
        category(&store, "Pads", Some(brakes)).await;
        part(&store, brakes, "SN-0001").await;

        let response = PartCategoryService::new(store.clone()).delete(brakes).await;
        assert_eq!(response.error_code(), Some(ErrorCode::CATEGORY_HAS_CHILDREN));
        assert_eq!(
            response.message(),
            "Category has 1 child categories and cannot be deleted"
        );
        assert_eq!(store.write_calls::<PartCategory>(WriteKind::Delete), 0);
    }

    #[tokio::test]
    async fn retired_parts_still_block_delete() {
        let store = MemoryStore::new();
        let brakes = category(&store, "Brakes", None).await;
        let id = part(&store, brakes, "SN-0001").await;
        PartService::new(store.clone())
            .change_status(id, "Retired")
            .await;

        let response = PartCategoryService::new(store.clone()).delete(brakes).await;
        assert_eq!(response.error_code(), Some(ErrorCode::CATEGORY_IN_USE));
        assert_eq!(
            response.message(),
            "Category is referenced by 1 retired part(s) and 0 coverage entr(ies) \
             and cannot be deleted"
        );
        assert_eq!(store.write_calls::<PartCategory>(WriteKind::Delete), 0);
        assert!(
            PartCategoryService::new(store)
                .get_by_id(brakes)
                .await
                .is_success()
        );
    }
}

mod soft_delete {
    use super::*;

    #[tokio::test]
    async fn delete_and_restore_round_trip() {
        let service = CustomerService::new(MemoryStore::new());
        let customer = service.create(mark_le()).await.into_data().unwrap();

        let deleted = service.soft_delete(customer.id).await.into_data().unwrap();
        assert!(deleted.is_deleted);
        assert!(deleted.deleted_at.is_some());

        let restored = service.restore(customer.id).await.into_data().unwrap();
        assert!(!restored.is_deleted);
        assert!(restored.deleted_at.is_none());
    }

    #[tokio::test]
    async fn restoring_an_active_customer_is_a_guard_failure() {
        let store = MemoryStore::new();
        let service = CustomerService::new(store.clone());
        let customer = service.create(mark_le()).await.into_data().unwrap();

        let response = service.restore(customer.id).await;
        assert_eq!(response.error_code(), Some(ErrorCode::new("NOT_DELETED")));
        assert_eq!(response.message(), "Customer is not deleted");
        assert_eq!(store.write_calls::<Customer>(WriteKind::Update), 0);
    }

    #[tokio::test]
    async fn deleting_twice_is_a_guard_failure() {
        let service = CustomerService::new(MemoryStore::new());
        let customer = service.create(mark_le()).await.into_data().unwrap();
        service.soft_delete(customer.id).await;

        let response = service.soft_delete(customer.id).await;
        assert_eq!(response.error_code(), Some(ErrorCode::new("ALREADY_DELETED")));
    }

    #[tokio::test]
    async fn owner_of_active_vehicle_cannot_be_deleted() {
        let store = MemoryStore::new();
        let customers = CustomerService::new(store.clone());
        let customer = customers.create(mark_le()).await.into_data().unwrap();
        let model = accord(&store).await;
        VehicleService::new(store.clone())
            .create(vehicle("1HGCM82633A004352", customer.id, model))
            .await;

        let response = customers.soft_delete(customer.id).await;
        assert_eq!(
            response.error_code(),
            Some(ErrorCode::CUSTOMER_HAS_ACTIVE_VEHICLES)
        );
        assert_eq!(
            response.message(),
            "Customer has 1 active vehicle(s) and cannot be deleted"
        );
    }
}

mod reference_counts {
    use super::*;

    #[tokio::test]
    async fn model_in_use_reports_every_vehicle() {
        let store = MemoryStore::new();
        let customer = CustomerService::new(store.clone())
            .create(mark_le())
            .await
            .into_data()
            .unwrap();
        let model = accord(&store).await;
        let vehicles = VehicleService::new(store.clone());
        vehicles
            .create(vehicle("1HGCM82633A004352", customer.id, model))
            .await;
        let sold = vehicles
            .create(vehicle("1HGCM82633A004353", customer.id, model))
            .await
            .into_data()
            .unwrap();
        vehicles.soft_delete(sold.id).await;

        let response = VehicleModelService::new(store.clone()).delete(model).await;
        assert_eq!(response.error_code(), Some(ErrorCode::MODEL_IN_USE));
        assert_eq!(
            response.message(),
            "Vehicle model is used by 2 vehicle(s) and cannot be deleted"
        );
        assert_eq!(store.write_calls::<VehicleModel>(WriteKind::Delete), 0);
    }

    #[tokio::test]
    async fn policy_with_coverage_reports_the_count() {
        let store = MemoryStore::new();
        let policy = powertrain_policy(&store).await;
        let engines = category(&store, "Engines", None).await;
        PolicyCoverageService::new(store.clone())
            .add(policy, covers(engines, 80))
            .await;

        let response = WarrantyPolicyService::new(store.clone()).delete(policy).await;
        assert_eq!(response.error_code(), Some(ErrorCode::POLICY_HAS_COVERAGE));
        assert_eq!(
            response.message(),
            "Warranty policy has 1 coverage entries and cannot be deleted"
        );
        assert_eq!(store.write_calls::<WarrantyPolicy>(WriteKind::Delete), 0);
    }
}

mod large_amounts {
    use super::*;

    #[tokio::test]
    async fn quote_at_the_ceiling_does_not_overflow() {
        let store = MemoryStore::new();
        let policy = powertrain_policy(&store).await;
        let engines = category(&store, "Engines", None).await;
        PolicyCoverageService::new(store.clone())
            .add(policy, covers(engines, 80))
            .await;
        let part = priced_part(&store, engines, "SN-MAX", domain::MAX_AMOUNT_CENTS).await;

        let quote = PolicyCoverageService::new(store)
            .coverage_for_part(policy, part)
            .await
            .into_data()
            .unwrap();
        assert_eq!(quote.covered_amount_cents, 80_000_000_000);
    }

    #[tokio::test]
    async fn price_past_the_ceiling_is_rejected() {
        let store = MemoryStore::new();
        let engines = category(&store, "Engines", None).await;
        let response = PartService::new(store.clone())
            .create(CreatePartRequest {
                part_number: "EN-1".to_string(),
                name: "Marine engine".to_string(),
                serial_number: "SN-HUGE".to_string(),
                category_id: engines,
                price_cents: i64::MAX / 2,
            })
            .await;
        assert_eq!(response.error_code(), Some(ErrorCode::new("VALUE_OUT_OF_RANGE")));
        assert_eq!(store.write_calls::<Part>(WriteKind::Insert), 0);
    }
}
