//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::VehicleId;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use services::InMemoryClaimDirectory;
use store::MemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    setup_with_directory().0
}

fn setup_with_directory() -> (axum::Router, InMemoryClaimDirectory) {
    let (state, directory) = api::create_default_state(MemoryStore::new());
    (api::create_app(state, get_metrics_handle()), directory)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_customer(app: &axum::Router, email: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/customers",
        Some(json!({
            "first_name": "Mark",
            "last_name": "Le",
            "email": email,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["data"]["id"].as_str().unwrap().to_string()
}

async fn create_part(app: &axum::Router, serial: &str) -> (String, String) {
    let (_, category) = send(
        app,
        "POST",
        "/api/part-categories",
        Some(json!({ "name": format!("Brakes {serial}") })),
    )
    .await;
    let category_id = category["data"]["id"].as_str().unwrap().to_string();

    let (status, part) = send(
        app,
        "POST",
        "/api/parts",
        Some(json!({
            "part_number": "BP-100",
            "name": "Brake pad",
            "serial_number": serial,
            "category_id": category_id,
            "price_cents": 4500,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (category_id, part["data"]["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    send(&app, "GET", "/api/customers", None).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_customer_mark_le() {
    let app = setup();
    let (status, json) = send(
        &app,
        "POST",
        "/api/customers",
        Some(json!({
            "first_name": "Mark",
            "last_name": "Le",
            "email": "Mark.Le@Example.com",
            "phone": "555-0100",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["is_success"], true);
    assert!(json["error_code"].is_null());
    assert_eq!(json["data"]["full_name"], "Mark Le");
    assert_eq!(json["data"]["email"], "mark.le@example.com");

    let id = json["data"]["id"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/api/customers/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"], json["data"]);
}

#[tokio::test]
async fn test_unknown_customer_is_404_envelope() {
    let app = setup();
    let uri = format!("/api/customers/{}", uuid_like());
    let (status, json) = send(&app, "GET", &uri, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["is_success"], false);
    assert_eq!(json["error_code"], "NOT_FOUND");
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn test_invalid_id_format() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/api/parts/not-a-uuid", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "INVALID_ID");
    assert_eq!(json["is_success"], false);
}

#[tokio::test]
async fn test_malformed_body_is_invalid_request() {
    let app = setup();
    let (status, json) = send(
        &app,
        "POST",
        "/api/customers",
        Some(json!({ "first_name": "Mark" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_duplicate_email_is_400() {
    let app = setup();
    create_customer(&app, "mark@example.com").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/customers",
        Some(json!({
            "first_name": "Marcus",
            "last_name": "Lee",
            "email": "mark@example.com",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "DUPLICATE_EMAIL");
}

#[tokio::test]
async fn test_customer_soft_delete_and_restore() {
    let app = setup();
    let id = create_customer(&app, "mark@example.com").await;

    let (status, json) = send(&app, "DELETE", &format!("/api/customers/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["is_deleted"], true);

    let (_, listed) = send(&app, "GET", "/api/customers", None).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 0);
    let (_, listed) = send(&app, "GET", "/api/customers?include_deleted=true", None).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let uri = format!("/api/customers/{id}/restore");
    let (status, json) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["is_deleted"], false);

    let (status, json) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "NOT_DELETED");
}

#[tokio::test]
async fn test_part_status_and_delete_guard() {
    let app = setup();
    let (_, part_id) = create_part(&app, "SN-0001").await;
    let status_uri = format!("/api/parts/{part_id}/status");

    let reserve = json!({ "status": "Reserved" });
    let (status, json) = send(&app, "PUT", &status_uri, Some(reserve)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "Reserved");

    let (status, json) = send(&app, "PUT", &status_uri, Some(json!({ "status": "Lost" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "INVALID_STATUS");
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("Available, Reserved, Installed, Defective, Retired")
    );

    send(&app, "PUT", &status_uri, Some(json!({ "status": "Installed" }))).await;
    let (status, json) = send(&app, "DELETE", &format!("/api/parts/{part_id}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "PART_IN_USE");

    let (status, _) = send(&app, "GET", &format!("/api/parts/{part_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_category_with_parts_cannot_be_deleted() {
    let app = setup();
    let (category_id, _) = create_part(&app, "SN-0001").await;

    let uri = format!("/api/part-categories/{category_id}");
    let (status, json) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "CATEGORY_HAS_ACTIVE_PARTS");
    assert!(json["message"].as_str().unwrap().contains('1'));
}

#[tokio::test]
async fn test_vehicle_with_unknown_owner_is_404() {
    let app = setup();
    let (_, model) = send(
        &app,
        "POST",
        "/api/vehicle-models",
        Some(json!({ "brand": "Honda", "model_name": "Accord", "year": 2003 })),
    )
    .await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/vehicles",
        Some(json!({
            "vin": "1HGCM82633A004352",
            "customer_id": uuid_like(),
            "model_id": model["data"]["id"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error_code"], "CUSTOMER_NOT_FOUND");
}

#[tokio::test]
async fn test_policy_coverage_quote() {
    let app = setup();
    let (category_id, part_id) = create_part(&app, "SN-0001").await;
    let (status, policy) = send(
        &app,
        "POST",
        "/api/policies",
        Some(json!({ "name": "Brakes 2y", "duration_months": 24 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(policy["data"]["status"], "Draft");
    let policy_id = policy["data"]["id"].as_str().unwrap().to_string();

    let quote_uri = format!("/api/policies/{policy_id}/coverage/parts/{part_id}");
    let (status, json) = send(&app, "GET", &quote_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error_code"], "COVERAGE_NOT_FOUND");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/policies/{policy_id}/coverage"),
        Some(json!({ "category_id": category_id, "coverage_percent": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(&app, "GET", &quote_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["covered_amount_cents"], 2250);

    let (status, json) = send(&app, "DELETE", &format!("/api/policies/{policy_id}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "POLICY_HAS_COVERAGE");
}

#[tokio::test]
async fn test_work_order_lifecycle() {
    let (app, directory) = setup_with_directory();
    let claim_id = directory.add_claim("CLM-0001", VehicleId::new());
    let technician_id = directory.add_technician("Ana Ruiz", true);

    let (status, json) = send(
        &app,
        "POST",
        "/api/work-orders",
        Some(json!({
            "claim_id": claim_id,
            "technician_id": technician_id,
            "description": "Replace front brake pads",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["status"], "Open");
    let id = json["data"]["id"].as_str().unwrap().to_string();

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/work-orders/{id}/status"),
        Some(json!({ "status": "InProgress" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["started_at"].is_string());

    let (status, json) = send(&app, "DELETE", &format!("/api/work-orders/{id}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "WORK_ORDER_NOT_DELETABLE");

    let (_, json) = send(&app, "GET", &format!("/api/claims/{claim_id}/work-orders"), None).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let (status, json) = send(
        &app,
        "POST",
        "/api/work-orders",
        Some(json!({
            "claim_id": uuid_like(),
            "technician_id": technician_id,
            "description": "Inspect rotors",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error_code"], "CLAIM_NOT_FOUND");
}

fn uuid_like() -> String {
    uuid::Uuid::new_v4().to_string()
}
