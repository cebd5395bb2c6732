//! HTTP API server for the warranty back office.
//!
//! Every service operation is exposed under `/api`. Handlers answer with the
//! service envelope unchanged; only the HTTP status is derived from it.
//! Structured logging comes from tracing and Prometheus metrics are served
//! at `/metrics`.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use services::InMemoryClaimDirectory;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    use routes::{
        coverage, customers, part_categories, parts, policies, vehicle_models, vehicles,
        work_orders,
    };

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api = Router::new()
        .route(
            "/customers",
            post(customers::create::<S>).get(customers::list::<S>),
        )
        .route(
            "/customers/by-email/{email}",
            get(customers::get_by_email::<S>),
        )
        .route(
            "/customers/{id}",
            get(customers::get::<S>)
                .put(customers::update::<S>)
                .delete(customers::delete::<S>),
        )
        .route("/customers/{id}/restore", post(customers::restore::<S>))
        .route("/customers/{id}/vehicles", get(customers::vehicles::<S>))
        .route(
            "/vehicle-models",
            post(vehicle_models::create::<S>).get(vehicle_models::list::<S>),
        )
        .route(
            "/vehicle-models/{id}",
            get(vehicle_models::get::<S>)
                .put(vehicle_models::update::<S>)
                .delete(vehicle_models::delete::<S>),
        )
        .route(
            "/vehicles",
            post(vehicles::create::<S>).get(vehicles::list::<S>),
        )
        .route("/vehicles/by-vin/{vin}", get(vehicles::get_by_vin::<S>))
        .route(
            "/vehicles/{id}",
            get(vehicles::get::<S>)
                .put(vehicles::update::<S>)
                .delete(vehicles::delete::<S>),
        )
        .route("/vehicles/{id}/transfer", post(vehicles::transfer::<S>))
        .route("/vehicles/{id}/restore", post(vehicles::restore::<S>))
        .route(
            "/part-categories",
            post(part_categories::create::<S>).get(part_categories::list::<S>),
        )
        .route(
            "/part-categories/{id}",
            get(part_categories::get::<S>)
                .put(part_categories::update::<S>)
                .delete(part_categories::delete::<S>),
        )
        .route(
            "/part-categories/{id}/children",
            get(part_categories::children::<S>),
        )
        .route("/parts", post(parts::create::<S>).get(parts::list::<S>))
        .route("/parts/by-serial/{serial}", get(parts::get_by_serial::<S>))
        .route(
            "/parts/{id}",
            get(parts::get::<S>)
                .put(parts::update::<S>)
                .delete(parts::delete::<S>),
        )
        .route("/parts/{id}/status", put(parts::change_status::<S>))
        .route(
            "/policies",
            post(policies::create::<S>).get(policies::list::<S>),
        )
        .route(
            "/policies/{id}",
            get(policies::get::<S>)
                .put(policies::update::<S>)
                .delete(policies::delete::<S>),
        )
        .route("/policies/{id}/status", put(policies::change_status::<S>))
        .route(
            "/policies/{id}/coverage",
            post(coverage::add::<S>).get(coverage::list_by_policy::<S>),
        )
        .route(
            "/policies/{id}/coverage/parts/{part_id}",
            get(coverage::for_part::<S>),
        )
        .route(
            "/coverage/{id}",
            get(coverage::get::<S>)
                .put(coverage::update::<S>)
                .delete(coverage::remove::<S>),
        )
        .route("/work-orders", post(work_orders::create::<S>))
        .route(
            "/work-orders/{id}",
            get(work_orders::get::<S>).delete(work_orders::delete::<S>),
        )
        .route(
            "/work-orders/{id}/status",
            put(work_orders::update_status::<S>),
        )
        .route(
            "/claims/{id}/work-orders",
            get(work_orders::list_by_claim::<S>),
        )
        .route(
            "/technicians/{id}/work-orders",
            get(work_orders::list_by_technician::<S>),
        );

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api", api)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `store` with an empty in-memory
/// claims directory.
///
/// The directory handle is returned so callers can register claims and
/// technicians.
pub fn create_default_state<S: Store>(store: S) -> (Arc<AppState<S>>, InMemoryClaimDirectory) {
    let directory = InMemoryClaimDirectory::new();
    let state = Arc::new(AppState::new(store, directory.clone()));
    (state, directory)
}
