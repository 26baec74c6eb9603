//! HTTP facade over the car, payment, and rental services.
//!
//! Routing and JSON encoding are thin plumbing; the orchestrator and
//! assembler do the actual cross-service work. Handlers are generic
//! over the port traits so the integration tests can drive the full
//! router against the in-memory ports.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use ports::{CarPort, PaymentPort, RentalPort};
use saga::RentalOrchestrator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use views::ResponseAssembler;

/// Shared application state accessible from all handlers.
pub struct AppState<C, P, R> {
    pub orchestrator: RentalOrchestrator<C, P, R>,
    pub assembler: ResponseAssembler<C, P>,
    pub car: C,
    pub rental: R,
}

impl<C, P, R> AppState<C, P, R>
where
    C: CarPort + Clone + 'static,
    P: PaymentPort + Clone + 'static,
    R: RentalPort + Clone + 'static,
{
    /// Wires the orchestrator and assembler over the three ports.
    pub fn new(car: C, payment: P, rental: R) -> Self {
        Self {
            orchestrator: RentalOrchestrator::new(car.clone(), payment.clone(), rental.clone()),
            assembler: ResponseAssembler::new(car.clone(), payment),
            car,
            rental,
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<C, P, R>(
    state: Arc<AppState<C, P, R>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    C: CarPort + Clone + 'static,
    P: PaymentPort + Clone + 'static,
    R: RentalPort + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/manage/health", get(routes::health::check))
        .route("/api/v1/cars", get(routes::cars::list::<C, P, R>))
        .route("/api/v1/rentals", get(routes::rentals::list::<C, P, R>))
        .route("/api/v1/rentals", post(routes::rentals::create::<C, P, R>))
        .route("/api/v1/rentals/{id}", get(routes::rentals::get::<C, P, R>))
        .route(
            "/api/v1/rentals/{id}",
            delete(routes::rentals::cancel::<C, P, R>),
        )
        .route(
            "/api/v1/rentals/{id}/finish",
            post(routes::rentals::finish::<C, P, R>),
        )
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
