//! HTTP API server with observability for the order service.
//!
//! Exposes the four order operations as JSON endpoints, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::{InMemoryUserDirectory, OrderOrchestrator, UserDirectory};
use order_store::OrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, D>(state: Arc<AppState<S, D>>, metrics_handle: PrometheusHandle) -> Router
where
    S: OrderStore + 'static,
    D: UserDirectory + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health))
        .route(
            "/orders",
            post(routes::orders::create::<S, D>).get(routes::orders::list::<S, D>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S, D>))
        .route(
            "/orders/{id}/status",
            post(routes::orders::update_status::<S, D>),
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

/// Wraps an orchestrator in shared application state.
pub fn create_state<S, D>(orchestrator: OrderOrchestrator<S, D>) -> Arc<AppState<S, D>>
where
    S: OrderStore,
    D: UserDirectory,
{
    Arc::new(AppState { orchestrator })
}

/// Creates application state over `store` with an in-memory user directory.
///
/// The directory handle is returned so callers can seed users.
pub fn create_default_state<S: OrderStore + 'static>(
    store: S,
) -> (Arc<AppState<S, InMemoryUserDirectory>>, InMemoryUserDirectory) {
    let directory = InMemoryUserDirectory::new();
    let state = create_state(OrderOrchestrator::new(store, directory.clone()));
    (state, directory)
}
