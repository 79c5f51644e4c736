//! HTTP API server for the registration service.
//!
//! Exposes one registration endpoint per profile kind plus health and
//! Prometheus metrics endpoints, with structured logging (tracing) and a
//! permissive CORS layer (preflight requests short-circuit in the layer).

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use profile_store::{InMemoryProfileStore, ProfileStore};
use registration::{
    AddressEnrichment, BillingService, IdentityProvider, InMemoryAddressEnrichment,
    InMemoryBillingService, InMemoryIdentityProvider, RegistrationOrchestrator,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::register::AppState;

/// Application state backed entirely by in-memory collaborators.
pub type InMemoryAppState = AppState<
    InMemoryIdentityProvider,
    InMemoryProfileStore,
    InMemoryAddressEnrichment,
    InMemoryBillingService,
>;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<I, D, E, B>(
    state: Arc<AppState<I, D, E, B>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    I: IdentityProvider + 'static,
    D: ProfileStore + Clone + 'static,
    E: AddressEnrichment + 'static,
    B: BillingService + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/register/client", post(routes::register::client::<I, D, E, B>))
        .route("/register/artist", post(routes::register::artist::<I, D, E, B>))
        .route("/register/studio", post(routes::register::studio::<I, D, E, B>))
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

/// Creates application state with in-memory collaborators and enrichment
/// and billing enabled, returning handles to each for inspection.
pub fn create_in_memory_state() -> (
    Arc<InMemoryAppState>,
    InMemoryIdentityProvider,
    InMemoryProfileStore,
    InMemoryAddressEnrichment,
    InMemoryBillingService,
) {
    let identity = InMemoryIdentityProvider::new();
    let store = InMemoryProfileStore::new();
    let enrichment = InMemoryAddressEnrichment::new();
    let billing = InMemoryBillingService::new();

    let orchestrator = RegistrationOrchestrator::new(identity.clone(), store.clone())
        .with_enrichment(enrichment.clone())
        .with_billing(billing.clone(), 9900);

    let state = Arc::new(AppState { orchestrator });

    (state, identity, store, enrichment, billing)
}
