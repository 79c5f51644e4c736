//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use api::routes::register::AppState;
use metrics_exporter_prometheus::PrometheusHandle;
use profile_store::{InMemoryProfileStore, PostgresProfileStore, ProfileStore};
use registration::{
    HttpIdentityProvider, IdentityProvider, InMemoryIdentityProvider, PostalLookupClient,
    RegistrationOrchestrator, SubscriptionClient,
};
use sqlx::PgPool;
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Builds the orchestrator for the given mandatory collaborators, wires
/// the optional ones from configuration, and serves the app.
async fn run<I, D>(identity: I, store: D, config: Config, metrics_handle: PrometheusHandle)
where
    I: IdentityProvider + 'static,
    D: ProfileStore + Clone + 'static,
{
    let mut orchestrator = RegistrationOrchestrator::new(identity, store);

    if let Some(lookup) = &config.postal_lookup {
        let client = PostalLookupClient::new(lookup.base_url.clone(), lookup.token.clone())
            .expect("failed to build postal lookup client");
        orchestrator = orchestrator.with_enrichment(client);
    } else {
        tracing::info!("postal lookup not configured, address enrichment disabled");
    }

    if let Some(billing) = &config.billing {
        let client = SubscriptionClient::new(billing.base_url.clone(), billing.api_key.clone())
            .expect("failed to build billing client");
        orchestrator = orchestrator.with_billing(client, billing.plan_price_cents);
    } else {
        tracing::info!("billing not configured, subscription provisioning disabled");
    }

    let state = Arc::new(AppState { orchestrator });
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Resolve configuration once; collaborators receive it by injection
    let config = Config::from_env();

    let store = match &config.database_url {
        Some(url) => {
            let pool = PgPool::connect(url)
                .await
                .expect("failed to connect to database");
            let store = PostgresProfileStore::new(pool);
            store.run_migrations().await.expect("migrations failed");
            Some(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory profile store");
            None
        }
    };

    let identity = match &config.identity {
        Some(identity_config) => Some(
            HttpIdentityProvider::new(
                identity_config.base_url.clone(),
                identity_config.service_key.clone(),
            )
            .expect("failed to build identity client"),
        ),
        None => {
            tracing::warn!("identity service not configured, using in-memory provider");
            None
        }
    };

    // 4. Serve with whichever combination of backends is configured
    match (identity, store) {
        (Some(identity), Some(store)) => run(identity, store, config, metrics_handle).await,
        (Some(identity), None) => {
            run(identity, InMemoryProfileStore::new(), config, metrics_handle).await;
        }
        (None, Some(store)) => {
            run(
                InMemoryIdentityProvider::new(),
                store,
                config,
                metrics_handle,
            )
            .await;
        }
        (None, None) => {
            run(
                InMemoryIdentityProvider::new(),
                InMemoryProfileStore::new(),
                config,
                metrics_handle,
            )
            .await;
        }
    }
}
