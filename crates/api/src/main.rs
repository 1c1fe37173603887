//! API server entry point.

use api::config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::{
    HttpUserDirectory, InMemoryUserDirectory, OrderOrchestrator, User, UserDirectory,
};
use order_store::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

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

/// Picks the user directory and serves with it.
async fn serve_with_store<S: OrderStore + 'static>(
    config: &Config,
    store: S,
    metrics_handle: PrometheusHandle,
) {
    match &config.user_directory_url {
        Some(url) => {
            tracing::info!(%url, timeout = ?config.user_directory_timeout, "using HTTP user directory");
            let orchestrator = OrderOrchestrator::new(store, HttpUserDirectory::new(url.as_str()))
                .with_directory_timeout(config.user_directory_timeout);
            serve(config, orchestrator, metrics_handle).await;
        }
        None => {
            tracing::warn!("USER_DIRECTORY_URL not set, using in-memory user directory with user 'demo'");
            let directory = InMemoryUserDirectory::with_users([User::new(
                "demo",
                "Demo User",
                "demo@example.com",
            )]);
            serve(config, OrderOrchestrator::new(store, directory), metrics_handle).await;
        }
    }
}

async fn serve<S, D>(
    config: &Config,
    orchestrator: OrderOrchestrator<S, D>,
    metrics_handle: PrometheusHandle,
) where
    S: OrderStore + 'static,
    D: UserDirectory + 'static,
{
    let app = api::create_app(api::create_state(orchestrator), metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Open the order store and serve
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await
                .expect("failed to connect to PostgreSQL");
            let store = PostgresOrderStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!(
                max_connections = config.database_max_connections,
                "using PostgreSQL order store"
            );
            serve_with_store(&config, store, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory");
            serve_with_store(&config, InMemoryOrderStore::new(), metrics_handle).await;
        }
    }

    tracing::info!("server shut down gracefully");
}
