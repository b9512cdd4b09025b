//! API server entry point.

use api::config::Config;
use reconciler::InMemoryPaymentGateway;
use shipment::InMemoryShippingProvider;
use sqlx::postgres::PgPoolOptions;
use store::{PostgresCartStore, PostgresCatalogStore, PostgresOrderStore, PostgresShipmentLogStore};
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

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire the stores: Postgres when DATABASE_URL is set, in-memory
    //    otherwise. The gateway and shipping provider are the in-memory
    //    stand-ins in both modes.
    let app = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to Postgres");
            store::run_migrations(&pool)
                .await
                .expect("failed to run migrations");
            tracing::info!("serving from Postgres");

            let state = api::create_state(
                PostgresCatalogStore::new(pool.clone()),
                PostgresCartStore::new(pool.clone()),
                PostgresOrderStore::new(pool.clone()),
                PostgresShipmentLogStore::new(pool),
                InMemoryPaymentGateway::new(),
                InMemoryShippingProvider::new(),
                config.upstream_timeout(),
            );
            api::create_app(state, metrics_handle)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, serving from in-memory stores");
            let (state, _backends) = api::create_default_state(config.upstream_timeout());
            api::create_app(state, metrics_handle)
        }
    };

    // 4. Start server
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
