use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hookroom_core::clock::SystemClock;
use hookroom_core::memory::MemoryStore;
use hookroom_core::store::{CaptureStore, RoomStore};
use hookroom_db::PgStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hookroom_api::background::capture_sweep;
use hookroom_api::config::{ServerConfig, StoreBackend};
use hookroom_api::router::build_app_router;
use hookroom_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        store_backend = ?config.store_backend,
        default_webhook_ttl_secs = config.default_webhook_ttl_secs,
        "Loaded server configuration"
    );

    // --- Store ---
    let (rooms, captures) = open_store(&config).await;

    // --- App state ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let sweep_interval = Duration::from_secs(config.capture_sweep_interval_secs);
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let state = AppState::new(config, rooms, captures, Arc::new(SystemClock));

    // --- Capture sweep ---
    let sweep_cancel = tokio_util::sync::CancellationToken::new();
    let sweep_handle = tokio::spawn(capture_sweep::run(
        Arc::clone(&state.registry),
        Arc::clone(&state.captures),
        sweep_interval,
        sweep_cancel.clone(),
    ));

    // --- Router ---
    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    let _ = tokio::time::timeout(shutdown_timeout, sweep_handle).await;
    tracing::info!("Capture sweep stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Install the global subscriber. `LOG_FORMAT=json` selects JSON output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hookroom_api=debug,hookroom_core=debug,hookroom_db=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Build the configured store. Both traits are served by one instance.
async fn open_store(config: &ServerConfig) -> (Arc<dyn RoomStore>, Arc<dyn CaptureStore>) {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; rooms and captures are lost on restart");
            let store = Arc::new(MemoryStore::new());
            let rooms: Arc<dyn RoomStore> = store.clone();
            let captures: Arc<dyn CaptureStore> = store;
            (rooms, captures)
        }
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL must be set when STORE_BACKEND=postgres");

            let pool = hookroom_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            hookroom_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            hookroom_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            let store = Arc::new(PgStore::new(pool));
            let rooms: Arc<dyn RoomStore> = store.clone();
            let captures: Arc<dyn CaptureStore> = store;
            (rooms, captures)
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
