//! Meridian server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use meridian_core::api::{self, AppState};
use meridian_core::config::Config;
use meridian_core::files::InMemoryFileStore;
use meridian_core::identity::StoreSessionResolver;
use meridian_core::notify::http::HttpEmailSender;
use meridian_core::notify::{EmailSender, LogOnlySender, NotificationDispatcher};
use meridian_core::portal::PortalService;
use meridian_core::store::InMemoryStore;
use meridian_core::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config: {}. Using defaults.", e);
        Config::default()
    });

    telemetry::init(&config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        store = %config.store.backend,
        "Starting Meridian server"
    );

    let store = Arc::new(InMemoryStore::new());
    let files = Arc::new(InMemoryFileStore::new(config.files.public_base_url.clone()));

    let sender: Arc<dyn EmailSender> = match HttpEmailSender::from_config(&config.email)? {
        Some(sender) => Arc::new(sender),
        None => {
            tracing::warn!("No email endpoint configured; notifications will be logged only");
            Arc::new(LogOnlySender)
        }
    };

    let portal = PortalService::new(
        store.clone(),
        files,
        NotificationDispatcher::new(sender),
    );
    let sessions = Arc::new(StoreSessionResolver::new(store));

    let app_state = AppState { portal, sessions };
    let app = api::build_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!(address = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
