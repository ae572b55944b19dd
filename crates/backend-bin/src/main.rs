use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use spendtrack_backend_lib::{
    config::Settings, router::create_router, store::SqliteStore, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize configuration; the signing secret comes from the config
    // file or from SPENDTRACK_SIGNING_SECRET in the environment.
    let settings = Settings::load().or_else(|_| Settings::load_from("config/default.toml"))?;

    // Initialize tracing; RUST_LOG overrides the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    // Open the store
    let store = SqliteStore::open(&settings.database_path)?;

    // Create application state and router
    let bind_addr = settings.bind_addr;
    let state = Arc::new(AppState::new(store, settings));

    // Periodically drop expired login lockouts
    let limiter = state.login_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60 * 60));
        loop {
            interval.tick().await;
            limiter.cleanup();
        }
    });

    let app = create_router(state);

    // Start the server
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(%bind_addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
