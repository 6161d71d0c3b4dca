use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{
    services::{download_episode, health, rss_feed},
    state::AppState,
};
use crate::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Build the router for the legacy routes.
///
/// Static routes win over the catch-all, so `/health` and `/download/...`
/// are never mistaken for feed identifiers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/download/{*episode_name}", get(download_episode))
        .route("/{*podcast_rss}", get(rss_feed))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(config: Config) -> Result<(), AnyError> {
    let address = config.server.bind_addr;

    info!(
        known_podcasts = config.podcasts.len(),
        public_url = config.server.public_url.as_deref().unwrap_or("<request host>"),
        download_dir = %config.storage.download_dir.display(),
        "Initializing services"
    );
    let state = AppState::from_config(config)
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "podly listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
