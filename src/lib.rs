pub mod api;
pub mod app_state;
pub mod config;
pub mod media;
pub mod naming;

use anyhow::Context;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Extension};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

//
// Re-export
//
pub use api::{UploadError, UploadResponse, health, log_request_errors, upload_media};
pub use app_state::AppState;
pub use config::Config;
pub use media::{MediaSlot, StoredFile};
pub use naming::{NameSource, SystemNames};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/upload", post(upload_media))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(state.max_body_size))
        .layer(axum::middleware::from_fn(log_request_errors))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(state))
}

/// Serve on an already bound listener until the server stops
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state))
        .await
        .context("Upload server error")
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(&config)?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {addr}");

    serve(listener, state).await
}
