use std::net::SocketAddr;

use axum::{Router, extract::Request, routing::get, routing::post};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use super::{
    services::{convert_document, fetch_document, health, store_document},
    state::AppState,
};
use crate::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Routes of the HTTP interface over the given state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/convert-document", post(convert_document))
        .route(
            "/documents/{page_id}",
            get(fetch_document).put(store_document),
        )
        .route("/health", get(health))
        .with_state(state)
        // Handles Content-Encoding: gzip before the services read the body
        .layer(RequestDecompressionLayer::new())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    id = %Uuid::now_v7(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
}

pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);

    info!(
        content_base_url = %config.content.base_url,
        max_payload = %config.server.api.max_payload_bytes,
        "Building application state"
    );
    let state = AppState::from_config(config)
        .map_err(|e| format!("Failed to build content client: {}", e))?;
    info!(handlers = state.registry.len(), "Handler registry sealed");

    let app = build_router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "livedoc API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
