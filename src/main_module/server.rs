//! HTTP server initialization and routing

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::core::middleware::{error_path_middleware, not_found_fallback};
use crate::core::shared::state::AppState;
use crate::security::auth_api::auth_middleware;
use crate::security::cors::create_cors_layer;

use super::health_check;

pub fn build_router(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/api/health", get(health_check))
        .merge(crate::auth::configure())
        .merge(crate::directory::configure())
        .merge(crate::learn::configure())
        .merge(crate::dashboards::configure())
        .merge(crate::security::audit::configure())
        .merge(crate::llm::analyze::configure())
        .fallback(not_found_fallback);

    let cors = create_cors_layer(&state.config.cors_allowed_origins);

    // Last added runs first: errors get their path after auth has run.
    api_router
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(error_path_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(state: AppState) -> std::io::Result<()> {
    let host = state.config.server.host.clone();
    let port = state.config.server.port;
    let app = build_router(state);

    let addr = format!("{host}:{port}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {} - is another instance running?", addr, e);
            return Err(e);
        }
    };
    info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
