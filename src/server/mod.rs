pub mod error_response;
pub mod handlers;
pub mod middleware;

use axum::routing::{get, post};
use axum::Router;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::error::{GatewayError, Result};
use crate::gateway::Gateway;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub gateway: Gateway,
}

/// Build the HTTP router
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/query", post(handlers::query))
        .route("/file/{rcp_no}", get(handlers::file_url))
        // Paths of the original deployment
        .route("/api/dart", post(handlers::query))
        .route("/api/dart/file/{rcp_no}", get(handlers::file_url))
        .fallback(handlers::fallback)
        .layer(axum::middleware::from_fn(middleware::access_log))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(gateway: Gateway, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| GatewayError::Config(format!("Invalid listen address {}:{}: {}", host, port, e)))?;

    let app = build_router(Arc::new(AppState { gateway }));
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
