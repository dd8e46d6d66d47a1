// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::viewer_session::{ConnectRequest, ViewerSession};
use crate::infrastructure::config::load_viewer_config;
use crate::infrastructure::ws_transport::WebSocketTransport;
use crate::presentation::app_state::AppState;
use crate::presentation::routes::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_viewer_config()?;

    // Create the session (application layer) over the WebSocket transport (infrastructure layer)
    let transport = Arc::new(WebSocketTransport::new());
    let (session, viewer) = ViewerSession::new(&config, transport);
    tokio::spawn(session.run());

    if config.stream.auto_connect {
        viewer.connect(ConnectRequest::default()).await?;
    }

    // Build router (presentation layer)
    let router = build_router(Arc::new(AppState::new(viewer, config.stream.clone())));

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting telemetry-viewer on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
