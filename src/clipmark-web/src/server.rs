//! Axum server setup and routing

use crate::routes;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the router over the given state
pub fn router(state: AppState) -> Router {
    Router::new()
        // Annotation page
        .route("/", get(routes::index))
        // Video streaming
        .route("/video/*filename", get(routes::stream_video))
        // JSON API
        .route("/switch_video", post(routes::switch_video))
        .route("/save", post(routes::save_annotations))
        // Embedded assets
        .route("/static/style.css", get(routes::serve_style))
        .route("/static/app.js", get(routes::serve_app_js))
        // Add state
        .with_state(state)
        // Middleware
        .layer(TraceLayer::new_for_http())
}

/// Start the web server and run until Ctrl+C
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(state);

    info!("starting clipmark on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}
