// File: alerter/src/web/server.rs
use crate::web::{handlers, AppState};
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub async fn start_web_server(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = create_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health))
        .route("/api/nodes", get(handlers::get_all_nodes))
        .route("/api/nodes/{node_name}", get(handlers::get_node))
        .route("/api/systems", get(handlers::get_all_systems))
        .route("/api/alive-reminder", get(handlers::get_alive_reminder_mute))
        .route(
            "/api/alive-reminder/mute",
            post(handlers::mute_alive_reminder).delete(handlers::unmute_alive_reminder),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
