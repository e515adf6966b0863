// src/server.rs
//! Liveness endpoints used to check the service is reachable.

use axum::{
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;

async fn ping() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ping_txt() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "OK")
}

fn ping_routes() -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/ping_txt", get(ping_txt))
}

pub fn router() -> Router {
    Router::new()
        .merge(ping_routes())
        .nest("/zk", ping_routes())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(config: &AppConfig) -> std::io::Result<()> {
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, router()).await
}
