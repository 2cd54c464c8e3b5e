mod connection;
mod service;
mod ws_handler;

pub use connection::ConnectionId;
pub use service::RelayService;
pub use ws_handler::ws_handler;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

/// HTTP surface of the relay: `/relay` for WebSocket clients, `/health` for probes.
pub fn router(service: RelayService) -> Router {
    Router::new()
        .route("/relay", get(ws_handler))
        .route("/health", get(health))
        .with_state(service)
}

async fn health(State(service): State<RelayService>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "connections": service.connection_count(),
    }))
}
