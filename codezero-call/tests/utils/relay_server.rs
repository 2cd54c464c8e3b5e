use codezero_relay::{RelayService, router};
use std::net::SocketAddr;

/// Serves a fresh relay on an ephemeral local port.
pub async fn spawn_relay_server() -> (String, RelayService) {
    let service = RelayService::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind relay listener");
    let addr: SocketAddr = listener.local_addr().expect("No local address");

    let app = router(service.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Relay server failed");
    });

    (format!("ws://{}/relay", addr), service)
}
