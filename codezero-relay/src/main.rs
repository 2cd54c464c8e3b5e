use anyhow::{Context, Result};
use clap::Parser;
use codezero_relay::{RelayService, router};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "codezero-relay")]
#[command(about = "Realtime key-value relay used for call signaling")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "CODEZERO_RELAY_ADDR", default_value = "0.0.0.0:8787")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let app = router(RelayService::default());

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("Failed to bind {}", args.addr))?;
    info!("Relay listening on ws://{}/relay", args.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down relay");
        })
        .await
        .context("Relay server failed")?;

    Ok(())
}
