use std::net::SocketAddr;

use clap::Parser;
use relay::{router, RelayState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Dumb WebSocket relay between headset feed producers and consumers.
#[derive(Parser, Debug)]
#[command(name = "eeg-relay")]
struct Args {
    /// Port to listen on.
    #[arg(long, default_value_t = 8765)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let app = router(RelayState::new());

    tracing::info!("relay listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
