use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use brain_core::{BrainEngine, EngineConfig};
use clap::Parser;
use daemon::protocol::FeedMessage;
use futures_util::StreamExt;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Brain state estimation daemon: consumes the relayed headset feed and
/// runs the analysis engine at 10 Hz.
#[derive(Parser, Debug)]
#[command(name = "brain-daemon")]
struct Args {
    /// Relay WebSocket URL.
    #[arg(long, default_value = "ws://127.0.0.1:8765")]
    relay: String,
}

const TICK_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daemon=debug,brain_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let url = format!("{}?role=consumer", args.relay);
    tracing::info!("connecting to relay at {}", url);
    let (ws, _) = connect_async(&url).await?;
    let (_, mut feed) = ws.split();

    let engine = Arc::new(Mutex::new(BrainEngine::new(EngineConfig::default())?));
    engine
        .lock()
        .expect("engine lock poisoned")
        .start_stream(Instant::now());

    let shutdown = CancellationToken::new();
    let ticker = tokio::spawn(run_ticker(engine.clone(), shutdown.clone()));

    // Ingestion loop: every relayed frame goes straight into the engine.
    // The tick task reads concurrently; both critical sections are short.
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received");
                break;
            }
            frame = feed.next() => match frame {
                Some(Ok(Message::Text(text))) => match FeedMessage::parse(&text) {
                    Ok(msg) => msg.apply(&mut engine.lock().expect("engine lock poisoned")),
                    Err(err) => tracing::warn!(%err, "dropping feed frame"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("feed closed by relay");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::error!(%err, "feed transport error");
                    break;
                }
            },
        }
    }

    shutdown.cancel();
    ticker.await?;
    engine.lock().expect("engine lock poisoned").stop_stream();
    tracing::info!("daemon stopped");
    Ok(())
}

/// Drive the engine at 10 Hz from a single task, logging a state summary
/// once per second and every event as it lands.
async fn run_ticker(engine: Arc<Mutex<BrainEngine>>, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut ticks = 0u64;
    let mut last_blinks = 0u32;
    let mut last_clenches = 0u32;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = interval.tick() => {}
        }

        let state = {
            let mut engine = engine.lock().expect("engine lock poisoned");
            engine.tick(Instant::now())
        };
        ticks += 1;

        let Some(state) = state else { continue };

        if state.blinks > last_blinks {
            tracing::info!(total = state.blinks, "blink");
            last_blinks = state.blinks;
        }
        if state.clenches > last_clenches {
            tracing::info!(total = state.clenches, "jaw clench");
            last_clenches = state.clenches;
        }

        if ticks % 10 == 0 {
            if state.calibrating {
                tracing::info!(
                    progress = %format_args!("{:.0}%", state.calibration_progress * 100.0),
                    "calibrating"
                );
            } else {
                tracing::info!(
                    focus = %format_args!("{:.2}", state.focus),
                    calm = %format_args!("{:.2}", state.calm),
                    alpha = %format_args!("{:.2}", state.alpha),
                    beta = %format_args!("{:.2}", state.beta),
                    focused = state.focused,
                    "state"
                );
            }
        }
    }
}
