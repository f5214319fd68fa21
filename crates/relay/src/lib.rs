//! WebSocket relay between headset feed producers and analysis consumers.
//!
//! Producers connect with `?role=producer` and every frame they send is
//! fanned out verbatim to all connected `?role=consumer` sockets. The relay
//! never inspects payloads; framing and content are the endpoints' contract.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

/// Frames buffered per lagging consumer before it starts losing data.
const FANOUT_BUFFER: usize = 256;

/// Shared relay state: the fan-out channel plus live connection counters
/// surfaced by `/health`.
#[derive(Clone)]
pub struct RelayState {
    fanout: broadcast::Sender<Message>,
    producers: Arc<AtomicUsize>,
    consumers: Arc<AtomicUsize>,
}

impl RelayState {
    pub fn new() -> Self {
        let (fanout, _) = broadcast::channel(FANOUT_BUFFER);
        Self {
            fanout,
            producers: Arc::new(AtomicUsize::new(0)),
            consumers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn producers(&self) -> usize {
        self.producers.load(Ordering::Relaxed)
    }

    pub fn consumers(&self) -> usize {
        self.consumers.load(Ordering::Relaxed)
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/health", get(health))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health(State(state): State<RelayState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "producers": state.producers(),
        "consumers": state.consumers(),
    }))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<RelayState>,
) -> Response {
    match params.get("role").map(String::as_str) {
        Some("producer") => ws.on_upgrade(move |socket| run_producer(socket, state)),
        Some("consumer") => ws.on_upgrade(move |socket| run_consumer(socket, state)),
        other => {
            warn!(role = ?other, "rejecting connection without a valid role");
            (
                StatusCode::BAD_REQUEST,
                "expected ?role=producer or ?role=consumer",
            )
                .into_response()
        }
    }
}

/// Pump producer frames into the fan-out channel until the socket closes.
async fn run_producer(mut socket: WebSocket, state: RelayState) {
    state.producers.fetch_add(1, Ordering::Relaxed);
    info!(producers = state.producers(), "producer connected");

    while let Some(frame) = socket.recv().await {
        match frame {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(msg @ (Message::Text(_) | Message::Binary(_))) => {
                // Send only fails with zero subscribers; frames with no
                // audience are dropped, matching a broadcast relay.
                let _ = state.fanout.send(msg);
            }
            Ok(_) => {}
        }
    }

    state.producers.fetch_sub(1, Ordering::Relaxed);
    info!(producers = state.producers(), "producer disconnected");
}

/// Forward fan-out frames to a consumer socket until it closes or falls
/// irrecoverably behind.
async fn run_consumer(socket: WebSocket, state: RelayState) {
    state.consumers.fetch_add(1, Ordering::Relaxed);
    info!(consumers = state.consumers(), "consumer connected");

    let mut rx = state.fanout.subscribe();
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            frame = rx.recv() => match frame {
                Ok(msg) => {
                    if sink.send(msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "consumer lagged, frames dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            // Consumers send nothing meaningful; drain so close frames and
            // pings are still processed.
            incoming = stream.next() => match incoming {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.consumers.fetch_sub(1, Ordering::Relaxed);
    info!(consumers = state.consumers(), "consumer disconnected");
}
