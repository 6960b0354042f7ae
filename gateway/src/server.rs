//! Gateway server: router assembly and the WebSocket delivery mechanism.
//!
//! WebSocket flow per client:
//! 1. Upgrade, then immediately send a `SNAPSHOT` event.
//! 2. Spawn one forwarder task per update topic reading from the bridge.
//! 3. Spawn the heartbeat task.
//! 4. On disconnect, abort every task — the broadcast receivers drop with
//!    them, so no listener outlives its client.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use tally_bus::BusEvent;
use tally_mirror::MirrorService;
use tally_types::{Timestamp, Topic};

use crate::bridge::TransportBridge;
use crate::error::GatewayError;
use crate::metrics::{GatewayMetrics, GaugeGuard};
use crate::routes;
use crate::sse;

type WsSink = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Shared state injected into every gateway handler.
pub struct GatewayState {
    pub service: Arc<MirrorService>,
    pub bridge: Arc<TransportBridge>,
    pub metrics: Arc<GatewayMetrics>,
    pub heartbeat: Duration,
}

/// The gateway server, configured with a port and shared state.
pub struct GatewayServer {
    port: u16,
    state: Arc<GatewayState>,
}

impl GatewayServer {
    /// Build the gateway around a mirror service, spawning the bridge
    /// relay tasks.
    pub fn new(service: Arc<MirrorService>) -> Self {
        let config = service.config();
        let metrics = Arc::new(GatewayMetrics::new());
        let bridge = TransportBridge::spawn(
            Arc::clone(service.bus()),
            Arc::clone(&metrics),
            config.channel_capacity,
        );
        let state = Arc::new(GatewayState {
            bridge,
            metrics,
            heartbeat: config.heartbeat(),
            service,
        });
        Self {
            port: state.service.config().gateway_port,
            state,
        }
    }

    pub fn state(&self) -> &Arc<GatewayState> {
        &self.state
    }

    /// Assemble the router (exposed separately so tests can drive
    /// handlers without binding a port).
    pub fn router(&self) -> Router {
        let config = self.state.service.config();
        let mut router = Router::new()
            .route("/ws", get(ws_handler))
            .route("/events", get(sse::sse_handler))
            .route("/snapshot", get(routes::snapshot_handler))
            .route("/ranking", get(routes::ranking_handler))
            .route("/attestations/:address", get(routes::attestation_handler))
            .route("/ingest/update", post(routes::ingest_update))
            .route("/ingest/snapshot", post(routes::ingest_snapshot))
            .route("/health", get(routes::health_handler));
        if config.enable_metrics {
            router = router.route("/metrics", get(routes::metrics_handler));
        }
        let mut router = router.with_state(Arc::clone(&self.state));
        if config.enable_cors {
            router = router.layer(tower_http::cors::CorsLayer::permissive());
        }
        router
    }

    /// Bind and serve until shutdown.
    pub async fn start(&self) -> Result<(), GatewayError> {
        let addr = format!("0.0.0.0:{}", self.port);
        info!("gateway listening on {addr}");
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

/// Axum handler that upgrades an HTTP request to a WebSocket connection.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<GatewayState>) {
    let snapshot = match state.service.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            debug!(error = %e, "closing socket, no snapshot available yet");
            return;
        }
    };
    let _clients = GaugeGuard::new(state.metrics.ws_clients.clone());
    debug!("new websocket client connected");

    let (ws_sender, mut ws_receiver) = socket.split();
    let ws_sender: WsSink = Arc::new(Mutex::new(ws_sender));

    let snapshot_event = BusEvent::new(
        Topic::Snapshot,
        serde_json::to_value(&snapshot).unwrap_or_else(|_| json!({})),
    );
    if send_event(&ws_sender, &snapshot_event).await.is_err() {
        return;
    }
    state.metrics.snapshots_served.inc();

    // One forwarder per update topic plus the heartbeat timer; all torn
    // down together on disconnect.
    let mut tasks = Vec::with_capacity(Topic::CLIENT_UPDATES.len() + 1);
    for topic in Topic::CLIENT_UPDATES {
        let rx = state.bridge.subscribe(topic);
        let sender = Arc::clone(&ws_sender);
        tasks.push(tokio::spawn(forward_events(rx, sender, topic)));
    }
    tasks.push(tokio::spawn(heartbeat_loop(
        Arc::clone(&ws_sender),
        state.heartbeat,
        Arc::clone(&state.metrics),
    )));

    while let Some(msg_result) = ws_receiver.next().await {
        match msg_result {
            Ok(Message::Close(_)) => {
                debug!("client sent close frame");
                break;
            }
            Ok(Message::Ping(data)) => {
                let mut sender = ws_sender.lock().await;
                let _ = sender.send(Message::Pong(data)).await;
            }
            // The push channel is one-way; client text is ignored.
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "websocket receive error");
                break;
            }
        }
    }

    for task in tasks {
        task.abort();
    }
    debug!("websocket client disconnected, subscriptions torn down");
}

/// Serialize and send one event. A send failure belongs to this client
/// alone; callers just stop their loop.
async fn send_event(ws_sender: &WsSink, event: &BusEvent) -> Result<(), ()> {
    let text = serde_json::to_string(event).map_err(|_| ())?;
    let mut sender = ws_sender.lock().await;
    sender.send(Message::Text(text)).await.map_err(|_| ())
}

/// Forwarder task: reads events from a bridge receiver and sends them to
/// the WebSocket client.
async fn forward_events(
    mut rx: broadcast::Receiver<BusEvent>,
    ws_sender: WsSink,
    topic: Topic,
) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if send_event(&ws_sender, &event).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(%topic, skipped = n, "client lagged behind, events skipped");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(%topic, "outbound channel closed");
                break;
            }
        }
    }
}

/// Periodic keep-alive so idle-connection timeouts between the client and
/// the gateway never fire.
async fn heartbeat_loop(ws_sender: WsSink, interval: Duration, metrics: Arc<GatewayMetrics>) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; the snapshot already went out.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let event = BusEvent::new(
            Topic::Heartbeat,
            json!({ "timestamp": Timestamp::now().as_secs() }),
        );
        if send_event(&ws_sender, &event).await.is_err() {
            break;
        }
        metrics.heartbeats_sent.inc();
    }
}
