//! Server-sent-events delivery mechanism.
//!
//! The unidirectional sibling of the WebSocket channel: an immediate
//! snapshot event, then the three update topics as they occur, with a
//! heartbeat event on the configured interval. Dropping the response
//! stream drops every broadcast receiver with it, so disconnect teardown
//! is structural.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use serde_json::json;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};

use tally_bus::BusEvent;
use tally_types::{Timestamp, Topic};

use crate::metrics::GaugeGuard;
use crate::server::GatewayState;

/// `GET /events` — long-lived SSE stream.
pub async fn sse_handler(
    State(state): State<Arc<GatewayState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let snapshot = state
        .service
        .snapshot()
        .await
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    let clients = GaugeGuard::new(state.metrics.sse_clients.clone());
    state.metrics.snapshots_served.inc();

    let snapshot_event = BusEvent::new(
        Topic::Snapshot,
        serde_json::to_value(&snapshot).unwrap_or_else(|_| json!({})),
    );

    let mut sources: Vec<BoxStream<'static, BusEvent>> = Topic::CLIENT_UPDATES
        .into_iter()
        .map(|topic| {
            BroadcastStream::new(state.bridge.subscribe(topic))
                .filter_map(|item| async move { item.ok() })
                .boxed()
        })
        .collect();
    sources.push(heartbeat_stream(state).boxed());

    let events = stream::once(std::future::ready(snapshot_event))
        .chain(stream::select_all(sources))
        .map(move |event| {
            // The guard lives as long as the stream: dropped on disconnect.
            let _ = &clients;
            Ok::<_, Infallible>(to_sse_event(&event))
        });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn heartbeat_stream(state: Arc<GatewayState>) -> impl Stream<Item = BusEvent> {
    let period = state.heartbeat;
    let start = tokio::time::Instant::now() + period;
    let metrics = Arc::clone(&state.metrics);
    IntervalStream::new(tokio::time::interval_at(start, period)).map(move |_| {
        metrics.heartbeats_sent.inc();
        BusEvent::new(
            Topic::Heartbeat,
            json!({ "timestamp": Timestamp::now().as_secs() }),
        )
    })
}

fn to_sse_event(event: &BusEvent) -> Event {
    Event::default()
        .event(event.topic.as_str())
        .json_data(event)
        .unwrap_or_else(|_| Event::default().event(event.topic.as_str()).data("{}"))
}
