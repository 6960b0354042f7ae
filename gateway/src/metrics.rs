//! Prometheus metrics for the gateway.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

/// Central collection of gateway metrics, owning its own [`Registry`] for
/// the `/metrics` endpoint.
pub struct GatewayMetrics {
    pub registry: Registry,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Currently connected WebSocket clients.
    pub ws_clients: IntGauge,
    /// Currently connected SSE clients.
    pub sse_clients: IntGauge,

    // ── Counters ────────────────────────────────────────────────────────
    /// Update events relayed to the outbound channels.
    pub events_relayed: IntCounter,
    /// Updates suppressed by fingerprint deduplication.
    pub updates_deduped: IntCounter,
    /// Diffs accepted on the ingest routes.
    pub diffs_ingested: IntCounter,
    /// Snapshots served to newly connected clients.
    pub snapshots_served: IntCounter,
    /// Heartbeats sent across all clients.
    pub heartbeats_sent: IntCounter,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let ws_clients = register_int_gauge_with_registry!(
            Opts::new("tally_ws_clients", "Currently connected WebSocket clients"),
            registry
        )
        .expect("failed to register ws_clients gauge");

        let sse_clients = register_int_gauge_with_registry!(
            Opts::new("tally_sse_clients", "Currently connected SSE clients"),
            registry
        )
        .expect("failed to register sse_clients gauge");

        let events_relayed = register_int_counter_with_registry!(
            Opts::new("tally_events_relayed_total", "Update events relayed"),
            registry
        )
        .expect("failed to register events_relayed counter");

        let updates_deduped = register_int_counter_with_registry!(
            Opts::new(
                "tally_updates_deduped_total",
                "Updates suppressed by fingerprint dedup"
            ),
            registry
        )
        .expect("failed to register updates_deduped counter");

        let diffs_ingested = register_int_counter_with_registry!(
            Opts::new("tally_diffs_ingested_total", "Diffs accepted on ingest"),
            registry
        )
        .expect("failed to register diffs_ingested counter");

        let snapshots_served = register_int_counter_with_registry!(
            Opts::new("tally_snapshots_served_total", "Snapshots served to clients"),
            registry
        )
        .expect("failed to register snapshots_served counter");

        let heartbeats_sent = register_int_counter_with_registry!(
            Opts::new("tally_heartbeats_sent_total", "Heartbeats sent to clients"),
            registry
        )
        .expect("failed to register heartbeats_sent counter");

        Self {
            registry,
            ws_clients,
            sse_clients,
            events_relayed,
            updates_deduped,
            diffs_ingested,
            snapshots_served,
            heartbeats_sent,
        }
    }

    /// Encode every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> String {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .unwrap_or_default()
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Increments a gauge for its lifetime; decrements on drop. Used for
/// client connection counts so disconnects on any path are counted.
pub struct GaugeGuard {
    gauge: IntGauge,
}

impl GaugeGuard {
    pub fn new(gauge: IntGauge) -> Self {
        gauge.inc();
        Self { gauge }
    }
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_guard_tracks_lifetime() {
        let metrics = GatewayMetrics::new();
        assert_eq!(metrics.ws_clients.get(), 0);
        {
            let _guard = GaugeGuard::new(metrics.ws_clients.clone());
            assert_eq!(metrics.ws_clients.get(), 1);
        }
        assert_eq!(metrics.ws_clients.get(), 0);
    }

    #[test]
    fn encode_includes_registered_metrics() {
        let metrics = GatewayMetrics::new();
        metrics.diffs_ingested.inc();
        let text = metrics.encode();
        assert!(text.contains("tally_diffs_ingested_total 1"));
    }
}
