//! Plain HTTP routes: ingest, snapshot/ranking reads, attestations,
//! health, and metrics.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::error;

use tally_mirror::MirrorError;
use tally_types::{Attestation, FullState, LedgerUpdate, Snapshot, UserRank};

use crate::server::GatewayState;

/// `POST /ingest/update` — one incremental diff from the ledger-watching
/// client.
pub async fn ingest_update(
    State(state): State<Arc<GatewayState>>,
    Json(update): Json<LedgerUpdate>,
) -> StatusCode {
    if !state.service.is_initialized() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    state.metrics.diffs_ingested.inc();
    state.service.apply_update(update).await;
    StatusCode::ACCEPTED
}

/// `POST /ingest/snapshot` — full state dump, sent on ledger-client
/// connect and after every reconnect.
pub async fn ingest_snapshot(
    State(state): State<Arc<GatewayState>>,
    Json(dump): Json<FullState>,
) -> Result<StatusCode, (StatusCode, String)> {
    let result = if state.service.is_initialized() {
        state.service.reinitialize(dump).await
    } else {
        state.service.initialize(dump).await
    };
    match result {
        Ok(()) => Ok(StatusCode::ACCEPTED),
        Err(e @ MirrorError::MissingConstants) => {
            error!(error = %e, "rejected state dump");
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// `GET /snapshot` — the same payload a push client receives on connect.
pub async fn snapshot_handler(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<Snapshot>, (StatusCode, String)> {
    match state.service.snapshot().await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(e) => Err((StatusCode::SERVICE_UNAVAILABLE, e.to_string())),
    }
}

/// `GET /ranking` — the current leaderboard.
pub async fn ranking_handler(State(state): State<Arc<GatewayState>>) -> Json<Vec<UserRank>> {
    Json(state.service.leaderboard().ranks().await)
}

/// `GET /attestations/:address` — cached or freshly fetched attestation.
pub async fn attestation_handler(
    State(state): State<Arc<GatewayState>>,
    Path(address): Path<String>,
) -> Result<Json<Attestation>, StatusCode> {
    match state.service.attestation_for(&address).await {
        Some(attestation) => Ok(Json(attestation)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// `GET /health` — liveness plus whether ledger state has arrived.
pub async fn health_handler(State(state): State<Arc<GatewayState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "initialized": state.service.is_initialized(),
    }))
}

/// `GET /metrics` — Prometheus text exposition.
pub async fn metrics_handler(State(state): State<Arc<GatewayState>>) -> String {
    state.metrics.encode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    use tally_mirror::{DisabledLookup, MirrorConfig, MirrorService};
    use tally_ranking::StaticRateFormula;
    use tally_types::StateDiff;

    use crate::bridge::TransportBridge;
    use crate::metrics::GatewayMetrics;

    fn test_state() -> Arc<GatewayState> {
        let service = MirrorService::new(
            MirrorConfig::default(),
            Arc::new(StaticRateFormula::default()),
            Arc::new(DisabledLookup),
        );
        let metrics = Arc::new(GatewayMetrics::new());
        let bridge = TransportBridge::spawn(Arc::clone(service.bus()), Arc::clone(&metrics), 64);
        Arc::new(GatewayState {
            service,
            bridge,
            metrics,
            heartbeat: Duration::from_secs(15),
        })
    }

    fn dump() -> FullState {
        FullState {
            state: StateDiff::from([
                ("constants".to_string(), json!({"launch": 2024})),
                ("user_A".to_string(), json!({"balances": {"pts": 10}})),
            ]),
            governance: StateDiff::new(),
            tokens: Vec::new(),
        }
    }

    #[tokio::test]
    async fn update_before_snapshot_is_rejected() {
        let state = test_state();
        let status = ingest_update(State(Arc::clone(&state)), Json(LedgerUpdate::default())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn snapshot_ingest_initializes_then_reinitializes() {
        let state = test_state();

        let status = ingest_snapshot(State(Arc::clone(&state)), Json(dump()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(state.service.is_initialized());

        // Second dump goes down the reinitialize path.
        let status = ingest_snapshot(State(Arc::clone(&state)), Json(dump()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn dump_without_constants_is_unprocessable() {
        let state = test_state();
        let err = ingest_snapshot(State(Arc::clone(&state)), Json(FullState::default()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!state.service.is_initialized());
    }

    #[tokio::test]
    async fn snapshot_route_serves_after_initialization() {
        let state = test_state();
        assert!(snapshot_handler(State(Arc::clone(&state))).await.is_err());

        ingest_snapshot(State(Arc::clone(&state)), Json(dump()))
            .await
            .unwrap();

        let Json(snapshot) = snapshot_handler(State(Arc::clone(&state))).await.unwrap();
        assert!(snapshot.state.contains_key("user_A"));
    }

    #[tokio::test]
    async fn ranking_route_reflects_first_aggregation() {
        let state = test_state();
        ingest_snapshot(State(Arc::clone(&state)), Json(dump()))
            .await
            .unwrap();

        let Json(ranks) = ranking_handler(State(Arc::clone(&state))).await;
        assert_eq!(ranks.len(), 1);
        assert_eq!(ranks[0].address, "A");
    }

    #[tokio::test]
    async fn unattested_address_is_not_found() {
        let state = test_state();
        let result = attestation_handler(State(state), Path("addr".to_string())).await;
        assert_eq!(result.unwrap_err(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ingest_counts_diffs() {
        let state = test_state();
        ingest_snapshot(State(Arc::clone(&state)), Json(dump()))
            .await
            .unwrap();

        let update = LedgerUpdate {
            state: StateDiff::from([("user_B".to_string(), json!({"balances": {}}))]),
            governance: StateDiff::new(),
        };
        let status = ingest_update(State(Arc::clone(&state)), Json(update)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(state.metrics.diffs_ingested.get(), 1);
    }
}
