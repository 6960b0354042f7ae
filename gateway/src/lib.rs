//! Push gateway for browser sessions.
//!
//! Fans mirror events out over two delivery mechanisms: a persistent
//! WebSocket channel at `/ws` and a per-request SSE stream at `/events`.
//! Each connecting client receives an immediate snapshot, is subscribed to
//! the three update topics, and gets a periodic heartbeat. Repeated update
//! payloads are deduplicated once, centrally, before fan-out.
//!
//! The gateway also carries the ingest routes the external ledger-watching
//! client pushes diffs through, and the Prometheus `/metrics` endpoint.

pub mod bridge;
pub mod dedup;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod sse;

pub use bridge::TransportBridge;
pub use dedup::UpdateFingerprint;
pub use error::GatewayError;
pub use metrics::GatewayMetrics;
pub use server::{GatewayServer, GatewayState};
