//! Mirror configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::MirrorError;

/// Configuration for the mirror service and its gateway.
///
/// Can be loaded from a TOML file via [`MirrorConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so
/// a partial file is fine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Capacity of the main program's state map.
    #[serde(default = "default_state_capacity")]
    pub state_capacity: usize,

    /// Capacity of the governance program's state map.
    #[serde(default = "default_state_capacity")]
    pub governance_capacity: usize,

    /// Capacity of the token metadata map.
    #[serde(default = "default_token_capacity")]
    pub token_capacity: usize,

    /// Maximum leaderboard entries kept after a rebuild.
    #[serde(default = "default_ranking_capacity")]
    pub ranking_capacity: usize,

    /// Capacity of the attestation cache.
    #[serde(default = "default_attestation_capacity")]
    pub attestation_capacity: usize,

    /// Attestation time-to-live in seconds.
    #[serde(default = "default_attestation_ttl_secs")]
    pub attestation_ttl_secs: u64,

    /// Quiet period of the aggregation debounce, in seconds.
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,

    /// Bound on concurrently running balance computations.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Interval between client heartbeats, in seconds.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    /// Per-topic event channel capacity.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Listener count per topic above which the monitor warns.
    #[serde(default = "default_listener_threshold")]
    pub listener_threshold: usize,

    /// Listener monitor sampling interval, in seconds.
    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,

    /// Port the gateway binds to.
    #[serde(default = "default_gateway_port")]
    pub gateway_port: u16,

    /// Base URL of the identity-attestation service. When absent,
    /// attestation lookups are disabled and always miss.
    #[serde(default)]
    pub attestation_url: Option<String>,

    /// Whether the gateway adds permissive CORS headers.
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Whether to expose the Prometheus `/metrics` endpoint.
    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl MirrorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, MirrorError> {
        toml::from_str(contents).map_err(|e| MirrorError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, MirrorError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self::from_toml_str("").expect("defaults are valid")
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_state_capacity() -> usize {
    10_000
}

fn default_token_capacity() -> usize {
    500
}

fn default_ranking_capacity() -> usize {
    150
}

fn default_attestation_capacity() -> usize {
    500
}

fn default_attestation_ttl_secs() -> u64 {
    3600
}

fn default_debounce_secs() -> u64 {
    2
}

fn default_batch_size() -> usize {
    50
}

fn default_heartbeat_secs() -> u64 {
    15
}

fn default_channel_capacity() -> usize {
    256
}

fn default_listener_threshold() -> usize {
    10
}

fn default_monitor_interval_secs() -> u64 {
    60
}

fn default_gateway_port() -> u16 {
    7080
}

fn default_true() -> bool {
    true
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = MirrorConfig::from_toml_str("").unwrap();
        assert_eq!(config.state_capacity, 10_000);
        assert_eq!(config.ranking_capacity, 150);
        assert_eq!(config.attestation_ttl_secs, 3600);
        assert_eq!(config.heartbeat_secs, 15);
        assert!(config.attestation_url.is_none());
    }

    #[test]
    fn partial_file_overrides_some_fields() {
        let config = MirrorConfig::from_toml_str(
            r#"
            ranking_capacity = 25
            debounce_secs = 5
            attestation_url = "http://localhost:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.ranking_capacity, 25);
        assert_eq!(config.debounce(), Duration::from_secs(5));
        assert_eq!(
            config.attestation_url.as_deref(),
            Some("http://localhost:9000")
        );
        // Untouched fields keep defaults.
        assert_eq!(config.batch_size, 50);
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = MirrorConfig::from_toml_str("ranking_capacity = \"many\"").unwrap_err();
        assert!(matches!(err, MirrorError::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.toml");
        std::fs::write(&path, "gateway_port = 9191\n").unwrap();

        let config = MirrorConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.gateway_port, 9191);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = MirrorConfig::from_toml_file("/nonexistent/tally.toml").unwrap_err();
        assert!(matches!(err, MirrorError::Io(_)));
    }
}
