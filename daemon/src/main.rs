//! Tally daemon — runs the state mirror and its push gateway.

mod logging;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use tally_bus::spawn_listener_monitor;
use tally_gateway::GatewayServer;
use tally_mirror::{
    AttestationLookup, DisabledLookup, HttpAttestationClient, MirrorConfig, MirrorService,
};
use tally_ranking::{RewardFormula, StaticRateFormula};

#[derive(Parser)]
#[command(name = "tally-daemon", about = "Tally state mirror and push gateway")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port the gateway binds to.
    #[arg(long, env = "TALLY_GATEWAY_PORT")]
    port: Option<u16>,

    /// Base URL of the identity-attestation service.
    #[arg(long, env = "TALLY_ATTESTATION_URL")]
    attestation_url: Option<String>,

    /// Disable the Prometheus metrics endpoint.
    #[arg(long, env = "TALLY_DISABLE_METRICS")]
    disable_metrics: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TALLY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TALLY_LOG_FORMAT")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => MirrorConfig::from_toml_file(path)?,
        None => MirrorConfig::default(),
    };
    if let Some(port) = cli.port {
        config.gateway_port = port;
    }
    if cli.attestation_url.is_some() {
        config.attestation_url = cli.attestation_url;
    }
    if cli.disable_metrics {
        config.enable_metrics = false;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    logging::init(&config.log_format, &config.log_level);

    let formula: Arc<dyn RewardFormula> = Arc::new(StaticRateFormula::default());
    let lookup: Arc<dyn AttestationLookup> = match &config.attestation_url {
        Some(url) => Arc::new(HttpAttestationClient::new(url.clone())),
        None => Arc::new(DisabledLookup),
    };

    tracing::info!(
        port = config.gateway_port,
        attestation = config.attestation_url.is_some(),
        "starting tally mirror"
    );

    let service = MirrorService::new(config.clone(), formula, lookup);
    spawn_listener_monitor(
        Arc::clone(service.bus()),
        config.listener_threshold,
        config.monitor_interval(),
    );

    let server = GatewayServer::new(service);
    server.start().await?;
    Ok(())
}
