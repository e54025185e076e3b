//! Dummy execution proof prover.
//!
//! ## Usage
//!
//! ```bash
//! dummy-prover --target-beacon-node http://localhost:3500 --proofs-per-block 2
//! dummy-prover --config prover.toml
//! ```
//!
//! Exits with a non-zero status when the configuration is invalid or the event stream fails.

use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use dummy_prover::{Config, Prover, ProverService, health, metrics::init_metrics};
use futures::future::select_all;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Command-line interface for the dummy prover.
#[derive(Parser, Debug)]
#[command(name = "dummy-prover")]
#[command(about = "Generate placeholder execution proofs for new beacon blocks", long_about = None)]
struct Cli {
    /// TOML config file. When given, all other flags are ignored.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Beacon node to submit proofs to.
    #[arg(long, default_value = "http://localhost:3500")]
    target_beacon_node: Url,

    /// Beacon node to stream block events and fetch blocks from. Defaults to the target.
    #[arg(long)]
    source_beacon_node: Option<Url>,

    /// Validator client used to sign proofs. Proofs are zero-signed when omitted.
    #[arg(long)]
    validator_client: Option<Url>,

    /// Number of proofs per block, between 1 and 8.
    #[arg(long, default_value_t = 2)]
    proofs_per_block: u8,

    /// Simulated proof generation delay in milliseconds.
    #[arg(long, default_value_t = 1000)]
    proof_delay_ms: u64,

    /// Listen address of the health and metrics server.
    #[arg(long, default_value = "0.0.0.0:8080")]
    metrics_addr: SocketAddr,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<Config> {
        if let Some(path) = &self.config {
            return Config::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()));
        }
        Ok(Config {
            target_beacon_node: self.target_beacon_node,
            source_beacon_node: self.source_beacon_node,
            validator_client: self.validator_client,
            proofs_per_block: self.proofs_per_block,
            proof_delay_ms: self.proof_delay_ms,
            metrics_addr: self.metrics_addr,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Cli::parse().into_config()?;
    config.validate().context("invalid configuration")?;

    info!(
        target_beacon_node = %config.target_beacon_node,
        source_beacon_node = %config.source_beacon_node(),
        validator_client = ?config.validator_client.as_ref().map(Url::as_str),
        proofs_per_block = config.proofs_per_block,
        proof_delay_ms = config.proof_delay_ms,
        "Loaded configuration"
    );

    let prover = Prover::from_config(&config)?;
    let metrics = init_metrics().context("failed to install metrics recorder")?;

    let shutdown_token = CancellationToken::new();

    let health_server = tokio::spawn(health::serve(
        config.metrics_addr,
        metrics,
        shutdown_token.clone(),
    ));

    let mut service = {
        let shutdown_token = shutdown_token.clone();
        tokio::spawn(ProverService::new(prover).run(shutdown_token))
    };

    let mut signals: Vec<_> = [SignalKind::interrupt(), SignalKind::terminate()]
        .into_iter()
        .filter_map(|kind| signal(kind).ok())
        .collect();

    if signals.is_empty() {
        bail!("No shutdown signals could be registered");
    }

    let result = tokio::select! {
        _ = select_all(signals.iter_mut().map(|s| Box::pin(s.recv()))) => {
            info!("Received shutdown signal, shutting down");
            shutdown_token.cancel();
            (&mut service).await
        }
        result = &mut service => {
            shutdown_token.cancel();
            result
        }
    };

    if let Err(e) = health::join(health_server).await {
        error!(addr = %config.metrics_addr, error = %e, "Health server failed");
    }

    match result.context("prover service panicked")? {
        Ok(()) => {
            info!("All services stopped, exiting");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Prover service failed");
            Err(e.into())
        }
    }
}
