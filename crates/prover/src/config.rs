//! Configuration types for the dummy prover.

use std::{net::SocketAddr, path::Path, time::Duration};

use dummy_prover_types::{MAX_PROOF_TYPES, ProofType};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Prover configuration.
///
/// Keys use the same kebab-case names as the command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Beacon node that receives the signed proofs.
    #[serde(default = "default_target_beacon_node")]
    pub target_beacon_node: Url,
    /// Beacon node streaming block events and serving blocks. Defaults to the target.
    #[serde(default)]
    pub source_beacon_node: Option<Url>,
    /// Validator client that signs proofs. Proofs are zero-signed when absent.
    #[serde(default)]
    pub validator_client: Option<Url>,
    /// Number of proofs generated and submitted per block.
    #[serde(default = "default_proofs_per_block")]
    pub proofs_per_block: u8,
    /// Simulated proof generation latency in milliseconds.
    #[serde(default = "default_proof_delay_ms")]
    pub proof_delay_ms: u64,
    /// Listen address of the health and metrics server.
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: SocketAddr,
}

pub fn default_target_beacon_node() -> Url {
    Url::parse("http://localhost:3500").expect("valid default URL")
}

pub fn default_proofs_per_block() -> u8 {
    2
}

pub fn default_proof_delay_ms() -> u64 {
    1000
}

pub fn default_metrics_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_beacon_node: default_target_beacon_node(),
            source_beacon_node: None,
            validator_client: None,
            proofs_per_block: default_proofs_per_block(),
            proof_delay_ms: default_proof_delay_ms(),
            metrics_addr: default_metrics_addr(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml_edit::de::from_str(content)?)
    }

    /// Checks the values serde cannot.
    pub fn validate(&self) -> Result<()> {
        ProofsPerBlock::new(self.proofs_per_block)?;

        let urls = [
            ("target-beacon-node", Some(&self.target_beacon_node)),
            ("source-beacon-node", self.source_beacon_node.as_ref()),
            ("validator-client", self.validator_client.as_ref()),
        ];
        for (key, url) in urls {
            if let Some(url) = url
                && !matches!(url.scheme(), "http" | "https")
            {
                return Err(Error::Config(format!(
                    "{key} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        Ok(())
    }

    /// The node events and blocks are read from.
    pub fn source_beacon_node(&self) -> &Url {
        self.source_beacon_node
            .as_ref()
            .unwrap_or(&self.target_beacon_node)
    }

    pub fn proof_delay(&self) -> Duration {
        Duration::from_millis(self.proof_delay_ms)
    }
}

/// Validated number of proof slots per block, within `1..=MAX_PROOF_TYPES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofsPerBlock(u8);

impl ProofsPerBlock {
    pub fn new(count: u8) -> Result<Self> {
        if !(1..=MAX_PROOF_TYPES).contains(&count) {
            return Err(Error::Config(format!(
                "proofs-per-block must be between 1 and {MAX_PROOF_TYPES}, got {count}"
            )));
        }
        Ok(Self(count))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Proof types `0..count`, in order.
    pub fn proof_types(self) -> impl Iterator<Item = ProofType> {
        (0..self.0).map(ProofType)
    }
}

impl Default for ProofsPerBlock {
    fn default() -> Self {
        Self(default_proofs_per_block())
    }
}
