//! Error types for the dummy prover.

use std::fmt;

use dummy_prover_client::Error as ClientError;
use dummy_prover_types::{BlockId, ProofType};
use thiserror::Error;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Generate,
    Sign,
    Submit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fetch => "fetch",
            Self::Generate => "generate",
            Self::Sign => "sign",
            Self::Submit => "submit",
        })
    }
}

/// Errors that can occur in the dummy prover.
#[derive(Debug, Error)]
pub enum Error {
    /// The block could not be fetched from the source node.
    #[error("failed to fetch block {block_id}: {source}")]
    Fetch {
        block_id: BlockId,
        #[source]
        source: ClientError,
    },

    #[error("failed to generate proof type {proof_type}: {source}")]
    Generate {
        proof_type: ProofType,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to sign proof type {proof_type}: {source}")]
    Sign {
        proof_type: ProofType,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to submit proof type {proof_type}: {source}")]
    Submit {
        proof_type: ProofType,
        #[source]
        source: ClientError,
    },

    /// A proof task panicked or was aborted.
    #[error("{stage} task for proof type {} aborted: {reason}", display_proof_type(proof_type))]
    TaskAborted {
        stage: Stage,
        proof_type: Option<ProofType>,
        reason: String,
    },

    /// Shutdown was requested.
    #[error("operation cancelled")]
    Cancelled,

    /// The block event subscription failed.
    #[error("event stream failed: {0}")]
    Stream(#[from] ClientError),

    /// Failed to load or validate configuration.
    #[error("config error: {0}")]
    Config(String),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml_edit::de::Error),
}

fn display_proof_type(proof_type: &Option<ProofType>) -> String {
    proof_type.map_or_else(|| "?".to_string(), |proof_type| proof_type.to_string())
}

impl Error {
    /// Stage of the per-block pipeline this error belongs to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Fetch { .. } => Some(Stage::Fetch),
            Self::Generate { .. } => Some(Stage::Generate),
            Self::Sign { .. } => Some(Stage::Sign),
            Self::Submit { .. } => Some(Stage::Submit),
            Self::TaskAborted { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Proof slot this error belongs to, if any.
    pub fn proof_type(&self) -> Option<ProofType> {
        match self {
            Self::Generate { proof_type, .. }
            | Self::Sign { proof_type, .. }
            | Self::Submit { proof_type, .. } => Some(*proof_type),
            Self::TaskAborted { proof_type, .. } => *proof_type,
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the block was missing on the source node.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Fetch { source, .. } if source.is_not_found())
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
