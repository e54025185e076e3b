use dummy_prover_types::{BlockId, DecodeError};
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// Error type for beacon node and validator client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection, DNS, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with an unexpected status.
    #[error("request to {url} failed with status {status}: {body}")]
    Protocol {
        url: Url,
        status: StatusCode,
        /// Response body, kept verbatim for diagnostics.
        body: String,
    },

    /// The response could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The requested block does not exist on the node.
    #[error("block {0} not found")]
    NotFound(BlockId),

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The signer answered 200 without a signed proof.
    #[error("response from {0} carried no data")]
    EmptyResponse(Url),

    /// The server closed the event stream.
    #[error("event stream closed by server")]
    StreamEnded,

    /// A URL could not be built from the configured base URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
