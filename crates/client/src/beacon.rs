//! Beacon node HTTP API client.

use std::time::Duration;

use dummy_prover_types::{BlindedBlock, BlockId, SignedExecutionProof};
use reqwest::{StatusCode, header::ACCEPT};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::{
    Error, Result,
    sse::{BlockEventStream, subscribe_block_events},
    http::{base_url, cancellable, protocol_error},
};

/// Timeout applied to every request/response round trip unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

/// Consensus layer HTTP API client.
///
/// Performs no retries; every operation is a single round trip that the caller may repeat.
#[derive(Clone, Debug)]
pub struct BeaconClient {
    name: String,
    url: Url,
    http_client: reqwest::Client,
}

impl BeaconClient {
    /// Create a new beacon client with [`DEFAULT_TIMEOUT`].
    pub fn new(name: impl Into<String>, url: Url) -> Result<Self> {
        Self::with_timeout(name, url, DEFAULT_TIMEOUT)
    }

    /// Create a new beacon client whose requests time out after `timeout`.
    pub fn with_timeout(name: impl Into<String>, url: Url, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            name: name.into(),
            url: base_url(url),
            http_client,
        })
    }

    /// Return name of the beacon client.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return url of the beacon client.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch a signed blinded block and return its message.
    ///
    /// A 404 is reported as [`Error::NotFound`]; any other status but 200 as
    /// [`Error::Protocol`] carrying the response body.
    pub async fn get_blinded_block(
        &self,
        block_id: BlockId,
        cancel: &CancellationToken,
    ) -> Result<BlindedBlock> {
        let url = self
            .url
            .join(&format!("eth/v1/beacon/blinded_blocks/{block_id}"))?;

        cancellable(cancel, async {
            let response = self
                .http_client
                .get(url.clone())
                .header(ACCEPT, "application/json")
                .send()
                .await?;

            match response.status() {
                StatusCode::OK => {
                    let body = response.bytes().await?;
                    Ok(BlindedBlock::from_response_json(&body)?)
                }
                StatusCode::NOT_FOUND => Err(Error::NotFound(block_id)),
                _ => Err(protocol_error(url, response).await),
            }
        })
        .await
    }

    /// Submit a signed execution proof to the node's proof pool.
    ///
    /// Both 200 and 202 count as success since the node may accept asynchronously.
    pub async fn submit_execution_proof(
        &self,
        proof: &SignedExecutionProof,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let url = self.url.join("eth/v1/prover/execution_proofs")?;

        cancellable(cancel, async {
            let response = self
                .http_client
                .post(url.clone())
                .header(ACCEPT, "application/json")
                .json(proof)
                .send()
                .await?;

            match response.status() {
                StatusCode::OK | StatusCode::ACCEPTED => {
                    debug!(
                        name = %self.name,
                        proof_type = %proof.message.proof_type,
                        "Execution proof accepted"
                    );
                    Ok(())
                }
                _ => Err(protocol_error(url, response).await),
            }
        })
        .await
    }

    /// Subscribe to `block` events on this node.
    ///
    /// See [`subscribe_block_events`].
    pub fn subscribe_block_events(
        &self,
        cancel: CancellationToken,
        capacity: usize,
    ) -> Result<BlockEventStream> {
        subscribe_block_events(self.name.clone(), &self.url, cancel, capacity)
    }
}
