//! Validator client signing API.

use std::time::Duration;

use dummy_prover_types::{ExecutionProof, FieldPath, SignedExecutionProof, codec::parse_json};
use reqwest::{StatusCode, header::ACCEPT};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    DEFAULT_TIMEOUT, Error, Result,
    http::{base_url, cancellable, protocol_error},
};

#[derive(Serialize)]
struct SignRequest<'a> {
    data: &'a ExecutionProof,
}

#[derive(Deserialize)]
struct SignResponse {
    data: Option<SignedExecutionProof>,
}

/// Client for a validator client that signs execution proofs on request.
#[derive(Clone, Debug)]
pub struct ValidatorClient {
    name: String,
    url: Url,
    http_client: reqwest::Client,
}

impl ValidatorClient {
    pub fn new(name: impl Into<String>, url: Url) -> Result<Self> {
        Self::with_timeout(name, url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(name: impl Into<String>, url: Url, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            name: name.into(),
            url: base_url(url),
            http_client,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Ask the validator client to sign `proof`.
    ///
    /// Anything but a 200 carrying a signed proof under `data` is an error.
    pub async fn sign_execution_proof(
        &self,
        proof: &ExecutionProof,
        cancel: &CancellationToken,
    ) -> Result<SignedExecutionProof> {
        let url = self.url.join("eth/v2/validator/execution_proofs")?;

        cancellable(cancel, async {
            let response = self
                .http_client
                .post(url.clone())
                .header(ACCEPT, "application/json")
                .json(&SignRequest { data: proof })
                .send()
                .await?;

            if response.status() != StatusCode::OK {
                return Err(protocol_error(url, response).await);
            }

            let body = response.bytes().await?;
            let response: SignResponse = parse_json(&body, &FieldPath::root("data"))?;
            response.data.ok_or(Error::EmptyResponse(url))
        })
        .await
    }
}
