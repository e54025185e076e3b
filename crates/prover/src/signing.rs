//! Proof signing.

use async_trait::async_trait;
use dummy_prover_client::ValidatorClient;
use dummy_prover_types::{
    BlsPublicKey, BlsSignature, ExecutionProof, SignedExecutionProof, SignerIdentity,
};
use tokio_util::sync::CancellationToken;

/// Turns an execution proof into a signed one.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(
        &self,
        proof: ExecutionProof,
        cancel: &CancellationToken,
    ) -> anyhow::Result<SignedExecutionProof>;
}

/// Signs through a validator client's signing endpoint.
#[derive(Debug, Clone)]
pub struct ValidatorSigner {
    client: ValidatorClient,
}

impl ValidatorSigner {
    pub fn new(client: ValidatorClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ValidatorClient {
        &self.client
    }
}

#[async_trait]
impl Signer for ValidatorSigner {
    async fn sign(
        &self,
        proof: ExecutionProof,
        cancel: &CancellationToken,
    ) -> anyhow::Result<SignedExecutionProof> {
        Ok(self.client.sign_execution_proof(&proof, cancel).await?)
    }
}

/// Local signer producing an all-zero signature and public key.
///
/// Only useful where signatures are not verified.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroSigner;

#[async_trait]
impl Signer for ZeroSigner {
    async fn sign(
        &self,
        proof: ExecutionProof,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<SignedExecutionProof> {
        Ok(SignedExecutionProof {
            message: proof,
            signer: SignerIdentity::Pubkey {
                pubkey: BlsPublicKey::ZERO,
            },
            signature: BlsSignature::ZERO,
        })
    }
}
