//! Proof generation.

use async_trait::async_trait;
use dummy_prover_types::{B256, BlindedBlock, Bytes, ExecutionProof, ProofType, PublicInput};

/// First byte of every placeholder proof.
pub const PLACEHOLDER_PROOF_MARKER: u8 = 0xff;

/// Produces the execution proof filling one proof slot of a block.
#[async_trait]
pub trait ProofGenerator: Send + Sync {
    /// Prove `block` for slot `proof_type`, binding the proof to `commitment_root`.
    async fn generate(
        &self,
        block: &BlindedBlock,
        proof_type: ProofType,
        commitment_root: B256,
    ) -> anyhow::Result<ExecutionProof>;
}

/// Generator that emits a fixed 6-byte payload instead of a real proof.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderProofGenerator;

#[async_trait]
impl ProofGenerator for PlaceholderProofGenerator {
    async fn generate(
        &self,
        block: &BlindedBlock,
        proof_type: ProofType,
        commitment_root: B256,
    ) -> anyhow::Result<ExecutionProof> {
        Ok(ExecutionProof {
            proof_data: placeholder_proof_data(proof_type, &block.block_hash()),
            proof_type,
            public_input: PublicInput {
                new_payload_request_root: commitment_root,
            },
        })
    }
}

/// `[0xFF, proof_type, block_hash[0..4]]`.
pub fn placeholder_proof_data(proof_type: ProofType, block_hash: &B256) -> Bytes {
    let mut data = Vec::with_capacity(6);
    data.push(PLACEHOLDER_PROOF_MARKER);
    data.push(proof_type.0);
    data.extend_from_slice(&block_hash[..4]);
    data.into()
}
