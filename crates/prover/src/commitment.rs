//! Commitment root a block's execution proofs are bound to.
//!
//! The root is taken over a `NewPayloadRequest` header assembled from the blinded block. How the
//! header is reduced to 32 bytes is left to a [`PayloadRequestHasher`].

use dummy_prover_types::{
    B256, BlindedBlock, ExecutionPayloadHeader, ExecutionRequests, KzgCommitment,
};
use sha2::{Digest, Sha256};

/// Version byte of versioned hashes derived from KZG commitments.
pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

/// `kzg_to_versioned_hash`: SHA-256 of the commitment with its first byte replaced by the
/// version marker.
pub fn kzg_commitment_to_versioned_hash(commitment: &KzgCommitment) -> B256 {
    let mut hash: [u8; 32] = Sha256::digest(commitment).into();
    hash[0] = VERSIONED_HASH_VERSION_KZG;
    B256::from(hash)
}

/// Execution-relevant part of a block as handed to the execution layer.
#[derive(Debug, Clone)]
pub struct NewPayloadRequestHeader<'a> {
    pub execution_payload_header: &'a ExecutionPayloadHeader,
    pub versioned_hashes: Vec<B256>,
    /// Taken from the block itself rather than derived from the parent state.
    pub parent_beacon_block_root: B256,
    pub execution_requests: &'a ExecutionRequests,
}

impl<'a> NewPayloadRequestHeader<'a> {
    pub fn from_block(block: &'a BlindedBlock) -> Self {
        Self {
            execution_payload_header: &block.body.execution_payload_header,
            versioned_hashes: block
                .body
                .blob_kzg_commitments
                .iter()
                .map(kzg_commitment_to_versioned_hash)
                .collect(),
            parent_beacon_block_root: block.parent_root,
            execution_requests: &block.body.execution_requests,
        }
    }
}

/// Reduces a [`NewPayloadRequestHeader`] to a single root.
///
/// Implementations must give structurally distinct headers distinct roots with overwhelming
/// probability.
pub trait PayloadRequestHasher: Send + Sync {
    fn hash_tree_root(&self, header: &NewPayloadRequestHeader<'_>) -> B256;
}

/// Stand-in for the SSZ hash tree root: SHA-256 of the execution block hash.
///
/// Every other header field is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderHasher;

impl PayloadRequestHasher for PlaceholderHasher {
    fn hash_tree_root(&self, header: &NewPayloadRequestHeader<'_>) -> B256 {
        let hash: [u8; 32] = Sha256::digest(header.execution_payload_header.block_hash).into();
        B256::from(hash)
    }
}

/// Computes the commitment root of `block` with `hasher`.
pub fn commitment_root(block: &BlindedBlock, hasher: &dyn PayloadRequestHasher) -> B256 {
    hasher.hash_tree_root(&NewPayloadRequestHeader::from_block(block))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLINDED_BLOCK: &str = include_str!("../../types/testdata/blinded_block.json");

    fn block() -> BlindedBlock {
        BlindedBlock::from_response_json(BLINDED_BLOCK.as_bytes()).unwrap()
    }

    #[test]
    fn versioned_hash_replaces_first_byte() {
        let commitment = KzgCommitment::repeat_byte(0xa1);
        let hash = kzg_commitment_to_versioned_hash(&commitment);

        let digest: [u8; 32] = Sha256::digest(commitment).into();
        assert_eq!(hash[0], VERSIONED_HASH_VERSION_KZG);
        assert_eq!(hash[1..], digest[1..]);
    }

    #[test]
    fn header_carries_block_fields() {
        let block = block();
        let header = NewPayloadRequestHeader::from_block(&block);

        assert_eq!(header.versioned_hashes.len(), 2);
        assert!(header.versioned_hashes.iter().all(|hash| hash[0] == 0x01));
        assert_eq!(header.parent_beacon_block_root, block.parent_root);
        assert_eq!(header.execution_requests.deposits.len(), 1);
    }

    #[test]
    fn placeholder_root_hashes_block_hash() {
        let block = block();
        let root = commitment_root(&block, &PlaceholderHasher);

        let expected: [u8; 32] = Sha256::digest(block.block_hash()).into();
        assert_eq!(root, B256::from(expected));
    }

    #[test]
    fn distinct_block_hashes_give_distinct_roots() {
        let block = block();
        let mut other = block.clone();
        other.body.execution_payload_header.block_hash = B256::repeat_byte(0x01);

        assert_ne!(
            commitment_root(&block, &PlaceholderHasher),
            commitment_root(&other, &PlaceholderHasher)
        );
    }
}
