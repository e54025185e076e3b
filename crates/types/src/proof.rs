//! Execution proofs exchanged with the prover and validator APIs.
//!
//! Proofs are encoded the beacon-API way: byte strings as `0x`-prefixed hex and integers as
//! quoted decimals.

use std::fmt;

use alloy_primitives::{B256, Bytes};
use serde::{Deserialize, Serialize};

use crate::{BlsPublicKey, BlsSignature};

/// Upper bound on the number of distinct proof types submitted per block.
pub const MAX_PROOF_TYPES: u8 = 8;

/// Identifies which of the parallel proof slots of a block a proof fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofType(#[serde(with = "serde_utils::quoted_u8")] pub u8);

impl ProofType {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u8> for ProofType {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

/// Public input a proof is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInput {
    pub new_payload_request_root: B256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionProof {
    pub proof_data: Bytes,
    pub proof_type: ProofType,
    pub public_input: PublicInput,
}

/// Who signed a proof: a validator by index, or a raw BLS public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignerIdentity {
    ValidatorIndex {
        #[serde(with = "serde_utils::quoted_u64")]
        validator_index: u64,
    },
    Pubkey {
        pubkey: BlsPublicKey,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedExecutionProof {
    pub message: ExecutionProof,
    #[serde(flatten)]
    pub signer: SignerIdentity,
    pub signature: BlsSignature,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn proof() -> ExecutionProof {
        ExecutionProof {
            proof_data: Bytes::from_static(&[0xff, 0x01, 0xaa, 0xbb, 0xcc, 0xdd]),
            proof_type: ProofType(1),
            public_input: PublicInput {
                new_payload_request_root: B256::repeat_byte(0x42),
            },
        }
    }

    #[test]
    fn serializes_beacon_api_shape() {
        let signed = SignedExecutionProof {
            message: proof(),
            signer: SignerIdentity::ValidatorIndex {
                validator_index: 17,
            },
            signature: BlsSignature::repeat_byte(0x09),
        };

        let value = serde_json::to_value(&signed).unwrap();
        assert_eq!(
            value,
            json!({
                "message": {
                    "proof_data": "0xff01aabbccdd",
                    "proof_type": "1",
                    "public_input": {
                        "new_payload_request_root": format!("0x{}", "42".repeat(32)),
                    },
                },
                "validator_index": "17",
                "signature": format!("0x{}", "09".repeat(96)),
            })
        );
    }

    #[test]
    fn deserializes_either_signer_identity() {
        let message = serde_json::to_value(proof()).unwrap();
        let signature = format!("0x{}", "00".repeat(96));

        let by_index: SignedExecutionProof = serde_json::from_value(json!({
            "message": message,
            "validator_index": "3",
            "signature": signature,
        }))
        .unwrap();
        assert_eq!(
            by_index.signer,
            SignerIdentity::ValidatorIndex { validator_index: 3 }
        );
        assert_eq!(by_index.message, proof());

        let by_pubkey: SignedExecutionProof = serde_json::from_value(json!({
            "message": message,
            "pubkey": format!("0x{}", "00".repeat(48)),
            "signature": signature,
        }))
        .unwrap();
        assert_eq!(
            by_pubkey.signer,
            SignerIdentity::Pubkey {
                pubkey: BlsPublicKey::ZERO
            }
        );
    }

    #[test]
    fn signature_must_be_96_bytes() {
        let result: Result<SignedExecutionProof, _> = serde_json::from_value(json!({
            "message": serde_json::to_value(proof()).unwrap(),
            "validator_index": "3",
            "signature": "0x00",
        }));
        assert!(result.is_err());
    }
}
