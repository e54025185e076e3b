//! Shared type definitions for the dummy prover.
//!
//! This crate holds the data model exchanged with beacon nodes and validator clients, and the
//! codec that turns the beacon API's JSON encoding into canonical binary values.
//!
//! ## Overview
//!
//! - [`BlockNotification`] - payload of a `block` event on the node's event stream
//! - [`BlindedBlock`] - a blinded beacon block, decoded field by field with [`DecodeError`]s
//!   that name the offending field path
//! - [`ExecutionProof`] and [`SignedExecutionProof`] - what gets signed and submitted
//! - [`BlockId`] - identifiers accepted by the block endpoints

pub use alloy_primitives::{Address, B256, Bytes, FixedBytes};

pub use block::{
    BlindedBlock, BlindedBlockBody, ConsolidationRequest, DepositRequest, ExecutionPayloadHeader,
    ExecutionRequests, WithdrawalRequest,
};
pub use block_id::BlockId;
pub use codec::{DecodeError, DecodeErrorReason, FieldPath};
pub use event::{BLOCK_TOPIC, BlockNotification};
pub use proof::{
    ExecutionProof, MAX_PROOF_TYPES, ProofType, PublicInput, SignedExecutionProof, SignerIdentity,
};

pub mod block;
pub mod codec;
pub mod event;
pub mod proof;

mod block_id;

pub type Hash256 = B256;
pub type BlsPublicKey = FixedBytes<48>;
pub type BlsSignature = FixedBytes<96>;
pub type KzgCommitment = FixedBytes<48>;
pub type LogsBloom = FixedBytes<256>;
