//! Blinded beacon blocks as served by `GET /eth/v1/beacon/blinded_blocks/{block_id}`.
//!
//! The response is parsed into a JSON tree and converted member by member, so that a missing,
//! mistyped or malformed value is reported with its full path inside the response.

use alloy_primitives::{Address, B256, Bytes};
use serde_json::Value;

use crate::{
    BlsPublicKey, BlsSignature, KzgCommitment, LogsBloom,
    codec::{DecodeError, FieldPath, JsonObject, decode_fixed, expect_str, parse_json},
};

pub const MAX_BLOB_COMMITMENTS_PER_BLOCK: usize = 4096;
pub const MAX_DEPOSIT_REQUESTS_PER_PAYLOAD: usize = 8192;
pub const MAX_WITHDRAWAL_REQUESTS_PER_PAYLOAD: usize = 16;
pub const MAX_CONSOLIDATION_REQUESTS_PER_PAYLOAD: usize = 2;
pub const MAX_EXTRA_DATA_BYTES: usize = 32;

/// A beacon block whose execution payload is reduced to its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlindedBlock {
    pub slot: u64,
    pub parent_root: B256,
    pub body: BlindedBlockBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlindedBlockBody {
    pub execution_payload_header: ExecutionPayloadHeader,
    pub blob_kzg_commitments: Vec<KzgCommitment>,
    pub execution_requests: ExecutionRequests,
}

/// Execution payload header of a blinded block.
///
/// `base_fee_per_gas` holds the fee as a 32-byte little-endian integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPayloadHeader {
    pub parent_hash: B256,
    pub fee_recipient: Address,
    pub state_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: LogsBloom,
    pub prev_randao: B256,
    pub block_number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub extra_data: Bytes,
    pub base_fee_per_gas: B256,
    pub block_hash: B256,
    pub transactions_root: B256,
    pub withdrawals_root: B256,
    pub blob_gas_used: u64,
    pub excess_blob_gas: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionRequests {
    pub deposits: Vec<DepositRequest>,
    pub withdrawals: Vec<WithdrawalRequest>,
    pub consolidations: Vec<ConsolidationRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRequest {
    pub pubkey: BlsPublicKey,
    pub withdrawal_credentials: B256,
    pub amount: u64,
    pub signature: BlsSignature,
    pub index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRequest {
    pub source_address: Address,
    pub validator_pubkey: BlsPublicKey,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationRequest {
    pub source_address: Address,
    pub source_pubkey: BlsPublicKey,
    pub target_pubkey: BlsPublicKey,
}

impl BlindedBlock {
    /// Decodes the body of a `GET /eth/v1/beacon/blinded_blocks/{block_id}` response.
    ///
    /// Only `data.message` is read; the envelope signature and metadata are ignored.
    pub fn from_response_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        let document: Value = parse_json(bytes, &FieldPath::document())?;
        let response = JsonObject::new(&document, FieldPath::document())?;
        let data = response.object("data")?;
        decode_block(&data.object("message")?)
    }

    /// Decodes a bare `BeaconBlock` JSON object.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        let root = FieldPath::root("message");
        let document: Value = parse_json(bytes, &root)?;
        decode_block(&JsonObject::new(&document, root)?)
    }

    pub fn block_hash(&self) -> B256 {
        self.body.execution_payload_header.block_hash
    }
}

fn decode_block(block: &JsonObject<'_, '_>) -> Result<BlindedBlock, DecodeError> {
    Ok(BlindedBlock {
        slot: block.quoted_u64("slot")?,
        parent_root: block.fixed("parent_root")?,
        body: decode_body(&block.object("body")?)?,
    })
}

fn decode_body(body: &JsonObject<'_, '_>) -> Result<BlindedBlockBody, DecodeError> {
    let execution_requests = match body.optional("execution_requests") {
        Some(requests) => decode_execution_requests(&JsonObject::new(
            requests,
            body.path().field("execution_requests"),
        )?)?,
        None => ExecutionRequests::default(),
    };

    Ok(BlindedBlockBody {
        execution_payload_header: decode_header(&body.object("execution_payload_header")?)?,
        blob_kzg_commitments: body.list(
            "blob_kzg_commitments",
            MAX_BLOB_COMMITMENTS_PER_BLOCK,
            |commitment, path| decode_fixed(expect_str(commitment, path)?, path),
        )?,
        execution_requests,
    })
}

fn decode_header(header: &JsonObject<'_, '_>) -> Result<ExecutionPayloadHeader, DecodeError> {
    Ok(ExecutionPayloadHeader {
        parent_hash: header.fixed("parent_hash")?,
        fee_recipient: Address::from(header.fixed::<20>("fee_recipient")?.0),
        state_root: header.fixed("state_root")?,
        receipts_root: header.fixed("receipts_root")?,
        logs_bloom: header.fixed("logs_bloom")?,
        prev_randao: header.fixed("prev_randao")?,
        block_number: header.quoted_u64("block_number")?,
        gas_limit: header.quoted_u64("gas_limit")?,
        gas_used: header.quoted_u64("gas_used")?,
        timestamp: header.quoted_u64("timestamp")?,
        extra_data: header.bytes("extra_data", MAX_EXTRA_DATA_BYTES)?,
        base_fee_per_gas: header.u256_le("base_fee_per_gas")?,
        block_hash: header.fixed("block_hash")?,
        transactions_root: header.fixed("transactions_root")?,
        withdrawals_root: header.fixed("withdrawals_root")?,
        blob_gas_used: header.quoted_u64("blob_gas_used")?,
        excess_blob_gas: header.quoted_u64("excess_blob_gas")?,
    })
}

fn decode_execution_requests(
    requests: &JsonObject<'_, '_>,
) -> Result<ExecutionRequests, DecodeError> {
    Ok(ExecutionRequests {
        deposits: requests.list(
            "deposits",
            MAX_DEPOSIT_REQUESTS_PER_PAYLOAD,
            |deposit, path| decode_deposit(&JsonObject::new(deposit, *path)?),
        )?,
        withdrawals: requests.list(
            "withdrawals",
            MAX_WITHDRAWAL_REQUESTS_PER_PAYLOAD,
            |withdrawal, path| decode_withdrawal(&JsonObject::new(withdrawal, *path)?),
        )?,
        consolidations: requests.list(
            "consolidations",
            MAX_CONSOLIDATION_REQUESTS_PER_PAYLOAD,
            |consolidation, path| decode_consolidation(&JsonObject::new(consolidation, *path)?),
        )?,
    })
}

fn decode_deposit(deposit: &JsonObject<'_, '_>) -> Result<DepositRequest, DecodeError> {
    Ok(DepositRequest {
        pubkey: deposit.fixed("pubkey")?,
        withdrawal_credentials: deposit.fixed("withdrawal_credentials")?,
        amount: deposit.quoted_u64("amount")?,
        signature: deposit.fixed("signature")?,
        index: deposit.quoted_u64("index")?,
    })
}

fn decode_withdrawal(withdrawal: &JsonObject<'_, '_>) -> Result<WithdrawalRequest, DecodeError> {
    Ok(WithdrawalRequest {
        source_address: Address::from(withdrawal.fixed::<20>("source_address")?.0),
        validator_pubkey: withdrawal.fixed("validator_pubkey")?,
        amount: withdrawal.quoted_u64("amount")?,
    })
}

fn decode_consolidation(
    consolidation: &JsonObject<'_, '_>,
) -> Result<ConsolidationRequest, DecodeError> {
    Ok(ConsolidationRequest {
        source_address: Address::from(consolidation.fixed::<20>("source_address")?.0),
        source_pubkey: consolidation.fixed("source_pubkey")?,
        target_pubkey: consolidation.fixed("target_pubkey")?,
    })
}
