//! Payloads of the beacon node's `GET /eth/v1/events` stream.

use alloy_primitives::B256;
use serde_json::Value;

use crate::codec::{DecodeError, FieldPath, JsonObject, parse_json};

/// Topic of the events this crate consumes.
pub const BLOCK_TOPIC: &str = "block";

/// A `block` event: a new block was imported at `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockNotification {
    pub slot: u64,
    pub block_root: B256,
}

impl BlockNotification {
    /// Decodes the `data:` payload of a `block` event.
    ///
    /// Fields other than `slot` and `block` (e.g. `execution_optimistic`) are ignored.
    pub fn from_json(data: &str) -> Result<Self, DecodeError> {
        let root = FieldPath::root("block_event");
        let document: Value = parse_json(data.as_bytes(), &root)?;
        let event = JsonObject::new(&document, root)?;
        Ok(Self {
            slot: event.quoted_u64("slot")?,
            block_root: event.fixed("block")?,
        })
    }
}
