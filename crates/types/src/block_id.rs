use std::{fmt, str::FromStr};

use alloy_primitives::B256;

use crate::codec::{DecodeError, DecodeErrorReason, FieldPath, decode_fixed, decode_quoted_u64};

/// Identifier accepted by the beacon API's block endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockId {
    Head,
    Genesis,
    Finalized,
    Justified,
    Slot(u64),
    Root(B256),
}

impl fmt::Display for BlockId {
    /// Renders the identifier as a URL path segment; slots are bare decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => f.write_str("head"),
            Self::Genesis => f.write_str("genesis"),
            Self::Finalized => f.write_str("finalized"),
            Self::Justified => f.write_str("justified"),
            Self::Slot(slot) => write!(f, "{slot}"),
            Self::Root(root) => write!(f, "{root}"),
        }
    }
}

impl FromStr for BlockId {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = FieldPath::root("block_id");
        match s {
            "head" => Ok(Self::Head),
            "genesis" => Ok(Self::Genesis),
            "finalized" => Ok(Self::Finalized),
            "justified" => Ok(Self::Justified),
            root if root.starts_with("0x") => decode_fixed(root, &path).map(Self::Root),
            slot if slot.bytes().all(|b| b.is_ascii_digit()) && !slot.is_empty() => {
                decode_quoted_u64(slot, &path).map(Self::Slot)
            }
            other => Err(DecodeError::new(
                &path,
                DecodeErrorReason::InvalidBlockId(other.to_string()),
            )),
        }
    }
}

impl From<u64> for BlockId {
    fn from(slot: u64) -> Self {
        Self::Slot(slot)
    }
}

impl From<B256> for BlockId {
    fn from(root: B256) -> Self {
        Self::Root(root)
    }
}
