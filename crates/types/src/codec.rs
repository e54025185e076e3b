//! Decoding of the loosely-typed beacon-API JSON encoding.
//!
//! The beacon API transports byte strings as `0x`-prefixed hex and 64-bit integers as quoted
//! decimals. Every helper here takes the [`FieldPath`] of the value being decoded so that a
//! failure names the exact field that was malformed.

use std::{fmt, num::ParseIntError};

use alloy_primitives::{B256, Bytes, FixedBytes, hex};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// A failure to decode a beacon-API JSON document.
#[derive(Debug, Error)]
#[error("invalid `{path}`: {reason}")]
pub struct DecodeError {
    /// Dotted path of the offending field, e.g. `data.message.body.blob_kzg_commitments[1]`.
    pub path: String,
    /// What was wrong with it.
    pub reason: DecodeErrorReason,
}

impl DecodeError {
    pub fn new(path: &FieldPath<'_>, reason: impl Into<DecodeErrorReason>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Reason a field failed to decode.
#[derive(Debug, Error)]
pub enum DecodeErrorReason {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("expected at most {max} bytes, got {actual}")]
    TooManyBytes { max: usize, actual: usize },

    #[error("invalid quoted integer {value:?}")]
    InvalidInteger {
        value: String,
        #[source]
        source: Option<ParseIntError>,
    },

    #[error("expected at most {max} items, got {actual}")]
    TooManyItems { max: usize, actual: usize },

    #[error("missing field")]
    MissingField,

    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown block identifier {0:?}")]
    InvalidBlockId(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Location of a value inside a JSON document.
///
/// Paths are built on the stack while descending into a document and are only rendered to a
/// string when a decode fails.
#[derive(Clone, Copy, Debug)]
pub struct FieldPath<'a> {
    parent: Option<&'a FieldPath<'a>>,
    segment: Segment<'a>,
}

#[derive(Clone, Copy, Debug)]
enum Segment<'a> {
    Document,
    Field(&'a str),
    Index(usize),
}

impl FieldPath<'static> {
    /// The top level of a JSON document. Its children render without a leading dot and it
    /// renders as `$` on its own.
    pub const fn document() -> Self {
        Self {
            parent: None,
            segment: Segment::Document,
        }
    }
}

impl<'a> FieldPath<'a> {
    pub const fn root(name: &'a str) -> Self {
        Self {
            parent: None,
            segment: Segment::Field(name),
        }
    }

    pub fn field<'b>(&'b self, name: &'b str) -> FieldPath<'b>
    where
        'a: 'b,
    {
        FieldPath {
            parent: Some(self),
            segment: Segment::Field(name),
        }
    }

    pub fn index<'b>(&'b self, index: usize) -> FieldPath<'b>
    where
        'a: 'b,
    {
        FieldPath {
            parent: Some(self),
            segment: Segment::Index(index),
        }
    }
}

impl fmt::Display for FieldPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parent = self
            .parent
            .filter(|parent| !matches!(parent.segment, Segment::Document));
        if let Some(parent) = parent {
            parent.fmt(f)?;
        }
        match self.segment {
            Segment::Document => f.write_str("$"),
            Segment::Field(name) if parent.is_some() => write!(f, ".{name}"),
            Segment::Field(name) => f.write_str(name),
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Decodes a hex string of exactly `N` bytes. The `0x` prefix is optional.
pub fn decode_fixed<const N: usize>(
    value: &str,
    path: &FieldPath<'_>,
) -> Result<FixedBytes<N>, DecodeError> {
    let bytes = hex::decode(value).map_err(|e| DecodeError::new(path, e))?;
    let array: [u8; N] = bytes.as_slice().try_into().map_err(|_| {
        DecodeError::new(
            path,
            DecodeErrorReason::InvalidLength {
                expected: N,
                actual: bytes.len(),
            },
        )
    })?;
    Ok(FixedBytes(array))
}

/// Decodes a variable-length hex string holding at most `max` bytes.
pub fn decode_bytes(value: &str, max: usize, path: &FieldPath<'_>) -> Result<Bytes, DecodeError> {
    let bytes = hex::decode(value).map_err(|e| DecodeError::new(path, e))?;
    if bytes.len() > max {
        return Err(DecodeError::new(
            path,
            DecodeErrorReason::TooManyBytes {
                max,
                actual: bytes.len(),
            },
        ));
    }
    Ok(bytes.into())
}

/// Parses a decimal string into a `u64`.
///
/// Only ASCII digits are accepted; signs, whitespace and values above `u64::MAX` are rejected.
pub fn decode_quoted_u64(value: &str, path: &FieldPath<'_>) -> Result<u64, DecodeError> {
    let invalid = |source| {
        DecodeError::new(
            path,
            DecodeErrorReason::InvalidInteger {
                value: value.to_string(),
                source,
            },
        )
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(None));
    }
    value.parse::<u64>().map_err(|e| invalid(Some(e)))
}

/// Parses a decimal base fee and re-encodes it as a 32-byte little-endian integer.
///
/// The low-order byte lands at index 0 and bytes 8..32 are always zero.
pub fn decode_u256_le(value: &str, path: &FieldPath<'_>) -> Result<B256, DecodeError> {
    let fee = decode_quoted_u64(value, path)?;
    let mut out = [0u8; 32];
    out[..8].copy_from_slice(&fee.to_le_bytes());
    Ok(B256::from(out))
}

/// Decodes every element of a bounded sequence, indexing the path per element.
pub fn decode_list<R, T>(
    items: &[R],
    max: usize,
    path: &FieldPath<'_>,
    mut decode: impl FnMut(&R, &FieldPath<'_>) -> Result<T, DecodeError>,
) -> Result<Vec<T>, DecodeError> {
    if items.len() > max {
        return Err(DecodeError::new(
            path,
            DecodeErrorReason::TooManyItems {
                max,
                actual: items.len(),
            },
        ));
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| decode(item, &path.index(index)))
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn unexpected(value: &Value, expected: &'static str, path: &FieldPath<'_>) -> DecodeError {
    DecodeError::new(
        path,
        DecodeErrorReason::UnexpectedType {
            expected,
            found: type_name(value),
        },
    )
}

/// Borrows `value` as a string.
pub fn expect_str<'v>(value: &'v Value, path: &FieldPath<'_>) -> Result<&'v str, DecodeError> {
    value
        .as_str()
        .ok_or_else(|| unexpected(value, "string", path))
}

/// A JSON object under decode, together with its location in the document.
///
/// Every accessor reports a missing or mistyped member at the member's own path.
#[derive(Clone, Copy, Debug)]
pub struct JsonObject<'v, 'p> {
    members: &'v Map<String, Value>,
    path: FieldPath<'p>,
}

impl<'v, 'p> JsonObject<'v, 'p> {
    pub fn new(value: &'v Value, path: FieldPath<'p>) -> Result<Self, DecodeError> {
        match value {
            Value::Object(members) => Ok(Self { members, path }),
            other => Err(unexpected(other, "object", &path)),
        }
    }

    pub fn path(&self) -> &FieldPath<'p> {
        &self.path
    }

    /// Returns member `name`, treating an explicit `null` as absent.
    pub fn optional(&self, name: &str) -> Option<&'v Value> {
        self.members.get(name).filter(|value| !value.is_null())
    }

    pub fn required(&self, name: &str) -> Result<&'v Value, DecodeError> {
        self.members.get(name).ok_or_else(|| {
            DecodeError::new(&self.path.field(name), DecodeErrorReason::MissingField)
        })
    }

    pub fn str(&self, name: &str) -> Result<&'v str, DecodeError> {
        expect_str(self.required(name)?, &self.path.field(name))
    }

    pub fn object<'s>(&'s self, name: &'s str) -> Result<JsonObject<'v, 's>, DecodeError> {
        JsonObject::new(self.required(name)?, self.path.field(name))
    }

    pub fn fixed<const N: usize>(&self, name: &str) -> Result<FixedBytes<N>, DecodeError> {
        decode_fixed(self.str(name)?, &self.path.field(name))
    }

    pub fn bytes(&self, name: &str, max: usize) -> Result<Bytes, DecodeError> {
        decode_bytes(self.str(name)?, max, &self.path.field(name))
    }

    pub fn quoted_u64(&self, name: &str) -> Result<u64, DecodeError> {
        decode_quoted_u64(self.str(name)?, &self.path.field(name))
    }

    pub fn u256_le(&self, name: &str) -> Result<B256, DecodeError> {
        decode_u256_le(self.str(name)?, &self.path.field(name))
    }

    /// Decodes a bounded array member. An absent or `null` member is an empty sequence.
    pub fn list<T>(
        &self,
        name: &str,
        max: usize,
        decode: impl FnMut(&Value, &FieldPath<'_>) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        let path = self.path.field(name);
        let items = match self.optional(name) {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(other) => return Err(unexpected(other, "array", &path)),
        };
        decode_list(items.as_slice(), max, &path, decode)
    }
}

/// Deserializes a JSON document, attributing syntax and shape errors to `path`.
pub fn parse_json<T: DeserializeOwned>(
    bytes: &[u8],
    path: &FieldPath<'_>,
) -> Result<T, DecodeError> {
    serde_json::from_slice(bytes).map_err(|e| DecodeError::new(path, e))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::hex;

    use super::*;

    #[test]
    fn field_path_renders_fields_and_indices() {
        let root = FieldPath::root("data");
        let body = root.field("body");
        let list = body.field("blob_kzg_commitments");
        let item = list.index(3);
        assert_eq!(item.to_string(), "data.body.blob_kzg_commitments[3]");
        assert_eq!(root.to_string(), "data");

        let document = FieldPath::document();
        assert_eq!(document.to_string(), "$");
        assert_eq!(document.field("data").index(0).to_string(), "data[0]");
    }

    #[test]
    fn object_members_report_their_own_path() {
        let value = serde_json::json!({
            "slot": 5,
            "root": null,
            "inner": { "amount": "12" },
            "items": "0x01",
        });
        let object = JsonObject::new(&value, FieldPath::document()).unwrap();

        let err = object.quoted_u64("slot").unwrap_err();
        assert_eq!(err.path, "slot");
        assert!(matches!(
            err.reason,
            DecodeErrorReason::UnexpectedType {
                expected: "string",
                found: "number"
            }
        ));

        let err = object.fixed::<32>("root").unwrap_err();
        assert_eq!(err.path, "root");
        assert!(matches!(
            err.reason,
            DecodeErrorReason::UnexpectedType { found: "null", .. }
        ));

        let inner = object.object("inner").unwrap();
        assert_eq!(inner.quoted_u64("amount").unwrap(), 12);
        let err = inner.str("index").unwrap_err();
        assert_eq!(err.path, "inner.index");
        assert!(matches!(err.reason, DecodeErrorReason::MissingField));

        let err = object
            .list("items", 4, |item, path| Ok(expect_str(item, path)?.len()))
            .unwrap_err();
        assert_eq!(err.path, "items");
        assert!(object.list("absent", 4, |_, _| Ok(())).unwrap().is_empty());
        assert!(object.list("root", 4, |_, _| Ok(())).unwrap().is_empty());
    }

    #[test]
    fn non_object_document_is_rejected_at_root() {
        let value = serde_json::json!([1, 2]);
        let err = JsonObject::new(&value, FieldPath::document()).unwrap_err();
        assert_eq!(err.path, "$");
    }

    #[test]
    fn decode_fixed_accepts_optional_prefix() {
        let root = FieldPath::root("data");
        let bytes = [0xab; 32];
        let prefixed = hex::encode_prefixed(bytes);
        let bare = hex::encode(bytes);

        assert_eq!(decode_fixed::<32>(&prefixed, &root).unwrap().0, bytes);
        assert_eq!(decode_fixed::<32>(&bare, &root).unwrap().0, bytes);
    }

    #[test]
    fn decode_fixed_preserves_every_declared_size() {
        fn check<const N: usize>() {
            let root = FieldPath::root("data");
            let bytes: [u8; N] = std::array::from_fn(|i| (i * 7 + 3) as u8);
            let decoded = decode_fixed::<N>(&hex::encode_prefixed(bytes), &root).unwrap();
            assert_eq!(decoded.0, bytes);
        }
        check::<20>();
        check::<32>();
        check::<48>();
        check::<96>();
        check::<256>();
    }

    #[test]
    fn decode_fixed_rejects_wrong_length_with_path() {
        let root = FieldPath::root("data");
        let path = root.field("parent_root");
        let err = decode_fixed::<32>(&hex::encode_prefixed([0u8; 31]), &path).unwrap_err();

        assert_eq!(err.path, "data.parent_root");
        assert!(matches!(
            err.reason,
            DecodeErrorReason::InvalidLength {
                expected: 32,
                actual: 31
            }
        ));
    }

    #[test]
    fn decode_fixed_rejects_non_hex() {
        let root = FieldPath::root("data");
        let err = decode_fixed::<4>("0xzzzzzzzz", &root).unwrap_err();
        assert!(matches!(err.reason, DecodeErrorReason::InvalidHex(_)));
    }

    #[test]
    fn decode_bytes_enforces_upper_bound() {
        let root = FieldPath::root("data");
        assert_eq!(decode_bytes("0x", 32, &root).unwrap().len(), 0);
        assert_eq!(decode_bytes("0x0102", 32, &root).unwrap().to_vec(), vec![1, 2]);

        let err = decode_bytes(&hex::encode_prefixed([0u8; 33]), 32, &root).unwrap_err();
        assert!(matches!(
            err.reason,
            DecodeErrorReason::TooManyBytes { max: 32, actual: 33 }
        ));
    }

    #[test]
    fn decode_quoted_u64_bounds() {
        let root = FieldPath::root("data");
        assert_eq!(decode_quoted_u64("0", &root).unwrap(), 0);
        assert_eq!(
            decode_quoted_u64("18446744073709551615", &root).unwrap(),
            u64::MAX
        );

        for bad in ["", "+1", "-1", " 1", "1.0", "0x10", "18446744073709551616"] {
            let err = decode_quoted_u64(bad, &root).unwrap_err();
            assert!(
                matches!(err.reason, DecodeErrorReason::InvalidInteger { .. }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn base_fee_is_little_endian() {
        let root = FieldPath::root("data");
        let fee = decode_u256_le("7000000000", &root).unwrap();

        let mut expected = [0u8; 32];
        expected[..8].copy_from_slice(&7_000_000_000u64.to_le_bytes());
        assert_eq!(fee.0, expected);
        assert_eq!(fee[0], 0x00);
        assert_eq!(fee[1], 0x86);
        assert_eq!(fee[4], 0x01);
        assert!(fee[8..].iter().all(|b| *b == 0));
    }

    #[test]
    fn decode_list_indexes_failing_element() {
        let root = FieldPath::root("data");
        let items = ["0x01", "0x02", "0xzz"];
        let path = root.field("items");
        let err = decode_list(&items, 4, &path, |item, path| decode_bytes(item, 1, path))
            .unwrap_err();
        assert_eq!(err.path, "data.items[2]");

        let err = decode_list(&items, 2, &path, |item, path| decode_bytes(item, 1, path))
            .unwrap_err();
        assert!(matches!(
            err.reason,
            DecodeErrorReason::TooManyItems { max: 2, actual: 3 }
        ));
    }
}
