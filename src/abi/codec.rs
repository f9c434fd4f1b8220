//! Primitive codec and structural pre-encoder
//!
//! The primitive codec converts single scalar values to and from the VM's
//! native field-element representation. The pre-encoder recursively walks a
//! call argument tree and normalizes every leaf with the primitive codec; it
//! has no ABI awareness, typing is applied at the serializer boundary.

use crate::felt::{felt_from_hex, Felt};
use crate::StarknetError;

use super::types::CallArg;

/// Encode a single scalar into its field-element form.
///
/// - Booleans become 0/1. This is checked before the integer path so a
///   boolean never takes a generic integer encoding.
/// - Integers pass through unchanged.
/// - `0x`-prefixed strings parse as base-16 integers.
/// - Byte strings are read as big-endian integers.
/// - Anything else is returned unchanged; the error surfaces later at
///   serialization.
pub fn encode_primitive(value: &CallArg) -> CallArg {
    match value {
        CallArg::Bool(b) => CallArg::Felt(if *b { Felt::one() } else { Felt::zero() }),
        CallArg::Felt(v) => CallArg::Felt(*v),
        CallArg::Str(s) if s.starts_with("0x") => match felt_from_hex(s) {
            Ok(v) => CallArg::Felt(v),
            Err(_) => value.clone(),
        },
        CallArg::Bytes(b) if b.len() <= 32 => CallArg::Felt(Felt::from_big_endian(b)),
        other => other.clone(),
    }
}

/// Decode a scalar wire value into an integer.
///
/// Takes no declared output type: every scalar on the wire is a plain
/// integer, so the declared type only matters to the structural decoder.
pub fn decode_primitive(value: &CallArg) -> Result<Felt, StarknetError> {
    match encode_primitive(value) {
        CallArg::Felt(v) => Ok(v),
        other => Err(StarknetError::Ecosystem(format!(
            "cannot decode '{other:?}' as an integer"
        ))),
    }
}

/// Recursively normalize a call argument tree so that every leaf is a
/// field-element integer.
pub fn pre_encode(value: &CallArg) -> CallArg {
    match value {
        CallArg::Struct(fields) => CallArg::Struct(
            fields
                .iter()
                .map(|(name, v)| (name.clone(), pre_encode(v)))
                .collect(),
        ),
        CallArg::Array(items) => CallArg::Array(items.iter().map(pre_encode).collect()),
        scalar => encode_primitive(scalar),
    }
}

/// Normalize a value as an array.
///
/// A non-array value is wrapped as a single-element array, which keeps
/// single-struct and single-scalar array arguments ergonomic.
pub fn pre_encode_array(value: &CallArg) -> CallArg {
    match value {
        CallArg::Array(items) => CallArg::Array(items.iter().map(pre_encode).collect()),
        other => CallArg::Array(vec![pre_encode(other)]),
    }
}
