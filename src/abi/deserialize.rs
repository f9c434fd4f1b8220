//! Returndata decoding
//!
//! Reconstructs structured values from the flat field-element sequence a
//! call returns. The wire format always returns a sequence, so the common
//! single-output and `(len, array)` shapes are collapsed to the bare value
//! callers expect.

use crate::felt::Felt;
use crate::StarknetError;

use super::types::{CallArg, ContractAbi, MethodSignature};

/// Decode flat returndata for `method` into a structured value.
///
/// Empty input is returned unchanged (an empty array). A method with exactly
/// one declared output, or exactly two where the second is array-typed (the
/// `(len, array)` return convention), yields the bare value rather than a
/// one-element sequence.
pub fn decode_returndata(
    abi: &ContractAbi,
    method: &MethodSignature,
    data: &[Felt],
) -> Result<CallArg, StarknetError> {
    if data.is_empty() {
        return Ok(CallArg::Array(Vec::new()));
    }

    let outputs = &method.outputs;
    let mut slots = data.iter().copied();
    let mut logical: Vec<CallArg> = Vec::new();
    let mut index = 0;

    while index < outputs.len() {
        let output = &outputs[index];
        let paired_with_array = output.is_len_name()
            && !output.is_array()
            && index + 1 < outputs.len()
            && outputs[index + 1].is_array();

        if paired_with_array {
            let count = read_length(&mut slots, data.len(), &method.name)?;
            let element_ty = outputs[index + 1].element_type();
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(decode_value(abi, element_ty, &mut slots, &method.name)?);
            }
            logical.push(CallArg::Array(items));
            index += 2;
        } else if output.is_array() {
            let count = read_length(&mut slots, data.len(), &method.name)?;
            let element_ty = output.element_type();
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(decode_value(abi, element_ty, &mut slots, &method.name)?);
            }
            logical.push(CallArg::Array(items));
            index += 1;
        } else {
            logical.push(decode_value(abi, &output.ty, &mut slots, &method.name)?);
            index += 1;
        }
    }

    let collapse = outputs.len() == 1 || (outputs.len() == 2 && outputs[1].is_array());
    if collapse && !logical.is_empty() {
        Ok(logical.remove(0))
    } else {
        Ok(CallArg::Array(logical))
    }
}

fn next_slot(
    slots: &mut impl Iterator<Item = Felt>,
    method_name: &str,
) -> Result<Felt, StarknetError> {
    slots.next().ok_or_else(|| {
        StarknetError::Ecosystem(format!(
            "returndata for method '{method_name}' ended prematurely"
        ))
    })
}

fn read_length(
    slots: &mut impl Iterator<Item = Felt>,
    total: usize,
    method_name: &str,
) -> Result<usize, StarknetError> {
    let len = next_slot(slots, method_name)?;
    if len > Felt::from(total as u64) {
        return Err(StarknetError::Ecosystem(format!(
            "declared array length {len} exceeds returndata of method '{method_name}'"
        )));
    }
    Ok(len.low_u64() as usize)
}

/// Decode one typed value. A `Uint256` reassembles two consecutive slots as
/// `low + (high << 128)`; struct types resolve against the full ABI; any
/// other type consumes a single slot.
fn decode_value(
    abi: &ContractAbi,
    ty: &str,
    slots: &mut impl Iterator<Item = Felt>,
    method_name: &str,
) -> Result<CallArg, StarknetError> {
    if ty == "Uint256" {
        let low = next_slot(slots, method_name)?;
        let high = next_slot(slots, method_name)?;
        return Ok(CallArg::Felt(low + (high << 128)));
    }
    if let Some(def) = abi.struct_def(ty) {
        let mut fields = Vec::with_capacity(def.members.len());
        for member in &def.members {
            fields.push((
                member.name.clone(),
                decode_value(abi, &member.ty, slots, method_name)?,
            ));
        }
        return Ok(CallArg::Struct(fields));
    }
    Ok(CallArg::Felt(next_slot(slots, method_name)?))
}
