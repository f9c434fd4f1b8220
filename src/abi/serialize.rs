//! Calldata serialization
//!
//! Turns positional call arguments into the flat field-element sequence the
//! VM expects. Array-typed inputs are emitted as an explicit length element
//! followed by the flattened items; struct-typed inputs are flattened per
//! their ABI-declared member order.
//!
//! The non-obvious part is argument-to-input alignment: a Cairo-style ABI
//! declares an array as two inputs, `<base>_len: felt` then `<base>: T*`,
//! while callers may supply either the array alone or an explicit length
//! followed by the array. The [`ArgumentAligner`] folds both shapes into one
//! logical argument per array so the emitted length always comes from the
//! array's content.

use tracing::debug;

use crate::felt::Felt;
use crate::StarknetError;

use super::codec::{pre_encode, pre_encode_array};
use super::types::{CallArg, ContractAbi, MethodSignature, Param, StructDef};

/// Aligns caller-supplied positional arguments with a method's declared
/// inputs, producing one pre-encoded logical argument per logical input.
///
/// Implementations decide how a paired `(length, array)` input sequence maps
/// onto positional arguments; the serializer itself stays convention-free.
pub trait ArgumentAligner {
    /// Align `call_args` against `inputs`.
    fn align(
        &self,
        inputs: &[Param],
        call_args: &[CallArg],
    ) -> Result<Vec<CallArg>, StarknetError>;
}

/// The positional, `_len`-name-convention aligner.
///
/// When an input named `<base>_len` is immediately followed by an array-typed
/// input and the caller passed an integer for it, that integer is treated as
/// the array's explicit length argument: the next positional argument is
/// consumed as the array body and the length itself is discarded (the
/// serializer recomputes it from content, so explicit and derived lengths
/// can never disagree on the wire).
#[derive(Debug, Clone, Copy, Default)]
pub struct LenSuffixAligner;

impl ArgumentAligner for LenSuffixAligner {
    fn align(
        &self,
        inputs: &[Param],
        call_args: &[CallArg],
    ) -> Result<Vec<CallArg>, StarknetError> {
        // Each positional argument maps to at most one input, so a surplus
        // can never be aligned; reject it instead of truncating.
        if call_args.len() > inputs.len() {
            return Err(StarknetError::Ecosystem(format!(
                "too many arguments: {} supplied for {} declared inputs",
                call_args.len(),
                inputs.len()
            )));
        }

        let mut pre_encoded: Vec<CallArg> = Vec::with_capacity(call_args.len());
        let pair_count = inputs.len().min(call_args.len());
        let mut skip_consumed_array = false;

        for (index, (call_arg, input)) in call_args.iter().zip(inputs.iter()).enumerate() {
            if input.is_array() {
                if skip_consumed_array {
                    // Already folded into the preceding length argument.
                    skip_consumed_array = false;
                    continue;
                }
                pre_encoded.push(pre_encode(call_arg));
            } else if input.is_len_name() && index + 1 < pair_count && inputs[index + 1].is_array()
            {
                let candidate = pre_encode(call_arg);
                if matches!(candidate, CallArg::Felt(_)) {
                    // An explicit '_len' argument was provided.
                    pre_encoded.push(pre_encode_array(&call_args[index + 1]));
                    skip_consumed_array = true;
                } else {
                    pre_encoded.push(candidate);
                }
            } else {
                pre_encoded.push(pre_encode(call_arg));
            }
        }

        Ok(pre_encoded)
    }
}

/// Encode positional arguments for `method` into flat calldata, using the
/// default `_len`-convention aligner.
///
/// `abi` must be the full declaring-contract ABI so nested struct member
/// types resolve.
pub fn encode_calldata(
    abi: &ContractAbi,
    method: &MethodSignature,
    args: &[CallArg],
) -> Result<Vec<Felt>, StarknetError> {
    encode_calldata_with(&LenSuffixAligner, abi, method, args)
}

/// Encode positional arguments for `method` using a caller-chosen aligner.
pub fn encode_calldata_with<A: ArgumentAligner>(
    aligner: &A,
    abi: &ContractAbi,
    method: &MethodSignature,
    args: &[CallArg],
) -> Result<Vec<Felt>, StarknetError> {
    let logical = aligner.align(&method.inputs, args)?;
    flatten(abi, &method.inputs, &logical, &method.name)
}

/// Flatten one logical argument per logical input into raw felts.
fn flatten(
    abi: &ContractAbi,
    inputs: &[Param],
    logical: &[CallArg],
    method_name: &str,
) -> Result<Vec<Felt>, StarknetError> {
    let mut out = Vec::new();
    let mut args = logical.iter();
    let mut index = 0;

    while index < inputs.len() {
        let input = &inputs[index];
        let paired_with_array = input.is_len_name()
            && !input.is_array()
            && index + 1 < inputs.len()
            && inputs[index + 1].is_array();

        if paired_with_array {
            let array_input = &inputs[index + 1];
            let arg = args
                .next()
                .ok_or_else(|| missing_argument(method_name, array_input))?;
            let items = expect_array(array_input, arg)?;
            out.push(Felt::from(items.len() as u64));
            for item in items {
                serialize_value(abi, array_input.element_type(), item, &mut out)?;
            }
            index += 2;
        } else if input.is_array() {
            let arg = args
                .next()
                .ok_or_else(|| missing_argument(method_name, input))?;
            let items = expect_array(input, arg)?;
            out.push(Felt::from(items.len() as u64));
            for item in items {
                serialize_value(abi, input.element_type(), item, &mut out)?;
            }
            index += 1;
        } else {
            let arg = args
                .next()
                .ok_or_else(|| missing_argument(method_name, input))?;
            serialize_value(abi, &input.ty, arg, &mut out)?;
            index += 1;
        }
    }

    if args.next().is_some() {
        return Err(StarknetError::Ecosystem(format!(
            "too many arguments for method '{method_name}'"
        )));
    }

    debug!(method = method_name, felts = out.len(), "encoded calldata");
    Ok(out)
}

/// Serialize one typed value, resolving struct types against the full ABI.
fn serialize_value(
    abi: &ContractAbi,
    ty: &str,
    value: &CallArg,
    out: &mut Vec<Felt>,
) -> Result<(), StarknetError> {
    if ty == "Uint256" {
        return serialize_uint256(value, out);
    }
    if let Some(def) = abi.struct_def(ty) {
        return serialize_struct(abi, def, value, out);
    }
    match value {
        CallArg::Felt(v) => {
            out.push(*v);
            Ok(())
        }
        other => Err(StarknetError::Ecosystem(format!(
            "cannot serialize value '{other:?}' as '{ty}'"
        ))),
    }
}

/// A wide integer occupies two slots, low 128 bits first. A bare felt is
/// split; a struct supplies `low` and `high` explicitly.
fn serialize_uint256(value: &CallArg, out: &mut Vec<Felt>) -> Result<(), StarknetError> {
    match value {
        CallArg::Felt(v) => {
            let mask = (Felt::one() << 128) - Felt::one();
            out.push(*v & mask);
            out.push(*v >> 128);
            Ok(())
        }
        CallArg::Struct(_) => {
            for half in ["low", "high"] {
                let field = value.field(half).and_then(CallArg::as_felt).ok_or_else(|| {
                    StarknetError::Ecosystem(format!("Uint256 value is missing '{half}'"))
                })?;
                out.push(field);
            }
            Ok(())
        }
        other => Err(StarknetError::Ecosystem(format!(
            "cannot serialize value '{other:?}' as 'Uint256'"
        ))),
    }
}

fn serialize_struct(
    abi: &ContractAbi,
    def: &StructDef,
    value: &CallArg,
    out: &mut Vec<Felt>,
) -> Result<(), StarknetError> {
    match value {
        CallArg::Struct(_) => {
            for member in &def.members {
                let field = value.field(&member.name).ok_or_else(|| {
                    StarknetError::Ecosystem(format!(
                        "struct '{}' value is missing member '{}'",
                        def.name, member.name
                    ))
                })?;
                serialize_value(abi, &member.ty, field, out)?;
            }
            Ok(())
        }
        // Positional form: one value per member.
        CallArg::Array(items) if items.len() == def.members.len() => {
            for (member, item) in def.members.iter().zip(items.iter()) {
                serialize_value(abi, &member.ty, item, out)?;
            }
            Ok(())
        }
        other => Err(StarknetError::Ecosystem(format!(
            "cannot serialize value '{other:?}' as struct '{}'",
            def.name
        ))),
    }
}

fn missing_argument(method_name: &str, input: &Param) -> StarknetError {
    StarknetError::Ecosystem(format!(
        "missing argument for input '{}' of method '{method_name}'",
        input.name
    ))
}

fn expect_array<'a>(input: &Param, arg: &'a CallArg) -> Result<&'a [CallArg], StarknetError> {
    match arg {
        CallArg::Array(items) => Ok(items),
        other => Err(StarknetError::Ecosystem(format!(
            "input '{}' expects an array, got '{other:?}'",
            input.name
        ))),
    }
}
