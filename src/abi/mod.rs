//! Contract ABI model and the calldata/returndata transcoders
//!
//! This module bridges structured call arguments (booleans, integers, hex
//! strings, arrays, nested structs) and the VM's flat field-element wire
//! format:
//!
//! - Encoding follows the array-length-prefix convention and flattens nested
//!   structs per their ABI-declared member order.
//! - Decoding reconstructs structured values from flat returndata,
//!   collapsing the single-output and `(len, array)` cases.
//!
//! # Example
//!
//! ```rust
//! use stark_abi::abi::{encode_calldata, CallArg, ContractAbi};
//!
//! let abi = ContractAbi::from_json(
//!     r#"[{"type": "function", "name": "store",
//!          "inputs": [{"name": "value", "type": "felt"}],
//!          "outputs": []}]"#,
//! ).unwrap();
//! let method = abi.method("store").unwrap();
//! let calldata = encode_calldata(&abi, method, &[CallArg::from(42u64)]).unwrap();
//! assert_eq!(calldata.len(), 1);
//! ```

mod codec;
mod deserialize;
mod serialize;
mod types;

pub use codec::{decode_primitive, encode_primitive, pre_encode, pre_encode_array};
pub use deserialize::decode_returndata;
pub use serialize::{encode_calldata, encode_calldata_with, ArgumentAligner, LenSuffixAligner};
pub use types::{
    AbiEntry, CallArg, ContractAbi, ContractClass, ContractType, EventSignature, MethodSignature,
    Param, StructDef, StructMember,
};
