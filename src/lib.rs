//! ABI transcoding for a felt-based smart-contract VM
//!
//! Bridges structured call arguments and the VM's flat field-element wire
//! format: calldata encoding, returndata decoding, event-log decoding, and
//! structured transaction construction from raw chain data. Everything
//! network-bound sits behind the [`provider::ChainAccess`] trait; the
//! transcoding core is pure.
//!
//! # Example
//!
//! ```rust
//! use stark_abi::abi::{encode_calldata, decode_returndata, CallArg, ContractAbi};
//! use stark_abi::Felt;
//!
//! let abi = ContractAbi::from_json(
//!     r#"[{"type": "function", "name": "balance_of",
//!          "inputs": [{"name": "account", "type": "felt"}],
//!          "outputs": [{"name": "balance", "type": "felt"}]}]"#,
//! ).unwrap();
//! let method = abi.method("balance_of").unwrap();
//!
//! let calldata = encode_calldata(&abi, method, &[CallArg::from("0x123")]).unwrap();
//! assert_eq!(calldata, vec![Felt::from(0x123u64)]);
//!
//! let result = decode_returndata(&abi, method, &[Felt::from(1000u64)]).unwrap();
//! assert_eq!(result, CallArg::from(1000u64));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abi;
pub mod address;
pub mod ecosystem;
mod error;
pub mod events;
pub mod felt;
pub mod provider;
pub mod proxy;
pub mod selector;
pub mod transaction;

pub use address::ContractAddress;
pub use ecosystem::Starknet;
pub use error::StarknetError;
pub use felt::Felt;
pub use selector::{selector_from_name, storage_var_address};
