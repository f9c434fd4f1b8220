//! Contract address type with checksummed rendering
//!
//! Addresses are field elements. The human-readable form is a 64-digit
//! zero-padded hex string with keccak-based case folding (the EIP-55 scheme
//! applied to the padded form), so a mis-typed address fails loudly.

use std::fmt;

use sha3::{Digest, Keccak256};

use crate::abi::CallArg;
use crate::felt::{felt_from_str, felt_to_padded_hex, Felt};
use crate::StarknetError;

/// A contract address, stored as its felt value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContractAddress(Felt);

impl ContractAddress {
    /// The zero address
    pub const ZERO: ContractAddress = ContractAddress(Felt::zero());

    /// Create an address from a felt value.
    pub fn from_felt(value: Felt) -> Self {
        ContractAddress(value)
    }

    /// Parse an address from a hex (`0x`-prefixed) or decimal string.
    pub fn parse(s: &str) -> Result<Self, StarknetError> {
        felt_from_str(s)
            .map(ContractAddress)
            .map_err(|_| StarknetError::InvalidAddress(s.to_string()))
    }

    /// Canonicalize a raw address value (integer, hex string, byte string)
    /// into an address.
    pub fn decode(raw: &CallArg) -> Result<Self, StarknetError> {
        match raw {
            CallArg::Felt(v) => Ok(ContractAddress(*v)),
            CallArg::Str(s) => Self::parse(s),
            CallArg::Bytes(b) if b.len() <= 32 => Ok(ContractAddress(Felt::from_big_endian(b))),
            other => Err(StarknetError::InvalidAddress(format!("{other:?}"))),
        }
    }

    /// The underlying felt value (the wire representation).
    pub fn felt(&self) -> Felt {
        self.0
    }

    /// Check if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Render as a checksummed `0x`-prefixed hex string.
    ///
    /// Hex letters are uppercased where the corresponding nibble of
    /// `keccak256` over the lowercase padded hex form is 8 or above.
    pub fn to_checksum(&self) -> String {
        let plain = felt_to_padded_hex(&self.0);
        let digest = Keccak256::digest(plain.as_bytes());
        let mut out = String::with_capacity(66);
        out.push_str("0x");
        for (i, c) in plain.chars().enumerate() {
            let nibble = (digest[i / 2] >> (4 * (1 - i % 2))) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Debug for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractAddress({})", self.to_checksum())
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

impl From<Felt> for ContractAddress {
    fn from(value: Felt) -> Self {
        ContractAddress(value)
    }
}

/// Encode an address string (hex or decimal) into its felt wire value.
pub fn encode_address(address: &str) -> Result<Felt, StarknetError> {
    ContractAddress::parse(address).map(|a| a.felt())
}

/// Canonicalize any supported raw address representation into a checksummed
/// address.
pub fn decode_address(raw: &CallArg) -> Result<ContractAddress, StarknetError> {
    ContractAddress::decode(raw)
}
