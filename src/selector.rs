//! Selector and storage-slot derivation
//!
//! Methods and events are addressed on the wire by a deterministic hash of
//! their name rather than the name itself: keccak256 truncated to its low
//! 250 bits. Storage variables use the same hash reduced modulo the storage
//! address bound.

use sha3::{Digest, Keccak256};

use crate::felt::Felt;

/// Compute the selector for a method or event name.
///
/// This is the low 250 bits of `keccak256(name)`.
pub fn selector_from_name(name: &str) -> Felt {
    let digest = Keccak256::digest(name.as_bytes());
    let mask = (Felt::one() << 250) - Felt::one();
    Felt::from_big_endian(&digest) & mask
}

/// Compute the storage slot of a named storage variable (no arguments).
///
/// The selector is reduced modulo `2^251 - 256`, the upper bound on storage
/// addresses.
pub fn storage_var_address(name: &str) -> Felt {
    let bound = (Felt::one() << 251) - Felt::from(256u64);
    selector_from_name(name) % bound
}
