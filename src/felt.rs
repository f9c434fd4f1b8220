//! Field element type and parsing helpers
//!
//! The VM's only primitive wire type is a non-negative integer below the
//! Stark prime. All serialized data is a flat sequence of these.

use crate::StarknetError;

// Re-export primitive-types for the underlying integer
pub use primitive_types::U256;

/// A field element: the VM's native non-negative integer type.
///
/// Values fit in 252 bits; `U256` holds them with room to spare and gives us
/// the 128-bit shifts needed for wide-integer reassembly.
pub type Felt = U256;

/// Parse a felt from a hex string (with or without `0x` prefix).
pub fn felt_from_hex(s: &str) -> Result<Felt, StarknetError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() {
        return Err(StarknetError::Ecosystem("empty hex value".to_string()));
    }
    // hex::decode needs an even number of digits
    let padded;
    let digits = if s.len() % 2 == 1 {
        padded = format!("0{s}");
        padded.as_str()
    } else {
        s
    };
    let bytes = hex::decode(digits)
        .map_err(|e| StarknetError::Ecosystem(format!("invalid hex value '{s}': {e}")))?;
    if bytes.len() > 32 {
        return Err(StarknetError::Ecosystem(format!(
            "hex value '{s}' does not fit in a field element"
        )));
    }
    Ok(Felt::from_big_endian(&bytes))
}

/// Parse a felt from either a hex string (`0x`-prefixed) or a decimal string.
pub fn felt_from_str(s: &str) -> Result<Felt, StarknetError> {
    if s.starts_with("0x") || s.starts_with("0X") {
        felt_from_hex(s)
    } else {
        Felt::from_dec_str(s)
            .map_err(|e| StarknetError::Ecosystem(format!("invalid decimal value '{s}': {e:?}")))
    }
}

/// Render a felt as a `0x`-prefixed hex string without leading zeros.
pub fn felt_to_hex(value: &Felt) -> String {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    let full = hex::encode(buf);
    let trimmed = full.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{trimmed}")
    }
}

/// Render a felt as a 64-digit zero-padded hex string (no prefix).
pub fn felt_to_padded_hex(value: &Felt) -> String {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    hex::encode(buf)
}
