//! Crate error types

use thiserror::Error;

/// Error type for encoding, decoding and transaction construction.
#[derive(Debug, Error)]
pub enum StarknetError {
    /// Malformed or unsupported serialization/transaction request
    #[error("ecosystem error: {0}")]
    Ecosystem(String),

    /// ABI lookup failed for an address required to encode/decode
    #[error("no contract type found for address '{0}'")]
    ContractTypeNotFound(String),

    /// Unrecognized chain data (transaction kind tag, receipt shape)
    #[error("provider error: {0}")]
    Provider(String),

    /// Design placeholder for intentionally unimplemented operations
    #[error("{0} is not implemented")]
    Unimplemented(&'static str),

    /// Invalid address format
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// ABI JSON parsing error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StarknetError {
    fn from(e: serde_json::Error) -> Self {
        StarknetError::Serialization(e.to_string())
    }
}
