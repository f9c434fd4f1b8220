//! Event log decoding
//!
//! Matches raw emitted logs to their event definition by selector and
//! produces named-argument records. A field typed `Uint256` spans two
//! consecutive data slots and is reassembled as `low + (high << 128)`.
//!
//! Output order follows event-signature enumeration order, with logs in
//! chronological order within each matched event. A present data slot whose
//! value is zero is recorded as zero; a field is omitted only when the data
//! stream is exhausted. Log indices form a single monotonic counter over all
//! emitted records.

use std::collections::HashMap;

use tracing::debug;

use crate::abi::EventSignature;
use crate::address::ContractAddress;
use crate::felt::Felt;

/// A raw emitted log, as produced by the chain. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    /// Emitting contract address (felt form)
    pub from_address: Felt,
    /// Selector keys carried by the log
    pub keys: Vec<Felt>,
    /// Flat event data slots
    pub data: Vec<Felt>,
    /// Hash of the containing block
    pub block_hash: Felt,
    /// Number of the containing block
    pub block_number: u64,
    /// Hash of the emitting transaction
    pub transaction_hash: Felt,
}

/// A decoded event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLog {
    /// Emitting contract address, canonicalized
    pub contract_address: ContractAddress,
    /// Matched event name
    pub event_name: String,
    /// Decoded argument values by field name
    pub event_arguments: HashMap<String, Felt>,
    /// Position within the decoded stream
    pub log_index: u64,
    /// Not available from raw logs; always zero
    pub transaction_index: u64,
    /// Carried through from the raw log
    pub block_hash: Felt,
    /// Carried through from the raw log
    pub block_number: u64,
    /// Carried through from the raw log
    pub transaction_hash: Felt,
}

/// Decode raw logs against a set of candidate event signatures.
///
/// A log matches the event whose selector appears in its `keys` list. The
/// result is recomputed fresh on every call.
pub fn decode_logs(logs: &[RawLog], events: &[EventSignature]) -> Vec<DecodedLog> {
    let mut decoded = Vec::new();
    let mut log_index = 0u64;

    for event in events {
        let selector = event.selector();
        for log in logs.iter().filter(|log| log.keys.contains(&selector)) {
            let mut slots = log.data.iter().copied();
            let mut arguments = HashMap::new();

            for field in &event.data {
                if field.ty == "Uint256" {
                    // Wide integers are stored using two slots.
                    let low = slots.next();
                    let high = slots.next();
                    if let (Some(low), Some(high)) = (low, high) {
                        arguments.insert(field.name.clone(), low + (high << 128));
                    }
                } else if let Some(value) = slots.next() {
                    arguments.insert(field.name.clone(), value);
                }
            }

            decoded.push(DecodedLog {
                contract_address: ContractAddress::from_felt(log.from_address),
                event_name: event.name.clone(),
                event_arguments: arguments,
                log_index,
                transaction_index: 0,
                block_hash: log.block_hash,
                block_number: log.block_number,
                transaction_hash: log.transaction_hash,
            });
            log_index += 1;
        }
    }

    debug!(logs = logs.len(), decoded = decoded.len(), "decoded event logs");
    decoded
}
