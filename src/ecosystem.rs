//! Ecosystem façade
//!
//! Ties the pure transcoding core to a chain collaborator: calldata encoding,
//! returndata and event decoding, the transaction factory, and cached proxy
//! resolution, all behind one object.

use tracing::debug;

use crate::abi::{
    decode_returndata, encode_calldata, CallArg, ContractAbi, MethodSignature,
};
use crate::address::ContractAddress;
use crate::events::{decode_logs, DecodedLog, RawLog};
use crate::felt::Felt;
use crate::provider::ChainAccess;
use crate::proxy::{resolve_proxy, ProxyCache, ProxyInfo};
use crate::transaction::{
    create_transaction, InvokeTransaction, RawTransaction, Transaction,
};
use crate::StarknetError;

/// The chain id for a well-known network name, as a short-string felt.
pub fn chain_id(network: &str) -> Option<Felt> {
    let tag: &[u8] = match network {
        "mainnet" => b"SN_MAIN",
        "testnet" => b"SN_GOERLI",
        "testnet2" => b"SN_GOERLI2",
        _ => return None,
    };
    Some(Felt::from_big_endian(tag))
}

/// Stateless transcoding plus a chain collaborator and a proxy cache.
///
/// Encoding and decoding never touch the network; only transaction
/// construction and proxy resolution go through the collaborator.
#[derive(Debug)]
pub struct Starknet<C: ChainAccess> {
    chain: C,
    proxy_cache: ProxyCache,
}

impl<C: ChainAccess> Starknet<C> {
    /// Wrap a chain collaborator with an empty proxy cache.
    pub fn new(chain: C) -> Self {
        Starknet {
            chain,
            proxy_cache: ProxyCache::new(),
        }
    }

    /// The wrapped collaborator.
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Encode caller-supplied arguments into flat calldata for `method`.
    pub fn encode_calldata(
        &self,
        abi: &ContractAbi,
        method: &MethodSignature,
        args: &[CallArg],
    ) -> Result<Vec<Felt>, StarknetError> {
        encode_calldata(abi, method, args)
    }

    /// Decode flat returndata for `method` into a structured value.
    pub fn decode_returndata(
        &self,
        abi: &ContractAbi,
        method: &MethodSignature,
        data: &[Felt],
    ) -> Result<CallArg, StarknetError> {
        decode_returndata(abi, method, data)
    }

    /// Calldata decoding is not supported.
    pub fn decode_calldata(
        &self,
        _method: &MethodSignature,
        _data: &[Felt],
    ) -> Result<Vec<CallArg>, StarknetError> {
        Err(StarknetError::Unimplemented("decode_calldata"))
    }

    /// Decode raw logs against candidate event signatures.
    pub fn decode_logs(&self, logs: &[RawLog], events: &[crate::abi::EventSignature]) -> Vec<DecodedLog> {
        decode_logs(logs, events)
    }

    /// Construct a structured transaction from raw chain data.
    pub fn create_transaction(&self, raw: &RawTransaction) -> Result<Transaction, StarknetError> {
        create_transaction(&self.chain, raw)
    }

    /// Build an unsigned invoke of `method_name` on the contract deployed at
    /// `address`, encoding `args` against its stored contract type.
    pub fn encode_invoke(
        &self,
        address: &ContractAddress,
        method_name: &str,
        args: &[CallArg],
    ) -> Result<Transaction, StarknetError> {
        let contract_type = self
            .chain
            .get_contract_type(address)
            .ok_or_else(|| StarknetError::ContractTypeNotFound(address.to_checksum()))?;
        let method = contract_type
            .abi
            .method(method_name)
            .ok_or_else(|| {
                StarknetError::Ecosystem(format!(
                    "no method named '{method_name}' on contract '{address}'"
                ))
            })?
            .clone();
        let calldata = encode_calldata(&contract_type.abi, &method, args)?;
        debug!(%address, method = %method.name, slots = calldata.len(), "encoded invoke");

        Ok(Transaction::Invoke(InvokeTransaction {
            receiver: *address,
            entry_point_selector: method.selector(),
            method,
            calldata,
            max_fee: Felt::zero(),
            nonce: None,
            chain_id: self.chain.active_chain_id(),
            signature: None,
        }))
    }

    /// Cached proxy resolution for `address`. Resolution runs at most once
    /// per address until [`Starknet::clear_proxy_cache`] is called.
    pub fn proxy_info(
        &self,
        address: &ContractAddress,
    ) -> Result<Option<ProxyInfo>, StarknetError> {
        self.proxy_cache.get_or_resolve(address, || {
            let abi = self
                .chain
                .get_contract_type(address)
                .map(|ct| ct.abi)
                .unwrap_or_default();
            resolve_proxy(&self.chain, address, &abi)
        })
    }

    /// Drop all cached proxy resolutions.
    pub fn clear_proxy_cache(&self) {
        self.proxy_cache.clear();
    }
}
