//! Chain collaborator interface
//!
//! The transcoding core is pure; everything network-bound lives behind the
//! [`ChainAccess`] trait. [`MockChain`] is the in-memory implementation used
//! in tests.

use std::collections::HashMap;

use crate::abi::{ContractClass, ContractType};
use crate::address::ContractAddress;
use crate::felt::Felt;
use crate::StarknetError;

/// Narrow interface to chain state consumed by the transcoder.
///
/// The two proxy-resolution calls (`invoke_view_method`, `read_storage`) are
/// blocking and performed on the caller's thread; everything else is a local
/// lookup. A failed call surfaces immediately, no retries.
pub trait ChainAccess {
    /// The stored contract type for an address, if known.
    fn get_contract_type(&self, address: &ContractAddress) -> Option<ContractType>;

    /// A locally known contract type keyed by class hash.
    fn get_local_contract_type(&self, class_hash: Felt) -> Option<ContractType>;

    /// The deserialized class definition for a class hash.
    fn get_stored_class(&self, class_hash: Felt) -> Result<Option<ContractClass>, StarknetError>;

    /// Invoke a no-argument view method and return its integer result.
    fn invoke_view_method(
        &self,
        address: &ContractAddress,
        method_name: &str,
    ) -> Result<Felt, StarknetError>;

    /// Read a raw storage value. `Ok(None)` means no live storage-reading
    /// channel is available.
    fn read_storage(&self, address: Felt, key: Felt) -> Result<Option<String>, StarknetError>;

    /// The active network's chain id, when a network context is available.
    fn active_chain_id(&self) -> Option<Felt>;
}

/// In-memory [`ChainAccess`] implementation for tests.
#[derive(Debug, Default)]
pub struct MockChain {
    contracts: HashMap<Felt, ContractType>,
    local_types: HashMap<Felt, ContractType>,
    classes: HashMap<Felt, ContractClass>,
    view_results: HashMap<(Felt, String), Felt>,
    storage: Option<HashMap<(Felt, Felt), String>>,
    chain_id: Option<Felt>,
}

impl MockChain {
    /// Create an empty mock with no storage channel and no network context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract type at an address.
    pub fn with_contract(mut self, address: ContractAddress, contract_type: ContractType) -> Self {
        self.contracts.insert(address.felt(), contract_type);
        self
    }

    /// Register a locally known contract type by class hash.
    pub fn with_local_contract_type(
        mut self,
        class_hash: Felt,
        contract_type: ContractType,
    ) -> Self {
        self.local_types.insert(class_hash, contract_type);
        self
    }

    /// Register a stored class definition.
    pub fn with_class(mut self, class_hash: Felt, class: ContractClass) -> Self {
        self.classes.insert(class_hash, class);
        self
    }

    /// Set the result of a view method invocation.
    pub fn with_view_result(
        mut self,
        address: ContractAddress,
        method_name: &str,
        result: Felt,
    ) -> Self {
        self.view_results
            .insert((address.felt(), method_name.to_string()), result);
        self
    }

    /// Enable the storage channel and set a stored value.
    pub fn with_storage(mut self, address: Felt, key: Felt, value: &str) -> Self {
        self.storage
            .get_or_insert_with(HashMap::new)
            .insert((address, key), value.to_string());
        self
    }

    /// Enable the storage channel without any stored values.
    pub fn with_empty_storage(mut self) -> Self {
        self.storage.get_or_insert_with(HashMap::new);
        self
    }

    /// Set the active chain id.
    pub fn with_chain_id(mut self, chain_id: Felt) -> Self {
        self.chain_id = Some(chain_id);
        self
    }
}

impl ChainAccess for MockChain {
    fn get_contract_type(&self, address: &ContractAddress) -> Option<ContractType> {
        self.contracts.get(&address.felt()).cloned()
    }

    fn get_local_contract_type(&self, class_hash: Felt) -> Option<ContractType> {
        self.local_types.get(&class_hash).cloned()
    }

    fn get_stored_class(&self, class_hash: Felt) -> Result<Option<ContractClass>, StarknetError> {
        Ok(self.classes.get(&class_hash).cloned())
    }

    fn invoke_view_method(
        &self,
        address: &ContractAddress,
        method_name: &str,
    ) -> Result<Felt, StarknetError> {
        self.view_results
            .get(&(address.felt(), method_name.to_string()))
            .copied()
            .ok_or_else(|| {
                StarknetError::Provider(format!(
                    "view method '{method_name}' reverted on '{address}'"
                ))
            })
    }

    fn read_storage(&self, address: Felt, key: Felt) -> Result<Option<String>, StarknetError> {
        // Unset slots read as zero once the channel exists.
        Ok(self
            .storage
            .as_ref()
            .map(|slots| slots.get(&(address, key)).cloned().unwrap_or_else(|| "0x0".to_string())))
    }

    fn active_chain_id(&self) -> Option<Felt> {
        self.chain_id
    }
}
