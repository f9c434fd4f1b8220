//! Transaction kinds and the transaction factory
//!
//! Raw chain data arrives as a loose field mapping plus a kind tag. The
//! factory dispatches on the tag into a closed set of structured transaction
//! variants, canonicalizing addresses, normalizing calldata to integers, and
//! resolving the invoked method by selector when it is not already known.

use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

use crate::abi::{decode_primitive, CallArg, MethodSignature, Param};
use crate::address::ContractAddress;
use crate::felt::{felt_from_str, felt_to_hex, Felt};
use crate::provider::ChainAccess;
use crate::StarknetError;

/// The supported transaction kinds. Matched exhaustively; an unrecognized
/// tag is a typed provider error, never a silent pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// Contract call through an account
    InvokeFunction,
    /// Class declaration
    Declare,
    /// Account deployment
    DeployAccount,
}

impl TransactionKind {
    /// Parse a raw kind tag from chain data.
    pub fn parse(tag: &str) -> Result<Self, StarknetError> {
        match tag {
            "INVOKE_FUNCTION" | "INVOKE" => Ok(TransactionKind::InvokeFunction),
            "DECLARE" => Ok(TransactionKind::Declare),
            "DEPLOY_ACCOUNT" => Ok(TransactionKind::DeployAccount),
            other => Err(StarknetError::Provider(format!(
                "unable to handle transaction type '{other}'"
            ))),
        }
    }
}

/// An invoke transaction: a contract call routed through an account.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeTransaction {
    /// The call target (not the deployed entity)
    pub receiver: ContractAddress,
    /// The invoked method's signature
    pub method: MethodSignature,
    /// The invoked entry point's wire selector
    pub entry_point_selector: Felt,
    /// Flat calldata
    pub calldata: Vec<Felt>,
    /// Maximum fee, zero when unset
    pub max_fee: Felt,
    /// Account nonce, when known
    pub nonce: Option<Felt>,
    /// Chain identifier, when a network context was available
    pub chain_id: Option<Felt>,
    /// Unset at construction; attached separately by a signer
    pub signature: Option<Vec<Felt>>,
}

/// A declare transaction: registers a contract class.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclareTransaction {
    /// Hash of the declared class, when known
    pub class_hash: Option<Felt>,
    /// Serialized contract class
    pub data: Option<Bytes>,
    /// Maximum fee, zero when unset
    pub max_fee: Felt,
    /// Account nonce, when known
    pub nonce: Option<Felt>,
    /// Chain identifier, when a network context was available
    pub chain_id: Option<Felt>,
    /// Unset at construction; attached separately by a signer
    pub signature: Option<Vec<Felt>>,
}

/// A deploy-account transaction. Here `contract_address` is the address of
/// the newly deployed account contract.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployAccountTransaction {
    /// Address of the deployed contract
    pub contract_address: Option<ContractAddress>,
    /// Hash of the deployed class, when known
    pub class_hash: Option<Felt>,
    /// Address salt
    pub salt: Option<Felt>,
    /// Flat constructor calldata
    pub constructor_calldata: Vec<Felt>,
    /// Deployment bytecode, when locally known
    pub data: Option<Bytes>,
    /// Maximum fee, zero when unset
    pub max_fee: Felt,
    /// Account nonce, when known
    pub nonce: Option<Felt>,
    /// Chain identifier, when a network context was available
    pub chain_id: Option<Felt>,
    /// Unset at construction; attached separately by a signer
    pub signature: Option<Vec<Felt>>,
}

/// A structured transaction, tagged by kind. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    /// Contract call
    Invoke(InvokeTransaction),
    /// Class declaration
    Declare(DeclareTransaction),
    /// Account deployment
    DeployAccount(DeployAccountTransaction),
}

impl Transaction {
    /// The transaction's kind tag.
    pub fn kind(&self) -> TransactionKind {
        match self {
            Transaction::Invoke(_) => TransactionKind::InvokeFunction,
            Transaction::Declare(_) => TransactionKind::Declare,
            Transaction::DeployAccount(_) => TransactionKind::DeployAccount,
        }
    }

    /// The attached signature, if any.
    pub fn signature(&self) -> Option<&[Felt]> {
        match self {
            Transaction::Invoke(tx) => tx.signature.as_deref(),
            Transaction::Declare(tx) => tx.signature.as_deref(),
            Transaction::DeployAccount(tx) => tx.signature.as_deref(),
        }
    }

    /// The chain identifier, if one was established.
    pub fn chain_id(&self) -> Option<Felt> {
        match self {
            Transaction::Invoke(tx) => tx.chain_id,
            Transaction::Declare(tx) => tx.chain_id,
            Transaction::DeployAccount(tx) => tx.chain_id,
        }
    }
}

/// The canonical `__execute__` account multicall signature, assumed when an
/// invoke carries neither a method signature nor an entry-point selector.
pub fn execute_signature() -> MethodSignature {
    MethodSignature {
        name: "__execute__".to_string(),
        inputs: vec![
            Param::new("call_array_len", "felt"),
            Param::new("call_array", "CallArray*"),
            Param::new("calldata_len", "felt"),
            Param::new("calldata", "felt*"),
        ],
        outputs: vec![
            Param::new("retdata_size", "felt"),
            Param::new("retdata", "felt*"),
        ],
        state_mutability: None,
    }
}

/// A scalar from raw chain data: transactions in blocks carry calldata as
/// hex strings, elsewhere as integers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// A JSON number
    Number(u64),
    /// A hex or decimal string
    Text(String),
}

impl RawValue {
    /// Normalize to a felt via the primitive codec, accepting decimal
    /// strings as a fallback.
    pub fn to_felt(&self) -> Result<Felt, StarknetError> {
        match self {
            RawValue::Number(n) => Ok(Felt::from(*n)),
            RawValue::Text(s) => {
                decode_primitive(&CallArg::Str(s.clone())).or_else(|_| felt_from_str(s))
            }
        }
    }

    /// The untyped call-argument form.
    pub fn to_call_arg(&self) -> CallArg {
        match self {
            RawValue::Number(n) => CallArg::Felt(Felt::from(*n)),
            RawValue::Text(s) => CallArg::Str(s.clone()),
        }
    }
}

/// The raw field mapping a transaction is bootstrapped from, possibly
/// deserialized straight from chain data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTransaction {
    /// Declared kind tag
    #[serde(default, rename = "type", alias = "tx_type")]
    pub kind: Option<String>,
    /// Target (invoke) or deployed (deploy) contract address
    #[serde(default)]
    pub contract_address: Option<RawValue>,
    /// Class hash, for declare/deploy data
    #[serde(default)]
    pub class_hash: Option<RawValue>,
    /// Raw entry-point selector
    #[serde(default)]
    pub entry_point_selector: Option<RawValue>,
    /// Flat calldata, heterogeneous hex strings and integers
    #[serde(default)]
    pub calldata: Option<Vec<RawValue>>,
    /// Constructor calldata for deploy-account data
    #[serde(default)]
    pub constructor_calldata: Option<Vec<RawValue>>,
    /// Maximum fee
    #[serde(default)]
    pub max_fee: Option<RawValue>,
    /// Account nonce
    #[serde(default)]
    pub nonce: Option<RawValue>,
    /// Chain identifier
    #[serde(default)]
    pub chain_id: Option<RawValue>,
    /// Address salt for deploy-account data
    #[serde(default, alias = "contract_address_salt")]
    pub salt: Option<RawValue>,
    /// Raw signature; always discarded at construction
    #[serde(default)]
    pub signature: Option<Vec<RawValue>>,
    /// Serialized contract class or bytecode, hex-encoded
    #[serde(default)]
    pub data: Option<String>,
    /// Explicit method signature, when the caller already resolved it
    #[serde(default)]
    pub method_abi: Option<MethodSignature>,
}

impl RawTransaction {
    /// Parse raw transaction fields from chain-data JSON.
    pub fn from_json(json: &str) -> Result<Self, StarknetError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Construct a structured transaction from raw chain data.
///
/// Signatures are always forced unset (they must be attached separately),
/// the chain id defaults to the active network's when omitted, addresses
/// are canonicalized, and calldata is normalized to integers.
pub fn create_transaction<C: ChainAccess>(
    chain: &C,
    raw: &RawTransaction,
) -> Result<Transaction, StarknetError> {
    let tag = raw
        .kind
        .as_deref()
        .ok_or_else(|| StarknetError::Provider("missing transaction type tag".to_string()))?;
    let kind = TransactionKind::parse(tag)?;
    debug!(?kind, "building transaction from raw fields");

    // Bootstrapped transactions are never pre-signed.
    let signature: Option<Vec<Felt>> = None;

    let chain_id = match &raw.chain_id {
        Some(value) => Some(value.to_felt()?),
        None => chain.active_chain_id(),
    };
    let max_fee = raw
        .max_fee
        .as_ref()
        .map(RawValue::to_felt)
        .transpose()?
        .unwrap_or_else(Felt::zero);
    let nonce = raw.nonce.as_ref().map(RawValue::to_felt).transpose()?;
    let class_hash = raw.class_hash.as_ref().map(RawValue::to_felt).transpose()?;

    let contract_address = raw
        .contract_address
        .as_ref()
        .map(|value| ContractAddress::decode(&value.to_call_arg()))
        .transpose()?;

    let mut bytecode = raw.data.as_deref().map(decode_bytecode).transpose()?;

    // For deploy-type data, 'contract_address' is the newly deployed
    // contract; attach locally known bytecode, preferring the class-hash
    // keyed lookup.
    if let Some(address) = contract_address {
        let mut contract_type = class_hash.and_then(|hash| chain.get_local_contract_type(hash));
        if contract_type.is_none() {
            contract_type = chain.get_contract_type(&address);
        }
        if let Some(found) = contract_type.and_then(|ct| ct.deployment_bytecode) {
            bytecode = Some(found);
        }
    }

    match kind {
        TransactionKind::Declare => {
            let mut data = bytecode;
            if data.is_none() {
                if let Some(hash) = class_hash {
                    data = chain.get_stored_class(hash)?.map(|class| class.program);
                }
            }
            Ok(Transaction::Declare(DeclareTransaction {
                class_hash,
                data,
                max_fee,
                nonce,
                chain_id,
                signature,
            }))
        }
        TransactionKind::DeployAccount => {
            let raw_calldata = raw.constructor_calldata.as_deref().or(raw.calldata.as_deref());
            Ok(Transaction::DeployAccount(DeployAccountTransaction {
                contract_address,
                class_hash,
                salt: raw.salt.as_ref().map(RawValue::to_felt).transpose()?,
                constructor_calldata: normalize_calldata(raw_calldata)?,
                data: bytecode,
                max_fee,
                nonce,
                chain_id,
                signature,
            }))
        }
        TransactionKind::InvokeFunction => {
            // The address is the target of the call, not the deployed entity.
            let receiver = contract_address.ok_or_else(|| {
                StarknetError::Ecosystem("invoke transaction requires a contract address".to_string())
            })?;
            let selector = raw
                .entry_point_selector
                .as_ref()
                .map(RawValue::to_felt)
                .transpose()?;

            let method = match (&raw.method_abi, selector) {
                (Some(method), _) => method.clone(),
                (None, Some(selector)) => {
                    let contract_type = chain
                        .get_contract_type(&receiver)
                        .ok_or_else(|| StarknetError::ContractTypeNotFound(receiver.to_checksum()))?;
                    contract_type
                        .abi
                        .method_by_selector(selector)
                        .cloned()
                        .ok_or_else(|| {
                            StarknetError::Ecosystem(format!(
                                "no method with selector '{}' on contract '{receiver}'",
                                felt_to_hex(&selector)
                            ))
                        })?
                }
                (None, None) => execute_signature(),
            };

            Ok(Transaction::Invoke(InvokeTransaction {
                receiver,
                entry_point_selector: selector.unwrap_or_else(|| method.selector()),
                calldata: normalize_calldata(raw.calldata.as_deref())?,
                method,
                max_fee,
                nonce,
                chain_id,
                signature,
            }))
        }
    }
}

fn normalize_calldata(values: Option<&[RawValue]>) -> Result<Vec<Felt>, StarknetError> {
    match values {
        Some(values) => values.iter().map(RawValue::to_felt).collect(),
        None => Ok(Vec::new()),
    }
}

fn decode_bytecode(data: &str) -> Result<Bytes, StarknetError> {
    let stripped = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(stripped)
        .map(Bytes::from)
        .map_err(|e| StarknetError::Ecosystem(format!("invalid bytecode hex: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{ContractAbi, ContractClass, ContractType};
    use crate::provider::MockChain;
    use crate::selector::selector_from_name;

    fn erc20_type() -> ContractType {
        ContractType {
            abi: ContractAbi::from_json(
                r#"[{"type": "function", "name": "transfer",
                     "inputs": [{"name": "recipient", "type": "felt"},
                                {"name": "amount", "type": "felt"}],
                     "outputs": [{"name": "success", "type": "felt"}]}]"#,
            )
            .unwrap(),
            deployment_bytecode: None,
        }
    }

    fn addr(value: u64) -> ContractAddress {
        ContractAddress::from_felt(Felt::from(value))
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(
            TransactionKind::parse("INVOKE_FUNCTION").unwrap(),
            TransactionKind::InvokeFunction
        );
        assert_eq!(
            TransactionKind::parse("DECLARE").unwrap(),
            TransactionKind::Declare
        );
        assert_eq!(
            TransactionKind::parse("DEPLOY_ACCOUNT").unwrap(),
            TransactionKind::DeployAccount
        );
    }

    #[test]
    fn test_unknown_kind_is_provider_error() {
        let result = TransactionKind::parse("DEPLOY");
        assert!(matches!(result, Err(StarknetError::Provider(_))));
    }

    #[test]
    fn test_invoke_defaults_to_execute() {
        // No method signature and no selector: assume the account multicall.
        let raw = RawTransaction {
            kind: Some("INVOKE_FUNCTION".to_string()),
            contract_address: Some(RawValue::Text("0x123".to_string())),
            ..Default::default()
        };
        let tx = create_transaction(&MockChain::new(), &raw).unwrap();
        match tx {
            Transaction::Invoke(invoke) => {
                assert_eq!(invoke.method.name, "__execute__");
                assert_eq!(
                    invoke.entry_point_selector,
                    selector_from_name("__execute__")
                );
            }
            other => panic!("expected invoke, got {other:?}"),
        }
    }

    #[test]
    fn test_invoke_resolves_method_by_selector() {
        let target = addr(0x123);
        let chain = MockChain::new().with_contract(target, erc20_type());
        let raw = RawTransaction {
            kind: Some("INVOKE_FUNCTION".to_string()),
            contract_address: Some(RawValue::Text("0x123".to_string())),
            entry_point_selector: Some(RawValue::Text(felt_to_hex(&selector_from_name(
                "transfer",
            )))),
            ..Default::default()
        };
        let tx = create_transaction(&chain, &raw).unwrap();
        match tx {
            Transaction::Invoke(invoke) => {
                assert_eq!(invoke.method.name, "transfer");
                assert_eq!(invoke.receiver, target);
            }
            other => panic!("expected invoke, got {other:?}"),
        }
    }

    #[test]
    fn test_invoke_unknown_contract_fails() {
        let raw = RawTransaction {
            kind: Some("INVOKE_FUNCTION".to_string()),
            contract_address: Some(RawValue::Text("0x123".to_string())),
            entry_point_selector: Some(RawValue::Number(1)),
            ..Default::default()
        };
        let result = create_transaction(&MockChain::new(), &raw);
        assert!(matches!(
            result,
            Err(StarknetError::ContractTypeNotFound(_))
        ));
    }

    #[test]
    fn test_invoke_unknown_selector_fails() {
        let target = addr(0x123);
        let chain = MockChain::new().with_contract(target, erc20_type());
        let raw = RawTransaction {
            kind: Some("INVOKE_FUNCTION".to_string()),
            contract_address: Some(RawValue::Text("0x123".to_string())),
            entry_point_selector: Some(RawValue::Number(1)),
            ..Default::default()
        };
        let result = create_transaction(&chain, &raw);
        assert!(matches!(result, Err(StarknetError::Ecosystem(_))));
    }

    #[test]
    fn test_explicit_method_signature_is_kept() {
        let raw = RawTransaction {
            kind: Some("INVOKE_FUNCTION".to_string()),
            contract_address: Some(RawValue::Text("0x123".to_string())),
            method_abi: Some(erc20_type().abi.method("transfer").unwrap().clone()),
            ..Default::default()
        };
        let tx = create_transaction(&MockChain::new(), &raw).unwrap();
        match tx {
            Transaction::Invoke(invoke) => assert_eq!(invoke.method.name, "transfer"),
            other => panic!("expected invoke, got {other:?}"),
        }
    }

    #[test]
    fn test_signature_always_forced_unset() {
        let raw = RawTransaction {
            kind: Some("INVOKE_FUNCTION".to_string()),
            contract_address: Some(RawValue::Text("0x123".to_string())),
            signature: Some(vec![RawValue::Number(1), RawValue::Number(2)]),
            ..Default::default()
        };
        let tx = create_transaction(&MockChain::new(), &raw).unwrap();
        assert!(tx.signature().is_none());
    }

    #[test]
    fn test_calldata_normalized_to_integers() {
        // Transactions in blocks show calldata as flattened hex strings.
        let raw = RawTransaction {
            kind: Some("INVOKE_FUNCTION".to_string()),
            contract_address: Some(RawValue::Text("0x123".to_string())),
            calldata: Some(vec![
                RawValue::Text("0x5".to_string()),
                RawValue::Number(7),
                RawValue::Text("10".to_string()),
            ]),
            ..Default::default()
        };
        let tx = create_transaction(&MockChain::new(), &raw).unwrap();
        match tx {
            Transaction::Invoke(invoke) => {
                assert_eq!(
                    invoke.calldata,
                    vec![Felt::from(5u64), Felt::from(7u64), Felt::from(10u64)]
                );
            }
            other => panic!("expected invoke, got {other:?}"),
        }
    }

    #[test]
    fn test_chain_id_defaults_to_active_network() {
        let chain = MockChain::new().with_chain_id(Felt::from(0x534eu64));
        let raw = RawTransaction {
            kind: Some("DECLARE".to_string()),
            ..Default::default()
        };
        let tx = create_transaction(&chain, &raw).unwrap();
        assert_eq!(tx.chain_id(), Some(Felt::from(0x534eu64)));

        // An explicit chain id wins.
        let raw = RawTransaction {
            kind: Some("DECLARE".to_string()),
            chain_id: Some(RawValue::Number(9)),
            ..Default::default()
        };
        let tx = create_transaction(&chain, &raw).unwrap();
        assert_eq!(tx.chain_id(), Some(Felt::from(9u64)));
    }

    #[test]
    fn test_declare_attaches_stored_class() {
        let class_hash = Felt::from(0xabcu64);
        let chain = MockChain::new().with_class(
            class_hash,
            ContractClass {
                abi: None,
                program: Bytes::from_static(b"\x01\x02"),
            },
        );
        let raw = RawTransaction {
            kind: Some("DECLARE".to_string()),
            class_hash: Some(RawValue::Text("0xabc".to_string())),
            ..Default::default()
        };
        let tx = create_transaction(&chain, &raw).unwrap();
        match tx {
            Transaction::Declare(declare) => {
                assert_eq!(declare.class_hash, Some(class_hash));
                assert_eq!(declare.data, Some(Bytes::from_static(b"\x01\x02")));
            }
            other => panic!("expected declare, got {other:?}"),
        }
    }

    #[test]
    fn test_deploy_account_attaches_local_bytecode() {
        let class_hash = Felt::from(0xabcu64);
        let deployed = addr(0x999);
        let chain = MockChain::new().with_local_contract_type(
            class_hash,
            ContractType {
                abi: ContractAbi::default(),
                deployment_bytecode: Some(Bytes::from_static(b"\x60\x80")),
            },
        );
        let raw = RawTransaction {
            kind: Some("DEPLOY_ACCOUNT".to_string()),
            contract_address: Some(RawValue::Text("0x999".to_string())),
            class_hash: Some(RawValue::Text("0xabc".to_string())),
            salt: Some(RawValue::Number(3)),
            constructor_calldata: Some(vec![RawValue::Number(1)]),
            ..Default::default()
        };
        let tx = create_transaction(&chain, &raw).unwrap();
        match tx {
            Transaction::DeployAccount(deploy) => {
                assert_eq!(deploy.contract_address, Some(deployed));
                assert_eq!(deploy.data, Some(Bytes::from_static(b"\x60\x80")));
                assert_eq!(deploy.salt, Some(Felt::from(3u64)));
                assert_eq!(deploy.constructor_calldata, vec![Felt::one()]);
            }
            other => panic!("expected deploy-account, got {other:?}"),
        }
    }

    #[test]
    fn test_bytecode_falls_back_to_address_lookup() {
        let deployed = addr(0x999);
        let chain = MockChain::new().with_contract(
            deployed,
            ContractType {
                abi: ContractAbi::default(),
                deployment_bytecode: Some(Bytes::from_static(b"\xaa")),
            },
        );
        let raw = RawTransaction {
            kind: Some("DEPLOY_ACCOUNT".to_string()),
            contract_address: Some(RawValue::Text("0x999".to_string())),
            ..Default::default()
        };
        let tx = create_transaction(&chain, &raw).unwrap();
        match tx {
            Transaction::DeployAccount(deploy) => {
                assert_eq!(deploy.data, Some(Bytes::from_static(b"\xaa")));
            }
            other => panic!("expected deploy-account, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_kind_tag() {
        let result = create_transaction(&MockChain::new(), &RawTransaction::default());
        assert!(matches!(result, Err(StarknetError::Provider(_))));
    }

    #[test]
    fn test_raw_transaction_from_json() {
        let raw = RawTransaction::from_json(
            r#"{"type": "INVOKE_FUNCTION",
                "contract_address": "0x123",
                "entry_point_selector": "0x1",
                "calldata": ["0x5", 7],
                "max_fee": "0x10"}"#,
        )
        .unwrap();
        assert_eq!(raw.kind.as_deref(), Some("INVOKE_FUNCTION"));
        assert_eq!(raw.calldata.as_ref().unwrap().len(), 2);
        assert_eq!(raw.max_fee.unwrap().to_felt().unwrap(), Felt::from(16u64));
    }

    #[test]
    fn test_execute_signature_shape() {
        let sig = execute_signature();
        assert_eq!(sig.name, "__execute__");
        assert_eq!(sig.inputs.len(), 4);
        assert!(sig.inputs[1].is_array());
        assert!(sig.inputs[3].is_array());
        assert_eq!(sig.outputs.len(), 2);
    }
}
