//! ABI type definitions

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::felt::Felt;
use crate::selector::selector_from_name;
use crate::StarknetError;

/// A call argument as supplied by a caller.
///
/// Untyped at the boundary; typed only by position against a method's
/// declared inputs. Scalars are normalized to [`CallArg::Felt`] by the
/// primitive codec before structural serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    /// Boolean, encoded as 0/1
    Bool(bool),
    /// A field-element integer
    Felt(Felt),
    /// A string; `0x`-prefixed strings parse as hex integers
    Str(String),
    /// A byte string, interpreted as a big-endian integer
    Bytes(Vec<u8>),
    /// An array of arguments
    Array(Vec<CallArg>),
    /// A struct: named fields in declaration order
    Struct(Vec<(String, CallArg)>),
}

impl CallArg {
    /// The felt value if this argument is a normalized scalar.
    pub fn as_felt(&self) -> Option<Felt> {
        match self {
            CallArg::Felt(v) => Some(*v),
            _ => None,
        }
    }

    /// Look up a struct field by name.
    pub fn field(&self, name: &str) -> Option<&CallArg> {
        match self {
            CallArg::Struct(fields) => {
                fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }
}

impl From<bool> for CallArg {
    fn from(value: bool) -> Self {
        CallArg::Bool(value)
    }
}

impl From<u64> for CallArg {
    fn from(value: u64) -> Self {
        CallArg::Felt(Felt::from(value))
    }
}

impl From<Felt> for CallArg {
    fn from(value: Felt) -> Self {
        CallArg::Felt(value)
    }
}

impl From<&str> for CallArg {
    fn from(value: &str) -> Self {
        CallArg::Str(value.to_string())
    }
}

impl From<Vec<CallArg>> for CallArg {
    fn from(value: Vec<CallArg>) -> Self {
        CallArg::Array(value)
    }
}

/// A typed input or output of a method or event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Declared type string, e.g. `felt`, `felt*`, `Uint256`, `MyStruct`
    #[serde(rename = "type")]
    pub ty: String,
}

impl Param {
    /// Create a parameter from name and type strings.
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// Whether the declared type denotes an array (trailing `*` marker).
    pub fn is_array(&self) -> bool {
        self.ty.ends_with('*')
    }

    /// The element type of an array parameter.
    pub fn element_type(&self) -> &str {
        self.ty.trim_end_matches('*')
    }

    /// Whether the name follows the `<basename>_len` length convention.
    pub fn is_len_name(&self) -> bool {
        self.name.ends_with("_len")
    }
}

/// A method or constructor signature: name plus ordered typed inputs and
/// outputs. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    /// Method name
    pub name: String,
    /// Ordered declared inputs
    #[serde(default)]
    pub inputs: Vec<Param>,
    /// Ordered declared outputs
    #[serde(default)]
    pub outputs: Vec<Param>,
    /// State mutability tag (`view` for read-only methods)
    #[serde(rename = "stateMutability", skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<String>,
}

impl MethodSignature {
    /// The method's wire selector (deterministic hash of its name).
    pub fn selector(&self) -> Felt {
        selector_from_name(&self.name)
    }

    /// Whether this is a read-only view method.
    pub fn is_view(&self) -> bool {
        self.state_mutability.as_deref() == Some("view")
    }
}

/// An event signature: name plus ordered typed fields.
///
/// A field typed `Uint256` occupies two consecutive data slots (low then
/// high 128 bits).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSignature {
    /// Event name
    pub name: String,
    /// Selector keys carried by emitted logs
    #[serde(default)]
    pub keys: Vec<Param>,
    /// Ordered data fields
    #[serde(default, alias = "inputs")]
    pub data: Vec<Param>,
}

impl EventSignature {
    /// The event's wire selector (deterministic hash of its name).
    pub fn selector(&self) -> Felt {
        selector_from_name(&self.name)
    }
}

/// A struct member declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructMember {
    /// Member name
    pub name: String,
    /// Member type
    #[serde(rename = "type")]
    pub ty: String,
    /// Member offset within the struct, in felts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// A struct type declaration: named members in flattening order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    /// Struct name
    pub name: String,
    /// Members in declaration order
    #[serde(default)]
    pub members: Vec<StructMember>,
    /// Total size in felts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

/// One entry of a contract ABI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AbiEntry {
    /// A callable method
    Function(MethodSignature),
    /// The constructor
    Constructor(MethodSignature),
    /// An L1 message handler
    L1Handler(MethodSignature),
    /// An emitted event
    Event(EventSignature),
    /// A struct type declaration
    Struct(StructDef),
}

/// A full contract ABI: the declaring contract's complete entry list.
///
/// The serializer is seeded with this so nested struct member types resolve
/// correctly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractAbi {
    entries: Vec<AbiEntry>,
}

impl ContractAbi {
    /// Build an ABI from a list of entries.
    pub fn new(entries: Vec<AbiEntry>) -> Self {
        ContractAbi { entries }
    }

    /// Parse the externally defined ABI JSON schema.
    pub fn from_json(json: &str) -> Result<Self, StarknetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// All entries in declaration order.
    pub fn entries(&self) -> &[AbiEntry] {
        &self.entries
    }

    /// Iterate declared functions.
    pub fn functions(&self) -> impl Iterator<Item = &MethodSignature> {
        self.entries.iter().filter_map(|e| match e {
            AbiEntry::Function(m) => Some(m),
            _ => None,
        })
    }

    /// Iterate declared events.
    pub fn events(&self) -> impl Iterator<Item = &EventSignature> {
        self.entries.iter().filter_map(|e| match e {
            AbiEntry::Event(ev) => Some(ev),
            _ => None,
        })
    }

    /// Look up a function by name.
    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.functions().find(|m| m.name == name)
    }

    /// Look up a view method by name.
    pub fn view_method(&self, name: &str) -> Option<&MethodSignature> {
        self.functions().find(|m| m.is_view() && m.name == name)
    }

    /// Look up a function by its wire selector.
    pub fn method_by_selector(&self, selector: Felt) -> Option<&MethodSignature> {
        self.functions().find(|m| m.selector() == selector)
    }

    /// The constructor signature, if declared.
    pub fn constructor(&self) -> Option<&MethodSignature> {
        self.entries.iter().find_map(|e| match e {
            AbiEntry::Constructor(m) => Some(m),
            _ => None,
        })
    }

    /// Look up a struct declaration by name.
    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.entries.iter().find_map(|e| match e {
            AbiEntry::Struct(s) if s.name == name => Some(s),
            _ => None,
        })
    }
}

/// A stored contract type: ABI plus optional deployment bytecode.
#[derive(Debug, Clone, Default)]
pub struct ContractType {
    /// The contract's ABI
    pub abi: ContractAbi,
    /// Deployment bytecode, when locally known
    pub deployment_bytecode: Option<Bytes>,
}

/// A deserialized contract class definition, keyed by class hash.
#[derive(Debug, Clone, Default)]
pub struct ContractClass {
    /// The class ABI, when present
    pub abi: Option<ContractAbi>,
    /// The serialized program
    pub program: Bytes,
}
