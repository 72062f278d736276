//! Declarative type schemas for typed-data signing.
//!
//! A [`TypeSchemaRegistry`] is built once from `(name, [(field, type)])`
//! declarations and rejects any inconsistency up front: undeclared
//! references, duplicate names and malformed type strings never reach the
//! encoder.
//!
//! The canonical type encoding is the root's own declaration followed by
//! every distinct type it references, sorted by name:
//!
//! ```text
//! MintParameters(MintToken[] mintTokens,BurnToken[] burnTokens,...)BurnToken(...)MintToken(...)PaymentToken(...)
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use alloy_primitives::{keccak256, B256};
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Name reserved for the domain type; domains are built by
/// [`crate::signing::domain::Eip712Domain`], never declared here.
pub const DOMAIN_TYPE_NAME: &str = "EIP712Domain";

/// Primitive (atomic or dynamic) ABI types supported by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Address,
    Bool,
    /// `uintN` with `N` in 8..=256, a multiple of 8.
    Uint(usize),
    /// `bytesN` with `N` in 1..=32.
    FixedBytes(usize),
    Bytes,
    String,
}

impl PrimitiveType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "address" => return Some(Self::Address),
            "bool" => return Some(Self::Bool),
            "bytes" => return Some(Self::Bytes),
            "string" => return Some(Self::String),
            _ => {}
        }
        if let Some(bits) = s.strip_prefix("uint") {
            let bits: usize = bits.parse().ok()?;
            return (bits > 0 && bits <= 256 && bits % 8 == 0).then_some(Self::Uint(bits));
        }
        if let Some(len) = s.strip_prefix("bytes") {
            let len: usize = len.parse().ok()?;
            return (len > 0 && len <= 32).then_some(Self::FixedBytes(len));
        }
        None
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Address => write!(f, "address"),
            PrimitiveType::Bool => write!(f, "bool"),
            PrimitiveType::Uint(bits) => write!(f, "uint{}", bits),
            PrimitiveType::FixedBytes(len) => write!(f, "bytes{}", len),
            PrimitiveType::Bytes => write!(f, "bytes"),
            PrimitiveType::String => write!(f, "string"),
        }
    }
}

/// The declared type of a struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Primitive(PrimitiveType),
    /// Reference to another declared struct type.
    Struct(String),
    /// `T[]` when `len` is `None`, `T[len]` otherwise.
    Array {
        element: Box<FieldType>,
        len: Option<usize>,
    },
}

impl FieldType {
    /// Parse a type string such as `uint256`, `MintToken[]` or `bytes32[4]`.
    ///
    /// Struct references are not resolved here; see [`SchemaBuilder::build`].
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let malformed = || SchemaError::MalformedType(s.to_string());

        if let Some(open_stripped) = s.strip_suffix(']') {
            let open = open_stripped.rfind('[').ok_or_else(malformed)?;
            let (base, len) = (&open_stripped[..open], &open_stripped[open + 1..]);
            if base.is_empty() {
                return Err(malformed());
            }
            let len = if len.is_empty() {
                None
            } else {
                let len: usize = len.parse().map_err(|_| malformed())?;
                if len == 0 {
                    return Err(malformed());
                }
                Some(len)
            };
            let element = FieldType::parse(base).map_err(|_| malformed())?;
            return Ok(FieldType::Array {
                element: Box::new(element),
                len,
            });
        }

        if s.contains('[') || s.contains(']') {
            return Err(malformed());
        }
        if let Some(primitive) = PrimitiveType::parse(s) {
            return Ok(FieldType::Primitive(primitive));
        }
        if !is_identifier(s) {
            return Err(malformed());
        }
        Ok(FieldType::Struct(s.to_string()))
    }

    /// The innermost struct this type refers to, if any.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            FieldType::Primitive(_) => None,
            FieldType::Struct(name) => Some(name),
            FieldType::Array { element, .. } => element.struct_name(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Primitive(p) => write!(f, "{}", p),
            FieldType::Struct(name) => write!(f, "{}", name),
            FieldType::Array { element, len: None } => write!(f, "{}[]", element),
            FieldType::Array {
                element,
                len: Some(len),
            } => write!(f, "{}[{}]", element, len),
        }
    }
}

/// One `(name, type)` pair of a struct declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub ty: FieldType,
}

/// A named struct type. Field order is part of the type's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

impl TypeDefinition {
    /// `Name(type1 name1,type2 name2,...)`
    pub fn declaration(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|field| format!("{} {}", field.ty, field.name))
            .collect();
        format!("{}({})", self.name, fields.join(","))
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// `{ "name": ..., "type": ... }` as it appears in a typed-data document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl From<&FieldDefinition> for TypeField {
    fn from(field: &FieldDefinition) -> Self {
        Self {
            name: field.name.clone(),
            type_name: field.ty.to_string(),
        }
    }
}

/// Collects declarations before validating them as a whole.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    declarations: Vec<(String, Vec<(String, String)>)>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a struct type from `(field name, field type)` pairs.
    pub fn with_type(mut self, name: impl Into<String>, fields: &[(&str, &str)]) -> Self {
        let fields = fields
            .iter()
            .map(|(field, ty)| (field.to_string(), ty.to_string()))
            .collect();
        self.declarations.push((name.into(), fields));
        self
    }

    /// Declare a struct type from typed-data document fields.
    pub fn with_type_fields(mut self, name: impl Into<String>, fields: &[TypeField]) -> Self {
        let fields = fields
            .iter()
            .map(|field| (field.name.clone(), field.type_name.clone()))
            .collect();
        self.declarations.push((name.into(), fields));
        self
    }

    /// Validate every declaration and precompute all type hashes.
    pub fn build(self) -> Result<TypeSchemaRegistry, SchemaError> {
        let mut types = BTreeMap::new();

        for (name, raw_fields) in self.declarations {
            if name == DOMAIN_TYPE_NAME {
                return Err(SchemaError::ReservedTypeName);
            }
            if !is_identifier(&name) {
                return Err(SchemaError::InvalidTypeName(name));
            }
            if types.contains_key(&name) {
                return Err(SchemaError::DuplicateType(name));
            }

            let mut seen = BTreeSet::new();
            let mut fields = Vec::with_capacity(raw_fields.len());
            for (field, ty) in raw_fields {
                if !seen.insert(field.clone()) {
                    return Err(SchemaError::DuplicateField {
                        type_name: name.clone(),
                        field,
                    });
                }
                fields.push(FieldDefinition {
                    name: field,
                    ty: FieldType::parse(&ty)?,
                });
            }
            types.insert(name.clone(), TypeDefinition { name, fields });
        }

        for definition in types.values() {
            for field in &definition.fields {
                if let Some(referenced) = field.ty.struct_name() {
                    if !types.contains_key(referenced) {
                        return Err(SchemaError::UndeclaredType {
                            type_name: definition.name.clone(),
                            referenced: referenced.to_string(),
                        });
                    }
                }
            }
        }

        let mut registry = TypeSchemaRegistry {
            types,
            type_hashes: BTreeMap::new(),
        };
        let mut type_hashes = BTreeMap::new();
        for name in registry.types.keys() {
            type_hashes.insert(name.clone(), keccak256(registry.encode_type(name)?));
        }
        registry.type_hashes = type_hashes;

        Ok(registry)
    }
}

/// Validated, immutable set of struct types.
#[derive(Debug, Clone)]
pub struct TypeSchemaRegistry {
    types: BTreeMap<String, TypeDefinition>,
    type_hashes: BTreeMap<String, B256>,
}

impl TypeSchemaRegistry {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// The Layerr protocol types: mint parameters with their token lists,
    /// and the relayed wallet `Call`.
    pub fn layerr() -> Result<Self, SchemaError> {
        Self::builder()
            .with_type(
                "MintParameters",
                &[
                    ("mintTokens", "MintToken[]"),
                    ("burnTokens", "BurnToken[]"),
                    ("paymentTokens", "PaymentToken[]"),
                    ("startTime", "uint256"),
                    ("endTime", "uint256"),
                    ("signatureMaxUses", "uint256"),
                    ("merkleRoot", "bytes32"),
                    ("nonce", "uint256"),
                    ("oracleSignatureRequired", "bool"),
                ],
            )
            .with_type(
                "MintToken",
                &[
                    ("contractAddress", "address"),
                    ("specificTokenId", "bool"),
                    ("tokenType", "uint8"),
                    ("tokenId", "uint256"),
                    ("mintAmount", "uint256"),
                    ("maxSupply", "uint256"),
                    ("maxMintPerWallet", "uint256"),
                ],
            )
            .with_type(
                "BurnToken",
                &[
                    ("contractAddress", "address"),
                    ("specificTokenId", "bool"),
                    ("tokenType", "uint8"),
                    ("burnType", "uint8"),
                    ("tokenId", "uint256"),
                    ("burnAmount", "uint256"),
                ],
            )
            .with_type(
                "PaymentToken",
                &[
                    ("contractAddress", "address"),
                    ("tokenType", "uint8"),
                    ("payTo", "address"),
                    ("paymentAmount", "uint256"),
                    ("referralBPS", "uint256"),
                ],
            )
            .with_type(
                "Call",
                &[
                    ("nonce", "uint256"),
                    ("to", "address"),
                    ("value", "uint256"),
                    ("data", "bytes"),
                    ("gas", "uint256"),
                ],
            )
            .build()
    }

    pub fn get(&self, name: &str) -> Result<&TypeDefinition, SchemaError> {
        self.types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// The transitive closure of `root` in canonical order: `root` first,
    /// then every distinct referenced type sorted by name.
    pub fn closure(&self, root: &str) -> Result<Vec<&TypeDefinition>, SchemaError> {
        let root_definition = self.get(root)?;
        let mut referenced = BTreeSet::new();
        self.collect_references(root_definition, &mut referenced);
        referenced.remove(root);

        let mut closure = Vec::with_capacity(referenced.len() + 1);
        closure.push(root_definition);
        for name in referenced {
            closure.push(self.get(name)?);
        }
        Ok(closure)
    }

    fn collect_references<'a>(
        &'a self,
        definition: &'a TypeDefinition,
        referenced: &mut BTreeSet<&'a str>,
    ) {
        for field in &definition.fields {
            let Some(name) = field.ty.struct_name() else {
                continue;
            };
            if !referenced.insert(name) {
                continue;
            }
            if let Some(child) = self.types.get(name) {
                self.collect_references(child, referenced);
            }
        }
    }

    /// `encodeType(root)`: the concatenated declarations of [`Self::closure`].
    pub fn encode_type(&self, root: &str) -> Result<String, SchemaError> {
        Ok(self
            .closure(root)?
            .iter()
            .map(|definition| definition.declaration())
            .collect())
    }

    /// `keccak256(encodeType(root))`, computed once at build time.
    pub fn type_hash(&self, root: &str) -> Result<B256, SchemaError> {
        self.type_hashes
            .get(root)
            .copied()
            .ok_or_else(|| SchemaError::UnknownType(root.to_string()))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
