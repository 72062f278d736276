//! Dynamic values for schema-driven encoding.
//!
//! Typed authorizations ([`crate::types`]) lower themselves into a
//! [`StructValue`]; values received as JSON are lifted into one under the
//! guidance of a [`TypeSchemaRegistry`].

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde_json::{json, Number};

use crate::error::EncodingError;
use crate::schema::{FieldType, PrimitiveType, TypeSchemaRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Address(Address),
    Bool(bool),
    Uint(U256),
    /// Left-aligned bytes of a `bytesN` field.
    FixedBytes(Bytes),
    Bytes(Bytes),
    String(String),
    Array(Vec<Value>),
    Struct(StructValue),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Address(_) => "address",
            Value::Bool(_) => "bool",
            Value::Uint(_) => "uint",
            Value::FixedBytes(_) => "fixed bytes",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
        }
    }

    /// Render for a typed-data document. Integers that fit in a `u64` are
    /// emitted as JSON numbers, larger ones as decimal strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Address(address) => json!(address.to_checksum(None)),
            Value::Bool(b) => json!(b),
            Value::Uint(v) if v.bit_len() <= 64 => json!(v.to::<u64>()),
            Value::Uint(v) => json!(v.to_string()),
            Value::FixedBytes(bytes) | Value::Bytes(bytes) => {
                json!(format!("0x{}", hex::encode(bytes)))
            }
            Value::String(s) => json!(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Struct(value) => value.to_json(),
        }
    }
}

impl From<Address> for Value {
    fn from(address: Address) -> Self {
        Value::Address(address)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<U256> for Value {
    fn from(v: U256) -> Self {
        Value::Uint(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Uint(U256::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(U256::from(v))
    }
}

impl From<B256> for Value {
    fn from(word: B256) -> Self {
        Value::FixedBytes(Bytes::copy_from_slice(word.as_slice()))
    }
}

impl From<Bytes> for Value {
    fn from(bytes: Bytes) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<StructValue> for Value {
    fn from(value: StructValue) -> Self {
        Value::Struct(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// An instance of a named struct type. Fields are looked up by name; the
/// schema decides their order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructValue {
    type_name: String,
    fields: BTreeMap<String, Value>,
}

impl StructValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }

    /// Lift a JSON object into a value of `type_name`, checking every field
    /// against its declared type.
    pub fn from_json(
        registry: &TypeSchemaRegistry,
        type_name: &str,
        json: &serde_json::Value,
    ) -> Result<Self, EncodingError> {
        struct_from_json(registry, type_name, json, type_name)
    }
}

fn struct_from_json(
    registry: &TypeSchemaRegistry,
    type_name: &str,
    json: &serde_json::Value,
    path: &str,
) -> Result<StructValue, EncodingError> {
    let definition = registry.get(type_name)?;
    let object = json.as_object().ok_or_else(|| EncodingError::TypeMismatch {
        path: path.to_string(),
        expected: type_name.to_string(),
        found: json_kind(json).to_string(),
    })?;

    if let Some(unknown) = object.keys().find(|key| definition.field(key).is_none()) {
        return Err(EncodingError::UnknownField {
            path: path.to_string(),
            field: unknown.clone(),
        });
    }

    let mut value = StructValue::new(type_name);
    for field in &definition.fields {
        let field_json = object
            .get(&field.name)
            .ok_or_else(|| EncodingError::MissingField {
                path: path.to_string(),
                field: field.name.clone(),
            })?;
        let field_path = format!("{}.{}", path, field.name);
        value.set(
            field.name.clone(),
            value_from_json(registry, &field.ty, field_json, &field_path)?,
        );
    }
    Ok(value)
}

fn value_from_json(
    registry: &TypeSchemaRegistry,
    ty: &FieldType,
    json: &serde_json::Value,
    path: &str,
) -> Result<Value, EncodingError> {
    let mismatch = || EncodingError::TypeMismatch {
        path: path.to_string(),
        expected: ty.to_string(),
        found: json_kind(json).to_string(),
    };

    match ty {
        FieldType::Struct(name) => Ok(Value::Struct(struct_from_json(
            registry, name, json, path,
        )?)),
        FieldType::Array { element, .. } => {
            let items = json.as_array().ok_or_else(mismatch)?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    value_from_json(registry, element, item, &format!("{}[{}]", path, i))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        FieldType::Primitive(primitive) => match primitive {
            PrimitiveType::Address => {
                let s = json.as_str().ok_or_else(mismatch)?;
                s.parse::<Address>()
                    .map(Value::Address)
                    .map_err(|_| EncodingError::InvalidValue {
                        path: path.to_string(),
                        reason: format!("`{}` is not an address", s),
                    })
            }
            PrimitiveType::Bool => json.as_bool().map(Value::Bool).ok_or_else(mismatch),
            PrimitiveType::Uint(_) => uint_from_json(json, path).map(Value::Uint),
            PrimitiveType::FixedBytes(_) => {
                let s = json.as_str().ok_or_else(mismatch)?;
                hex_from_json(s, path).map(Value::FixedBytes)
            }
            PrimitiveType::Bytes => {
                let s = json.as_str().ok_or_else(mismatch)?;
                hex_from_json(s, path).map(Value::Bytes)
            }
            PrimitiveType::String => json
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(mismatch),
        },
    }
}

/// Accepts JSON integers, decimal strings and `0x` hex strings.
pub(crate) fn uint_from_json(json: &serde_json::Value, path: &str) -> Result<U256, EncodingError> {
    let negative = || EncodingError::NegativeValue {
        path: path.to_string(),
    };
    match json {
        serde_json::Value::Number(n) => uint_from_number(n, path),
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.starts_with('-') {
                return Err(negative());
            }
            s.parse::<U256>().map_err(|_| EncodingError::InvalidValue {
                path: path.to_string(),
                reason: format!("`{}` is not an unsigned integer", s),
            })
        }
        other => Err(EncodingError::TypeMismatch {
            path: path.to_string(),
            expected: "unsigned integer".to_string(),
            found: json_kind(other).to_string(),
        }),
    }
}

fn uint_from_number(n: &Number, path: &str) -> Result<U256, EncodingError> {
    if let Some(v) = n.as_u64() {
        return Ok(U256::from(v));
    }
    if n.as_i64().is_some_and(|v| v < 0) || n.as_f64().is_some_and(|v| v < 0.0) {
        return Err(EncodingError::NegativeValue {
            path: path.to_string(),
        });
    }
    Err(EncodingError::InvalidValue {
        path: path.to_string(),
        reason: format!(
            "`{}` is not an exact integer; pass large values as strings",
            n
        ),
    })
}

fn hex_from_json(s: &str, path: &str) -> Result<Bytes, EncodingError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|_| EncodingError::InvalidValue {
            path: path.to_string(),
            reason: format!("`{}` is not hex", s),
        })
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
