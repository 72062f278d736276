//! Recursive EIP-712 struct hashing.
//!
//! `hashStruct(s) = keccak256(typeHash(s) || encodeData(s))` where every
//! field contributes exactly one 32-byte word:
//!
//! - atomic values are ABI-encoded into a word (addresses left-padded,
//!   `bytesN` right-padded, booleans as 0/1)
//! - `bytes` and `string` contribute their keccak256 hash
//! - nested structs contribute their own struct hash
//! - arrays contribute the keccak256 of their elements' words, in order;
//!   an empty array contributes `keccak256("")`
//!
//! A value is fully checked against its schema before any hashing starts.

use alloy_primitives::{keccak256, B256};

use crate::error::EncodingError;
use crate::schema::{FieldType, PrimitiveType, TypeDefinition, TypeSchemaRegistry};
use crate::value::{StructValue, Value};

/// Hashes struct values against a validated schema.
#[derive(Debug, Clone, Copy)]
pub struct StructEncoder<'a> {
    registry: &'a TypeSchemaRegistry,
}

impl<'a> StructEncoder<'a> {
    pub fn new(registry: &'a TypeSchemaRegistry) -> Self {
        Self { registry }
    }

    /// `hashStruct(value)` for the type named by `value.type_name()`.
    pub fn hash_struct(&self, value: &StructValue) -> Result<B256, EncodingError> {
        self.validate(value)?;
        self.hash_validated(value)
    }

    /// `typeHash || encodeData(value)`, the preimage of [`Self::hash_struct`].
    pub fn encode_data(&self, value: &StructValue) -> Result<Vec<u8>, EncodingError> {
        self.validate(value)?;
        self.encode_validated(value)
    }

    /// Check that `value` conforms to its declared type without hashing.
    pub fn validate(&self, value: &StructValue) -> Result<(), EncodingError> {
        self.validate_struct(value.type_name(), value, value.type_name())
    }

    fn validate_struct(
        &self,
        type_name: &str,
        value: &StructValue,
        path: &str,
    ) -> Result<(), EncodingError> {
        if value.type_name() != type_name {
            return Err(EncodingError::TypeMismatch {
                path: path.to_string(),
                expected: type_name.to_string(),
                found: value.type_name().to_string(),
            });
        }

        let definition = self.registry.get(type_name)?;
        if let Some(unknown) = value
            .field_names()
            .find(|name| definition.field(name).is_none())
        {
            return Err(EncodingError::UnknownField {
                path: path.to_string(),
                field: unknown.to_string(),
            });
        }

        for field in &definition.fields {
            let field_value = value
                .get(&field.name)
                .ok_or_else(|| EncodingError::MissingField {
                    path: path.to_string(),
                    field: field.name.clone(),
                })?;
            self.validate_field(&field.ty, field_value, &format!("{}.{}", path, field.name))?;
        }
        Ok(())
    }

    fn validate_field(
        &self,
        ty: &FieldType,
        value: &Value,
        path: &str,
    ) -> Result<(), EncodingError> {
        let mismatch = || EncodingError::TypeMismatch {
            path: path.to_string(),
            expected: ty.to_string(),
            found: value.kind().to_string(),
        };

        match (ty, value) {
            (FieldType::Struct(name), Value::Struct(inner)) => {
                self.validate_struct(name, inner, path)
            }
            (FieldType::Array { element, len }, Value::Array(items)) => {
                if let Some(len) = len {
                    if items.len() != *len {
                        return Err(EncodingError::InvalidLength {
                            path: path.to_string(),
                            expected: *len,
                            actual: items.len(),
                        });
                    }
                }
                items.iter().enumerate().try_for_each(|(i, item)| {
                    self.validate_field(element, item, &format!("{}[{}]", path, i))
                })
            }
            (FieldType::Primitive(primitive), _) => match (primitive, value) {
                (PrimitiveType::Address, Value::Address(_))
                | (PrimitiveType::Bool, Value::Bool(_))
                | (PrimitiveType::Bytes, Value::Bytes(_))
                | (PrimitiveType::String, Value::String(_)) => Ok(()),
                (PrimitiveType::Uint(bits), Value::Uint(v)) => {
                    if v.bit_len() > *bits {
                        return Err(EncodingError::OutOfRange {
                            path: path.to_string(),
                            bits: *bits,
                        });
                    }
                    Ok(())
                }
                (PrimitiveType::FixedBytes(len), Value::FixedBytes(bytes)) => {
                    if bytes.len() != *len {
                        return Err(EncodingError::InvalidLength {
                            path: path.to_string(),
                            expected: *len,
                            actual: bytes.len(),
                        });
                    }
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        }
    }

    fn hash_validated(&self, value: &StructValue) -> Result<B256, EncodingError> {
        Ok(keccak256(self.encode_validated(value)?))
    }

    fn encode_validated(&self, value: &StructValue) -> Result<Vec<u8>, EncodingError> {
        let definition: &TypeDefinition = self.registry.get(value.type_name())?;

        let mut encoded = Vec::with_capacity(32 * (definition.fields.len() + 1));
        encoded.extend_from_slice(self.registry.type_hash(value.type_name())?.as_slice());

        for field in &definition.fields {
            let field_value = value
                .get(&field.name)
                .ok_or_else(|| EncodingError::MissingField {
                    path: value.type_name().to_string(),
                    field: field.name.clone(),
                })?;
            encoded.extend_from_slice(self.encode_field(field_value)?.as_slice());
        }
        Ok(encoded)
    }

    /// One 32-byte word of `encodeData`. Types were checked by validation,
    /// so the value alone decides the encoding.
    fn encode_field(&self, value: &Value) -> Result<B256, EncodingError> {
        Ok(match value {
            Value::Address(address) => B256::left_padding_from(address.as_slice()),
            Value::Bool(b) => B256::with_last_byte(*b as u8),
            Value::Uint(v) => B256::from(v.to_be_bytes::<32>()),
            Value::FixedBytes(bytes) => B256::right_padding_from(bytes),
            Value::Bytes(bytes) => keccak256(bytes),
            Value::String(s) => keccak256(s.as_bytes()),
            Value::Struct(inner) => self.hash_validated(inner)?,
            Value::Array(items) => {
                let mut concatenated = Vec::with_capacity(32 * items.len());
                for item in items {
                    concatenated.extend_from_slice(self.encode_field(item)?.as_slice());
                }
                keccak256(&concatenated)
            }
        })
    }
}
