//! Positional call tuples for the on-chain verifier.
//!
//! The signed struct becomes a tuple whose members follow the schema's
//! declared field order, never the order fields happen to be written in.
//! Auxiliary arguments follow it in the order an [`OrderLayout`] declares.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::B256;
use serde_json::json;
use tracing::debug;

use crate::error::{EncodingError, Result};
use crate::schema::{FieldType, PrimitiveType, TypeSchemaRegistry};
use crate::signing::StructEncoder;
use crate::types::{SignedCall, SignedMintOrder, TypedStruct};
use crate::value::{StructValue, Value};

/// An argument appended after the signed struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuxField {
    /// `uint256` number of times the parameters are applied.
    Quantity,
    /// `bytes` primary signature.
    Signature,
    /// `bytes` oracle co-signature, empty when absent.
    OracleSignature,
    /// `bytes32[]` allowlist proof.
    MerkleProof,
    /// `uint256[]` claimed token ids or indices.
    SuppliedTokenIds,
    /// `address` referrer, zero when absent.
    Referrer,
}

impl AuxField {
    pub fn name(&self) -> &'static str {
        match self {
            AuxField::Quantity => "quantity",
            AuxField::Signature => "signature",
            AuxField::OracleSignature => "oracleSignature",
            AuxField::MerkleProof => "merkleProof",
            AuxField::SuppliedTokenIds => "suppliedTokenIds",
            AuxField::Referrer => "referrer",
        }
    }
}

/// Argument order of a verifying contract's entry point. This is a
/// compatibility contract with a deployed revision, so it is data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLayout {
    pub name: &'static str,
    pub aux_fields: &'static [AuxField],
}

/// `mint(MintParameters, quantity, signature, oracleSignature, merkleProof,
/// suppliedTokenIds, referrer)`
///
/// An absent oracle signature is zero-length `bytes`, not a single zero
/// byte. The contract only reads it when `oracleSignatureRequired` is set.
pub const MINT_ORDER_V1: OrderLayout = OrderLayout {
    name: "mint-order-v1",
    aux_fields: &[
        AuxField::Quantity,
        AuxField::Signature,
        AuxField::OracleSignature,
        AuxField::MerkleProof,
        AuxField::SuppliedTokenIds,
        AuxField::Referrer,
    ],
};

/// `call(Call, signature)`
pub const CALL_V1: OrderLayout = OrderLayout {
    name: "call-v1",
    aux_fields: &[AuxField::Signature],
};

/// Supplies the auxiliary arguments a signed object carries.
pub trait AuxArguments {
    fn aux_value(&self, field: AuxField) -> Option<DynSolValue>;
}

impl AuxArguments for SignedMintOrder {
    fn aux_value(&self, field: AuxField) -> Option<DynSolValue> {
        Some(match field {
            AuxField::Quantity => DynSolValue::Uint(self.quantity, 256),
            AuxField::Signature => DynSolValue::Bytes(self.signature.to_bytes().to_vec()),
            AuxField::OracleSignature => DynSolValue::Bytes(
                self.oracle_signature
                    .map(|signature| signature.to_bytes().to_vec())
                    .unwrap_or_default(),
            ),
            AuxField::MerkleProof => DynSolValue::Array(
                self.merkle_proof
                    .iter()
                    .map(|node| DynSolValue::FixedBytes(*node, 32))
                    .collect(),
            ),
            AuxField::SuppliedTokenIds => DynSolValue::Array(
                self.supplied_token_ids
                    .iter()
                    .map(|id| DynSolValue::Uint(*id, 256))
                    .collect(),
            ),
            AuxField::Referrer => DynSolValue::Address(self.referrer),
        })
    }
}

impl AuxArguments for SignedCall {
    fn aux_value(&self, field: AuxField) -> Option<DynSolValue> {
        match field {
            AuxField::Signature => Some(DynSolValue::Bytes(self.signature.to_bytes().to_vec())),
            _ => None,
        }
    }
}

/// Call arguments in positional order.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledOrder {
    layout: OrderLayout,
    arguments: Vec<DynSolValue>,
}

impl AssembledOrder {
    pub fn layout(&self) -> &OrderLayout {
        &self.layout
    }

    pub fn arguments(&self) -> &[DynSolValue] {
        &self.arguments
    }

    /// All arguments as one tuple.
    pub fn as_tuple(&self) -> DynSolValue {
        DynSolValue::Tuple(self.arguments.clone())
    }

    /// ABI-encoded call arguments, without a function selector.
    pub fn abi_encode_params(&self) -> Vec<u8> {
        self.as_tuple().abi_encode_params()
    }

    /// Arguments as a JSON array, integers as decimal strings.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.arguments.iter().map(abi_value_json).collect())
    }
}

/// Assemble a signed mint order under [`MINT_ORDER_V1`].
pub fn assemble_order(
    registry: &TypeSchemaRegistry,
    order: &SignedMintOrder,
) -> Result<AssembledOrder> {
    assemble_order_with_layout(registry, order, MINT_ORDER_V1)
}

/// Assemble a signed mint order under a caller-supplied layout.
pub fn assemble_order_with_layout(
    registry: &TypeSchemaRegistry,
    order: &SignedMintOrder,
    layout: OrderLayout,
) -> Result<AssembledOrder> {
    assemble(
        registry,
        &order.mint_parameters.to_struct_value(),
        order,
        layout,
    )
}

/// Assemble a signed wallet call under [`CALL_V1`].
pub fn assemble_call(registry: &TypeSchemaRegistry, call: &SignedCall) -> Result<AssembledOrder> {
    assemble(registry, &call.call.to_struct_value(), call, CALL_V1)
}

/// Assemble any signed struct value with its auxiliary arguments.
pub fn assemble(
    registry: &TypeSchemaRegistry,
    message: &StructValue,
    aux: &impl AuxArguments,
    layout: OrderLayout,
) -> Result<AssembledOrder> {
    StructEncoder::new(registry).validate(message)?;

    let mut arguments = Vec::with_capacity(layout.aux_fields.len() + 1);
    arguments.push(struct_to_abi(registry, message)?);
    for field in layout.aux_fields {
        let value = aux
            .aux_value(*field)
            .ok_or_else(|| EncodingError::InvalidValue {
                path: layout.name.to_string(),
                reason: format!(
                    "`{}` has no `{}` argument",
                    message.type_name(),
                    field.name()
                ),
            })?;
        arguments.push(value);
    }

    debug!(
        layout = layout.name,
        primary_type = message.type_name(),
        arguments = arguments.len(),
        "Assembled call arguments"
    );

    Ok(AssembledOrder { layout, arguments })
}

fn struct_to_abi(
    registry: &TypeSchemaRegistry,
    value: &StructValue,
) -> std::result::Result<DynSolValue, EncodingError> {
    let definition = registry.get(value.type_name())?;
    definition
        .fields
        .iter()
        .map(|field| {
            let field_value = value
                .get(&field.name)
                .ok_or_else(|| EncodingError::MissingField {
                    path: value.type_name().to_string(),
                    field: field.name.clone(),
                })?;
            field_to_abi(registry, &field.ty, field_value)
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(DynSolValue::Tuple)
}

fn field_to_abi(
    registry: &TypeSchemaRegistry,
    ty: &FieldType,
    value: &Value,
) -> std::result::Result<DynSolValue, EncodingError> {
    let mismatch = || EncodingError::TypeMismatch {
        path: ty.to_string(),
        expected: ty.to_string(),
        found: value.kind().to_string(),
    };

    Ok(match (ty, value) {
        (FieldType::Struct(_), Value::Struct(inner)) => struct_to_abi(registry, inner)?,
        (FieldType::Array { element, len }, Value::Array(items)) => {
            let items = items
                .iter()
                .map(|item| field_to_abi(registry, element, item))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            match len {
                Some(_) => DynSolValue::FixedArray(items),
                None => DynSolValue::Array(items),
            }
        }
        (FieldType::Primitive(primitive), value) => match (primitive, value) {
            (PrimitiveType::Address, Value::Address(address)) => DynSolValue::Address(*address),
            (PrimitiveType::Bool, Value::Bool(b)) => DynSolValue::Bool(*b),
            (PrimitiveType::Uint(bits), Value::Uint(v)) => DynSolValue::Uint(*v, *bits),
            (PrimitiveType::FixedBytes(len), Value::FixedBytes(bytes)) => {
                DynSolValue::FixedBytes(B256::right_padding_from(bytes), *len)
            }
            (PrimitiveType::Bytes, Value::Bytes(bytes)) => DynSolValue::Bytes(bytes.to_vec()),
            (PrimitiveType::String, Value::String(s)) => DynSolValue::String(s.clone()),
            _ => return Err(mismatch()),
        },
        _ => return Err(mismatch()),
    })
}

fn abi_value_json(value: &DynSolValue) -> serde_json::Value {
    match value {
        DynSolValue::Address(address) => json!(address.to_checksum(None)),
        DynSolValue::Bool(b) => json!(b),
        DynSolValue::Uint(v, _) => json!(v.to_string()),
        DynSolValue::FixedBytes(word, len) => json!(format!("0x{}", hex::encode(&word[..*len]))),
        DynSolValue::Bytes(bytes) => json!(format!("0x{}", hex::encode(bytes))),
        DynSolValue::String(s) => json!(s),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            serde_json::Value::Array(items.iter().map(abi_value_json).collect())
        }
        // Not produced by the assembler.
        _ => serde_json::Value::Null,
    }
}
