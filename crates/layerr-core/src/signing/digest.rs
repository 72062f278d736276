//! Final signing digests.
//!
//! Typed-data and packed digests are different newtypes so one can never be
//! handed to the other's verifier.

use std::fmt;

use alloy_primitives::{keccak256, FixedBytes, B256};
use alloy_sol_types::SolValue;
use tracing::debug;

use super::domain::Eip712Domain;
use super::encoder::StructEncoder;
use crate::error::{Error, Result};
use crate::schema::TypeSchemaRegistry;
use crate::types::Authorization;
use crate::value::StructValue;

/// EIP-191 version byte pair for structured data. Packed as `bytes2` so it
/// occupies exactly two bytes.
pub const TYPED_DATA_PREFIX: FixedBytes<2> = FixedBytes([0x19, 0x01]);

/// `keccak256("\x19\x01" || domainSeparator || hashStruct(message))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypedDigest(pub(crate) B256);

/// `keccak256(abi.encodePacked(...))` over raw attestation fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedDigest(pub(crate) B256);

/// A 32-byte prehash that a [`super::signer::DigestSigner`] can sign.
pub trait SigningDigest {
    fn as_b256(&self) -> &B256;
}

impl TypedDigest {
    /// Combine a domain separator and a message struct hash.
    pub fn compose(domain_separator: B256, struct_hash: B256) -> Self {
        let data = (TYPED_DATA_PREFIX, domain_separator, struct_hash).abi_encode_packed();
        Self(keccak256(&data))
    }

    pub fn into_inner(self) -> B256 {
        self.0
    }
}

impl PackedDigest {
    pub fn into_inner(self) -> B256 {
        self.0
    }
}

impl SigningDigest for TypedDigest {
    fn as_b256(&self) -> &B256 {
        &self.0
    }
}

impl SigningDigest for PackedDigest {
    fn as_b256(&self) -> &B256 {
        &self.0
    }
}

impl fmt::Display for TypedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for PackedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Digest of a typed authorization under `domain`.
///
/// Fails with [`Error::DomainMismatch`] when the authorization may not be
/// signed under the domain's shape.
pub fn build_digest<A: Authorization>(
    registry: &TypeSchemaRegistry,
    domain: &Eip712Domain,
    message: &A,
) -> Result<TypedDigest> {
    let shape = domain.shape();
    if !A::DOMAIN_SHAPES.contains(&shape) {
        return Err(Error::DomainMismatch {
            primary_type: A::TYPE_NAME.to_string(),
            shape,
        });
    }
    build_struct_digest(registry, domain, &message.to_struct_value())
}

/// Digest of an arbitrary struct value under `domain`.
pub fn build_struct_digest(
    registry: &TypeSchemaRegistry,
    domain: &Eip712Domain,
    message: &StructValue,
) -> Result<TypedDigest> {
    let struct_hash = StructEncoder::new(registry).hash_struct(message)?;
    let digest = TypedDigest::compose(domain.separator(), struct_hash);

    debug!(
        primary_type = message.type_name(),
        domain = domain.name(),
        shape = %domain.shape(),
        digest = %digest,
        "Computed typed-data digest"
    );

    Ok(digest)
}
