//! Packed-encoding attestations.
//!
//! These digests hash the tight concatenation of raw field bytes with no
//! type-hash and no domain separator. They are only ever produced as
//! [`PackedDigest`], never as a typed-data digest.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{keccak256, Address, Bytes, U256};
use alloy_sol_types::SolValue;
use tracing::debug;

use super::digest::PackedDigest;

/// `keccak256(abi.encodePacked(values...))`
pub fn packed_digest(values: &[DynSolValue]) -> PackedDigest {
    let encoded = DynSolValue::Tuple(values.to_vec()).abi_encode_packed();
    PackedDigest(keccak256(&encoded))
}

/// Digest the oracle co-signs: `keccak256(abi.encodePacked(caller, signature))`.
///
/// `signature` is the primary signer's 65-byte signature over the mint
/// parameters, taken as raw bytes.
pub fn oracle_attestation_digest(caller: Address, signature: &[u8]) -> PackedDigest {
    let encoded = (caller, Bytes::copy_from_slice(signature)).abi_encode_packed();
    let digest = PackedDigest(keccak256(&encoded));
    debug!(caller = %caller, digest = %digest, "Computed oracle attestation digest");
    digest
}

/// Digest for a renderer's content-metadata attestation:
/// `keccak256(abi.encodePacked(contract, uri, expiration, value))`.
pub fn content_metadata_digest(
    contract: Address,
    uri: &str,
    expiration: U256,
    value: U256,
) -> PackedDigest {
    let encoded = (contract, uri.to_string(), expiration, value).abi_encode_packed();
    let digest = PackedDigest(keccak256(&encoded));
    debug!(contract = %contract, uri, digest = %digest, "Computed content metadata digest");
    digest
}
