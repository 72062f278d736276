//! Signer recovery and verification.
//!
//! Verification failures are ordinary results: relayers pre-check
//! signatures they expect to be bad, so nothing here panics or logs at
//! error level.

use alloy_primitives::Address;
use thiserror::Error;

use super::digest::{PackedDigest, SigningDigest, TypedDigest};
use super::signature::AuthSignature;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    #[error("malformed signature: {reason}")]
    MalformedSignature { reason: String },

    #[error("could not recover a signer from the signature")]
    RecoveryFailed,

    #[error("signature was produced by {recovered}, expected {expected}")]
    SignerMismatch { expected: Address, recovered: Address },
}

/// Recover the address that signed a typed-data digest.
pub fn recover(digest: &TypedDigest, signature: &[u8]) -> Result<Address, VerificationFailure> {
    recover_prehash(digest, signature)
}

/// Recover the address that signed a packed attestation digest.
pub fn recover_packed(
    digest: &PackedDigest,
    signature: &[u8],
) -> Result<Address, VerificationFailure> {
    recover_prehash(digest, signature)
}

/// Check that `signature` over a typed-data digest was produced by
/// `expected`. Returns the recovered (checksummed on display) address.
pub fn verify(
    digest: &TypedDigest,
    signature: &[u8],
    expected: Address,
) -> Result<Address, VerificationFailure> {
    check_signer(recover(digest, signature)?, expected)
}

/// Check that `signature` over a packed digest was produced by `expected`.
pub fn verify_packed(
    digest: &PackedDigest,
    signature: &[u8],
    expected: Address,
) -> Result<Address, VerificationFailure> {
    check_signer(recover_packed(digest, signature)?, expected)
}

fn recover_prehash(
    digest: &impl SigningDigest,
    signature: &[u8],
) -> Result<Address, VerificationFailure> {
    AuthSignature::from_slice(signature)?.recover(digest.as_b256())
}

// Addresses compare as 20 raw bytes, so hex case never matters here.
fn check_signer(recovered: Address, expected: Address) -> Result<Address, VerificationFailure> {
    if recovered == expected {
        Ok(recovered)
    } else {
        Err(VerificationFailure::SignerMismatch {
            expected,
            recovered,
        })
    }
}
