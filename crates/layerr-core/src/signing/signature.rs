//! 65-byte `r || s || v` signatures.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{uint, Address, Signature, B256, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::verifier::VerificationFailure;

pub const SIGNATURE_LENGTH: usize = 65;

/// secp256k1 group order `n`.
const SECP256K1_ORDER: U256 =
    uint!(0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141_U256);

/// `n / 2`; canonical signatures have `s <= n / 2`.
const SECP256K1_HALF_ORDER: U256 =
    uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

/// An ECDSA signature over a digest.
///
/// Always serialized with `v` in `{27, 28}`. Parsing accepts `v` in
/// `{0, 1, 27, 28}` and rejects zero, out-of-range and high-`s` scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSignature(Signature);

impl AuthSignature {
    pub(crate) fn from_signature(signature: Signature) -> Self {
        Self(signature)
    }

    /// Strictly parse 65 signature bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, VerificationFailure> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(malformed(format!(
                "expected {} bytes, found {}",
                SIGNATURE_LENGTH,
                bytes.len()
            )));
        }

        let y_parity = match bytes[64] {
            0 | 27 => false,
            1 | 28 => true,
            v => return Err(malformed(format!("invalid recovery indicator {}", v))),
        };

        let r = U256::from_be_slice(&bytes[..32]);
        let s = U256::from_be_slice(&bytes[32..64]);
        if r.is_zero() || r >= SECP256K1_ORDER {
            return Err(malformed("r is out of range".to_string()));
        }
        if s.is_zero() || s >= SECP256K1_ORDER {
            return Err(malformed("s is out of range".to_string()));
        }
        if s > SECP256K1_HALF_ORDER {
            return Err(malformed("s is not in the lower half of the curve order".to_string()));
        }

        Ok(Self(Signature::new(r, s, y_parity)))
    }

    pub fn r(&self) -> U256 {
        self.0.r()
    }

    pub fn s(&self) -> U256 {
        self.0.s()
    }

    /// Recovery indicator as emitted on the wire: 27 or 28.
    pub fn v(&self) -> u8 {
        27 + self.0.v() as u8
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..32].copy_from_slice(&self.r().to_be_bytes::<32>());
        bytes[32..64].copy_from_slice(&self.s().to_be_bytes::<32>());
        bytes[64] = self.v();
        bytes
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Recover the signing address from a 32-byte prehash.
    pub(crate) fn recover(&self, prehash: &B256) -> Result<Address, VerificationFailure> {
        self.0
            .recover_address_from_prehash(prehash)
            .map_err(|_| VerificationFailure::RecoveryFailed)
    }
}

fn malformed(reason: String) -> VerificationFailure {
    VerificationFailure::MalformedSignature { reason }
}

impl fmt::Display for AuthSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for AuthSignature {
    type Err = VerificationFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|_| malformed("signature is not valid hex".to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for AuthSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AuthSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
