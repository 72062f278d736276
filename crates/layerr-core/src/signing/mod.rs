//! EIP-712 digests, signatures and recovery for Layerr authorizations.
//!
//! # Architecture
//!
//! ```text
//! MintParameters / CallAuthorization
//!       │ to_struct_value
//!       ▼
//! StructEncoder ── hashStruct ──┐
//!                               ├──► TypedDigest ──► DigestSigner ──► AuthSignature
//! Eip712Domain ── separator ────┘                                        │
//!                                                                        ▼
//!                                              verifier::verify ◄── submitted bytes
//! ```
//!
//! Oracle and renderer attestations skip the typed-data envelope and hash a
//! tight packing of their arguments into a [`PackedDigest`]. The two digest
//! types are distinct so one can never be verified as the other.
//!
//! # Example
//!
//! ```ignore
//! use layerr_core::signing::{AuthorizationSigner, Eip712Domain};
//! use layerr_core::types::{MintParameters, MintToken, PaymentToken};
//!
//! let signer = AuthorizationSigner::from_hex("0x...")?;
//! let domain = Eip712Domain::layerr_minter(31337, minter);
//!
//! let params = MintParameters::builder()
//!     .mint_token(MintToken::erc1155(token, U256::ZERO))
//!     .payment_token(PaymentToken::native(pay_to, U256::from(100_000)))
//!     .end_time(u64::from(u32::MAX))
//!     .build();
//!
//! let order = signer.sign_mint_order(&domain, &params).await?;
//! ```

pub mod digest;
pub mod domain;
pub mod encoder;
pub mod packed;
pub mod signature;
pub mod signer;
pub mod verifier;

pub use digest::{
    build_digest, build_struct_digest, PackedDigest, SigningDigest, TypedDigest,
    TYPED_DATA_PREFIX,
};

pub use domain::{
    DomainShape, Eip712Domain, DOMAIN_VERSION, HARDHAT_CHAIN_ID, MINTER_DOMAIN_NAME,
    SEPOLIA_CHAIN_ID, WALLET_DOMAIN_NAME,
};

pub use encoder::StructEncoder;

pub use packed::{content_metadata_digest, oracle_attestation_digest, packed_digest};

pub use signature::{AuthSignature, SIGNATURE_LENGTH};

pub use signer::{
    derive_address, sign, sign_packed, AuthorizationSigner, DigestSigner, LocalKeySigner,
    SECRET_KEY_LENGTH,
};

pub use verifier::{recover, recover_packed, verify, verify_packed, VerificationFailure};
