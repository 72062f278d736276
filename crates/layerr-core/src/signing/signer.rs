//! Authorization signing.
//!
//! [`DigestSigner`] is the seam between encoding and key custody: it only
//! ever sees a finished 32-byte digest. [`LocalKeySigner`] holds a raw key
//! in-process; remote or custody-backed signers implement the same trait.

use alloy_primitives::{Address, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use rayon::prelude::*;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::digest::{build_digest, PackedDigest, SigningDigest, TypedDigest};
use super::domain::Eip712Domain;
use super::packed::{content_metadata_digest, oracle_attestation_digest};
use super::signature::AuthSignature;
use super::verifier::VerificationFailure;
use crate::error::{Result, SigningError};
use crate::schema::TypeSchemaRegistry;
use crate::secret::SecretString;
use crate::types::{
    Authorization, CallAuthorization, MintParameters, SignedCall, SignedMintOrder,
};

/// Length of a secp256k1 secret key in bytes.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Produces signatures over prehashed digests.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DigestSigner: Send + Sync {
    /// Address that signatures from this signer recover to.
    fn address(&self) -> Address;

    /// Sign a 32-byte digest as-is, without hashing it again.
    async fn sign_prehash(
        &self,
        prehash: &B256,
    ) -> std::result::Result<AuthSignature, SigningError>;
}

/// A secp256k1 key held in process memory.
///
/// Signing is deterministic (RFC 6979) and always yields a low-`s`
/// signature.
#[derive(Clone)]
pub struct LocalKeySigner {
    signer: PrivateKeySigner,
}

impl LocalKeySigner {
    /// Load a key from 64 hex characters, optionally prefixed with `0x`.
    pub fn from_hex(secret: &str) -> std::result::Result<Self, SigningError> {
        let trimmed = secret.trim();
        let key_hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let bytes = Zeroizing::new(
            hex::decode(key_hex).map_err(|_| SigningError::InvalidKeyEncoding)?,
        );
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(SigningError::InvalidKeyLength {
                actual: bytes.len(),
            });
        }

        let signer =
            PrivateKeySigner::from_slice(&bytes).map_err(|_| SigningError::InvalidKeyScalar)?;
        Ok(Self { signer })
    }

    pub fn from_secret(secret: &SecretString) -> std::result::Result<Self, SigningError> {
        Self::from_hex(secret.expose_secret())
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign a typed-data digest.
    pub fn sign_typed(
        &self,
        digest: &TypedDigest,
    ) -> std::result::Result<AuthSignature, SigningError> {
        self.sign_sync(digest.as_b256())
    }

    /// Sign a packed attestation digest.
    pub fn sign_packed(
        &self,
        digest: &PackedDigest,
    ) -> std::result::Result<AuthSignature, SigningError> {
        self.sign_sync(digest.as_b256())
    }

    fn sign_sync(&self, prehash: &B256) -> std::result::Result<AuthSignature, SigningError> {
        let signature = self
            .signer
            .sign_hash_sync(prehash)
            .map_err(|e| SigningError::Backend {
                message: e.to_string(),
            })?;
        Ok(AuthSignature::from_signature(signature))
    }
}

#[async_trait::async_trait]
impl DigestSigner for LocalKeySigner {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_prehash(
        &self,
        prehash: &B256,
    ) -> std::result::Result<AuthSignature, SigningError> {
        self.sign_sync(prehash)
    }
}

impl std::fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose the private key in debug output
        f.debug_struct("LocalKeySigner")
            .field("address", &self.address().to_checksum(None))
            .finish()
    }
}

/// Sign a typed-data digest with a hex-encoded secret key.
pub fn sign(
    digest: &TypedDigest,
    secret_hex: &str,
) -> std::result::Result<AuthSignature, SigningError> {
    LocalKeySigner::from_hex(secret_hex)?.sign_typed(digest)
}

/// Sign a packed attestation digest with a hex-encoded secret key.
pub fn sign_packed(
    digest: &PackedDigest,
    secret_hex: &str,
) -> std::result::Result<AuthSignature, SigningError> {
    LocalKeySigner::from_hex(secret_hex)?.sign_packed(digest)
}

/// Address controlled by a hex-encoded secret key.
pub fn derive_address(secret_hex: &str) -> std::result::Result<Address, SigningError> {
    Ok(LocalKeySigner::from_hex(secret_hex)?.address())
}

/// Signs Layerr authorizations and attestations with one key.
///
/// Every signature is recovered and checked against the signer's address
/// before it is returned.
pub struct AuthorizationSigner<S = LocalKeySigner> {
    signer: S,
    registry: TypeSchemaRegistry,
}

impl<S: DigestSigner> AuthorizationSigner<S> {
    /// Signer over the Layerr protocol schema.
    pub fn new(signer: S) -> Result<Self> {
        Ok(Self::with_registry(signer, TypeSchemaRegistry::layerr()?))
    }

    pub fn with_registry(signer: S, registry: TypeSchemaRegistry) -> Self {
        Self { signer, registry }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn registry(&self) -> &TypeSchemaRegistry {
        &self.registry
    }

    /// Build the digest of `message` under `domain` and sign it.
    pub async fn sign_authorization<A: Authorization>(
        &self,
        domain: &Eip712Domain,
        message: &A,
    ) -> Result<AuthSignature> {
        let digest = build_digest(&self.registry, domain, message)?;
        self.sign_typed_digest(&digest).await
    }

    pub async fn sign_typed_digest(&self, digest: &TypedDigest) -> Result<AuthSignature> {
        self.sign_checked(digest).await
    }

    pub async fn sign_packed_digest(&self, digest: &PackedDigest) -> Result<AuthSignature> {
        self.sign_checked(digest).await
    }

    /// Sign mint parameters under a chain-bound minter domain.
    pub async fn sign_mint_order(
        &self,
        domain: &Eip712Domain,
        params: &MintParameters,
    ) -> Result<SignedMintOrder> {
        let signature = self.sign_authorization(domain, params).await?;
        Ok(SignedMintOrder::new(params.clone(), signature))
    }

    /// Sign a relayed wallet call under either domain shape.
    pub async fn sign_call(
        &self,
        domain: &Eip712Domain,
        call: &CallAuthorization,
    ) -> Result<SignedCall> {
        let signature = self.sign_authorization(domain, call).await?;
        Ok(SignedCall {
            call: call.clone(),
            signature,
        })
    }

    /// Oracle co-signature over `(caller, primary signature)`.
    pub async fn sign_oracle_attestation(
        &self,
        caller: Address,
        primary: &AuthSignature,
    ) -> Result<AuthSignature> {
        let digest = oracle_attestation_digest(caller, &primary.to_bytes());
        self.sign_checked(&digest).await
    }

    /// Attach this signer's oracle co-signature to `order` for `caller`.
    pub async fn co_sign(
        &self,
        caller: Address,
        order: SignedMintOrder,
    ) -> Result<SignedMintOrder> {
        let oracle_signature = self.sign_oracle_attestation(caller, &order.signature).await?;
        Ok(order.with_oracle_signature(oracle_signature))
    }

    /// Renderer attestation over a contract's base URI.
    pub async fn sign_content_metadata(
        &self,
        contract: Address,
        uri: &str,
        expiration: U256,
        value: U256,
    ) -> Result<AuthSignature> {
        let digest = content_metadata_digest(contract, uri, expiration, value);
        self.sign_checked(&digest).await
    }

    async fn sign_checked<D: SigningDigest + Sync>(&self, digest: &D) -> Result<AuthSignature> {
        let prehash = digest.as_b256();
        let signature = self.signer.sign_prehash(prehash).await?;
        check_recovered(self.signer.address(), prehash, &signature)?;

        debug!(signer = %self.signer.address(), digest = %prehash, "Signed digest");
        Ok(signature)
    }
}

/// Fails unless `signature` over `prehash` recovers to `expected`.
fn check_recovered(expected: Address, prehash: &B256, signature: &AuthSignature) -> Result<()> {
    let recovered = signature.recover(prehash)?;
    if recovered != expected {
        warn!(
            expected = %expected,
            recovered = %recovered,
            digest = %prehash,
            "Signer produced a signature for a different address"
        );
        return Err(VerificationFailure::SignerMismatch {
            expected,
            recovered,
        }
        .into());
    }
    Ok(())
}

impl AuthorizationSigner<LocalKeySigner> {
    /// Signer over the Layerr schema from a hex-encoded key.
    pub fn from_hex(secret: &str) -> Result<Self> {
        Self::new(LocalKeySigner::from_hex(secret)?)
    }

    /// Sign independent mint parameters in parallel. Every signature is
    /// recovered and checked like a single signature. Results keep the input
    /// order; the first failure aborts the batch.
    pub fn sign_mint_batch(
        &self,
        domain: &Eip712Domain,
        batch: &[MintParameters],
    ) -> Result<Vec<SignedMintOrder>> {
        let orders = batch
            .par_iter()
            .map(|params| -> Result<SignedMintOrder> {
                let digest = build_digest(&self.registry, domain, params)?;
                let signature = self.signer.sign_typed(&digest)?;
                check_recovered(self.signer.address(), digest.as_b256(), &signature)?;
                Ok(SignedMintOrder::new(params.clone(), signature))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            signer = %self.address(),
            count = orders.len(),
            "Signed mint parameter batch"
        );
        Ok(orders)
    }
}

impl<S: DigestSigner> std::fmt::Debug for AuthorizationSigner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationSigner")
            .field("address", &self.address().to_checksum(None))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::signing::domain::{HARDHAT_CHAIN_ID, SEPOLIA_CHAIN_ID};
    use crate::signing::verifier::{verify, verify_packed};
    use crate::types::{MintToken, PaymentToken};
    use alloy_primitives::{address, b256, Bytes};

    // Well-known test keys (DO NOT USE IN PRODUCTION)
    const SIGNER_KEY: &str = "0x6969696969696969696969696969696969696969696969696969696969696969";
    const ORACLE_KEY: &str = "0x4204204204204204204204204204204204204204204204204204204204204204";
    const SIGNER_ADDRESS: Address = address!("bE93f9BacBcFFC8ee6663f2647917ed7A20a57BB");
    const ORACLE_ADDRESS: Address = address!("e03c66583975b44958c53687ea1100adce60f7e7");

    fn sepolia_mint_parameters() -> MintParameters {
        let contract = address!("9d38bf03f77e832Dc39C5F76cf1fabEeF2dc537f");
        let mut builder = MintParameters::builder();
        for id in 0..3u64 {
            builder = builder.mint_token(
                MintToken::erc1155(contract, U256::from(id)).with_max_supply(100),
            );
        }
        builder
            .payment_token(
                PaymentToken::native(
                    address!("3e6a203ab73C4B35Be1F65461D88Fb21DE26446e"),
                    U256::from(5_400_000_000_000_000u64),
                )
                .with_referral_bps(100),
            )
            .payment_token(PaymentToken::native(
                address!("1602B3707A9213A313bc21337Ae93c947b4929B4"),
                U256::from(540_000_000_000_000u64),
            ))
            .end_time(4_000_000_000)
            .build()
    }

    fn sepolia_domain() -> Eip712Domain {
        Eip712Domain::layerr_minter(
            SEPOLIA_CHAIN_ID,
            address!("000000000000D58696577347F78259bD376F1BEC"),
        )
    }

    fn call() -> CallAuthorization {
        CallAuthorization::new(
            U256::ZERO,
            address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
            U256::from(1_000_000_000_000_000_000u64),
            Bytes::new(),
            U256::from(100_000u64),
        )
    }

    #[test]
    fn test_derive_address() {
        assert_eq!(derive_address(SIGNER_KEY).unwrap(), SIGNER_ADDRESS);
        assert_eq!(derive_address(ORACLE_KEY).unwrap(), ORACLE_ADDRESS);
        assert_eq!(
            derive_address("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
                .unwrap(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
    }

    #[test]
    fn test_invalid_keys() {
        assert_eq!(
            LocalKeySigner::from_hex("0x1234").unwrap_err(),
            SigningError::InvalidKeyLength { actual: 2 }
        );
        assert_eq!(
            LocalKeySigner::from_hex(&format!("{}69", SIGNER_KEY)).unwrap_err(),
            SigningError::InvalidKeyLength { actual: 33 }
        );
        assert_eq!(
            LocalKeySigner::from_hex("not-a-valid-key").unwrap_err(),
            SigningError::InvalidKeyEncoding
        );
        assert_eq!(
            LocalKeySigner::from_hex(&"00".repeat(32)).unwrap_err(),
            SigningError::InvalidKeyScalar
        );
        assert_eq!(
            LocalKeySigner::from_hex(&"ff".repeat(32)).unwrap_err(),
            SigningError::InvalidKeyScalar
        );
    }

    #[test]
    fn test_recorded_sepolia_signature() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let digest =
            build_digest(&registry, &sepolia_domain(), &sepolia_mint_parameters()).unwrap();
        assert_eq!(
            digest.into_inner(),
            b256!("faeaa6c319394f205e8678123eaa1700d8b9fdaba27b3751432becd9d16dbfa8")
        );

        let signature = sign(&digest, SIGNER_KEY).unwrap();
        assert_eq!(
            signature.to_hex(),
            "0xd7dd8ec71d3da6d5a56763af5a2c6739a4d6dade7e2be33a288e4c4f961a7ed641a322fdd406de8c7b3519b1e74e45f757fa09ee21f3d16667a05874e550c58b1c"
        );
    }

    #[test]
    fn test_signatures_are_deterministic() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let domain = Eip712Domain::layerr_minter(
            HARDHAT_CHAIN_ID,
            address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
        );
        let digest = build_digest(&registry, &domain, &sepolia_mint_parameters()).unwrap();

        let first = sign(&digest, SIGNER_KEY).unwrap();
        let second = sign(&digest, SIGNER_KEY).unwrap();
        assert_eq!(first.to_bytes(), second.to_bytes());
        assert_eq!(
            verify(&digest, &first.to_bytes(), SIGNER_ADDRESS).unwrap(),
            SIGNER_ADDRESS
        );
    }

    #[tokio::test]
    async fn test_sign_call_under_both_shapes() {
        let signer = AuthorizationSigner::from_hex(SIGNER_KEY).unwrap();
        let wallet = address!("B7f8BC63BbcaD18155201308C8f3540b07f84F5e");

        let bound = signer
            .sign_call(&Eip712Domain::layerr_wallet(HARDHAT_CHAIN_ID, wallet), &call())
            .await
            .unwrap();
        let chainless = signer
            .sign_call(&Eip712Domain::layerr_wallet_chainless(wallet), &call())
            .await
            .unwrap();

        assert_eq!(
            bound.signature.to_hex(),
            "0x0b28010adb39270697f431fdf9832b63eb840d9d84c6ff324a7cce6b836e672566ec0eb44f60eea2cc665fea3482f1c6b7bddf9e04d3ac2ac6adfeb35b5db3b91c"
        );
        assert_eq!(
            chainless.signature.to_hex(),
            "0x3c8951e6eb85756a1a87cdf78ff164df9441581a2a9a7640c2b88e4ecb23e11a31b10452036f9a2e60a9dd6a34284c2f1b8a0ca5aac3fbbad3e371fd7205165a1c"
        );
    }

    #[tokio::test]
    async fn test_mint_parameters_reject_chainless_domain() {
        let signer = AuthorizationSigner::from_hex(SIGNER_KEY).unwrap();
        let domain = Eip712Domain::chain_less(
            "LayerrMinter",
            "1.0",
            address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
        );

        let err = signer
            .sign_mint_order(&domain, &sepolia_mint_parameters())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DomainMismatch { .. }));
    }

    #[tokio::test]
    async fn test_oracle_co_sign() {
        let primary = AuthorizationSigner::from_hex(SIGNER_KEY).unwrap();
        let oracle = AuthorizationSigner::from_hex(ORACLE_KEY).unwrap();
        let caller = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

        let params = MintParameters {
            oracle_signature_required: true,
            ..sepolia_mint_parameters()
        };
        let order = primary.sign_mint_order(&sepolia_domain(), &params).await.unwrap();
        assert!(order.awaiting_oracle());

        let order = oracle.co_sign(caller, order).await.unwrap();
        assert!(!order.awaiting_oracle());

        let digest = oracle_attestation_digest(caller, &order.signature.to_bytes());
        let oracle_signature = order.oracle_signature.unwrap();
        let recovered =
            verify_packed(&digest, &oracle_signature.to_bytes(), ORACLE_ADDRESS).unwrap();
        assert_eq!(recovered, ORACLE_ADDRESS);
    }

    #[tokio::test]
    async fn test_content_metadata_signature_recovers_to_renderer() {
        let renderer = AuthorizationSigner::from_hex(ORACLE_KEY).unwrap();
        let contract = address!("Dc64a140Aa3E981100a9becA4E685f962f0cF6C9");
        let expires = U256::from(1_234_567_890u64);
        let max_supply = U256::from(1_000_000_000u64);

        let signature = renderer
            .sign_content_metadata(contract, "ipfs://abcdefg/", expires, max_supply)
            .await
            .unwrap();

        let digest = content_metadata_digest(contract, "ipfs://abcdefg/", expires, max_supply);
        assert_eq!(
            verify_packed(&digest, &signature.to_bytes(), ORACLE_ADDRESS),
            Ok(ORACLE_ADDRESS)
        );

        let other_uri = content_metadata_digest(contract, "ipfs://hijklmn/", expires, max_supply);
        assert!(verify_packed(&other_uri, &signature.to_bytes(), ORACLE_ADDRESS).is_err());
    }

    #[test]
    fn test_batch_matches_individual_signatures() {
        let signer = AuthorizationSigner::from_hex(SIGNER_KEY).unwrap();
        let domain = sepolia_domain();
        let batch: Vec<MintParameters> = (0..8u64)
            .map(|nonce| MintParameters {
                nonce: U256::from(nonce),
                ..sepolia_mint_parameters()
            })
            .collect();

        let orders = signer.sign_mint_batch(&domain, &batch).unwrap();
        assert_eq!(orders.len(), batch.len());

        for (params, order) in batch.iter().zip(&orders) {
            let digest = build_digest(signer.registry(), &domain, params).unwrap();
            assert_eq!(order.mint_parameters.nonce, params.nonce);
            assert_eq!(order.signature, sign(&digest, SIGNER_KEY).unwrap());
        }
    }

    #[test]
    fn test_signature_for_other_key_fails_recovery_check() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let digest = build_digest(&registry, &sepolia_domain(), &sepolia_mint_parameters()).unwrap();
        let signature = LocalKeySigner::from_hex(ORACLE_KEY)
            .unwrap()
            .sign_typed(&digest)
            .unwrap();

        assert!(check_recovered(ORACLE_ADDRESS, digest.as_b256(), &signature).is_ok());
        let err = check_recovered(SIGNER_ADDRESS, digest.as_b256(), &signature).unwrap_err();
        assert!(matches!(
            err,
            Error::Verification(VerificationFailure::SignerMismatch { recovered, .. })
                if recovered == ORACLE_ADDRESS
        ));
    }

    #[tokio::test]
    async fn test_backend_failure_is_signing_error() {
        let mut backend = MockDigestSigner::new();
        backend.expect_address().return_const(SIGNER_ADDRESS);
        backend.expect_sign_prehash().returning(|_| {
            Err(SigningError::Backend {
                message: "custody service unavailable".to_string(),
            })
        });

        let signer = AuthorizationSigner::new(backend).unwrap();
        let err = signer
            .sign_call(&Eip712Domain::layerr_wallet_chainless(Address::ZERO), &call())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Signing(SigningError::Backend { .. })));
    }

    #[tokio::test]
    async fn test_backend_for_wrong_key_is_rejected() {
        let oracle_key = LocalKeySigner::from_hex(ORACLE_KEY).unwrap();

        let mut backend = MockDigestSigner::new();
        backend.expect_address().return_const(SIGNER_ADDRESS);
        backend
            .expect_sign_prehash()
            .returning(move |prehash| oracle_key.sign_sync(prehash));

        let signer = AuthorizationSigner::new(backend).unwrap();
        let err = signer
            .sign_call(&Eip712Domain::layerr_wallet_chainless(Address::ZERO), &call())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Verification(VerificationFailure::SignerMismatch { .. })
        ));
    }

    #[test]
    fn test_debug_does_not_expose_key() {
        let signer = LocalKeySigner::from_hex(SIGNER_KEY).unwrap();
        let debug_str = format!("{:?}", signer);

        assert!(debug_str.contains("LocalKeySigner"));
        assert!(debug_str.contains("0xbE93f9BacBcFFC8ee6663f2647917ed7A20a57BB"));
        assert!(!debug_str.contains("696969"));

        let signer = AuthorizationSigner::from_hex(SIGNER_KEY).unwrap();
        assert!(!format!("{:?}", signer).contains("696969"));
    }
}
