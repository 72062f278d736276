//! Subcommand bodies. Encoding and signing stay in `layerr-core`.

use std::path::Path;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use layerr_core::config::Config;
use layerr_core::error::Error;
use layerr_core::signing::{AuthSignature, AuthorizationSigner, VerificationFailure};
use layerr_core::typed_data::TypedDataDocument;
use layerr_core::TypedDigest;
use tracing::{debug, info};

pub(crate) fn read_document(path: &Path) -> Result<TypedDataDocument> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    TypedDataDocument::from_json(&json)
        .with_context(|| format!("{} is not a typed-data document", path.display()))
}

pub(crate) fn digest(path: &Path) -> Result<TypedDigest> {
    let document = read_document(path)?;
    let digest = document
        .digest()
        .with_context(|| format!("Invalid typed data in {}", path.display()))?;
    debug!(primary_type = %document.primary_type, digest = %digest, "Computed digest");
    Ok(digest)
}

pub(crate) async fn sign(config: &Config, path: &Path) -> Result<AuthSignature> {
    let digest = digest(path)?;
    let signer = AuthorizationSigner::new(config.signer.primary_signer()?)?;
    let signature = signer.sign_typed_digest(&digest).await?;
    info!(signer = %signer.address(), digest = %digest, "Signed typed data");
    Ok(signature)
}

/// Outer error: the document could not be processed. Inner error: the
/// signature does not verify.
pub(crate) fn verify(
    path: &Path,
    signature: &str,
    expected: Address,
) -> Result<std::result::Result<Address, VerificationFailure>> {
    let document = read_document(path)?;

    let signature = match signature.parse::<AuthSignature>() {
        Ok(signature) => signature,
        Err(failure) => return Ok(Err(failure)),
    };

    match document.verify(&signature.to_bytes(), expected) {
        Ok(recovered) => Ok(Ok(recovered)),
        Err(Error::Verification(failure)) => Ok(Err(failure)),
        Err(e) => Err(e).with_context(|| format!("Invalid typed data in {}", path.display())),
    }
}

pub(crate) fn address(config: &Config, oracle: bool) -> Result<Address> {
    let signer = if oracle {
        config.signer.oracle_signer()?
    } else {
        config.signer.primary_signer()?
    };
    Ok(signer.address())
}

pub(crate) async fn oracle_attest(
    config: &Config,
    caller: Address,
    primary: &str,
) -> Result<AuthSignature> {
    let primary: AuthSignature = primary
        .parse()
        .context("Primary signature is malformed")?;
    let oracle = AuthorizationSigner::new(config.signer.oracle_signer()?)?;
    Ok(oracle.sign_oracle_attestation(caller, &primary).await?)
}
