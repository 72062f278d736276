//! Configuration for signers and the contracts they sign for.

use crate::secret::SecretString;
use crate::signing::{DomainShape, Eip712Domain, LocalKeySigner, HARDHAT_CHAIN_ID};
use crate::{Error, Result};
use alloy_primitives::Address;
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Environment variable prefix for [`Config::load`], e.g.
/// `LAYERR__NETWORK__CHAIN_ID`.
const ENV_PREFIX: &str = "LAYERR";

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub signer: SignerConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Secret keys. Both are optional so tools that only verify need none.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignerConfig {
    pub private_key: Option<SecretString>,
    pub oracle_private_key: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Verifying contract of the minter domain.
    pub minter_address: Option<Address>,
    /// Verifying contract of the wallet domain.
    pub wallet_address: Option<Address>,
}

fn default_chain_id() -> u64 {
    HARDHAT_CHAIN_ID
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            minter_address: None,
            wallet_address: None,
        }
    }
}

impl SignerConfig {
    /// Signer for the primary mint/call authorization key.
    pub fn primary_signer(&self) -> Result<LocalKeySigner> {
        load_signer(self.private_key.as_ref(), "LAYERR_SIGNER_PRIVATE_KEY")
    }

    /// Signer for the oracle co-signing key.
    pub fn oracle_signer(&self) -> Result<LocalKeySigner> {
        load_signer(self.oracle_private_key.as_ref(), "LAYERR_ORACLE_PRIVATE_KEY")
    }
}

fn load_signer(secret: Option<&SecretString>, name: &str) -> Result<LocalKeySigner> {
    let secret = secret
        .filter(|secret| !secret.is_empty())
        .ok_or_else(|| Error::Config {
            message: format!("{} is not configured", name),
        })?;
    Ok(LocalKeySigner::from_secret(secret)?)
}

impl Config {
    /// Load configuration from environment variables.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            signer: SignerConfig {
                private_key: env::var("LAYERR_SIGNER_PRIVATE_KEY")
                    .ok()
                    .map(SecretString::from),
                oracle_private_key: env::var("LAYERR_ORACLE_PRIVATE_KEY")
                    .ok()
                    .map(SecretString::from),
            },
            network: NetworkConfig {
                chain_id: match env::var("LAYERR_CHAIN_ID") {
                    Ok(s) => s.trim().parse().map_err(|_| Error::Config {
                        message: format!("LAYERR_CHAIN_ID `{}` is not a chain id", s),
                    })?,
                    Err(_) => default_chain_id(),
                },
                minter_address: env_address("LAYERR_MINTER_ADDRESS")?,
                wallet_address: env_address("LAYERR_WALLET_ADDRESS")?,
            },
        })
    }

    /// Load configuration from an optional TOML, JSON or YAML file, with
    /// `LAYERR__`-prefixed environment variables taking precedence.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Chain-bound minter domain on the configured chain.
    pub fn minter_domain(&self) -> Result<Eip712Domain> {
        let minter = self.network.minter_address.ok_or_else(|| Error::Config {
            message: "LAYERR_MINTER_ADDRESS is not configured".to_string(),
        })?;
        Ok(Eip712Domain::layerr_minter(self.network.chain_id, minter))
    }

    /// Wallet domain of the requested shape.
    pub fn wallet_domain(&self, shape: DomainShape) -> Result<Eip712Domain> {
        let wallet = self.network.wallet_address.ok_or_else(|| Error::Config {
            message: "LAYERR_WALLET_ADDRESS is not configured".to_string(),
        })?;
        Ok(match shape {
            DomainShape::ChainBound => Eip712Domain::layerr_wallet(self.network.chain_id, wallet),
            DomainShape::ChainLess => Eip712Domain::layerr_wallet_chainless(wallet),
        })
    }

    /// Load configuration for testing (with defaults).
    #[cfg(test)]
    pub fn test_config() -> Self {
        use alloy_primitives::address;

        Self {
            signer: SignerConfig {
                private_key: Some(SecretString::from(
                    "0x6969696969696969696969696969696969696969696969696969696969696969",
                )),
                oracle_private_key: Some(SecretString::from(
                    "0x4204204204204204204204204204204204204204204204204204204204204204",
                )),
            },
            network: NetworkConfig {
                chain_id: HARDHAT_CHAIN_ID,
                minter_address: Some(address!("5FbDB2315678afecb367f032d93F642f64180aa3")),
                wallet_address: Some(address!("B7f8BC63BbcaD18155201308C8f3540b07f84F5e")),
            },
        }
    }
}

fn env_address(name: &str) -> Result<Option<Address>> {
    match env::var(name) {
        Ok(s) if !s.trim().is_empty() => {
            s.trim().parse().map(Some).map_err(|_| Error::Config {
                message: format!("{} `{}` is not an address", name, s),
            })
        }
        _ => Ok(None),
    }
}
