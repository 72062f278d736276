//! EIP-712 domain separators for Layerr contracts.
//!
//! Two domain shapes exist and they are distinct types, not one type with a
//! null field: omitting `chainId` changes the domain type-hash itself.
//! Mint authorizations are always chain-bound; wallet calls may also be
//! signed chain-less so one signature can be relayed on every chain.

use std::fmt;

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;

/// Chain ID for a local Hardhat/Anvil node.
pub const HARDHAT_CHAIN_ID: u64 = 31337;

/// Chain ID for the Sepolia testnet.
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;

/// Domain name of the minter contract.
pub const MINTER_DOMAIN_NAME: &str = "LayerrMinter";

/// Domain name of the smart-contract wallet.
pub const WALLET_DOMAIN_NAME: &str = "LayerrWallet";

/// Domain version shared by the minter and the wallet.
pub const DOMAIN_VERSION: &str = "1.0";

const CHAIN_BOUND_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

const CHAIN_LESS_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,address verifyingContract)";

/// Which optional domain fields are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainShape {
    /// `{name, version, chainId, verifyingContract}`
    ChainBound,
    /// `{name, version, verifyingContract}`
    ChainLess,
}

impl DomainShape {
    /// `(field name, field type)` pairs of the `EIP712Domain` type.
    pub fn fields(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            DomainShape::ChainBound => &[
                ("name", "string"),
                ("version", "string"),
                ("chainId", "uint256"),
                ("verifyingContract", "address"),
            ],
            DomainShape::ChainLess => &[
                ("name", "string"),
                ("version", "string"),
                ("verifyingContract", "address"),
            ],
        }
    }

    pub fn type_string(&self) -> &'static str {
        match self {
            DomainShape::ChainBound => CHAIN_BOUND_DOMAIN_TYPE,
            DomainShape::ChainLess => CHAIN_LESS_DOMAIN_TYPE,
        }
    }

    pub fn type_hash(&self) -> B256 {
        keccak256(self.type_string())
    }
}

impl fmt::Display for DomainShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainShape::ChainBound => write!(f, "chain-bound"),
            DomainShape::ChainLess => write!(f, "chain-less"),
        }
    }
}

/// EIP-712 signing domain. The shape is fixed by the constructor used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip712Domain {
    name: String,
    version: String,
    chain_id: Option<U256>,
    verifying_contract: Address,
}

impl Eip712Domain {
    /// Domain bound to one chain and one contract.
    pub fn chain_bound(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id: Some(U256::from(chain_id)),
            verifying_contract,
        }
    }

    /// Domain without a chain id, valid on every chain the contract lives on.
    pub fn chain_less(
        name: impl Into<String>,
        version: impl Into<String>,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id: None,
            verifying_contract,
        }
    }

    /// Domain for the minter on `chain_id`.
    pub fn layerr_minter(chain_id: u64, minter: Address) -> Self {
        Self::chain_bound(MINTER_DOMAIN_NAME, DOMAIN_VERSION, chain_id, minter)
    }

    /// Chain-bound domain for a wallet on `chain_id`.
    pub fn layerr_wallet(chain_id: u64, wallet: Address) -> Self {
        Self::chain_bound(WALLET_DOMAIN_NAME, DOMAIN_VERSION, chain_id, wallet)
    }

    /// Chain-less domain for a wallet deployed at the same address everywhere.
    pub fn layerr_wallet_chainless(wallet: Address) -> Self {
        Self::chain_less(WALLET_DOMAIN_NAME, DOMAIN_VERSION, wallet)
    }

    pub fn shape(&self) -> DomainShape {
        match self.chain_id {
            Some(_) => DomainShape::ChainBound,
            None => DomainShape::ChainLess,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn chain_id(&self) -> Option<U256> {
        self.chain_id
    }

    pub fn verifying_contract(&self) -> Address {
        self.verifying_contract
    }

    /// Compute the EIP-712 domain separator hash.
    pub fn separator(&self) -> B256 {
        let type_hash = self.shape().type_hash();
        let name_hash = keccak256(self.name.as_bytes());
        let version_hash = keccak256(self.version.as_bytes());

        // EIP-712 encodeData: the address is left-padded to a full word
        let contract_padded = B256::left_padding_from(self.verifying_contract.as_slice());

        let encoded = match self.chain_id {
            Some(chain_id) => {
                (type_hash, name_hash, version_hash, chain_id, contract_padded).abi_encode_packed()
            }
            None => (type_hash, name_hash, version_hash, contract_padded).abi_encode_packed(),
        };

        keccak256(&encoded)
    }

    /// Domain fields as they appear in a typed-data document.
    pub fn to_json(&self) -> serde_json::Value {
        let mut fields = serde_json::Map::new();
        fields.insert("name".to_string(), self.name.clone().into());
        fields.insert("version".to_string(), self.version.clone().into());
        if let Some(chain_id) = self.chain_id {
            let chain_id = if chain_id.bit_len() <= 64 {
                serde_json::Value::from(chain_id.to::<u64>())
            } else {
                serde_json::Value::from(chain_id.to_string())
            };
            fields.insert("chainId".to_string(), chain_id);
        }
        fields.insert(
            "verifyingContract".to_string(),
            self.verifying_contract.to_checksum(None).into(),
        );
        serde_json::Value::Object(fields)
    }
}
