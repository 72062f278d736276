//! Signed mint orders as submitted to the minter.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use super::mint::MintParameters;
use crate::signing::AuthSignature;

/// Mint parameters with their signatures and the caller-supplied extras
/// the minter needs alongside them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMintOrder {
    pub mint_parameters: MintParameters,
    /// Number of times the parameters are applied in this call.
    pub quantity: U256,
    pub signature: AuthSignature,
    /// Present when `oracle_signature_required` is set.
    pub oracle_signature: Option<AuthSignature>,
    pub merkle_proof: Vec<B256>,
    /// Token ids or indices claimed when the allowlist covers a superset.
    pub supplied_token_ids: Vec<U256>,
    pub referrer: Address,
}

impl SignedMintOrder {
    /// An order for a quantity of one with no proof, oracle or referrer.
    pub fn new(mint_parameters: MintParameters, signature: AuthSignature) -> Self {
        Self {
            mint_parameters,
            quantity: U256::from(1u64),
            signature,
            oracle_signature: None,
            merkle_proof: Vec::new(),
            supplied_token_ids: Vec::new(),
            referrer: Address::ZERO,
        }
    }

    pub fn with_quantity(mut self, quantity: u64) -> Self {
        self.quantity = U256::from(quantity);
        self
    }

    pub fn with_oracle_signature(mut self, signature: AuthSignature) -> Self {
        self.oracle_signature = Some(signature);
        self
    }

    pub fn with_merkle_proof(mut self, proof: Vec<B256>) -> Self {
        self.merkle_proof = proof;
        self
    }

    pub fn with_supplied_token_ids(mut self, token_ids: Vec<U256>) -> Self {
        self.supplied_token_ids = token_ids;
        self
    }

    pub fn with_referrer(mut self, referrer: Address) -> Self {
        self.referrer = referrer;
        self
    }

    /// Whether the order still needs an oracle co-signature before
    /// submission.
    pub fn awaiting_oracle(&self) -> bool {
        self.mint_parameters.oracle_signature_required && self.oracle_signature.is_none()
    }
}
