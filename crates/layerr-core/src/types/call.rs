//! Relayed smart-contract-wallet calls.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use super::{Authorization, TypedStruct};
use crate::signing::{AuthSignature, DomainShape};
use crate::value::StructValue;

/// A call the wallet owner authorizes a relayer to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallAuthorization {
    pub nonce: U256,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas: U256,
}

impl CallAuthorization {
    pub fn new(nonce: U256, to: Address, value: U256, data: Bytes, gas: U256) -> Self {
        Self {
            nonce,
            to,
            value,
            data,
            gas,
        }
    }
}

impl TypedStruct for CallAuthorization {
    const TYPE_NAME: &'static str = "Call";

    fn to_struct_value(&self) -> StructValue {
        StructValue::new(Self::TYPE_NAME)
            .with("nonce", self.nonce)
            .with("to", self.to)
            .with("value", self.value)
            .with("data", self.data.clone())
            .with("gas", self.gas)
    }
}

impl Authorization for CallAuthorization {
    const DOMAIN_SHAPES: &'static [DomainShape] =
        &[DomainShape::ChainBound, DomainShape::ChainLess];
}

/// A call plus the owner's signature, ready for a relayer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCall {
    pub call: CallAuthorization,
    pub signature: AuthSignature,
}
