//! Mint authorization payloads.

use std::fmt;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use super::{Authorization, TypedStruct};
use crate::error::EncodingError;
use crate::signing::DomainShape;
use crate::value::{StructValue, Value};

/// Token standard of a mint, burn or payment entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TokenType {
    Native = 0,
    Erc20 = 1,
    Erc721 = 2,
    Erc1155 = 3,
}

/// How a burned token is disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BurnType {
    /// Burned through the token contract's own burn function.
    ContractBurn = 0,
    /// Transferred to the dead address.
    SendToDead = 1,
}

impl TryFrom<u8> for TokenType {
    type Error = EncodingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TokenType::Native),
            1 => Ok(TokenType::Erc20),
            2 => Ok(TokenType::Erc721),
            3 => Ok(TokenType::Erc1155),
            other => Err(EncodingError::InvalidValue {
                path: "tokenType".to_string(),
                reason: format!("unknown token type {}", other),
            }),
        }
    }
}

impl From<TokenType> for u8 {
    fn from(value: TokenType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for BurnType {
    type Error = EncodingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BurnType::ContractBurn),
            1 => Ok(BurnType::SendToDead),
            other => Err(EncodingError::InvalidValue {
                path: "burnType".to_string(),
                reason: format!("unknown burn type {}", other),
            }),
        }
    }
}

impl From<BurnType> for u8 {
    fn from(value: BurnType) -> Self {
        value as u8
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Native => write!(f, "native"),
            TokenType::Erc20 => write!(f, "ERC20"),
            TokenType::Erc721 => write!(f, "ERC721"),
            TokenType::Erc1155 => write!(f, "ERC1155"),
        }
    }
}

/// A token the minter will mint to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintToken {
    pub contract_address: Address,
    /// Mint exactly `token_id` rather than the next sequential id.
    pub specific_token_id: bool,
    pub token_type: TokenType,
    pub token_id: U256,
    pub mint_amount: U256,
    pub max_supply: U256,
    /// Zero means no per-wallet limit.
    pub max_mint_per_wallet: U256,
}

impl MintToken {
    /// One copy of a specific ERC1155 id.
    pub fn erc1155(contract_address: Address, token_id: U256) -> Self {
        Self {
            contract_address,
            specific_token_id: true,
            token_type: TokenType::Erc1155,
            token_id,
            mint_amount: U256::from(1u64),
            max_supply: U256::ZERO,
            max_mint_per_wallet: U256::ZERO,
        }
    }

    pub fn with_max_supply(mut self, max_supply: u64) -> Self {
        self.max_supply = U256::from(max_supply);
        self
    }

    pub fn with_max_mint_per_wallet(mut self, max_mint_per_wallet: u64) -> Self {
        self.max_mint_per_wallet = U256::from(max_mint_per_wallet);
        self
    }

    pub fn with_mint_amount(mut self, mint_amount: u64) -> Self {
        self.mint_amount = U256::from(mint_amount);
        self
    }
}

impl TypedStruct for MintToken {
    const TYPE_NAME: &'static str = "MintToken";

    fn to_struct_value(&self) -> StructValue {
        StructValue::new(Self::TYPE_NAME)
            .with("contractAddress", self.contract_address)
            .with("specificTokenId", self.specific_token_id)
            .with("tokenType", u8::from(self.token_type))
            .with("tokenId", self.token_id)
            .with("mintAmount", self.mint_amount)
            .with("maxSupply", self.max_supply)
            .with("maxMintPerWallet", self.max_mint_per_wallet)
    }
}

/// A token the caller must burn as part of the mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnToken {
    pub contract_address: Address,
    pub specific_token_id: bool,
    pub token_type: TokenType,
    pub burn_type: BurnType,
    pub token_id: U256,
    pub burn_amount: U256,
}

impl TypedStruct for BurnToken {
    const TYPE_NAME: &'static str = "BurnToken";

    fn to_struct_value(&self) -> StructValue {
        StructValue::new(Self::TYPE_NAME)
            .with("contractAddress", self.contract_address)
            .with("specificTokenId", self.specific_token_id)
            .with("tokenType", u8::from(self.token_type))
            .with("burnType", u8::from(self.burn_type))
            .with("tokenId", self.token_id)
            .with("burnAmount", self.burn_amount)
    }
}

/// A payment the caller makes as part of the mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentToken {
    /// Zero address for native currency.
    pub contract_address: Address,
    pub token_type: TokenType,
    pub pay_to: Address,
    pub payment_amount: U256,
    /// Share of the payment routed to the referrer, in basis points.
    #[serde(rename = "referralBPS")]
    pub referral_bps: U256,
}

impl PaymentToken {
    /// Native-currency payment to `pay_to`.
    pub fn native(pay_to: Address, payment_amount: U256) -> Self {
        Self {
            contract_address: Address::ZERO,
            token_type: TokenType::Native,
            pay_to,
            payment_amount,
            referral_bps: U256::ZERO,
        }
    }

    pub fn with_referral_bps(mut self, referral_bps: u64) -> Self {
        self.referral_bps = U256::from(referral_bps);
        self
    }
}

impl TypedStruct for PaymentToken {
    const TYPE_NAME: &'static str = "PaymentToken";

    fn to_struct_value(&self) -> StructValue {
        StructValue::new(Self::TYPE_NAME)
            .with("contractAddress", self.contract_address)
            .with("tokenType", u8::from(self.token_type))
            .with("payTo", self.pay_to)
            .with("paymentAmount", self.payment_amount)
            .with("referralBPS", self.referral_bps)
    }
}

/// The message the minter's signer authorizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintParameters {
    pub mint_tokens: Vec<MintToken>,
    pub burn_tokens: Vec<BurnToken>,
    pub payment_tokens: Vec<PaymentToken>,
    pub start_time: U256,
    pub end_time: U256,
    /// Zero means unlimited.
    pub signature_max_uses: U256,
    /// Zero means no allowlist.
    pub merkle_root: B256,
    pub nonce: U256,
    pub oracle_signature_required: bool,
}

impl MintParameters {
    pub fn builder() -> MintParametersBuilder {
        MintParametersBuilder::new()
    }
}

fn struct_list<T: TypedStruct>(items: &[T]) -> Value {
    Value::Array(
        items
            .iter()
            .map(|item| Value::Struct(item.to_struct_value()))
            .collect(),
    )
}

impl TypedStruct for MintParameters {
    const TYPE_NAME: &'static str = "MintParameters";

    fn to_struct_value(&self) -> StructValue {
        StructValue::new(Self::TYPE_NAME)
            .with("mintTokens", struct_list(&self.mint_tokens))
            .with("burnTokens", struct_list(&self.burn_tokens))
            .with("paymentTokens", struct_list(&self.payment_tokens))
            .with("startTime", self.start_time)
            .with("endTime", self.end_time)
            .with("signatureMaxUses", self.signature_max_uses)
            .with("merkleRoot", self.merkle_root)
            .with("nonce", self.nonce)
            .with("oracleSignatureRequired", self.oracle_signature_required)
    }
}

impl Authorization for MintParameters {
    const DOMAIN_SHAPES: &'static [DomainShape] = &[DomainShape::ChainBound];
}

/// Reject `tokenType` and `burnType` values with no matching variant in any
/// mint, burn or payment entry reachable from `value`. The schema only
/// declares them as `uint8`.
pub(crate) fn check_token_enums(value: &StructValue, path: &str) -> Result<(), EncodingError> {
    let enum_at = |field: &str| -> Option<(String, u8)> {
        match value.get(field) {
            Some(Value::Uint(raw)) if raw.bit_len() <= 8 => {
                Some((format!("{}.{}", path, field), raw.to::<u8>()))
            }
            _ => None,
        }
    };
    let with_path = |err: EncodingError, field_path: String| match err {
        EncodingError::InvalidValue { reason, .. } => EncodingError::InvalidValue {
            path: field_path,
            reason,
        },
        other => other,
    };

    let type_name = value.type_name();
    let token_entries = [MintToken::TYPE_NAME, BurnToken::TYPE_NAME, PaymentToken::TYPE_NAME];
    if token_entries.contains(&type_name) {
        if let Some((field_path, raw)) = enum_at("tokenType") {
            TokenType::try_from(raw).map_err(|e| with_path(e, field_path))?;
        }
    }
    if type_name == BurnToken::TYPE_NAME {
        if let Some((field_path, raw)) = enum_at("burnType") {
            BurnType::try_from(raw).map_err(|e| with_path(e, field_path))?;
        }
    }

    for name in value.field_names() {
        let field_path = format!("{}.{}", path, name);
        match value.get(name) {
            Some(Value::Struct(inner)) => check_token_enums(inner, &field_path)?,
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if let Value::Struct(inner) = item {
                        check_token_enums(inner, &format!("{}[{}]", field_path, i))?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Builder for [`MintParameters`] with a fluent API.
#[derive(Debug, Clone, Default)]
pub struct MintParametersBuilder {
    params: MintParameters,
}

impl MintParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mint entry. Entry order is part of the signed message.
    pub fn mint_token(mut self, token: MintToken) -> Self {
        self.params.mint_tokens.push(token);
        self
    }

    pub fn burn_token(mut self, token: BurnToken) -> Self {
        self.params.burn_tokens.push(token);
        self
    }

    pub fn payment_token(mut self, token: PaymentToken) -> Self {
        self.params.payment_tokens.push(token);
        self
    }

    pub fn start_time(mut self, timestamp: u64) -> Self {
        self.params.start_time = U256::from(timestamp);
        self
    }

    pub fn end_time(mut self, timestamp: u64) -> Self {
        self.params.end_time = U256::from(timestamp);
        self
    }

    pub fn signature_max_uses(mut self, max_uses: u64) -> Self {
        self.params.signature_max_uses = U256::from(max_uses);
        self
    }

    pub fn merkle_root(mut self, merkle_root: B256) -> Self {
        self.params.merkle_root = merkle_root;
        self
    }

    pub fn nonce(mut self, nonce: U256) -> Self {
        self.params.nonce = nonce;
        self
    }

    pub fn oracle_signature_required(mut self, required: bool) -> Self {
        self.params.oracle_signature_required = required;
        self
    }

    pub fn build(self) -> MintParameters {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeSchemaRegistry;
    use crate::signing::StructEncoder;
    use alloy_primitives::{address, keccak256};

    fn sample() -> MintParameters {
        MintParameters::builder()
            .mint_token(
                MintToken::erc1155(
                    address!("Dc64a140Aa3E981100a9becA4E685f962f0cF6C9"),
                    U256::from(7u64),
                )
                .with_max_supply(100),
            )
            .payment_token(PaymentToken::native(
                address!("617F2E2fD72FD9D5503197092aC168c91465E7f2"),
                U256::from(100_000u64),
            ))
            .end_time(4_000_000_000)
            .build()
    }

    #[test]
    fn test_lowered_value_conforms_to_schema() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let encoder = StructEncoder::new(&registry);
        assert!(encoder.validate(&sample().to_struct_value()).is_ok());
    }

    #[test]
    fn test_empty_burn_list_hashes_to_empty_word() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let encoder = StructEncoder::new(&registry);
        let encoded = encoder.encode_data(&sample().to_struct_value()).unwrap();

        // burnTokens is the second field, after the type hash and mintTokens
        assert_eq!(&encoded[64..96], keccak256(b"").as_slice());
    }

    #[test]
    fn test_token_type_serde_as_integer() {
        assert_eq!(serde_json::to_string(&TokenType::Erc1155).unwrap(), "3");
        let parsed: TokenType = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, TokenType::Erc20);
        assert!(serde_json::from_str::<TokenType>("9").is_err());
        assert!(serde_json::from_str::<BurnType>("2").is_err());
    }

    #[test]
    fn test_unknown_token_enums_are_rejected() {
        let mut value = sample().to_struct_value();
        assert!(check_token_enums(&value, "MintParameters").is_ok());

        let mut burn = BurnToken {
            contract_address: address!("Dc64a140Aa3E981100a9becA4E685f962f0cF6C9"),
            specific_token_id: true,
            token_type: TokenType::Erc721,
            burn_type: BurnType::SendToDead,
            token_id: U256::from(1u64),
            burn_amount: U256::from(1u64),
        }
        .to_struct_value();
        burn.set("burnType", 2u8);
        value.set("burnTokens", Value::Array(vec![Value::Struct(burn)]));

        let err = check_token_enums(&value, "MintParameters").unwrap_err();
        assert!(matches!(
            err,
            EncodingError::InvalidValue { ref path, .. } if path == "MintParameters.burnTokens[0].burnType"
        ));

        let mut value = sample().to_struct_value();
        let mut payment = sample().payment_tokens[0].to_struct_value();
        payment.set("tokenType", 200u8);
        value.set("paymentTokens", Value::Array(vec![Value::Struct(payment)]));

        let err = check_token_enums(&value, "MintParameters").unwrap_err();
        assert!(matches!(
            err,
            EncodingError::InvalidValue { ref path, .. } if path == "MintParameters.paymentTokens[0].tokenType"
        ));
    }

    #[test]
    fn test_parameters_json_uses_contract_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("mintTokens").is_some());
        assert!(json.get("oracleSignatureRequired").is_some());
        assert!(json["paymentTokens"][0].get("referralBPS").is_some());
    }

    #[test]
    fn test_builder_preserves_mint_order() {
        let contract = address!("Dc64a140Aa3E981100a9becA4E685f962f0cF6C9");
        let params = MintParameters::builder()
            .mint_token(MintToken::erc1155(contract, U256::from(2u64)))
            .mint_token(MintToken::erc1155(contract, U256::from(1u64)))
            .build();
        assert_eq!(params.mint_tokens[0].token_id, U256::from(2u64));
        assert_eq!(params.mint_tokens[1].token_id, U256::from(1u64));
    }
}
