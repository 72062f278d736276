//! Typed-data interchange documents.
//!
//! A document is `{types, primaryType, domain, message}`, the JSON shape
//! wallets and relayers exchange when requesting or recording a signature.
//! Received documents are fully re-validated before a digest is computed:
//! the schema is rebuilt, the domain must be one of the two recognized
//! shapes, and the message must conform to the primary type.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{TypeField, TypeSchemaRegistry, DOMAIN_TYPE_NAME};
use crate::signing::digest::{build_struct_digest, TypedDigest};
use crate::signing::domain::{DomainShape, Eip712Domain};
use crate::signing::verifier;
use crate::signing::StructEncoder;
use crate::types::mint::check_token_enums;
use crate::types::{Authorization, CallAuthorization, MintParameters, TypedStruct};
use crate::value::{uint_from_json, StructValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataDocument {
    pub types: BTreeMap<String, Vec<TypeField>>,
    pub primary_type: String,
    pub domain: serde_json::Value,
    pub message: serde_json::Value,
}

/// A document whose schema, domain and message have all been checked.
#[derive(Debug, Clone)]
pub struct ValidatedTypedData {
    pub registry: TypeSchemaRegistry,
    pub domain: Eip712Domain,
    pub message: StructValue,
}

impl ValidatedTypedData {
    pub fn digest(&self) -> Result<TypedDigest> {
        build_struct_digest(&self.registry, &self.domain, &self.message)
    }
}

impl TypedDataDocument {
    /// Build a document for an arbitrary struct value. The value is checked
    /// against `registry` first; `types` carries the primary type's full
    /// closure plus the `EIP712Domain` declaration for the domain's shape.
    pub fn new(
        registry: &TypeSchemaRegistry,
        domain: &Eip712Domain,
        message: &StructValue,
    ) -> Result<Self> {
        StructEncoder::new(registry).validate(message)?;

        let mut types = BTreeMap::new();
        types.insert(DOMAIN_TYPE_NAME.to_string(), domain_type_fields(domain.shape()));
        for definition in registry.closure(message.type_name())? {
            types.insert(
                definition.name.clone(),
                definition.fields.iter().map(TypeField::from).collect(),
            );
        }

        Ok(Self {
            types,
            primary_type: message.type_name().to_string(),
            domain: domain.to_json(),
            message: message.to_json(),
        })
    }

    /// Build a document for a typed authorization, rejecting a domain shape
    /// the authorization may not be signed under.
    pub fn from_authorization<A: Authorization>(
        registry: &TypeSchemaRegistry,
        domain: &Eip712Domain,
        message: &A,
    ) -> Result<Self> {
        if !A::DOMAIN_SHAPES.contains(&domain.shape()) {
            return Err(Error::DomainMismatch {
                primary_type: A::TYPE_NAME.to_string(),
                shape: domain.shape(),
            });
        }
        Self::new(registry, domain, &message.to_struct_value())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rebuild the schema, domain and message from the document.
    pub fn validate(&self) -> Result<ValidatedTypedData> {
        let mut builder = TypeSchemaRegistry::builder();
        for (name, fields) in &self.types {
            if name != DOMAIN_TYPE_NAME {
                builder = builder.with_type_fields(name.clone(), fields);
            }
        }
        let registry = builder.build()?;

        let domain = self.parse_domain()?;
        if let Some(shapes) = layerr_domain_shapes(&self.primary_type) {
            if !shapes.contains(&domain.shape()) {
                return Err(Error::DomainMismatch {
                    primary_type: self.primary_type.clone(),
                    shape: domain.shape(),
                });
            }
        }

        let message = StructValue::from_json(&registry, &self.primary_type, &self.message)?;
        StructEncoder::new(&registry).validate(&message)?;
        check_token_enums(&message, &self.primary_type)?;

        Ok(ValidatedTypedData {
            registry,
            domain,
            message,
        })
    }

    /// Validate the document and compute its signing digest.
    pub fn digest(&self) -> Result<TypedDigest> {
        self.validate()?.digest()
    }

    /// Check that `signature` over this document was produced by `expected`.
    pub fn verify(&self, signature: &[u8], expected: Address) -> Result<Address> {
        let digest = self.digest()?;
        Ok(verifier::verify(&digest, signature, expected)?)
    }

    fn parse_domain(&self) -> Result<Eip712Domain> {
        let object = self
            .domain
            .as_object()
            .ok_or_else(|| unrecognized("domain must be a JSON object"))?;

        let declared = self
            .types
            .get(DOMAIN_TYPE_NAME)
            .ok_or_else(|| unrecognized("`types` does not declare EIP712Domain"))?;
        let shape = shape_of_declaration(declared)?;

        let present: Vec<&str> = object.keys().map(String::as_str).collect();
        for key in &present {
            if !shape.fields().iter().any(|(name, _)| name == key) {
                return Err(unrecognized(&format!(
                    "`{}` is not a field of a {} domain",
                    key, shape
                )));
            }
        }

        let string_field = |key: &str| -> Result<String> {
            object
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| unrecognized(&format!("domain `{}` must be a string", key)))
        };

        let name = string_field("name")?;
        let version = string_field("version")?;
        let verifying_contract = string_field("verifyingContract")?
            .parse::<Address>()
            .map_err(|_| unrecognized("domain `verifyingContract` is not an address"))?;

        match shape {
            DomainShape::ChainBound => {
                let chain_id = object
                    .get("chainId")
                    .ok_or_else(|| unrecognized("chain-bound domain is missing `chainId`"))?;
                let chain_id = uint_from_json(chain_id, "domain.chainId")?;
                if chain_id.bit_len() > 64 {
                    return Err(unrecognized("domain `chainId` does not fit in 64 bits"));
                }
                Ok(Eip712Domain::chain_bound(
                    name,
                    version,
                    chain_id.to::<u64>(),
                    verifying_contract,
                ))
            }
            DomainShape::ChainLess => {
                Ok(Eip712Domain::chain_less(name, version, verifying_contract))
            }
        }
    }
}

fn domain_type_fields(shape: DomainShape) -> Vec<TypeField> {
    shape
        .fields()
        .iter()
        .map(|(name, ty)| TypeField {
            name: name.to_string(),
            type_name: ty.to_string(),
        })
        .collect()
}

fn shape_of_declaration(declared: &[TypeField]) -> Result<DomainShape> {
    [DomainShape::ChainBound, DomainShape::ChainLess]
        .into_iter()
        .find(|shape| declared == domain_type_fields(*shape).as_slice())
        .ok_or_else(|| {
            let fields: Vec<String> = declared
                .iter()
                .map(|field| format!("{} {}", field.type_name, field.name))
                .collect();
            unrecognized(&format!("EIP712Domain({})", fields.join(",")))
        })
}

/// Domain shapes a Layerr authorization type may be signed under.
fn layerr_domain_shapes(primary_type: &str) -> Option<&'static [DomainShape]> {
    if primary_type == MintParameters::TYPE_NAME {
        Some(MintParameters::DOMAIN_SHAPES)
    } else if primary_type == CallAuthorization::TYPE_NAME {
        Some(CallAuthorization::DOMAIN_SHAPES)
    } else {
        None
    }
}

fn unrecognized(message: &str) -> Error {
    Error::UnrecognizedDomain {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::domain::HARDHAT_CHAIN_ID;
    use crate::signing::LocalKeySigner;
    use crate::types::{CallAuthorization, MintParameters, MintToken, PaymentToken};
    use alloy_dyn_abi::TypedData;
    use alloy_primitives::{address, b256, Bytes, U256};
    use serde_json::json;

    const WALLET: Address = address!("B7f8BC63BbcaD18155201308C8f3540b07f84F5e");

    fn call() -> CallAuthorization {
        CallAuthorization::new(
            U256::ZERO,
            address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
            U256::from(1_000_000_000_000_000_000u64),
            Bytes::new(),
            U256::from(100_000u64),
        )
    }

    fn mint() -> MintParameters {
        MintParameters::builder()
            .mint_token(
                MintToken::erc1155(
                    address!("Dc64a140Aa3E981100a9becA4E685f962f0cF6C9"),
                    U256::ZERO,
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

    fn minter_domain() -> Eip712Domain {
        Eip712Domain::layerr_minter(
            HARDHAT_CHAIN_ID,
            address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
        )
    }

    #[test]
    fn test_call_documents_have_known_digests() {
        let registry = TypeSchemaRegistry::layerr().unwrap();

        let bound = TypedDataDocument::from_authorization(
            &registry,
            &Eip712Domain::layerr_wallet(HARDHAT_CHAIN_ID, WALLET),
            &call(),
        )
        .unwrap();
        assert_eq!(
            bound.digest().unwrap().into_inner(),
            b256!("6cbffe6d51bde099927645de33471161f66339df2d62e25a088f22b52afb1f11")
        );

        let chainless = TypedDataDocument::from_authorization(
            &registry,
            &Eip712Domain::layerr_wallet_chainless(WALLET),
            &call(),
        )
        .unwrap();
        assert_eq!(
            chainless.digest().unwrap().into_inner(),
            b256!("ab7f2b1aab48fbb45bca239813a0a575bc33f5b51762f5b882e8b118f3dad889")
        );
        assert_eq!(chainless.types[DOMAIN_TYPE_NAME].len(), 3);
    }

    #[test]
    fn test_types_hold_the_transitive_closure() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let document =
            TypedDataDocument::from_authorization(&registry, &minter_domain(), &mint()).unwrap();

        let names: Vec<&str> = document.types.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["BurnToken", "EIP712Domain", "MintParameters", "MintToken", "PaymentToken"]
        );
        assert!(!document.types.contains_key("Call"));
    }

    #[test]
    fn test_json_round_trip_keeps_digest() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let document =
            TypedDataDocument::from_authorization(&registry, &minter_domain(), &mint()).unwrap();

        let json = document.to_json().unwrap();
        assert!(json.contains("\"primaryType\": \"MintParameters\""));

        let parsed = TypedDataDocument::from_json(&json).unwrap();
        assert_eq!(parsed.digest().unwrap(), document.digest().unwrap());
        assert_eq!(
            parsed.digest().unwrap().into_inner(),
            b256!("ad820a7279a3dae8cd54a7ee78691da8adb55c46b453b9ece44c79e01655d465")
        );
    }

    #[test]
    fn test_matches_independent_eip712_implementation() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let documents = [
            TypedDataDocument::from_authorization(&registry, &minter_domain(), &mint()).unwrap(),
            TypedDataDocument::from_authorization(
                &registry,
                &Eip712Domain::layerr_wallet(HARDHAT_CHAIN_ID, WALLET),
                &call(),
            )
            .unwrap(),
        ];

        for document in documents {
            let typed: TypedData =
                serde_json::from_str(&document.to_json().unwrap()).unwrap();
            assert_eq!(
                typed.eip712_signing_hash().unwrap(),
                document.digest().unwrap().into_inner()
            );
        }
    }

    #[test]
    fn test_mint_parameters_reject_chainless_domain() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let err = TypedDataDocument::from_authorization(
            &registry,
            &Eip712Domain::layerr_wallet_chainless(WALLET),
            &mint(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DomainMismatch { .. }));
    }

    #[test]
    fn test_received_mint_document_needs_chain_bound_domain() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let mut document =
            TypedDataDocument::from_authorization(&registry, &minter_domain(), &mint()).unwrap();
        document
            .types
            .insert(DOMAIN_TYPE_NAME.to_string(), domain_type_fields(DomainShape::ChainLess));
        document.domain.as_object_mut().unwrap().remove("chainId");

        match document.digest().unwrap_err() {
            Error::DomainMismatch {
                primary_type,
                shape,
            } => {
                assert_eq!(primary_type, "MintParameters");
                assert_eq!(shape, DomainShape::ChainLess);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_domain_without_declaration_is_rejected() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let mut document = TypedDataDocument::from_authorization(
            &registry,
            &Eip712Domain::layerr_wallet_chainless(WALLET),
            &call(),
        )
        .unwrap();
        assert!(document.digest().is_ok());

        document.types.remove(DOMAIN_TYPE_NAME);
        assert!(matches!(
            document.digest().unwrap_err(),
            Error::UnrecognizedDomain { .. }
        ));
    }

    #[test]
    fn test_unrecognized_domain_shapes() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let base = TypedDataDocument::from_authorization(
            &registry,
            &Eip712Domain::layerr_wallet(HARDHAT_CHAIN_ID, WALLET),
            &call(),
        )
        .unwrap();

        // chainId without a verifying contract
        let mut document = base.clone();
        document.domain = json!({"name": "LayerrWallet", "version": "1.0", "chainId": 31337});
        assert!(matches!(
            document.digest().unwrap_err(),
            Error::UnrecognizedDomain { .. }
        ));

        // declared as chain-less but carrying a chainId
        let mut document = base.clone();
        document
            .types
            .insert(DOMAIN_TYPE_NAME.to_string(), domain_type_fields(DomainShape::ChainLess));
        assert!(matches!(
            document.digest().unwrap_err(),
            Error::UnrecognizedDomain { .. }
        ));

        // salt is not a recognized domain field
        let mut document = base;
        document.types.get_mut(DOMAIN_TYPE_NAME).unwrap().push(TypeField {
            name: "salt".to_string(),
            type_name: "bytes32".to_string(),
        });
        assert!(matches!(
            document.digest().unwrap_err(),
            Error::UnrecognizedDomain { .. }
        ));
    }

    #[test]
    fn test_nonconforming_message_is_rejected() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let mut document =
            TypedDataDocument::from_authorization(&registry, &minter_domain(), &mint()).unwrap();
        document.message["mintTokens"][0]["tokenType"] = json!(256);

        match document.digest().unwrap_err() {
            Error::Encoding(crate::error::EncodingError::OutOfRange { path, bits }) => {
                assert_eq!(path, "MintParameters.mintTokens[0].tokenType");
                assert_eq!(bits, 8);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_token_type_in_document_is_rejected() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let base =
            TypedDataDocument::from_authorization(&registry, &minter_domain(), &mint()).unwrap();

        let mut document = base.clone();
        document.message["mintTokens"][0]["tokenType"] = json!(9);
        match document.digest().unwrap_err() {
            Error::Encoding(crate::error::EncodingError::InvalidValue { path, .. }) => {
                assert_eq!(path, "MintParameters.mintTokens[0].tokenType");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let mut document = base;
        document.message["paymentTokens"][0]["tokenType"] = json!("200");
        match document.digest().unwrap_err() {
            Error::Encoding(crate::error::EncodingError::InvalidValue { path, .. }) => {
                assert_eq!(path, "MintParameters.paymentTokens[0].tokenType");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_undeclared_type_is_schema_error() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let mut document =
            TypedDataDocument::from_authorization(&registry, &minter_domain(), &mint()).unwrap();
        document.types.remove("PaymentToken");
        assert!(matches!(document.digest().unwrap_err(), Error::Schema(_)));
    }

    #[test]
    fn test_verify_document_signature() {
        let registry = TypeSchemaRegistry::layerr().unwrap();
        let document =
            TypedDataDocument::from_authorization(&registry, &minter_domain(), &mint()).unwrap();
        let signer = LocalKeySigner::from_hex(
            "0x6969696969696969696969696969696969696969696969696969696969696969",
        )
        .unwrap();

        let signature = signer.sign_typed(&document.digest().unwrap()).unwrap();
        assert_eq!(
            signature.to_hex(),
            "0x9640d834bb628759621017fe230cd1d9de4b561b85c6360a383bb4270fd6e46966afba7519c10190efe5da9a1c62ee4bd1bd39151d64f533fe30b525f504f7681b"
        );
        assert_eq!(
            document.verify(&signature.to_bytes(), signer.address()).unwrap(),
            signer.address()
        );
        assert!(matches!(
            document.verify(&signature.to_bytes(), WALLET).unwrap_err(),
            Error::Verification(_)
        ));
    }
}
