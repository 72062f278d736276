//! Layerr Core Library
//!
//! Typed-data schemas, EIP-712 encoding, signing and verification for
//! Layerr mint and wallet-call authorizations.

pub mod assembler;
pub mod config;
pub mod error;
pub mod schema;
pub mod secret;
pub mod signing;
pub mod typed_data;
pub mod types;
pub mod value;

pub use assembler::{assemble_call, assemble_order, AssembledOrder, OrderLayout};
pub use config::Config;
pub use error::{EncodingError, Error, Result, SchemaError, SigningError};
pub use schema::TypeSchemaRegistry;
pub use secret::SecretString;
pub use signing::{
    build_digest, derive_address, sign, verify, AuthSignature, AuthorizationSigner, DomainShape,
    Eip712Domain, PackedDigest, TypedDigest, VerificationFailure,
};
pub use typed_data::TypedDataDocument;
pub use value::{StructValue, Value};
