//! Error types for Layerr authorization signing.

use thiserror::Error;

use crate::signing::domain::DomainShape;
use crate::signing::verifier::VerificationFailure;

/// Inconsistent type declarations. Raised while a schema is being built,
/// never while a value is being signed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("type `{type_name}` references undeclared type `{referenced}`")]
    UndeclaredType {
        type_name: String,
        referenced: String,
    },

    #[error("type `{0}` is declared more than once")]
    DuplicateType(String),

    #[error("type `{type_name}` declares field `{field}` more than once")]
    DuplicateField { type_name: String, field: String },

    #[error("malformed type `{0}`")]
    MalformedType(String),

    #[error("invalid type name `{0}`")]
    InvalidTypeName(String),

    #[error("`EIP712Domain` is reserved and cannot be declared as a message type")]
    ReservedTypeName,

    #[error("unknown type `{0}`")]
    UnknownType(String),
}

/// A value that does not conform to its declared type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("{path}: missing field `{field}`")]
    MissingField { path: String, field: String },

    #[error("{path}: field `{field}` is not declared by the type")]
    UnknownField { path: String, field: String },

    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("{path}: value does not fit in {bits} bits")]
    OutOfRange { path: String, bits: usize },

    #[error("{path}: expected {expected} bytes, found {actual}")]
    InvalidLength {
        path: String,
        expected: usize,
        actual: usize,
    },

    #[error("{path}: negative values are not allowed")]
    NegativeValue { path: String },

    #[error("{path}: {reason}")]
    InvalidValue { path: String, reason: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Failure to produce a signature. No partial signature is ever returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("secret key must be 32 bytes, found {actual}")]
    InvalidKeyLength { actual: usize },

    #[error("secret key is not valid hex")]
    InvalidKeyEncoding,

    #[error("secret key is not a valid secp256k1 scalar")]
    InvalidKeyScalar,

    #[error("signer backend failed: {message}")]
    Backend { message: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Verification failed: {0}")]
    Verification(#[from] VerificationFailure),

    #[error("`{primary_type}` cannot be signed under a {shape} domain")]
    DomainMismatch {
        primary_type: String,
        shape: DomainShape,
    },

    #[error("Unrecognized domain: {message}")]
    UnrecognizedDomain { message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
