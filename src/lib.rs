//! Layerr Signer
//!
//! Root crate for the cross-component integration tests and benchmarks.
//! For actual functionality, use the individual crates directly:
//!
//! - `layerr-core`: schemas, EIP-712 encoding, signing, verification, order assembly
//! - `layerr-cli`: the `layerr-sign` operator binary

// Re-export for benchmarks
pub use layerr_core as core;
