//! Typed Layerr authorizations.

pub mod call;
pub mod mint;
pub mod order;

pub use call::*;
pub use mint::*;
pub use order::*;

use crate::signing::DomainShape;
use crate::value::StructValue;

/// A Rust type that mirrors a struct declared in the schema registry.
pub trait TypedStruct {
    /// Name of the declared struct type.
    const TYPE_NAME: &'static str;

    /// Lower into a schema-checked dynamic value.
    fn to_struct_value(&self) -> StructValue;
}

/// A top-level message that can be signed on its own.
pub trait Authorization: TypedStruct {
    /// Domain shapes this message may be signed under.
    const DOMAIN_SHAPES: &'static [DomainShape];
}
