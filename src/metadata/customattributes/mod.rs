//! Custom attribute representation and blob decoding.
//!
//! A method descriptor stores most custom attributes verbatim: the
//! constructor token plus the raw argument blob, exactly as supplied. A fixed
//! set of pseudo attributes is instead decoded and folded into the
//! descriptor's flags (see
//! [`crate::metadata::emit::MethodDefBuilder::apply_custom_attribute`]); the
//! decoder in this module exists for those cases.
//!
//! # Key Types
//!
//! - [`CustomAttributeCtor`] - constructor reference (token, declaring type,
//!   parameter types)
//! - [`CustomAttributeWrapper`] - verbatim storage form
//! - [`CustomAttributeValue`] - decoded fixed and named arguments
//! - [`parse_custom_attribute_data`] - the blob decoder

mod parser;
mod types;

pub use parser::*;
pub use types::*;
