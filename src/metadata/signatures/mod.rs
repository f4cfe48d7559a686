//! Method and local variable signature encoding for .NET metadata.
//!
//! This module owns the binary signature formats a dynamically built method
//! serializes into, according to the ECMA-335 standard. Signatures encode
//! type information, parameter lists, generic arity, and calling conventions
//! in a compact binary format.
//!
//! # Binary Format
//!
//! - Calling conventions encoded as a single byte (kind nibble plus the
//!   HASTHIS / EXPLICITTHIS / GENERIC flag bits)
//! - Parameter and local counts using compressed integers
//! - Type references using element type bytes and TypeDefOrRef coded indices
//! - Generic parameters encoded with positional indices
//!
//! # Examples
//!
//! ```rust
//! use dotforge::metadata::signatures::{
//!     encode_method_signature, parse_method_signature, SignatureMethod,
//!     SignatureParameter, TypeSignature,
//! };
//!
//! // static int Add(int, int)
//! let signature = SignatureMethod {
//!     return_type: SignatureParameter::by_value(TypeSignature::I4),
//!     params: vec![
//!         SignatureParameter::by_value(TypeSignature::I4),
//!         SignatureParameter::by_value(TypeSignature::I4),
//!     ],
//!     ..Default::default()
//! };
//!
//! let blob = encode_method_signature(&signature)?;
//! let decoded = parse_method_signature(&blob)?;
//! assert_eq!(decoded.params.len(), 2);
//! # Ok::<(), dotforge::Error>(())
//! ```
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 23.2 - Blobs and Signatures

mod encoders;
mod parser;
mod types;

pub use encoders::*;
pub use parser::*;
pub use types::*;

use crate::Result;

#[allow(non_snake_case, dead_code, missing_docs)]
/// Flag bits of the leading calling-convention byte of a method signature
pub mod CALLING_CONVENTION {
    /// Default (managed static) calling convention
    pub const DEFAULT: u8 = 0x00;
    /// Unmanaged cdecl calling convention
    pub const C: u8 = 0x01;
    /// Unmanaged stdcall calling convention
    pub const STDCALL: u8 = 0x02;
    /// Unmanaged thiscall calling convention
    pub const THISCALL: u8 = 0x03;
    /// Unmanaged fastcall calling convention
    pub const FASTCALL: u8 = 0x04;
    /// Variable argument list calling convention
    pub const VARARG: u8 = 0x05;
    /// Mask selecting the calling convention kind nibble
    pub const MASK: u8 = 0x0F;
    /// The method declares generic parameters
    pub const GENERIC: u8 = 0x10;
    /// The method carries an instance receiver
    pub const HASTHIS: u8 = 0x20;
    /// The instance receiver is explicit in the parameter list
    pub const EXPLICITTHIS: u8 = 0x40;
}

#[allow(non_snake_case, dead_code, missing_docs)]
/// Leading bytes identifying non-method signature kinds
pub mod SIGNATURE_HEADER {
    /// Field signature prolog
    pub const FIELD: u8 = 0x06;
    /// Local variable signature prolog
    pub const LOCAL_SIG: u8 = 0x07;
    /// Property signature prolog
    pub const PROPERTY: u8 = 0x08;
}

/// Parse a `SignatureMethod` from a byte slice
///
/// ## Arguments
/// * 'data' - The input slice to parse
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_method_signature(data: &[u8]) -> Result<SignatureMethod> {
    let mut parser = SignatureParser::new(data);
    parser.parse_method_signature()
}

/// Parse a `SignatureLocalVariables` from a byte slice
///
/// ## Arguments
/// * 'data' - The input slice to parse
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_local_var_signature(data: &[u8]) -> Result<SignatureLocalVariables> {
    let mut parser = SignatureParser::new(data);
    parser.parse_local_var_signature()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_signature_round_trip() {
        let signature = SignatureMethod {
            has_this: true,
            param_count_generic: 2,
            return_type: SignatureParameter::by_value(TypeSignature::GenericParamMethod(1)),
            params: vec![
                SignatureParameter::by_value(TypeSignature::GenericParamMethod(0)),
                SignatureParameter::by_value(TypeSignature::String),
            ],
            ..Default::default()
        };

        let blob = encode_method_signature(&signature).unwrap();
        let decoded = parse_method_signature(&blob).unwrap();
        assert_eq!(decoded, signature);
    }

    #[test]
    fn test_calling_convention_byte_decodes_back() {
        // Every flag combination the builder can produce survives the trip
        for (has_this, explicit_this, vararg, generic) in [
            (false, false, false, 0u32),
            (true, false, false, 0),
            (true, true, false, 0),
            (false, false, true, 0),
            (true, false, false, 3),
            (false, false, true, 1),
        ] {
            let signature = SignatureMethod {
                has_this,
                explicit_this,
                vararg,
                param_count_generic: generic,
                return_type: SignatureParameter::by_value(TypeSignature::Void),
                ..Default::default()
            };

            let blob = encode_method_signature(&signature).unwrap();
            let decoded = parse_method_signature(&blob).unwrap();
            assert_eq!(decoded.has_this, has_this);
            assert_eq!(decoded.explicit_this, explicit_this);
            assert_eq!(decoded.vararg, vararg);
            assert_eq!(decoded.param_count_generic, generic);
        }
    }

    #[test]
    fn test_local_var_signature_round_trip() {
        let signature = SignatureLocalVariables {
            locals: vec![
                SignatureLocalVariable {
                    base: TypeSignature::I4,
                    ..Default::default()
                },
                SignatureLocalVariable {
                    is_pinned: true,
                    base: TypeSignature::Object,
                    ..Default::default()
                },
            ],
        };

        let blob = encode_local_var_signature(&signature).unwrap();
        let decoded = parse_local_var_signature(&blob).unwrap();
        assert_eq!(decoded, signature);
    }
}
