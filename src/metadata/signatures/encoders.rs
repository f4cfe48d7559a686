//! Signature encoders for .NET metadata blob generation.
//!
//! This module turns the signature model of [`super::types`] into the binary
//! blob formats of ECMA-335 II.23.2. Two encoders cover everything a method
//! under construction serializes:
//!
//! - [`encode_method_signature`] - MethodDef signatures (calling convention,
//!   generic arity, parameter count, return and parameter types)
//! - [`encode_local_var_signature`] - StandAloneSig local variable signatures
//!
//! Both are pure functions over their input; there is no encoder state.

use crate::{
    metadata::{
        signatures::{
            CustomModifier, SignatureLocalVariables, SignatureMethod, SignatureParameter,
            TypeSignature, CALLING_CONVENTION, SIGNATURE_HEADER,
        },
        token::Token,
        typesystem::ELEMENT_TYPE,
    },
    utils::write_compressed_uint,
    Error, Result,
};

/// Encodes a type signature into its ECMA-335 element-type byte form.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidArgument`] for the undefined placeholder
/// type and [`crate::Error::Malformed`] for tokens that cannot be expressed
/// as a TypeDefOrRef coded index.
pub fn encode_type_signature(signature: &TypeSignature, buffer: &mut Vec<u8>) -> Result<()> {
    match signature {
        TypeSignature::Unknown => {
            return Err(Error::InvalidArgument(
                "undefined type cannot appear in an encoded signature".to_string(),
            ))
        }
        TypeSignature::Void => buffer.push(ELEMENT_TYPE::VOID),
        TypeSignature::Boolean => buffer.push(ELEMENT_TYPE::BOOLEAN),
        TypeSignature::Char => buffer.push(ELEMENT_TYPE::CHAR),
        TypeSignature::I1 => buffer.push(ELEMENT_TYPE::I1),
        TypeSignature::U1 => buffer.push(ELEMENT_TYPE::U1),
        TypeSignature::I2 => buffer.push(ELEMENT_TYPE::I2),
        TypeSignature::U2 => buffer.push(ELEMENT_TYPE::U2),
        TypeSignature::I4 => buffer.push(ELEMENT_TYPE::I4),
        TypeSignature::U4 => buffer.push(ELEMENT_TYPE::U4),
        TypeSignature::I8 => buffer.push(ELEMENT_TYPE::I8),
        TypeSignature::U8 => buffer.push(ELEMENT_TYPE::U8),
        TypeSignature::R4 => buffer.push(ELEMENT_TYPE::R4),
        TypeSignature::R8 => buffer.push(ELEMENT_TYPE::R8),
        TypeSignature::String => buffer.push(ELEMENT_TYPE::STRING),
        TypeSignature::I => buffer.push(ELEMENT_TYPE::I),
        TypeSignature::U => buffer.push(ELEMENT_TYPE::U),
        TypeSignature::Object => buffer.push(ELEMENT_TYPE::OBJECT),
        TypeSignature::TypedByRef => buffer.push(ELEMENT_TYPE::TYPEDBYREF),
        TypeSignature::Ptr(pointer) => {
            buffer.push(ELEMENT_TYPE::PTR);
            for modifier in &pointer.modifiers {
                encode_custom_modifier(modifier, buffer)?;
            }
            encode_type_signature(&pointer.base, buffer)?;
        }
        TypeSignature::ByRef(inner) => {
            buffer.push(ELEMENT_TYPE::BYREF);
            encode_type_signature(inner, buffer)?;
        }
        TypeSignature::ValueType(token) => {
            buffer.push(ELEMENT_TYPE::VALUETYPE);
            write_compressed_uint(encode_type_def_or_ref_coded_index(*token)?, buffer);
        }
        TypeSignature::Class(token) => {
            buffer.push(ELEMENT_TYPE::CLASS);
            write_compressed_uint(encode_type_def_or_ref_coded_index(*token)?, buffer);
        }
        TypeSignature::GenericParamType(index) => {
            buffer.push(ELEMENT_TYPE::VAR);
            write_compressed_uint(*index, buffer);
        }
        TypeSignature::GenericParamMethod(index) => {
            buffer.push(ELEMENT_TYPE::MVAR);
            write_compressed_uint(*index, buffer);
        }
        TypeSignature::Array(array) => {
            buffer.push(ELEMENT_TYPE::ARRAY);
            encode_type_signature(&array.base, buffer)?;
            write_compressed_uint(array.rank, buffer);

            let sizes: Vec<u32> = array.dimensions.iter().filter_map(|d| d.size).collect();
            write_compressed_uint(sizes.len() as u32, buffer);
            for size in sizes {
                write_compressed_uint(size, buffer);
            }

            let bounds: Vec<u32> = array
                .dimensions
                .iter()
                .filter_map(|d| d.lower_bound)
                .collect();
            write_compressed_uint(bounds.len() as u32, buffer);
            for bound in bounds {
                write_compressed_uint(bound, buffer);
            }
        }
        TypeSignature::SzArray(array) => {
            buffer.push(ELEMENT_TYPE::SZARRAY);
            for modifier in &array.modifiers {
                encode_custom_modifier(modifier, buffer)?;
            }
            encode_type_signature(&array.base, buffer)?;
        }
        TypeSignature::GenericInst(base, args) => {
            buffer.push(ELEMENT_TYPE::GENERICINST);
            encode_type_signature(base, buffer)?;
            write_compressed_uint(args.len() as u32, buffer);
            for arg in args {
                encode_type_signature(arg, buffer)?;
            }
        }
        TypeSignature::Pinned(inner) => {
            buffer.push(ELEMENT_TYPE::PINNED);
            encode_type_signature(inner, buffer)?;
        }
    }

    Ok(())
}

/// Encodes a custom modifier according to ECMA-335 §II.23.2.7.
///
/// Custom modifiers are encoded as:
/// - Required modifiers: 0x1F (CMOD_REQD) + TypeDefOrRef coded index
/// - Optional modifiers: 0x20 (CMOD_OPT) + TypeDefOrRef coded index
fn encode_custom_modifier(modifier: &CustomModifier, buffer: &mut Vec<u8>) -> Result<()> {
    let modifier_type = if modifier.is_required {
        ELEMENT_TYPE::CMOD_REQD
    } else {
        ELEMENT_TYPE::CMOD_OPT
    };
    buffer.push(modifier_type);

    let coded_index = encode_type_def_or_ref_coded_index(modifier.modifier_type)?;
    write_compressed_uint(coded_index, buffer);
    Ok(())
}

/// Encodes a token as a TypeDefOrRef coded index according to ECMA-335 §II.24.2.6.
///
/// The TypeDefOrRef coded index encodes tokens from three possible tables:
/// - TypeDef (0x02): `(rid << 2) | 0`
/// - TypeRef (0x01): `(rid << 2) | 1`
/// - TypeSpec (0x1B): `(rid << 2) | 2`
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if the token's table is none of the three.
fn encode_type_def_or_ref_coded_index(token: Token) -> Result<u32> {
    let rid = token.row();

    match token.table() {
        0x02 => Ok(rid << 2),       // TypeDef
        0x01 => Ok((rid << 2) | 1), // TypeRef
        0x1B => Ok((rid << 2) | 2), // TypeSpec
        _ => Err(malformed_error!(
            "Invalid token table 0x{:02X} for TypeDefOrRef coded index. \
            Expected TypeDef (0x02), TypeRef (0x01), or TypeSpec (0x1B). Token: 0x{:08X}",
            token.table(),
            token.value()
        )),
    }
}

/// Encodes a signature parameter (custom modifiers, byref marker, type).
///
/// According to ECMA-335 §II.23.2.1, parameters are encoded as:
/// ```text
/// Param ::= CustomMod* [BYREF] Type
/// ```
fn encode_parameter(parameter: &SignatureParameter, buffer: &mut Vec<u8>) -> Result<()> {
    for modifier in &parameter.modifiers {
        encode_custom_modifier(modifier, buffer)?;
    }

    if parameter.by_ref {
        buffer.push(ELEMENT_TYPE::BYREF);
    }

    encode_type_signature(&parameter.base, buffer)?;

    Ok(())
}

/// Encodes a method signature into binary format according to ECMA-335.
///
/// Method signatures encode, in order:
/// - The calling convention byte: the kind nibble (DEFAULT, VARARG, or a
///   native kind), OR'd with HASTHIS when the method carries an instance
///   receiver, EXPLICITTHIS when the receiver is explicit in the parameter
///   list, and GENERIC when the method declares generic parameters
/// - The generic parameter count (compressed, only when GENERIC is set)
/// - The parameter count (compressed)
/// - The return type
/// - Each parameter type in declaration order
///
/// The flag derivation is total over the combinations the builder produces;
/// native calling conventions are carried through when present in the input
/// but never produced by [`crate::metadata::emit::MethodDefBuilder`].
///
/// # Errors
///
/// Returns an error if encoding any parameter or return type fails, or if
/// the parameter count exceeds the u32 range.
pub fn encode_method_signature(signature: &SignatureMethod) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    // Encode the calling convention kind (stored in low 4 bits)
    // Priority: check most specific conventions first to handle mutual exclusivity
    let mut calling_convention = if signature.vararg {
        CALLING_CONVENTION::VARARG
    } else if signature.fastcall {
        CALLING_CONVENTION::FASTCALL
    } else if signature.thiscall {
        CALLING_CONVENTION::THISCALL
    } else if signature.stdcall {
        CALLING_CONVENTION::STDCALL
    } else if signature.cdecl {
        CALLING_CONVENTION::C
    } else {
        CALLING_CONVENTION::DEFAULT
    };

    if signature.has_this {
        calling_convention |= CALLING_CONVENTION::HASTHIS;
    }

    if signature.explicit_this {
        calling_convention |= CALLING_CONVENTION::EXPLICITTHIS;
    }

    if signature.param_count_generic > 0 {
        calling_convention |= CALLING_CONVENTION::GENERIC;
    }

    buffer.push(calling_convention);

    if signature.param_count_generic > 0 {
        write_compressed_uint(signature.param_count_generic, &mut buffer);
    }

    let param_count = u32::try_from(signature.params.len()).map_err(|_| {
        malformed_error!(
            "Too many parameters in method signature: {}",
            signature.params.len()
        )
    })?;
    write_compressed_uint(param_count, &mut buffer);

    encode_parameter(&signature.return_type, &mut buffer)?;
    for param in &signature.params {
        encode_parameter(param, &mut buffer)?;
    }

    Ok(buffer)
}

/// Encodes a local variable signature into binary format according to ECMA-335.
///
/// Local variable signatures encode:
/// - Local variable signature prolog (0x07)
/// - Local variable count (compressed integer)
/// - Per local: PINNED / BYREF markers, then the type
///
/// # Errors
///
/// Returns [`crate::Error`] if the local count exceeds the u32 range or a
/// type fails to encode.
pub fn encode_local_var_signature(signature: &SignatureLocalVariables) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    buffer.push(SIGNATURE_HEADER::LOCAL_SIG);

    write_compressed_uint(
        u32::try_from(signature.locals.len()).map_err(|_| {
            malformed_error!(
                "LocalVar signature has too many locals: {}",
                signature.locals.len()
            )
        })?,
        &mut buffer,
    );

    for local in &signature.locals {
        for modifier in &local.modifiers {
            encode_custom_modifier(modifier, &mut buffer)?;
        }

        if local.is_pinned {
            buffer.push(ELEMENT_TYPE::PINNED);
        }

        if local.is_byref {
            buffer.push(ELEMENT_TYPE::BYREF);
        }

        encode_type_signature(&local.base, &mut buffer)?;
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::signatures::SignatureLocalVariable;

    #[test]
    fn test_encode_method_signature_static_default() {
        // static int Add(int a, int b)
        let signature = SignatureMethod {
            return_type: SignatureParameter::by_value(TypeSignature::I4),
            params: vec![
                SignatureParameter::by_value(TypeSignature::I4),
                SignatureParameter::by_value(TypeSignature::I4),
            ],
            ..Default::default()
        };

        let encoded = encode_method_signature(&signature).unwrap();
        assert_eq!(encoded, vec![0x00, 0x02, 0x08, 0x08, 0x08]);
    }

    #[test]
    fn test_encode_method_signature_instance() {
        // instance void Method(string s)
        let signature = SignatureMethod {
            has_this: true,
            return_type: SignatureParameter::by_value(TypeSignature::Void),
            params: vec![SignatureParameter::by_value(TypeSignature::String)],
            ..Default::default()
        };

        let encoded = encode_method_signature(&signature).unwrap();
        assert_eq!(encoded, vec![0x20, 0x01, 0x01, 0x0E]);
    }

    #[test]
    fn test_encode_method_signature_generic() {
        // instance !!0 Method<T>(!!0 item)
        let signature = SignatureMethod {
            has_this: true,
            param_count_generic: 1,
            return_type: SignatureParameter::by_value(TypeSignature::GenericParamMethod(0)),
            params: vec![SignatureParameter::by_value(
                TypeSignature::GenericParamMethod(0),
            )],
            ..Default::default()
        };

        let encoded = encode_method_signature(&signature).unwrap();
        assert_eq!(encoded, vec![0x30, 0x01, 0x01, 0x1E, 0x00, 0x1E, 0x00]);
    }

    #[test]
    fn test_encode_method_signature_vararg() {
        let signature = SignatureMethod {
            vararg: true,
            return_type: SignatureParameter::by_value(TypeSignature::Void),
            ..Default::default()
        };

        let encoded = encode_method_signature(&signature).unwrap();
        assert_eq!(encoded[0], CALLING_CONVENTION::VARARG);
    }

    #[test]
    fn test_encode_method_signature_byref_param() {
        // void Method(ref int x)
        let signature = SignatureMethod {
            return_type: SignatureParameter::by_value(TypeSignature::Void),
            params: vec![SignatureParameter {
                modifiers: Vec::new(),
                by_ref: true,
                base: TypeSignature::I4,
            }],
            ..Default::default()
        };

        let encoded = encode_method_signature(&signature).unwrap();
        assert_eq!(encoded, vec![0x00, 0x01, 0x01, 0x10, 0x08]);
    }

    #[test]
    fn test_encode_method_signature_rejects_unknown() {
        let signature = SignatureMethod {
            return_type: SignatureParameter::by_value(TypeSignature::Unknown),
            ..Default::default()
        };

        assert!(encode_method_signature(&signature).is_err());
    }

    #[test]
    fn test_encode_local_var_signature() {
        let signature = SignatureLocalVariables {
            locals: vec![
                SignatureLocalVariable {
                    base: TypeSignature::I4,
                    ..Default::default()
                },
                SignatureLocalVariable {
                    is_pinned: true,
                    base: TypeSignature::String,
                    ..Default::default()
                },
            ],
        };

        let encoded = encode_local_var_signature(&signature).unwrap();
        assert_eq!(encoded, vec![0x07, 0x02, 0x08, 0x45, 0x0E]);
    }

    #[test]
    fn test_encode_class_and_valuetype_coded_index() {
        let mut buffer = Vec::new();
        encode_type_signature(
            &TypeSignature::Class(Token::new(0x0100_0010)),
            &mut buffer,
        )
        .unwrap();
        // CLASS + coded index (0x10 << 2) | 1 = 0x41
        assert_eq!(buffer, vec![0x12, 0x41]);

        buffer.clear();
        encode_type_signature(
            &TypeSignature::ValueType(Token::new(0x0200_0003)),
            &mut buffer,
        )
        .unwrap();
        // VALUETYPE + coded index (3 << 2) | 0 = 0x0C
        assert_eq!(buffer, vec![0x11, 0x0C]);
    }

    #[test]
    fn test_encode_coded_index_rejects_foreign_table() {
        // MethodDef tokens have no TypeDefOrRef representation
        let result = encode_type_def_or_ref_coded_index(Token::new(0x0600_0001));
        assert!(result.is_err());
    }

    #[test]
    fn test_encode_custom_modifier() {
        let mut buffer = Vec::new();
        encode_custom_modifier(
            &CustomModifier {
                is_required: true,
                modifier_type: Token::new(0x0100_0001),
            },
            &mut buffer,
        )
        .unwrap();
        assert_eq!(buffer[0], ELEMENT_TYPE::CMOD_REQD);

        buffer.clear();
        encode_custom_modifier(
            &CustomModifier {
                is_required: false,
                modifier_type: Token::new(0x0100_0001),
            },
            &mut buffer,
        )
        .unwrap();
        assert_eq!(buffer[0], ELEMENT_TYPE::CMOD_OPT);
    }

    #[test]
    fn test_encode_szarray_and_generic_inst() {
        use crate::metadata::signatures::SignatureSzArray;

        let mut buffer = Vec::new();
        encode_type_signature(
            &TypeSignature::SzArray(SignatureSzArray {
                modifiers: Vec::new(),
                base: Box::new(TypeSignature::I4),
            }),
            &mut buffer,
        )
        .unwrap();
        assert_eq!(buffer, vec![0x1D, 0x08]);

        buffer.clear();
        encode_type_signature(
            &TypeSignature::GenericInst(
                Box::new(TypeSignature::Class(Token::new(0x0100_0012))),
                vec![TypeSignature::I4],
            ),
            &mut buffer,
        )
        .unwrap();
        // GENERICINST CLASS <coded> 1 I4
        assert_eq!(buffer, vec![0x15, 0x12, 0x49, 0x01, 0x08]);
    }
}
