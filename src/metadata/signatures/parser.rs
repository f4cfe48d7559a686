use crate::{
    metadata::{
        signatures::{
            CustomModifier, SignatureArray, SignatureLocalVariable, SignatureLocalVariables,
            SignatureMethod, SignatureParameter, SignaturePointer, SignatureSzArray,
            TypeSignature, CALLING_CONVENTION, SIGNATURE_HEADER,
        },
        token::Token,
        typesystem::{ArrayDimensions, ELEMENT_TYPE},
    },
    utils::Parser,
    Result,
};

/// Decoder for the binary signature formats produced by the encoders.
///
/// The module writer uses this to re-read blobs it has already placed in the
/// heap; tests use it to verify that every encoded calling-convention byte
/// decodes back to the flag combination that produced it.
pub struct SignatureParser<'a> {
    parser: Parser<'a>,
}

impl<'a> SignatureParser<'a> {
    /// Creates a new parser over a signature blob.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        SignatureParser {
            parser: Parser::new(data),
        }
    }

    /// Parse a single type from the signature blob.
    ///
    /// # Errors
    /// Returns an error if the element type byte is unknown or the blob is truncated.
    pub fn parse_type(&mut self) -> Result<TypeSignature> {
        match self.parser.read_le::<u8>()? {
            ELEMENT_TYPE::VOID => Ok(TypeSignature::Void),
            ELEMENT_TYPE::BOOLEAN => Ok(TypeSignature::Boolean),
            ELEMENT_TYPE::CHAR => Ok(TypeSignature::Char),
            ELEMENT_TYPE::I1 => Ok(TypeSignature::I1),
            ELEMENT_TYPE::U1 => Ok(TypeSignature::U1),
            ELEMENT_TYPE::I2 => Ok(TypeSignature::I2),
            ELEMENT_TYPE::U2 => Ok(TypeSignature::U2),
            ELEMENT_TYPE::I4 => Ok(TypeSignature::I4),
            ELEMENT_TYPE::U4 => Ok(TypeSignature::U4),
            ELEMENT_TYPE::I8 => Ok(TypeSignature::I8),
            ELEMENT_TYPE::U8 => Ok(TypeSignature::U8),
            ELEMENT_TYPE::R4 => Ok(TypeSignature::R4),
            ELEMENT_TYPE::R8 => Ok(TypeSignature::R8),
            ELEMENT_TYPE::STRING => Ok(TypeSignature::String),
            ELEMENT_TYPE::I => Ok(TypeSignature::I),
            ELEMENT_TYPE::U => Ok(TypeSignature::U),
            ELEMENT_TYPE::OBJECT => Ok(TypeSignature::Object),
            ELEMENT_TYPE::TYPEDBYREF => Ok(TypeSignature::TypedByRef),
            ELEMENT_TYPE::PTR => {
                let modifiers = self.parse_custom_modifiers()?;
                Ok(TypeSignature::Ptr(SignaturePointer {
                    modifiers,
                    base: Box::new(self.parse_type()?),
                }))
            }
            ELEMENT_TYPE::BYREF => Ok(TypeSignature::ByRef(Box::new(self.parse_type()?))),
            ELEMENT_TYPE::VALUETYPE => {
                Ok(TypeSignature::ValueType(self.parse_coded_token()?))
            }
            ELEMENT_TYPE::CLASS => Ok(TypeSignature::Class(self.parse_coded_token()?)),
            ELEMENT_TYPE::VAR => {
                Ok(TypeSignature::GenericParamType(
                    self.parser.read_compressed_uint()?,
                ))
            }
            ELEMENT_TYPE::MVAR => Ok(TypeSignature::GenericParamMethod(
                self.parser.read_compressed_uint()?,
            )),
            ELEMENT_TYPE::ARRAY => {
                let base = self.parse_type()?;
                let rank = self.parser.read_compressed_uint()?;

                let num_sizes = self.parser.read_compressed_uint()?;
                let mut dimensions = Vec::with_capacity(num_sizes as usize);
                for _ in 0..num_sizes {
                    dimensions.push(ArrayDimensions {
                        size: Some(self.parser.read_compressed_uint()?),
                        lower_bound: None,
                    });
                }

                let num_bounds = self.parser.read_compressed_uint()?;
                for index in 0..num_bounds as usize {
                    let bound = self.parser.read_compressed_uint()?;
                    match dimensions.get_mut(index) {
                        Some(dimension) => dimension.lower_bound = Some(bound),
                        None => dimensions.push(ArrayDimensions {
                            size: None,
                            lower_bound: Some(bound),
                        }),
                    }
                }

                Ok(TypeSignature::Array(SignatureArray {
                    base: Box::new(base),
                    rank,
                    dimensions,
                }))
            }
            ELEMENT_TYPE::SZARRAY => {
                let modifiers = self.parse_custom_modifiers()?;
                Ok(TypeSignature::SzArray(SignatureSzArray {
                    modifiers,
                    base: Box::new(self.parse_type()?),
                }))
            }
            ELEMENT_TYPE::GENERICINST => {
                let base = self.parse_type()?;
                let arg_count = self.parser.read_compressed_uint()?;
                let mut args = Vec::with_capacity(arg_count as usize);
                for _ in 0..arg_count {
                    args.push(self.parse_type()?);
                }
                Ok(TypeSignature::GenericInst(Box::new(base), args))
            }
            ELEMENT_TYPE::PINNED => Ok(TypeSignature::Pinned(Box::new(self.parse_type()?))),
            unknown => Err(malformed_error!(
                "Unknown element type in signature - 0x{:02X}",
                unknown
            )),
        }
    }

    /// Parse a method signature from the blob (II.23.2.1)
    ///
    /// # Errors
    /// Returns an error if the calling convention kind is invalid or any type fails to parse.
    pub fn parse_method_signature(&mut self) -> Result<SignatureMethod> {
        let head = self.parser.read_le::<u8>()?;

        let kind = head & CALLING_CONVENTION::MASK;
        if kind > CALLING_CONVENTION::VARARG {
            return Err(malformed_error!(
                "SignatureMethod - invalid calling convention kind - 0x{:02X}",
                kind
            ));
        }

        let param_count_generic = if head & CALLING_CONVENTION::GENERIC != 0 {
            self.parser.read_compressed_uint()?
        } else {
            0
        };

        let param_count = self.parser.read_compressed_uint()?;
        let return_type = self.parse_param()?;

        let mut params = Vec::with_capacity(param_count as usize);
        for _ in 0..param_count {
            params.push(self.parse_param()?);
        }

        Ok(SignatureMethod {
            has_this: head & CALLING_CONVENTION::HASTHIS != 0,
            explicit_this: head & CALLING_CONVENTION::EXPLICITTHIS != 0,
            vararg: kind == CALLING_CONVENTION::VARARG,
            cdecl: kind == CALLING_CONVENTION::C,
            stdcall: kind == CALLING_CONVENTION::STDCALL,
            thiscall: kind == CALLING_CONVENTION::THISCALL,
            fastcall: kind == CALLING_CONVENTION::FASTCALL,
            param_count_generic,
            return_type,
            params,
        })
    }

    /// Parse a local variable signature from the blob (II.23.2.6)
    ///
    /// # Errors
    /// Returns an error if the prolog byte is wrong or any local fails to parse.
    pub fn parse_local_var_signature(&mut self) -> Result<SignatureLocalVariables> {
        let head = self.parser.read_le::<u8>()?;
        if head != SIGNATURE_HEADER::LOCAL_SIG {
            return Err(malformed_error!(
                "SignatureLocalVariables - invalid start - {}",
                head
            ));
        }

        let count = self.parser.read_compressed_uint()?;
        let mut locals = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let modifiers = self.parse_custom_modifiers()?;

            let mut is_pinned = false;
            if self.parser.peek_byte()? == ELEMENT_TYPE::PINNED {
                self.parser.read_le::<u8>()?;
                is_pinned = true;
            }

            let mut is_byref = false;
            if self.parser.peek_byte()? == ELEMENT_TYPE::BYREF {
                self.parser.read_le::<u8>()?;
                is_byref = true;
            }

            locals.push(SignatureLocalVariable {
                modifiers,
                is_byref,
                is_pinned,
                base: self.parse_type()?,
            });
        }

        Ok(SignatureLocalVariables { locals })
    }

    fn parse_param(&mut self) -> Result<SignatureParameter> {
        let modifiers = self.parse_custom_modifiers()?;

        let mut by_ref = false;
        if self.parser.peek_byte()? == ELEMENT_TYPE::BYREF {
            self.parser.read_le::<u8>()?;
            by_ref = true;
        }

        Ok(SignatureParameter {
            modifiers,
            by_ref,
            base: self.parse_type()?,
        })
    }

    fn parse_custom_modifiers(&mut self) -> Result<Vec<CustomModifier>> {
        let mut modifiers = Vec::new();

        loop {
            let next = self.parser.peek_byte()?;
            if next != ELEMENT_TYPE::CMOD_REQD && next != ELEMENT_TYPE::CMOD_OPT {
                break;
            }

            self.parser.read_le::<u8>()?;
            modifiers.push(CustomModifier {
                is_required: next == ELEMENT_TYPE::CMOD_REQD,
                modifier_type: self.parse_coded_token()?,
            });
        }

        Ok(modifiers)
    }

    fn parse_coded_token(&mut self) -> Result<Token> {
        let coded = self.parser.read_compressed_uint()?;
        let rid = coded >> 2;

        match coded & 0x03 {
            0 => Ok(Token::new(0x0200_0000 | rid)),
            1 => Ok(Token::new(0x0100_0000 | rid)),
            2 => Ok(Token::new(0x1B00_0000 | rid)),
            _ => Err(malformed_error!(
                "Invalid TypeDefOrRef coded index tag - {}",
                coded & 0x03
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitive_types() {
        let test_cases = [
            (vec![0x01], TypeSignature::Void),
            (vec![0x02], TypeSignature::Boolean),
            (vec![0x03], TypeSignature::Char),
            (vec![0x08], TypeSignature::I4),
            (vec![0x0E], TypeSignature::String),
            (vec![0x1C], TypeSignature::Object),
            (vec![0x18], TypeSignature::I),
        ];

        for (bytes, expected_type) in test_cases {
            let mut parser = SignatureParser::new(&bytes);
            assert_eq!(parser.parse_type().unwrap(), expected_type);
        }
    }

    #[test]
    fn test_parse_class_and_valuetype() {
        let mut parser = SignatureParser::new(&[0x12, 0x42]);
        assert_eq!(
            parser.parse_type().unwrap(),
            TypeSignature::Class(Token::new(0x1B00_0010))
        );

        let mut parser = SignatureParser::new(&[0x11, 0x35]);
        assert_eq!(
            parser.parse_type().unwrap(),
            TypeSignature::ValueType(Token::new(0x0100_000D))
        );

        let mut parser = SignatureParser::new(&[0x13, 0x03]);
        assert_eq!(
            parser.parse_type().unwrap(),
            TypeSignature::GenericParamType(0x03)
        );
    }

    #[test]
    fn test_parse_method_signature() {
        // Simple method: void Method()
        let mut parser = SignatureParser::new(&[0x00, 0x00, 0x01]);
        let result = parser.parse_method_signature().unwrap();
        assert_eq!(result.params.len(), 0);
        assert_eq!(result.return_type.base, TypeSignature::Void);
        assert!(!result.has_this);

        // Instance method with parameters: int Method(string s, ref int[] numbers)
        let mut parser =
            SignatureParser::new(&[0x20, 0x02, 0x08, 0x0E, 0x10, 0x1D, 0x08]);
        let result = parser.parse_method_signature().unwrap();
        assert!(result.has_this);
        assert_eq!(result.params.len(), 2);
        assert_eq!(result.return_type.base, TypeSignature::I4);
        assert_eq!(result.params[0].base, TypeSignature::String);
        assert!(result.params[1].by_ref);
        assert!(matches!(result.params[1].base, TypeSignature::SzArray(_)));

        // Generic method: T Method<T>(T item)
        let mut parser =
            SignatureParser::new(&[0x30, 0x01, 0x01, 0x1E, 0x00, 0x1E, 0x00]);
        let result = parser.parse_method_signature().unwrap();
        assert!(result.has_this);
        assert_eq!(result.param_count_generic, 1);
        assert_eq!(
            result.return_type.base,
            TypeSignature::GenericParamMethod(0)
        );
    }

    #[test]
    fn test_parse_local_var_signature() {
        // Local variables: int a; string b;
        let mut parser = SignatureParser::new(&[0x07, 0x02, 0x08, 0x0E]);
        let result = parser.parse_local_var_signature().unwrap();
        assert_eq!(result.locals.len(), 2);
        assert_eq!(result.locals[0].base, TypeSignature::I4);
        assert_eq!(result.locals[1].base, TypeSignature::String);

        // Local variables with byref and pinned: ref int a; pinned string b;
        let mut parser = SignatureParser::new(&[0x07, 0x02, 0x10, 0x08, 0x45, 0x0E]);
        let result = parser.parse_local_var_signature().unwrap();
        assert!(result.locals[0].is_byref);
        assert!(!result.locals[0].is_pinned);
        assert!(result.locals[1].is_pinned);
        assert_eq!(result.locals[1].base, TypeSignature::String);
    }

    #[test]
    fn test_parse_rejects_invalid_calling_convention() {
        // kind nibble 0x0C is not a valid method calling convention
        let mut parser = SignatureParser::new(&[0x0C, 0x00, 0x01]);
        assert!(parser.parse_method_signature().is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_local_sig_prolog() {
        let mut parser = SignatureParser::new(&[0x06, 0x01, 0x08]);
        assert!(parser.parse_local_var_signature().is_err());
    }

    #[test]
    fn test_parse_multidimensional_array() {
        // int[2,3]
        let mut parser =
            SignatureParser::new(&[0x14, 0x08, 0x02, 0x02, 0x02, 0x03, 0x00]);
        let result = parser.parse_type().unwrap();
        if let TypeSignature::Array(array) = result {
            assert_eq!(*array.base, TypeSignature::I4);
            assert_eq!(array.rank, 2);
            assert_eq!(array.dimensions.len(), 2);
            assert_eq!(array.dimensions[0].size, Some(2));
            assert_eq!(array.dimensions[1].size, Some(3));
        } else {
            panic!("expected array signature");
        }
    }
}
