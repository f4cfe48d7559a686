//! Custom attribute blob decoding.
//!
//! Decodes the ECMA-335 II.23.3 `CustomAttribute` blob format: a 0x0001
//! prolog, fixed arguments typed by the constructor's parameter list, a named
//! argument count, and named field/property arguments tagged with
//! `CorSerializationType` bytes. The builder only decodes attribute blobs it
//! has to look inside (the foreign-import case); everything else is stored
//! verbatim without passing through here.

use crate::{
    metadata::{
        customattributes::{
            CustomAttributeArgument, CustomAttributeCtor, CustomAttributeNamedArgument,
            CustomAttributeValue, SERIALIZATION_TYPE,
        },
        signatures::TypeSignature,
    },
    utils::Parser,
    Result,
};

/// Blob prolog required by II.23.3
const CUSTOM_ATTRIBUTE_PROLOG: u16 = 0x0001;

/// Decodes a custom attribute blob against its constructor reference.
///
/// Fixed arguments are decoded in constructor-parameter order; named
/// arguments follow their serialization-type tags.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] for a missing prolog, a truncated
/// blob, or an argument type this decoder does not understand, and
/// [`crate::Error::OutOfBounds`] when the blob ends mid-value.
pub fn parse_custom_attribute_data(
    data: &[u8],
    ctor: &CustomAttributeCtor,
) -> Result<CustomAttributeValue> {
    let mut parser = Parser::new(data);

    let prolog = parser.read_le::<u16>()?;
    if prolog != CUSTOM_ATTRIBUTE_PROLOG {
        return Err(malformed_error!(
            "Custom attribute blob has invalid prolog - 0x{:04X}",
            prolog
        ));
    }

    let mut fixed_args = Vec::with_capacity(ctor.parameter_types.len());
    for param_type in &ctor.parameter_types {
        fixed_args.push(parse_fixed_argument(&mut parser, param_type)?);
    }

    let named_count = parser.read_le::<u16>()?;
    let mut named_args = Vec::with_capacity(usize::from(named_count));
    for _ in 0..named_count {
        named_args.push(parse_named_argument(&mut parser)?);
    }

    Ok(CustomAttributeValue {
        fixed_args,
        named_args,
    })
}

fn parse_fixed_argument(
    parser: &mut Parser<'_>,
    param_type: &TypeSignature,
) -> Result<CustomAttributeArgument> {
    match param_type {
        TypeSignature::Boolean => Ok(CustomAttributeArgument::Bool(parser.read_le::<u8>()? != 0)),
        TypeSignature::Char => {
            let raw = parser.read_le::<u16>()?;
            match char::from_u32(u32::from(raw)) {
                Some(value) => Ok(CustomAttributeArgument::Char(value)),
                None => Err(malformed_error!("Invalid char value - 0x{:04X}", raw)),
            }
        }
        TypeSignature::I1 => Ok(CustomAttributeArgument::I1(parser.read_le::<i8>()?)),
        TypeSignature::U1 => Ok(CustomAttributeArgument::U1(parser.read_le::<u8>()?)),
        TypeSignature::I2 => Ok(CustomAttributeArgument::I2(parser.read_le::<i16>()?)),
        TypeSignature::U2 => Ok(CustomAttributeArgument::U2(parser.read_le::<u16>()?)),
        TypeSignature::I4 => Ok(CustomAttributeArgument::I4(parser.read_le::<i32>()?)),
        TypeSignature::U4 => Ok(CustomAttributeArgument::U4(parser.read_le::<u32>()?)),
        TypeSignature::I8 => Ok(CustomAttributeArgument::I8(parser.read_le::<i64>()?)),
        TypeSignature::U8 => Ok(CustomAttributeArgument::U8(parser.read_le::<u64>()?)),
        TypeSignature::R4 => Ok(CustomAttributeArgument::R4(parser.read_le::<f32>()?)),
        TypeSignature::R8 => Ok(CustomAttributeArgument::R8(parser.read_le::<f64>()?)),
        TypeSignature::String => {
            let value = parser.read_ser_string()?.unwrap_or_default();
            Ok(CustomAttributeArgument::String(value))
        }
        other => Err(malformed_error!(
            "Unsupported fixed argument type in custom attribute - {:?}",
            other
        )),
    }
}

fn parse_named_argument(parser: &mut Parser<'_>) -> Result<CustomAttributeNamedArgument> {
    let member_tag = parser.read_le::<u8>()?;
    let is_field = match member_tag {
        SERIALIZATION_TYPE::FIELD => true,
        SERIALIZATION_TYPE::PROPERTY => false,
        other => {
            return Err(malformed_error!(
                "Invalid named argument member tag - 0x{:02X}",
                other
            ))
        }
    };

    let type_tag = parser.read_le::<u8>()?;
    let enum_type = if type_tag == SERIALIZATION_TYPE::ENUM {
        parser.read_ser_string()?
    } else {
        None
    };

    let name = match parser.read_ser_string()? {
        Some(name) => name,
        None => {
            return Err(malformed_error!(
                "Named argument without a name at offset {}",
                parser.position()
            ))
        }
    };

    let (arg_type, value) = match type_tag {
        SERIALIZATION_TYPE::BOOLEAN => (
            "Boolean".to_string(),
            CustomAttributeArgument::Bool(parser.read_le::<u8>()? != 0),
        ),
        SERIALIZATION_TYPE::CHAR => {
            let raw = parser.read_le::<u16>()?;
            let value = char::from_u32(u32::from(raw))
                .ok_or_else(|| malformed_error!("Invalid char value - 0x{:04X}", raw))?;
            ("Char".to_string(), CustomAttributeArgument::Char(value))
        }
        SERIALIZATION_TYPE::I1 => (
            "SByte".to_string(),
            CustomAttributeArgument::I1(parser.read_le::<i8>()?),
        ),
        SERIALIZATION_TYPE::U1 => (
            "Byte".to_string(),
            CustomAttributeArgument::U1(parser.read_le::<u8>()?),
        ),
        SERIALIZATION_TYPE::I2 => (
            "Int16".to_string(),
            CustomAttributeArgument::I2(parser.read_le::<i16>()?),
        ),
        SERIALIZATION_TYPE::U2 => (
            "UInt16".to_string(),
            CustomAttributeArgument::U2(parser.read_le::<u16>()?),
        ),
        SERIALIZATION_TYPE::I4 => (
            "Int32".to_string(),
            CustomAttributeArgument::I4(parser.read_le::<i32>()?),
        ),
        SERIALIZATION_TYPE::U4 => (
            "UInt32".to_string(),
            CustomAttributeArgument::U4(parser.read_le::<u32>()?),
        ),
        SERIALIZATION_TYPE::I8 => (
            "Int64".to_string(),
            CustomAttributeArgument::I8(parser.read_le::<i64>()?),
        ),
        SERIALIZATION_TYPE::U8 => (
            "UInt64".to_string(),
            CustomAttributeArgument::U8(parser.read_le::<u64>()?),
        ),
        SERIALIZATION_TYPE::R4 => (
            "Single".to_string(),
            CustomAttributeArgument::R4(parser.read_le::<f32>()?),
        ),
        SERIALIZATION_TYPE::R8 => (
            "Double".to_string(),
            CustomAttributeArgument::R8(parser.read_le::<f64>()?),
        ),
        SERIALIZATION_TYPE::STRING => (
            "String".to_string(),
            CustomAttributeArgument::String(parser.read_ser_string()?.unwrap_or_default()),
        ),
        SERIALIZATION_TYPE::ENUM => {
            // Enums in attribute blobs carry their underlying value; the
            // 32-bit case covers every enum the special-cased attributes use
            let enum_type = enum_type.ok_or_else(|| {
                malformed_error!(
                    "Enum named argument without a type name at offset {}",
                    parser.position()
                )
            })?;
            let value = CustomAttributeArgument::I4(parser.read_le::<i32>()?);
            (
                enum_type.clone(),
                CustomAttributeArgument::Enum(enum_type, Box::new(value)),
            )
        }
        other => {
            return Err(malformed_error!(
                "Unsupported named argument type tag - 0x{:02X}",
                other
            ))
        }
    };

    Ok(CustomAttributeNamedArgument {
        is_field,
        name,
        arg_type,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::token::Token;

    fn string_ctor(declaring_type: &str) -> CustomAttributeCtor {
        CustomAttributeCtor::new(
            Token::new(0x0A00_0001),
            declaring_type,
            vec![TypeSignature::String],
        )
    }

    #[test]
    fn test_parse_string_fixed_argument() {
        let blob = [
            0x01, 0x00, // Prolog
            0x05, b'H', b'e', b'l', b'l', b'o', // "Hello"
            0x00, 0x00, // 0 named arguments
        ];

        let value =
            parse_custom_attribute_data(&blob, &string_ctor("MyApp.MarkerAttribute")).unwrap();
        assert_eq!(value.fixed_args.len(), 1);
        assert_eq!(value.fixed_args[0].as_str(), Some("Hello"));
        assert!(value.named_args.is_empty());
    }

    #[test]
    fn test_parse_named_arguments() {
        let blob = [
            0x01, 0x00, // Prolog
            0x04, b'u', b's', b'e', b'r', // fixed string "user"
            0x02, 0x00, // 2 named arguments
            0x54, 0x0E, // PROPERTY, STRING
            0x0A, b'E', b'n', b't', b'r', b'y', b'P', b'o', b'i', b'n', b't',
            0x03, b'a', b'd', b'd', // "add"
            0x54, 0x02, // PROPERTY, BOOLEAN
            0x0C, b'S', b'e', b't', b'L', b'a', b's', b't', b'E', b'r', b'r', b'o', b'r',
            0x01, // true
        ];

        let value =
            parse_custom_attribute_data(&blob, &string_ctor("MyApp.ImportAttribute")).unwrap();
        assert_eq!(value.fixed_args[0].as_str(), Some("user"));
        assert_eq!(value.named_args.len(), 2);
        assert_eq!(value.named_arg("EntryPoint").unwrap().as_str(), Some("add"));
        assert_eq!(value.named_arg("SetLastError").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_parse_enum_named_argument() {
        let enum_name = "System.Runtime.InteropServices.CharSet";
        let mut blob = vec![0x01, 0x00, 0x00, 0x00]; // prolog, no fixed args, then count patched below
        blob.truncate(2);
        blob.extend_from_slice(&[0x01, 0x00]); // 1 named argument
        blob.push(0x54); // PROPERTY
        blob.push(0x55); // ENUM
        blob.push(enum_name.len() as u8);
        blob.extend_from_slice(enum_name.as_bytes());
        blob.push(0x07);
        blob.extend_from_slice(b"CharSet");
        blob.extend_from_slice(&3i32.to_le_bytes()); // CharSet.Unicode

        let ctor = CustomAttributeCtor::new(Token::new(0x0A00_0002), "MyApp.X", Vec::new());
        let value = parse_custom_attribute_data(&blob, &ctor).unwrap();
        assert_eq!(value.named_arg("CharSet").unwrap().as_i4(), Some(3));
    }

    #[test]
    fn test_parse_rejects_bad_prolog() {
        let blob = [0x02, 0x00, 0x00, 0x00];
        let ctor = CustomAttributeCtor::new(Token::new(0x0A00_0003), "MyApp.X", Vec::new());
        assert!(parse_custom_attribute_data(&blob, &ctor).is_err());
    }

    #[test]
    fn test_parse_rejects_truncated_blob() {
        let blob = [0x01, 0x00, 0x05, b'H', b'e'];
        assert!(parse_custom_attribute_data(&blob, &string_ctor("MyApp.X")).is_err());
    }
}
