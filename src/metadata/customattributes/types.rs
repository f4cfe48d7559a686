//! Custom attribute value model.
//!
//! Parsed custom attribute data according to ECMA-335 II.23.3: fixed
//! arguments driven by the constructor's parameter types, followed by named
//! field/property arguments tagged with `CorSerializationType` bytes.

use crate::metadata::{signatures::TypeSignature, token::Token};

/// A reference to a custom attribute constructor.
///
/// Identifies the attribute by its constructor token, the full name of the
/// declaring type (the key the pseudo-attribute table matches on), and the
/// constructor's parameter types (which drive fixed-argument decoding).
#[derive(Debug, Clone)]
pub struct CustomAttributeCtor {
    /// The constructor's metadata token
    pub token: Token,
    /// Full name of the attribute type declaring the constructor
    pub declaring_type: String,
    /// The constructor's parameter types, in order
    pub parameter_types: Vec<TypeSignature>,
}

impl CustomAttributeCtor {
    /// Creates a constructor reference.
    #[must_use]
    pub fn new(token: Token, declaring_type: &str, parameter_types: Vec<TypeSignature>) -> Self {
        CustomAttributeCtor {
            token,
            declaring_type: declaring_type.to_string(),
            parameter_types,
        }
    }
}

/// A custom attribute preserved verbatim on a method descriptor.
///
/// Attributes that are not special-cased by the builder are stored as the
/// constructor reference plus the raw argument blob, exactly as supplied.
#[derive(Debug, Clone)]
pub struct CustomAttributeWrapper {
    /// The attribute constructor
    pub ctor: CustomAttributeCtor,
    /// The raw argument blob, unmodified
    pub blob: Vec<u8>,
}

/// Represents a parsed custom attribute value with arguments and named arguments
#[derive(Debug, Clone)]
pub struct CustomAttributeValue {
    /// Fixed arguments from the constructor signature
    pub fixed_args: Vec<CustomAttributeArgument>,
    /// Named arguments (fields and properties)
    pub named_args: Vec<CustomAttributeNamedArgument>,
}

impl CustomAttributeValue {
    /// Looks up a named argument by name.
    #[must_use]
    pub fn named_arg(&self, name: &str) -> Option<&CustomAttributeArgument> {
        self.named_args
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }
}

/// Represents a single custom attribute argument value
#[derive(Debug, Clone, PartialEq)]
pub enum CustomAttributeArgument {
    /// Boolean value
    Bool(bool),
    /// Character value (16-bit Unicode)
    Char(char),
    /// Signed 8-bit integer
    I1(i8),
    /// Unsigned 8-bit integer
    U1(u8),
    /// Signed 16-bit integer
    I2(i16),
    /// Unsigned 16-bit integer
    U2(u16),
    /// Signed 32-bit integer
    I4(i32),
    /// Unsigned 32-bit integer
    U4(u32),
    /// Signed 64-bit integer
    I8(i64),
    /// Unsigned 64-bit integer
    U8(u64),
    /// 32-bit floating point
    R4(f32),
    /// 64-bit floating point
    R8(f64),
    /// UTF-8 string
    String(String),
    /// Enum value (enum type name + underlying value)
    Enum(String, Box<CustomAttributeArgument>),
}

impl CustomAttributeArgument {
    /// The boolean payload, if this argument is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CustomAttributeArgument::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The string payload, if this argument is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CustomAttributeArgument::String(value) => Some(value),
            _ => None,
        }
    }

    /// The 32-bit integer payload, unwrapping enum arguments to their
    /// underlying value.
    #[must_use]
    pub fn as_i4(&self) -> Option<i32> {
        match self {
            CustomAttributeArgument::I4(value) => Some(*value),
            CustomAttributeArgument::Enum(_, inner) => inner.as_i4(),
            _ => None,
        }
    }
}

/// Represents a named argument (field or property) in a custom attribute
#[derive(Debug, Clone)]
pub struct CustomAttributeNamedArgument {
    /// Whether this is a field (true) or property (false)
    pub is_field: bool,
    /// Name of the field or property
    pub name: String,
    /// Type of the argument
    pub arg_type: String,
    /// Value of the argument
    pub value: CustomAttributeArgument,
}

/// .NET `CorSerializationType` constants as defined in corhdr.h
#[allow(non_snake_case, missing_docs)]
pub mod SERIALIZATION_TYPE {
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0A;
    pub const U8: u8 = 0x0B;
    pub const R4: u8 = 0x0C;
    pub const R8: u8 = 0x0D;
    pub const STRING: u8 = 0x0E;
    pub const SZARRAY: u8 = 0x1D;
    pub const TYPE: u8 = 0x50;
    pub const TAGGED_OBJECT: u8 = 0x51;
    pub const FIELD: u8 = 0x53;
    pub const PROPERTY: u8 = 0x54;
    pub const ENUM: u8 = 0x55;
}
