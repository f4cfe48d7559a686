//! Core type universe for dynamically built methods.
//!
//! A builder needs two things from a type system: the well-known core types
//! (`System.Void` as the default return type, the primitives used in
//! signatures) and a way to refer to declared classes and value types that
//! only exist as rows in the module under construction. [`TypeUniverse`]
//! provides both, handing out [`TypeSignature`] values and opaque
//! [`Token`] references that the signature encoders understand.

use std::collections::HashMap;

use strum::{EnumCount, IntoEnumIterator};

use crate::metadata::{signatures::TypeSignature, token::Token};

#[allow(non_snake_case, dead_code, missing_docs)]
/// Possible bytes that represent various 'Types' for a signature - from coreclr
pub mod ELEMENT_TYPE {
    //Marks end of a list
    pub const END: u8 = 0x00;
    pub const VOID: u8 = 0x01;
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0a;
    pub const U8: u8 = 0x0b;
    pub const R4: u8 = 0x0c;
    pub const R8: u8 = 0x0d;
    pub const STRING: u8 = 0x0e;
    // Followed by type
    pub const PTR: u8 = 0x0f;
    // Followed by type
    pub const BYREF: u8 = 0x10;
    // Followed by TypeDef or TypeRef token
    pub const VALUETYPE: u8 = 0x11;
    // Followed by TypeDef or TypeRef token
    pub const CLASS: u8 = 0x12;
    // Generic parameter in a generic type definition, represented as number
    pub const VAR: u8 = 0x13;
    // type rank boundsCount bound1 … loCount lo1 …
    pub const ARRAY: u8 = 0x14;
    // Generic type instantiation. Followed by type type-arg-count type-1 ... type-n
    pub const GENERICINST: u8 = 0x15;
    pub const TYPEDBYREF: u8 = 0x16;
    // System.IntPtr
    pub const I: u8 = 0x18;
    // System.UIntPtr
    pub const U: u8 = 0x19;
    // System.Object
    pub const OBJECT: u8 = 0x1c;
    // Single-dim array with 0 lower bound
    pub const SZARRAY: u8 = 0x1d;
    // Generic parameter in a generic method definition, represented as number
    pub const MVAR: u8 = 0x1e;
    // Required modifier : followed by a TypeDef or TypeRef token
    pub const CMOD_REQD: u8 = 0x1f;
    // Optional modifier : followed by a TypeDef or TypeRef token
    pub const CMOD_OPT: u8 = 0x20;
    // Denotes a local variable that points at a pinned object
    pub const PINNED: u8 = 0x45;
}

/// Dimension information for one rank of a multi-dimensional array
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayDimensions {
    /// The declared size of this dimension, if any
    pub size: Option<u32>,
    /// The declared lower bound of this dimension, if any
    pub lower_bound: Option<u32>,
}

/// Identifiers for the well-known core types every module can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::EnumCount)]
#[allow(missing_docs)]
pub enum CoreTypeId {
    Void,
    Boolean,
    Char,
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    U8,
    R4,
    R8,
    I,
    U,
    String,
    Object,
    TypedReference,
}

impl CoreTypeId {
    /// The full runtime name of this core type (e.g. `System.Int32`).
    #[must_use]
    pub fn full_name(&self) -> &'static str {
        match self {
            CoreTypeId::Void => "System.Void",
            CoreTypeId::Boolean => "System.Boolean",
            CoreTypeId::Char => "System.Char",
            CoreTypeId::I1 => "System.SByte",
            CoreTypeId::U1 => "System.Byte",
            CoreTypeId::I2 => "System.Int16",
            CoreTypeId::U2 => "System.UInt16",
            CoreTypeId::I4 => "System.Int32",
            CoreTypeId::U4 => "System.UInt32",
            CoreTypeId::I8 => "System.Int64",
            CoreTypeId::U8 => "System.UInt64",
            CoreTypeId::R4 => "System.Single",
            CoreTypeId::R8 => "System.Double",
            CoreTypeId::I => "System.IntPtr",
            CoreTypeId::U => "System.UIntPtr",
            CoreTypeId::String => "System.String",
            CoreTypeId::Object => "System.Object",
            CoreTypeId::TypedReference => "System.TypedReference",
        }
    }

    /// The signature representation of this core type.
    #[must_use]
    pub fn signature(&self) -> TypeSignature {
        match self {
            CoreTypeId::Void => TypeSignature::Void,
            CoreTypeId::Boolean => TypeSignature::Boolean,
            CoreTypeId::Char => TypeSignature::Char,
            CoreTypeId::I1 => TypeSignature::I1,
            CoreTypeId::U1 => TypeSignature::U1,
            CoreTypeId::I2 => TypeSignature::I2,
            CoreTypeId::U2 => TypeSignature::U2,
            CoreTypeId::I4 => TypeSignature::I4,
            CoreTypeId::U4 => TypeSignature::U4,
            CoreTypeId::I8 => TypeSignature::I8,
            CoreTypeId::U8 => TypeSignature::U8,
            CoreTypeId::R4 => TypeSignature::R4,
            CoreTypeId::R8 => TypeSignature::R8,
            CoreTypeId::I => TypeSignature::I,
            CoreTypeId::U => TypeSignature::U,
            CoreTypeId::String => TypeSignature::String,
            CoreTypeId::Object => TypeSignature::Object,
            CoreTypeId::TypedReference => TypeSignature::TypedByRef,
        }
    }
}

/// Resolver for the types a method under construction can mention.
///
/// Core types resolve without registration. Declared classes and value types
/// are interned by full name, receiving a stable `TypeRef`-style token that
/// the signature encoders embed as a coded index. The universe never needs
/// the referenced assembly; it is a name-to-token registry, nothing more.
pub struct TypeUniverse {
    core_names: HashMap<&'static str, CoreTypeId>,
    declared: HashMap<String, Token>,
    next_row: u32,
}

impl TypeUniverse {
    /// Creates an empty universe with all core types resolvable.
    #[must_use]
    pub fn new() -> Self {
        let mut core_names = HashMap::with_capacity(CoreTypeId::COUNT);
        for id in CoreTypeId::iter() {
            core_names.insert(id.full_name(), id);
        }

        TypeUniverse {
            core_names,
            declared: HashMap::new(),
            next_row: 1,
        }
    }

    /// Resolves a well-known core type.
    #[must_use]
    pub fn core(&self, id: CoreTypeId) -> TypeSignature {
        id.signature()
    }

    /// The void-equivalent type used as the default return type.
    #[must_use]
    pub fn void(&self) -> TypeSignature {
        TypeSignature::Void
    }

    /// Interns a declared reference type, returning its class signature.
    ///
    /// Repeated calls with the same name return the same token.
    pub fn class(&mut self, full_name: &str) -> TypeSignature {
        TypeSignature::Class(self.intern(full_name))
    }

    /// Interns a declared value type, returning its value-type signature.
    ///
    /// Repeated calls with the same name return the same token.
    pub fn value_type(&mut self, full_name: &str) -> TypeSignature {
        TypeSignature::ValueType(self.intern(full_name))
    }

    /// Resolves a type by its full name, checking core types first.
    ///
    /// Returns `None` for names that are neither core types nor interned
    /// declarations.
    #[must_use]
    pub fn resolve_name(&self, full_name: &str) -> Option<TypeSignature> {
        if let Some(id) = self.core_names.get(full_name) {
            return Some(id.signature());
        }

        self.declared
            .get(full_name)
            .map(|token| TypeSignature::Class(*token))
    }

    /// Returns the token of a previously interned declared type.
    #[must_use]
    pub fn declared_token(&self, full_name: &str) -> Option<Token> {
        self.declared.get(full_name).copied()
    }

    fn intern(&mut self, full_name: &str) -> Token {
        if let Some(token) = self.declared.get(full_name) {
            return *token;
        }

        let token = Token::new(0x0100_0000 | self.next_row);
        self.next_row += 1;
        self.declared.insert(full_name.to_string(), token);
        token
    }
}

impl Default for TypeUniverse {
    fn default() -> Self {
        Self::new()
    }
}
