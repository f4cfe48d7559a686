//! Method attribute, implementation, and calling-convention flags.
//!
//! This module defines the bitflag vocabulary a method descriptor carries:
//! [`MethodAttributes`] (visibility and modifiers), [`MethodImplAttributes`]
//! (body kind and implementation options), and [`CallingConventions`] (the
//! managed calling-convention flags a caller declares the method with).
//! Values follow ECMA-335 §II.23.1.10 / §II.23.1.11.

use bitflags::bitflags;

/// Bitmask for `CODE_TYPE` extraction
pub const METHOD_IMPL_CODE_TYPE_MASK: u32 = 0x0003;
/// Bitmask for `ACCESS` state extraction
pub const METHOD_ACCESS_MASK: u32 = 0x0007;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method attributes: accessibility, membership kind, and modifiers
    pub struct MethodAttributes: u32 {
        /// Member not referenceable
        const COMPILER_CONTROLLED = 0x0000;
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this Assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessibly by anyone in the Assembly
        const ASSEM = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessibly by sub-types anywhere, plus anyone in assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessibly by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method always gets a new slot in the vtable
        const NEW_SLOT = 0x0100;
        /// Method can only be overriden if also accessible
        const STRICT = 0x0200;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// CLI provides 'special' behavior, depending upon the name of the method
        const RTSPECIAL_NAME = 0x1000;
        /// Implementation is forwarded through PInvoke
        const PINVOKE_IMPL = 0x2000;
        /// Method has security associated with it
        const HAS_SECURITY = 0x4000;
        /// Method calls another method containing security code
        const REQUIRE_SEC_OBJECT = 0x8000;
        /// Reserved: shall be zero for conforming implementations
        const UNMANAGED_EXPORT = 0x0008;
    }
}

impl MethodAttributes {
    /// Extract the accessibility bits from the attributes
    #[must_use]
    pub fn access(&self) -> u32 {
        self.bits() & METHOD_ACCESS_MASK
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method implementation attributes: body kind and implementation options
    pub struct MethodImplAttributes: u32 {
        /// Method impl is IL
        const IL = 0x0000;
        /// Method impl is native
        const NATIVE = 0x0001;
        /// Method impl is OPTIL
        const OPTIL = 0x0002;
        /// Method impl is provided by the runtime
        const RUNTIME = 0x0003;
        /// Method impl is unmanaged, otherwise managed
        const UNMANAGED = 0x0004;
        /// Method cannot be inlined
        const NO_INLINING = 0x0008;
        /// Method is defined; used primarily in merge scenarios
        const FORWARD_REF = 0x0010;
        /// Method is a synchronized method
        const SYNCHRONIZED = 0x0020;
        /// Method signature is exported exactly as declared
        const PRESERVE_SIG = 0x0080;
        /// Implemented within the CLI itself
        const INTERNAL_CALL = 0x1000;
    }
}

impl MethodImplAttributes {
    /// Extract the code type from these implementation flags
    #[must_use]
    pub fn code_type(&self) -> MethodImplCodeType {
        MethodImplCodeType::from_impl_flags(self.bits())
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method implementation code type flags
    pub struct MethodImplCodeType: u32 {
        /// Method impl is IL
        const IL = 0x0000;
        /// Method impl is native
        const NATIVE = 0x0001;
        /// Method impl is OPTIL
        const OPTIL = 0x0002;
        /// Method impl is provided by the runtime
        const RUNTIME = 0x0003;
    }
}

impl MethodImplCodeType {
    /// Extract code type from raw implementation flags
    #[must_use]
    pub fn from_impl_flags(flags: u32) -> Self {
        let code_type = flags & METHOD_IMPL_CODE_TYPE_MASK;
        Self::from_bits_truncate(code_type)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Managed calling-convention flags a method is declared with.
    ///
    /// These are the declaration-side flags; the signature encoder maps them
    /// to the calling-convention byte of the encoded signature (the
    /// HasThis/ExplicitThis flags to the HASTHIS bit, VarArgs to the VARARG
    /// kind, their absence to the default convention).
    pub struct CallingConventions: u32 {
        /// Fixed argument list
        const STANDARD = 0x0001;
        /// Variable argument list
        const VAR_ARGS = 0x0002;
        /// Either convention may apply
        const ANY = 0x0003;
        /// The method carries an instance receiver
        const HAS_THIS = 0x0020;
        /// The instance receiver is explicit in the parameter list
        const EXPLICIT_THIS = 0x0040;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_type_extraction() {
        let flags = MethodImplAttributes::NATIVE | MethodImplAttributes::PRESERVE_SIG;
        assert_eq!(flags.code_type(), MethodImplCodeType::NATIVE);

        let flags = MethodImplAttributes::IL | MethodImplAttributes::SYNCHRONIZED;
        assert_eq!(flags.code_type(), MethodImplCodeType::IL);

        assert_eq!(
            MethodImplCodeType::from_impl_flags(0x0003),
            MethodImplCodeType::RUNTIME
        );
    }

    #[test]
    fn test_access_extraction() {
        let attributes = MethodAttributes::PUBLIC | MethodAttributes::STATIC;
        assert_eq!(attributes.access(), 0x0006);

        let attributes = MethodAttributes::PRIVATE | MethodAttributes::VIRTUAL;
        assert_eq!(attributes.access(), 0x0001);
    }

    #[test]
    fn test_impl_flags_or_preserves_unknown_bits() {
        // Flags arriving from a method-implementation annotation are OR'd in raw
        let flags = MethodImplAttributes::IL.bits() | 0x0100;
        let merged = MethodImplAttributes::from_bits_retain(flags);
        assert_eq!(merged.bits(), 0x0100);
    }
}
