//! Foreign-function (P/Invoke) import data.
//!
//! When a foreign-import attribute is applied to a method descriptor, its
//! arguments are decoded into [`PInvokeData`]: the target library, the
//! optional entry point override, and the `PInvokeAttributes` flag word the
//! ImplMap table row will carry. A descriptor with import data never also
//! carries a bytecode body.

use crate::{
    metadata::customattributes::CustomAttributeValue,
    Result,
};

#[allow(non_snake_case)]
/// All possible flags for `PInvokeAttributes`
pub mod PInvokeAttributes {
    /// `PInvoke` is to use the member name as specified
    pub const NO_MANGLE: u32 = 0x0001;
    /// Character set is not specified
    pub const CHAR_SET_NOT_SPEC: u32 = 0x0000;
    /// Strings are marshaled as ANSI
    pub const CHAR_SET_ANSI: u32 = 0x0002;
    /// Strings are marshaled as UTF-16
    pub const CHAR_SET_UNICODE: u32 = 0x0004;
    /// Character set chosen automatically per platform
    pub const CHAR_SET_AUTO: u32 = 0x0006;
    /// Character set mask
    pub const CHAR_SET_MASK: u32 = 0x0006;
    /// Target function sets the last-error marker
    pub const SUPPORTS_LAST_ERROR: u32 = 0x0040;
    /// Calling convention mask
    pub const CALL_CONV_MASK: u32 = 0x0700;
    /// Calling convention = `WinAPI`
    pub const CALL_CONV_WINAPI: u32 = 0x0100;
    /// Calling convention = C
    pub const CALL_CONV_CDECL: u32 = 0x0200;
    /// Calling convention = `StdCall`
    pub const CALL_CONV_STDCALL: u32 = 0x0300;
    /// Calling convention = `ThisCall`
    pub const CALL_CONV_THISCALL: u32 = 0x0400;
    /// Calling convention = `FastCall`
    pub const CALL_CONV_FASTCALL: u32 = 0x0500;
    /// Best fit mapping mask
    pub const BEST_FIT_MASK: u32 = 0x0030;
    /// Best fit mapping is enabled
    pub const BEST_FIT_ENABLED: u32 = 0x0010;
    /// Best fit mapping is disabled
    pub const BEST_FIT_DISABLED: u32 = 0x0020;
    /// Throw on unmappable chars mask
    pub const THROW_ON_UNMAPPABLE_MASK: u32 = 0x3000;
    /// Throw on unmappable chars enabled
    pub const THROW_ON_UNMAPPABLE_ENABLED: u32 = 0x1000;
    /// Throw on unmappable chars disabled
    pub const THROW_ON_UNMAPPABLE_DISABLED: u32 = 0x2000;
}

/// Import metadata for a method whose implementation lives in a native library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PInvokeData {
    module_name: String,
    entry_point: Option<String>,
    flags: u32,
}

impl PInvokeData {
    /// The target library name (the foreign-import attribute's fixed argument)
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// The entry point override, if one was supplied; the method name applies otherwise
    #[must_use]
    pub fn entry_point(&self) -> Option<&str> {
        self.entry_point.as_deref()
    }

    /// The `PInvokeAttributes` flag word for the ImplMap row
    #[must_use]
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Builds import data from a decoded foreign-import attribute.
    ///
    /// Returns the import data plus whether the `PreserveSig` option was
    /// present and true (the caller folds that into the implementation
    /// flags, not into the import flag word).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] if the attribute carries no
    /// library name.
    pub fn from_custom_attribute(value: &CustomAttributeValue) -> Result<(Self, bool)> {
        let module_name = match value.fixed_args.first().and_then(|arg| arg.as_str()) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(crate::Error::InvalidArgument(
                    "foreign-import attribute carries no library name".to_string(),
                ))
            }
        };

        let entry_point = value
            .named_arg("EntryPoint")
            .and_then(|arg| arg.as_str())
            .map(str::to_string);

        let mut flags = match value.named_arg("CallingConvention").and_then(|a| a.as_i4()) {
            Some(2) => PInvokeAttributes::CALL_CONV_CDECL,
            Some(3) => PInvokeAttributes::CALL_CONV_STDCALL,
            Some(4) => PInvokeAttributes::CALL_CONV_THISCALL,
            Some(5) => PInvokeAttributes::CALL_CONV_FASTCALL,
            // Winapi (1) and absence both mean the platform default
            _ => PInvokeAttributes::CALL_CONV_WINAPI,
        };

        flags |= match value.named_arg("CharSet").and_then(|a| a.as_i4()) {
            Some(2) => PInvokeAttributes::CHAR_SET_ANSI,
            Some(3) => PInvokeAttributes::CHAR_SET_UNICODE,
            Some(4) => PInvokeAttributes::CHAR_SET_AUTO,
            _ => PInvokeAttributes::CHAR_SET_NOT_SPEC,
        };

        if value.named_arg("ExactSpelling").and_then(|a| a.as_bool()) == Some(true) {
            flags |= PInvokeAttributes::NO_MANGLE;
        }

        if value.named_arg("SetLastError").and_then(|a| a.as_bool()) == Some(true) {
            flags |= PInvokeAttributes::SUPPORTS_LAST_ERROR;
        }

        if let Some(best_fit) = value.named_arg("BestFitMapping").and_then(|a| a.as_bool()) {
            flags |= if best_fit {
                PInvokeAttributes::BEST_FIT_ENABLED
            } else {
                PInvokeAttributes::BEST_FIT_DISABLED
            };
        }

        if let Some(throw) = value
            .named_arg("ThrowOnUnmappableChar")
            .and_then(|a| a.as_bool())
        {
            flags |= if throw {
                PInvokeAttributes::THROW_ON_UNMAPPABLE_ENABLED
            } else {
                PInvokeAttributes::THROW_ON_UNMAPPABLE_DISABLED
            };
        }

        let preserve_sig =
            value.named_arg("PreserveSig").and_then(|a| a.as_bool()) == Some(true);

        Ok((
            PInvokeData {
                module_name,
                entry_point,
                flags,
            },
            preserve_sig,
        ))
    }
}
