//! Dynamic method descriptor construction.
//!
//! [`MethodDefBuilder`] is the orchestrator of the emit layer: it owns the
//! declared signature shape (return type, parameter types, calling
//! conventions), the parameter and generic-parameter tables, the optional
//! P/Invoke import data, the attached custom attributes, and the method body
//! stream. It enforces the declaration state machine: the signature and
//! generic-parameter shape freeze the moment a body is requested, and the
//! whole descriptor freezes when the module finalizer assigns its token.

use crate::{
    metadata::{
        customattributes::{
            parse_custom_attribute_data, CustomAttributeCtor, CustomAttributeWrapper,
        },
        emit::{GenericParamBuilder, MethodBodyStream, PInvokeData, ParamBuilder},
        method::{
            CallingConventions, MethodAttributes, MethodImplAttributes, MethodImplCodeType,
        },
        signatures::{
            encode_method_signature, SignatureMethod, SignatureParameter, TypeSignature,
        },
        token::Token,
        typesystem::TypeUniverse,
    },
    Error, Result,
};

/// The fixed set of attribute types that alter the descriptor itself instead
/// of being stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PseudoAttributeKind {
    MethodImpl,
    DllImport,
    PreserveSig,
    SpecialName,
    SuppressUnmanagedCodeSecurity,
}

/// Declaring-type identity to pseudo-attribute kind, resolved once per apply.
const PSEUDO_ATTRIBUTES: &[(&str, PseudoAttributeKind)] = &[
    (
        "System.Runtime.CompilerServices.MethodImplAttribute",
        PseudoAttributeKind::MethodImpl,
    ),
    (
        "System.Runtime.InteropServices.DllImportAttribute",
        PseudoAttributeKind::DllImport,
    ),
    (
        "System.Runtime.InteropServices.PreserveSigAttribute",
        PseudoAttributeKind::PreserveSig,
    ),
    (
        "System.Runtime.CompilerServices.SpecialNameAttribute",
        PseudoAttributeKind::SpecialName,
    ),
    (
        "System.Security.SuppressUnmanagedCodeSecurityAttribute",
        PseudoAttributeKind::SuppressUnmanagedCodeSecurity,
    ),
];

impl PseudoAttributeKind {
    fn resolve(declaring_type: &str) -> Option<Self> {
        PSEUDO_ATTRIBUTES
            .iter()
            .find(|(name, _)| *name == declaring_type)
            .map(|(_, kind)| *kind)
    }
}

/// Custom modifier lists accepted by [`MethodDefBuilder::set_signature`].
///
/// Stored for completeness and readable afterwards, but not threaded into
/// the encoded signature blob; see `set_signature` for the limitation.
#[derive(Debug, Clone, Default)]
pub struct SignatureModifiers {
    /// Required custom modifiers of the return type
    pub return_required: Vec<TypeSignature>,
    /// Optional custom modifiers of the return type
    pub return_optional: Vec<TypeSignature>,
    /// Required custom modifiers per parameter
    pub param_required: Vec<Vec<TypeSignature>>,
    /// Optional custom modifiers per parameter
    pub param_optional: Vec<Vec<TypeSignature>>,
}

/// Builder for one method of a type under construction.
///
/// Created by and owned by its declaring type builder for the lifetime of
/// the in-progress module; the module finalizer receives a read-only view
/// plus the one-shot [`finalize`](MethodDefBuilder::finalize) call.
///
/// # Examples
///
/// ```rust
/// use dotforge::metadata::emit::MethodDefBuilder;
/// use dotforge::metadata::method::{CallingConventions, MethodAttributes};
/// use dotforge::metadata::signatures::TypeSignature;
/// use dotforge::metadata::token::Token;
/// use dotforge::metadata::typesystem::TypeUniverse;
///
/// let universe = TypeUniverse::new();
/// let mut method = MethodDefBuilder::new(
///     "Add",
///     Token::new(0x0200_0001),
///     MethodAttributes::PUBLIC | MethodAttributes::STATIC,
///     CallingConventions::STANDARD,
///     Some(TypeSignature::I4),
///     Some(vec![TypeSignature::I4, TypeSignature::I4]),
///     &universe,
/// )?;
///
/// let body = method.request_body(16)?;
/// body.emit(&[0x02, 0x03, 0x58, 0x2A]); // ldarg.0 ldarg.1 add ret
///
/// let blob = method.signature_blob()?;
/// assert_eq!(blob, vec![0x00, 0x02, 0x08, 0x08, 0x08]);
/// # Ok::<(), dotforge::Error>(())
/// ```
pub struct MethodDefBuilder {
    name: String,
    declaring_type: Token,
    attributes: MethodAttributes,
    calling_conventions: CallingConventions,
    impl_flags: MethodImplAttributes,
    return_type: TypeSignature,
    parameter_types: Option<Vec<TypeSignature>>,
    parameters: Option<Vec<Option<ParamBuilder>>>,
    generic_params: Option<Vec<GenericParamBuilder>>,
    signature_modifiers: SignatureModifiers,
    pinvoke: Option<PInvokeData>,
    custom_attributes: Vec<CustomAttributeWrapper>,
    body: Option<MethodBodyStream>,
    init_locals: bool,
    token: Option<Token>,
}

impl MethodDefBuilder {
    /// Creates a descriptor for a method named `name` on `declaring_type`.
    ///
    /// The return type defaults to the universe's void-equivalent when not
    /// supplied; the parameter descriptor table is allocated one slot larger
    /// than the parameter list (slot 0 annotates the return value).
    /// Implementation flags start as IL and locals default to zero-initialized.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] for an empty name or for a
    /// parameter/return type sequence containing the undefined placeholder.
    pub fn new(
        name: &str,
        declaring_type: Token,
        attributes: MethodAttributes,
        calling_conventions: CallingConventions,
        return_type: Option<TypeSignature>,
        parameter_types: Option<Vec<TypeSignature>>,
        universe: &TypeUniverse,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "method name must not be empty".to_string(),
            ));
        }

        if let Some(types) = &parameter_types {
            validate_defined(types)?;
        }

        if let Some(return_type) = &return_type {
            if return_type.is_unknown() {
                return Err(Error::InvalidArgument(
                    "return type must not be the undefined placeholder".to_string(),
                ));
            }
        }

        let parameters = parameter_types
            .as_ref()
            .map(|types| vec![None; types.len() + 1]);

        Ok(MethodDefBuilder {
            name: name.to_string(),
            declaring_type,
            attributes,
            calling_conventions,
            impl_flags: MethodImplAttributes::IL,
            return_type: return_type.unwrap_or_else(|| universe.void()),
            parameter_types,
            parameters,
            generic_params: None,
            signature_modifiers: SignatureModifiers::default(),
            pinvoke: None,
            custom_attributes: Vec::new(),
            body: None,
            init_locals: true,
            token: None,
        })
    }

    /// Declares the method's generic parameters, turning it into a generic
    /// definition.
    ///
    /// Ordinal positions are assigned 0..n-1 in input order and the set is
    /// frozen: any further call fails, and the first call's assignment stays
    /// queryable through [`generic_arguments`](Self::generic_arguments).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidState`] if generic parameters were
    /// already defined or the shape is frozen, and
    /// [`crate::Error::InvalidArgument`] for an empty name.
    pub fn define_generic_parameters(&mut self, names: &[&str]) -> Result<&[GenericParamBuilder]> {
        self.ensure_shape_mutable("define generic parameters")?;

        if self.generic_params.is_some() {
            return Err(Error::InvalidState(
                "generic parameters were already defined for this method".to_string(),
            ));
        }

        if let Some(index) = names.iter().position(|name| name.is_empty()) {
            return Err(Error::InvalidArgument(format!(
                "generic parameter name at index {index} is empty"
            )));
        }

        let params = names
            .iter()
            .enumerate()
            .map(|(position, name)| GenericParamBuilder::new(name, position as u32))
            .collect();

        Ok(self.generic_params.insert(params))
    }

    /// Defines name and flags for the parameter at `position`.
    ///
    /// Position 0 annotates the return value and is always accepted,
    /// regardless of arity. Reserved attribute bits are stripped before the
    /// descriptor is stored. The parameter table grows to a single slot when
    /// a zero-arity method defines only its return-value annotation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfRange`] if `position` exceeds the
    /// declared parameter count, and [`crate::Error::InvalidState`] after
    /// finalization.
    pub fn define_parameter(
        &mut self,
        position: usize,
        attributes: u32,
        name: Option<&str>,
    ) -> Result<&ParamBuilder> {
        self.ensure_not_finalized("define a parameter")?;

        let count = self.parameter_count();
        if position > 0 && position > count {
            return Err(Error::OutOfRange { position, count });
        }

        let parameters = self.parameters.get_or_insert_with(|| vec![None; 1]);
        let parameter = ParamBuilder::new(position, attributes, name);

        Ok(parameters[position].insert(parameter))
    }

    /// Returns the instruction sink for this method's body, creating it on
    /// first request.
    ///
    /// Idempotent: every call returns the same stream, so locals declared
    /// through an earlier request stay visible. `size_hint` pre-sizes the
    /// code buffer on the first request and is ignored afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidState`] if the descriptor is an open
    /// generic instantiation, the implementation code type is not IL, the
    /// unmanaged bit is set, the method is a P/Invoke import, or the method
    /// is abstract.
    pub fn request_body(&mut self, size_hint: usize) -> Result<&mut MethodBodyStream> {
        self.ensure_not_finalized("request a body")?;
        self.ensure_closed_generic()?;

        if self.impl_flags.code_type() != MethodImplCodeType::IL
            || self.impl_flags.contains(MethodImplAttributes::UNMANAGED)
            || self.attributes.contains(MethodAttributes::PINVOKE_IMPL)
        {
            return Err(Error::InvalidState(
                "method implementation kind does not admit a bytecode body".to_string(),
            ));
        }

        if self.attributes.contains(MethodAttributes::ABSTRACT) {
            return Err(Error::InvalidState(
                "abstract method cannot carry a body".to_string(),
            ));
        }

        Ok(self
            .body
            .get_or_insert_with(|| MethodBodyStream::with_capacity(size_hint)))
    }

    /// Overwrites the implementation flags.
    ///
    /// No combination validation happens here; the module finalizer may
    /// still reject inconsistent flag sets at bake time.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidState`] after finalization.
    pub fn set_implementation_flags(&mut self, flags: MethodImplAttributes) -> Result<()> {
        self.ensure_not_finalized("set implementation flags")?;
        self.impl_flags = flags;
        Ok(())
    }

    /// Applies a custom attribute to the method.
    ///
    /// A fixed set of pseudo attributes is folded into the descriptor
    /// instead of being stored: method-implementation flags are OR'd in from
    /// the blob, foreign-import data is decoded into P/Invoke metadata,
    /// preserve-signature and special-name set their respective bits, and
    /// the suppress-unmanaged-code-security attribute sets the has-security
    /// bit while *also* being stored verbatim. Everything else is stored
    /// verbatim with its blob untouched.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] / [`crate::Error::OutOfBounds`]
    /// for undecodable special-cased blobs and [`crate::Error::InvalidState`]
    /// when a foreign-import attribute arrives after a body was requested.
    pub fn apply_custom_attribute(
        &mut self,
        ctor: &CustomAttributeCtor,
        blob: &[u8],
    ) -> Result<()> {
        self.ensure_not_finalized("apply a custom attribute")?;

        match PseudoAttributeKind::resolve(&ctor.declaring_type) {
            Some(PseudoAttributeKind::MethodImpl) => {
                if blob.len() < 4 {
                    return Err(malformed_error!(
                        "method-implementation attribute blob too short: {} bytes",
                        blob.len()
                    ));
                }

                let value = u16::from_le_bytes([blob[2], blob[3]]);
                self.impl_flags |= MethodImplAttributes::from_bits_retain(u32::from(value));
                return Ok(());
            }
            Some(PseudoAttributeKind::DllImport) => {
                if self.body.is_some() {
                    return Err(Error::InvalidState(
                        "method with a bytecode body cannot become a P/Invoke import".to_string(),
                    ));
                }

                let decoded = parse_custom_attribute_data(blob, ctor)?;
                let (data, preserve_sig) = PInvokeData::from_custom_attribute(&decoded)?;

                self.pinvoke = Some(data);
                self.attributes |= MethodAttributes::PINVOKE_IMPL;
                if preserve_sig {
                    self.impl_flags |= MethodImplAttributes::PRESERVE_SIG;
                }
                return Ok(());
            }
            Some(PseudoAttributeKind::PreserveSig) => {
                self.impl_flags |= MethodImplAttributes::PRESERVE_SIG;
                return Ok(());
            }
            Some(PseudoAttributeKind::SpecialName) => {
                self.attributes |= MethodAttributes::SPECIAL_NAME;
                return Ok(());
            }
            Some(PseudoAttributeKind::SuppressUnmanagedCodeSecurity) => {
                // Sets the flag and still stores the attribute verbatim
                self.attributes |= MethodAttributes::HAS_SECURITY;
            }
            None => {}
        }

        self.custom_attributes.push(CustomAttributeWrapper {
            ctor: ctor.clone(),
            blob: blob.to_vec(),
        });
        Ok(())
    }

    /// Overwrites parts of the declared signature.
    ///
    /// A `None` argument leaves the corresponding part unchanged. Supplying
    /// parameter types resizes the parameter descriptor table (discarding
    /// previously defined parameter annotations, which belong to the old
    /// shape). Custom modifier lists are stored and readable via
    /// [`signature_modifiers`](Self::signature_modifiers) but do not affect
    /// the encoded signature blob; modifier encoding is a known limitation
    /// of this builder.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] for undefined placeholder
    /// types and [`crate::Error::InvalidState`] once the shape is frozen.
    pub fn set_signature(
        &mut self,
        return_type: Option<TypeSignature>,
        return_required_modifiers: Option<Vec<TypeSignature>>,
        return_optional_modifiers: Option<Vec<TypeSignature>>,
        parameter_types: Option<Vec<TypeSignature>>,
        param_required_modifiers: Option<Vec<Vec<TypeSignature>>>,
        param_optional_modifiers: Option<Vec<Vec<TypeSignature>>>,
    ) -> Result<()> {
        self.ensure_shape_mutable("overwrite the signature")?;

        if let Some(return_type) = &return_type {
            if return_type.is_unknown() {
                return Err(Error::InvalidArgument(
                    "return type must not be the undefined placeholder".to_string(),
                ));
            }
        }

        if let Some(types) = &parameter_types {
            validate_defined(types)?;
        }

        if let Some(return_type) = return_type {
            self.return_type = return_type;
        }

        if let Some(types) = parameter_types {
            self.parameters = Some(vec![None; types.len() + 1]);
            self.parameter_types = Some(types);
        }

        if let Some(modifiers) = return_required_modifiers {
            self.signature_modifiers.return_required = modifiers;
        }
        if let Some(modifiers) = return_optional_modifiers {
            self.signature_modifiers.return_optional = modifiers;
        }
        if let Some(modifiers) = param_required_modifiers {
            self.signature_modifiers.param_required = modifiers;
        }
        if let Some(modifiers) = param_optional_modifiers {
            self.signature_modifiers.param_optional = modifiers;
        }

        Ok(())
    }

    /// Builds the signature model for this method.
    ///
    /// The instance-receiver bit is set when the calling conventions carry
    /// the HasThis/ExplicitThis flags or the attributes lack the static bit;
    /// the vararg kind comes from the VarArgs calling-convention flag; the
    /// generic arity is the declared generic parameter count.
    #[must_use]
    pub fn signature(&self) -> SignatureMethod {
        let receiver_flags = CallingConventions::HAS_THIS | CallingConventions::EXPLICIT_THIS;

        SignatureMethod {
            has_this: self.calling_conventions.intersects(receiver_flags)
                || !self.attributes.contains(MethodAttributes::STATIC),
            explicit_this: self
                .calling_conventions
                .contains(CallingConventions::EXPLICIT_THIS),
            vararg: self
                .calling_conventions
                .contains(CallingConventions::VAR_ARGS),
            param_count_generic: self.generic_arguments().len() as u32,
            return_type: SignatureParameter::by_value(self.return_type.clone()),
            params: self
                .parameter_types
                .iter()
                .flatten()
                .map(|base| SignatureParameter::by_value(base.clone()))
                .collect(),
            ..Default::default()
        }
    }

    /// Encodes the method signature blob for the module writer.
    ///
    /// # Errors
    ///
    /// Returns an error if any type in the signature fails to encode.
    pub fn signature_blob(&self) -> Result<Vec<u8>> {
        encode_method_signature(&self.signature())
    }

    /// Assigns the metadata token at module bake time and freezes the
    /// descriptor.
    ///
    /// One-shot and idempotent: the first call wins, later calls are no-ops
    /// returning the already assigned token.
    pub fn finalize(&mut self, token: Token) -> Token {
        *self.token.get_or_insert(token)
    }

    // -- read surface ------------------------------------------------------

    /// The method name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token of the declaring type under construction
    #[must_use]
    pub fn declaring_type(&self) -> Token {
        self.declaring_type
    }

    /// The method attributes, including bits folded in by pseudo attributes
    #[must_use]
    pub fn attributes(&self) -> MethodAttributes {
        self.attributes
    }

    /// The declared calling conventions
    #[must_use]
    pub fn calling_conventions(&self) -> CallingConventions {
        self.calling_conventions
    }

    /// The implementation flags
    #[must_use]
    pub fn implementation_flags(&self) -> MethodImplAttributes {
        self.impl_flags
    }

    /// The declared return type
    #[must_use]
    pub fn return_type(&self) -> &TypeSignature {
        &self.return_type
    }

    /// The declared parameter count
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.parameter_types.as_ref().map_or(0, Vec::len)
    }

    /// The declared parameter types, empty when none were supplied
    #[must_use]
    pub fn parameter_types(&self) -> &[TypeSignature] {
        self.parameter_types.as_deref().unwrap_or_default()
    }

    /// The parameter descriptor at `position`, if one was defined
    #[must_use]
    pub fn parameter(&self, position: usize) -> Option<&ParamBuilder> {
        self.parameters
            .as_ref()
            .and_then(|parameters| parameters.get(position))
            .and_then(Option::as_ref)
    }

    /// The declared generic parameters, empty for non-generic methods
    #[must_use]
    pub fn generic_arguments(&self) -> &[GenericParamBuilder] {
        self.generic_params.as_deref().unwrap_or_default()
    }

    /// Whether the method declares generic parameters
    #[must_use]
    pub fn is_generic_method(&self) -> bool {
        self.generic_params.is_some()
    }

    /// Whether this descriptor is the canonical generic definition
    #[must_use]
    pub fn is_generic_method_definition(&self) -> bool {
        self.generic_params.is_some()
    }

    /// The canonical generic definition of this method.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidState`] when the method is not generic.
    pub fn generic_method_definition(&self) -> Result<&Self> {
        if !self.is_generic_method() {
            return Err(Error::InvalidState(
                "method declares no generic parameters".to_string(),
            ));
        }
        Ok(self)
    }

    /// The decoded P/Invoke import data, if a foreign-import attribute was applied
    #[must_use]
    pub fn pinvoke_data(&self) -> Option<&PInvokeData> {
        self.pinvoke.as_ref()
    }

    /// The verbatim-stored custom attributes
    #[must_use]
    pub fn custom_attributes(&self) -> &[CustomAttributeWrapper] {
        &self.custom_attributes
    }

    /// The custom modifier lists accepted by [`set_signature`](Self::set_signature)
    #[must_use]
    pub fn signature_modifiers(&self) -> &SignatureModifiers {
        &self.signature_modifiers
    }

    /// Read-only view of the body stream, if one was requested
    #[must_use]
    pub fn body(&self) -> Option<&MethodBodyStream> {
        self.body.as_ref()
    }

    /// Whether locals are zero-initialized on entry
    #[must_use]
    pub fn init_locals(&self) -> bool {
        self.init_locals
    }

    /// Sets whether locals are zero-initialized on entry.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidState`] on an open generic instantiation.
    pub fn set_init_locals(&mut self, value: bool) -> Result<()> {
        self.ensure_closed_generic()?;
        self.init_locals = value;
        Ok(())
    }

    /// The assigned metadata token, present only after finalization
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        self.token
    }

    // -- operations a descriptor under construction cannot serve -----------

    /// Invoking a method requires it to be loaded by a runtime.
    ///
    /// # Errors
    ///
    /// Always returns [`crate::Error::NotSupported`].
    pub fn invoke(&self) -> Result<()> {
        Err(Error::NotSupported(
            "invocation requires the module to be baked and loaded",
        ))
    }

    /// A callable native handle only exists once the module is loaded.
    ///
    /// # Errors
    ///
    /// Always returns [`crate::Error::NotSupported`].
    pub fn native_handle(&self) -> Result<usize> {
        Err(Error::NotSupported(
            "a callable handle only exists for a loaded method",
        ))
    }

    /// Enumerating attributes across the inheritance chain needs loaded
    /// reflection metadata.
    ///
    /// # Errors
    ///
    /// Always returns [`crate::Error::NotSupported`].
    pub fn inherited_custom_attributes(&self) -> Result<Vec<CustomAttributeWrapper>> {
        Err(Error::NotSupported(
            "inherited attribute enumeration requires loaded reflection metadata",
        ))
    }

    /// Binding generic arguments produces a constructed method, which only a
    /// loaded runtime can represent.
    ///
    /// # Errors
    ///
    /// Always returns [`crate::Error::NotSupported`].
    pub fn make_generic_method(&self, _type_arguments: &[TypeSignature]) -> Result<()> {
        Err(Error::NotSupported(
            "constructing a closed generic method requires a loaded module",
        ))
    }

    /// Whether unbound generic parameters occur anywhere in the signature;
    /// answering this requires resolved types.
    ///
    /// # Errors
    ///
    /// Always returns [`crate::Error::NotSupported`].
    pub fn contains_generic_parameters(&self) -> Result<bool> {
        Err(Error::NotSupported(
            "generic parameter containment is resolved at load time",
        ))
    }

    // -- state machine helpers ---------------------------------------------

    fn ensure_not_finalized(&self, operation: &str) -> Result<()> {
        if self.token.is_some() {
            return Err(Error::InvalidState(format!(
                "cannot {operation}: the descriptor was finalized"
            )));
        }
        Ok(())
    }

    fn ensure_shape_mutable(&self, operation: &str) -> Result<()> {
        self.ensure_not_finalized(operation)?;
        if self.body.is_some() {
            return Err(Error::InvalidState(format!(
                "cannot {operation}: a body was already requested"
            )));
        }
        Ok(())
    }

    fn ensure_closed_generic(&self) -> Result<()> {
        if self.is_generic_method() && !self.is_generic_method_definition() {
            return Err(Error::InvalidState(
                "operation is not valid on an open generic instantiation".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_defined(types: &[TypeSignature]) -> Result<()> {
    for (index, signature) in types.iter().enumerate() {
        if signature.is_unknown() {
            return Err(Error::InvalidArgument(format!(
                "parameter type at index {index} is undefined"
            )));
        }
    }
    Ok(())
}
