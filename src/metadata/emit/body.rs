//! Method body stream and local variable descriptors.
//!
//! [`MethodBodyStream`] is the instruction sink a method descriptor hands out
//! from [`crate::metadata::emit::MethodDefBuilder::request_body`]. The
//! instruction encoder appends raw encoded instructions to it and declares
//! locals through it; the stream is the single mutator of every
//! [`LocalBuilder`] it creates, including the live byte-ranges driven by
//! lexical scope tracking.

use crate::{
    metadata::signatures::{
        encode_local_var_signature, SignatureLocalVariable, SignatureLocalVariables,
        TypeSignature,
    },
    Error, Result,
};

/// Descriptor for one local variable declared inside a method body.
///
/// A passive record: slot index and pinned-ness are fixed at declaration,
/// the name and live byte-range are filled in by the owning
/// [`MethodBodyStream`] as code is appended. Both range offsets read 0 until
/// the stream has set them; `end_offset` is only meaningful once the
/// enclosing lexical scope has closed.
#[derive(Debug, Clone)]
pub struct LocalBuilder {
    local_type: TypeSignature,
    is_pinned: bool,
    index: u16,
    name: Option<String>,
    start_offset: u32,
    end_offset: u32,
    scope_closed: bool,
}

impl LocalBuilder {
    /// The type of this local variable
    #[must_use]
    pub fn local_type(&self) -> &TypeSignature {
        &self.local_type
    }

    /// Whether the local pins its referent for the garbage collector
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.is_pinned
    }

    /// The slot index within the declaring body (0-based, creation order)
    #[must_use]
    pub fn local_index(&self) -> u16 {
        self.index
    }

    /// The debug name, if one was assigned
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Byte offset at which the local became lexically visible
    #[must_use]
    pub fn start_offset(&self) -> u32 {
        self.start_offset
    }

    /// Byte offset at which the local's enclosing scope closed; 0 until then
    #[must_use]
    pub fn end_offset(&self) -> u32 {
        self.end_offset
    }
}

/// Tracks the locals declared while a lexical scope was innermost.
struct ScopeFrame {
    first_local: usize,
}

/// The instruction sink for one method body.
///
/// Owns the encoded instruction bytes, the local variable descriptors, and
/// the lexical scope stack that drives local live-ranges. Obtained from
/// [`crate::metadata::emit::MethodDefBuilder::request_body`], which returns
/// the same stream on every call.
pub struct MethodBodyStream {
    code: Vec<u8>,
    locals: Vec<LocalBuilder>,
    scopes: Vec<ScopeFrame>,
}

impl MethodBodyStream {
    pub(crate) fn with_capacity(size_hint: usize) -> Self {
        MethodBodyStream {
            code: Vec::with_capacity(size_hint),
            locals: Vec::new(),
            scopes: Vec::new(),
        }
    }

    /// Appends raw encoded instruction bytes to the stream.
    pub fn emit(&mut self, bytes: &[u8]) {
        self.code.extend_from_slice(bytes);
    }

    /// The current byte offset into the instruction stream.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.code.len() as u32
    }

    /// The encoded instruction bytes appended so far.
    #[must_use]
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Declares a local variable, returning its slot index.
    ///
    /// Slots are assigned monotonically in creation order starting at 0 and
    /// are never reused within one body. The local becomes lexically visible
    /// at the current byte offset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] for the undefined
    /// placeholder type and [`crate::Error::InvalidState`] once all 65536
    /// slots are taken.
    pub fn declare_local(&mut self, local_type: TypeSignature, pinned: bool) -> Result<u16> {
        if local_type.is_unknown() {
            return Err(Error::InvalidArgument(
                "local variable type must be defined".to_string(),
            ));
        }

        let index = u16::try_from(self.locals.len()).map_err(|_| {
            Error::InvalidState("method body already declares 65536 locals".to_string())
        })?;

        self.locals.push(LocalBuilder {
            local_type,
            is_pinned: pinned,
            index,
            name: None,
            start_offset: self.offset(),
            end_offset: 0,
            scope_closed: false,
        });

        Ok(index)
    }

    /// Assigns a debug name to a declared local.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfRange`] if no local occupies the slot.
    pub fn name_local(&mut self, index: u16, name: &str) -> Result<()> {
        let count = self.locals.len();
        match self.locals.get_mut(usize::from(index)) {
            Some(local) => {
                local.name = Some(name.to_string());
                Ok(())
            }
            None => Err(Error::OutOfRange {
                position: usize::from(index),
                count,
            }),
        }
    }

    /// Opens a lexical scope at the current byte offset.
    pub fn begin_scope(&mut self) {
        self.scopes.push(ScopeFrame {
            first_local: self.locals.len(),
        });
    }

    /// Closes the innermost lexical scope at the current byte offset.
    ///
    /// Every local declared inside the scope (and not already closed by a
    /// nested scope) gets its live-range end stamped with the current offset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidState`] if no scope is open.
    pub fn end_scope(&mut self) -> Result<()> {
        let frame = self
            .scopes
            .pop()
            .ok_or_else(|| Error::InvalidState("no lexical scope is open".to_string()))?;

        let offset = self.offset();
        for local in &mut self.locals[frame.first_local..] {
            if !local.scope_closed {
                local.end_offset = offset;
                local.scope_closed = true;
            }
        }

        Ok(())
    }

    /// The local occupying the given slot, if any.
    #[must_use]
    pub fn local(&self, index: u16) -> Option<&LocalBuilder> {
        self.locals.get(usize::from(index))
    }

    /// All declared locals in slot order.
    #[must_use]
    pub fn locals(&self) -> &[LocalBuilder] {
        &self.locals
    }

    /// Number of declared locals.
    #[must_use]
    pub fn local_count(&self) -> usize {
        self.locals.len()
    }

    /// Builds the local variable signature for the StandAloneSig table.
    #[must_use]
    pub fn local_signature(&self) -> SignatureLocalVariables {
        SignatureLocalVariables {
            locals: self
                .locals
                .iter()
                .map(|local| SignatureLocalVariable {
                    modifiers: Vec::new(),
                    is_byref: false,
                    is_pinned: local.is_pinned,
                    base: local.local_type.clone(),
                })
                .collect(),
        }
    }

    /// Encodes the local variable signature blob for the module writer.
    ///
    /// # Errors
    ///
    /// Returns an error if any local type fails to encode.
    pub fn local_signature_blob(&self) -> Result<Vec<u8>> {
        encode_local_var_signature(&self.local_signature())
    }
}
