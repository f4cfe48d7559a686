//! Dynamic construction of method metadata.
//!
//! This module is the builder core of the crate. [`MethodDefBuilder`] is the
//! orchestrator: created by its declaring type builder, it accumulates the
//! method's shape (signature, parameters, generic parameters), its flags,
//! its custom attributes, and optionally a method body, then serves the
//! module finalizer with encoded signature blobs and a read-only flag
//! surface.
//!
//! # Key Types
//!
//! - [`MethodDefBuilder`] - one method of a type under construction
//! - [`MethodBodyStream`] - the instruction sink returned by
//!   [`MethodDefBuilder::request_body`]
//! - [`LocalBuilder`] - a local variable declared through the body stream
//! - [`ParamBuilder`] / [`GenericParamBuilder`] - parameter bookkeeping
//! - [`PInvokeData`] - decoded foreign-import metadata
//!
//! # Declaration State Machine
//!
//! The shape of a method (return type, parameter types, generic parameters)
//! is mutable only until a body is requested; the whole descriptor freezes
//! once the module finalizer assigns its token. Misuse fails with
//! [`crate::Error::InvalidState`] before any observable state change.

mod body;
mod generics;
mod method;
mod param;
mod pinvoke;

pub use body::{LocalBuilder, MethodBodyStream};
pub use generics::GenericParamBuilder;
pub use method::{MethodDefBuilder, SignatureModifiers};
pub use param::{ParamAttributes, ParamBuilder};
pub use pinvoke::{PInvokeAttributes, PInvokeData};
