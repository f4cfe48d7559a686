//! Convenient re-exports of the most commonly used types and traits.
//!
//! # Example
//!
//! ```rust
//! use dotforge::prelude::*;
//!
//! let universe = TypeUniverse::new();
//! let mut method = MethodDefBuilder::new(
//!     "Add",
//!     Token::new(0x0200_0001),
//!     MethodAttributes::PUBLIC | MethodAttributes::STATIC,
//!     CallingConventions::STANDARD,
//!     Some(TypeSignature::I4),
//!     Some(vec![TypeSignature::I4, TypeSignature::I4]),
//!     &universe,
//! )?;
//! let blob = method.signature_blob()?;
//! # Ok::<(), dotforge::Error>(())
//! ```

pub use crate::{
    metadata::{
        customattributes::{
            CustomAttributeArgument, CustomAttributeCtor, CustomAttributeValue,
            CustomAttributeWrapper,
        },
        emit::{
            GenericParamBuilder, LocalBuilder, MethodBodyStream, MethodDefBuilder,
            PInvokeAttributes, PInvokeData, ParamAttributes, ParamBuilder,
        },
        method::{CallingConventions, MethodAttributes, MethodImplAttributes, MethodImplCodeType},
        signatures::{
            encode_local_var_signature, encode_method_signature, parse_local_var_signature,
            parse_method_signature, SignatureLocalVariables, SignatureMethod, SignatureParameter,
            TypeSignature,
        },
        token::Token,
        typesystem::{CoreTypeId, TypeUniverse},
    },
    Error, Result,
};
