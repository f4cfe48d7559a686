// Copyright 2025 The dotforge authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
#![allow(clippy::too_many_arguments)]

//! # dotforge
//!
//! A cross-platform framework for dynamically building .NET method metadata,
//! signatures and method bodies. Built in pure Rust, `dotforge` lets a host
//! program assemble method descriptors at run time - name, calling
//! convention, parameter and return types, generic parameters,
//! implementation flags, P/Invoke import data, and custom attributes - and
//! serialize them into the ECMA-335 binary records a module writer consumes.
//!
//! ## Features
//!
//! - **📦 Dynamic method descriptors** - Assemble methods incrementally with
//!   a strict declaration state machine
//! - **🔏 Byte-exact signatures** - Encode method and local variable
//!   signature blobs per ECMA-335 II.23.2, and parse them back
//! - **🧬 Generic definitions** - Set-once generic parameter sets with stable
//!   ordinal assignment
//! - **🔗 P/Invoke support** - Foreign-import attributes decode into ImplMap
//!   flag words and entry point metadata
//! - **🛡️ Memory safe** - Built in Rust with comprehensive error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use dotforge::prelude::*;
//!
//! let universe = TypeUniverse::new();
//!
//! // public static int Add(int a, int b)
//! let mut method = MethodDefBuilder::new(
//!     "Add",
//!     Token::new(0x0200_0001),
//!     MethodAttributes::PUBLIC | MethodAttributes::STATIC,
//!     CallingConventions::STANDARD,
//!     Some(TypeSignature::I4),
//!     Some(vec![TypeSignature::I4, TypeSignature::I4]),
//!     &universe,
//! )?;
//!
//! method.define_parameter(1, ParamAttributes::IN, Some("a"))?;
//! method.define_parameter(2, ParamAttributes::IN, Some("b"))?;
//!
//! // Append a body through the instruction sink
//! let body = method.request_body(8)?;
//! body.emit(&[0x02, 0x03, 0x58, 0x2A]); // ldarg.0 ldarg.1 add ret
//!
//! // The module finalizer assigns the token and reads the blobs
//! let _token = method.finalize(Token::new(0x0600_0001));
//! let signature = method.signature_blob()?;
//! assert_eq!(signature, vec![0x00, 0x02, 0x08, 0x08, 0x08]);
//! # Ok::<(), dotforge::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `dotforge` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types
//! - [`metadata::emit`] - The method descriptor orchestrator, parameter and
//!   generic-parameter bookkeeping, body stream and local variables
//! - [`metadata::signatures`] - Signature model, encoders, and parser
//! - [`metadata::typesystem`] - The core type universe resolver
//! - [`metadata::customattributes`] - Custom attribute storage and decoding
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! ## Standards Compliance
//!
//! `dotforge` follows the **ECMA-335 specification** (6th edition) for the
//! Common Language Infrastructure: signature blob formats (II.23.2), custom
//! attribute encoding (II.23.3), and the method attribute and implementation
//! flag vocabularies (II.23.1).
//!
//! ### References
//!
//! - [ECMA-335 Standard](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf) - Official CLI specification
//! - [.NET Runtime](https://github.com/dotnet/runtime) - Microsoft's reference implementation
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result) with specific failure
//! kinds: builder misuse ([`Error::InvalidState`], [`Error::OutOfRange`],
//! [`Error::InvalidArgument`]), operations that need a loaded runtime
//! ([`Error::NotSupported`]), and blob decoding failures
//! ([`Error::Malformed`], [`Error::OutOfBounds`]). Failures are synchronous
//! and validation precedes any observable mutation.

#[macro_use]
pub(crate) mod error;
pub(crate) mod utils;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dotforge::prelude::*;
///
/// let universe = TypeUniverse::new();
/// assert_eq!(universe.core(CoreTypeId::I4), TypeSignature::I4);
/// ```
pub mod prelude;

/// Definitions and construction of CIL method metadata based on ECMA-335
///
/// This module implements the metadata model for dynamically emitted
/// methods: tokens, the core type universe, the binary signature formats,
/// flag vocabularies, custom attributes, and the builder layer itself.
///
/// # Key Components
///
/// - [`metadata::emit::MethodDefBuilder`] - the method descriptor
/// - [`metadata::signatures`] - signature encoding and parsing
/// - [`metadata::typesystem::TypeUniverse`] - core type resolution
/// - [`metadata::customattributes`] - attribute storage and decoding
pub mod metadata;

/// `dotforge` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is
/// always [`Error`]. This is used consistently throughout the crate for all
/// fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `dotforge` Error type
///
/// The main error type for all operations in this crate. Provides detailed
/// error information for builder misuse, unsupported operations, and blob
/// decoding failures.
pub use error::Error;

/// Main entry point for dynamically constructing a method.
///
/// See [`metadata::emit::MethodDefBuilder`] for the full builder surface.
pub use metadata::emit::MethodDefBuilder;
