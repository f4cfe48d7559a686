//! Metadata model for dynamically emitted .NET methods.
//!
//! The submodules follow the data flow of the builder:
//!
//! - [`token`] - opaque metadata tokens referencing table rows
//! - [`typesystem`] - the core type universe and element-type constants
//! - [`signatures`] - the binary signature model, encoders, and parser
//! - [`method`] - attribute / implementation / calling-convention flags
//! - [`customattributes`] - custom attribute storage and blob decoding
//! - [`emit`] - the method descriptor orchestrator and its satellites

pub mod customattributes;
pub mod emit;
pub mod method;
pub mod signatures;
pub mod token;
pub mod typesystem;
