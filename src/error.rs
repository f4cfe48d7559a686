use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all failure modes of dynamic method construction: misuse of the
/// declaration state machine, invalid inputs, blob decoding problems, and operations
/// that are only meaningful for a routine that has been loaded by a runtime.
///
/// # Error Categories
///
/// ## Builder Misuse
/// - [`Error::InvalidArgument`] - Invalid input supplied to a builder operation
/// - [`Error::OutOfRange`] - A position or slot index outside the declared shape
/// - [`Error::InvalidState`] - Operation rejected by the declaration state machine
///
/// ## Unsupported Surface
/// - [`Error::NotSupported`] - Operation requires a fully materialized (loaded) routine
///
/// ## Blob Decoding
/// - [`Error::Malformed`] - Corrupted or invalid signature / attribute blob
/// - [`Error::OutOfBounds`] - Attempted to read beyond blob boundaries
///
/// # Examples
///
/// ```rust
/// use dotforge::{Error, metadata::emit::MethodDefBuilder};
/// use dotforge::metadata::method::{CallingConventions, MethodAttributes};
/// use dotforge::metadata::token::Token;
/// use dotforge::metadata::typesystem::TypeUniverse;
///
/// let universe = TypeUniverse::new();
/// let mut method = MethodDefBuilder::new(
///     "Compute",
///     Token::new(0x0200_0001),
///     MethodAttributes::PUBLIC | MethodAttributes::STATIC,
///     CallingConventions::STANDARD,
///     None,
///     None,
///     &universe,
/// )?;
///
/// method.define_generic_parameters(&["T"])?;
/// match method.define_generic_parameters(&["U"]) {
///     Err(Error::InvalidState(msg)) => eprintln!("rejected: {}", msg),
///     _ => unreachable!(),
/// }
/// # Ok::<(), dotforge::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An invalid input was supplied to a builder operation.
    ///
    /// This error occurs when a supplied type sequence contains the undefined
    /// placeholder type, a generic parameter name is empty, or an annotation
    /// blob has an invalid overall shape.
    #[error("Invalid argument - {0}")]
    InvalidArgument(String),

    /// A position or index lies outside the declared shape.
    ///
    /// Raised when a parameter position exceeds the declared parameter count,
    /// or a local variable slot does not exist in the method body.
    #[error("Position {position} is out of range (declared count: {count})")]
    OutOfRange {
        /// The rejected position or slot index
        position: usize,
        /// The declared count the position was checked against
        count: usize,
    },

    /// The declaration state machine rejected the operation.
    ///
    /// Raised when generic parameters are redefined, a body is requested for a
    /// descriptor that must not have one (abstract, P/Invoke, non-IL), or a
    /// mutation arrives after the descriptor has been frozen or finalized.
    #[error("Invalid state - {0}")]
    InvalidState(String),

    /// The operation is only meaningful for a fully materialized routine.
    ///
    /// A descriptor under construction cannot be invoked, cannot hand out a
    /// callable native handle, and cannot enumerate inherited reflection
    /// metadata. These are permanent properties of the builder surface, not
    /// state-machine violations.
    #[error("Not supported for a method still under construction - {0}")]
    NotSupported(&'static str),

    /// A blob is damaged and could not be decoded.
    ///
    /// The error includes the source location where the malformation was
    /// detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while decoding a blob.
    ///
    /// This error occurs when trying to read data beyond the end of a
    /// signature or attribute blob. It's a safety check to prevent overruns
    /// during decoding.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,
}
