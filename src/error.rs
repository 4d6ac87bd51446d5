//! Error kinds (spec §7): compilation, runtime, and infrastructure failures
//! are disjoint and map one-to-one onto `Error` variants, the way
//! `examples/jwilger-caxton`'s `CaxtonError` gives each failure class its
//! own `thiserror` variant instead of a single stringly-typed error.

use thiserror::Error;

/// The three disjoint error kinds a validation pipeline can fail with.
#[derive(Debug, Error, Clone)]
pub enum Error {
    /// A rule could not be compiled against the schema it's attached to:
    /// unknown extension, mismatched rule/field types, unresolved oneof
    /// member, or an expression that failed to parse.
    #[error("failed_precondition: {0}")]
    Compilation(String),

    /// A rule compiled cleanly but failed while being evaluated: a
    /// divide-by-zero, a timestamp overflow, or a non-bool/non-string
    /// expression result.
    #[error("invalid_argument: {0}")]
    Runtime(String),

    /// Infrastructure failed: a descriptor could not be located, or a
    /// self-describing submessage could not be unpacked.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// The conformance envelope's outcome name for this error kind
    /// (spec §4.H).
    pub fn status_name(&self) -> &'static str {
        match self {
            Error::Compilation(_) => "compilation_error",
            Error::Runtime(_) => "runtime_error",
            Error::Unexpected(_) => "unexpected_error",
        }
    }

    pub fn compilation(msg: impl Into<String>) -> Self {
        Error::Compilation(msg.into())
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::Runtime(msg.into())
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Error::Unexpected(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<prost_reflect::DescriptorError> for Error {
    fn from(e: prost_reflect::DescriptorError) -> Self {
        Error::Unexpected(format!("descriptor error: {e}"))
    }
}

impl From<prost::DecodeError> for Error {
    fn from(e: prost::DecodeError) -> Self {
        Error::Unexpected(format!("decode error: {e}"))
    }
}
