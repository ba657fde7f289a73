//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while converting between values and raw fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// No converter is registered for the declared field type.
    #[error("no converter registered for field type `{type_name}`")]
    UnknownType {
        /// The type tag that was looked up.
        type_name: String,
    },

    /// A raw field could not be parsed into the declared type.
    #[error("cannot parse {raw:?} as `{type_name}`: {message}")]
    InvalidValue {
        /// The declared type tag.
        type_name: String,
        /// The raw field text.
        raw: String,
        /// Why parsing failed.
        message: String,
    },

    /// A value of the wrong variant was handed to a converter or accessor.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The expected value kind.
        expected: &'static str,
        /// The kind actually found.
        found: &'static str,
    },

    /// A row ended in the middle of an escape sequence.
    #[error("row ends with a dangling escape character")]
    DanglingEscape,

    /// A row contained an escape sequence the codec does not produce.
    #[error("unknown escape sequence `\\{0}`")]
    UnknownEscape(char),

    /// The backing data is not valid UTF-8.
    #[error("invalid UTF-8 in row data")]
    InvalidUtf8,
}

impl CodecError {
    /// Create an unknown type error.
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(
        type_name: impl Into<String>,
        raw: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            type_name: type_name.into(),
            raw: raw.into(),
            message: message.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }
}
