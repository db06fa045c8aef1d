//! Error types for pegtool-common.

use thiserror::Error;

/// Common error type for pegtool operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// A decoded or encoded field holds a value that is not allowed.
    #[error("invalid value in field {field} ({value})")]
    InvalidField { field: &'static str, value: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Missing null terminator in string.
    #[error("string missing null terminator")]
    MissingNullTerminator,
}

impl Error {
    /// Build an [`Error::InvalidField`] from a field name and the offending value.
    pub fn invalid_field(field: &'static str, value: impl ToString) -> Self {
        Self::InvalidField {
            field,
            value: value.to_string(),
        }
    }

    /// Name of the offending field, if this is a field error.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidField { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Check whether the error was caused by running out of input.
    pub fn is_eof(&self) -> bool {
        match self {
            Self::UnexpectedEof { .. } | Self::MissingNullTerminator => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
