//! Error types for DDS handling.

use thiserror::Error;

/// Errors that can occur when working with DDS files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] pegtool_common::Error),

    /// A header field holds a value that is not allowed.
    #[error("invalid value in field {field} ({value})")]
    InvalidField { field: &'static str, value: String },
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
            Self::Common(e) => e.field(),
            Self::Io(_) => None,
        }
    }
}

/// Result type for DDS operations.
pub type Result<T> = std::result::Result<T, Error>;
