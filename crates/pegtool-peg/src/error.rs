//! Error types for PEG containers.

use thiserror::Error;

/// Errors that can occur when working with PEG containers.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] pegtool_common::Error),

    /// DDS conversion error.
    #[error("{0}")]
    Dds(#[from] pegtool_dds::Error),

    /// A header or entry field holds a value that is not allowed.
    #[error("invalid value in field {field} ({value})")]
    InvalidField { field: &'static str, value: String },

    /// No entry with the given name.
    #[error("texture not found: {0}")]
    NotFound(String),

    /// The header file extension has no paired data file extension.
    #[error("invalid file extension: expected cvbm_pc or cpeg_pc, got {0:?}")]
    UnknownExtension(String),
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
            Self::Dds(e) => e.field(),
            Self::Io(_) | Self::NotFound(_) | Self::UnknownExtension(_) => None,
        }
    }

    /// Check whether this error was caused by running out of input.
    pub fn is_eof(&self) -> bool {
        match self {
            Self::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            Self::Common(e) => e.is_eof(),
            Self::Dds(pegtool_dds::Error::Common(e)) => e.is_eof(),
            Self::Dds(pegtool_dds::Error::Io(e)) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

/// Result type for PEG operations.
pub type Result<T> = std::result::Result<T, Error>;
