//! Naming Errors

use thiserror::Error;

/// Error during name encoding or identifier packing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    #[error("name contains an empty label: {0:?}")]
    EmptyLabel(String),

    #[error("label of {len} bytes does not fit the wire format even when escaped")]
    LabelTooLong { len: usize },

    #[error("flag bits {flags:#04x} exceed the permitted width (mask {mask:#04x})")]
    InvalidFlags { flags: u8, mask: u8 },

    #[error("wire name truncated at offset {0}")]
    Truncated(usize),

    #[error("wire name missing its zero-length terminator")]
    MissingTerminator,

    #[error("wire name has {0} trailing bytes after the terminator")]
    TrailingBytes(usize),

    #[error("label at offset {0} is not valid UTF-8")]
    InvalidUtf8(usize),
}

/// Result type for naming operations
pub type NamingResult<T> = Result<T, NamingError>;
