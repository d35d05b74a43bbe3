//! Error types for decoding operations.

use std::fmt;

/// Errors that can occur while decoding part definitions and mesh files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The XML could not be parsed, even after normalization.
    MalformedXml {
        /// Byte position reported by the XML reader.
        position: u64,
        detail: String,
    },
    /// The document has no element with the required root name.
    MissingRootElement { expected: &'static str },
    /// An attribute on an element could not be parsed as the expected type.
    InvalidAttribute {
        element: &'static str,
        attribute: String,
        value: String,
    },
    /// A read ran past the end of the buffer.
    Truncated {
        /// Offset the read started at.
        offset: usize,
        /// Number of bytes the read needed.
        needed: usize,
        /// Total buffer length.
        len: usize,
    },
    /// Index out of bounds.
    IndexOutOfBounds { index: usize, len: usize },
    /// Invalid data format or structure.
    InvalidFormat {
        context: &'static str,
        detail: String,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedXml { position, detail } => {
                write!(f, "malformed xml at byte {position}: {detail}")
            }
            Self::MissingRootElement { expected } => {
                write!(f, "no <{expected}> element found")
            }
            Self::InvalidAttribute {
                element,
                attribute,
                value,
            } => {
                write!(f, "invalid value {value:?} for {element}.{attribute}")
            }
            Self::Truncated { offset, needed, len } => {
                write!(
                    f,
                    "truncated asset: read of {needed} bytes at offset {offset} exceeds length {len}"
                )
            }
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::InvalidFormat { context, detail } => {
                write!(f, "invalid format in {context}: {detail}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
