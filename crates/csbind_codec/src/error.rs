//! Codec errors.

use thiserror::Error;

/// Result alias used throughout the codec.
pub type CodecResult<T> = Result<T, CodecError>;

/// Failures while turning records into bytes or JSON and back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Floats travel as 64-bit only.
    #[error("float is not encoded in 64 bits")]
    NarrowFloat,

    /// An integer outside the signed 64-bit range.
    #[error("integer does not fit in a signed 64-bit value")]
    IntegerOutOfRange,

    /// Containers nested deeper than the decoder follows.
    #[error("nesting deeper than {max_depth} levels")]
    NestingTooDeep {
        /// Deepest accepted nesting.
        max_depth: usize,
    },

    /// Only definite-length items are accepted.
    #[error("indefinite-length CBOR item")]
    IndefiniteLengthForbidden,

    /// Text was not valid UTF-8.
    #[error("text is not valid UTF-8")]
    InvalidUtf8,

    /// Input ended inside an item.
    #[error("input ended inside an item")]
    UnexpectedEof,

    /// Input was well-formed CBOR but not a canonical record.
    #[error("malformed payload: {message}")]
    InvalidStructure {
        /// What was wrong.
        message: String,
    },

    /// A value kind that has no encoding, or an unknown CBOR item.
    #[error("cannot encode or decode {type_name}")]
    UnsupportedType {
        /// Kind that was refused.
        type_name: String,
    },

    /// Tag 0 text that is not an RFC 3339 timestamp.
    #[error("invalid date/time: {0}")]
    InvalidDateTime(String),

    /// A length prefix larger than the decoder accepts.
    #[error("length {claimed} exceeds limit {max_allowed}")]
    SizeLimitExceeded {
        /// Length found in the input.
        claimed: u64,
        /// Largest accepted length.
        max_allowed: u64,
    },
}

impl CodecError {
    /// Shorthand for [`CodecError::InvalidStructure`].
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Shorthand for [`CodecError::UnsupportedType`].
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }
}
