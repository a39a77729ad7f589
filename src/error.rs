//! Error types for encoding and decoding.

use thiserror::Error;

/// Errors raised while decoding wire bytes.
///
/// Unknown field tags and unknown payload types are deliberately *not*
/// errors; they are skipped or surfaced undecoded. Everything here is a hard
/// failure: no partial record is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A field key carried a wire type outside `0..=5`.
    #[error("invalid 'wire type' value: {value}")]
    InvalidWireType { value: u8 },

    /// A field key carried a tag outside the valid range.
    #[error("field tag out of range")]
    TagOutOfRange,

    /// A varint ran past its maximum group count or overflowed its width.
    #[error("invalid leb128 varint")]
    InvalidVarint,

    /// A fixed-width or length-delimited read ran past the end of the input.
    #[error("unexpected end of buffer")]
    UnexpectedEndOfBuffer,

    /// A length prefix does not fit in `usize`.
    #[error("length prefix {value} exceeds platform addressable memory")]
    LengthOverflow { value: u64 },

    /// A string field held bytes that are not valid UTF-8.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    /// A start-group key was never closed before the end of its range.
    #[error("group field not closed before end of input")]
    UnterminatedGroup,

    /// Message nesting (or a group skip-chain) exceeded the depth limit.
    #[error("message nesting exceeds the depth limit of {limit}")]
    DepthLimitExceeded { limit: u32 },

    /// A packed repeated field declared a non-scalar or length-delimited
    /// element type.
    #[error("packed repeated fields require a fixed-width or varint scalar element")]
    InvalidPackedElement,

    /// A repeated field declared a repeated or map element type.
    #[error("repeated field elements must be scalars, wrappers, or messages")]
    InvalidRepeatedElement,

    /// A map entry decoded a key of a kind that cannot index a map.
    #[error("{kind} values cannot be used as map keys")]
    InvalidMapKey { kind: &'static str },
}

/// Errors raised while encoding a record.
///
/// Absent optional values are never an error; they are omitted from the
/// output entirely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A present value's variant does not match its descriptor's type.
    #[error("field '{field}' expected a {expected} value")]
    TypeMismatch { field: String, expected: &'static str },

    /// A packed repeated field declared a non-scalar or length-delimited
    /// element type.
    #[error("packed repeated fields require a fixed-width or varint scalar element")]
    InvalidPackedElement,

    /// A repeated field declared a repeated or map element type.
    #[error("repeated field elements must be scalars, wrappers, or messages")]
    InvalidRepeatedElement,

    /// No inner schema is registered for the envelope's payload type.
    #[error("no payload schema registered for payload type {payload_type}")]
    UnknownPayloadType { payload_type: u32 },
}
