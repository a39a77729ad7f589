//! Scalar wire codecs, dispatched by kind.
//!
//! Everything bottoms out here: varints (with zigzag for the `sint` kinds),
//! little-endian fixed-width integers, IEEE-754 float/double bit patterns,
//! and length-delimited string/bytes payloads.

use bytes::{Buf, BufMut, Bytes};

use crate::descriptor::ScalarKind;
use crate::error::{DecodeError, EncodeError};
use crate::leb128::LebCodec;
use crate::value::Value;
use crate::wire::{self, WireType};

/// Wire type a scalar kind is encoded with.
pub(crate) const fn wire_type(kind: ScalarKind) -> WireType {
    match kind {
        ScalarKind::Int32
        | ScalarKind::Int64
        | ScalarKind::Uint32
        | ScalarKind::Uint64
        | ScalarKind::Sint32
        | ScalarKind::Sint64
        | ScalarKind::Bool
        | ScalarKind::Enum => WireType::Varint,
        ScalarKind::Fixed64 | ScalarKind::Sfixed64 | ScalarKind::Double => WireType::I64,
        ScalarKind::String | ScalarKind::Bytes => WireType::Len,
        ScalarKind::Fixed32 | ScalarKind::Sfixed32 | ScalarKind::Float => WireType::I32,
    }
}

#[inline]
pub(crate) const fn zigzag_encode_32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

#[inline]
pub(crate) const fn zigzag_decode_32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ (-((n & 1) as i32))
}

#[inline]
pub(crate) const fn zigzag_encode_64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[inline]
pub(crate) const fn zigzag_decode_64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ (-((n & 1) as i64))
}

/// Encodes a scalar payload (no field key) for the given kind.
///
/// `field` only feeds the error message when the value's variant does not
/// match the declared kind.
pub(crate) fn encode_scalar<B: BufMut>(
    field: &str,
    kind: ScalarKind,
    value: &Value,
    buf: &mut B,
) -> Result<(), EncodeError> {
    match (kind, value) {
        (ScalarKind::Double, Value::F64(v)) => buf.put_f64_le(*v),
        (ScalarKind::Float, Value::F32(v)) => buf.put_f32_le(*v),
        // int32 sign-extends to 64 bits before encoding, so negative values
        // take the full ten-byte varint.
        (ScalarKind::Int32, Value::I32(v)) => {
            ((*v as i64) as u64).encode_leb128(buf);
        }
        (ScalarKind::Int64, Value::I64(v)) => {
            (*v as u64).encode_leb128(buf);
        }
        (ScalarKind::Uint32, Value::U32(v)) | (ScalarKind::Enum, Value::U32(v)) => {
            u64::from(*v).encode_leb128(buf);
        }
        (ScalarKind::Uint64, Value::U64(v)) => {
            (*v).encode_leb128(buf);
        }
        (ScalarKind::Sint32, Value::I32(v)) => {
            zigzag_encode_32(*v).encode_leb128(buf);
        }
        (ScalarKind::Sint64, Value::I64(v)) => {
            zigzag_encode_64(*v).encode_leb128(buf);
        }
        (ScalarKind::Fixed32, Value::U32(v)) => buf.put_u32_le(*v),
        (ScalarKind::Fixed64, Value::U64(v)) => buf.put_u64_le(*v),
        (ScalarKind::Sfixed32, Value::I32(v)) => buf.put_i32_le(*v),
        (ScalarKind::Sfixed64, Value::I64(v)) => buf.put_i64_le(*v),
        (ScalarKind::Bool, Value::Bool(v)) => buf.put_u8(*v as u8),
        (ScalarKind::String, Value::String(v)) => {
            (v.len() as u64).encode_leb128(buf);
            buf.put_slice(v.as_bytes());
        }
        (ScalarKind::Bytes, Value::Bytes(v)) => {
            (v.len() as u64).encode_leb128(buf);
            buf.put_slice(v);
        }
        (kind, _) => {
            return Err(EncodeError::TypeMismatch {
                field: field.to_owned(),
                expected: expected_variant(kind),
            })
        }
    }
    Ok(())
}

/// Value variant a scalar kind encodes from, for diagnostics.
const fn expected_variant(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Double => "f64",
        ScalarKind::Float => "f32",
        ScalarKind::Int32 | ScalarKind::Sint32 | ScalarKind::Sfixed32 => "i32",
        ScalarKind::Int64 | ScalarKind::Sint64 | ScalarKind::Sfixed64 => "i64",
        ScalarKind::Uint32 | ScalarKind::Fixed32 | ScalarKind::Enum => "u32",
        ScalarKind::Uint64 | ScalarKind::Fixed64 => "u64",
        ScalarKind::Bool => "bool",
        ScalarKind::String => "string",
        ScalarKind::Bytes => "bytes",
    }
}

/// Decodes a scalar payload (field key already consumed) for the given kind.
pub(crate) fn decode_scalar<B: Buf>(kind: ScalarKind, buf: &mut B) -> Result<Value, DecodeError> {
    let value = match kind {
        ScalarKind::Double => {
            check_remaining(buf, 8)?;
            Value::F64(buf.get_f64_le())
        }
        ScalarKind::Float => {
            check_remaining(buf, 4)?;
            Value::F32(buf.get_f32_le())
        }
        // The 32-bit varint kinds read the full 64-bit varint and truncate,
        // matching writers that sign-extend to 64 bits.
        ScalarKind::Int32 => Value::I32(u64::decode_leb128(buf)? as i32),
        ScalarKind::Int64 => Value::I64(u64::decode_leb128(buf)? as i64),
        ScalarKind::Uint32 => Value::U32(u64::decode_leb128(buf)? as u32),
        ScalarKind::Uint64 => Value::U64(u64::decode_leb128(buf)?),
        ScalarKind::Sint32 => Value::I32(zigzag_decode_32(u64::decode_leb128(buf)? as u32)),
        ScalarKind::Sint64 => Value::I64(zigzag_decode_64(u64::decode_leb128(buf)?)),
        ScalarKind::Fixed32 => {
            check_remaining(buf, 4)?;
            Value::U32(buf.get_u32_le())
        }
        ScalarKind::Fixed64 => {
            check_remaining(buf, 8)?;
            Value::U64(buf.get_u64_le())
        }
        ScalarKind::Sfixed32 => {
            check_remaining(buf, 4)?;
            Value::I32(buf.get_i32_le())
        }
        ScalarKind::Sfixed64 => {
            check_remaining(buf, 8)?;
            Value::I64(buf.get_i64_le())
        }
        ScalarKind::Bool => Value::Bool(u64::decode_leb128(buf)? != 0),
        ScalarKind::Enum => Value::U32(u64::decode_leb128(buf)? as u32),
        ScalarKind::String => {
            let bytes = take_delimited(buf)?;
            let text = String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)?;
            Value::String(text)
        }
        ScalarKind::Bytes => Value::Bytes(take_delimited(buf)?),
    };
    Ok(value)
}

fn check_remaining<B: Buf>(buf: &B, needed: usize) -> Result<(), DecodeError> {
    if buf.remaining() < needed {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    Ok(())
}

fn take_delimited<B: Buf>(buf: &mut B) -> Result<Bytes, DecodeError> {
    let len = wire::decode_len(buf)?;
    check_remaining(buf, len)?;
    Ok(buf.copy_to_bytes(len))
}
