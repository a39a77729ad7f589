//! LEB128 variable-length integer encoding/decoding.

use bytes::{Buf, BufMut};

use crate::error::DecodeError;

/// Integers with a LEB128 wire representation.
///
/// Values are encoded little-endian in groups of 7 bits, with bit 7 of each
/// byte acting as the continuation flag.
pub trait LebCodec: Sized {
    /// Maximum number of encoded bytes for this integer width.
    const MAX_LEB_BYTES: u32;

    /// Decode a LEB128 integer from the front of `buf`, advancing past it.
    fn decode_leb128<B: Buf>(buf: &mut B) -> Result<Self, DecodeError>;

    /// Encode `self` into `buf`, returning the number of bytes written.
    fn encode_leb128<B: BufMut>(self, buf: &mut B) -> usize;
}

impl LebCodec for u64 {
    const MAX_LEB_BYTES: u32 = 10;

    #[inline]
    fn decode_leb128<B: Buf>(buf: &mut B) -> Result<Self, DecodeError> {
        let mut value = 0u64;
        for group in 0..Self::MAX_LEB_BYTES {
            if !buf.has_remaining() {
                return Err(DecodeError::UnexpectedEndOfBuffer);
            }
            let byte = buf.get_u8();
            // The tenth group carries the final bit of a u64; anything above
            // 0x01 either overflows or is missing its terminator.
            if group == Self::MAX_LEB_BYTES - 1 && byte > 0x01 {
                return Err(DecodeError::InvalidVarint);
            }
            value |= u64::from(byte & 0x7f) << (group * 7);
            if byte < 0x80 {
                return Ok(value);
            }
        }
        Err(DecodeError::InvalidVarint)
    }

    #[inline]
    fn encode_leb128<B: BufMut>(self, buf: &mut B) -> usize {
        let mut value = self;
        let mut written = 0;
        loop {
            written += 1;
            if value < 0x80 {
                buf.put_u8(value as u8);
                return written;
            }
            buf.put_u8(value as u8 & 0x7f | 0x80);
            value >>= 7;
        }
    }
}

impl LebCodec for u32 {
    const MAX_LEB_BYTES: u32 = 5;

    #[inline]
    fn decode_leb128<B: Buf>(buf: &mut B) -> Result<Self, DecodeError> {
        let mut value = 0u32;
        for group in 0..Self::MAX_LEB_BYTES {
            if !buf.has_remaining() {
                return Err(DecodeError::UnexpectedEndOfBuffer);
            }
            let byte = buf.get_u8();
            // The fifth group carries the final four bits of a u32.
            if group == Self::MAX_LEB_BYTES - 1 && byte > 0x0f {
                return Err(DecodeError::InvalidVarint);
            }
            value |= u32::from(byte & 0x7f) << (group * 7);
            if byte < 0x80 {
                return Ok(value);
            }
        }
        Err(DecodeError::InvalidVarint)
    }

    #[inline]
    fn encode_leb128<B: BufMut>(self, buf: &mut B) -> usize {
        let mut value = self;
        let mut written = 0;
        loop {
            written += 1;
            if value < 0x80 {
                buf.put_u8(value as u8);
                return written;
            }
            buf.put_u8(value as u8 & 0x7f | 0x80);
            value >>= 7;
        }
    }
}
