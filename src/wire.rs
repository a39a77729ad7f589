//! Field keys and skip logic for the [protobuf](https://protobuf.dev) wire
//! format.

use bytes::{Buf, BufMut};
use static_assertions::const_assert_eq;

use crate::error::DecodeError;
use crate::leb128::LebCodec;
use crate::MAX_NESTING_DEPTH;

/// Minimum value of a protobuf tag.
pub const MINIMUM_TAG_VAL: u32 = 1;
/// Maximum value of a protobuf tag.
pub const MAXIMUM_TAG_VAL: u32 = (1 << 29) - 1;

/// Denotes the layout of a field's payload in an encoded message.
///
/// Messages are a series of key-value pairs. Each key is a varint combining a
/// field tag and a [`WireType`]; the wire type says how large the proceeding
/// payload is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Variable length integer.
    ///
    /// Used for: `int32`, `int64`, `uint32`, `uint64`, `sint32`, `sint64`,
    /// `bool`, `enum`.
    Varint = 0,
    /// 64-bit little-endian payload.
    ///
    /// Used for: `fixed64`, `sfixed64`, `double`.
    I64 = 1,
    /// Length-delimited payload.
    ///
    /// Used for: `string`, `bytes`, nested messages, packed repeated fields.
    Len = 2,
    /// Group start (deprecated encoding; skipped, never produced).
    SGroup = 3,
    /// Group end (deprecated encoding; skipped, never produced).
    EGroup = 4,
    /// 32-bit little-endian payload.
    ///
    /// Used for: `fixed32`, `sfixed32`, `float`.
    I32 = 5,
}

// The skip logic and key validation rely on these exact discriminants; if
// someone reorders the enum this fails to compile.
const_assert_eq!(WireType::Varint as u8, 0);
const_assert_eq!(WireType::I64 as u8, 1);
const_assert_eq!(WireType::Len as u8, 2);
const_assert_eq!(WireType::SGroup as u8, 3);
const_assert_eq!(WireType::EGroup as u8, 4);
const_assert_eq!(WireType::I32 as u8, 5);

impl WireType {
    /// Try to decode a [`WireType`] from the provided raw value.
    fn try_from_val(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::SGroup),
            4 => Ok(WireType::EGroup),
            5 => Ok(WireType::I32),
            _ => Err(DecodeError::InvalidWireType { value }),
        }
    }

    /// Return the raw 3-bit value for this [`WireType`].
    #[inline]
    pub const fn into_val(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for WireType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, DecodeError> {
        WireType::try_from_val(value)
    }
}

/// Encodes the provided tag and wire type as a field key.
///
/// Follows the "Message Structure" section of
/// <https://protobuf.dev/programming-guides/encoding>.
#[inline]
pub fn encode_key<B: BufMut>(wire_type: WireType, tag: u32, buf: &mut B) {
    let key = (tag << 3) | u32::from(wire_type.into_val());
    key.encode_leb128(buf);
}

/// Decodes the field key at the front of `buf` into its wire type and tag.
///
/// Keys always fit in a `u32`: the maximum tag is `2^29 - 1`, so the maximum
/// key value is `u32::MAX`. Both components are validated.
#[inline]
pub fn decode_key<B: Buf>(buf: &mut B) -> Result<(WireType, u32), DecodeError> {
    let raw = u32::decode_leb128(buf)?;
    let wire_type = WireType::try_from_val((raw & 0b111) as u8)?;
    let tag = raw >> 3;
    if !(MINIMUM_TAG_VAL..=MAXIMUM_TAG_VAL).contains(&tag) {
        return Err(DecodeError::TagOutOfRange);
    }
    Ok((wire_type, tag))
}

/// Decodes the length prefix for a length-delimited field.
#[inline]
pub fn decode_len<B: Buf>(buf: &mut B) -> Result<usize, DecodeError> {
    let len = u64::decode_leb128(buf)?;
    usize::try_from(len).map_err(|_| DecodeError::LengthOverflow { value: len })
}

/// Skips over a field value based on its wire type.
///
/// Skipping fields we don't know about is what keeps the format backwards
/// and forwards compatible; the decode engine calls this for every tag that
/// is not in the descriptor table.
pub fn skip_field<B: Buf>(wire_type: WireType, buf: &mut B) -> Result<(), DecodeError> {
    skip_field_at_depth(wire_type, buf, MAX_NESTING_DEPTH)
}

fn skip_field_at_depth<B: Buf>(
    wire_type: WireType,
    buf: &mut B,
    depth: u32,
) -> Result<(), DecodeError> {
    let skip_len = match wire_type {
        WireType::Varint => {
            u64::decode_leb128(buf)?;
            return Ok(());
        }
        WireType::I64 => 8,
        WireType::Len => decode_len(buf)?,
        WireType::SGroup => return skip_group(buf, depth),
        // A bare group-end key carries no payload of its own.
        WireType::EGroup => 0,
        WireType::I32 => 4,
    };

    if buf.remaining() < skip_len {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    buf.advance(skip_len);
    Ok(())
}

/// Skips nested key/value pairs until the group opened by a start-group key
/// is closed by its matching end-group key.
fn skip_group<B: Buf>(buf: &mut B, depth: u32) -> Result<(), DecodeError> {
    if depth == 0 {
        return Err(DecodeError::DepthLimitExceeded {
            limit: MAX_NESTING_DEPTH,
        });
    }
    while buf.has_remaining() {
        let (wire_type, _) = decode_key(buf)?;
        if wire_type == WireType::EGroup {
            return Ok(());
        }
        skip_field_at_depth(wire_type, buf, depth - 1)?;
    }
    Err(DecodeError::UnterminatedGroup)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{
        decode_key, decode_len, encode_key, skip_field, WireType, MAXIMUM_TAG_VAL, MINIMUM_TAG_VAL,
    };
    use crate::error::DecodeError;

    #[test]
    fn proptest_key_roundtrips() {
        fn arb_tag() -> impl Strategy<Value = u32> {
            MINIMUM_TAG_VAL..=MAXIMUM_TAG_VAL
        }

        fn arb_wiretype() -> impl Strategy<Value = WireType> {
            (0..=5u8).prop_map(|val| WireType::try_from(val).expect("known valid"))
        }

        fn test(tag: u32, wire_type: WireType) {
            let mut buf = Vec::with_capacity(8);
            encode_key(wire_type, tag, &mut buf);
            let (rnd_wire_type, rnd_tag) = decode_key(&mut &buf[..]).unwrap();

            assert_eq!(tag, rnd_tag);
            assert_eq!(wire_type, rnd_wire_type);
        }

        let strat = (arb_tag(), arb_wiretype());
        proptest!(|((tag, wire_type) in strat)| test(tag, wire_type))
    }

    #[test]
    fn test_key_validation() {
        // Wire types 6 and 7 do not exist.
        let mut buf = &[(1 << 3) | 6u8][..];
        assert_eq!(
            decode_key(&mut buf),
            Err(DecodeError::InvalidWireType { value: 6 })
        );

        // Tag 0 cannot appear in a valid key.
        let mut buf = &[0u8][..];
        assert_eq!(decode_key(&mut buf), Err(DecodeError::TagOutOfRange));
    }

    #[test]
    fn test_decode_len() {
        // Length 0
        let mut buf = &[0u8][..];
        assert_eq!(decode_len(&mut buf).unwrap(), 0);

        // Length 127 (single byte)
        let mut buf = &[127u8][..];
        assert_eq!(decode_len(&mut buf).unwrap(), 127);

        // Length 128 (two bytes)
        let mut buf = &[0x80, 0x01][..];
        assert_eq!(decode_len(&mut buf).unwrap(), 128);

        // Length 300
        let mut buf = &[0xAC, 0x02][..];
        assert_eq!(decode_len(&mut buf).unwrap(), 300);
    }

    #[test]
    fn test_skip_field_varint() {
        // Skip a 1-byte varint
        let mut buf = &[42u8, 99][..];
        skip_field(WireType::Varint, &mut buf).unwrap();
        assert_eq!(buf, &[99]);

        // Skip a multi-byte varint
        let mut buf = &[0x80, 0x01, 99][..];
        skip_field(WireType::Varint, &mut buf).unwrap();
        assert_eq!(buf, &[99]);
    }

    #[test]
    fn test_skip_field_fixed() {
        // Skip I32
        let mut buf = &[1, 2, 3, 4, 99][..];
        skip_field(WireType::I32, &mut buf).unwrap();
        assert_eq!(buf, &[99]);

        // Skip I64
        let mut buf = &[1, 2, 3, 4, 5, 6, 7, 8, 99][..];
        skip_field(WireType::I64, &mut buf).unwrap();
        assert_eq!(buf, &[99]);

        // Truncated fixed payload
        let mut buf = &[1, 2][..];
        assert_eq!(
            skip_field(WireType::I32, &mut buf),
            Err(DecodeError::UnexpectedEndOfBuffer)
        );
    }

    #[test]
    fn test_skip_field_len() {
        // Skip length-delimited field: length=3, data=[1,2,3]
        let mut buf = &[3, 1, 2, 3, 99][..];
        skip_field(WireType::Len, &mut buf).unwrap();
        assert_eq!(buf, &[99]);

        // Skip empty length-delimited field
        let mut buf = &[0, 99][..];
        skip_field(WireType::Len, &mut buf).unwrap();
        assert_eq!(buf, &[99]);
    }

    #[test]
    fn test_skip_field_group() {
        // Group holding a varint field (tag 1) and a nested group (tag 2).
        let mut buf = Vec::new();
        encode_key(WireType::Varint, 1, &mut buf);
        buf.push(42);
        encode_key(WireType::SGroup, 2, &mut buf);
        encode_key(WireType::EGroup, 2, &mut buf);
        encode_key(WireType::EGroup, 1, &mut buf);
        buf.push(99);

        let mut slice = &buf[..];
        skip_field(WireType::SGroup, &mut slice).unwrap();
        assert_eq!(slice, &[99]);
    }

    #[test]
    fn test_skip_field_unterminated_group() {
        // Start-group content with no matching end-group.
        let mut buf = Vec::new();
        encode_key(WireType::Varint, 1, &mut buf);
        buf.push(42);

        let mut slice = &buf[..];
        assert_eq!(
            skip_field(WireType::SGroup, &mut slice),
            Err(DecodeError::UnterminatedGroup)
        );
    }

    #[test]
    fn test_skip_field_bare_end_group() {
        // A bare end-group key consumes no payload bytes.
        let mut buf = &[99u8][..];
        skip_field(WireType::EGroup, &mut buf).unwrap();
        assert_eq!(buf, &[99]);
    }
}
