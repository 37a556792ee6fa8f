//! Low-level wire format primitives
//!
//! Encoding is infallible: everything is appended to a [`BufMut`], which for
//! `BytesMut` grows as needed.

use bytes::BufMut;
use std::fmt;

/// Wire type of a field, the low three bits of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// Variable-length integer
    Varint = 0,
    /// Little-endian eight bytes
    Fixed64 = 1,
    /// Length prefix followed by that many bytes
    LengthDelimited = 2,
    /// Start of a group (deprecated)
    StartGroup = 3,
    /// End of a group (deprecated)
    EndGroup = 4,
    /// Little-endian four bytes
    Fixed32 = 5,
}

impl WireType {
    /// Decode a wire type from the low bits of a tag
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits & 0x7 {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            3 => Some(WireType::StartGroup),
            4 => Some(WireType::EndGroup),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }
}

/// A field tag: field number and wire type packed as `(field << 3) | type`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireTag(u32);

impl WireTag {
    /// Create a tag for the given field number and wire type
    pub const fn new(field_number: u32, wire_type: WireType) -> Self {
        WireTag((field_number << 3) | wire_type as u32)
    }

    /// The field number
    pub const fn field_number(self) -> u32 {
        self.0 >> 3
    }

    /// The wire type
    pub const fn wire_type(self) -> Option<WireType> {
        WireType::from_bits(self.0)
    }

    /// The raw encoded tag value
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Number of bytes this tag occupies on the wire
    pub const fn encoded_len(self) -> usize {
        varint_size(self.0 as u64)
    }
}

impl fmt::Debug for WireTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireTag")
            .field("field_number", &self.field_number())
            .field("wire_type", &self.wire_type())
            .finish()
    }
}

/// Number of bytes `value` occupies when encoded as a varint
pub const fn varint_size(value: u64) -> usize {
    // 7 payload bits per byte, at least one byte
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Number of bytes a length-delimited payload of `len` bytes occupies,
/// excluding the tag
pub const fn length_delimited_size(len: usize) -> usize {
    varint_size(len as u64) + len
}

/// Append `value` as a base-128 varint
pub fn put_varint<B: BufMut>(buffer: &mut B, mut value: u64) {
    while value >= 0x80 {
        buffer.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buffer.put_u8(value as u8);
}

/// Append a field tag
pub fn put_tag<B: BufMut>(buffer: &mut B, tag: WireTag) {
    put_varint(buffer, u64::from(tag.value()));
}

/// Append a little-endian 64-bit value
pub fn put_fixed64<B: BufMut>(buffer: &mut B, value: u64) {
    buffer.put_u64_le(value);
}

/// Append a length prefix followed by `payload`
pub fn put_length_delimited<B: BufMut>(buffer: &mut B, payload: &[u8]) {
    put_varint(buffer, payload.len() as u64);
    buffer.put_slice(payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_varint_sizes() {
        assert_eq!(varint_size(0), 1);
        assert_eq!(varint_size(1), 1);
        assert_eq!(varint_size(127), 1);
        assert_eq!(varint_size(128), 2);
        assert_eq!(varint_size(16_383), 2);
        assert_eq!(varint_size(16_384), 3);
        assert_eq!(varint_size(u64::MAX), 10);
        // negative int64 values are sign extended
        assert_eq!(varint_size(-1i64 as u64), 10);
    }

    #[test]
    fn test_varint_encoding() {
        let mut buffer = BytesMut::new();
        put_varint(&mut buffer, 300);
        assert_eq!(&buffer[..], &[0xAC, 0x02]);

        let mut buffer = BytesMut::new();
        put_varint(&mut buffer, 0);
        assert_eq!(&buffer[..], &[0x00]);
    }

    #[test]
    fn test_tags() {
        let tag = WireTag::new(1, WireType::Varint);
        assert_eq!(tag.value(), 0x08);
        assert_eq!(tag.field_number(), 1);
        assert_eq!(tag.wire_type(), Some(WireType::Varint));
        assert_eq!(tag.encoded_len(), 1);

        let tag = WireTag::new(2, WireType::Fixed64);
        assert_eq!(tag.value(), 0x11);

        let tag = WireTag::new(16, WireType::LengthDelimited);
        assert_eq!(tag.encoded_len(), 2);
    }

    #[test]
    fn test_length_delimited() {
        let mut buffer = BytesMut::new();
        put_length_delimited(&mut buffer, b"foo");
        assert_eq!(&buffer[..], b"\x03foo");
        assert_eq!(length_delimited_size(3), 4);
        assert_eq!(length_delimited_size(200), 202);
    }

    #[test]
    fn test_fixed64_is_little_endian() {
        let mut buffer = BytesMut::new();
        put_fixed64(&mut buffer, 1.0f64.to_bits());
        assert_eq!(&buffer[..], &[0, 0, 0, 0, 0, 0, 0xF0, 0x3F]);
    }
}
