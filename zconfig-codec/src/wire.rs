//! Low-level reading and writing of protobuf tag/value pairs.
//!
//! The reader works over a borrowed slice and reports every failure with the
//! byte offset it happened at; value encoding goes through `prost::encoding`.

use prost::encoding::{decode_varint, encode_key, encode_varint, WireType};
use zconfig_core::schema::{MAX_FIELD_NUMBER, MIN_FIELD_NUMBER};

use crate::errors::{DecodeError, Result};

/// A varint never spans more than ten bytes.
const MAX_VARINT_LEN: usize = 10;

/// Value of a field the schema table does not declare, kept opaquely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnknownValue {
    Varint(u64),
    Fixed64(u64),
    Fixed32(u32),
    LengthDelimited(Vec<u8>),
    /// Raw bytes between the start-group and end-group keys.
    Group(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField {
    number: u32,
    value: UnknownValue,
    // key and value exactly as read; empty for fields built in memory
    raw: Vec<u8>,
}

impl UnknownField {
    pub fn new(number: u32, value: UnknownValue) -> Self {
        UnknownField {
            number,
            value,
            raw: Vec::new(),
        }
    }

    pub(crate) fn from_wire(number: u32, value: UnknownValue, raw: &[u8]) -> Self {
        UnknownField {
            number,
            value,
            raw: raw.to_vec(),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn value(&self) -> &UnknownValue {
        &self.value
    }

    pub fn wire_type(&self) -> WireType {
        match self.value {
            UnknownValue::Varint(_) => WireType::Varint,
            UnknownValue::Fixed64(_) => WireType::SixtyFourBit,
            UnknownValue::Fixed32(_) => WireType::ThirtyTwoBit,
            UnknownValue::LengthDelimited(_) => WireType::LengthDelimited,
            UnknownValue::Group(_) => WireType::StartGroup,
        }
    }

    /// Decoded fields are written back byte for byte, others canonically.
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        if !self.raw.is_empty() {
            buf.extend_from_slice(&self.raw);
            return;
        }
        encode_key(self.number, self.wire_type(), buf);
        match &self.value {
            UnknownValue::Varint(value) => encode_varint(*value, buf),
            UnknownValue::Fixed64(value) => buf.extend_from_slice(&value.to_le_bytes()),
            UnknownValue::Fixed32(value) => buf.extend_from_slice(&value.to_le_bytes()),
            UnknownValue::LengthDelimited(bytes) => write_bytes(bytes, buf),
            UnknownValue::Group(content) => {
                buf.extend_from_slice(content);
                encode_key(self.number, WireType::EndGroup, buf);
            }
        }
    }
}

pub(crate) struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        WireReader { buf, pos: 0 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub(crate) fn offset(&self) -> usize {
        self.pos
    }

    /// Bytes consumed since `start`, an earlier offset of this reader.
    pub(crate) fn consumed_since(&self, start: usize) -> &'a [u8] {
        &self.buf[start..self.pos]
    }

    fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub(crate) fn read_varint(&mut self) -> Result<u64> {
        let rest = self.remaining();
        match rest
            .iter()
            .take(MAX_VARINT_LEN)
            .position(|byte| byte & 0x80 == 0)
        {
            Some(last) => {
                let mut encoded = &rest[..=last];
                let value =
                    decode_varint(&mut encoded).map_err(|_| DecodeError::InvalidVarint(self.pos))?;
                self.pos += last + 1;
                Ok(value)
            }
            None if rest.len() < MAX_VARINT_LEN => Err(DecodeError::Truncated {
                offset: self.buf.len(),
                needed: 1,
            }),
            None => Err(DecodeError::InvalidVarint(self.pos)),
        }
    }

    /// Read a field key, returning its field number and wire type.
    pub(crate) fn read_key(&mut self) -> Result<(u32, WireType)> {
        let offset = self.pos;
        let key = self.read_varint()?;
        let number = key >> 3;
        let wire_type = key & 0x07;

        let wire_type = WireType::try_from(wire_type)
            .map_err(|_| DecodeError::InvalidWireType { offset, wire_type })?;
        match u32::try_from(number) {
            Ok(number) if (MIN_FIELD_NUMBER..=MAX_FIELD_NUMBER).contains(&number) => {
                Ok((number, wire_type))
            }
            _ => Err(DecodeError::InvalidFieldNumber { offset, number }),
        }
    }

    fn read_exact(&mut self, len: usize) -> Result<&'a [u8]> {
        let rest = self.remaining();
        if rest.len() < len {
            return Err(DecodeError::Truncated {
                offset: self.buf.len(),
                needed: len - rest.len(),
            });
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    pub(crate) fn read_fixed32(&mut self) -> Result<u32> {
        let bytes = self.read_exact(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn read_fixed64(&mut self) -> Result<u64> {
        let bytes = self.read_exact(8)?;
        let mut le = [0u8; 8];
        le.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(le))
    }

    /// Read a length-delimited payload.
    pub(crate) fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let offset = self.pos;
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| DecodeError::Truncated {
            offset,
            needed: usize::MAX,
        })?;
        self.read_exact(len)
    }

    /// Consume the value of an undeclared field. `depth` is the nesting depth of
    /// the enclosing message; groups count as one level each.
    pub(crate) fn read_unknown(
        &mut self,
        number: u32,
        wire_type: WireType,
        depth: usize,
        max_depth: usize,
    ) -> Result<UnknownValue> {
        let value = match wire_type {
            WireType::Varint => UnknownValue::Varint(self.read_varint()?),
            WireType::SixtyFourBit => UnknownValue::Fixed64(self.read_fixed64()?),
            WireType::ThirtyTwoBit => UnknownValue::Fixed32(self.read_fixed32()?),
            WireType::LengthDelimited => {
                UnknownValue::LengthDelimited(self.read_bytes()?.to_vec())
            }
            WireType::StartGroup => {
                UnknownValue::Group(self.read_group(number, depth + 1, max_depth)?.to_vec())
            }
            WireType::EndGroup => {
                return Err(DecodeError::UnbalancedGroup {
                    offset: self.pos,
                    number,
                })
            }
        };
        Ok(value)
    }

    // Returns the group content, positioned after the matching end-group key.
    fn read_group(&mut self, number: u32, depth: usize, max_depth: usize) -> Result<&'a [u8]> {
        if depth > max_depth {
            return Err(DecodeError::DepthExceeded(max_depth));
        }
        let start = self.pos;
        loop {
            if self.is_empty() {
                return Err(DecodeError::Truncated {
                    offset: self.buf.len(),
                    needed: 1,
                });
            }
            let key_start = self.pos;
            let (inner_number, wire_type) = self.read_key()?;
            if wire_type == WireType::EndGroup {
                if inner_number != number {
                    return Err(DecodeError::UnbalancedGroup {
                        offset: key_start,
                        number: inner_number,
                    });
                }
                return Ok(&self.buf[start..key_start]);
            }
            self.read_unknown(inner_number, wire_type, depth, max_depth)?;
        }
    }
}

pub(crate) fn write_varint_field(number: u32, value: u64, buf: &mut Vec<u8>) {
    encode_key(number, WireType::Varint, buf);
    encode_varint(value, buf);
}

pub(crate) fn write_bytes_field(number: u32, bytes: &[u8], buf: &mut Vec<u8>) {
    encode_key(number, WireType::LengthDelimited, buf);
    write_bytes(bytes, buf);
}

pub(crate) fn write_bytes(bytes: &[u8], buf: &mut Vec<u8>) {
    encode_varint(bytes.len() as u64, buf);
    buf.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_varint() {
        let mut reader = WireReader::new(&[0xac, 0x02, 0x01]);
        assert_eq!(reader.read_varint().unwrap(), 300);
        assert_eq!(reader.offset(), 2);
        assert_eq!(reader.read_varint().unwrap(), 1);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_truncated_varint() {
        let mut reader = WireReader::new(&[0x80, 0x80]);
        assert!(matches!(
            reader.read_varint(),
            Err(DecodeError::Truncated { offset: 2, .. })
        ));
    }

    #[test]
    fn test_overlong_varint() {
        let mut reader = WireReader::new(&[0xff; 11]);
        assert!(matches!(reader.read_varint(), Err(DecodeError::InvalidVarint(0))));

        // ten bytes, but the last one carries more than the single remaining bit
        let mut bytes = [0xff; 10];
        bytes[9] = 0x02;
        let mut reader = WireReader::new(&bytes);
        assert!(matches!(reader.read_varint(), Err(DecodeError::InvalidVarint(0))));
    }

    #[test]
    fn test_read_key_rejects_field_zero_and_reserved_wire_types() {
        let mut reader = WireReader::new(&[0x02]);
        assert!(matches!(
            reader.read_key(),
            Err(DecodeError::InvalidFieldNumber { number: 0, .. })
        ));

        let mut reader = WireReader::new(&[0x0e]);
        assert!(matches!(
            reader.read_key(),
            Err(DecodeError::InvalidWireType { wire_type: 6, .. })
        ));
    }

    #[test]
    fn test_read_bytes_truncated() {
        let mut reader = WireReader::new(&[0x05, b'a', b'b']);
        assert!(matches!(
            reader.read_bytes(),
            Err(DecodeError::Truncated { needed: 3, .. })
        ));
    }

    #[test]
    fn test_unknown_group_roundtrip() {
        // field 5 start group, field 1 varint 9, field 5 end group
        let bytes = [0x2b, 0x08, 0x09, 0x2c];
        let mut reader = WireReader::new(&bytes);
        let (number, wire_type) = reader.read_key().unwrap();
        let value = reader.read_unknown(number, wire_type, 0, 8).unwrap();
        assert_eq!(value, UnknownValue::Group(vec![0x08, 0x09]));
        assert!(reader.is_empty());

        let mut out = Vec::new();
        UnknownField::new(number, value).encode(&mut out);
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_unknown_field_keeps_wire_bytes() {
        // field 5 varint 1 in two bytes
        let bytes = [0x28, 0x81, 0x00];
        let mut reader = WireReader::new(&bytes);
        let (number, wire_type) = reader.read_key().unwrap();
        let value = reader.read_unknown(number, wire_type, 0, 8).unwrap();
        assert_eq!(value, UnknownValue::Varint(1));

        let mut out = Vec::new();
        UnknownField::from_wire(number, value.clone(), reader.consumed_since(0)).encode(&mut out);
        assert_eq!(out, bytes);

        // built in memory, the same field is written canonically
        let mut out = Vec::new();
        UnknownField::new(number, value).encode(&mut out);
        assert_eq!(out, vec![0x28, 0x01]);
    }

    #[test]
    fn test_unbalanced_group() {
        // field 5 start group closed by field 6 end group
        let bytes = [0x2b, 0x34];
        let mut reader = WireReader::new(&bytes);
        let (number, wire_type) = reader.read_key().unwrap();
        assert!(matches!(
            reader.read_unknown(number, wire_type, 0, 8),
            Err(DecodeError::UnbalancedGroup { number: 6, .. })
        ));
    }

    #[test]
    fn test_nested_groups_respect_depth() {
        // three nested groups on field 1
        let bytes = [0x0b, 0x0b, 0x0b, 0x0c, 0x0c, 0x0c];
        let mut reader = WireReader::new(&bytes);
        let (number, wire_type) = reader.read_key().unwrap();
        assert!(matches!(
            reader.read_unknown(number, wire_type, 0, 2),
            Err(DecodeError::DepthExceeded(2))
        ));

        let mut reader = WireReader::new(&bytes);
        let (number, wire_type) = reader.read_key().unwrap();
        assert!(reader.read_unknown(number, wire_type, 0, 3).is_ok());
    }
}
