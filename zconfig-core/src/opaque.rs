use std::fmt;

use prost::bytes::{Buf, BufMut};
use prost::encoding::{encode_key, DecodeContext, WireType};
use prost::{DecodeError, Message};

/// Upper bound on nested groups inside an opaque body.
const MAX_GROUP_NESTING: u32 = 100;
/// A varint never spans more than ten bytes.
const MAX_VARINT_LEN: usize = 10;

/// Storage drive record embedded in `BaseOSConfig.drives`.
///
/// The drive schema belongs to the storage service, so the body is carried
/// verbatim: every field is captured in wire order on decode and re-emitted
/// unchanged on encode. Value bytes are copied as read, non-canonical varints
/// included. When a drive is decoded as part of an enclosing message, prost
/// has already consumed each top-level field key, so those keys are written
/// back in canonical form; [`Drive::from_body`] keeps every byte.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Drive {
    body: Vec<u8>,
}

impl Drive {
    /// Build a drive from an already encoded body, rejecting malformed bytes.
    pub fn from_body(body: &[u8]) -> Result<Self, DecodeError> {
        Self::decode(body)?;
        Ok(Drive {
            body: body.to_vec(),
        })
    }

    /// The encoded fields of this drive, in wire order.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    // Copies one field value (the key has already been written) from `buf` into the body.
    fn capture(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        nesting: u32,
    ) -> Result<(), DecodeError> {
        match wire_type {
            WireType::Varint => {
                self.copy_varint(buf)?;
            }
            WireType::SixtyFourBit => self.copy_exact(buf, 8)?,
            WireType::ThirtyTwoBit => self.copy_exact(buf, 4)?,
            WireType::LengthDelimited => {
                let len = self.copy_varint(buf)?;
                let len = usize::try_from(len)
                    .map_err(|_| DecodeError::new("length delimiter exceeds address space"))?;
                self.copy_exact(buf, len)?;
            }
            WireType::StartGroup => {
                if nesting >= MAX_GROUP_NESTING {
                    return Err(DecodeError::new("recursion limit reached"));
                }
                loop {
                    let (inner_tag, inner_wire_type) = self.copy_key(buf)?;
                    if inner_wire_type == WireType::EndGroup {
                        if inner_tag != tag {
                            return Err(DecodeError::new("unexpected end group tag"));
                        }
                        break;
                    }
                    self.capture(inner_tag, inner_wire_type, buf, nesting + 1)?;
                }
            }
            WireType::EndGroup => return Err(DecodeError::new("unexpected end group tag")),
        }
        Ok(())
    }

    // Copies a varint byte for byte and returns its value.
    fn copy_varint(&mut self, buf: &mut impl Buf) -> Result<u64, DecodeError> {
        let mut value = 0u64;
        for index in 0..MAX_VARINT_LEN {
            if !buf.has_remaining() {
                return Err(DecodeError::new("buffer underflow"));
            }
            let byte = buf.get_u8();
            self.body.push(byte);
            // the tenth byte only has room for the top bit of a u64
            if index == MAX_VARINT_LEN - 1 && byte > 0x01 {
                return Err(DecodeError::new("invalid varint"));
            }
            value |= u64::from(byte & 0x7f) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::new("invalid varint"))
    }

    fn copy_key(&mut self, buf: &mut impl Buf) -> Result<(u32, WireType), DecodeError> {
        let key = self.copy_varint(buf)?;
        if key > u64::from(u32::MAX) {
            return Err(DecodeError::new(format!("invalid key value: {key}")));
        }
        let wire_type = WireType::try_from(key & 0x07)?;
        let tag = (key >> 3) as u32;
        if tag == 0 {
            return Err(DecodeError::new("invalid tag value: 0"));
        }
        Ok((tag, wire_type))
    }

    fn copy_exact(&mut self, buf: &mut impl Buf, len: usize) -> Result<(), DecodeError> {
        if buf.remaining() < len {
            return Err(DecodeError::new("buffer underflow"));
        }
        let start = self.body.len();
        self.body.resize(start + len, 0);
        buf.copy_to_slice(&mut self.body[start..]);
        Ok(())
    }
}

impl fmt::Debug for Drive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drive")
            .field("body_len", &self.body.len())
            .finish()
    }
}

impl Message for Drive {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        buf.put_slice(&self.body);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        _ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        encode_key(tag, wire_type, &mut self.body);
        self.capture(tag, wire_type, buf, 0)
    }

    fn encoded_len(&self) -> usize {
        self.body.len()
    }

    fn clear(&mut self) {
        self.body.clear();
    }
}
