//! Minimal reader for the protobuf wire format.
//!
//! Only what the migration payload needs is supported: varints, 64/32-bit
//! fixed values (skipped), and length-delimited fields. Groups are rejected.

use crate::error::{MigrationError, Result};

/// Longest legal varint encoding of a u64.
const MAX_VARINT_LEN: usize = 10;
/// Largest field number the wire format allows.
const MAX_FIELD_NUMBER: u64 = (1 << 29) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    Fixed32,
}

impl WireType {
    fn from_raw(raw: u64) -> Result<Self> {
        match raw {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            3 | 4 => Err(MigrationError::malformed("group wire type is not supported")),
            other => Err(MigrationError::malformed(format!(
                "invalid wire type {other}"
            ))),
        }
    }
}

/// Cursor over one message's bytes. Fields must be consumed front to back.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn read_varint(&mut self) -> Result<u64> {
        let mut value: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            let byte = *self
                .buf
                .get(self.pos)
                .ok_or_else(|| MigrationError::malformed("truncated varint"))?;
            self.pos += 1;

            // tenth byte may only carry the single remaining bit
            if i == MAX_VARINT_LEN - 1 && byte > 1 {
                return Err(MigrationError::malformed("varint overflows 64 bits"));
            }

            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(MigrationError::malformed("varint longer than 10 bytes"))
    }

    /// Read a field key, returning (field number, wire type).
    pub fn read_key(&mut self) -> Result<(u32, WireType)> {
        let key = self.read_varint()?;
        let field = key >> 3;
        if field == 0 || field > MAX_FIELD_NUMBER {
            return Err(MigrationError::malformed(format!(
                "invalid field number {field}"
            )));
        }
        let wire_type = WireType::from_raw(key & 0x07)?;
        // bounded by MAX_FIELD_NUMBER above
        let field = u32::try_from(field)
            .map_err(|_| MigrationError::malformed("field number out of range"))?;
        Ok((field, wire_type))
    }

    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()?;
        let len = usize::try_from(len)
            .map_err(|_| MigrationError::malformed("length prefix out of range"))?;
        let buf = self.buf;
        let start = self.pos;
        self.advance(len)?;
        Ok(&buf[start..self.pos])
    }

    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| MigrationError::malformed("text field is not valid UTF-8"))
    }

    /// Skip over the value of an unknown field.
    pub fn skip(&mut self, wire_type: WireType) -> Result<()> {
        match wire_type {
            WireType::Varint => self.read_varint().map(|_| ()),
            WireType::Fixed64 => self.advance(8),
            WireType::LengthDelimited => self.read_bytes().map(|_| ()),
            WireType::Fixed32 => self.advance(4),
        }
    }

    fn advance(&mut self, n: usize) -> Result<()> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                MigrationError::malformed(format!(
                    "field of {n} bytes runs past end of message at offset {}",
                    self.pos
                ))
            })?;
        self.pos = end;
        Ok(())
    }
}

/// Builder for synthetic payloads in tests.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(crate) struct WireWriter {
    buf: Vec<u8>,
}

#[cfg(test)]
impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn put_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    fn key(&mut self, field: u32, wire_type: u8) {
        self.put_varint((u64::from(field) << 3) | u64::from(wire_type));
    }

    pub fn varint(mut self, field: u32, value: u64) -> Self {
        self.key(field, 0);
        self.put_varint(value);
        self
    }

    pub fn bytes(mut self, field: u32, value: &[u8]) -> Self {
        self.key(field, 2);
        self.put_varint(value.len() as u64);
        self.buf.extend_from_slice(value);
        self
    }

    pub fn string(self, field: u32, value: &str) -> Self {
        self.bytes(field, value.as_bytes())
    }

    pub fn message(self, field: u32, inner: WireWriter) -> Self {
        self.bytes(field, &inner.finish())
    }

    pub fn fixed32(mut self, field: u32, value: u32) -> Self {
        self.key(field, 5);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn fixed64(mut self, field: u32, value: u64) -> Self {
        self.key(field, 1);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
