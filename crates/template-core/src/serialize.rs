//! Compact-size integers and a bounds-checked byte reader.

use crate::error::{Result, TemplateError};

/// Number of bytes `encode_varint` writes for `value`.
pub fn varint_len(value: u64) -> usize {
    if value < 0xfd {
        1
    } else if value <= 0xffff {
        3
    } else if value <= 0xffff_ffff {
        5
    } else {
        9
    }
}

/// Encode a variable-length integer (Bitcoin compact size).
pub fn encode_varint(value: u64, output: &mut Vec<u8>) {
    if value < 0xfd {
        output.push(value as u8);
    } else if value <= 0xffff {
        output.push(0xfd);
        output.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        output.push(0xfe);
        output.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        output.push(0xff);
        output.extend_from_slice(&value.to_le_bytes());
    }
}

/// Forward-only reader over a borrowed buffer.
///
/// Every read is bounds-checked and reports the absolute offset of the
/// failure, so a short buffer surfaces as `MalformedTransaction` instead of
/// a panic or a silent truncation.
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    position: usize,
    base: usize,
}

impl<'a> ByteReader<'a> {
    /// Read `buffer`, reporting errors relative to `base` in the enclosing blob.
    pub fn new(buffer: &'a [u8], base: usize) -> Self {
        ByteReader {
            buffer,
            position: 0,
            base,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Next byte without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.buffer.get(self.position).copied()
    }

    pub fn read_bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(TemplateError::malformed(
                self.base + self.position,
                format!("{} needs {} bytes, {} left", what, len, self.remaining()),
            ));
        }
        let start = self.position;
        self.position += len;
        Ok(&self.buffer[start..self.position])
    }

    pub fn read_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.read_bytes(1, what)?[0])
    }

    pub fn read_u32_le(&mut self, what: &str) -> Result<u32> {
        let bytes = self.read_bytes(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn skip(&mut self, len: usize, what: &str) -> Result<()> {
        self.read_bytes(len, what).map(|_| ())
    }

    /// Read a compact-size integer.
    pub fn read_varint(&mut self, what: &str) -> Result<u64> {
        let value = match self.read_u8(what)? {
            0xfd => {
                let b = self.read_bytes(2, what)?;
                u16::from_le_bytes([b[0], b[1]]) as u64
            }
            0xfe => {
                let b = self.read_bytes(4, what)?;
                u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as u64
            }
            0xff => {
                let b = self.read_bytes(8, what)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(b);
                u64::from_le_bytes(raw)
            }
            small => small as u64,
        };
        Ok(value)
    }

    /// Read a compact-size length and return it as `usize`, rejecting values
    /// that cannot possibly fit in what is left of the buffer.
    pub fn read_len(&mut self, what: &str) -> Result<usize> {
        let at = self.base + self.position;
        let len = self.read_varint(what)?;
        if len > self.remaining() as u64 {
            return Err(TemplateError::malformed(
                at,
                format!("{} declares {} entries, {} bytes left", what, len, self.remaining()),
            ));
        }
        Ok(len as usize)
    }

    /// Read a compact-size length followed by that many bytes.
    pub fn read_var_bytes(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.read_len(what)?;
        self.read_bytes(len, what)
    }
}
