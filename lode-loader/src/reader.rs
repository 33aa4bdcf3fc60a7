//! Positioned, endian-aware reader over an in-memory byte source
//!
//! Every format loader and the chunk dispatcher drive the file through this
//! cursor. Integer reads are strict and fail with
//! [`LoadError::UnexpectedEof`]; bulk reads come in a strict
//! ([`SourceReader::read_slice`]) and a zero-fill-tolerant
//! ([`SourceReader::read_into`]) form. Seeking past the end is allowed;
//! reads at such a position simply fail, which the dispatcher treats as a
//! clean end of iteration.

use crate::LoadError;

/// Seekable cursor over a byte slice
#[derive(Debug)]
pub struct SourceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SourceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Total source length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current cursor position (may be past the end)
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the cursor to an absolute position
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Advance the cursor by `count` bytes
    pub fn skip(&mut self, count: usize) {
        self.pos = self.pos.saturating_add(count);
    }

    /// Check if the cursor is at or past the end
    pub fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Bytes left between the cursor and the end
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Read `count` bytes as a borrowed slice
    pub fn read_slice(&mut self, count: usize) -> Result<&'a [u8], LoadError> {
        if self.remaining() < count {
            return Err(LoadError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    /// Fill `buf` with as many bytes as remain, returning the count copied
    ///
    /// Never fails; the caller keeps whatever `buf` already held past the
    /// copied region (zero-fill paths pre-zero the buffer).
    pub fn read_into(&mut self, buf: &mut [u8]) -> usize {
        let count = buf.len().min(self.remaining());
        buf[..count].copy_from_slice(&self.data[self.pos..self.pos + count]);
        self.pos += count;
        count
    }

    pub fn read_u8(&mut self) -> Result<u8, LoadError> {
        let slice = self.read_slice(1)?;
        Ok(slice[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, LoadError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, LoadError> {
        let s = self.read_slice(2)?;
        Ok(u16::from_le_bytes([s[0], s[1]]))
    }

    pub fn read_u16_be(&mut self) -> Result<u16, LoadError> {
        let s = self.read_slice(2)?;
        Ok(u16::from_be_bytes([s[0], s[1]]))
    }

    pub fn read_u24_le(&mut self) -> Result<u32, LoadError> {
        let s = self.read_slice(3)?;
        Ok(u32::from_le_bytes([s[0], s[1], s[2], 0]))
    }

    pub fn read_u24_be(&mut self) -> Result<u32, LoadError> {
        let s = self.read_slice(3)?;
        Ok(u32::from_be_bytes([0, s[0], s[1], s[2]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, LoadError> {
        let s = self.read_slice(4)?;
        Ok(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32, LoadError> {
        let s = self.read_slice(4)?;
        Ok(u32::from_be_bytes([s[0], s[1], s[2], s[3]]))
    }
}

/// Trim a fixed-length name field: stop at the first NUL, replace
/// non-printable bytes and strip trailing spaces
///
/// Codepage-aware decoding is the caller's concern; this is the plain
/// fallback for loaders that carry ASCII-ish names.
pub fn read_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let s: String = bytes[..end]
        .iter()
        .map(|&b| {
            if (0x20..0x7F).contains(&b) {
                b as char
            } else {
                '.'
            }
        })
        .collect();
    s.trim_end().to_string()
}
