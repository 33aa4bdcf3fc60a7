//! Adaptive LZW decompression
//!
//! Byte-oriented LZW with 9-16 bit codes, as used for compressed pattern
//! and sample payloads. Codes 0-255 are literal bytes, 256 clears the
//! dictionary, and when [`LzwFlags::EOF_MARKER`] is set code 257 ends the
//! stream early (dynamic codes then start at 258).
//!
//! The code table is a flat arena indexed by code value: each entry stores
//! its previous-code back-reference, the appended byte and a cached
//! expansion length, so emitting a code is a bounded indexed walk writing
//! the expansion back-to-front. Back-reference chains form an acyclic
//! forest, never a general pointer graph.

use crate::bits::BitReader;
use crate::CodecError;

/// Minimum (initial) code width in bits
pub const LZW_MIN_WIDTH: u32 = 9;

/// Maximum supported code width in bits
pub const LZW_MAX_WIDTH: u32 = 16;

/// Dictionary-clear code
const CODE_CLEAR: u32 = 256;

/// End-of-stream code, only meaningful with [`LzwFlags::EOF_MARKER`]
const CODE_EOF: u32 = 257;

/// Back-reference value for codes with no predecessor
const NO_PREV: u16 = u16::MAX;

/// Behavioral quirks for the LZW engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LzwFlags(u32);

impl LzwFlags {
    /// Stream carries an explicit end-of-stream sentinel code
    pub const EOF_MARKER: Self = Self(0x0001);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for LzwFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One arena slot of the code table
#[derive(Debug, Clone, Copy)]
struct LzwEntry {
    /// Previous code in the chain, `NO_PREV` for literals
    prev: u16,
    /// Byte appended by this code
    byte: u8,
    /// Cached expansion length; 0 means "uncached"
    length: u16,
}

/// Mutable decoder state for one decompression call
#[derive(Debug)]
struct LzwDecoder {
    table: Vec<LzwEntry>,
    width: u32,
    max_width: u32,
    first_free: usize,
    prev_code: Option<u32>,
    just_grew: bool,
}

impl LzwDecoder {
    fn new(max_width: u32, flags: LzwFlags) -> Self {
        let first_free = if flags.contains(LzwFlags::EOF_MARKER) {
            CODE_EOF as usize + 1
        } else {
            CODE_EOF as usize
        };
        let mut decoder = Self {
            table: Vec::with_capacity(1 << LZW_MIN_WIDTH),
            width: LZW_MIN_WIDTH,
            max_width,
            first_free,
            prev_code: None,
            just_grew: false,
        };
        decoder.reset();
        decoder
    }

    /// Reset to 9-bit width with only literals (and reserved codes) defined
    fn reset(&mut self) {
        self.table.clear();
        for byte in 0..=255u8 {
            self.table.push(LzwEntry {
                prev: NO_PREV,
                byte,
                length: 1,
            });
        }
        // Reserved slots (CLEAR, optional EOF) are never emitted
        while self.table.len() < self.first_free {
            self.table.push(LzwEntry {
                prev: NO_PREV,
                byte: 0,
                length: 0,
            });
        }
        self.width = LZW_MIN_WIDTH;
        self.prev_code = None;
        self.just_grew = false;
    }

    /// Expansion length of a code, recomputing from the chain if the cache
    /// reads 0
    ///
    /// The chain walk is an extension point: every entry written by this
    /// decoder carries a cached length, so valid streams never take it.
    fn expansion_length(&self, code: u32) -> usize {
        let cached = self.table[code as usize].length;
        if cached != 0 {
            return cached as usize;
        }
        self.chain_length(code)
    }

    /// Walk the back-reference chain to count the expansion length
    fn chain_length(&self, code: u32) -> usize {
        let mut length = 0;
        let mut current = code as usize;
        loop {
            length += 1;
            let entry = self.table[current];
            if entry.prev == NO_PREV {
                return length;
            }
            current = entry.prev as usize;
        }
    }

    /// First byte of a code's expansion (root of its chain)
    fn first_byte(&self, code: u32) -> u8 {
        let mut current = code as usize;
        loop {
            let entry = self.table[current];
            if entry.prev == NO_PREV {
                return entry.byte;
            }
            current = entry.prev as usize;
        }
    }

    /// Append a table entry and grow the bit width at the size threshold
    fn push_entry(&mut self, prev: u32, byte: u8) {
        if self.table.len() < (1usize << self.max_width) {
            let length = (self.expansion_length(prev) + 1).min(u16::MAX as usize) as u16;
            self.table.push(LzwEntry {
                prev: prev as u16,
                byte,
                length,
            });
        }
        if self.table.len() >= (1usize << self.width) && self.width < self.max_width {
            self.width += 1;
            self.just_grew = true;
        }
    }

    /// Emit a code's expansion into `out` at `pos`, back-to-front
    ///
    /// Bytes past the end of `out` are dropped; returns the new position.
    fn emit(&self, out: &mut [u8], pos: usize, code: u32) -> usize {
        let length = self.expansion_length(code);
        let end = pos + length;
        let mut current = code as usize;
        let mut i = end;
        while i > pos {
            i -= 1;
            let entry = self.table[current];
            if i < out.len() {
                out[i] = entry.byte;
            }
            if entry.prev == NO_PREV {
                break;
            }
            current = entry.prev as usize;
        }
        end.min(out.len())
    }
}

/// Decompress an LZW stream into `output_length` bytes
///
/// `max_width` selects the widest code the stream may use (9-16 bits).
/// Input underrun zero-fills the remaining output; an out-of-range code is
/// corrupt and fails the decode.
///
/// Returns the decoded buffer and the number of source bytes consumed,
/// including the trailing padding that rounds the consumed count up to a
/// multiple of 4.
pub fn decompress_lzw(
    input: &[u8],
    output_length: usize,
    max_width: u32,
    flags: LzwFlags,
) -> Result<(Vec<u8>, usize), CodecError> {
    if !(LZW_MIN_WIDTH..=LZW_MAX_WIDTH).contains(&max_width) {
        return Err(CodecError::InvalidWidth(max_width));
    }

    let mut out = vec![0u8; output_length];
    let mut reader = BitReader::new(input);
    let mut decoder = LzwDecoder::new(max_width, flags);
    let eof_enabled = flags.contains(LzwFlags::EOF_MARKER);
    let mut saw_eof_code = false;
    let mut pos = 0usize;

    while pos < output_length {
        decoder.just_grew = false;
        let Some(code) = reader.read_bits(decoder.width) else {
            // Truncated input: the rest of the output stays zero
            break;
        };

        if code == CODE_CLEAR {
            decoder.reset();
            continue;
        }
        if eof_enabled && code == CODE_EOF {
            saw_eof_code = true;
            break;
        }

        let next_slot = decoder.table.len();
        if code as usize == next_slot {
            // Self-referential KwKwK case: the entry must be defined before
            // it can be emitted, and needs a previous code to extend
            let prev = decoder.prev_code.ok_or(CodecError::InvalidCode {
                code,
                next: next_slot as u32,
            })?;
            let seed = decoder.first_byte(prev);
            decoder.push_entry(prev, seed);
            decoder.prev_code = Some(code);
            pos = decoder.emit(&mut out, pos, code);
        } else if (code as usize) < next_slot {
            pos = decoder.emit(&mut out, pos, code);
            let seed = decoder.first_byte(code);
            if let Some(prev) = decoder.prev_code {
                decoder.push_entry(prev, seed);
            }
            decoder.prev_code = Some(code);
        } else {
            return Err(CodecError::InvalidCode {
                code,
                next: next_slot as u32,
            });
        }
    }

    // Consume the trailing EOF marker. When the last real code grew the
    // table the marker was written at the old width; reading at the grown
    // width here would desynchronize against those streams.
    if eof_enabled && !saw_eof_code {
        let width = if decoder.just_grew {
            decoder.width - 1
        } else {
            decoder.width
        };
        let _ = reader.read_bits(width);
    }

    // Streams are padded to a 4-byte boundary even when decoding stopped
    // early
    let consumed = next_multiple_of_4(reader.bytes_consumed()).min(input.len());

    Ok((out, consumed))
}

fn next_multiple_of_4(n: usize) -> usize {
    (n + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;

    /// LSB-first bit writer for building test streams
    struct BitWriter {
        data: Vec<u8>,
        current_byte: u8,
        bit_pos: u8,
    }

    impl BitWriter {
        fn new() -> Self {
            Self {
                data: Vec::new(),
                current_byte: 0,
                bit_pos: 0,
            }
        }

        fn write_bits(&mut self, value: u32, count: u32) {
            let mut value = value;
            let mut remaining = count;
            while remaining > 0 {
                let bits_left = 8 - self.bit_pos as u32;
                let bits_to_write = remaining.min(bits_left);
                let mask = (1u32 << bits_to_write) - 1;
                self.current_byte |= ((value & mask) as u8) << self.bit_pos;
                value >>= bits_to_write;
                remaining -= bits_to_write;
                self.bit_pos += bits_to_write as u8;
                if self.bit_pos >= 8 {
                    self.data.push(self.current_byte);
                    self.current_byte = 0;
                    self.bit_pos = 0;
                }
            }
        }

        fn finish(mut self) -> Vec<u8> {
            if self.bit_pos > 0 {
                self.data.push(self.current_byte);
            }
            self.data
        }
    }

    fn literal_stream(bytes: &[u8]) -> Vec<u8> {
        let mut writer = BitWriter::new();
        for &b in bytes {
            writer.write_bits(b as u32, 9);
        }
        writer.finish()
    }

    #[test]
    fn test_literals_reproduce_input() {
        let input = literal_stream(&[0, 1, 2, 250, 255, 42]);
        let (out, _) = decompress_lzw(&input, 6, 13, LzwFlags::empty()).unwrap();
        assert_eq!(out, vec![0, 1, 2, 250, 255, 42]);
    }

    #[test]
    fn test_dictionary_expansion() {
        // "ab" then code 257 ("ab") then "c": dictionary code built from the
        // first two literals
        let mut writer = BitWriter::new();
        writer.write_bits(b'a' as u32, 9);
        writer.write_bits(b'b' as u32, 9);
        writer.write_bits(257, 9);
        writer.write_bits(b'c' as u32, 9);
        let (out, _) = decompress_lzw(&writer.finish(), 5, 13, LzwFlags::empty()).unwrap();
        assert_eq!(out, b"ababc".to_vec());
    }

    #[test]
    fn test_kwkwk_case() {
        // "a" then the not-yet-defined code 257: decodes as "aa"
        let mut writer = BitWriter::new();
        writer.write_bits(b'a' as u32, 9);
        writer.write_bits(257, 9);
        let (out, _) = decompress_lzw(&writer.finish(), 3, 13, LzwFlags::empty()).unwrap();
        assert_eq!(out, b"aaa".to_vec());
    }

    #[test]
    fn test_kwkwk_without_previous_code_is_corrupt() {
        let mut writer = BitWriter::new();
        writer.write_bits(257, 9);
        let err = decompress_lzw(&writer.finish(), 2, 13, LzwFlags::empty()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidCode { code: 257, .. }));
    }

    #[test]
    fn test_clear_resets_dictionary() {
        // After CLEAR, a self-referential code behaves as at stream start:
        // no previous code exists, so it is corrupt
        let mut writer = BitWriter::new();
        writer.write_bits(b'a' as u32, 9);
        writer.write_bits(b'b' as u32, 9);
        writer.write_bits(CODE_CLEAR, 9);
        writer.write_bits(257, 9);
        let err = decompress_lzw(&writer.finish(), 8, 13, LzwFlags::empty()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidCode { code: 257, .. }));
    }

    #[test]
    fn test_clear_then_literals() {
        let mut writer = BitWriter::new();
        writer.write_bits(b'x' as u32, 9);
        writer.write_bits(CODE_CLEAR, 9);
        writer.write_bits(b'y' as u32, 9);
        writer.write_bits(b'z' as u32, 9);
        let (out, _) = decompress_lzw(&writer.finish(), 3, 13, LzwFlags::empty()).unwrap();
        assert_eq!(out, b"xyz".to_vec());
    }

    #[test]
    fn test_truncated_input_zero_fills() {
        let input = literal_stream(&[7, 8]);
        let (out, _) = decompress_lzw(&input, 6, 13, LzwFlags::empty()).unwrap();
        assert_eq!(out, vec![7, 8, 0, 0, 0, 0]);
    }

    #[test]
    fn test_out_of_range_code_is_corrupt() {
        let mut writer = BitWriter::new();
        writer.write_bits(b'a' as u32, 9);
        writer.write_bits(300, 9);
        let err = decompress_lzw(&writer.finish(), 4, 13, LzwFlags::empty()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidCode { code: 300, .. }));
    }

    #[test]
    fn test_eof_marker_stops_decoding() {
        let mut writer = BitWriter::new();
        writer.write_bits(b'a' as u32, 9);
        writer.write_bits(b'b' as u32, 9);
        writer.write_bits(CODE_EOF, 9);
        // Trailing garbage the decoder must not interpret
        writer.write_bits(b'q' as u32, 9);
        let (out, _) = decompress_lzw(&writer.finish(), 4, 13, LzwFlags::EOF_MARKER).unwrap();
        assert_eq!(out, vec![b'a', b'b', 0, 0]);
    }

    #[test]
    fn test_eof_marker_shifts_first_dynamic_code() {
        // With the EOF sentinel reserved, the first dictionary code is 258
        let mut writer = BitWriter::new();
        writer.write_bits(b'a' as u32, 9);
        writer.write_bits(b'b' as u32, 9);
        writer.write_bits(258, 9);
        let (out, _) = decompress_lzw(&writer.finish(), 4, 13, LzwFlags::EOF_MARKER).unwrap();
        assert_eq!(out, b"abab".to_vec());
    }

    #[test]
    fn test_consumed_is_padded_to_four_bytes() {
        let input = literal_stream(&[1, 2, 3]);
        // 27 bits = 4 bytes of stream; already aligned
        let (_, consumed) = decompress_lzw(&input, 3, 13, LzwFlags::empty()).unwrap();
        assert_eq!(consumed, 4);

        let mut padded = literal_stream(&[1, 2]);
        padded.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
        // 18 bits = 3 bytes of stream, padded up to 4
        let (_, consumed) = decompress_lzw(&padded, 2, 13, LzwFlags::empty()).unwrap();
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_consumed_clamped_to_input() {
        let input = literal_stream(&[9]);
        assert_eq!(input.len(), 2);
        let (_, consumed) = decompress_lzw(&input, 1, 13, LzwFlags::empty()).unwrap();
        assert_eq!(consumed, 2);
    }

    #[test]
    fn test_invalid_max_width() {
        assert_eq!(
            decompress_lzw(&[], 0, 8, LzwFlags::empty()).unwrap_err(),
            CodecError::InvalidWidth(8)
        );
        assert_eq!(
            decompress_lzw(&[], 0, 17, LzwFlags::empty()).unwrap_err(),
            CodecError::InvalidWidth(17)
        );
    }

    #[test]
    fn test_width_growth() {
        // Fill the dictionary past 512 entries so the width grows to 10:
        // alternate two literals, creating one new code per step
        let mut writer = BitWriter::new();
        let mut width = 9u32;
        let mut next_slot = 257usize;
        let mut expected = Vec::new();
        for i in 0..400u32 {
            let lit = (i % 2) as u32;
            writer.write_bits(lit, width);
            expected.push(lit as u8);
            // Every literal after the first defines one new code
            if i > 0 {
                next_slot += 1;
                if next_slot >= (1 << width) {
                    width += 1;
                }
            }
        }
        let (out, _) = decompress_lzw(&writer.finish(), 400, 13, LzwFlags::empty()).unwrap();
        assert_eq!(out, expected);
    }
}
