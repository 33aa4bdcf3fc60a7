//! Universal sample post-processing pipeline
//!
//! Every loader funnels raw sample payloads through [`load_sample`], which
//! turns source bytes into a playback-ready buffer: it clamps degenerate
//! loops, decodes 4-bit ADPCM, applies the format conversions the caller's
//! flags select, and mirrors the edge frames into the buffer's guard
//! regions. Decoded samples are stored in host byte order.
//!
//! Truncated raw payloads are tolerated (the missing tail stays silent);
//! a truncated ADPCM payload is corrupt and fails the load.

use crate::{LoadError, LoadOptions, SourceReader};
use lode_module::{Sample, SampleBuffer, SampleFlags};

/// Hard ceiling on a sample's length in frames
pub const MAX_SAMPLE_LENGTH: u32 = 0x0080_0000;

/// Source-format flags selecting the pipeline's transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleFormat(u32);

impl SampleFormat {
    /// Source is 7-bit; shift up to 8-bit range
    pub const SEVEN_BIT: Self = Self(0x0001);
    /// Source is unsigned; bias to signed
    pub const UNSIGNED: Self = Self(0x0002);
    /// Source is differentially encoded; reconstruct absolute values
    pub const DIFF: Self = Self(0x0004);
    /// 16-bit source words are big-endian
    pub const BIG_ENDIAN: Self = Self(0x0008);
    /// Source is VIDC log-PCM; convert to linear
    pub const VIDC: Self = Self(0x0010);
    /// Source is 4-bit ADPCM with a 16-byte step-table header
    pub const ADPCM: Self = Self(0x0020);
    /// The caller supplies the payload; read nothing from the source
    pub const NO_LOAD: Self = Self(0x0040);
    /// Mark a loop reaching past loop-end as a full-sample loop
    pub const FULL_LOOP: Self = Self(0x0080);
    /// Adlib FM patch slot; there is no PCM payload at all
    pub const ADLIB: Self = Self(0x0100);

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

impl std::ops::BitOr for SampleFormat {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Bytes the sample occupies in the source
fn stored_size(sample: &Sample, format: SampleFormat) -> usize {
    if format.contains(SampleFormat::ADPCM) {
        16 + (sample.length as usize).div_ceil(2)
    } else {
        sample.length as usize * sample.frame_size()
    }
}

/// Decode one sample payload into a playback-ready buffer
///
/// The reader is positioned at the sample's stored bytes (ignored when
/// `format` carries `NO_LOAD` and the payload arrives via `prebuffer`).
/// On success `sample.data` holds the guarded buffer; on failure nothing
/// is allocated and the caller must abort the load.
pub fn load_sample(
    reader: &mut SourceReader,
    format: SampleFormat,
    sample: &mut Sample,
    prebuffer: Option<&[u8]>,
    options: &LoadOptions,
) -> Result<(), LoadError> {
    // Nothing to decode for empty slots and FM patches
    if sample.length == 0 || format.contains(SampleFormat::ADLIB) {
        return Ok(());
    }

    let caller_supplied = format.contains(SampleFormat::NO_LOAD) || prebuffer.is_some();

    if sample.length > MAX_SAMPLE_LENGTH || options.skip_sample_bodies {
        if !caller_supplied {
            reader.skip(stored_size(sample, format));
        }
        return Ok(());
    }

    let sixteen_bit = sample.is_16bit();
    let frame = sample.frame_size();

    if !caller_supplied {
        if reader.is_eof() {
            return Ok(());
        }
        // ADPCM payload size is not derived from the file position, so it
        // is exempt from truncation
        if !format.contains(SampleFormat::ADPCM) {
            let available = reader.remaining() as u32 / frame as u32;
            if sample.length > available {
                log::warn!(
                    "sample truncated: {} frames declared, {} available",
                    sample.length,
                    available
                );
                sample.length = available;
            }
        }
    }

    // Clamp loop points; degenerate loops lose the loop flags entirely
    if sample.loop_end > sample.length {
        sample.loop_end = sample.length;
    }
    if sample.loop_start >= sample.length || sample.loop_end <= sample.loop_start {
        sample.loop_start = 0;
        sample.loop_end = 0;
        sample.flags = sample
            .flags
            .without(SampleFlags::LOOP.union(SampleFlags::LOOP_BIDIR).union(SampleFlags::LOOP_FULL));
    }

    let byte_len = sample.length as usize * frame;
    let mut buffer = SampleBuffer::alloc(byte_len, sixteen_bit);

    if let Some(pre) = prebuffer {
        let count = pre.len().min(byte_len);
        buffer.payload_mut()[..count].copy_from_slice(&pre[..count]);
    } else if format.contains(SampleFormat::NO_LOAD) {
        // No source bytes and no prebuffer: the payload stays silent
    } else if format.contains(SampleFormat::ADPCM) {
        decode_adpcm(reader, buffer.payload_mut())?;
    } else {
        let copied = reader.read_into(buffer.payload_mut());
        if copied < byte_len {
            log::warn!("short sample read: {copied} of {byte_len} bytes");
        }
    }

    // Format conversions, in fixed order
    let payload = buffer.payload_mut();
    if format.contains(SampleFormat::SEVEN_BIT) {
        for b in payload.iter_mut() {
            *b <<= 1;
        }
    }
    let host_big = cfg!(target_endian = "big");
    if sixteen_bit && format.contains(SampleFormat::BIG_ENDIAN) != host_big {
        for pair in payload.chunks_exact_mut(2) {
            pair.swap(0, 1);
        }
    }
    if format.contains(SampleFormat::DIFF) {
        if sixteen_bit {
            let mut acc: u16 = 0;
            for pair in payload.chunks_exact_mut(2) {
                acc = acc.wrapping_add(u16::from_ne_bytes([pair[0], pair[1]]));
                pair.copy_from_slice(&acc.to_ne_bytes());
            }
        } else {
            let mut acc: u8 = 0;
            for b in payload.iter_mut() {
                acc = acc.wrapping_add(*b);
                *b = acc;
            }
        }
    }
    if format.contains(SampleFormat::UNSIGNED) {
        if sixteen_bit {
            for pair in payload.chunks_exact_mut(2) {
                let v = u16::from_ne_bytes([pair[0], pair[1]]) ^ 0x8000;
                pair.copy_from_slice(&v.to_ne_bytes());
            }
        } else {
            for b in payload.iter_mut() {
                *b ^= 0x80;
            }
        }
    }
    if format.contains(SampleFormat::VIDC) && !sixteen_bit {
        for b in payload.iter_mut() {
            *b = VIDC_TABLE[*b as usize] as u8;
        }
    }

    if format.contains(SampleFormat::FULL_LOOP)
        && sample.loop_start == 0
        && sample.length > sample.loop_end
    {
        sample.flags = sample.flags.union(SampleFlags::LOOP_FULL);
    }

    buffer.mirror_guards(sixteen_bit);
    sample.data = Some(buffer);
    Ok(())
}

/// Decode 4-bit ADPCM: a 16-entry signed step table, then two deltas per
/// byte, low nibble first
///
/// Strict: a short table or payload is corrupt (the buffer allocated by
/// the caller is dropped on the way out).
fn decode_adpcm(reader: &mut SourceReader, payload: &mut [u8]) -> Result<(), LoadError> {
    let table_bytes = reader.read_slice(16)?;
    let mut table = [0i8; 16];
    for (entry, &b) in table.iter_mut().zip(table_bytes) {
        *entry = b as i8;
    }

    let packed = reader.read_slice(payload.len().div_ceil(2))?;
    let mut acc: i8 = 0;
    let mut out = payload.iter_mut();
    for &byte in packed {
        acc = acc.wrapping_add(table[(byte & 0x0F) as usize]);
        if let Some(slot) = out.next() {
            *slot = acc as u8;
        }
        acc = acc.wrapping_add(table[(byte >> 4) as usize]);
        if let Some(slot) = out.next() {
            *slot = acc as u8;
        }
    }
    Ok(())
}

/// VIDC log-PCM to linear lookup table
///
/// VIDC codes carry the sign in bit 0 and a 7-bit log magnitude (3-bit
/// chord, 4-bit step) in the upper bits, scaled here to the signed 8-bit
/// range.
static VIDC_TABLE: [i8; 256] = build_vidc_table();

const fn build_vidc_table() -> [i8; 256] {
    let mut table = [0i8; 256];
    let mut code = 0usize;
    while code < 256 {
        let magnitude = code >> 1;
        let chord = (magnitude >> 4) as u32;
        let step = (magnitude & 0x0F) as i32;
        let linear = (((step << 1) + 1) << chord) >> 5;
        table[code] = if code & 1 != 0 {
            -(linear as i8)
        } else {
            linear as i8
        };
        code += 1;
    }
    table
}
