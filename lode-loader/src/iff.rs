//! Generic tagged-chunk container dispatcher
//!
//! IFF/RIFF-family formats are sequences of `tag + 32-bit size + payload`
//! chunks. A format loader registers one handler per tag it understands and
//! delegates iteration to [`ChunkDispatcher::load`]; handlers may consume
//! as much or as little of their chunk as they like, the dispatcher always
//! re-seeks to `chunk_start + declared_size` before the next tag.
//!
//! Container dialects differ in small ways (size-field endianness, size
//! alignment, whether the declared size includes the header); those are
//! expressed as [`IffQuirks`] flags rather than per-format subclasses.

use crate::{LoadError, SourceReader};
use lode_module::Module;

/// Sanity limit for a registered chunk's declared size
pub const MAX_CHUNK_SIZE: u32 = 8 * 1024 * 1024;

/// Tag that keeps its full declared size under [`IffQuirks::FULL_CHUNK_SIZE`]
const FULL_SIZE_EXEMPT_TAG: &[u8] = b"FORM";

/// Container dialect quirks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IffQuirks(u32);

impl IffQuirks {
    /// Chunk size field is little-endian (RIFF style)
    pub const LITTLE_ENDIAN: Self = Self(0x0001);
    /// Declared size includes the chunk header; subtract it (except for
    /// the `FORM` container tag)
    pub const FULL_CHUNK_SIZE: Self = Self(0x0002);
    /// Round chunk sizes up to 2-byte alignment
    pub const CHUNK_ALIGN2: Self = Self(0x0004);
    /// Round chunk sizes up to 4-byte alignment
    pub const CHUNK_ALIGN4: Self = Self(0x0008);
    /// Skip an embedded RIFF header before the first real tag
    pub const SKIP_EMBEDDED_RIFF: Self = Self(0x0010);

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

impl std::ops::BitOr for IffQuirks {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Handler verdict for one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkFlow {
    /// Keep iterating
    Continue,
    /// Stop iterating; the load so far is a success
    Stop,
}

/// Per-tag chunk handler
///
/// Receives the module under construction, the reader positioned at the
/// chunk payload, the declared payload size and the loader's context.
/// Returning an error aborts the whole load.
pub type ChunkHandler<C> =
    fn(&mut Module, &mut SourceReader, u32, &mut C) -> Result<ChunkFlow, LoadError>;

/// Tagged-chunk container iterator
///
/// `C` is the format loader's mutable context threaded into every handler.
pub struct ChunkDispatcher<C> {
    handlers: Vec<(Vec<u8>, ChunkHandler<C>)>,
    id_size: usize,
    quirks: IffQuirks,
}

impl<C> Default for ChunkDispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ChunkDispatcher<C> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            id_size: 4,
            quirks: IffQuirks::empty(),
        }
    }

    /// Associate a tag with a handler
    ///
    /// Tags are matched in registration order, first match wins. The tag
    /// must be `id_size` bytes long to ever match.
    pub fn register(&mut self, tag: &[u8], handler: ChunkHandler<C>) {
        self.handlers.push((tag.to_vec(), handler));
    }

    /// Set the tag length in bytes (1-4, default 4)
    pub fn set_id_size(&mut self, size: usize) {
        self.id_size = size.clamp(1, 4);
    }

    /// Set the container dialect quirks
    pub fn set_quirks(&mut self, quirks: IffQuirks) {
        self.quirks = quirks;
    }

    fn find_handler(&self, tag: &[u8]) -> Option<ChunkHandler<C>> {
        self.handlers
            .iter()
            .find(|(registered, _)| registered == tag)
            .map(|&(_, handler)| handler)
    }

    /// Iterate the container, dispatching registered chunks
    ///
    /// A short tag read is a clean end of iteration, not an error; a failed
    /// size read aborts. The cursor is forced past each chunk's declared
    /// payload no matter how much the handler consumed.
    pub fn load(
        &self,
        module: &mut Module,
        reader: &mut SourceReader,
        context: &mut C,
    ) -> Result<(), LoadError> {
        loop {
            let mut tag = [0u8; 4];
            if reader.read_into(&mut tag[..self.id_size]) < self.id_size {
                return Ok(());
            }

            if self.quirks.contains(IffQuirks::SKIP_EMBEDDED_RIFF) && &tag[..4] == b"RIFF" {
                // Container size and form type, then the real first tag
                reader.skip(8);
                if reader.read_into(&mut tag[..self.id_size]) < self.id_size {
                    return Ok(());
                }
            }
            let tag = &tag[..self.id_size];

            let mut size = if self.quirks.contains(IffQuirks::LITTLE_ENDIAN) {
                reader.read_u32_le()?
            } else {
                reader.read_u32_be()?
            };

            if self.quirks.contains(IffQuirks::CHUNK_ALIGN2) {
                size = size.wrapping_add(1) & !1;
            }
            if self.quirks.contains(IffQuirks::CHUNK_ALIGN4) {
                size = size.wrapping_add(3) & !3;
            }
            if self.quirks.contains(IffQuirks::FULL_CHUNK_SIZE) && tag != FULL_SIZE_EXEMPT_TAG {
                let header_len = self.id_size as u32 + 4;
                if size < header_len {
                    return Err(LoadError::CorruptChunk);
                }
                size -= header_len;
            }

            let chunk_start = reader.position();

            if let Some(handler) = self.find_handler(tag) {
                if size > MAX_CHUNK_SIZE {
                    return Err(LoadError::OversizeChunk(size));
                }
                match handler(module, reader, size, context)? {
                    ChunkFlow::Continue => {}
                    ChunkFlow::Stop => return Ok(()),
                }
            } else {
                log::debug!(
                    "skipping unknown chunk {:?} ({} bytes)",
                    String::from_utf8_lossy(tag),
                    size
                );
            }

            reader.set_position(chunk_start + size as usize);
        }
    }
}
