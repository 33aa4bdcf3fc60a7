//! Lode-Loader: shared loading core for Lodestone format loaders
//!
//! Dozens of tracker formats reduce to the same few mechanisms: walk a
//! byte source, dispatch tagged chunks, allocate module structure, decode
//! sample payloads. This crate is that shared core; the per-format loaders
//! sit on top of it and contribute only their fixed layouts.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            Format loaders (external)        │
//! │        one FormatLoader per tracker format  │
//! └──────┬──────────────┬──────────────┬────────┘
//!        │              │              │
//!   SourceReader   ChunkDispatcher   load_sample ──► lode-codec
//!        │              │              │             (LZW, sigma-delta,
//!        └──────────────┴──────────────┤              IT delta)
//!                                      ▼
//!                                 lode-module
//!                          (Module + allocation layer)
//! ```
//!
//! A loader either drives the [`SourceReader`] directly or registers
//! handlers with a [`ChunkDispatcher`] and delegates iteration. Sample
//! payloads always pass through [`load_sample`], which owns the guard-byte
//! and conversion pipeline.
//!
//! Loading is single-threaded and synchronous: one sequential pass in
//! strict file order. Each load owns its reader, module and decoder state,
//! so concurrent loads of different sources are independent.
//!
//! # Error policy
//!
//! `test` mismatches are not errors; everything else is all-or-nothing. A
//! structural failure (bad counts, corrupt chunk, corrupt compressed data)
//! aborts the load and the partially-built module is dropped. Truncated
//! raw sample payloads are tolerated by zero-filling.

mod error;
mod iff;
mod reader;
mod registry;
mod sample;

pub use error::LoadError;
pub use iff::{ChunkDispatcher, ChunkFlow, ChunkHandler, IffQuirks, MAX_CHUNK_SIZE};
pub use reader::{read_string, SourceReader};
pub use registry::{FormatLoader, LoaderRegistry};
pub use sample::{load_sample, SampleFormat, MAX_SAMPLE_LENGTH};

/// Load-time configuration shared by all loaders
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Skip sample payloads entirely, loading structure and metadata only
    ///
    /// Used for fast cataloguing; samples stay unallocated and the module
    /// is not playable.
    pub skip_sample_bodies: bool,
}
