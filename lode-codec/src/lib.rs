//! Lode-Codec: bitstream decompression engines for Lodestone
//!
//! This crate implements the three sample/pattern decompression schemes the
//! Lodestone format loaders depend on:
//!
//! - **Adaptive LZW** (9-16 bit codes, byte-oriented dictionary) used by
//!   formats that compress pattern and sample data
//! - **Sigma-delta** (adaptive 1-9 bit differential codes) used by
//!   Archimedes-era sample data
//! - **IT delta** (8- and 16-bit block-compressed differential samples, with
//!   the 2.15 second-order variant)
//!
//! Each engine is a pure transform: compressed bytes in, a fixed-length
//! decoded buffer plus the number of source bytes consumed out. Callers use
//! the consumed count to advance their file cursor past the compressed
//! payload. No engine touches global state; every decode call owns its
//! table/accumulator state, so concurrent loads stay independent.
//!
//! # Error policy
//!
//! The LZW and sigma-delta engines tolerate truncated input by zero-filling
//! the remainder of the output buffer; corrupt codes (out-of-range table
//! slots, width escapes beyond the legal range) are hard errors. The IT
//! delta engine is strict: once a block header has been read, running out
//! of input is fatal.

mod bits;
mod error;
mod it;
mod lzw;
mod sigma;

pub use bits::BitReader;
pub use error::CodecError;
pub use it::{decompress_it_8bit, decompress_it_16bit};
pub use lzw::{decompress_lzw, LzwFlags, LZW_MAX_WIDTH, LZW_MIN_WIDTH};
pub use sigma::decompress_sigma_delta;
