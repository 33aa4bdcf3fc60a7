//! Lode-Module: unified tracker module data model for Lodestone
//!
//! This crate provides the format-agnostic song representation that every
//! Lodestone format loader populates: one [`Module`] owning instruments,
//! samples, patterns and tracks. Loaders build the structural skeleton
//! through the allocation layer (`Module::init_*` / `Module::alloc_*`),
//! which validates counts and indices so that a module can never end up
//! half-built with dangling references.
//!
//! # Design
//!
//! - **One owner**: the `Module` owns every child entity exclusively and is
//!   created, populated and handed to the playback engine as a unit. On any
//!   load failure the whole module is dropped; no partial module escapes.
//! - **Index references**: patterns refer to tracks by index into the
//!   module-wide track array (`pattern * channels + channel`), and
//!   subinstruments refer to samples by index. Formats that reuse track
//!   storage alias indices instead of copying track data.
//! - **Guarded sample buffers**: sample payloads carry mirrored guard bytes
//!   on both ends so interpolating mixers may read slightly out of bounds
//!   without checks.
//!
//! # Usage
//!
//! ```
//! use lode_module::Module;
//!
//! let mut module = Module::default();
//! module.num_channels = 4;
//! module.num_patterns = 2;
//! module.num_instruments = 1;
//!
//! module.init_instruments().unwrap();
//! module.init_patterns().unwrap();
//! module.alloc_pattern_tracks(0, 64).unwrap();
//! ```

mod alloc;
mod error;
mod module;

pub use error::ModuleError;
pub use module::{
    Event, Instrument, Module, Pattern, Sample, SampleBuffer, SampleExtra, SampleFlags,
    SubInstrument, Track,
};

// =============================================================================
// Hard maxima
// =============================================================================

/// Maximum number of channels in a module
pub const MAX_CHANNELS: usize = 64;

/// Maximum number of patterns in a module
pub const MAX_PATTERNS: usize = 256;

/// Maximum rows in a single pattern or track
pub const MAX_PATTERN_ROWS: usize = 256;

/// Maximum number of instruments in a module
pub const MAX_INSTRUMENTS: usize = 255;

/// Maximum number of samples in a module
pub const MAX_SAMPLES: usize = 1024;

/// Maximum number of entries in the order list
pub const MAX_ORDERS: usize = 256;

// =============================================================================
// Defaults
// =============================================================================

/// Default base sample rate in Hz (Amiga C-4 standard)
pub const DEFAULT_BASE_RATE: u32 = 8363;

/// Default initial speed (ticks per row)
pub const DEFAULT_SPEED: u8 = 6;

/// Default initial tempo (BPM)
pub const DEFAULT_TEMPO: u8 = 125;

/// Center value for per-channel default panning
pub const PAN_CENTER: u8 = 0x80;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(MAX_CHANNELS <= 64);
        assert!(MAX_PATTERN_ROWS <= 256);
        assert_eq!(DEFAULT_BASE_RATE, 8363);
    }
}
