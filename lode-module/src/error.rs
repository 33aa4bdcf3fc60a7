//! Allocation and invariant errors

use crate::{MAX_CHANNELS, MAX_INSTRUMENTS, MAX_PATTERN_ROWS, MAX_PATTERNS, MAX_SAMPLES};

/// Errors raised by the allocation layer
///
/// Every variant is a structural-corruption signal: callers must abort the
/// whole load and drop the partially-built module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleError {
    #[error("too many channels: {0} (max {max})", max = MAX_CHANNELS)]
    TooManyChannels(usize),
    #[error("too many patterns: {0} (max {max})", max = MAX_PATTERNS)]
    TooManyPatterns(usize),
    #[error("too many instruments: {0} (max {max})", max = MAX_INSTRUMENTS)]
    TooManyInstruments(usize),
    #[error("too many samples: {0} (max {max})", max = MAX_SAMPLES)]
    TooManySamples(usize),
    #[error("pattern index {0} out of range")]
    PatternIndex(usize),
    #[error("track index {0} out of range")]
    TrackIndex(usize),
    #[error("instrument index {0} out of range")]
    InstrumentIndex(usize),
    #[error("pattern {0} already allocated")]
    PatternAllocated(usize),
    #[error("track {0} already allocated")]
    TrackAllocated(usize),
    #[error("invalid row count: {0} (must be 1-{max})", max = MAX_PATTERN_ROWS)]
    InvalidRowCount(usize),
    #[error("invalid subinstrument count: {0}")]
    InvalidSubInstrumentCount(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ModuleError::TooManySamples(2000).to_string(),
            "too many samples: 2000 (max 1024)"
        );
        assert_eq!(
            ModuleError::PatternAllocated(3).to_string(),
            "pattern 3 already allocated"
        );
        assert_eq!(
            ModuleError::InvalidRowCount(0).to_string(),
            "invalid row count: 0 (must be 1-256)"
        );
    }
}
