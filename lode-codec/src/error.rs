//! Decompression error types

/// Errors detected while decoding a compressed stream
///
/// Any of these aborts the containing load; there is no partial recovery
/// once a stream is known to be corrupt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A code referenced a dictionary slot that does not exist yet
    #[error("invalid code {code} (next free slot {next})")]
    InvalidCode { code: u32, next: u32 },
    /// A width escape moved the bit width outside the legal range
    #[error("bit width {0} out of range")]
    InvalidWidth(u32),
    /// The stream ended inside a block that promised more data
    #[error("unexpected end of compressed data")]
    TruncatedInput,
    /// A block header declared more bytes than the source holds
    #[error("truncated block: expected {expected} bytes, got {got}")]
    TruncatedBlock { expected: usize, got: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            CodecError::InvalidCode { code: 300, next: 258 }.to_string(),
            "invalid code 300 (next free slot 258)"
        );
        assert_eq!(
            CodecError::InvalidWidth(0).to_string(),
            "bit width 0 out of range"
        );
        assert_eq!(
            CodecError::TruncatedBlock { expected: 16, got: 3 }.to_string(),
            "truncated block: expected 16 bytes, got 3"
        );
    }
}
