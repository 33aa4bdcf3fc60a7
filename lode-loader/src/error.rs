//! Loading error types

use lode_codec::CodecError;
use lode_module::ModuleError;

/// Errors raised while loading a module
///
/// There is no partial success: any of these aborts the whole load and the
/// partially-built module is dropped before the error reaches the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// A read ran past the end of the source
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// A registered chunk declared a size beyond the sanity limit
    #[error("chunk size {0} exceeds the 8 MiB limit")]
    OversizeChunk(u32),
    /// A chunk header that cannot be valid (e.g. smaller than itself)
    #[error("corrupt chunk header")]
    CorruptChunk,
    /// No registered loader recognized the file
    #[error("unrecognized module format")]
    UnknownFormat,
    /// Structural-corruption failure from the allocation layer
    #[error(transparent)]
    Module(#[from] ModuleError),
    /// Compressed-stream corruption from a decompression engine
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(LoadError::UnexpectedEof.to_string(), "unexpected end of file");
        assert_eq!(
            LoadError::OversizeChunk(0x900000).to_string(),
            "chunk size 9437184 exceeds the 8 MiB limit"
        );
    }

    #[test]
    fn test_error_wrapping() {
        let err: LoadError = ModuleError::PatternIndex(7).into();
        assert_eq!(err.to_string(), "pattern index 7 out of range");

        let err: LoadError = CodecError::TruncatedInput.into();
        assert_eq!(err.to_string(), "unexpected end of compressed data");
    }
}
