//! The only in-process configuration surface this crate exposes. Directory
//! walking, registry lookup, and settings files are an outer-shell concern
//! and have no representation here; grounded on `ecsdb/src/config.rs`'s
//! plain `Default`-deriving struct.

#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    /// When true, a chunk-count mismatch against the header's declared
    /// `chunkSize` is a hard read error instead of a logged warning.
    pub strict_chunk_count: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            strict_chunk_count: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WriterOptions {
    /// Re-derive the chunk count for every component about to be written
    /// and assert it matches before committing the header.
    pub verify_chunk_count: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            verify_chunk_count: true,
        }
    }
}
