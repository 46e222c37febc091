use thiserror::Error;

/// Everything that can go wrong reading, composing, or writing a compiled
/// material database.
#[derive(Debug, Error)]
pub enum CdbError {
    #[error("unexpected end of stream at offset {offset}, wanted {wanted} more byte(s)")]
    ShortRead { offset: u64, wanted: usize },

    #[error("bad chunk signature {found:?} at offset {offset}")]
    BadSignature { offset: u64, found: [u8; 4] },

    #[error("unknown type reference {0:#010x}")]
    UnknownType(u32),

    #[error("reference to unresolved string offset {0:#010x}")]
    UnresolvedRef(u32),

    #[error("tried to pop a continuation chunk with no pending slot queued")]
    EmptyContinuationQueue,

    #[error("map key type {0:#010x} is not a builtin scalar or BSResource::ID")]
    BadMapKey(u32),

    #[error("field index {index} out of range for class {class} ({count} fields)")]
    FieldIndexOutOfRange {
        class: String,
        index: u16,
        count: usize,
    },

    #[error("object {0} has no ancestor with a known external path")]
    MissingParentPath(u32),

    #[error("reference target {0} is not present in the database")]
    ReferenceTargetMissing(u32),

    #[error("expected chunk size {expected}, wrote {actual}")]
    ChunkSizeMismatch { expected: u32, actual: u32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CdbError>;
