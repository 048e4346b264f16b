use std::io;
use thiserror::Error;

/// Errors raised while decoding or encoding an appinfo file.
///
/// Every variant is a deterministic function of the input bytes, so none of
/// them is worth retrying.
#[derive(Debug, Error)]
pub enum AppinfoError {
    /// The magic, universe or combined legacy version is not one we know.
    #[error("incompatible appinfo format: unrecognized version value {value:#x}")]
    IncompatibleFormat { value: u64 },

    /// The buffer ended in the middle of a header, integer or string.
    #[error("truncated input at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A type tag outside `{0x00, 0x01, 0x02, 0x07}`.
    #[error("corrupt value: unknown type tag {tag:#04x} at offset {offset}")]
    CorruptValue { tag: u8, offset: usize },

    /// Dicts nested deeper than any real appinfo record.
    #[error("corrupt value: dict nesting exceeds {max_depth} levels at offset {offset}")]
    TooDeep { offset: usize, max_depth: usize },

    /// A v2 key referenced a string-pool slot that does not exist.
    #[error("string pool index {index} out of range (pool has {len} entries)")]
    PoolIndexOutOfRange { index: u32, len: usize },

    /// A v2 string table listed the same key twice.
    #[error("string pool entry {index} repeats an earlier entry")]
    DuplicatePoolEntry { index: u32 },

    /// No record for the app could be located in the buffer.
    #[error("app {appid} not found")]
    RecordNotFound { appid: u32 },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, AppinfoError>;
