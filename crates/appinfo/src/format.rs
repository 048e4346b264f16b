//! Format constants and version detection.
//!
//! ## v1 preamble (8 bytes) - magic `0x07564428`
//!
//! ```text
//! [magic: u32 LE][universe: u32 LE]
//! ```
//!
//! Older tooling reads these 8 bytes as one little-endian u64 "version",
//! `0x1_0756_4428` for the public universe.
//!
//! ## v2 preamble (16 bytes) - magic `0x07564429`
//!
//! ```text
//! [magic: u32 LE][universe: u32 LE][string_table_offset: i64 LE]
//! ```
//!
//! v2 stores every dict key as a `u32` index into the string table found at
//! `string_table_offset`.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{AppinfoError, Result};

/// Magic of the inline-key format.
pub const MAGIC_V1: u32 = 0x0756_4428;

/// Magic of the string-pool format.
pub const MAGIC_V2: u32 = 0x0756_4429;

/// Universes we accept (1 = public).
pub const COMPATIBLE_UNIVERSES: &[u32] = &[1];

/// Combined `magic | universe << 32` values accepted for v1.
pub const LEGACY_VERSIONS: &[u64] = &[0x1_0756_4428];

/// Appid that terminates the record sequence.
pub const LAST_APPID: u32 = 0;

/// Length of the sentinel appid.
pub const SENTINEL_LEN: usize = 4;

pub const TAG_DICT: u8 = 0x00;
pub const TAG_STRING: u8 = 0x01;
pub const TAG_INT32: u8 = 0x02;
pub const TAG_INT64: u8 = 0x07;
/// Closes a dict; never a value tag.
pub const TAG_END: u8 = 0x08;

/// String terminator.
pub const NUL: u8 = 0x00;

/// On-disk schema of an appinfo file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVersion {
    /// Keys stored inline as NUL-terminated strings.
    V1,
    /// Keys stored as indices into a trailing string table.
    V2,
}

impl FormatVersion {
    #[must_use]
    pub fn magic(self) -> u32 {
        match self {
            FormatVersion::V1 => MAGIC_V1,
            FormatVersion::V2 => MAGIC_V2,
        }
    }

    #[must_use]
    pub fn has_string_pool(self) -> bool {
        matches!(self, FormatVersion::V2)
    }

    /// Bytes before the first record.
    #[must_use]
    pub fn preamble_len(self) -> usize {
        match self {
            FormatVersion::V1 => 8,
            FormatVersion::V2 => 16,
        }
    }
}

/// Detects the schema from the first 8 bytes and validates the universe.
///
/// The v2 magic is checked first; anything else must match the legacy
/// combined u64 allow-list. Returns the version and the universe.
pub fn detect_version(bytes: &[u8]) -> Result<(FormatVersion, u32)> {
    if bytes.len() < 8 {
        return Err(AppinfoError::TruncatedInput {
            offset: 0,
            needed: 8,
            available: bytes.len(),
        });
    }
    let magic = LittleEndian::read_u32(&bytes[0..4]);
    let universe = LittleEndian::read_u32(&bytes[4..8]);

    if magic == MAGIC_V2 {
        if !COMPATIBLE_UNIVERSES.contains(&universe) {
            return Err(AppinfoError::IncompatibleFormat {
                value: u64::from(universe),
            });
        }
        return Ok((FormatVersion::V2, universe));
    }

    let combined = LittleEndian::read_u64(&bytes[0..8]);
    if LEGACY_VERSIONS.contains(&combined) {
        return Ok((FormatVersion::V1, universe));
    }

    // name whichever half is wrong
    let value = if magic == MAGIC_V1 { universe } else { magic };
    Err(AppinfoError::IncompatibleFormat {
        value: u64::from(value),
    })
}

/// Legal value tags. [`TAG_END`] is deliberately not one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Dict,
    String,
    Int32,
    Int64,
}

impl Tag {
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            TAG_DICT => Some(Tag::Dict),
            TAG_STRING => Some(Tag::String),
            TAG_INT32 => Some(Tag::Int32),
            TAG_INT64 => Some(Tag::Int64),
            _ => None,
        }
    }

    #[must_use]
    pub fn byte(self) -> u8 {
        match self {
            Tag::Dict => TAG_DICT,
            Tag::String => TAG_STRING,
            Tag::Int32 => TAG_INT32,
            Tag::Int64 => TAG_INT64,
        }
    }
}
