//! # AppInfo - Steam's binary application metadata cache
//!
//! Reader/writer for `appcache/appinfo.vdf`. Decoding and re-encoding an
//! untouched file reproduces it byte for byte; edited records get their
//! size and both SHA-1 checksums recomputed so Steam still accepts them.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ PREAMBLE                                                      │
//! │ magic (u32) | universe (u32) | [string_table_offset (i64)] v2 │
//! ├───────────────────────────────────────────────────────────────┤
//! │ RECORDS                                                       │
//! │                                                               │
//! │ header (68 bytes)                                             │
//! │   appid (u32) | size (u32) | state (u32) | last_update (u32)  │
//! │   access_token (u64) | checksum_text (20) | change_number     │
//! │   (u32) | checksum_binary (20)                                │
//! │ content (tagged key/value dict, closed by 0x08)               │
//! │                                                               │
//! │ ... repeated for each app ...                                  │
//! ├───────────────────────────────────────────────────────────────┤
//! │ SENTINEL appid 0 (u32)                                        │
//! ├───────────────────────────────────────────────────────────────┤
//! │ STRING TABLE (v2 only)                                        │
//! │ count (u32) | NUL-terminated strings                          │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! `size` counts every header byte after itself plus the content, i.e.
//! `content_len + 68 - 8`. `checksum_binary` is the SHA-1 of the encoded
//! content and `checksum_text` the SHA-1 of its canonical text rendering
//! (see [`textvdf::render`]).
//!
//! ## Value tags
//!
//! | Tag    | Value                                       |
//! |--------|---------------------------------------------|
//! | `0x00` | nested dict                                 |
//! | `0x01` | NUL-terminated string (UTF-8 or Latin‑1)    |
//! | `0x02` | 4-byte little-endian integer                |
//! | `0x07` | 8-byte little-endian integer                |
//! | `0x08` | end of dict                                 |
//!
//! In v1 each tag is followed by the key as a NUL-terminated string; in v2
//! by a `u32` index into the string table.
//!
//! ## Version history
//!
//! | Version | Magic        | Keys                |
//! |---------|--------------|---------------------|
//! | v1      | `0x07564428` | inline strings      |
//! | v2      | `0x07564429` | string table index  |

mod buffer;
mod decoder;
mod encoder;
mod error;
mod format;
mod header;
mod pool;

use indexmap::IndexMap;
use keyvalues::ContentTree;

pub use buffer::{AppinfoBuffer, Splice};
pub use decoder::{decode, decode_selected, Decoder, MAX_DEPTH};
pub use encoder::{derive_header, encode, sha1_digest, Encoder};
pub use error::{AppinfoError, Result};
pub use format::{
    detect_version, FormatVersion, Tag, COMPATIBLE_UNIVERSES, LAST_APPID, LEGACY_VERSIONS,
    MAGIC_V1, MAGIC_V2, TAG_DICT, TAG_END, TAG_INT32, TAG_INT64, TAG_STRING,
};
pub use header::{AppHeader, Digest, HEADER_SIZE};
pub use pool::StringPool;

/// One application: its header and decoded content.
///
/// The header's `size` and checksums are caches of the content; they are
/// refreshed whenever the record is encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRecord {
    pub header: AppHeader,
    pub content: ContentTree,
}

impl AppRecord {
    pub fn new(header: AppHeader, content: ContentTree) -> Self {
        Self { header, content }
    }

    pub fn appid(&self) -> u32 {
        self.header.appid
    }
}

/// A decoded appinfo file, records kept in file order.
#[derive(Debug, Clone)]
pub struct Appinfo {
    pub version: FormatVersion,
    pub universe: u32,
    /// Key strings for v2; empty for v1.
    pub pool: StringPool,
    pub apps: IndexMap<u32, AppRecord>,
}

impl Appinfo {
    pub fn new(version: FormatVersion) -> Self {
        Self {
            version,
            universe: COMPATIBLE_UNIVERSES[0],
            pool: StringPool::new(),
            apps: IndexMap::new(),
        }
    }

    pub fn get(&self, appid: u32) -> Option<&AppRecord> {
        self.apps.get(&appid)
    }

    pub fn get_mut(&mut self, appid: u32) -> Option<&mut AppRecord> {
        self.apps.get_mut(&appid)
    }

    /// Adds or replaces the record for its appid.
    pub fn insert(&mut self, record: AppRecord) -> Option<AppRecord> {
        self.apps.insert(record.header.appid, record)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

#[cfg(test)]
mod tests;
