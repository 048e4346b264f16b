use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use keyvalues::{ContentTree, Value, VdfString};
use sha1::{Digest as _, Sha1};
use std::io::{self, Write};
use tracing::debug;

use crate::error::Result;
use crate::format::{FormatVersion, Tag, LAST_APPID, NUL, TAG_END};
use crate::header::{AppHeader, Digest, HEADER_SIZE, SIZE_EXCLUDED};
use crate::pool::StringPool;
use crate::{AppRecord, Appinfo};

/// Encodes a whole collection, recomputing every record's derived header
/// fields on the way.
///
/// For v2 the pool in `appinfo` is extended with any new keys and written
/// after the sentinel; its offset is backpatched into the preamble.
pub fn encode(appinfo: &mut Appinfo) -> Result<Vec<u8>> {
    let Appinfo {
        version,
        universe,
        pool,
        apps,
    } = appinfo;
    let version = *version;

    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(version.magic())?;
    out.write_u32::<LittleEndian>(*universe)?;
    if version.has_string_pool() {
        // backpatched once the table position is known
        out.write_i64::<LittleEndian>(0)?;
    }

    let mut encoder = Encoder::new(version, pool);
    for record in apps.values_mut() {
        encoder.write_record(&mut out, record)?;
    }
    out.write_u32::<LittleEndian>(LAST_APPID)?;

    if version.has_string_pool() {
        let table_offset = out.len();
        pool.write_table(&mut out)?;
        LittleEndian::write_i64(&mut out[8..16], table_offset as i64);
    }

    debug!(?version, apps = apps.len(), bytes = out.len(), "encoded appinfo");
    Ok(out)
}

/// SHA-1 of `bytes`.
#[must_use]
pub fn sha1_digest(bytes: &[u8]) -> Digest {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let mut digest = [0u8; 20];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Returns `header` with `size` and both checksums recomputed for
/// `content`, whose binary encoding is `encoded`.
#[must_use]
pub fn derive_header(header: &AppHeader, content: &ContentTree, encoded: &[u8]) -> AppHeader {
    AppHeader {
        size: (encoded.len() + HEADER_SIZE - SIZE_EXCLUDED) as u32,
        checksum_text: sha1_digest(&textvdf::render(content)),
        checksum_binary: sha1_digest(encoded),
        ..*header
    }
}

/// Serializes content trees and records for one file version.
///
/// In v2 every key written is interned into the borrowed pool.
pub struct Encoder<'p> {
    version: FormatVersion,
    pool: &'p mut StringPool,
}

impl<'p> Encoder<'p> {
    pub fn new(version: FormatVersion, pool: &'p mut StringPool) -> Self {
        Self { version, pool }
    }

    /// Binary encoding of a content dict, end-of-dict byte included.
    pub fn encode_content(&mut self, tree: &ContentTree) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(256);
        self.write_dict(&mut out, tree)?;
        Ok(out)
    }

    /// Recomputes `record`'s derived fields and returns header + content.
    pub fn encode_record(&mut self, record: &mut AppRecord) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_record(&mut out, record)?;
        Ok(out)
    }

    fn write_record(&mut self, out: &mut Vec<u8>, record: &mut AppRecord) -> Result<()> {
        let content = self.encode_content(&record.content)?;
        record.header = derive_header(&record.header, &record.content, &content);
        out.extend_from_slice(&record.header.to_bytes());
        out.extend_from_slice(&content);
        Ok(())
    }

    fn write_dict(&mut self, out: &mut Vec<u8>, tree: &ContentTree) -> io::Result<()> {
        for (key, value) in tree {
            match value {
                Value::Dict(child) => {
                    self.write_key(out, Tag::Dict, key)?;
                    self.write_dict(out, child)?;
                }
                Value::Str(s) => {
                    self.write_key(out, Tag::String, key)?;
                    out.write_all(&s.to_bytes())?;
                    out.write_u8(NUL)?;
                }
                Value::Int32(n) => {
                    self.write_key(out, Tag::Int32, key)?;
                    out.write_i32::<LittleEndian>(*n)?;
                }
                Value::Int64(n) => {
                    self.write_key(out, Tag::Int64, key)?;
                    out.write_u64::<LittleEndian>(*n)?;
                }
            }
        }
        out.write_u8(TAG_END)
    }

    /// Tag byte followed by the key: inline bytes in v1, a pool index in v2.
    fn write_key(&mut self, out: &mut Vec<u8>, tag: Tag, key: &VdfString) -> io::Result<()> {
        out.write_u8(tag.byte())?;
        let bytes = key.to_bytes();
        match self.version {
            FormatVersion::V1 => {
                out.write_all(&bytes)?;
                out.write_u8(NUL)
            }
            FormatVersion::V2 => {
                let index = self.pool.intern(&bytes);
                out.write_u32::<LittleEndian>(index)
            }
        }
    }
}

impl AppRecord {
    /// Recomputes `size`, `checksum_text` and `checksum_binary` from the
    /// current content and returns the content's binary encoding.
    pub fn refresh(&mut self, version: FormatVersion, pool: &mut StringPool) -> Result<Vec<u8>> {
        let content = Encoder::new(version, pool).encode_content(&self.content)?;
        self.header = derive_header(&self.header, &self.content, &content);
        Ok(content)
    }
}
