use byteorder::{ByteOrder, LittleEndian};
use indexmap::IndexMap;
use keyvalues::{ContentTree, Value, VdfString};
use std::ops::Range;
use tracing::debug;

use crate::error::{AppinfoError, Result};
use crate::format::{detect_version, FormatVersion, Tag, LAST_APPID, NUL, TAG_END};
use crate::header::{AppHeader, HEADER_SIZE, SIZE_EXCLUDED};
use crate::pool::StringPool;
use crate::{AppRecord, Appinfo};

/// Deepest dict nesting accepted before the input is treated as corrupt.
pub const MAX_DEPTH: usize = 128;

/// Decodes a whole appinfo file.
pub fn decode(bytes: &[u8]) -> Result<Appinfo> {
    Decoder::new(bytes)?.read_all()
}

/// Decodes only the records for `appids`, locating each one by scanning
/// instead of parsing every record before it.
///
/// Fails with [`AppinfoError::RecordNotFound`] for the first missing app.
pub fn decode_selected<I>(bytes: &[u8], appids: I) -> Result<Appinfo>
where
    I: IntoIterator<Item = u32>,
{
    let mut decoder = Decoder::new(bytes)?;
    let mut apps = IndexMap::new();
    for appid in appids {
        let pos = find_record(decoder.buf, decoder.records.clone(), appid)
            .ok_or(AppinfoError::RecordNotFound { appid })?;
        decoder.seek(pos);
        let record = decoder.read_record()?;
        apps.insert(appid, record);
    }
    debug!(selected = apps.len(), "decoded selected appinfo records");
    Ok(decoder.into_appinfo(apps))
}

/// Cursor over the bytes of one appinfo file.
///
/// Construction validates the preamble and, for v2, loads the string pool
/// from the table at the end of the file before any record is read.
pub struct Decoder<'a> {
    /// Whole file for v1; everything before the string table for v2.
    buf: &'a [u8],
    pos: usize,
    depth: usize,
    version: FormatVersion,
    universe: u32,
    pool: StringPool,
    records: Range<usize>,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        let (version, universe) = detect_version(bytes)?;
        let mut decoder = Decoder {
            buf: bytes,
            pos: 8,
            depth: 0,
            version,
            universe,
            pool: StringPool::new(),
            records: 8..bytes.len(),
        };

        if version.has_string_pool() {
            let offset = decoder.read_i64()?;
            let table = usize::try_from(offset)
                .ok()
                .filter(|&t| t >= version.preamble_len() && t <= bytes.len())
                .ok_or(AppinfoError::TruncatedInput {
                    offset: 8,
                    needed: offset.unsigned_abs() as usize,
                    available: bytes.len(),
                })?;
            decoder.pool = StringPool::read_table(bytes, table)?;
            decoder.buf = &bytes[..table];
            decoder.records = version.preamble_len()..table;
        }

        decoder.pos = decoder.records.start;
        debug!(?version, universe, pool = decoder.pool.len(), "appinfo preamble validated");
        Ok(decoder)
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    pub fn universe(&self) -> u32 {
        self.universe
    }

    pub fn pool(&self) -> &StringPool {
        &self.pool
    }

    /// Byte range holding the record sequence (sentinel included).
    pub fn records(&self) -> Range<usize> {
        self.records.clone()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Reads every record up to the sentinel appid.
    pub fn read_all(mut self) -> Result<Appinfo> {
        let mut apps = IndexMap::new();
        while self.peek_u32()? != LAST_APPID {
            let record = self.read_record()?;
            apps.insert(record.header.appid, record);
        }
        debug!(apps = apps.len(), "decoded appinfo");
        Ok(self.into_appinfo(apps))
    }

    /// Reads one header followed by its content dict.
    pub fn read_record(&mut self) -> Result<AppRecord> {
        let header = self.read_header()?;
        let content = self.read_dict()?;
        Ok(AppRecord { header, content })
    }

    pub fn read_header(&mut self) -> Result<AppHeader> {
        let bytes = self.take(HEADER_SIZE)?;
        AppHeader::decode(bytes)
    }

    /// Reads `(tag, key, value)` triples until the end-of-dict byte.
    pub fn read_dict(&mut self) -> Result<ContentTree> {
        if self.depth >= MAX_DEPTH {
            return Err(AppinfoError::TooDeep {
                offset: self.pos,
                max_depth: MAX_DEPTH,
            });
        }
        self.depth += 1;
        let mut tree = ContentTree::new();
        loop {
            let tag_offset = self.pos;
            let byte = self.read_u8()?;
            if byte == TAG_END {
                break;
            }
            let tag = Tag::from_byte(byte).ok_or(AppinfoError::CorruptValue {
                tag: byte,
                offset: tag_offset,
            })?;
            let key = self.read_key()?;
            let value = self.read_value(tag)?;
            tree.insert(key, value);
        }
        self.depth -= 1;
        Ok(tree)
    }

    /// Reads the value for a tag byte that was just consumed.
    pub fn read_tagged_value(&mut self, tag: u8) -> Result<Value> {
        let tag = Tag::from_byte(tag).ok_or(AppinfoError::CorruptValue {
            tag,
            offset: self.pos.saturating_sub(1),
        })?;
        self.read_value(tag)
    }

    fn read_value(&mut self, tag: Tag) -> Result<Value> {
        Ok(match tag {
            Tag::Dict => Value::Dict(self.read_dict()?),
            Tag::String => Value::Str(VdfString::decode(self.read_cstring()?)),
            Tag::Int32 => Value::Int32(self.read_i32()?),
            Tag::Int64 => Value::Int64(self.read_u64()?),
        })
    }

    fn read_key(&mut self) -> Result<VdfString> {
        match self.version {
            FormatVersion::V1 => Ok(VdfString::decode(self.read_cstring()?)),
            FormatVersion::V2 => {
                let index = self.read_u32()?;
                Ok(VdfString::decode(self.pool.resolve(index)?))
            }
        }
    }

    fn into_appinfo(self, apps: IndexMap<u32, AppRecord>) -> Appinfo {
        Appinfo {
            version: self.version,
            universe: self.universe,
            pool: self.pool,
            apps,
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let buf: &'a [u8] = self.buf;
        let available = buf.len().saturating_sub(self.pos);
        if n > available {
            return Err(AppinfoError::TruncatedInput {
                offset: self.pos,
                needed: n,
                available,
            });
        }
        let bytes = &buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Bytes up to the next NUL; the NUL is consumed but not returned.
    fn read_cstring(&mut self) -> Result<&'a [u8]> {
        let buf: &'a [u8] = self.buf;
        let rest = buf.get(self.pos..).unwrap_or_default();
        match rest.iter().position(|&b| b == NUL) {
            Some(len) => {
                self.pos += len + 1;
                Ok(&rest[..len])
            }
            None => Err(AppinfoError::TruncatedInput {
                offset: self.pos,
                needed: rest.len() + 1,
                available: rest.len(),
            }),
        }
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    fn peek_u32(&mut self) -> Result<u32> {
        let at = self.pos;
        let value = self.read_u32()?;
        self.pos = at;
        Ok(value)
    }
}

/// Finds the start of `appid`'s record inside `region`.
///
/// The first record is checked directly. Later ones are anchored on the
/// pattern `[TAG_END, appid LE]`: every record but the first follows the
/// end-of-dict byte of the previous one. A candidate is only accepted if its
/// `size` field lands on an end-of-dict byte inside the region.
pub(crate) fn find_record(buf: &[u8], region: Range<usize>, appid: u32) -> Option<usize> {
    if is_record_at(buf, &region, region.start, appid) {
        return Some(region.start);
    }

    let mut anchor = [TAG_END, 0, 0, 0, 0];
    LittleEndian::write_u32(&mut anchor[1..], appid);

    let haystack = buf.get(region.clone())?;
    haystack
        .windows(anchor.len())
        .enumerate()
        .filter(|(_, window)| *window == anchor)
        .map(|(i, _)| region.start + i + 1)
        .find(|&pos| is_record_at(buf, &region, pos, appid))
}

fn is_record_at(buf: &[u8], region: &Range<usize>, pos: usize, appid: u32) -> bool {
    let Some(head) = buf.get(pos..pos + SIZE_EXCLUDED) else {
        return false;
    };
    if LittleEndian::read_u32(&head[0..4]) != appid {
        return false;
    }
    let size = LittleEndian::read_u32(&head[4..8]) as usize;
    if size <= HEADER_SIZE - SIZE_EXCLUDED {
        return false;
    }
    let end = pos + SIZE_EXCLUDED + size;
    end <= region.end && buf[end - 1] == TAG_END
}
